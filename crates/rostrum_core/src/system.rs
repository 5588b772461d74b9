//! Process clock and system information report.

use once_cell::sync::Lazy;
use std::fmt::Write;
use std::time::Instant;
use sysinfo::System;

static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);

/// Pins the process start instant; call once early in `main`.
pub fn mark_process_start() {
    Lazy::force(&PROCESS_START);
}

/// Seconds elapsed since [`mark_process_start`] (or the first clock read).
pub fn elapsed_seconds() -> f64 {
    PROCESS_START.elapsed().as_secs_f64()
}

/// Multi-line OS / memory / CPU summary.
pub fn system_report() -> String {
    let mut system = System::new();
    system.refresh_memory();
    system.refresh_cpu_all();

    let unknown = || "unknown".to_string();
    let mut report = String::from("System information:\n");
    let _ = writeln!(report, "  OS:");
    let _ = writeln!(report, "    Name     : {}", System::name().unwrap_or_else(unknown));
    let _ = writeln!(
        report,
        "    Full name: {}",
        System::long_os_version().unwrap_or_else(unknown)
    );
    let _ = writeln!(
        report,
        "    Version  : {} kernel {}",
        System::os_version().unwrap_or_else(unknown),
        System::kernel_version().unwrap_or_else(unknown)
    );
    let _ = writeln!(report, "  Memory:");
    let _ = writeln!(report, "    Physical:");
    let _ = writeln!(report, "      Available: {}B", system.available_memory());
    let _ = writeln!(report, "      Total    : {}B", system.total_memory());
    let _ = writeln!(report, "    Swap:");
    let _ = writeln!(report, "      Available: {}B", system.free_swap());
    let _ = writeln!(report, "      Total    : {}B", system.total_swap());
    let _ = writeln!(report, "  CPU:");
    let _ = writeln!(report, "    Architecture: {}", std::env::consts::ARCH);
    let _ = writeln!(
        report,
        "    Endianness  : {}",
        if cfg!(target_endian = "little") {
            "Little-Endian"
        } else {
            "Big-Endian"
        }
    );
    if let Some(cpu) = system.cpus().first() {
        let _ = writeln!(report, "    Model name  : {}", cpu.brand());
        let _ = writeln!(report, "    Vendor ID   : {}", cpu.vendor_id());
        let _ = writeln!(report, "    Frequency   : {} MHz", cpu.frequency());
    }
    let _ = writeln!(report, "  Quantities:");
    let _ = writeln!(report, "    Logical CPUs : {}", system.cpus().len());
    report
}

#[cfg(test)]
mod tests {
    use super::{elapsed_seconds, mark_process_start, system_report};

    #[test]
    fn elapsed_time_is_monotonic() {
        mark_process_start();
        let first = elapsed_seconds();
        let second = elapsed_seconds();
        assert!(first >= 0.0);
        assert!(second >= first);
    }

    #[test]
    fn report_names_each_section() {
        let report = system_report();
        for section in ["OS:", "Memory:", "CPU:", "Quantities:"] {
            assert!(report.contains(section), "missing {section}");
        }
    }
}
