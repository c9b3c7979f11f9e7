//! sysinfo-backed resource probe for the current process

use std::time::Instant;

use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::sampler::ResourceProbe;

/// Probe over the host OS: CPU time, core count, and memory figures
/// for the current process, read through `sysinfo`.
pub struct SysinfoProbe {
    system: System,
    pid: Pid,
    cores: usize,
}

impl SysinfoProbe {
    /// Create a probe bound to the current process. Core count is
    /// captured once at construction; it does not change underneath a
    /// running console.
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_all();
        let cores = system.cpus().len().max(1);

        Self {
            system,
            pid: Pid::from_u32(std::process::id()),
            cores,
        }
    }

    fn refresh_process(&mut self) {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SysinfoProbe {
    fn wall_now(&mut self) -> Instant {
        Instant::now()
    }

    fn cpu_seconds(&mut self) -> f64 {
        self.refresh_process();
        // Combined user + system time, reported in milliseconds.
        self.system
            .process(self.pid)
            .map(|p| p.accumulated_cpu_time() as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    fn logical_cores(&self) -> usize {
        self.cores
    }

    fn process_memory_percent(&mut self) -> f64 {
        self.system.refresh_memory();
        self.refresh_process();

        let total = self.system.total_memory();
        if total == 0 {
            return 0.0;
        }

        self.system
            .process(self.pid)
            .map(|p| p.memory() as f64 / total as f64 * 100.0)
            .unwrap_or(0.0)
    }
}
