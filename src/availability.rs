//! Metric availability tracking for sysdelta.
//!
//! Probes which optional sources and tools are present, so the UI can say
//! why a panel is empty instead of showing zeros without explanation.

use std::process::Command;

use serde::Serialize;

use crate::collectors::HostPaths;

/// Tracks which metric sources are available.
#[derive(Default, Clone, Debug, Serialize)]
pub struct MetricAvailability {
    /// rocm-smi is on PATH (GPU stats come from the tool, never sysfs)
    pub gpu_tool: bool,
    /// An amdgpu-bound card exists under /sys/class/drm
    pub gpu_sysfs: bool,
    /// /proc/self/io is readable (CONFIG_TASK_IO_ACCOUNTING)
    pub process_io: bool,
    /// Running as root, so other users' /proc/[pid]/io is readable too
    pub elevated: bool,
    /// /proc/net/route is readable for primary interface discovery
    pub routing_table: bool,
    /// `who` is available for logged-in user listing
    pub who: bool,
    /// `journalctl` is available for log tails
    pub journalctl: bool,
}

impl MetricAvailability {
    /// Probe all metric sources and return availability status.
    ///
    /// `gpu_tool` comes from the GPU reader, which already looked for the
    /// vendor tool on `PATH`.
    pub fn probe(paths: &HostPaths, gpu_tool: bool) -> Self {
        Self {
            gpu_tool,
            gpu_sysfs: Self::check_amdgpu_cards(paths),
            process_io: std::fs::read_to_string(paths.proc("self/io")).is_ok(),
            elevated: Self::has_elevated_privileges(),
            routing_table: std::fs::read_to_string(paths.proc("net/route")).is_ok(),
            who: Self::check_command_available("who"),
            journalctl: Self::check_command_available("journalctl"),
        }
    }

    fn check_amdgpu_cards(paths: &HostPaths) -> bool {
        if let Ok(entries) = std::fs::read_dir(paths.sys("class/drm")) {
            for entry in entries.flatten() {
                let uevent = entry.path().join("device/uevent");
                if let Ok(content) = std::fs::read_to_string(&uevent) {
                    if content.lines().any(|l| l.trim() == "DRIVER=amdgpu") {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Check if a command is available in PATH.
    pub fn check_command_available(cmd: &str) -> bool {
        Command::new("which")
            .arg(cmd)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Generate warnings for unavailable metrics.
    pub fn get_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.gpu_tool && !self.gpu_sysfs {
            warnings.push("GPU stats unavailable (no rocm-smi, no amdgpu device)".into());
        }
        if !self.process_io {
            warnings.push("Per-process I/O unavailable (kernel lacks task I/O accounting)".into());
        } else if !self.elevated {
            warnings.push("Other users' process I/O hidden (run as root for full I/O)".into());
        }
        if !self.routing_table {
            warnings.push("Routing table unreadable, primary interface defaults to eth0".into());
        }
        if !self.who {
            warnings.push("Logged-in users unavailable (no who)".into());
        }
        if !self.journalctl {
            warnings.push("Journal tail unavailable (no journalctl)".into());
        }

        warnings
    }

    /// Check if running with elevated privileges.
    pub fn has_elevated_privileges() -> bool {
        unsafe { libc::geteuid() == 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_follow_flags() {
        let none = MetricAvailability::default();
        let warnings = none.get_warnings();
        assert_eq!(warnings.len(), 5);
        assert!(warnings[0].starts_with("GPU"));
        assert!(warnings[4].contains("journalctl"));

        let full = MetricAvailability {
            gpu_tool: true,
            gpu_sysfs: false,
            process_io: true,
            elevated: true,
            routing_table: true,
            who: true,
            journalctl: true,
        };
        assert!(full.get_warnings().is_empty());
    }

    #[test]
    fn empty_tree_reports_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths {
            proc_root: dir.path().join("proc"),
            sys_root: dir.path().join("sys"),
            passwd: dir.path().join("passwd"),
        };
        let availability = MetricAvailability::probe(&paths, true);
        assert!(availability.gpu_tool);
        assert!(!availability.gpu_sysfs);
        assert!(!availability.process_io);
        assert!(!availability.routing_table);
    }

    #[test]
    fn missing_command_is_unavailable() {
        assert!(!MetricAvailability::check_command_available(
            "sysdelta-no-such-command"
        ));
    }
}
