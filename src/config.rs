//! Command-line configuration for sysdelta.
//!
//! This module defines all CLI arguments using `clap` for parsing.
//! The configuration controls the sampling interval, display mode, the
//! filesystem roots the readers use, and the one-shot actions.

use std::path::PathBuf;

use clap::Parser;

use crate::collectors::HostPaths;

/// Periodic host-metrics collector.
///
/// sysdelta samples kernel counters on a fixed period and turns them into
/// rates: CPU share per process and per owner, disk and network throughput,
/// and AMD GPU utilization.
///
/// # Examples
///
/// ```bash
/// # Dashboard (default)
/// sysdelta
///
/// # One line per pass, every 5 seconds
/// sysdelta --headless -i 5
///
/// # Two samples one interval apart, printed as JSON
/// sysdelta --once --json
///
/// # Ask process 4242 to exit
/// sysdelta --terminate 4242
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Sample kernel counters and report per-second rates")]
pub struct Config {
    /// Interval in seconds between samples.
    ///
    /// This is the nominal period; rates are normalized by the measured
    /// time between samples.
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Number of rate samples to keep in memory for plotting.
    #[arg(long, default_value_t = 120)]
    pub history_size: usize,

    /// Run in headless mode (no TUI, one summary line per pass).
    #[arg(long)]
    pub headless: bool,

    /// Take two samples one interval apart, print the result and exit.
    #[arg(long, conflicts_with = "headless")]
    pub once: bool,

    /// Print the `--once` result as JSON.
    #[arg(long, requires = "once")]
    pub json: bool,

    /// Number of processes shown in tables and `--once` output.
    #[arg(long, default_value_t = 15)]
    pub top: usize,

    /// Read GPU stats every N passes; the last reading is reused in between.
    ///
    /// Spawning the vendor tool every second is noticeably expensive.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub gpu_every: u32,

    /// Include the last N journal lines in `--once` output.
    #[arg(long, value_name = "N", requires = "once")]
    pub logs: Option<usize>,

    /// Send SIGTERM to PID and exit.
    #[arg(long, value_name = "PID")]
    pub terminate: Option<u32>,

    /// With `--terminate`, send SIGKILL instead.
    #[arg(long, requires = "terminate")]
    pub force: bool,

    /// Root of the proc filesystem.
    #[arg(long, default_value = "/proc")]
    pub proc_root: PathBuf,

    /// Root of the sys filesystem.
    #[arg(long, default_value = "/sys")]
    pub sys_root: PathBuf,

    /// Identity table used to resolve process owners.
    #[arg(long, default_value = "/etc/passwd")]
    pub passwd: PathBuf,

    /// Write logs to this file (the dashboard otherwise logs nowhere).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn host_paths(&self) -> HostPaths {
        HostPaths {
            proc_root: self.proc_root.clone(),
            sys_root: self.sys_root.clone(),
            passwd: self.passwd.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["sysdelta"]).unwrap();
        assert_eq!(config.interval, 1);
        assert_eq!(config.gpu_every, 5);
        assert_eq!(config.host_paths(), HostPaths::default());
        assert!(!config.once);
    }

    #[test]
    fn zero_interval_rejected() {
        assert!(Config::try_parse_from(["sysdelta", "-i", "0"]).is_err());
        assert!(Config::try_parse_from(["sysdelta", "--gpu-every", "0"]).is_err());
    }

    #[test]
    fn dependent_flags() {
        assert!(Config::try_parse_from(["sysdelta", "--json"]).is_err());
        assert!(Config::try_parse_from(["sysdelta", "--force"]).is_err());
        assert!(Config::try_parse_from(["sysdelta", "--once", "--headless"]).is_err());
        let config =
            Config::try_parse_from(["sysdelta", "--terminate", "42", "--force"]).unwrap();
        assert_eq!(config.terminate, Some(42));
        assert!(config.force);
    }

    #[test]
    fn custom_roots() {
        let config = Config::try_parse_from([
            "sysdelta",
            "--proc-root",
            "/tmp/p",
            "--sys-root",
            "/tmp/s",
            "--once",
            "--logs",
            "20",
        ])
        .unwrap();
        let paths = config.host_paths();
        assert_eq!(paths.proc_root, PathBuf::from("/tmp/p"));
        assert_eq!(paths.sys_root, PathBuf::from("/tmp/s"));
        assert_eq!(config.logs, Some(20));
    }
}
