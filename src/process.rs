//! Per-process readers over `/proc/[pid]`.
//!
//! A process can exit between listing its directory and reading its files,
//! so every reader here returns `Option` and the caller skips what vanished.

use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::collectors::HostPaths;

/// Identity and memory fields from `/proc/[pid]/status`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessStatus {
    pub name: String,
    /// Single-letter state tag (`R`, `S`, `D`, `Z`, ...)
    pub state: String,
    pub ppid: u32,
    /// Real user id, the first `Uid:` column
    pub uid: u32,
    /// Resident set size; 0 for kernel threads, which carry no `VmRSS`
    pub rss_kb: u64,
    pub threads: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatusField {
    Name,
    State,
    PPid,
    Uid,
    VmRss,
    Threads,
}

impl StatusField {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "Name" => Self::Name,
            "State" => Self::State,
            "PPid" => Self::PPid,
            "Uid" => Self::Uid,
            "VmRSS" => Self::VmRss,
            "Threads" => Self::Threads,
            _ => return None,
        })
    }
}

pub fn parse_status(content: &str) -> ProcessStatus {
    let mut status = ProcessStatus::default();
    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Some(field) = StatusField::from_key(key.trim()) else {
            continue;
        };
        let first = value.split_whitespace().next().unwrap_or("");
        match field {
            StatusField::Name => status.name = value.trim().to_string(),
            StatusField::State => status.state = first.to_string(),
            StatusField::PPid => status.ppid = first.parse().unwrap_or(0),
            StatusField::Uid => status.uid = first.parse().unwrap_or(0),
            StatusField::VmRss => status.rss_kb = first.parse().unwrap_or(0),
            StatusField::Threads => status.threads = first.parse().unwrap_or(0),
        }
    }
    status
}

/// CPU tick counters from `/proc/[pid]/stat`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessStat {
    /// utime + stime + cutime + cstime
    pub active_ticks: u64,
    /// Start time after boot, in ticks; distinguishes a reused pid
    pub start_ticks: u64,
}

/// Parse `/proc/[pid]/stat`.
///
/// The command name is parenthesised and may itself contain spaces or
/// parentheses, so fields are counted from the last `)`.
pub fn parse_stat(content: &str) -> Option<ProcessStat> {
    let (_, rest) = content.rsplit_once(')')?;
    // rest[0] is field 3 (state); utime is field 14.
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let at = |field: usize| -> u64 {
        fields
            .get(field - 3)
            .and_then(|s| s.parse::<i64>().ok())
            .map(|v| v.max(0) as u64)
            .unwrap_or(0)
    };
    if fields.len() < 20 {
        return None;
    }
    Some(ProcessStat {
        active_ticks: at(14)
            .saturating_add(at(15))
            .saturating_add(at(16))
            .saturating_add(at(17)),
        start_ticks: at(22),
    })
}

/// Storage-layer byte counters from `/proc/[pid]/io`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IoCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

pub fn parse_io(content: &str) -> IoCounters {
    let mut io = IoCounters::default();
    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().parse().unwrap_or(0);
        match key.trim() {
            "read_bytes" => io.read_bytes = value,
            "write_bytes" => io.write_bytes = value,
            _ => {}
        }
    }
    io
}

/// List live process ids: the all-digit entries of the proc root.
pub fn list_pids(paths: &HostPaths) -> Vec<u32> {
    let entries = match std::fs::read_dir(&paths.proc_root) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(root = %paths.proc_root.display(), error = %err, "cannot list processes");
            return Vec::new();
        }
    };
    entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            name.parse().ok()
        })
        .collect()
}

pub fn read_status(paths: &HostPaths, pid: u32) -> Option<ProcessStatus> {
    let content = std::fs::read_to_string(paths.proc(format!("{pid}/status"))).ok()?;
    Some(parse_status(&content))
}

pub fn read_stat(paths: &HostPaths, pid: u32) -> Option<ProcessStat> {
    let content = std::fs::read_to_string(paths.proc(format!("{pid}/stat"))).ok()?;
    parse_stat(&content)
}

/// I/O counters; another user's process is unreadable without privileges and reads as zeros.
pub fn read_io(paths: &HostPaths, pid: u32) -> IoCounters {
    std::fs::read_to_string(paths.proc(format!("{pid}/io")))
        .map(|c| parse_io(&c))
        .unwrap_or_default()
}

/// Target of the `/proc/[pid]/exe` link.
pub fn process_executable(paths: &HostPaths, pid: u32) -> Option<PathBuf> {
    std::fs::read_link(paths.proc(format!("{pid}/exe"))).ok()
}

/// Signals the lifecycle boundary call can deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ProcessSignal {
    /// SIGTERM, asks the process to exit
    Terminate,
    /// SIGKILL
    Kill,
}

impl ProcessSignal {
    fn raw(self) -> libc::c_int {
        match self {
            Self::Terminate => libc::SIGTERM,
            Self::Kill => libc::SIGKILL,
        }
    }
}

/// Send `signal` to a single process.
///
/// Pid 0 and values outside `pid_t` are rejected: they would address a
/// process group or wrap to a negative id.
pub fn send_signal(pid: u32, signal: ProcessSignal) -> std::io::Result<()> {
    let raw_pid = libc::pid_t::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("refusing to signal pid {pid}"),
            )
        })?;
    let rc = unsafe { libc::kill(raw_pid, signal.raw()) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}
