//! Static host facts and session queries.
//!
//! Processor model, core counts and kernel version are read once at
//! startup. Logged-in users and the journal tail shell out to `who` and
//! `journalctl`.

use std::collections::BTreeSet;
use std::process::Command;

use serde::Serialize;
use sysinfo::{CpuRefreshKind, RefreshKind, System};
use tracing::{debug, warn};

use crate::collectors::{read_optional, HostPaths};
use crate::error::{CollectError, Result};

/// One-shot facts about the machine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    pub cpu_model: String,
    pub kernel_version: String,
    pub physical_cores: usize,
    pub logical_cpus: usize,
}

/// Parsed `/proc/cpuinfo` facts. Counts never drop below 1.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuInfo {
    /// The first `model name`; absent on many ARM kernels
    pub model: Option<String>,
    pub physical_cores: usize,
    pub logical_cpus: usize,
}

pub fn parse_cpuinfo(content: &str) -> CpuInfo {
    let mut model = None;
    let mut cores = BTreeSet::new();
    let mut physical_id = String::new();
    let mut logical = 0usize;

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "processor" => logical += 1,
            "model name" if model.is_none() && !value.is_empty() => {
                model = Some(value.to_string());
            }
            "physical id" => physical_id = value.to_string(),
            "core id" => {
                cores.insert(format!("{physical_id}:{value}"));
            }
            _ => {}
        }
    }

    CpuInfo {
        model,
        physical_cores: cores.len().max(1),
        logical_cpus: logical.max(1),
    }
}

/// Kernel release: the third token of `/proc/version`.
pub fn parse_kernel_version(content: &str) -> Option<String> {
    content.split_whitespace().nth(2).map(str::to_string)
}

impl HostInfo {
    /// Read `/proc/cpuinfo` and `/proc/version`, falling back to sysinfo.
    pub fn collect(paths: &HostPaths) -> Self {
        let cpuinfo = read_optional(&paths.proc("cpuinfo"))
            .map(|c| parse_cpuinfo(&c))
            .unwrap_or_else(|| CpuInfo {
                model: None,
                physical_cores: System::physical_core_count().unwrap_or(1).max(1),
                logical_cpus: 1,
            });

        let cpu_model = cpuinfo
            .model
            .or_else(sysinfo_brand)
            .unwrap_or_else(|| "Unknown".to_string());
        let kernel_version = read_optional(&paths.proc("version"))
            .and_then(|c| parse_kernel_version(&c))
            .or_else(System::kernel_version)
            .unwrap_or_else(|| "Unknown".to_string());

        Self {
            cpu_model,
            kernel_version,
            physical_cores: cpuinfo.physical_cores,
            logical_cpus: cpuinfo.logical_cpus,
        }
    }
}

fn sysinfo_brand() -> Option<String> {
    let refresh = RefreshKind::nothing().with_cpu(CpuRefreshKind::everything());
    let sys = System::new_with_specifics(refresh);
    sys.cpus()
        .first()
        .map(|c| c.brand().trim().to_string())
        .filter(|b| !b.is_empty())
}

/// Parse `who` output into sorted, unique login names.
pub fn parse_who(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Users with an active login session. Empty when `who` is unavailable.
pub fn logged_in_users() -> Vec<String> {
    match Command::new("who").output() {
        Ok(out) if out.status.success() => parse_who(&String::from_utf8_lossy(&out.stdout)),
        Ok(out) => {
            debug!(status = %out.status, "who exited with failure");
            Vec::new()
        }
        Err(err) => {
            warn!(error = %err, "failed to run who");
            Vec::new()
        }
    }
}

/// Outcome of a journal query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JournalTail {
    Available { text: String },
    /// `journalctl` is missing or could not be started
    Unavailable,
}

const JOURNAL_TOOL: &str = "journalctl";

/// The last `lines` entries of the system journal.
///
/// A missing `journalctl` degrades to [`JournalTail::Unavailable`].
///
/// # Errors
///
/// `lines == 0` is an [`CollectError::InvalidArgument`].
pub fn journal_tail(lines: usize) -> Result<JournalTail> {
    tail_with(JOURNAL_TOOL, lines)
}

fn tail_with(program: &str, lines: usize) -> Result<JournalTail> {
    if lines == 0 {
        return Err(CollectError::InvalidArgument(
            "journal tail needs at least one line".into(),
        ));
    }
    let out = match Command::new(program)
        .args(["-n", &lines.to_string(), "--no-pager"])
        .output()
    {
        Ok(out) => out,
        Err(err) => {
            warn!(tool = program, error = %err, "journal tail unavailable");
            return Ok(JournalTail::Unavailable);
        }
    };
    if !out.status.success() {
        warn!(tool = program, status = %out.status, "journal query exited with failure");
    }
    Ok(JournalTail::Available {
        text: String::from_utf8_lossy(&out.stdout).into_owned(),
    })
}
