//! AMD GPU statistics.
//!
//! Two tiers, never blended: when `rocm-smi` is on `PATH` its CSV output is
//! the only source, otherwise the amdgpu sysfs attributes are read directly.
//! Either way the result is a [`GpuReading`], and a field that could not be
//! measured is `None` rather than a guess.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{debug, warn};

use crate::availability::MetricAvailability;

pub const GPU_TOOL: &str = "rocm-smi";
const GPU_TOOL_ARGS: [&str; 8] = [
    "--showid",
    "--showmeminfo",
    "vram",
    "--showtemp",
    "--showfan",
    "--showuse",
    "--showpower",
    "--csv",
];
/// Minimum columns in the tool's data row before any field is trusted.
const TOOL_MIN_COLUMNS: usize = 14;
const AMD_VENDOR_ID: &str = "0x1002";

/// Where a reading came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuSource {
    Tool,
    Sysfs,
}

/// GPU figures; `None` means "N/A".
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GpuStats {
    pub vendor: Option<String>,
    pub device_name: Option<String>,
    pub vram_total_bytes: Option<u64>,
    pub vram_used_bytes: Option<u64>,
    pub temperature_celsius: Option<f64>,
    pub fan_percent: Option<f64>,
    pub usage_percent: Option<f64>,
    pub power_watts: Option<f64>,
}

/// Outcome of one GPU read.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GpuReading {
    Available {
        source: GpuSource,
        stats: GpuStats,
    },
    #[default]
    Unavailable,
}

impl GpuReading {
    /// The stats, or an all-`None` set when unavailable.
    pub fn stats(&self) -> GpuStats {
        match self {
            GpuReading::Available { stats, .. } => stats.clone(),
            GpuReading::Unavailable => GpuStats::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, GpuReading::Available { .. })
    }

    pub fn source(&self) -> Option<GpuSource> {
        match self {
            GpuReading::Available { source, .. } => Some(*source),
            GpuReading::Unavailable => None,
        }
    }
}

/// Reads GPU stats through whichever tier the host offers.
#[derive(Clone, Debug)]
pub struct GpuReader {
    drm_root: PathBuf,
    tool_available: bool,
}

impl GpuReader {
    /// Probe `PATH` for the vendor tool once.
    pub fn probe(sys_root: &Path) -> Self {
        Self::new(
            sys_root,
            MetricAvailability::check_command_available(GPU_TOOL),
        )
    }

    pub fn new(sys_root: &Path, tool_available: bool) -> Self {
        Self {
            drm_root: sys_root.join("class/drm"),
            tool_available,
        }
    }

    pub fn tool_available(&self) -> bool {
        self.tool_available
    }

    pub fn read(&self) -> GpuReading {
        if self.tool_available {
            read_tool()
        } else {
            read_sysfs(&self.drm_root)
        }
    }
}

fn read_tool() -> GpuReading {
    match Command::new(GPU_TOOL).args(GPU_TOOL_ARGS).output() {
        Ok(out) if out.status.success() => parse_tool_output(&String::from_utf8_lossy(&out.stdout)),
        Ok(out) => {
            warn!(status = %out.status, "{GPU_TOOL} exited with failure");
            GpuReading::Unavailable
        }
        Err(err) => {
            warn!(error = %err, "failed to run {GPU_TOOL}");
            GpuReading::Unavailable
        }
    }
}

/// Map the last non-empty line of the tool's CSV output.
///
/// Columns: 1 name, 6 temperature, 8 fan, 10 power, 11 usage, 12 VRAM
/// total, 13 VRAM used. A short row yields [`GpuReading::Unavailable`].
pub fn parse_tool_output(output: &str) -> GpuReading {
    let Some(last) = output.lines().map(str::trim).filter(|l| !l.is_empty()).last() else {
        return GpuReading::Unavailable;
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(last.as_bytes());
    let record = match reader.records().next() {
        Some(Ok(record)) => record,
        Some(Err(err)) => {
            debug!(error = %err, "unparseable {GPU_TOOL} row");
            return GpuReading::Unavailable;
        }
        None => return GpuReading::Unavailable,
    };
    if record.len() < TOOL_MIN_COLUMNS {
        debug!(columns = record.len(), "short {GPU_TOOL} row");
        return GpuReading::Unavailable;
    }

    let col = |i: usize| record.get(i).unwrap_or("");
    let name = col(1);
    GpuReading::Available {
        source: GpuSource::Tool,
        stats: GpuStats {
            vendor: Some("AMD".to_string()),
            device_name: (!name.is_empty()).then(|| name.to_string()),
            vram_total_bytes: parse_f64_loose(col(12)).map(|v| v.max(0.0) as u64),
            vram_used_bytes: parse_f64_loose(col(13)).map(|v| v.max(0.0) as u64),
            temperature_celsius: parse_f64_loose(col(6)),
            fan_percent: parse_f64_loose(col(8)),
            usage_percent: parse_f64_loose(col(11)),
            power_watts: parse_f64_loose(col(10)),
        },
    }
}

/// Scan `<sys>/class/drm/cardN` for the first amdgpu-bound AMD device.
pub fn read_sysfs(drm_root: &Path) -> GpuReading {
    let mut cards: Vec<PathBuf> = match std::fs::read_dir(drm_root) {
        Ok(entries) => entries
            .flatten()
            .filter(|e| is_card_dir(&e.file_name().to_string_lossy()))
            .map(|e| e.path())
            .collect(),
        Err(err) => {
            debug!(path = %drm_root.display(), error = %err, "no drm class directory");
            return GpuReading::Unavailable;
        }
    };
    cards.sort();

    cards
        .iter()
        .map(|card| card.join("device"))
        .find(|device| is_amd_device(device))
        .map(|device| GpuReading::Available {
            source: GpuSource::Sysfs,
            stats: read_device_stats(&device),
        })
        .unwrap_or(GpuReading::Unavailable)
}

/// `card0`, `card1`, ... but not connector entries like `card0-DP-1`.
fn is_card_dir(name: &str) -> bool {
    name.strip_prefix("card")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn is_amd_device(device: &Path) -> bool {
    let bound = std::fs::read_to_string(device.join("uevent"))
        .map(|u| u.lines().any(|l| l.trim() == "DRIVER=amdgpu"))
        .unwrap_or(false);
    bound
        && std::fs::read_to_string(device.join("vendor"))
            .map(|v| v.trim() == AMD_VENDOR_ID)
            .unwrap_or(false)
}

fn read_device_stats(device: &Path) -> GpuStats {
    let hwmon = first_hwmon(device);
    let from_hwmon = |name: &str| hwmon.as_ref().and_then(|h| read_number(&h.join(name)));

    let fan_percent = match (from_hwmon("pwm1"), from_hwmon("pwm1_max")) {
        (Some(pwm), Some(max)) if max > 0.0 => Some(pwm * 100.0 / max),
        _ => None,
    };

    GpuStats {
        vendor: Some("AMD".to_string()),
        device_name: read_trimmed(&device.join("product_name"))
            .or_else(|| read_trimmed(&device.join("modalias"))),
        vram_total_bytes: read_number(&device.join("mem_info_vram_total")).map(|v| v as u64),
        vram_used_bytes: read_number(&device.join("mem_info_vram_used")).map(|v| v as u64),
        temperature_celsius: from_hwmon("temp1_input").map(|m| m / 1000.0),
        fan_percent,
        usage_percent: read_number(&device.join("gpu_busy_percent")),
        power_watts: from_hwmon("power1_average").map(|uw| uw / 1_000_000.0),
    }
}

fn first_hwmon(device: &Path) -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(device.join("hwmon"))
        .ok()?
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("hwmon"))
        .map(|e| e.path())
        .collect();
    dirs.sort();
    dirs.into_iter().next()
}

fn read_trimmed(path: &Path) -> Option<String> {
    let value = std::fs::read_to_string(path).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn read_number(path: &Path) -> Option<f64> {
    read_trimmed(path)?.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Parse a number that may carry units or a decimal comma (`"45.0c"`, `"12,5"`).
fn parse_f64_loose(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if let Ok(v) = trimmed.parse::<f64>() {
        return Some(v);
    }
    let filtered: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();
    if filtered.is_empty() {
        return None;
    }
    filtered.replace(',', ".").parse::<f64>().ok()
}
