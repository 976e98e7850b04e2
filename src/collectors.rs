//! System-wide counter readers.
//!
//! Every source has a pure `parse_*` function over the file's text and a
//! thin `read_*` wrapper that resolves the path against [`HostPaths`].
//! Parsers never fail on a malformed field: it reads as 0 and the rest of
//! the sample survives.
//!
//! # Data Sources
//!
//! - `/proc/stat` - aggregate CPU time (required)
//! - `/proc/meminfo` - memory counters (required)
//! - `/proc/diskstats` - block device sector and I/O time counters
//! - `/proc/net/dev` - network interface byte counters
//! - `/proc/uptime`, `/proc/loadavg`, `/proc/swaps`
//! - `/proc/mounts` - mounted partitions
//! - `/proc/cpuinfo` - current clock of the first core
//! - `sysinfo::Disks`, then `statvfs(3)` - filesystem capacity

use std::collections::BTreeMap;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sysinfo::Disks;
use tracing::debug;

use crate::error::{CollectError, Result};

/// Bytes per sector in `/proc/diskstats`, regardless of the device's real sector size.
pub const SECTOR_SIZE: u64 = 512;

/// Roots the readers resolve their well-known paths against.
///
/// Defaults to the live host. Tests point it at a fixture tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostPaths {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    /// Local identity table in `/etc/passwd` format
    pub passwd: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            passwd: PathBuf::from("/etc/passwd"),
        }
    }
}

impl HostPaths {
    /// Path below the proc root, e.g. `proc("net/dev")`.
    pub fn proc(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.proc_root.join(relative)
    }

    /// Path below the sys root.
    pub fn sys(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.sys_root.join(relative)
    }

    /// Whether the proc root is the running kernel's own `/proc`.
    pub fn is_live(&self) -> bool {
        self.proc_root == Path::new("/proc")
    }
}

/// Read an optional source, logging and returning `None` when it is missing.
pub(crate) fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "source unavailable");
            None
        }
    }
}

fn field_u64(parts: &[&str], index: usize) -> u64 {
    parts.get(index).and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// Aggregate CPU time from the `cpu` line of `/proc/stat`, in scheduler ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    /// Time stolen by the hypervisor
    pub steal: u64,
}

impl CpuTimes {
    pub fn active_time(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
            .saturating_add(self.steal)
    }

    pub fn idle_time(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    pub fn total_time(&self) -> u64 {
        self.active_time().saturating_add(self.idle_time())
    }
}

/// Parse the aggregate `cpu` line. Per-core `cpuN` lines are ignored.
///
/// Returns `None` when no aggregate line exists. Trailing fields missing on
/// older kernels read as 0.
pub fn parse_cpu_times(content: &str) -> Option<CpuTimes> {
    content.lines().find_map(|line| {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.first() != Some(&"cpu") {
            return None;
        }
        Some(CpuTimes {
            user: field_u64(&parts, 1),
            nice: field_u64(&parts, 2),
            system: field_u64(&parts, 3),
            idle: field_u64(&parts, 4),
            iowait: field_u64(&parts, 5),
            irq: field_u64(&parts, 6),
            softirq: field_u64(&parts, 7),
            steal: field_u64(&parts, 8),
        })
    })
}

/// Read `/proc/stat`. Required: failure is a [`CollectError::RequiredSource`].
pub fn read_cpu_times(paths: &HostPaths) -> Result<CpuTimes> {
    let path = paths.proc("stat");
    let content =
        std::fs::read_to_string(&path).map_err(|e| CollectError::required(&path, e))?;
    parse_cpu_times(&content).ok_or_else(|| {
        CollectError::required(
            &path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "no aggregate cpu line"),
        )
    })
}

/// Memory counters from `/proc/meminfo`, all in KB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemorySample {
    pub total_kb: u64,
    pub free_kb: u64,
    pub available_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
    pub swap_total_kb: u64,
    pub swap_free_kb: u64,
}

impl MemorySample {
    pub fn used_kb(&self) -> u64 {
        self.total_kb.saturating_sub(self.available_kb)
    }

    pub fn swap_used_kb(&self) -> u64 {
        self.swap_total_kb.saturating_sub(self.swap_free_kb)
    }

    pub fn used_percent(&self) -> f64 {
        if self.total_kb == 0 {
            return 0.0;
        }
        self.used_kb() as f64 * 100.0 / self.total_kb as f64
    }
}

/// The `/proc/meminfo` keys we track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MemField {
    Total,
    Free,
    Available,
    Buffers,
    Cached,
    SwapTotal,
    SwapFree,
}

impl MemField {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "MemTotal" => Self::Total,
            "MemFree" => Self::Free,
            "MemAvailable" => Self::Available,
            "Buffers" => Self::Buffers,
            "Cached" => Self::Cached,
            "SwapTotal" => Self::SwapTotal,
            "SwapFree" => Self::SwapFree,
            _ => return None,
        })
    }

    fn slot(self, sample: &mut MemorySample) -> &mut u64 {
        match self {
            Self::Total => &mut sample.total_kb,
            Self::Free => &mut sample.free_kb,
            Self::Available => &mut sample.available_kb,
            Self::Buffers => &mut sample.buffers_kb,
            Self::Cached => &mut sample.cached_kb,
            Self::SwapTotal => &mut sample.swap_total_kb,
            Self::SwapFree => &mut sample.swap_free_kb,
        }
    }
}

pub fn parse_meminfo(content: &str) -> MemorySample {
    let mut sample = MemorySample::default();
    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        if let Some(field) = MemField::from_key(key.trim()) {
            let value = rest
                .split_whitespace()
                .next()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            *field.slot(&mut sample) = value;
        }
    }
    sample
}

/// Read `/proc/meminfo`. Required.
pub fn read_meminfo(paths: &HostPaths) -> Result<MemorySample> {
    let path = paths.proc("meminfo");
    let content =
        std::fs::read_to_string(&path).map_err(|e| CollectError::required(&path, e))?;
    Ok(parse_meminfo(&content))
}

/// Cumulative counters for one block device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiskSample {
    /// 512-byte sectors read
    pub sectors_read: u64,
    pub sectors_written: u64,
    /// Time spent doing I/O (ms)
    pub io_time_ms: u64,
}

impl DiskSample {
    /// Counter growth from `self` to `other`; decreases clamp to 0.
    pub fn delta(&self, other: &Self) -> Self {
        Self {
            sectors_read: other.sectors_read.saturating_sub(self.sectors_read),
            sectors_written: other.sectors_written.saturating_sub(self.sectors_written),
            io_time_ms: other.io_time_ms.saturating_sub(self.io_time_ms),
        }
    }
}

/// Parse `/proc/diskstats` into per-device samples.
///
/// Lines too short to carry the I/O time column are skipped.
pub fn parse_diskstats(content: &str) -> BTreeMap<String, DiskSample> {
    let mut disks = BTreeMap::new();
    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 13 {
            continue;
        }
        disks.insert(
            parts[2].to_string(),
            DiskSample {
                sectors_read: field_u64(&parts, 5),
                sectors_written: field_u64(&parts, 9),
                io_time_ms: field_u64(&parts, 12),
            },
        );
    }
    disks
}

pub fn read_diskstats(paths: &HostPaths) -> BTreeMap<String, DiskSample> {
    read_optional(&paths.proc("diskstats"))
        .map(|c| parse_diskstats(&c))
        .unwrap_or_default()
}

/// Cumulative byte counters for one network interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NetSample {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl NetSample {
    pub fn delta(&self, other: &Self) -> Self {
        Self {
            rx_bytes: other.rx_bytes.saturating_sub(self.rx_bytes),
            tx_bytes: other.tx_bytes.saturating_sub(self.tx_bytes),
        }
    }
}

/// Parse `/proc/net/dev`. The two header lines are skipped.
///
/// The interface name is split at the colon, so `eth0:123` and `eth0: 123`
/// both parse.
pub fn parse_net_dev(content: &str) -> BTreeMap<String, NetSample> {
    let mut interfaces = BTreeMap::new();
    for line in content.lines().skip(2) {
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        let parts: Vec<&str> = counters.split_whitespace().collect();
        if parts.len() < 9 {
            continue;
        }
        interfaces.insert(
            name.trim().to_string(),
            NetSample {
                rx_bytes: field_u64(&parts, 0),
                tx_bytes: field_u64(&parts, 8),
            },
        );
    }
    interfaces
}

pub fn read_net_dev(paths: &HostPaths) -> BTreeMap<String, NetSample> {
    read_optional(&paths.proc("net/dev"))
        .map(|c| parse_net_dev(&c))
        .unwrap_or_default()
}

/// Seconds since boot, the first field of `/proc/uptime`.
pub fn parse_uptime(content: &str) -> f64 {
    content
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0)
}

pub fn read_uptime(paths: &HostPaths) -> f64 {
    read_optional(&paths.proc("uptime"))
        .map(|c| parse_uptime(&c))
        .unwrap_or(0.0)
}

/// Run-queue averages from `/proc/loadavg`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

pub fn parse_loadavg(content: &str) -> LoadAverage {
    let parts: Vec<&str> = content.split_whitespace().collect();
    let at = |i: usize| parts.get(i).and_then(|s| s.parse().ok()).unwrap_or(0.0);
    LoadAverage {
        one: at(0),
        five: at(1),
        fifteen: at(2),
    }
}

pub fn read_loadavg(paths: &HostPaths) -> LoadAverage {
    read_optional(&paths.proc("loadavg"))
        .map(|c| parse_loadavg(&c))
        .unwrap_or_default()
}

/// One row of `/proc/swaps`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SwapArea {
    pub name: String,
    /// `partition` or `file`
    pub kind: String,
    pub size_kb: u64,
    pub used_kb: u64,
}

pub fn parse_swaps(content: &str) -> Vec<SwapArea> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return None;
            }
            Some(SwapArea {
                name: parts[0].to_string(),
                kind: parts[1].to_string(),
                size_kb: field_u64(&parts, 2),
                used_kb: field_u64(&parts, 3),
            })
        })
        .collect()
}

pub fn read_swaps(paths: &HostPaths) -> Vec<SwapArea> {
    read_optional(&paths.proc("swaps"))
        .map(|c| parse_swaps(&c))
        .unwrap_or_default()
}

/// Undo the octal escapes the kernel applies to mount table fields.
///
/// Space, tab, newline and backslash appear as `\040`, `\011`, `\012` and
/// `\134`. Anything that is not a three-digit octal escape is kept as is.
pub fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escape = bytes.get(i + 1..i + 4).filter(|digits| {
            bytes[i] == b'\\' && digits.iter().all(|d| (b'0'..=b'7').contains(d))
        });
        match escape {
            Some(digits) => {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                out.push(value as u8);
                i += 4;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Mount points backed by a `/dev/` device, skipping `squashfs` and `tmpfs`.
///
/// `/` is always present. The result is sorted and unique.
pub fn mounted_partitions(mounts: &str) -> Vec<String> {
    let mut points: Vec<String> = mounts
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let device = parts.next()?;
            let mount_point = parts.next()?;
            let fs_type = parts.next()?;
            (device.starts_with("/dev/") && fs_type != "squashfs" && fs_type != "tmpfs")
                .then(|| unescape_mount_field(mount_point))
        })
        .collect();
    points.push("/".to_string());
    points.sort();
    points.dedup();
    points
}

/// Capacity of one mounted filesystem.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilesystemUsage {
    pub mount: String,
    pub total_bytes: u64,
    /// Space available to unprivileged users
    pub available_bytes: u64,
}

impl FilesystemUsage {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }
}

/// Query capacity of the filesystem mounted at `mount` via `statvfs(3)`.
pub fn filesystem_usage(mount: &Path) -> Option<FilesystemUsage> {
    let c_path = CString::new(mount.as_os_str().as_bytes()).ok()?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        debug!(
            mount = %mount.display(),
            error = %std::io::Error::last_os_error(),
            "statvfs failed"
        );
        return None;
    }
    let frsize = stat.f_frsize as u64;
    Some(FilesystemUsage {
        mount: mount.display().to_string(),
        total_bytes: (stat.f_blocks as u64).saturating_mul(frsize),
        available_bytes: (stat.f_bavail as u64).saturating_mul(frsize),
    })
}

/// Capacity of every mounted partition listed in `<proc>/mounts`.
///
/// Capacity is a property of the running host, so a fixture proc root
/// yields no filesystems. On the live host `sysinfo` supplies the figures
/// and `statvfs` covers mount points it does not list.
pub fn read_filesystems(paths: &HostPaths) -> Vec<FilesystemUsage> {
    if !paths.is_live() {
        debug!(root = %paths.proc_root.display(), "filesystem capacity skipped");
        return Vec::new();
    }
    let mounts = read_optional(&paths.proc("mounts")).unwrap_or_default();
    let disks = Disks::new_with_refreshed_list();
    mounted_partitions(&mounts)
        .iter()
        .filter_map(|mount| {
            disks
                .list()
                .iter()
                .find(|d| d.mount_point() == Path::new(mount))
                .map(|d| FilesystemUsage {
                    mount: mount.clone(),
                    total_bytes: d.total_space(),
                    available_bytes: d.available_space(),
                })
                .or_else(|| filesystem_usage(Path::new(mount)))
        })
        .collect()
}

/// Clock of the first core from the first `cpu MHz` line of `/proc/cpuinfo`.
///
/// Many ARM kernels omit the line, so absence is `None` rather than 0.
pub fn parse_cpu_mhz(cpuinfo: &str) -> Option<f64> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "cpu MHz")
            .then(|| value.trim().parse::<f64>().ok())
            .flatten()
    })
}

pub fn read_cpu_mhz(paths: &HostPaths) -> Option<f64> {
    read_optional(&paths.proc("cpuinfo")).and_then(|c| parse_cpu_mhz(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  100 0 50 850 0 0 0 0 0 0\n\
                        cpu0 50 0 25 425 0 0 0 0 0 0\n\
                        intr 12345\nctxt 999\n";

    #[test]
    fn cpu_line_is_aggregate_only() {
        let times = parse_cpu_times(STAT).unwrap();
        assert_eq!(times.user, 100);
        assert_eq!(times.idle, 850);
        assert_eq!(times.total_time(), 1000);
        assert_eq!(times.idle_time(), 850);
        assert_eq!(times.active_time(), 150);
    }

    #[test]
    fn cpu_line_missing_is_none() {
        assert!(parse_cpu_times("cpu0 1 2 3 4\nintr 5\n").is_none());
    }

    #[test]
    fn short_cpu_line_defaults_missing_fields() {
        let times = parse_cpu_times("cpu 10 x 5 100 7\n").unwrap();
        assert_eq!(times.nice, 0);
        assert_eq!(times.iowait, 7);
        assert_eq!(times.steal, 0);
    }

    #[test]
    fn meminfo_known_keys() {
        let text = "MemTotal:       16000000 kB\n\
                    MemFree:         2000000 kB\n\
                    MemAvailable:    6000000 kB\n\
                    Buffers:          500000 kB\n\
                    Cached:          3000000 kB\n\
                    SwapCached:         1000 kB\n\
                    SwapTotal:       4000000 kB\n\
                    SwapFree:        3500000 kB\n\
                    HugePages_Total:       0\n";
        let mem = parse_meminfo(text);
        assert_eq!(mem.total_kb, 16_000_000);
        assert_eq!(mem.cached_kb, 3_000_000);
        assert_eq!(mem.used_kb(), 10_000_000);
        assert_eq!(mem.swap_used_kb(), 500_000);
        assert!((mem.used_percent() - 62.5).abs() < 1e-9);
    }

    #[test]
    fn meminfo_bad_value_reads_zero() {
        let mem = parse_meminfo("MemTotal: lots kB\nMemFree: 10 kB\n");
        assert_eq!(mem.total_kb, 0);
        assert_eq!(mem.free_kb, 10);
        assert_eq!(mem.used_percent(), 0.0);
    }

    #[test]
    fn diskstats_fields() {
        let text = "   8       0 sda 100 0 1000 50 20 0 2000 40 0 300 90 0 0 0 0\n\
                       8       1 sda1 10 0 100 5 2 0 200 4 0 30 9\n\
                       7       0 loop0 1 0\n";
        let disks = parse_diskstats(text);
        assert_eq!(disks.len(), 2);
        let sda = disks["sda"];
        assert_eq!(sda.sectors_read, 1000);
        assert_eq!(sda.sectors_written, 2000);
        assert_eq!(sda.io_time_ms, 300);
        assert_eq!(disks["sda1"].io_time_ms, 30);
    }

    #[test]
    fn disk_delta_clamps_reset() {
        let before = DiskSample {
            sectors_read: 500,
            sectors_written: 10,
            io_time_ms: 7,
        };
        let after = DiskSample {
            sectors_read: 100,
            sectors_written: 30,
            io_time_ms: 9,
        };
        let d = before.delta(&after);
        assert_eq!(d.sectors_read, 0);
        assert_eq!(d.sectors_written, 20);
        assert_eq!(d.io_time_ms, 2);
    }

    #[test]
    fn net_dev_parses_both_name_styles() {
        let text = "Inter-|   Receive                            |  Transmit\n \
                    face |bytes    packets errs drop fifo frame compressed multicast|bytes\n    \
                    lo: 500 5 0 0 0 0 0 0 500 5 0 0 0 0 0 0\n  \
                    eth0:1000 10 0 0 0 0 0 0 2000 20 0 0 0 0 0 0\n";
        let ifaces = parse_net_dev(text);
        assert_eq!(ifaces["lo"].rx_bytes, 500);
        assert_eq!(ifaces["eth0"].rx_bytes, 1000);
        assert_eq!(ifaces["eth0"].tx_bytes, 2000);
    }

    #[test]
    fn loadavg_and_uptime() {
        let load = parse_loadavg("0.52 0.58 0.59 1/467 12345\n");
        assert_eq!(load.one, 0.52);
        assert_eq!(load.fifteen, 0.59);
        assert_eq!(parse_uptime("3600.25 7000.00\n"), 3600.25);
        assert_eq!(parse_uptime(""), 0.0);
    }

    #[test]
    fn swaps_skip_header() {
        let text = "Filename\tType\tSize\tUsed\tPriority\n\
                    /dev/sda2 partition 2097148 1024 -2\n\
                    /swapfile file 1048572 0 -3\n";
        let swaps = parse_swaps(text);
        assert_eq!(swaps.len(), 2);
        assert_eq!(swaps[0].kind, "partition");
        assert_eq!(swaps[0].used_kb, 1024);
        assert_eq!(swaps[1].name, "/swapfile");
    }

    #[test]
    fn partitions_filter_virtual_filesystems() {
        let mounts = "/dev/nvme0n1p2 / ext4 rw 0 0\n\
                      /dev/nvme0n1p1 /boot/efi vfat rw 0 0\n\
                      /dev/loop3 /snap/core squashfs ro 0 0\n\
                      tmpfs /run tmpfs rw 0 0\n\
                      proc /proc proc rw 0 0\n";
        assert_eq!(mounted_partitions(mounts), vec!["/", "/boot/efi"]);
        assert_eq!(mounted_partitions(""), vec!["/"]);
    }

    #[test]
    fn mount_escapes_decoded() {
        assert_eq!(unescape_mount_field("/mnt/my\\040disk"), "/mnt/my disk");
        assert_eq!(unescape_mount_field("/a\\011b\\134c"), "/a\tb\\c");
        assert_eq!(unescape_mount_field("/plain"), "/plain");
        assert_eq!(unescape_mount_field("/odd\\09x\\"), "/odd\\09x\\");

        let mounts = "/dev/sdb1 /media/USB\\040Stick vfat rw 0 0\n";
        assert_eq!(mounted_partitions(mounts), vec!["/", "/media/USB Stick"]);
    }

    #[test]
    fn fixture_root_reports_no_capacity() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mounts"), "/dev/sda1 / ext4 rw 0 0\n").unwrap();
        let paths = HostPaths {
            proc_root: dir.path().to_path_buf(),
            ..HostPaths::default()
        };
        assert!(!paths.is_live());
        assert!(read_filesystems(&paths).is_empty());
    }

    #[test]
    fn live_root_includes_root_filesystem() {
        let paths = HostPaths::default();
        assert!(paths.is_live());
        let filesystems = read_filesystems(&paths);
        let root = filesystems.iter().find(|fs| fs.mount == "/").unwrap();
        assert!(root.total_bytes >= root.available_bytes);
    }

    #[test]
    fn cpu_mhz_first_core() {
        let cpuinfo = "processor\t: 0\ncpu MHz\t\t: 3400.125\n\nprocessor\t: 1\ncpu MHz\t\t: 2200.000\n";
        assert_eq!(parse_cpu_mhz(cpuinfo), Some(3400.125));
        assert_eq!(parse_cpu_mhz("processor\t: 0\nBogoMIPS\t: 48.00\n"), None);
    }

    #[test]
    fn statvfs_on_root() {
        let usage = filesystem_usage(Path::new("/")).unwrap();
        assert!(usage.total_bytes >= usage.available_bytes);
        assert!(filesystem_usage(Path::new("/definitely/not/here")).is_none());
    }
}
