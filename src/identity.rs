//! Identity resolvers: owner names, primary disk, primary interface.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::debug;

/// Fallback when no device-backed root filesystem is found.
pub const FALLBACK_DISK: &str = "sda";
/// Fallback when the routing table has no default route.
pub const FALLBACK_INTERFACE: &str = "eth0";

/// Owner id to login name, loaded from an `/etc/passwd`-format table.
#[derive(Clone, Debug, Default)]
pub struct UserTable {
    names: HashMap<u32, String>,
}

impl UserTable {
    pub fn parse(content: &str) -> Self {
        let names = content
            .lines()
            .filter(|line| !line.starts_with('#'))
            .filter_map(|line| {
                let mut fields = line.split(':');
                let name = fields.next()?;
                let uid = fields.nth(1)?.parse().ok()?;
                (!name.is_empty()).then(|| (uid, name.to_string()))
            })
            .collect();
        Self { names }
    }

    /// Load the table; an unreadable file yields an empty table.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "identity table unavailable");
                Self::default()
            }
        }
    }

    /// Display name for `uid`; the decimal id when there is no entry.
    pub fn resolve(&self, uid: u32) -> String {
        self.names
            .get(&uid)
            .cloned()
            .unwrap_or_else(|| uid.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Device name mounted at `/`, without its `/dev/` prefix.
///
/// Returns `None` for non-device roots (overlay, tmpfs, rootfs).
pub fn root_device(mounts: &str) -> Option<String> {
    mounts.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let device = parts.next()?;
        let mount_point = parts.next()?;
        if mount_point != "/" {
            return None;
        }
        device.strip_prefix("/dev/").map(str::to_string)
    })
}

/// Strip a partition suffix: `sda1` to `sda`, `nvme0n1p2` to `nvme0n1`.
///
/// Names without a trailing number are returned unchanged.
pub fn parent_block_device(name: &str) -> &str {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if base.len() == name.len() || base.is_empty() {
        return name;
    }
    match base.strip_suffix('p') {
        Some(stem) if stem.ends_with(|c: char| c.is_ascii_digit()) => stem,
        _ => base,
    }
}

/// Resolve the primary disk as named in `diskstats`.
///
/// Prefers the parent of the root partition; falls back to the root device
/// itself when the parent is unknown (whole-disk roots like `nvme0n1` or
/// `dm-0`), then to [`FALLBACK_DISK`].
pub fn primary_disk<V>(mounts: &str, diskstats: &BTreeMap<String, V>) -> String {
    let Some(device) = root_device(mounts) else {
        return FALLBACK_DISK.to_string();
    };
    let parent = parent_block_device(&device);
    if diskstats.contains_key(parent) || !diskstats.contains_key(device.as_str()) {
        parent.to_string()
    } else {
        device
    }
}

/// Interface carrying the default route in `/proc/net/route`.
pub fn primary_interface(route: &str) -> String {
    route
        .lines()
        .skip(1)
        .find_map(|line| {
            let mut parts = line.split_whitespace();
            let iface = parts.next()?;
            (parts.next()? == "00000000").then(|| iface.to_string())
        })
        .unwrap_or_else(|| FALLBACK_INTERFACE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwd_resolution() {
        let table = UserTable::parse(
            "root:x:0:0:root:/root:/bin/bash\n\
             # comment\n\
             alice:x:1000:1000:Alice:/home/alice:/bin/zsh\n\
             broken-line\n",
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(0), "root");
        assert_eq!(table.resolve(1000), "alice");
        assert_eq!(table.resolve(4242), "4242");
    }

    #[test]
    fn missing_table_is_empty() {
        let table = UserTable::load(Path::new("/nonexistent/passwd"));
        assert!(table.is_empty());
        assert_eq!(table.resolve(0), "0");
    }

    #[test]
    fn partition_suffixes() {
        assert_eq!(parent_block_device("sda1"), "sda");
        assert_eq!(parent_block_device("sda"), "sda");
        assert_eq!(parent_block_device("nvme0n1p2"), "nvme0n1");
        assert_eq!(parent_block_device("mmcblk0p1"), "mmcblk0");
        assert_eq!(parent_block_device("vda15"), "vda");
        assert_eq!(parent_block_device("123"), "123");
    }

    #[test]
    fn primary_disk_prefers_known_parent() {
        let mounts = "/dev/nvme0n1p2 / ext4 rw 0 0\n";
        let mut stats: BTreeMap<String, ()> = BTreeMap::new();
        stats.insert("nvme0n1".into(), ());
        stats.insert("nvme0n1p2".into(), ());
        assert_eq!(primary_disk(mounts, &stats), "nvme0n1");
    }

    #[test]
    fn primary_disk_whole_device_root() {
        let mounts = "/dev/dm-0 / ext4 rw 0 0\n";
        let mut stats: BTreeMap<String, ()> = BTreeMap::new();
        stats.insert("dm-0".into(), ());
        assert_eq!(primary_disk(mounts, &stats), "dm-0");
    }

    #[test]
    fn primary_disk_fallback() {
        let stats: BTreeMap<String, ()> = BTreeMap::new();
        assert_eq!(primary_disk("overlay / overlay rw 0 0\n", &stats), "sda");
        assert_eq!(primary_disk("", &stats), "sda");
        assert_eq!(primary_disk("/dev/sdb3 / ext4 rw 0 0\n", &stats), "sdb");
    }

    #[test]
    fn default_route_interface() {
        let route = "Iface\tDestination\tGateway\tFlags\n\
                     wlan0\t0000A8C0\t00000000\t0001\n\
                     wlan0\t00000000\t0100A8C0\t0003\n";
        assert_eq!(primary_interface(route), "wlan0");
        assert_eq!(primary_interface("Iface\tDestination\n"), "eth0");
    }
}
