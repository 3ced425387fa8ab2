use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub mod error;

pub use error::{BlkError, Result};

pub const DEFAULT_DEV_DIR: &str = "/dev";
pub const DEFAULT_SYS_BLOCK_DIR: &str = "/sys/block";
pub const DEFAULT_UDEV_DATA_DIR: &str = "/run/udev/data";
pub const DEFAULT_MOUNT_TABLE: &str = "/proc/self/mountinfo";
pub const OS_RELEASE_RELATIVE_PATH: &str = "etc/os-release";

/// Host locations read during an inspection. `Default` points at the live system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPaths {
    pub dev_dir: PathBuf,
    pub sys_block_dir: PathBuf,
    pub udev_data_dir: PathBuf,
    pub mount_table: PathBuf,   // mountinfo or legacy mtab, detected from content
    pub os_release: PathBuf,    // relative to a mountpoint
}

impl Default for SystemPaths {
    fn default() -> Self {
        Self {
            dev_dir: PathBuf::from(DEFAULT_DEV_DIR),
            sys_block_dir: PathBuf::from(DEFAULT_SYS_BLOCK_DIR),
            udev_data_dir: PathBuf::from(DEFAULT_UDEV_DATA_DIR),
            mount_table: PathBuf::from(DEFAULT_MOUNT_TABLE),
            os_release: PathBuf::from(OS_RELEASE_RELATIVE_PATH),
        }
    }
}

impl SystemPaths {
    /// Device node path for a kernel device name, e.g. `sda1` -> `/dev/sda1`.
    pub fn device_node(&self, name: &str) -> String {
        path_string(&self.dev_dir.join(name))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BlkInfo {
    #[serde(flatten)]
    pub identity: DeviceIdentity,
    pub sys: SysfsTopology,
    pub udev_data_path: String,
    pub udev_data: UdevRecord,
    pub mount_info_path: String,
    pub mount_info: MountRecord,
    pub os_release_path: String,    // empty when unmounted
    pub os_release: OsRelease,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub path: String,
    pub resolved_path: String,
    pub major_minor: String,        // "MAJOR:MINOR"
    pub sys_path: String,
    pub resolved_sys_path: String,
    pub parent_path: String,        // empty for whole disks
    pub child_paths: Vec<String>,   // empty for partitions
    pub mount_point: String,        // empty when unmounted
}

/// Facts read from a device's sysfs directory.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SysfsTopology {
    pub uevent: Vec<String>,
    // /sys/block/dm-0/slaves/sda  --> /sys/block/sda
    // /sys/block/sda/holders/dm-0 --> /sys/block/dm-0
    pub slaves: Vec<String>,
    pub holders: Vec<String>,
}

/// One mount table line. Fields only present in mountinfo stay empty for mtab input.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct MountRecord {
    pub mount_id: String,
    pub parent_id: String,
    pub major_minor: String,
    pub root: String,
    pub mount_point: String,
    pub mount_options: Vec<String>,
    pub optional_fields: Vec<String>,
    pub filesystem_type: String,
    pub mount_source: String,
    pub super_options: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct UdevRecord {
    pub lines: Vec<String>,
    pub aliases: Vec<String>,
    pub properties: BTreeMap<String, String>,
    pub fs_uuid: String,
    pub fs_type: String,
    pub partition_table: PartitionTable,
    pub partition_entry: PartitionEntry,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PartitionTable {
    #[serde(rename = "type")]
    pub kind: String,
    pub uuid: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PartitionEntry {
    pub scheme: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub uuid: String,
    pub name: String,
    pub number: String,
    pub offset: String,
    pub size: String,
    pub disk: String,
    pub flags: String,
}

/// Parsed `os-release` key/value pairs.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct OsRelease(BTreeMap<String, String>);

impl OsRelease {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("NAME")
    }

    pub fn id(&self) -> Option<&str> {
        self.get("ID")
    }

    pub fn version_id(&self) -> Option<&str> {
        self.get("VERSION_ID")
    }

    pub fn pretty_name(&self) -> Option<&str> {
        self.get("PRETTY_NAME")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for OsRelease {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Strips one matching pair of `"` or `'` around `value`. Unbalanced quotes are kept.
pub fn trim_quotation_marks(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.starts_with(quote) && value.ends_with(quote) {
            return value[1..].strip_suffix(quote).unwrap_or("");
        }
    }
    value
}

pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_matching_quotes_only() {
        let cases = [
            ("foo", "foo"),
            ("\"foo\"", "foo"),
            ("'foo'", "foo"),
            ("\"'foo'\"", "'foo'"),
            ("'\"foo\"'", "\"foo\""),
            ("\"foo", "\"foo"),
            ("'foo", "'foo"),
            ("foo\"", "foo\""),
            ("foo'", "foo'"),
            ("\"foo'", "\"foo'"),
            ("\"\"", ""),
            ("", ""),
        ];
        for (input, want) in cases {
            assert_eq!(trim_quotation_marks(input), want, "input: {input}");
        }
    }

    #[test]
    fn default_paths_point_at_live_system() {
        let paths = SystemPaths::default();
        assert_eq!(paths.sys_block_dir, PathBuf::from("/sys/block"));
        assert_eq!(paths.udev_data_dir, PathBuf::from("/run/udev/data"));
        assert_eq!(paths.device_node("sda1"), "/dev/sda1");
    }

    #[test]
    fn empty_collections_serialize_as_empty() {
        let info = BlkInfo {
            identity: DeviceIdentity::default(),
            sys: SysfsTopology::default(),
            udev_data_path: String::new(),
            udev_data: UdevRecord::default(),
            mount_info_path: String::new(),
            mount_info: MountRecord::default(),
            os_release_path: String::new(),
            os_release: OsRelease::default(),
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["child_paths"], serde_json::json!([]));
        assert_eq!(value["mount_point"], serde_json::json!(""));
        assert_eq!(value["sys"]["slaves"], serde_json::json!([]));
        assert_eq!(value["mount_info"]["super_options"], serde_json::json!([]));
        assert_eq!(value["os_release"], serde_json::json!({}));
        assert_eq!(value["udev_data"]["partition_table"]["type"], serde_json::json!(""));
    }

    #[test]
    fn os_release_accessors() {
        let release: OsRelease = [
            ("NAME".to_string(), "Ubuntu".to_string()),
            ("VERSION_ID".to_string(), "18.04".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(release.name(), Some("Ubuntu"));
        assert_eq!(release.version_id(), Some("18.04"));
        assert_eq!(release.id(), None);
        assert_eq!(release.len(), 2);
        let pairs: Vec<(&str, &str)> = release.iter().collect();
        assert_eq!(pairs, vec![("NAME", "Ubuntu"), ("VERSION_ID", "18.04")]);
    }
}
