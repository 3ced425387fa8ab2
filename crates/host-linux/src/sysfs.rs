use crate::fsutil::{list_names, list_names_required, read_lines, read_string, resolve_path};
use blkinfo_core::{BlkError, Result, SysfsTopology, SystemPaths};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a device lives under the sysfs block tree and how it relates to its disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsLocation {
    pub sys_path: PathBuf,
    pub resolved_sys_path: PathBuf,
    pub parent_path: String,
    pub child_paths: Vec<String>,
}

pub struct SysfsLocator<'a> {
    paths: &'a SystemPaths,
}

impl<'a> SysfsLocator<'a> {
    pub fn new(paths: &'a SystemPaths) -> Self {
        Self { paths }
    }

    /// Finds the sysfs entry for a canonical device node path.
    ///
    /// The first `/sys/block` entry (in name order) that is a prefix of the device
    /// name wins: an exact match is a whole disk, anything longer is one of its
    /// partitions. Names where one disk is a literal prefix of another resolve to
    /// the shorter entry, mirroring the kernel naming scheme. On real hosts this
    /// hits `loop1` vs `loop10` and `mmcblk0` vs `mmcblk0boot0` (as well as the
    /// rarer `sda` vs `sdab`): the longer device is taken for a partition of the
    /// shorter one and ends in `NotFound`.
    pub fn locate(&self, device: &Path) -> Result<SysfsLocation> {
        let dev_name = device
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| {
                BlkError::InvalidArgument(format!("{} has no device name", device.display()))
            })?;
        let block_dir = &self.paths.sys_block_dir;

        let Some(entry) = list_names_required(block_dir)?
            .into_iter()
            .find(|entry| dev_name.starts_with(entry.as_str()))
        else {
            return Err(BlkError::NotFound(format!(
                "no entry under {} for {}",
                block_dir.display(),
                dev_name
            )));
        };

        let (sys_path, parent_path, child_paths) = if entry == dev_name {
            // /sys/block/sda
            let sys_path = block_dir.join(&entry);
            let child_paths = list_names_required(&sys_path)?
                .into_iter()
                .filter(|name| name.starts_with(dev_name.as_str()))
                .map(|name| self.paths.device_node(&name))
                .collect();
            (sys_path, String::new(), child_paths)
        } else {
            // /sys/block/sda/sda1
            let sys_path = block_dir.join(&entry).join(&dev_name);
            (sys_path, self.paths.device_node(&entry), Vec::new())
        };

        // dm-* and other virtual devices are symlinks into /sys/devices
        let resolved_sys_path = resolve_path(&sys_path)?;
        debug!(
            device = %dev_name,
            sys_path = %sys_path.display(),
            resolved = %resolved_sys_path.display(),
            "located sysfs entry"
        );

        Ok(SysfsLocation {
            sys_path,
            resolved_sys_path,
            parent_path,
            child_paths,
        })
    }

    pub fn read_uevent(&self, sys_path: &Path) -> Result<Vec<String>> {
        read_lines(sys_path.join("uevent"))
    }

    pub fn read_major_minor(&self, sys_path: &Path) -> Result<String> {
        read_string(sys_path.join("dev"))
    }

    pub fn list_slaves(&self, sys_path: &Path) -> Result<Vec<String>> {
        list_names(sys_path.join("slaves"))
    }

    pub fn list_holders(&self, sys_path: &Path) -> Result<Vec<String>> {
        list_names(sys_path.join("holders"))
    }

    pub fn topology(&self, sys_path: &Path) -> Result<SysfsTopology> {
        Ok(SysfsTopology {
            uevent: self.read_uevent(sys_path)?,
            slaves: self.list_slaves(sys_path)?,
            holders: self.list_holders(sys_path)?,
        })
    }
}
