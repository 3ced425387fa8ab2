//! Block device inspection for Linux hosts.
//!
//! Correlates the mount table, the sysfs block tree, the udev runtime database
//! and the `os-release` file of a mounted filesystem into one [`BlkInfo`].
//! Every call re-reads live kernel state; nothing is cached between queries.

use blkinfo_core::{path_string, BlkInfo, DeviceIdentity, OsRelease, Result, SystemPaths};
use std::path::Path;
use tracing::debug;

mod fsutil;
pub mod mounts;
pub mod os_release;
pub mod sysfs;
pub mod udev;

pub use fsutil::resolve_path;
pub use mounts::{MountTable, MountTableFormat};
pub use os_release::OsReleaseReader;
pub use sysfs::{SysfsLocation, SysfsLocator};
pub use udev::UdevDatabase;

#[derive(Debug, Clone, Default)]
pub struct Inspector {
    paths: SystemPaths,
}

impl Inspector {
    pub fn new(paths: SystemPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &SystemPaths {
        &self.paths
    }

    /// Builds the full record for `path`. An unmounted device gets an empty OS mapping.
    pub fn inspect(&self, path: impl AsRef<Path>) -> Result<BlkInfo> {
        self.build(path.as_ref(), false)
    }

    /// Same as [`Inspector::inspect`], but fails with `NotFound` when the device is not mounted.
    pub fn inspect_mounted(&self, path: impl AsRef<Path>) -> Result<BlkInfo> {
        self.build(path.as_ref(), true)
    }

    pub fn os_release(&self, path: impl AsRef<Path>) -> Result<OsRelease> {
        let mount_point = self.mount_point(path)?;
        OsReleaseReader::new(&self.paths).read(&mount_point)
    }

    pub fn mounted_os_release(&self, path: impl AsRef<Path>) -> Result<OsRelease> {
        let mount_point = self.mount_point(path)?;
        OsReleaseReader::new(&self.paths).read_mounted(&mount_point)
    }

    /// Mountpoint of the device behind `path`; empty when unmounted.
    pub fn mount_point(&self, path: impl AsRef<Path>) -> Result<String> {
        let resolved = resolve_path(path)?;
        MountTable::load(&self.paths.mount_table)?.find_mountpoint(&resolved, &self.paths.dev_dir)
    }

    /// Source device of whatever is mounted at `mount_point`.
    pub fn device_for_mountpoint(&self, mount_point: impl AsRef<Path>) -> Result<String> {
        let resolved = resolve_path(mount_point)?;
        MountTable::load(&self.paths.mount_table)?.find_device_path(&resolved)
    }

    fn build(&self, path: &Path, require_mounted: bool) -> Result<BlkInfo> {
        let resolved = resolve_path(path)?;
        debug!(path = %path.display(), resolved = %resolved.display(), "resolved device path");

        let locator = SysfsLocator::new(&self.paths);
        let location = locator.locate(&resolved)?;
        let sys = locator.topology(&location.sys_path)?;
        let major_minor = locator.read_major_minor(&location.sys_path)?;

        let udev = UdevDatabase::new(&self.paths);
        let udev_data_path = udev.data_path(&major_minor);
        let udev_data = udev.read(&major_minor)?;

        let table = MountTable::load(&self.paths.mount_table)?;
        let mount_info = table
            .find_by_device(&resolved, &self.paths.dev_dir)?
            .cloned()
            .unwrap_or_default();
        let mount_point = mount_info.mount_point.clone();

        let reader = OsReleaseReader::new(&self.paths);
        let os_release = if require_mounted {
            reader.read_mounted(&mount_point)?
        } else {
            reader.read(&mount_point)?
        };

        Ok(BlkInfo {
            identity: DeviceIdentity {
                path: path_string(path),
                resolved_path: path_string(&resolved),
                major_minor,
                sys_path: path_string(&location.sys_path),
                resolved_sys_path: path_string(&location.resolved_sys_path),
                parent_path: location.parent_path,
                child_paths: location.child_paths,
                mount_point: mount_point.clone(),
            },
            sys,
            udev_data_path: path_string(&udev_data_path),
            udev_data,
            mount_info_path: path_string(table.path()),
            mount_info,
            os_release_path: reader.display_path(&mount_point),
            os_release,
        })
    }
}
