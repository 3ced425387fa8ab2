use blkinfo_core::{path_string, trim_quotation_marks, BlkError, OsRelease, Result, SystemPaths};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct OsReleaseReader<'a> {
    paths: &'a SystemPaths,
}

impl<'a> OsReleaseReader<'a> {
    pub fn new(paths: &'a SystemPaths) -> Self {
        Self { paths }
    }

    /// `<mount_point>/etc/os-release`, or `None` for an unmounted device.
    pub fn path_for(&self, mount_point: &str) -> Option<PathBuf> {
        if mount_point.is_empty() {
            return None;
        }
        Some(Path::new(mount_point).join(&self.paths.os_release))
    }

    /// Reads the OS identity on `mount_point`. Unmounted devices and filesystems
    /// without an os-release file yield an empty mapping.
    pub fn read(&self, mount_point: &str) -> Result<OsRelease> {
        let Some(path) = self.path_for(mount_point) else {
            return Ok(OsRelease::default());
        };
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no os-release file");
                return Ok(OsRelease::default());
            }
            Err(err) => return Err(BlkError::from_io(&path, err)),
        };
        if metadata.is_dir() {
            return Err(BlkError::InvalidState(format!(
                "{} is a directory",
                path.display()
            )));
        }
        let data = fs::read_to_string(&path).map_err(|err| BlkError::from_io(&path, err))?;
        parse_os_release(&data)
    }

    /// Like [`OsReleaseReader::read`], but an unmounted device is an error.
    pub fn read_mounted(&self, mount_point: &str) -> Result<OsRelease> {
        if mount_point.is_empty() {
            return Err(BlkError::NotFound(
                "device is not mounted, no os-release to read".to_string(),
            ));
        }
        self.read(mount_point)
    }

    pub fn display_path(&self, mount_point: &str) -> String {
        self.path_for(mount_point)
            .map(|path| path_string(&path))
            .unwrap_or_default()
    }
}

pub fn parse_os_release(data: &str) -> Result<OsRelease> {
    let mut pairs = Vec::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| {
            BlkError::InvalidState(format!("unexpected os-release line: {line}"))
        })?;
        pairs.push((key.to_string(), trim_quotation_marks(value).to_string()));
    }
    Ok(pairs.into_iter().collect())
}
