use crate::fsutil::resolve_path;
use blkinfo_core::{path_string, BlkError, MountRecord, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

const MOUNTINFO_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountTableFormat {
    /// `/proc/self/mountinfo`
    MountInfo,
    /// `/etc/mtab`, `/proc/self/mounts`
    Mtab,
}

impl MountTableFormat {
    pub fn detect(input: &str) -> Self {
        match input.lines().find(|line| !line.trim().is_empty()) {
            Some(line) if line.contains(MOUNTINFO_SEPARATOR) => MountTableFormat::MountInfo,
            _ => MountTableFormat::Mtab,
        }
    }
}

/// Snapshot of the mount table, in kernel order.
#[derive(Debug, Clone)]
pub struct MountTable {
    path: PathBuf,
    records: Vec<MountRecord>,
}

impl MountTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        // Mountpoints are raw bytes; undecodable names can never match a device.
        let data = fs::read(path).map_err(|err| BlkError::from_io(path, err))?;
        let records = parse_mount_table(&String::from_utf8_lossy(&data))?;
        debug!(path = %path.display(), records = records.len(), "loaded mount table");
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[MountRecord] {
        &self.records
    }

    /// First record whose source resolves to `device`. Only sources under `dev_dir` are considered.
    pub fn find_by_device(&self, device: &Path, dev_dir: &Path) -> Result<Option<&MountRecord>> {
        for record in &self.records {
            let source = Path::new(&record.mount_source);
            if !source.starts_with(dev_dir) {
                trace!(source = %record.mount_source, "skipping non-device mount source");
                continue;
            }
            let resolved = match resolve_path(source) {
                Ok(resolved) => resolved,
                Err(BlkError::NotFound(_)) => {
                    debug!(source = %record.mount_source, "mount source has no device node");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if resolved == device {
                debug!(
                    device = %device.display(),
                    mount_point = %record.mount_point,
                    "matched mount record"
                );
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Mountpoint of `device`, or an empty string when it is not mounted.
    pub fn find_mountpoint(&self, device: &Path, dev_dir: &Path) -> Result<String> {
        Ok(self
            .find_by_device(device, dev_dir)?
            .map(|record| record.mount_point.clone())
            .unwrap_or_default())
    }

    /// Source device of the first record mounted exactly at `mount_point`.
    pub fn find_device_path(&self, mount_point: &Path) -> Result<String> {
        let wanted = path_string(mount_point);
        self.records
            .iter()
            .find(|record| record.mount_point == wanted)
            .map(|record| record.mount_source.clone())
            .ok_or_else(|| {
                BlkError::NotFound(format!(
                    "no mount table entry for {} in {}",
                    wanted,
                    self.path.display()
                ))
            })
    }
}

pub fn parse_mount_table(input: &str) -> Result<Vec<MountRecord>> {
    let format = MountTableFormat::detect(input);
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match format {
            MountTableFormat::MountInfo => parse_mountinfo_line(line),
            MountTableFormat::Mtab => parse_mtab_line(line),
        })
        .collect()
}

// See Documentation/filesystems/proc.rst, "/proc/<pid>/mountinfo".
pub fn parse_mountinfo_line(line: &str) -> Result<MountRecord> {
    let invalid = || BlkError::InvalidState(format!("invalid mountinfo line: {line}"));
    let (left, right) = line.split_once(MOUNTINFO_SEPARATOR).ok_or_else(invalid)?;
    let left: Vec<&str> = left.split_whitespace().collect();
    let right: Vec<&str> = right.split_whitespace().collect();
    if left.len() < 6 || right.len() < 2 {
        return Err(invalid());
    }

    Ok(MountRecord {
        mount_id: left[0].to_string(),
        parent_id: left[1].to_string(),
        major_minor: left[2].to_string(),
        root: unescape_mount(left[3]),
        mount_point: unescape_mount(left[4]),
        mount_options: split_options(left[5]),
        optional_fields: left[6..].iter().map(|field| field.to_string()).collect(),
        filesystem_type: right[0].to_string(),
        mount_source: unescape_mount(right[1]),
        super_options: right.get(2).map(|opts| split_options(opts)).unwrap_or_default(),
    })
}

pub fn parse_mtab_line(line: &str) -> Result<MountRecord> {
    let mut fields = line.split_whitespace();
    let (Some(source), Some(mount_point)) = (fields.next(), fields.next()) else {
        return Err(BlkError::InvalidState(format!("invalid mtab line: {line}")));
    };
    let filesystem_type = fields.next().unwrap_or("").to_string();
    let mount_options = fields.next().map(split_options).unwrap_or_default();

    Ok(MountRecord {
        mount_source: unescape_mount(source),
        mount_point: unescape_mount(mount_point),
        filesystem_type,
        mount_options,
        ..MountRecord::default()
    })
}

fn split_options(value: &str) -> Vec<String> {
    value.split(',').map(str::to_string).collect()
}

fn unescape_mount(value: &str) -> String {
    let mut output = String::new();
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let mut octal = String::new();
            while octal.len() < 3 {
                match chars.peek() {
                    Some(next) if next.is_digit(8) => {
                        octal.push(*next);
                        chars.next();
                    }
                    _ => break,
                }
            }
            if octal.len() == 3 {
                if let Ok(byte) = u8::from_str_radix(&octal, 8) {
                    output.push(byte as char);
                    continue;
                }
            }
            output.push('\\');
            output.push_str(&octal);
        } else {
            output.push(ch);
        }
    }
    output
}
