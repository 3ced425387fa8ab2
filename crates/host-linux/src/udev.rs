use crate::fsutil::read_lines;
use blkinfo_core::{
    path_string, trim_quotation_marks, PartitionEntry, PartitionTable, Result, SystemPaths,
    UdevRecord,
};
use std::path::{Path, PathBuf};
use tracing::debug;

const PART_TABLE_PREFIX: &str = "ID_PART_TABLE_";
const PART_ENTRY_PREFIX: &str = "ID_PART_ENTRY_";

/// Reader for the udev runtime database (`/run/udev/data`).
pub struct UdevDatabase<'a> {
    paths: &'a SystemPaths,
}

impl<'a> UdevDatabase<'a> {
    pub fn new(paths: &'a SystemPaths) -> Self {
        Self { paths }
    }

    /// Block devices are stored as `b<major>:<minor>`.
    pub fn data_path(&self, major_minor: &str) -> PathBuf {
        self.paths.udev_data_dir.join(format!("b{major_minor}"))
    }

    pub fn read(&self, major_minor: &str) -> Result<UdevRecord> {
        let path = self.data_path(major_minor);
        let lines = read_lines(&path)?;
        debug!(path = %path.display(), lines = lines.len(), "read udev record");
        Ok(parse_udev_data(lines, &self.paths.dev_dir))
    }
}

pub fn parse_udev_data(lines: Vec<String>, dev_dir: &Path) -> UdevRecord {
    let mut record = UdevRecord::default();

    for line in &lines {
        if let Some(link) = line.strip_prefix("S:") {
            record.aliases.push(path_string(&dev_dir.join(link)));
            continue;
        }
        let Some(assignment) = line.strip_prefix("E:") else {
            continue;
        };
        let Some((key, raw)) = assignment.split_once('=') else {
            continue;
        };
        let value = trim_quotation_marks(raw).to_string();

        if key == "ID_FS_UUID" {
            record.fs_uuid = value;
        } else if key == "ID_FS_TYPE" {
            record.fs_type = value;
        } else if let Some(field) = key.strip_prefix(PART_TABLE_PREFIX) {
            set_partition_table_field(&mut record.partition_table, field, value);
        } else if let Some(field) = key.strip_prefix(PART_ENTRY_PREFIX) {
            set_partition_entry_field(&mut record.partition_entry, field, value);
        }
        record.properties.insert(key.to_string(), raw.to_string());
    }

    record.lines = lines;
    record
}

fn set_partition_table_field(table: &mut PartitionTable, field: &str, value: String) {
    match field {
        "TYPE" => table.kind = value,
        "UUID" => table.uuid = value,
        _ => {}
    }
}

fn set_partition_entry_field(entry: &mut PartitionEntry, field: &str, value: String) {
    match field {
        "SCHEME" => entry.scheme = value,
        "TYPE" => entry.kind = value,
        "UUID" => entry.uuid = value,
        "NAME" => entry.name = value,
        "NUMBER" => entry.number = value,
        "OFFSET" => entry.offset = value,
        "SIZE" => entry.size = value,
        "DISK" => entry.disk = value,
        "FLAGS" => entry.flags = value,
        _ => {}
    }
}
