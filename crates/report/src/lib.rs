use anyhow::Result;
use blkinfo_core::BlkInfo;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub const ALLOWED: &'static str = "[json|yaml]";
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            other => Err(anyhow::anyhow!(
                "unknown format '{}', expected {}",
                other,
                Self::ALLOWED
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

/// Renders `info` as trimmed text ending in a single newline.
pub fn render_blk_info(info: &BlkInfo, format: OutputFormat) -> Result<String> {
    render(info, format)
}

pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(format!("{}\n", text.trim()))
}
