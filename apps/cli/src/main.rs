use anyhow::Result;
use blkinfo_core::{
    SystemPaths, DEFAULT_DEV_DIR, DEFAULT_MOUNT_TABLE, DEFAULT_SYS_BLOCK_DIR,
    DEFAULT_UDEV_DATA_DIR, OS_RELEASE_RELATIVE_PATH,
};
use blkinfo_host_linux::Inspector;
use blkinfo_report::{render_blk_info, OutputFormat};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (revision ",
    env!("BLKINFO_REVISION"),
    ")"
);

#[derive(Debug, Parser)]
#[command(name = "blkinfo")]
#[command(about = "block device information utility for Linux")]
#[command(version, long_version = LONG_VERSION)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Device node or any symlink to one, e.g. /dev/sda1 or /dev/disk/by-uuid/...
    path: PathBuf,

    /// Output format [json|yaml]
    #[arg(short, long, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Treat PATH as a mountpoint and inspect the device mounted there
    #[arg(long)]
    mountpoint: bool,

    /// Fail unless the device is mounted
    #[arg(long)]
    require_mounted: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, env = "BLKINFO_DEV_DIR", default_value = DEFAULT_DEV_DIR, hide_short_help = true)]
    dev_dir: PathBuf,

    #[arg(long, env = "BLKINFO_SYS_BLOCK_DIR", default_value = DEFAULT_SYS_BLOCK_DIR, hide_short_help = true)]
    sys_block_dir: PathBuf,

    #[arg(long, env = "BLKINFO_UDEV_DATA_DIR", default_value = DEFAULT_UDEV_DATA_DIR, hide_short_help = true)]
    udev_data_dir: PathBuf,

    /// mountinfo or mtab style table
    #[arg(long, env = "BLKINFO_MOUNT_TABLE", default_value = DEFAULT_MOUNT_TABLE, hide_short_help = true)]
    mount_table: PathBuf,
}

impl Args {
    fn system_paths(&self) -> SystemPaths {
        SystemPaths {
            dev_dir: self.dev_dir.clone(),
            sys_block_dir: self.sys_block_dir.clone(),
            udev_data_dir: self.udev_data_dir.clone(),
            mount_table: self.mount_table.clone(),
            os_release: PathBuf::from(OS_RELEASE_RELATIVE_PATH),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let inspector = Inspector::new(args.system_paths());
    let device = if args.mountpoint {
        PathBuf::from(inspector.device_for_mountpoint(&args.path)?)
    } else {
        args.path.clone()
    };
    tracing::info!(device = %device.display(), "inspecting block device");

    let info = if args.require_mounted {
        inspector.inspect_mounted(&device)?
    } else {
        inspector.inspect(&device)?
    };

    print!("{}", render_blk_info(&info, args.format)?);
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}
