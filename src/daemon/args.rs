use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::browser::socket::DEFAULT_BRIDGE_PORT;

#[derive(Parser)]
pub struct DaemonArgs {
    #[arg(long)]
    pub force: bool,
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Loopback port the browser bridge connects to.
    #[arg(long, default_value_t = DEFAULT_BRIDGE_PORT)]
    pub port: u16,
    /// Stop accumulating time while the content script reports the user as
    /// inactive.
    #[arg(long = "idle-pause")]
    pub idle_pause: bool,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}
