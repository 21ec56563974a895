use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(version, about = "Keep Alibaba Cloud DNS A/AAAA records pointed at this host's public IP", long_about = None)]
pub struct Args {
    /// Configuration file path (default: aliddns.conf)
    #[arg(long)]
    pub file: Option<String>,

    /// AccessKey ID, overrides login= from the config file
    #[arg(long)]
    pub login: Option<String>,

    /// AccessKey secret, overrides password= from the config file
    #[arg(long)]
    pub password: Option<String>,

    /// Alidns API endpoint
    #[arg(long)]
    pub server: Option<String>,

    /// Do not send the DingTalk report, even if configured
    #[arg(long, default_value = "false")]
    pub no_notify: bool,

    /// Debug output
    #[arg(long, default_value = "false")]
    pub debug: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(long, default_value = "false")]
    pub quiet: bool,
}

impl Args {
    pub fn new() -> Self {
        Self::parse()
    }
}
