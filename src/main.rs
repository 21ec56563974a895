mod args;
mod clients;
mod config;
mod error;
mod ip;
mod notify;
mod reconcile;
mod record;
mod run;
#[cfg(test)]
mod testing;

use clients::alidns::AlidnsClient;
use notify::dingtalk::DingTalkSink;
use notify::MessageSink;
use std::error::Error;

/// User-Agent header value for HTTP requests
pub const USER_AGENT: &str = concat!("aliddns/", env!("CARGO_PKG_VERSION"));

fn init_logger(debug: bool, quiet: bool) {
    // Info by default: the per-record decision lines are the run's record
    let log_level = if quiet {
        log::LevelFilter::Error
    } else if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::builder()
        .filter(None, log_level)
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = args::Args::new();

    init_logger(args.debug, args.quiet);

    // Load and merge configuration
    let config = config::Config::load(&args)?;
    config.validate()?;

    let store = AlidnsClient::new(&config)?;
    let resolver = ip::WebResolver::new(&config);

    log::info!("Starting Aliyun DDNS update...");

    let outcomes = run::run(&config.records, &resolver, &store);

    let sink = if config.notify {
        match DingTalkSink::new(&config) {
            Ok(sink) => Some(sink),
            Err(e) => {
                log::warn!("Notifications disabled: {}", e);
                None
            }
        }
    } else {
        None
    };
    notify::notify(
        &outcomes,
        sink.as_ref().map(|s| s as &dyn MessageSink),
        config.notify_unchanged,
    );

    let summary = run::Summary::of(&outcomes);
    log::info!(
        "Done: {} created, {} updated, {} unchanged, {} failed",
        summary.created,
        summary.updated,
        summary.unchanged,
        summary.failed
    );

    if summary.failed > 0 {
        let failed: Vec<String> = outcomes
            .iter()
            .filter(|o| o.is_failed())
            .map(|o| o.spec.to_string())
            .collect();
        return Err(format!(
            "{} of {} record(s) failed: {}",
            summary.failed,
            summary.total(),
            failed.join(", ")
        )
        .into());
    }

    Ok(())
}
