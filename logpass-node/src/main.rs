use std::env;
use std::panic;
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use logpass_core::crypto::PrivateKey;
use logpass_core::database::Database;
use logpass_core::transactions::init::InitTransaction;
use logpass_node::config::NodeConfig;
use logpass_node::submission::SubmissionEntryPoint;
use logpass_node::trace;

#[derive(Debug, Parser)]
#[command(version, author, about)]
struct Args {
    /// Configuration file path. Falls back to the platform config
    /// directory under the name `logpass-node` when omitted.
    #[clap(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Overrides the configured log level (error/warn/info/debug/trace).
    #[clap(short = 'l', long = "log-level")]
    log_level: Option<String>,

    /// Overrides the configured database root directory.
    #[clap(short = 'd', long = "data-dir")]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    setup_panic_hooks();

    let args = Args::parse();
    let mut config = NodeConfig::load(args.config.as_deref()).context("loading node configuration")?;
    if let Some(log_level) = args.log_level {
        config.log_level = log_level;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    let log_dir = config.log_dir.to_string_lossy().into_owned();
    std::fs::create_dir_all(&log_dir).context("creating log directory")?;
    let _guards = trace::init_logging(&log_dir, &config.log_level)?;
    info!("logpass-node starting with config: {:?}", &config);

    let database = Arc::new(
        Database::open(&config.data_dir, config.database_config()).context("opening database")?,
    );
    println!("opened database at {}", config.data_dir.display());

    let entry_point = SubmissionEntryPoint::new(database);
    let key = PrivateKey::generate();
    let init = InitTransaction::create(1, 0, 1_717_200_000, config.database_config().block_interval as u32)
        .sign(&key);

    let (reply_tx, reply_rx) = channel();
    entry_point.submit_transaction(1, init.serialize(), reply_tx);
    let result = reply_rx.recv().context("waiting for submission reply")?;

    if result.accepted {
        println!(
            "block 1: genesis accepted, id {}",
            result.transaction_id.unwrap_or_default()
        );
    } else {
        println!("block 1: genesis rejected: {}", result.reason.unwrap_or_default());
    }

    Ok(())
}

fn setup_panic_hooks() {
    let meta = human_panic::Metadata {
        version: env!("CARGO_PKG_VERSION").into(),
        name: env!("CARGO_PKG_NAME").into(),
        authors: env!("CARGO_PKG_AUTHORS").replace(':', ", ").into(),
        homepage: env!("CARGO_PKG_HOMEPAGE").into(),
    };

    let default_hook = panic::take_hook();

    if env::var("RUST_BACKTRACE").is_err() {
        panic::set_hook(Box::new(move |info: &panic::PanicInfo| {
            default_hook(info);

            let file_path = human_panic::handle_dump(&meta, info);
            human_panic::print_msg(file_path, &meta)
                .expect("human-panic: printing error message to console failed");
        }));
    }
}
