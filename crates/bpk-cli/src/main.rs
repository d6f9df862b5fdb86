//! 🚀 bpk-cli: the front door, the bouncer, the maitre d' of bucketpeek.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that loads config,
//! sets up logging, and then lets the library do the heavy lifting.
//! Like a manager. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// 🪣 Peek at the first rows of a CSV sitting in an S3-compatible bucket.
#[derive(Debug, Parser)]
#[command(name = "bpk", version)]
struct Cli {
    /// TOML config file. Missing file = environment variables (BPK_*) and defaults only.
    #[arg(default_value = "bpk.toml")]
    config: PathBuf,
}

/// 🚀 main(): where it all begins.
///
/// 🔧 Steps:
/// 1. Init tracing (on stderr, so the preview owns stdout)
/// 2. Parse args
/// 3. Load config (the moment of truth)
/// 4. Run the thing
/// 5. Handle errors (cry, then exit 1)
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 🔒 A missing file is allowed; a file we can't even stat is not.
    let config_file = cli.config.as_path();
    let config_file_if_it_exists = match config_file.try_exists().context(format!(
        "💀 Couldn't check whether the configuration file exists. Permissions on the directory, maybe? \
         Was checking here: '{}'",
        config_file.display()
    ))? {
        true => Some(config_file),
        false => None,
    };

    let app_config = bpk::app_config::load_config(config_file_if_it_exists)
        .context("💀 In bpk-cli, main, we couldn't load the config. Take a look at the file and the BPK_* env vars.")?;

    let result = bpk::run(app_config).await;

    if let Err(err) = result {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion of sadness, one layer at a time
        let mut the_vibes_are_giving_connection_issues = false;
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
            let cause_str = cause.to_string();
            if cause_str.contains("could not reach object store")
                || cause_str.contains("dispatch failure")
                || cause_str.contains("connection refused")
                || cause_str.contains("Connection refused")
                || cause_str.contains("dns error")
            {
                the_vibes_are_giving_connection_issues = true;
            }
        }

        if the_vibes_are_giving_connection_issues {
            error!(
                "🔧 hint: looks like the object store isn't reachable. \
                Check the endpoint in [session] (or BPK_SESSION__ENDPOINT). \
                If MinIO runs in Docker, `docker ps` shows whether it's up, \
                and `docker compose up -d minio` brings it back. ☕"
            );
        }

        std::process::exit(1);
    }

    Ok(())
}
