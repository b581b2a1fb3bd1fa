//! tvremote CLI: drive the input engine from replay scripts.

mod script;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};
use tvremote_engine::config::Config;
use tvremote_engine::setup;

use crate::script::{ReplayOptions, Script};

#[derive(Parser)]
#[command(
    name = "tvremote",
    about = "Translate touchpad and key input into remote-control commands",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script of timed input events against a loopback remote.
    Replay {
        /// Path to the replay script (TOML).
        script: PathBuf,

        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the initial pointer sensitivity.
        #[arg(short, long)]
        sensitivity: Option<f64>,

        /// Width of the loopback remote screen.
        #[arg(long, default_value_t = 1920)]
        width: u32,

        /// Height of the loopback remote screen.
        #[arg(long, default_value_t = 1080)]
        height: u32,

        /// Milliseconds to keep running after the last event.
        #[arg(long, default_value_t = 500)]
        linger_ms: u64,
    },

    /// Print the effective configuration as TOML.
    Config {
        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Install the subscriber at `info` so config loading is logged.
///
/// Returns a handle for switching to the configured level; `None` when
/// `RUST_LOG` is set, which always wins.
fn init_tracing() -> Option<FilterHandle> {
    let from_env = EnvFilter::try_from_default_env().ok();
    let pinned = from_env.is_some();
    let (filter, handle) =
        reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    (!pinned).then_some(handle)
}

fn apply_log_level(handle: Option<&FilterHandle>, config: &Config) {
    let Some(handle) = handle else {
        return;
    };
    if let Err(e) = handle.reload(EnvFilter::new(&config.engine.log_level)) {
        tracing::warn!(error = %e, "failed to apply configured log level");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = init_tracing();

    match cli.command {
        Commands::Replay {
            script,
            config,
            sensitivity,
            width,
            height,
            linger_ms,
        } => {
            let mut config = setup::load_config(config.as_deref())?;
            apply_log_level(filter.as_ref(), &config);
            if let Some(multiplier) = sensitivity {
                config.touchpad.sensitivity = multiplier;
            }

            let script = Script::load(&script)?;
            tracing::info!(
                events = script.events.len(),
                duration_ms = script.duration().as_millis(),
                "replaying script"
            );

            let options = ReplayOptions {
                width,
                height,
                linger: Duration::from_millis(linger_ms),
            };
            let report = script::replay(config, &script, options).await?;

            for request in &report.requests {
                println!("POST {} {}", request.path, request.body());
            }
            println!();
            println!("Requests:    {}", report.requests.len());
            println!("Cursor:      {},{}", report.cursor.0, report.cursor.1);
            println!("Remote:      {}", report.status.connectivity);
            println!("Failures:    {}", report.status.delivery_failures);
        }
        Commands::Config { config } => {
            let config = setup::load_config(config.as_deref())?;
            apply_log_level(filter.as_ref(), &config);
            let text = toml::to_string_pretty(&config).context("failed to render config")?;
            print!("{text}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_replaces_startup_filter() {
        let (layer, handle) = reload::Layer::new(EnvFilter::new("info"));
        let subscriber = tracing_subscriber::registry().with(layer);

        let mut config = Config::default();
        config.engine.log_level = "debug".to_string();
        apply_log_level(Some(&handle), &config);

        let current = handle.with_current(ToString::to_string).unwrap();
        assert_eq!(current, "debug");
        drop(subscriber);
    }
}
