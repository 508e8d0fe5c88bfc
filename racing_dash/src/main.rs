//! Racing dashboard instrument core runtime entry point: loads config,
//! wires the channel registry and ingress producers, then drives the
//! orchestrator tick loop (`spec.md` §4.8, §5; `SPEC_FULL.md` §3.8).

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use racing_common::consts::{DEFAULT_CONFIG_PATH, PRIMARY_TICK_DEADLINE_MS};
use racing_core::orchestrator::Orchestrator;
use racing_logger::logger::{DataLogger, LoggerConfig};
use racing_logger::state::TriggerPredicate;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "racing_dash", about = "Racing dashboard instrument core runtime")]
struct Cli {
    /// Directory holding system.toml/screens.toml/channels.toml/tracks.toml.
    #[arg(long, default_value = racing_common::consts::DEFAULT_CONFIG_PATH)]
    config_dir: PathBuf,

    /// Emit structured JSON logs instead of the default human-readable format.
    #[arg(long)]
    json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json);

    tracing::info!(config_dir = %cli.config_dir.display(), "starting racing dashboard core runtime");

    let full_config = match racing_config::load_config_dir(&cli.config_dir) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::error!(error = %err, "fatal: config load failed, halting orchestrator pipeline");
            std::process::exit(1);
        }
    };

    let default_screen_id = full_config.screens.default_screen_id.unwrap_or(0);
    let mut orch = Orchestrator::new(default_screen_id);

    for channel in &full_config.channels.channel {
        match channel.to_channel_def() {
            Ok(def) => {
                if let Err(err) = orch.registry.register(def) {
                    tracing::warn!(channel_id = channel.id, error = ?err, "channel registration failed");
                }
            }
            Err(err) => tracing::warn!(channel_id = channel.id, error = %err, "invalid channel config"),
        }
    }
    if let Err(err) = orch.rebuild_math_order() {
        tracing::error!(error = ?err, "fatal: math evaluation order has a cycle, halting orchestrator pipeline");
        std::process::exit(1);
    }

    for rule in &full_config.screens.rule {
        let _ = orch.display.add_rule(rule.to_display_rule());
    }
    if let Some(track) = full_config.tracks.track.first() {
        match track.to_track() {
            Ok(track) => orch.lap_timer.set_track(track),
            Err(err) => tracing::warn!(error = %err, "invalid track config, lap timer left unset"),
        }
    }

    let mut logger = DataLogger::new(LoggerConfig::default(), TriggerPredicate::Manual);
    logger.arm();

    tracing::info!("entering orchestrator tick loop");
    loop {
        let tick_start = std::time::Instant::now();
        let t = now_ms();

        orch.tick(t);
        for line in orch.take_diagnostics() {
            logger.record_diagnostic(line.as_str(), t);
        }
        for line in logger.take_pending_diagnostics() {
            tracing::warn!(timestamp_ms = line.timestamp_ms, message = line.message.as_str(), "diagnostic");
        }
        logger.sweep(&orch.bus, &orch.registry, t);
        if logger.should_flush(t) {
            let pending = logger.take_pending_writes(t);
            tracing::debug!(count = pending.len(), "logger write buffer flushed");
        }

        let elapsed_ms = tick_start.elapsed().as_millis() as u64;
        if elapsed_ms < PRIMARY_TICK_DEADLINE_MS {
            thread::sleep(Duration::from_millis(PRIMARY_TICK_DEADLINE_MS - elapsed_ms));
        } else {
            tracing::warn!(elapsed_ms, "tick exceeded its deadline");
        }
    }
}
