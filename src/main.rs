// src/main.rs

// Declare modules
pub mod analyzer;
pub mod config;
pub mod error;
pub mod fontstyle;
pub mod message;
pub mod orchestrator;
pub mod panel;
pub mod provider;
pub mod style;
pub mod tokens;
pub mod transport;

use crate::config::ExportOptions;
use crate::orchestrator::TokenOrchestrator;
use crate::panel::PanelState;
use crate::provider::FixtureDocument;
use crate::transport::ChannelLink;

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

const DEFAULT_OUT_FILE: &str = "type.json";

struct CliArgs {
    document: PathBuf,
    options: Option<PathBuf>,
    out: PathBuf,
}

fn parse_args() -> Result<CliArgs> {
    let mut document = None;
    let mut options = None;
    let mut out = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--options" => {
                options = Some(PathBuf::from(
                    args.next().context("--options needs a file path")?,
                ));
            }
            "--out" => {
                out = Some(PathBuf::from(
                    args.next().context("--out needs a file path")?,
                ));
            }
            _ if document.is_none() => document = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument '{}'", arg),
        }
    }

    Ok(CliArgs {
        document: document
            .context("usage: typecrop <document.json> [--options opts.json] [--out type.json]")?,
        options,
        out: out.unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_FILE)),
    })
}

fn main() -> Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = parse_args()?;

    let mut document = FixtureDocument::load(&cli.document)?;
    let options = match &cli.options {
        Some(path) => ExportOptions::load(path)?,
        None => ExportOptions::default(),
    };

    // Host→UI and UI→host channels. The UI side runs on its own thread,
    // mirroring the privileged/unprivileged process split: the host can
    // enumerate and render but never touches pixels, the UI decodes and
    // scans but never sees the document.
    let (host_tx, ui_rx) = mpsc::channel();
    let (ui_tx, host_rx) = mpsc::channel();
    let ui_thread = thread::spawn(move || analyzer::run_analyzer(ui_rx, ui_tx));

    let mut link = ChannelLink::new(host_tx, host_rx);
    link.wait_ready()?;
    info!("analyzer ready; starting token pipeline");

    let store = TokenOrchestrator::new(&mut document, &mut link).run()?;
    info!(
        "pipeline finished with {} style groups ({} samples rendered)",
        store.len(),
        document.renders()
    );

    let outcome = ui_thread
        .join()
        .map_err(|_| anyhow!("analyzer thread panicked"))?
        .context("analyzer exited before receiving the config")?;

    let mut panel = PanelState::from_config(&outcome.config);
    panel.apply_options(&options);
    let export = panel.export(&outcome.config);

    let payload = serde_json::to_string_pretty(&export).context("serializing token export")?;
    std::fs::write(&cli.out, payload)
        .with_context(|| format!("writing {}", cli.out.display()))?;
    info!("wrote {}", cli.out.display());

    Ok(())
}
