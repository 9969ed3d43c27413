//! grand - play the piano engine from a terminal
//!
//! Run with: cargo run
//!
//! Computer keys play two octaves (z..m, q..u), the mouse plays the drawn
//! keyboard, Tab starts/stops recording, Esc quits. The last recording is
//! printed as JSON on exit.
//!
//! Environment:
//!   GRAND_CONFIG  path to a JSON SynthConfig overriding the defaults
//!   RUST_LOG      log filter (logs go to grand.log in the temp directory)

mod app;
mod ui;

use std::fs::File;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use grand_dsp::synth::SynthConfig;

use app::App;

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    let config = load_config()?;
    let mut app = App::new(config)?;

    let mut terminal = ratatui::init();
    let result = app::with_input_reporting(|enhanced| app.run(&mut terminal, enhanced));
    ratatui::restore();
    result?;

    if let Some(melody) = app.last_melody() {
        println!("{}", serde_json::to_string_pretty(melody)?);
    }
    Ok(())
}

/// Logs go to a file: the TUI owns the terminal.
fn init_logging() -> EyreResult<()> {
    let path = std::env::temp_dir().join("grand.log");
    let file = File::create(&path).wrap_err_with(|| format!("creating {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();

    log::info!("grand starting, logging to {}", path.display());
    Ok(())
}

fn load_config() -> EyreResult<SynthConfig> {
    let Ok(path) = std::env::var("GRAND_CONFIG") else {
        return Ok(SynthConfig::default());
    };
    let text = std::fs::read_to_string(&path).wrap_err_with(|| format!("reading {path}"))?;
    let config = serde_json::from_str(&text).wrap_err_with(|| format!("parsing {path}"))?;
    log::info!("loaded synth config from {path}");
    Ok(config)
}
