//! Lockbox emulator command line.
//!
//! Runs the lock controller in real time against the mock panel and types a
//! scripted key sequence on it:
//!
//! ```text
//! lockbox [SCRIPT]...
//! ```
//!
//! Each `SCRIPT` is a run of key labels (`0`-`9`, `A`-`D`, `*`, `#`) typed
//! back to back. After each script the controller runs until it is waiting
//! for the user again, sitting through any PIN entry, unlock or lockout
//! window. Without arguments the demo `A1234 1234B` is typed: set the PIN
//! to 1234, then unlock with it.
//!
//! # Environment
//!
//! - `LOCKBOX_CONFIG`: path to a JSON [`LockboxConfig`]; missing fields use
//!   their defaults
//! - `RUST_LOG`: log filter (default `info`)

use std::path::Path;

use anyhow::{Context, Result};
use lockbox_core::LockboxConfig;
use lockbox_emulator::{Lockbox, Typist, describe, parse_keys};
use lockbox_hardware::TokioDelay;
use lockbox_hardware::mock::MockPanel;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_SCRIPT: [&str; 2] = ["A1234", "1234B"];

const CONFIG_ENV: &str = "LOCKBOX_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let scripts = scripts_from_args(std::env::args().skip(1));
    for script in &scripts {
        parse_keys(script).with_context(|| format!("invalid key script {script:?}"))?;
    }

    let (panel, handle) = MockPanel::new();
    let typist = Typist::new(handle.clone(), &config);
    let mut lockbox =
        Lockbox::new(config, panel, TokioDelay::new()).context("failed to start lockbox")?;

    info!(version = lockbox_core::VERSION, "lockbox emulator started");

    for script in &scripts {
        typist
            .type_str(&mut lockbox, script)
            .await
            .with_context(|| format!("failed while typing {script:?}"))?;
        info!(
            keys = %script,
            state = %lockbox.state(),
            display = %describe(handle.display()),
            actuator = handle.is_actuator_asserted(),
            "keys typed"
        );

        typist
            .settle(&mut lockbox)
            .await
            .context("controller did not return to a waiting state")?;
        info!(
            state = %lockbox.state(),
            display = %describe(handle.display()),
            tries = lockbox.tries(),
            uptime_ms = lockbox.uptime().as_millis() as u64,
            "settled"
        );
    }

    info!(
        transitions = lockbox.history().len(),
        unlocks = handle.actuator_activations(),
        "script finished"
    );
    Ok(())
}

fn scripts_from_args(args: impl Iterator<Item = String>) -> Vec<String> {
    let scripts: Vec<String> = args.collect();
    if scripts.is_empty() {
        DEMO_SCRIPT.iter().map(ToString::to_string).collect()
    } else {
        scripts
    }
}

fn load_config() -> Result<LockboxConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => read_config(Path::new(&path)),
        Err(_) => Ok(LockboxConfig::default()),
    }
}

fn read_config(path: &Path) -> Result<LockboxConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: LockboxConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}
