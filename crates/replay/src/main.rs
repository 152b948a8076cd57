mod script;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use native_bridge_core::BridgeConfig;

use crate::script::{Replay, Script};

struct Args {
    script: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut script = None;
    let mut config = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    bail!("--config needs a file");
                };
                config = Some(PathBuf::from(path));
            }
            _ if script.is_none() => script = Some(PathBuf::from(arg)),
            other => bail!("unexpected argument: {other}"),
        }
    }
    let Some(script) = script else {
        bail!("Usage: bridge-replay <script.json> [--config <config.json>]");
    };
    Ok(Args { script, config })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = parse_args()?;

    let data = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading {}", args.script.display()))?;
    let script: Script =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", args.script.display()))?;

    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            BridgeConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => script.config.clone().unwrap_or_default(),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut replay = Replay::new(config);
    for (index, step) in script.steps.iter().enumerate() {
        replay
            .run(step)
            .with_context(|| format!("step {index} ({})", step.name()))?;
        for operation in replay.transmitted() {
            writeln!(out, "{}", serde_json::to_string(&operation)?)?;
        }
    }
    let report = replay.finish();
    for operation in replay.transmitted() {
        writeln!(out, "{}", serde_json::to_string(&operation)?)?;
    }
    if !report.is_clean() {
        log::warn!("{} operations failed in the final flush", report.failures.len());
    }
    for diagnostic in replay.diagnostics() {
        log::info!("diagnostic: {}", diagnostic.message);
    }
    Ok(())
}
