//! mirinject - Replay native input events through the platform input layer
//!
//! Reads a JSON-lines event script and feeds it through the same path live
//! events take: key filtering on the posting side, the main-loop queue,
//! motion and key dispatch, and the resize reconciler. Every call the
//! toolkit would receive is printed to stdout as one JSON object per line.
//!
//! # Usage
//!
//! ```sh
//! # Replay a script file
//! mirinject events.jsonl
//!
//! # Read the script from stdin, 1080x1920 window at scale 2
//! mirinject --size 1080x1920 --scale 2 - < events.jsonl
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG`.

mod output;

use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use platform::config::Config;
use platform::modifiers::{KeyboardState, Modifiers, ModifierStateTracker};
use platform::script::{parse_script, ScriptRunner};

use crate::output::JsonToolkit;

const USAGE: &str =
    "usage: mirinject [--config PATH] [--size WxH] [--scale RATIO] [--no-keymap] <SCRIPT|->";

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    size: (i32, i32),
    scale: f64,
    keymap: bool,
    script: String,
}

fn parse_size(value: &str) -> Result<(i32, i32)> {
    let (w, h) = value
        .split_once('x')
        .with_context(|| format!("invalid size '{}', expected WxH", value))?;
    let w: i32 = w.parse().with_context(|| format!("invalid width '{}'", w))?;
    let h: i32 = h.parse().with_context(|| format!("invalid height '{}'", h))?;
    if w <= 0 || h <= 0 {
        bail!("size must be positive, got {}x{}", w, h);
    }
    Ok((w, h))
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut parsed = Args {
        config: None,
        size: (720, 1280),
        scale: 1.0,
        keymap: true,
        script: String::new(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("missing path after --config")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--size" => {
                let value = args.next().context("missing value after --size")?;
                parsed.size = parse_size(&value)?;
            }
            "--scale" => {
                let value = args.next().context("missing value after --scale")?;
                parsed.scale = value
                    .parse()
                    .with_context(|| format!("invalid scale '{}'", value))?;
                if !(parsed.scale.is_finite() && parsed.scale > 0.0) {
                    bail!("scale must be positive, got {}", parsed.scale);
                }
            }
            "--no-keymap" => parsed.keymap = false,
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            _ if parsed.script.is_empty() => parsed.script = arg,
            _ => bail!("unexpected argument '{}'\n{}", arg, USAGE),
        }
    }

    if parsed.script.is_empty() {
        bail!("{}", USAGE);
    }
    Ok(parsed)
}

fn read_script(source: &str) -> Result<String> {
    if source == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read script from stdin")?;
        Ok(input)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {}", source))
    }
}

fn keyboard(config: &Config, use_keymap: bool) -> Box<dyn KeyboardState> {
    if !use_keymap {
        return Box::new(Modifiers::empty());
    }
    match ModifierStateTracker::new(&config.keyboard) {
        Ok(tracker) => Box::new(tracker),
        Err(e) => {
            tracing::warn!(error = %e, "no keymap, modifiers will always be empty");
            Box::new(Modifiers::empty())
        }
    }
}

fn main() -> Result<()> {
    setup_logging();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load(),
    };

    let steps = parse_script(&read_script(&args.script)?)
        .with_context(|| format!("invalid script {}", args.script))?;
    tracing::info!(steps = steps.len(), script = %args.script, "replaying script");

    let toolkit = Arc::new(JsonToolkit::stdout());
    let keyboard = keyboard(&config, args.keymap);
    let (width, height) = args.size;
    let mut runner = ScriptRunner::new(toolkit.clone(), keyboard, config, width, height, args.scale)
        .context("failed to set up event loop")?;

    for (index, step) in steps.iter().enumerate() {
        let report = runner
            .run_step(step)
            .with_context(|| format!("step {} failed", index + 1))?;
        toolkit.report(index + 1, &report);
    }

    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Respect NO_COLOR environment variable for testing
    let use_ansi = std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_ansi(use_ansi),
        )
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parsing() {
        assert_eq!(parse_size("1080x1920").unwrap(), (1080, 1920));
        assert!(parse_size("1080").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("ax10").is_err());
    }
}
