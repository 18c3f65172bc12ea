//! CLI tool for xlpreview - renders one viewport of an XLSX file as JSON
//!
//! Usage:
//!   xlpreview_cli <input.xlsx>                          # Frame of the first visible sheet
//!   xlpreview_cli <input.xlsx> --sheet 2 --zoom 0.5     # Another sheet, zoomed out
//!   xlpreview_cli <input.xlsx> --width 390 --height 844 --scroll 0,400
//!   xlpreview_cli <input.xlsx> --config preview.toml -o frame.json
//!
//! Log output goes to stderr and is controlled by `RUST_LOG` (default `warn`).

#![allow(clippy::exit)]

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

use tracing_subscriber::EnvFilter;
use xlpreview::{PreviewConfig, PreviewSession};

const USAGE: &str = "Usage: xlpreview_cli <input.xlsx> [--sheet N] [--width W] [--height H] \
[--zoom Z] [--scroll X,Y] [--config file.toml] [-o output.json]";

#[derive(Debug, Default)]
struct Args {
    input: String,
    output: Option<String>,
    config: Option<String>,
    sheet: Option<usize>,
    width: Option<f32>,
    height: Option<f32>,
    zoom: Option<f32>,
    scroll: Option<(f32, f32)>,
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> T {
    value
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| fail(&format!("Invalid or missing value for {flag}\n{USAGE}")))
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" | "--output" => args.output = Some(parse_value(&arg, iter.next())),
            "--config" => args.config = Some(parse_value(&arg, iter.next())),
            "--sheet" => args.sheet = Some(parse_value(&arg, iter.next())),
            "--width" => args.width = Some(parse_value(&arg, iter.next())),
            "--height" => args.height = Some(parse_value(&arg, iter.next())),
            "--zoom" => args.zoom = Some(parse_value(&arg, iter.next())),
            "--scroll" => {
                let value: String = parse_value(&arg, iter.next());
                let parsed = value
                    .split_once(',')
                    .and_then(|(x, y)| Some((x.trim().parse().ok()?, y.trim().parse().ok()?)));
                args.scroll =
                    Some(parsed.unwrap_or_else(|| fail(&format!("Invalid --scroll value\n{USAGE}"))));
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                process::exit(0);
            }
            _ if args.input.is_empty() && !arg.starts_with('-') => args.input.clone_from(&arg),
            _ => fail(&format!("Unexpected argument: {arg}\n{USAGE}")),
        }
    }
    if args.input.is_empty() {
        fail(USAGE);
    }
    args
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Only fails if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();

    let args = parse_args();

    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .unwrap_or_else(|e| fail(&format!("Error reading {path}: {e}")));
            PreviewConfig::from_toml_str(&text)
                .unwrap_or_else(|e| fail(&format!("Error in {path}: {e}")))
        }
        None => PreviewConfig::default(),
    };

    let mut session =
        PreviewSession::new(config).unwrap_or_else(|e| fail(&format!("Error: {e}")));

    let data = fs::read(&args.input)
        .unwrap_or_else(|e| fail(&format!("Error reading {}: {e}", args.input)));
    if let Err(e) = session.load(&data) {
        fail(&format!("Error loading {}: {e}", args.input));
    }

    if let Some(sheet) = args.sheet {
        session.switch_sheet(sheet);
    }
    if args.width.is_some() || args.height.is_some() {
        let viewport = session.viewport();
        let width = args.width.unwrap_or(viewport.width);
        let height = args.height.unwrap_or(viewport.height);
        session.resize(width, height);
    }
    if let Some(zoom) = args.zoom {
        session.set_zoom(zoom, 0.0, 0.0);
    }
    if let Some((x, y)) = args.scroll {
        session.scroll_to(x, y);
    }

    let json = serde_json::to_string_pretty(&session.current_frame())
        .unwrap_or_else(|e| fail(&format!("Error serializing JSON: {e}")));

    match args.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &json) {
                fail(&format!("Error writing {path}: {e}"));
            }
            eprintln!("Written: {path}");
        }
        None => {
            let mut stdout = io::stdout();
            if let Err(e) = writeln!(stdout, "{json}") {
                fail(&format!("Error writing output: {e}"));
            }
        }
    }
}
