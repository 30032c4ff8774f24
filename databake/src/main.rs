use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use databake::{Config, DEFAULT_LEVEL, DEFAULT_MAX_INPUT_LEN, DEFAULT_THRESHOLD};

#[derive(Parser)]
#[command(
    version,
    about = "Bake a file into a C++ byte array registered with the static file runtime"
)]
struct Args {
    #[arg(help = "Path to the file to embed")]
    input: PathBuf,

    #[arg(help = "Name to register the file under [default: the input path]")]
    name: Option<String>,

    #[arg(short, long, help = "Emit the zlib form when it is small enough")]
    compress: bool,

    #[arg(
        short,
        long,
        default_value_t = DEFAULT_LEVEL,
        value_parser = clap::value_parser!(u32).range(0..=9),
        help = "zlib compression level"
    )]
    level: u32,

    #[arg(
        long,
        default_value_t = DEFAULT_THRESHOLD,
        value_parser = parse_threshold,
        help = "Largest compressed/original size ratio that is still compressed"
    )]
    threshold: f64,

    #[arg(long = "max-size", default_value_t = DEFAULT_MAX_INPUT_LEN, help = "Largest input accepted, in bytes")]
    max_size: u64,
}

/// Accepts finite ratios of zero or more.
fn parse_threshold(value: &str) -> std::result::Result<f64, String> {
    let ratio: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if ratio.is_finite() && ratio >= 0.0 {
        Ok(ratio)
    } else {
        Err(format!("'{value}' is not a finite ratio of 0 or more"))
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let baked = Config::new()
        .compress(args.compress)
        .level(args.level)
        .threshold(args.threshold)
        .max_input_len(args.max_size)
        .bake(&args.input, args.name.as_deref())?;
    log::info!(
        "baked {} as \"{}\" ({} bytes{})",
        args.input.display(),
        baked.name(),
        baked.len(),
        if baked.is_compressed() { ", compressed" } else { "" }
    );

    baked
        .write_to(io::stdout().lock())
        .context("Failed to write to standard output")
}
