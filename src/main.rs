use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flattex::cli::Cli;
use flattex::files::{find_main_file, resolve};
use flattex::pipeline::{finalize, Flattener};
use flattex::Config;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.merge_config(Config::load()?);

    if cli.init_config {
        config.save()?;
        println!("configuration saved to {}", Config::config_path()?.display());
        return Ok(());
    }

    let input = cli.input.as_deref().context("INPUT is required")?;
    let (main_file, base_dir) = locate_input(input)?;
    info!(file = %main_file.display(), "resolving includes");
    let source = resolve(&main_file, &base_dir)
        .with_context(|| format!("Failed to read {}", main_file.display()))?;

    let flattener = Flattener::new(config);
    let flattened = flattener.flatten(&source)?;
    let output_text = finalize(&flattened);

    let output_path = cli
        .output
        .unwrap_or_else(|| main_file.with_extension("txt"));
    write_atomic(&output_path, &output_text)?;

    println!("processing completed, result saved to {}", output_path.display());
    Ok(())
}

/// A file input resolves against its parent directory; a directory input is
/// searched for the file carrying `\begin{document}`.
fn locate_input(input: &Path) -> Result<(PathBuf, PathBuf)> {
    if input.is_dir() {
        match find_main_file(input)? {
            Some(main) => Ok((main, input.to_path_buf())),
            None => bail!("No .tex file with \\begin{{document}} found in {}", input.display()),
        }
    } else if input.exists() {
        let base = input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok((input.to_path_buf(), base))
    } else {
        bail!("Input not found: {}", input.display());
    }
}

/// Write via a temp file and rename so a failed run never leaves a partial
/// output behind.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("txt.tmp");
    fs::write(&tmp, content)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move output into place: {}", path.display()))?;
    Ok(())
}
