//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// Flatten a LaTeX source into translatable plain text.
#[derive(Debug, Parser)]
#[command(name = "flattex", version, about)]
pub struct Cli {
    /// Input: a .tex file, or a directory to search for the main file.
    #[arg(required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to the input name with a .txt extension.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Worker pool size. 0 uses one worker per core.
    #[arg(long)]
    pub threads: Option<usize>,

    /// Maximum character budget per chunk.
    #[arg(long)]
    pub char_limit: Option<usize>,

    /// Wrap fragments in a minimal document shell.
    #[arg(long)]
    pub make_complete: bool,

    /// Keep command wrappers like \section{...} in the output.
    #[arg(long)]
    pub keep_wrappers: bool,

    /// Bypass the run cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Emit text_old / text_new / objs side files for inspection.
    #[arg(long)]
    pub debug: bool,

    /// Write the effective configuration to the user config file and exit.
    #[arg(long)]
    pub init_config: bool,
}

impl Cli {
    /// Layer CLI flags over the config file.
    pub fn merge_config(&self, mut config: crate::Config) -> crate::Config {
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(char_limit) = self.char_limit {
            config.char_limit = char_limit;
        }
        if self.make_complete {
            config.make_complete = true;
        }
        if self.keep_wrappers {
            config.keep_command_wrappers = true;
        }
        if self.no_cache {
            config.no_cache = true;
        }
        if self.debug {
            config.debug = true;
        }
        config
    }
}
