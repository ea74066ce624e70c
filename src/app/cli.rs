use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate a dependabot.yaml and a package-ecosystem pattern list for a repository"
)]
pub struct Cli {
    /// Ecosystem definitions (top-level `ecosystems` key)
    #[arg(long, default_value = "ecosystems_config.yaml")]
    pub ecosystems: PathBuf,

    /// User settings (top-level `settings` key)
    #[arg(long, default_value = "user_config.yaml")]
    pub settings: PathBuf,

    /// Directory the generated documents are written to
    #[arg(long, default_value = "OUTPUT")]
    pub output_dir: PathBuf,

    /// Only generate one of the two documents
    #[arg(long, value_enum)]
    pub only: Option<Output>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Dependabot,
    Patterns,
}

impl Cli {
    pub fn wants(&self, output: Output) -> bool {
        self.only.map_or(true, |only| only == output)
    }
}
