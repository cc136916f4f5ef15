use std::path::PathBuf;

use clap::Parser;

use crate::config::RunOptions;

#[derive(Debug, Parser)]
#[command(
    name = "crewline",
    version,
    about = "Run a researcher and a technical writer over scripted AI tasks and print the result"
)]
pub struct Cli {
    /// Give the researcher Google search through Serper (needs SERPER_API_KEY)
    #[arg(long)]
    pub search: bool,

    /// Log failures and exit non-zero instead of returning the error
    #[arg(long)]
    pub guarded: bool,

    /// Model as provider/model_name; overrides CREW_MODEL
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, env = "CREW_ENV_FILE", default_value = ".env")]
    pub env_file: PathBuf,

    /// Turn off per-agent progress logging
    #[arg(long, short)]
    pub quiet: bool,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            with_search: self.search,
            model: self.model.clone(),
            quiet: self.quiet,
            env_file: Some(self.env_file.clone()),
        }
    }
}
