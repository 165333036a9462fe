use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vireo", version, about = "Vireo template tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template against JSON state and print the markup.
    Render {
        /// Path to the template file
        template: PathBuf,
        /// JSON object used as controller state
        #[arg(long)]
        state: Option<PathBuf>,
        /// JSON configuration (prefixes, event key, globals, pass bound)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Parse a template and every expression in it.
    Check {
        template: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    vireo_cli::init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            template,
            state,
            config,
        } => {
            let html = vireo_cli::render_cmd(&template, state.as_deref(), config.as_deref())?;
            println!("{html}");
        }
        Commands::Check { template, config } => {
            let problems = vireo_cli::check_cmd(&template, config.as_deref())?;
            for p in &problems {
                eprintln!("{}: {p}", template.display());
            }
            if !problems.is_empty() {
                anyhow::bail!("{} problem(s) in {}", problems.len(), template.display());
            }
            println!("{}: ok", template.display());
        }
    }
    Ok(())
}
