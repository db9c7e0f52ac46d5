use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use change3mf_core::core_api::{EditError, EditErrorCode, Engine, SaveOptions};
use change3mf_core::modifications::ModificationSource;
use change3mf_render::{render_change_log, render_field, render_save_report, render_settings};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Modify the JSON project settings (Metadata/project_settings.config) inside a .3mf file.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the .3mf file.
    #[arg(value_name = "FILE.3MF")]
    path: PathBuf,
    /// Show the config or a specific element.
    #[arg(long)]
    show: bool,
    /// Specific element to show.
    #[arg(long, value_name = "NAME", requires = "show")]
    element: Option<String>,
    /// Comma-separated key=value pairs. Values can be lists, e.g. key=["a","b"].
    #[arg(long, value_name = "K=V,...")]
    modifications: Option<String>,
    /// Path to a JSON file with the desired modifications.
    #[arg(long = "config-from-file", value_name = "PATH")]
    config_from_file: Option<PathBuf>,
    /// Log changes made to the config.
    #[arg(long)]
    log: bool,
    /// Do not create a .bak backup of the original file.
    #[arg(long)]
    nobackup: bool,
    /// Do not rename the model in Metadata/model_settings.config to match the file name.
    #[arg(long)]
    nonamechange: bool,
    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .compact()
        .init();
}

fn run(cli: Cli) -> Result<(), EditError> {
    let mut session = Engine::new().open(&cli.path)?;

    if cli.show {
        match &cli.element {
            Some(name) => println!("{}", render_field(session.settings(), name)),
            None => println!("{}", render_settings(session.settings())?),
        }
        return Ok(());
    }

    if cli.config_from_file.is_some() && cli.modifications.is_some() {
        return Err(EditError::new(
            EditErrorCode::Usage,
            "--modifications and --config-from-file cannot be used together",
        ));
    }
    let modifications =
        ModificationSource::resolve(cli.config_from_file, cli.modifications)?.load()?;

    if modifications.is_empty() {
        warn!("no modifications given, settings are rewritten unchanged");
    } else {
        debug!("applying {} modifications", modifications.len());
    }
    let changes = session.apply(&modifications, cli.log);
    let report = session.save(SaveOptions {
        backup: !cli.nobackup,
        sync_model_name: !cli.nonamechange,
    })?;
    print!("{}", render_save_report(&report));

    if cli.log {
        println!();
        print!("{}", render_change_log(&changes));
    }

    Ok(())
}
