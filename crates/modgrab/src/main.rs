mod cli;

use std::time::Duration;
use std::{fs, io};

use clap::{CommandFactory, Parser};
use cli::{FetchArguments, OutputFormat};
use color_eyre::Section;
use color_eyre::eyre::Report;
use color_eyre::owo_colors::OwoColorize;
use eyre::Context;
use modgrab_batch::{Orchestrator, Report as BatchReport, Status};
use modgrab_repository::http::{HttpClient, RetryPolicy};
use modgrab_repository::persist::{PersistError, PersistedEntity, read_mod_list};
use modgrab_repository::{ArtifactFetcher, DirectoryError, ModrinthRepository, ModsDirectory};
use modgrab_target::{Manifest, ManifestError, Overrides};
use tracing::instrument;

use crate::cli::{Options, Subcommand};

fn main() -> Result<(), Report> {
    let options = Options::parse();
    color_eyre::install()?;
    install_tracing()?;

    let status = run_with_options(options);
    if let Err(mut report) = status {
        if let Some(error) = report.downcast_ref::<PersistError>() {
            match error {
                PersistError::Io { .. } => {
                    report = report
                        .with_note(|| "Modgrab encountered an I/O error.")
                        .with_suggestion(|| {
                            "Check the paths given to --config and --mods-file, and that they are readable."
                        });
                }
                PersistError::SerdeYml(_) => {
                    report = report
                        .with_note(|| "The manifest isn't valid YAML or doesn't have the expected shape.")
                        .with_suggestion(|| {
                            format!(
                                "A minimal one is `target: {{ loader: fabric, game_version: 1.21.11 }}`, see {}",
                                env!("CARGO_PKG_REPOSITORY")
                            )
                        });
                }
            }
        } else if let Some(error) = report.downcast_ref::<ManifestError>() {
            let suggestion = match error {
                ManifestError::Missing(_) => format!(
                    "Pass --loader and --game-version, or set them under `target` in {}",
                    Manifest::FILE_PATH
                ),
                ManifestError::NoMods => {
                    "Name some mods as arguments, or point --mods-file at a list of them.".to_string()
                }
            };
            report = report.with_suggestion(|| suggestion);
        } else if let Some(DirectoryError { path, .. }) = report.downcast_ref::<DirectoryError>() {
            let path = path.display().to_string();
            report = report
                .with_note(|| format!("Nothing was fetched, {path} is unusable as a destination."))
                .with_suggestion(|| "Ensure the parent directory exists and you have write permissions.");
        }

        return Err(report);
    }

    Ok(())
}

#[instrument(name = "action_handling", skip_all)]
fn run_with_options(options: Options) -> Result<(), Report> {
    match options.subcommand {
        Subcommand::Fetch(arguments) => fetch(arguments, options.output_format),
        Subcommand::Completions { shell } => {
            let mut command = Options::command();
            let bin_name = env!("CARGO_CRATE_NAME");
            let mut stdout = std::io::stdout();
            clap_complete::generate(shell, &mut command, bin_name, &mut stdout);
            Ok(())
        }
    }
}

/// Run a whole batch. Per-mod failures end up in the printed report, only a
/// broken configuration makes this fail.
fn fetch(arguments: FetchArguments, output_format: OutputFormat) -> Result<(), Report> {
    let manifest = load_manifest(arguments)?;
    let directory = ModsDirectory::open(&manifest.destination)?;

    let client = HttpClient::new(RetryPolicy::from(&manifest.settings))
        .wrap_err("Failed to set up the HTTP client")?;
    let registry = ModrinthRepository::new(client.clone(), &manifest.settings);
    let fetcher = ArtifactFetcher::new(client, directory, &manifest.settings);
    tracing::info!(
        platform = %manifest.target,
        destination = ?fetcher.directory().path(),
        mods = manifest.mods.len(),
        "Fetching mods"
    );

    let report = Orchestrator::new(&registry, &fetcher, &manifest.target).run(manifest.mods.clone());
    match output_format {
        OutputFormat::Yaml => println!("{}", serde_yml::to_string(&report)?),
        OutputFormat::Human => print_report(&report),
    }
    Ok(())
}

/// Merge `modgrab.yml` (or whatever `--config` points at), `--mods-file` and
/// the rest of the command line into a single [`Manifest`].
fn load_manifest(arguments: FetchArguments) -> Result<Manifest, Report> {
    let FetchArguments {
        mods,
        config,
        destination,
        loader,
        game_version,
        mods_file,
        metadata_timeout,
        download_timeout,
    } = arguments;

    let base = match config {
        Some(path) => Some(Manifest::read_from(path)?),
        None if fs::exists(Manifest::FILE_PATH)? => Some(Manifest::read()?),
        None => None,
    };

    let mut listed = match mods_file {
        Some(path) => read_mod_list(path)?,
        None => vec![],
    };
    listed.extend(mods);

    let overrides = Overrides {
        destination,
        loader,
        game_version,
        metadata_timeout: metadata_timeout.map(Duration::from_secs),
        download_timeout: download_timeout.map(Duration::from_secs),
        mods: listed,
    };
    Ok(Manifest::resolve(base, overrides)?)
}

fn print_report(report: &BatchReport) {
    for outcome in &report.outcomes {
        let status = format!("{:>21}", outcome.status.to_string());
        let status = match outcome.status {
            Status::Downloaded => status.green().bold().to_string(),
            Status::SkippedExisting => status.cyan().to_string(),
            Status::NoCompatibleVersion | Status::NotFound | Status::Failed => {
                status.red().bold().to_string()
            }
        };
        print!("{status} {}", outcome.query.bold());
        if let Some(file_name) = &outcome.file_name {
            print!(" {} {}", "->".white(), file_name.italic());
        }
        if let Some(detail) = &outcome.detail {
            print!(" {}", format!("({detail})").purple());
        }
        println!(/* line termination */);
    }

    let summary = &report.summary;
    println!(
        "{total} mods: {succeeded} downloaded, {skipped} already present, {failed} failed.",
        total = summary.total.bold(),
        succeeded = summary.succeeded.green().bold(),
        skipped = summary.skipped.cyan(),
        failed = summary.failed.red().bold(),
    );
    if !summary.failed_mods.is_empty() {
        let failed = summary
            .failed_mods
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!("Failed: {}", failed.red());
    }
}

fn install_tracing() -> Result<(), Report> {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};
    let format_layer = fmt::layer().pretty().without_time().with_writer(io::stderr);
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .with(ErrorLayer::default())
        .try_init()?;
    Ok(())
}
