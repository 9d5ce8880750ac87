// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI for TOPSAIL.
//!
//! A thin front end over `topsail-config` (model consolidation, presets)
//! and `topsail-benchmarks` (multi-run comparison reports).

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use settings::CliSettings;
use std::path::PathBuf;
use topsail_benchmarks::{generate_comparison_report, get_all_configuration_info, io, markdown, OutputFormat};
use topsail_config::{ConfigStore, Consolidation, DirectorySource, ModelConsolidator, Resolver};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// TOPSAIL CLI.
#[derive(Parser, Debug)]
#[command(name = "topsail")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (default: topsail.yaml).
    #[arg(long, global = true, env = "TOPSAIL_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Report formats accepted by `compare`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    /// Markdown tables
    Markdown,
    /// JSON dump of the whole report
    Json,
    /// Both formats
    Both,
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Markdown => OutputFormat::Markdown,
            ReportFormat::Json => OutputFormat::Json,
            ReportFormat::Both => OutputFormat::Both,
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Consolidate the model configured at a store key.
    ///
    /// Pass `--name help` to list the available configuration documents.
    Consolidate {
        /// Store key of the model entry.
        #[arg(short, long)]
        location: String,

        /// Model name, overriding the one stored at the location.
        #[arg(short, long)]
        name: Option<String>,

        /// Iteration index stamped into the result.
        #[arg(short, long)]
        index: Option<usize>,

        /// Do not print the consolidated document.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Consolidate every entry of a model list.
    ConsolidateAll {
        /// Store key of the model list.
        #[arg(long, default_value = "tests.models")]
        models_key: String,

        /// Store key receiving the consolidated list.
        #[arg(long, default_value = "tests.consolidated_models")]
        output_key: String,

        /// Only the entry at this index.
        #[arg(short, long)]
        index: Option<usize>,

        /// Only the entry with this name.
        #[arg(short, long)]
        name: Option<String>,

        /// Do not save the consolidated list to the artifact directory.
        #[arg(long)]
        no_save: bool,
    },

    /// Apply presets to the configuration store.
    Preset {
        /// Preset names, applied in order.
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Compare benchmark runs and write a report.
    Compare {
        /// JSON records file or run directory tree.
        #[arg(short, long)]
        results: PathBuf,

        /// Output format.
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: ReportFormat,

        /// Output directory; the report goes to stdout when absent.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the available configuration documents.
    Documents,
}

/// Install the tracing subscriber.
pub fn init_tracing(json: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json, cli.verbose);

    let settings = CliSettings::load(cli.settings.as_deref()).context("failed to load settings")?;
    execute(cli.command, &settings)
}

/// Execute one command with resolved settings.
pub fn execute(command: Commands, settings: &CliSettings) -> Result<()> {
    match command {
        Commands::Consolidate {
            location,
            name,
            index,
            quiet,
        } => {
            let (resolver, store) = open_config(settings)?;
            let outcome = consolidator(&resolver, &store, settings)
                .consolidate_model_config(Some(&location), name.as_deref(), index, !quiet)
                .with_context(|| format!("failed to consolidate {location}"))?;

            match outcome {
                Consolidation::Help(names) => print_documents(&names),
                Consolidation::Done(model) => {
                    println!("{} consolidated {} into {}", "✓".green(), model.name.bold(), location);
                }
            }
            Ok(())
        }

        Commands::ConsolidateAll {
            models_key,
            output_key,
            index,
            name,
            no_save,
        } => {
            let (resolver, store) = open_config(settings)?;
            let artifact_dir = (!no_save).then_some(settings.artifact_dir.as_path());
            let outcome = consolidator(&resolver, &store, settings)
                .consolidate_models(&models_key, index, name.as_deref(), &output_key, artifact_dir)
                .with_context(|| format!("failed to consolidate the models at {models_key}"))?;

            match outcome {
                Consolidation::Help(names) => print_documents(&names),
                Consolidation::Done(models) => {
                    for model in &models {
                        let index = model.index.map_or_else(|| "-".to_string(), |i| i.to_string());
                        println!("{} [{}] {}", "✓".green(), index, model.name.bold());
                    }
                    println!("{} models written to {}", models.len(), output_key);
                }
            }
            Ok(())
        }

        Commands::Preset { names } => {
            let (_, store) = open_config(settings)?;
            for name in &names {
                store
                    .apply_preset(name)
                    .with_context(|| format!("failed to apply preset {name}"))?;
                println!("{} preset {}", "✓".green(), name.bold());
            }
            Ok(())
        }

        Commands::Compare {
            results,
            format,
            output,
        } => {
            let matrix = io::load_records(&results)
                .with_context(|| format!("failed to load records from {}", results.display()))?;
            let grouped = get_all_configuration_info(&matrix, &matrix.static_settings());
            let report = generate_comparison_report(&grouped);

            if report.is_empty() {
                println!("{}", "No configuration data found for comparison".yellow());
            }

            match output {
                Some(dir) => {
                    let written = io::write_report(&report, &dir, format.into())
                        .with_context(|| format!("failed to write the report to {}", dir.display()))?;
                    for path in written {
                        println!("{} {}", "wrote".green(), path.display());
                    }
                }
                None => {
                    if matches!(format, ReportFormat::Markdown | ReportFormat::Both) {
                        println!("{}", markdown::generate_report(&report));
                    }
                    if matches!(format, ReportFormat::Json | ReportFormat::Both) {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    }
                }
            }
            Ok(())
        }

        Commands::Documents => {
            let resolver = Resolver::new(DirectorySource::new(&settings.documents_dir));
            let names = resolver.available().context("failed to list documents")?;
            print_documents(&names);
            Ok(())
        }
    }
}

fn open_config(settings: &CliSettings) -> Result<(Resolver<DirectorySource>, ConfigStore)> {
    let resolver = Resolver::new(DirectorySource::new(&settings.documents_dir));
    let store = ConfigStore::open(&settings.config_file)
        .with_context(|| format!("failed to open {}", settings.config_file.display()))?;

    let overrides = settings.overrides_file();
    store
        .apply_overrides_file(&overrides, false)
        .with_context(|| format!("failed to apply {}", overrides.display()))?;

    info!(config = %settings.config_file.display(), "configuration store ready");
    Ok((resolver, store))
}

fn consolidator<'a>(
    resolver: &'a Resolver<DirectorySource>,
    store: &'a ConfigStore,
    settings: &CliSettings,
) -> ModelConsolidator<'a, DirectorySource> {
    let consolidator = ModelConsolidator::new(resolver, store);
    match &settings.defaults_key {
        Some(key) => consolidator.with_defaults_key(key.clone()),
        None => consolidator,
    }
}

fn print_documents(names: &[String]) {
    println!("{}", "Available configuration documents:".bold());
    for name in names {
        println!("  - {name}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_compare() {
        let cli = Cli::try_parse_from([
            "topsail", "compare", "--results", "runs/", "--format", "both", "--output", "out",
        ])
        .unwrap();

        match cli.command {
            Commands::Compare {
                results,
                format,
                output,
            } => {
                assert_eq!(results, PathBuf::from("runs/"));
                assert_eq!(format, ReportFormat::Both);
                assert_eq!(output, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_consolidate_all_defaults() {
        let cli = Cli::try_parse_from(["topsail", "consolidate-all", "--no-save", "--log-json"]).unwrap();
        assert!(cli.log_json);
        match cli.command {
            Commands::ConsolidateAll {
                models_key,
                no_save,
                index,
                ..
            } => {
                assert_eq!(models_key, "tests.models");
                assert!(no_save);
                assert_eq!(index, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_preset_requires_a_name() {
        assert!(Cli::try_parse_from(["topsail", "preset"]).is_err());
    }

    #[test]
    fn test_execute_consolidate_and_compare() {
        let temp = TempDir::new().unwrap();
        let documents = temp.path().join("models");
        fs::create_dir_all(&documents).unwrap();
        fs::write(documents.join("base.yaml"), "replicas: 1\nimage: base\n").unwrap();
        fs::write(documents.join("llama.yaml"), "extends: base\nimage: llama\n").unwrap();

        let config_file = temp.path().join("config.yaml");
        fs::write(&config_file, "tests:\n  model: llama\n").unwrap();

        let settings = CliSettings {
            artifact_dir: temp.path().to_path_buf(),
            documents_dir: documents,
            config_file: config_file.clone(),
            defaults_key: None,
        };

        execute(
            Commands::Consolidate {
                location: "tests.model".into(),
                name: None,
                index: Some(2),
                quiet: true,
            },
            &settings,
        )
        .unwrap();

        let store = ConfigStore::open(&config_file).unwrap();
        let model = store.get("tests.model").unwrap();
        assert_eq!(model["image"].as_str(), Some("llama"));
        assert_eq!(model["replicas"].as_u64(), Some(1));

        let records = temp.path().join("records.json");
        fs::write(&records, "[]").unwrap();
        let out = temp.path().join("report");
        execute(
            Commands::Compare {
                results: records,
                format: ReportFormat::Json,
                output: Some(out.clone()),
            },
            &settings,
        )
        .unwrap();
        assert!(out.join(io::REPORT_JSON_FILE).is_file());
    }
}
