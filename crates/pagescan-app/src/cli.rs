// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface: argument parsing and the three subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pagescan_core::config::StoreConfig;
use pagescan_core::error::{PageScanError, StageFailure};
use pagescan_core::human_errors::{HumanError, humanize_error, humanize_failure};
use pagescan_core::types::PageKey;
use pagescan_document::{TesseractCli, TextExtractor, available_engines};
use pagescan_store::{LazyStore, PageStore, SqlitePageStore};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pipeline::{PageJob, Pipeline, PipelineReport};

#[derive(Parser)]
#[command(name = "pagescan")]
#[command(version, about = "OCR a scanned page image and store its text", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Detailed logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize, recognise, and store one page image
    Ingest {
        #[arg(long)]
        document_id: i64,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Path to the scanned page image
        #[arg(long)]
        image: PathBuf,

        #[arg(long, value_enum, default_value_t = Engine::Tesseract)]
        engine: Engine,

        /// Tesseract executable (default: `tesseract` on PATH)
        #[arg(long)]
        tesseract_bin: Option<PathBuf>,

        /// Directory holding the ocrs detection/recognition models
        #[arg(long)]
        ocrs_models: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,

        /// Insert the document id into a local SQLite database first
        #[arg(long, requires = "sqlite")]
        register_document: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the stored pages of a document
    Show {
        #[arg(long)]
        document_id: i64,

        #[command(flatten)]
        store: StoreArgs,

        /// Print the pages as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify configuration, store connectivity, and OCR engines
    Check {
        #[command(flatten)]
        store: StoreArgs,

        /// Create the pages table if it is missing
        #[arg(long)]
        init_schema: bool,
    },
}

#[derive(clap::Args)]
pub struct StoreArgs {
    /// Use a local SQLite database instead of the DB_* MySQL settings
    #[arg(long)]
    pub sqlite: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    /// Tesseract command-line engine
    Tesseract,
    /// Pure-Rust ocrs engine (requires the `ocr` feature)
    Ocrs,
}

/// Anything a subcommand can fail with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Stage(#[from] StageFailure),
    #[error(transparent)]
    Other(#[from] PageScanError),
}

impl CommandError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Stage(failure) => failure.exit_code(),
            Self::Other(err) => err.exit_code(),
        }
    }

    pub fn humanize(&self) -> HumanError {
        match self {
            Self::Stage(failure) => humanize_failure(failure),
            Self::Other(err) => humanize_error(err),
        }
    }
}

pub fn run(cli: Cli) -> Result<(), CommandError> {
    run_with_config(cli, StoreConfig::from_env)
}

/// Run a subcommand, reading the `DB_*` settings through `load_config`.
///
/// Store settings are resolved before anything else, so missing settings are
/// reported ahead of key, engine, or file errors.
fn run_with_config<L>(cli: Cli, load_config: L) -> Result<(), CommandError>
where
    L: Fn() -> Result<StoreConfig, PageScanError>,
{
    match cli.command {
        Commands::Ingest {
            document_id,
            page,
            image,
            engine,
            tesseract_bin,
            ocrs_models,
            store,
            register_document,
            json,
        } => {
            let target = StoreTarget::resolve(&store, &load_config)?;
            let key = PageKey::new(document_id, page)?;
            let extractor = build_extractor(engine, tesseract_bin, ocrs_models)?;
            let store = open_store(target, register_document.then_some(document_id))?;
            ingest(extractor, store, PageJob::new(key, image), json)
        }
        Commands::Show {
            document_id,
            store,
            json,
        } => {
            let target = StoreTarget::resolve(&store, &load_config)?;
            show(open_store(target, None)?, document_id, json)
        }
        Commands::Check { store, init_schema } => {
            check(StoreTarget::resolve(&store, &load_config)?, init_schema)
        }
    }
}

/// Where pages are stored, with settings already validated.
enum StoreTarget {
    Sqlite(PathBuf),
    Mysql(StoreConfig),
}

impl StoreTarget {
    fn resolve<L>(args: &StoreArgs, load_config: &L) -> Result<Self, PageScanError>
    where
        L: Fn() -> Result<StoreConfig, PageScanError>,
    {
        match &args.sqlite {
            Some(path) => Ok(Self::Sqlite(path.clone())),
            None => Ok(Self::Mysql(load_config()?)),
        }
    }
}

fn ingest<E: TextExtractor, S: PageStore>(
    extractor: E,
    store: S,
    job: PageJob,
    json: bool,
) -> Result<(), CommandError> {
    let mut pipeline = Pipeline::new(extractor, store);
    let outcome = pipeline.run(&job);
    debug!(state = ?pipeline.state(), "pipeline finished");
    drop(pipeline);
    info!("page store released");
    let report = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).map_err(PageScanError::from)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &PipelineReport) {
    println!(
        "Document {} page {}: {}",
        report.document_id,
        report.page_number,
        report.image_path.display()
    );
    println!(
        "Normalized {}x{} -> {}x{} ({} engine)",
        report.source_width,
        report.source_height,
        report.normalized_width,
        report.normalized_height,
        report.engine
    );
    println!("OCR text length: {}", report.text_chars);
    println!("Snippet: {}", report.snippet);
    println!("Saved to {} store.", report.store);
}

fn show<S: PageStore>(mut store: S, document_id: i64, json: bool) -> Result<(), CommandError> {
    let pages = store.pages_for_document(document_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&pages).map_err(PageScanError::from)?);
        return Ok(());
    }
    if pages.is_empty() {
        println!("Document {document_id}: no stored pages");
        return Ok(());
    }
    println!(
        "Document {document_id}: {} stored page(s)",
        store.page_count(document_id)?
    );
    for page in &pages {
        println!("=== Document {} page {} ===", page.document_id, page.page_number);
        println!("{}", page.ocr_text);
    }
    Ok(())
}

fn check(target: StoreTarget, init_schema: bool) -> Result<(), CommandError> {
    match &target {
        StoreTarget::Sqlite(path) => println!("Store:   sqlite {}", path.display()),
        StoreTarget::Mysql(config) => println!("Store:   mysql {}", config.redacted()),
    }

    let mut store = open_store(target, None)?;
    if init_schema {
        store.ensure_schema()?;
        println!("Schema:  pages table present");
    }
    store.ping()?;
    println!("Status:  CONNECTED OK");

    println!("Engines: {}", available_engines().join(", "));
    match TesseractCli::new().version() {
        Ok(version) => println!("Tesseract: {version}"),
        Err(err) => {
            warn!(error = %err, "tesseract unavailable");
            println!("Tesseract: unavailable ({err})");
        }
    }
    Ok(())
}

fn build_extractor(
    engine: Engine,
    tesseract_bin: Option<PathBuf>,
    ocrs_models: Option<PathBuf>,
) -> Result<Box<dyn TextExtractor>, PageScanError> {
    match engine {
        Engine::Tesseract => {
            let cli = match tesseract_bin {
                Some(bin) => TesseractCli::with_binary(bin),
                None => TesseractCli::new(),
            };
            Ok(Box::new(cli))
        }
        Engine::Ocrs => build_ocrs(ocrs_models),
    }
}

#[cfg(feature = "ocr")]
fn build_ocrs(models: Option<PathBuf>) -> Result<Box<dyn TextExtractor>, PageScanError> {
    use pagescan_document::OcrsEngine;
    use pagescan_document::scan::ocr::OcrConfig;

    let config = match models {
        Some(dir) => OcrConfig::from_dir(dir),
        None => OcrConfig::default(),
    };
    Ok(Box::new(OcrsEngine::new(config)?))
}

#[cfg(not(feature = "ocr"))]
fn build_ocrs(_models: Option<PathBuf>) -> Result<Box<dyn TextExtractor>, PageScanError> {
    Err(PageScanError::Unsupported(
        "the ocrs engine is not compiled in; rebuild with `--features ocr` or use `--engine tesseract`"
            .into(),
    ))
}

/// Build the store for `target`. The connection itself opens on first use.
fn open_store(
    target: StoreTarget,
    register: Option<i64>,
) -> Result<Box<dyn PageStore>, PageScanError> {
    match target {
        StoreTarget::Sqlite(path) => Ok(Box::new(LazyStore::new("sqlite", move || {
            let store = SqlitePageStore::open(&path)?;
            if let Some(document_id) = register {
                store.register_document(document_id)?;
            }
            Ok(Box::new(store) as Box<dyn PageStore>)
        }))),
        StoreTarget::Mysql(config) => open_mysql(config),
    }
}

#[cfg(feature = "mysql")]
fn open_mysql(config: StoreConfig) -> Result<Box<dyn PageStore>, PageScanError> {
    use pagescan_store::MysqlPageStore;

    Ok(Box::new(LazyStore::new("mysql", move || {
        Ok(Box::new(MysqlPageStore::connect(&config)?) as Box<dyn PageStore>)
    })))
}

#[cfg(not(feature = "mysql"))]
fn open_mysql(_config: StoreConfig) -> Result<Box<dyn PageStore>, PageScanError> {
    Err(PageScanError::Unsupported(
        "MySQL support is not compiled in; rebuild with `--features mysql` or pass `--sqlite <path>`"
            .into(),
    ))
}
