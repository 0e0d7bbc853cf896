use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use config::{
    AppConfig, CURRENT_SCHEMA_VERSION, ConfigStore, LoadedConfig, StorageBackend, default_data_dir,
};
use notes_core::{Draft, ExportFormat, Note, NoteId, Theme};
use notes_services::{DirectoryExportSink, NoteBook, NoteBookBuilder, NotesError};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "legendary-notes")]
#[command(author, version, about = "Tag, pin, search and export local notes")]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding config, notes database and logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a note at the top of the list
    Add {
        /// Note text (multiple words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Optional tag label
        #[arg(short, long, default_value = "")]
        tag: String,

        /// Symbols appended to the text, e.g. --emoji 🎉
        #[arg(short, long)]
        emoji: Vec<String>,
    },

    /// Delete a note by id
    Delete { id: NoteId },

    /// Pin or unpin a note by id
    Pin { id: NoteId },

    /// List notes, pinned first
    List {
        /// Case-insensitive filter on text and tag
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Export all notes to a file
    Export {
        /// plain or markdown (default from config)
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Output directory (default from config, else current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show or change the theme: toggle, dark or light
    Theme { action: Option<String> },

    /// Write a JSON backup of notes and theme
    Backup { path: PathBuf },

    /// Merge notes from a JSON backup
    Restore { path: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let base_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    if let Err(err) = fs::create_dir_all(&base_dir) {
        eprintln!("failed to prepare data dir: {err}");
    }

    let config_store = ConfigStore::from_dir(base_dir.join("config"));
    let loaded = config_store.load_or_init();
    let log_filter = loaded
        .as_ref()
        .map(|loaded| loaded.config.log_filter.clone())
        .unwrap_or_else(|_| AppConfig::default().log_filter);
    let _log_guard = init_local_logger(&base_dir.join("logs"), &log_filter);
    let config = match loaded {
        Ok(LoadedConfig {
            config,
            migrated_from,
        }) => {
            if let Some(from) = migrated_from {
                warn!(
                    from,
                    to = CURRENT_SCHEMA_VERSION,
                    path = %config_store.path().display(),
                    "migrated app config schema"
                );
            }
            config
        }
        Err(err) => {
            error!("failed to load config: {err:#}");
            AppConfig::default()
        }
    };

    let data_dir = match cli.data_dir {
        Some(ref dir) => dir.clone(),
        None => config.data_dir_or(&base_dir),
    };

    match run(cli.command, &config, &data_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &AppConfig, data_dir: &Path) -> Result<()> {
    let book = open_book(config, data_dir)?;

    match command {
        Commands::Add { text, tag, emoji } => {
            let mut draft = Draft::new(text.join(" "), tag);
            for symbol in &emoji {
                draft.insert(symbol);
            }
            match non_fatal(book.add_draft(&mut draft))? {
                Some(Some(note)) => println!("added {}", format_note(&note)),
                Some(None) => println!("nothing to add, note text is empty"),
                None => {}
            }
        }
        Commands::Delete { id } => match non_fatal(book.delete(id))? {
            Some(true) => println!("deleted {id}"),
            Some(false) => println!("no note with id {id}"),
            None => {}
        },
        Commands::Pin { id } => match non_fatal(book.toggle_pin(id))? {
            Some(Some(note)) => println!(
                "{} {}",
                if note.is_pinned { "pinned" } else { "unpinned" },
                note.id
            ),
            Some(None) => println!("no note with id {id}"),
            None => {}
        },
        Commands::List { search } => {
            let notes = book.view(&search);
            if notes.is_empty() {
                if book.is_empty() {
                    println!("No notes yet. Start typing to create one!");
                } else {
                    println!("No notes match \"{search}\".");
                }
            }
            for note in &notes {
                println!("{}", format_note(note));
            }
        }
        Commands::Export { format, out } => {
            let format = format.unwrap_or(config.default_export_format);
            let out = match out {
                Some(dir) => dir,
                None => {
                    let cwd = std::env::current_dir().context("failed to resolve current dir")?;
                    config.export_dir_or(&cwd)
                }
            };
            let sink = DirectoryExportSink::new(out);
            let file = book.export(format, &sink)?;
            println!("exported to {}", sink.path_for(&file).display());
        }
        Commands::Theme { action } => {
            let theme = match action.as_deref() {
                None => Some(book.theme()),
                Some("toggle") => non_fatal(book.toggle_theme())?,
                Some(value) => non_fatal(book.set_theme(value.parse::<Theme>()?))?,
            };
            if let Some(theme) = theme {
                println!("theme: {theme}");
            }
        }
        Commands::Backup { path } => {
            book.export_backup_json(&path)?;
            println!("backup written to {}", path.display());
        }
        Commands::Restore { path } => {
            let report = book.import_backup_json(&path)?;
            println!(
                "restored {} notes ({} already present)",
                report.notes, report.skipped
            );
        }
    }

    Ok(())
}

fn open_book(config: &AppConfig, data_dir: &Path) -> Result<NoteBook> {
    let builder = match config.storage {
        StorageBackend::Sqlite => NoteBookBuilder::new(data_dir.join("legendary-notes.db")),
        StorageBackend::Memory => {
            warn!("memory storage configured, notes will not outlive this process");
            NoteBookBuilder::in_memory()
        }
    };
    builder.build().context("failed to open notes")
}

/// Storage write failures are reported but do not fail the command.
fn non_fatal<T>(result: Result<T, NotesError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err @ NotesError::Persist(_)) => {
            eprintln!("warning: {err}");
            Ok(None)
        }
        Err(err) => bail!(err),
    }
}

fn format_note(note: &Note) -> String {
    let marker = if note.is_pinned { "*" } else { " " };
    format!("{marker} {}  [{}] {}", note.id, note.label(), note.text)
}

fn init_local_logger(log_dir: &Path, filter: &str) -> tracing_appender::non_blocking::WorkerGuard {
    if let Err(err) = fs::create_dir_all(log_dir) {
        eprintln!("failed to create log dir `{}`: {err}", log_dir.display());
    }
    let file_appender = tracing_appender::rolling::daily(log_dir, "legendary-notes.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info,notes_store=debug,notes_services=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_writer(writer)
        .init();

    guard
}
