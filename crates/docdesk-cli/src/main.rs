use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use docdesk_editor::{Editor, EditorConfig, FsFile, MediaKind};
use docdesk_editor_core::{Command, Selection};
use miette::{IntoDiagnostic, Result};

#[derive(Parser)]
#[command(version, about = "docdesk - rich-text article tooling", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Editor config file (.toml or .json)
    #[arg(long, global = true, env = "DOCDESK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an HTML article and print it in canonical form
    Normalize {
        file: PathBuf,

        /// Open read-only, as the preview page does
        #[arg(long)]
        preview: bool,
    },
    /// Print the heading outline of an HTML article
    Toc {
        file: PathBuf,

        /// Print the outline as JSON
        #[arg(long)]
        json: bool,
    },
    /// Embed an image file into an HTML article
    InsertImage {
        file: PathBuf,
        media: PathBuf,

        /// Cursor position to insert at (default: end of document)
        #[arg(long)]
        at: Option<usize>,
    },
    /// Embed a video file into an HTML article
    InsertVideo {
        file: PathBuf,
        media: PathBuf,

        /// Cursor position to insert at (default: end of document)
        #[arg(long)]
        at: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette()?;
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Commands::Normalize { file, preview } => {
            let editor = open(&file, config, preview).await?;
            for warning in editor.parse_warnings() {
                eprintln!("warning: {warning}");
            }
            println!("{}", editor.html());
        }
        Commands::Toc { file, json } => {
            let editor = open(&file, config, false).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(editor.outline()).into_diagnostic()?
                );
            } else {
                for entry in editor.outline() {
                    let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
                    println!("{indent}{} (#{})", entry.text, entry.id);
                }
            }
        }
        Commands::InsertImage { file, media, at } => {
            insert_media(&file, &media, MediaKind::Image, at, config).await?;
        }
        Commands::InsertVideo { file, media, at } => {
            insert_media(&file, &media, MediaKind::Video, at, config).await?;
        }
    }

    Ok(())
}

async fn open(file: &Path, config: EditorConfig, preview: bool) -> Result<Editor> {
    let contents = tokio::fs::read_to_string(file).await.into_diagnostic()?;
    let editor = Editor::builder()
        .content(contents)
        .config(config)
        .preview(preview)
        .build()?;
    tracing::info!(
        path = %file.display(),
        headings = editor.outline().len(),
        warnings = editor.parse_warnings().len(),
        "loaded article"
    );
    Ok(editor)
}

async fn insert_media(
    file: &Path,
    media: &Path,
    kind: MediaKind,
    at: Option<usize>,
    config: EditorConfig,
) -> Result<()> {
    let mut editor = open(file, config, false).await?;
    let cursor = at.unwrap_or_else(|| editor.state().doc().max_pos());
    editor.apply(Command::SetSelection(Selection::collapsed(cursor)));

    let source = FsFile::new(media);
    let task = match kind {
        MediaKind::Image => editor.ingest_image(source)?,
        MediaKind::Video => editor.ingest_video(source)?,
    };
    let ingested = task.run().await?;
    let inserted = editor.complete_ingest(ingested)?;
    tracing::info!(media = %media.display(), ?kind, inserted, "media ingested");
    if !inserted {
        miette::bail!("could not insert {} at position {cursor}", media.display());
    }

    println!("{}", editor.html());
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    Ok(())
}
