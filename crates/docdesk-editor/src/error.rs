use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors from reading a local file into the document.
///
/// All of them are recoverable: the document is left untouched and the
/// toolbar shows the message until the next successful ingestion.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum MediaError {
    #[error("unsupported video format `{mime}`")]
    #[diagnostic(
        code(docdesk::media::unsupported_format),
        help("allowed video types: {allowed}")
    )]
    UnsupportedFormat { mime: String, allowed: String },

    #[error("could not read `{name}`")]
    #[diagnostic(code(docdesk::media::read))]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("media insertion is disabled in preview mode")]
    #[diagnostic(code(docdesk::media::disabled))]
    Disabled,

    #[error("the editor was closed before the file finished loading")]
    #[diagnostic(code(docdesk::media::cancelled))]
    Cancelled,
}

/// Errors from loading an [`EditorConfig`](crate::EditorConfig).
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("error reading config file {}", path.display())]
    #[diagnostic(code(docdesk::config::io))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing TOML config")]
    #[diagnostic(code(docdesk::config::toml))]
    Toml(#[from] toml::de::Error),

    #[error("error parsing JSON config")]
    #[diagnostic(code(docdesk::config::json))]
    Json(#[from] serde_json::Error),

    #[error("config file {} has no recognised extension", path.display())]
    #[diagnostic(
        code(docdesk::config::format),
        help("use a `.toml` or `.json` file")
    )]
    UnknownFormat { path: PathBuf },

    #[error("history_depth must be at most {max}, got {got}")]
    #[diagnostic(code(docdesk::config::history_depth))]
    HistoryDepth { max: usize, got: usize },
}
