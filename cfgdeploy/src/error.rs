use std::path::PathBuf;

use thiserror::Error;

use crate::lint::Violation;

/// The primary error type that can be produced by cfgdeploy.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error {0}: {1}")]
    Io(String, std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("cannot determine file type of file: {0}")]
    CannotDetermineFileType(PathBuf),
    #[error("failed to load configuration from {0}")]
    FailedToLoadConfig(PathBuf),
    #[error("path has no parent: {0}")]
    PathMissingParent(PathBuf),
    #[error("attachment file iteration failed: {0}")]
    AttachmentIter(#[from] glob::GlobError),
    #[error("failed to parse attachment file pattern \"{0}\": {1}")]
    AttachmentPattern(String, glob::PatternError),
    #[error("attachment {0} is not inside {1}")]
    AttachmentOutsideDir(PathBuf, PathBuf),
    #[error("could not find contact-summary javascript at either of {freeform} or {structured}. Please create one xor other of these files.")]
    MissingContactSummary {
        freeform: PathBuf,
        structured: PathBuf,
    },
    #[error("failed to include file {0}")]
    TemplateInclude(PathBuf),
    #[error("include cycle detected at {0}")]
    IncludeCycle(PathBuf),
    #[error("failed to parse template: {0}")]
    Template(#[from] handlebars::TemplateError),
    #[error("failed to render template \"{0}\": {1}")]
    TemplateRender(String, handlebars::RenderError),
    #[error("{} static check violation(s) found in contact-summary", .0.len())]
    StaticCheck(Vec<Violation>),
    #[error("unrecognized output from linter: {0}")]
    LintOutput(String),
    #[error("minification failed: {0}")]
    Minify(String),
    #[error("command \"{program}\" failed: {message}")]
    Command { program: String, message: String },
    #[error("JavaScript error in {0}: {1}")]
    JavaScript(String, String),
    #[error("unexpected return value from JavaScript {0}: {1}")]
    UnexpectedJavaScriptReturnValue(String, String),
    #[error("failed to convert JSON to JavaScript: {0}")]
    JsonToJavaScript(String),
    #[error("missing upload input: {0}")]
    MissingUploadInput(&'static str),
    #[error("invalid configuration document: {0}")]
    InvalidDocument(String),
    #[error("invalid document store URL \"{0}\"")]
    InvalidStoreUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("document store returned status {status}: {body}")]
    Store { status: u16, body: String },
    #[error("document update conflict for \"{0}\"")]
    StoreConflict(String),
    #[error("user declined to overwrite remote document \"{0}\"")]
    OverwriteDeclined(String),
    #[error("failed to prompt for confirmation: {0}")]
    Prompt(String),
}
