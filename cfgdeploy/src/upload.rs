//! Uploading of configuration documents.

use std::path::{Path, PathBuf};

use eyre::Result;
use log::{info, warn};
use serde_json::Value as JsonValue;

use crate::attachments::attachments_from_dir;
use crate::fs::read_json;
use crate::overwrite::OverwriteGuard;
use crate::store::{insert_or_replace, DocumentStore};
use crate::{Document, Error};

/// Transforms the content of a configuration file into the settings that are
/// applied to the uploaded document.
pub type TransformFn<'a> = &'a dyn Fn(JsonValue) -> JsonValue;

/// What to upload, and where.
#[derive(Default)]
pub struct UploadRequest<'a> {
    /// Path to the JSON configuration file.
    pub config_path: Option<&'a Path>,
    /// Path to the directory of attachments.
    pub attachments_dir: Option<&'a Path>,
    /// ID of the document in the database.
    pub doc_id: Option<&'a str>,
    /// Applied to the configuration before it's merged into the document.
    pub transform: Option<TransformFn<'a>>,
}

/// Why an upload was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// None of the configuration path, attachments directory or document ID
    /// were provided.
    MissingInputs,
    /// There's no configuration file at the given path.
    ConfigNotFound,
}

/// The result of a successful [`upload_config_doc`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Skipped(SkipReason),
    /// The document matches the remote document.
    Unchanged,
    /// The document was stored with the given revision.
    Uploaded { rev: String },
}

enum Inputs<'a> {
    Skip(SkipReason),
    Ready {
        json_path: PathBuf,
        attachments_dir: &'a Path,
        doc_id: &'a str,
    },
}

fn check_inputs<'a>(request: &UploadRequest<'a>) -> Result<Inputs<'a>> {
    let (config_path, attachments_dir, doc_id) =
        match (request.config_path, request.attachments_dir, request.doc_id) {
            (None, None, None) => {
                warn!("Information missing: Make sure to provide the configuration file path and the directory path.");
                return Ok(Inputs::Skip(SkipReason::MissingInputs));
            }
            (Some(c), Some(a), Some(d)) => (c, a, d),
            (None, _, _) => return Err(Error::MissingUploadInput("configuration file path").into()),
            (_, None, _) => return Err(Error::MissingUploadInput("attachments directory").into()),
            (_, _, None) => return Err(Error::MissingUploadInput("document ID").into()),
        };

    let json_path = std::env::current_dir()
        .map(|cwd| cwd.join(config_path))
        .unwrap_or_else(|_| config_path.to_path_buf());
    if !json_path.is_file() {
        warn!("No configuration file found at path: {}", json_path.display());
        return Ok(Inputs::Skip(SkipReason::ConfigNotFound));
    }
    Ok(Inputs::Ready {
        json_path,
        attachments_dir,
        doc_id,
    })
}

/// Checks whether [`upload_config_doc`] would skip the given request, without
/// touching any store. Logs a warning for each skipped request, and fails if
/// only some of the inputs were provided.
pub fn skip_reason(request: &UploadRequest<'_>) -> Result<Option<SkipReason>> {
    Ok(match check_inputs(request)? {
        Inputs::Skip(reason) => Some(reason),
        Inputs::Ready { .. } => None,
    })
}

/// Uploads a configuration file, together with a directory of attachments,
/// as a single document.
pub async fn upload_config_doc<S, G>(
    store: &S,
    guard: &G,
    request: UploadRequest<'_>,
) -> Result<UploadOutcome>
where
    S: DocumentStore,
    G: OverwriteGuard + ?Sized,
{
    let (json_path, attachments_dir, doc_id) = match check_inputs(&request)? {
        Inputs::Skip(reason) => return Ok(UploadOutcome::Skipped(reason)),
        Inputs::Ready {
            json_path,
            attachments_dir,
            doc_id,
        } => (json_path, attachments_dir, doc_id),
    };

    let json = read_json(&json_path)?;
    let settings = match request.transform {
        Some(transform) => transform(json),
        None => json,
    };
    let doc = Document::new(doc_id, &attachments_from_dir(attachments_dir)?)?.merged(settings)?;

    let store_ref: &dyn DocumentStore = store;
    let outcome = if guard.pre_upload(store_ref, &doc).await? {
        let rev = insert_or_replace(store, &doc).await?;
        info!("Configuration upload complete!");
        UploadOutcome::Uploaded { rev }
    } else {
        info!("Configuration not uploaded as no changes found");
        UploadOutcome::Unchanged
    };

    guard.post_upload(&doc).await?;

    Ok(outcome)
}
