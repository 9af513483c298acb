//! Detection of changes between local and remote documents, and protection
//! against overwriting remote changes made by somebody else.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use eyre::Result;
use log::{debug, warn};
use serde_json::Value as JsonValue;

use crate::fs::{maybe_canonicalize, read_json, write};
use crate::hash::sha256;
use crate::store::DocumentStore;
use crate::{Document, Error};

/// Decides whether a document needs to be uploaded, and keeps track of what
/// has been uploaded.
#[async_trait]
pub trait OverwriteGuard: Send + Sync {
    /// Returns whether `doc` differs from its remote counterpart and should
    /// be uploaded. May fail if the upload would clobber remote changes.
    async fn pre_upload(&self, store: &dyn DocumentStore, doc: &Document) -> Result<bool>;

    /// Called once the upload decision has been acted on, whether or not the
    /// document was uploaded.
    async fn post_upload(&self, doc: &Document) -> Result<()>;
}

/// Asks the user a yes/no question.
pub type ConfirmFn = Box<dyn Fn(&str) -> Result<bool> + Send + Sync>;

/// Asks on the terminal, defaulting to "no".
pub fn confirm_on_terminal(question: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(question)
        .default(false)
        .interact()
        .map_err(|e| Error::Prompt(e.to_string()).into())
}

const SNAPSHOT_FILE: &str = "remote.json";

/// An [`OverwriteGuard`] that remembers a hash of each document it lets
/// through, in a snapshot file. If the remote document no longer matches the
/// snapshot, somebody else changed it since our last upload and the user is
/// asked whether to overwrite it.
pub struct SnapshotGuard {
    snapshot_dir: PathBuf,
    force: bool,
    confirm: ConfirmFn,
}

impl SnapshotGuard {
    pub fn new<P: AsRef<Path>>(snapshot_dir: P) -> Self {
        Self {
            snapshot_dir: snapshot_dir.as_ref().to_path_buf(),
            force: false,
            confirm: Box::new(confirm_on_terminal),
        }
    }

    /// Overwrite remote changes without asking.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Use the given function to ask for confirmation.
    pub fn confirm_with<F>(mut self, confirm: F) -> Self
    where
        F: Fn(&str) -> Result<bool> + Send + Sync + 'static,
    {
        self.confirm = Box::new(confirm);
        self
    }

    fn snapshot_path(&self) -> PathBuf {
        self.snapshot_dir.join(SNAPSHOT_FILE)
    }

    fn load_snapshots(&self) -> Result<BTreeMap<String, String>> {
        match maybe_canonicalize(self.snapshot_path())? {
            Some(path) => Ok(serde_json::from_value(read_json(path)?)?),
            None => Ok(BTreeMap::new()),
        }
    }

    fn save_snapshots(&self, snapshots: &BTreeMap<String, String>) -> Result<()> {
        write(self.snapshot_path(), serde_json::to_string_pretty(snapshots)?)
    }
}

#[async_trait]
impl OverwriteGuard for SnapshotGuard {
    async fn pre_upload(&self, store: &dyn DocumentStore, doc: &Document) -> Result<bool> {
        let id = doc.id();
        let remote = match store.get(id).await? {
            Some(remote) => normalize(&remote),
            None => {
                debug!("{} does not exist remotely yet", id);
                return Ok(true);
            }
        };
        let local = normalize(&JsonValue::from(doc.clone()));
        if local == remote {
            return Ok(false);
        }
        let remote_hash = sha256(remote.to_string());
        match self.load_snapshots()?.get(id) {
            Some(known) if *known != remote_hash => {
                warn!("The remote {} has been modified since it was last uploaded", id);
                let question = format!(
                    "Overwrite the remote {} with your local changes? Remote changes will be lost.",
                    id
                );
                if self.force || (self.confirm)(&question)? {
                    Ok(true)
                } else {
                    Err(Error::OverwriteDeclined(id.to_string()).into())
                }
            }
            _ => Ok(true),
        }
    }

    async fn post_upload(&self, doc: &Document) -> Result<()> {
        let mut snapshots = self.load_snapshots()?;
        let hash = sha256(normalize(&JsonValue::from(doc.clone())).to_string());
        debug!("Recording snapshot {} for {}", hash, doc.id());
        snapshots.insert(doc.id().to_string(), hash);
        self.save_snapshots(&snapshots)
    }
}

/// Reduces a document to the properties that matter when comparing a local
/// document with a remote one: drops revision metadata, and keeps only the
/// content type and data of attachments.
pub fn normalize(doc: &JsonValue) -> JsonValue {
    let mut doc = doc.clone();
    if let JsonValue::Object(obj) = &mut doc {
        obj.remove("_rev");
        obj.remove("_revisions");
        if let Some(JsonValue::Object(attachments)) = obj.get_mut("_attachments") {
            for attachment in attachments.values_mut() {
                if let JsonValue::Object(attachment) = attachment {
                    attachment.retain(|key, _| key == "content_type" || key == "data");
                }
            }
        }
    }
    doc
}
