//! Packaging of a directory of files as document attachments.

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use eyre::Result;
use log::{debug, warn};

use crate::document::{Attachment, Attachments};
use crate::Error;

/// Reads every file beneath `dir` (recursively) into an attachment, keyed by
/// its `/`-separated path relative to `dir`. A missing directory yields no
/// attachments.
pub fn attachments_from_dir<P: AsRef<Path>>(dir: P) -> Result<Attachments> {
    let dir = dir.as_ref();
    let mut attachments = Attachments::new();
    if !dir.is_dir() {
        warn!("No attachments directory found at path: {}", dir.display());
        return Ok(attachments);
    }
    let root = dir
        .canonicalize()
        .map_err(|e| Error::Io(dir.display().to_string(), e))?;
    let pattern = format!("{}/**/*", glob::Pattern::escape(&root.display().to_string()));
    for entry_result in
        glob::glob(&pattern).map_err(|e| Error::AttachmentPattern(pattern.clone(), e))?
    {
        let entry = entry_result?;
        if !entry.is_file() {
            continue;
        }
        let relative = entry
            .strip_prefix(&root)
            .map_err(|_| Error::AttachmentOutsideDir(entry.clone(), root.clone()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = fs::read(&entry).map_err(|e| Error::Io(entry.display().to_string(), e))?;
        debug!("Attaching {} ({} bytes)", name, content.len());
        attachments.insert(
            name,
            Attachment {
                content_type: content_type(&entry).to_string(),
                data: general_purpose::STANDARD.encode(&content),
            },
        );
    }
    Ok(attachments)
}

/// Guesses a file's MIME type from its extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "json" => "application/json",
        "js" => "application/javascript",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn files_are_attached_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("logo.png"), b"hello").unwrap();
        fs::create_dir(dir.path().join("icons")).unwrap();
        fs::write(dir.path().join("icons/a.SVG"), "<svg/>").unwrap();
        fs::write(dir.path().join("icons/notes"), "x").unwrap();

        let attachments = attachments_from_dir(dir.path()).unwrap();
        assert_eq!(
            attachments.keys().collect::<Vec<_>>(),
            vec!["icons/a.SVG", "icons/notes", "logo.png"]
        );
        assert_eq!(
            attachments["logo.png"],
            Attachment {
                content_type: "image/png".to_string(),
                data: "aGVsbG8=".to_string(),
            }
        );
        assert_eq!(attachments["icons/a.SVG"].content_type, "image/svg+xml");
        assert_eq!(
            attachments["icons/notes"].content_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn relative_directories_are_resolved() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("branding")).unwrap();
        fs::write(dir.path().join("branding/logo.png"), b"hello").unwrap();

        let nested = attachments_from_dir(dir.path().join(".").join("branding")).unwrap();
        assert_eq!(nested.keys().collect::<Vec<_>>(), vec!["logo.png"]);

        let cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        let dotted = attachments_from_dir("./branding");
        let dotted_slash = attachments_from_dir("./branding/");
        std::env::set_current_dir(cwd).unwrap();
        assert_eq!(dotted.unwrap().keys().collect::<Vec<_>>(), vec!["logo.png"]);
        assert_eq!(
            dotted_slash.unwrap().keys().collect::<Vec<_>>(),
            vec!["logo.png"]
        );
    }

    #[test]
    fn missing_directory_has_no_attachments() {
        let dir = tempfile::tempdir().unwrap();
        assert!(attachments_from_dir(dir.path().join("nope"))
            .unwrap()
            .is_empty());
    }
}
