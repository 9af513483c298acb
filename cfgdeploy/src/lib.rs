//! cfgdeploy builds and deploys application configuration.
//!
//! It provides two independent utilities:
//!
//! - a contact summary compiler, which turns a project's contact summary
//!   script (or structured definition of fields and cards) into a single,
//!   verified and minified program, and
//! - a configuration uploader, which uploads a JSON configuration file and a
//!   directory of attachments as a single document to a CouchDB database.
//!
//! For the command line interface, see the `cfgdeploy-cli` crate.

mod attachments;
mod config;
mod contact_summary;
mod document;
mod error;
mod exec;
pub mod fs;
mod hash;
mod js;
mod lint;
mod minify;
mod overwrite;
mod sandbox;
mod store;
mod summary;
mod template;
mod upload;

pub use attachments::{attachments_from_dir, content_type};
pub use config::Config;
pub use contact_summary::{
    assemble, compile_contact_summary, locate_source, verify, SummarySource, EXTRAS_FILE,
    FREEFORM_FILE, STRUCTURED_FILE,
};
pub use document::{Attachment, Attachments, Document};
pub use error::Error;
pub use exec::exec;
pub use lint::{parse_jshint_output, with_line_numbers, JsHint, LintOptions, Linter, SyntaxCheck, Violation};
pub use minify::{CommandMinifier, Minifier, Verbatim};
pub use overwrite::{confirm_on_terminal, normalize, OverwriteGuard, SnapshotGuard};
pub use sandbox::{evaluate, evaluate_summary};
pub use store::{insert_or_replace, CouchStore, DocumentStore};
pub use summary::{
    is_report_valid, is_truthy, Attribute, Bindings, Card, CardDescriptor, CardFields,
    ContactSummary, FieldContext, FieldDescriptor, Report, SummaryDefinition, REPORT_CARD,
};
pub use template::{expand_file, expand_includes, render_driver};
pub use upload::{
    skip_reason, upload_config_doc, SkipReason, TransformFn, UploadOutcome, UploadRequest,
};
