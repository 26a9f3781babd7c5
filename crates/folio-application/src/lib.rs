//! Application layer for Folio.
//!
//! Use cases that combine sessions, the versioned store, the validator and
//! the change feed into the operations the admin API exposes.

pub mod content_gateway;

pub use content_gateway::{BackupEntry, ContentGateway, MutationOutcome, RestoreOutcome, SiteStatus};
