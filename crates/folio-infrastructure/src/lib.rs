pub mod config_service;
pub mod fs_versioned_store;
pub mod json_credential_store;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::fs_versioned_store::FsVersionedStore;
pub use crate::json_credential_store::JsonCredentialStore;
pub use crate::paths::FolioPaths;
