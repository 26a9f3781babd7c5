//! Content domain module.
//!
//! # Module Structure
//!
//! - `model`: content-type registry, version identifiers, write results
//! - `store`: the `VersionedStore` trait
//! - `validator`: the validation seam and its structural default

mod model;
mod store;
mod validator;

pub use model::{ContentTypeRegistry, Version, VersionId, VersionInfo};
pub use store::{DEFAULT_RETENTION, VersionedStore};
pub use validator::{ContentValidator, DEFAULT_MAX_DEPTH, StructuralValidator};
