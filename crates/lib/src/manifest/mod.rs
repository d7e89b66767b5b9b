//! Package manifest model.
//!
//! A manifest is the declarative description of one package, fetched from
//! the registry as YAML and interpreted by the provisioning steps.

mod entry;
mod types;

pub use entry::*;
pub use types::*;
