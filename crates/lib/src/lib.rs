//! wheeup-lib: manifest-driven package provisioning.
//!
//! A package is described by a YAML manifest in a registry. Installing it
//! means fetching that manifest and applying its sections to the host:
//! - `users`: a service group and system account
//! - `directories`: directory trees with ownership and mode
//! - `remotes`: files copied verbatim to absolute paths
//! - `content`: executables downloaded by URL
//! - `dependencies`: executables resolved from release metadata
//!
//! [`install::Installer`] ties the pieces together.

pub mod config;
pub mod consts;
pub mod fetch;
pub mod host;
pub mod install;
pub mod loader;
pub mod manifest;
pub mod platform;
pub mod release;
pub mod steps;
pub mod util;
