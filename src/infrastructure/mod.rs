//! Infrastructure layer
//!
//! This module contains external integrations and adapters: the package
//! manifest, the Subversion command surface and log setup.

mod logging;
pub mod manifest;
pub mod svn;

pub use logging::init_logging;
pub use manifest::{Manifest, ManifestError};
pub use svn::{StatusChanges, SvnClient, escape_peg, parse_status};
