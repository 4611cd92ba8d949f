//! Helpers for resolving and normalising asset paths across the build trees.
//!
//! Reference filtering and relative-path arithmetic are split into focused submodules so
//! the rewriting and bundling code can share them and each piece can be tested on its own.

mod filters;
mod relative;

pub use filters::should_ignore_asset_reference;
pub use relative::{absolutize, relative_path, resolve_reference, to_web_path};
