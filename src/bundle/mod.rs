//! Merging of marked script regions into fingerprinted bundles.

mod scripts;

pub use scripts::{BundleOutcome, ScriptBundler};
