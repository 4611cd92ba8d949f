#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod builder;
pub mod bundle;
pub mod config;
pub mod content;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod mapper;
pub mod models;
pub mod project;
pub mod rewrite;
pub mod selection;
pub mod transforms;

pub use builder::{AssetBuilder, BuildResult};
pub use bundle::ScriptBundler;
pub use content::{ContentSource, FsContent};
pub use error::{AssetError, AssetResult};
pub use fingerprint::FingerprintNamer;
pub use mapper::PathMapper;
pub use models::{AssetRecord, BuildReport};
pub use project::{AssetProjectLayout, BuildContext};
pub use rewrite::{ReferenceRewriter, ResolvedReferenceIndex, RewriteRule, rewrite_document};
pub use selection::AssetInclusion;
