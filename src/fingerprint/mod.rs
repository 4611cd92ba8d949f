//! Deterministic renaming of assets by content hash or pinned version tag.
//!
//! First-party files get a fingerprint derived from their bytes, third-party files get the
//! version pinned for them in the project configuration. Either way the final published
//! path is recorded in the [`PathMapper`](crate::mapper::PathMapper) so the rewrite stages
//! can find it later.

mod conventions;
mod hash;
mod namer;
mod versions;

pub use conventions::NamingConventions;
pub use hash::content_fingerprint;
pub use namer::FingerprintNamer;
pub use versions::PinnedVersions;
