//! Reference rewriting for HTML documents and source maps.
//!
//! Rewriting runs in two explicit phases. [`ReferenceRewriter`] replaces one-to-one
//! references and returns the [`ResolvedReferenceIndex`] it built along the way; the
//! [`ScriptBundler`](crate::bundle::ScriptBundler) then consumes that index to merge
//! marked script regions. [`rewrite_document`] runs both phases in order.

mod document;
mod references;
mod rules;
mod source_map;

pub use document::{DocumentOutcome, rewrite_document};
pub(crate) use references::try_replace_all;
pub use references::{DocumentPaths, ReferenceRewriter, ResolvedReferenceIndex, RewrittenDocument};
pub use rules::{ReferenceKind, RegionMarkers, RewriteRule};
pub use source_map::strip_source_directories;
