//! Case module: the in-memory assurance case.
//!
//! # Module Organization
//!
//! - [`model`]: Case, Document, Definition and node locations
//! - [`index`]: the identity index mapping node identifiers to locations
//! - [`resolve`]: reference checking, reverse-usage scans, retargeting and sweeping
//!
//! ```rust
//! use assurance_core::case::{Case, Document, Index};
//! ```

mod index;
mod model;
pub mod resolve;

#[cfg(test)]
mod tests;

pub use index::{Index, IndexEntry};
pub use model::{Case, Definition, Document, NodeLocation};
pub use resolve::Usage;
