//! Document codecs: turning case source files into [`Document`]s and back.
//!
//! ## Key Components
//!
//! - [`DocCodec`] trait - implement to support another case file format
//! - [`CodecMap`] - registry of codecs keyed by file extension
//! - [`gsn::GsnCodec`] - the built-in codec for `.gsn` text documents
//! - [`ParseDiagnostic`] - dangling references and recovered per-document problems
//!
//! Register a custom codec via [`CodecMap::insert`]:
//!
//! ```rust
//! use std::{path::Path, sync::Arc};
//! use assurance_core::{case::Document, codec::{CodecMap, DocCodec}, AssuranceError};
//!
//! struct MyCodec;
//!
//! impl DocCodec for MyCodec {
//!     fn parse(&self, content: &str, path: &Path) -> Result<Document, AssuranceError> {
//!         todo!();
//!     }
//!
//!     fn generate_source(&self, doc: &Document) -> Result<String, AssuranceError> {
//!         todo!();
//!     }
//! }
//!
//! let codecs = CodecMap::create("    ");
//! codecs.insert("mycase", Arc::new(MyCodec));
//! ```

use parking_lot::RwLock;
use std::{path::Path, result::Result, sync::Arc};

use crate::{case::Document, error::AssuranceError};

pub mod diagnostic;
pub mod gsn;

pub use diagnostic::{ParseDiagnostic, UnresolvedReference};

pub trait DocCodec: Send + Sync {
    /// Parse the full text of the file at `path` into a document. Implementations record each
    /// node's source line in [`crate::properties::Node::position`].
    fn parse(&self, content: &str, path: &Path) -> Result<Document, AssuranceError>;

    /// Generate the canonical text of a document.
    fn generate_source(&self, doc: &Document) -> Result<String, AssuranceError>;
}

// Codecs are stateless; the lock only guards registration.
#[allow(clippy::type_complexity)]
pub struct CodecMap(Arc<RwLock<Vec<(String, Arc<dyn DocCodec>)>>>);

impl Clone for CodecMap {
    fn clone(&self) -> Self {
        CodecMap(self.0.clone())
    }
}

/// An empty registry.
impl Default for CodecMap {
    fn default() -> Self {
        CodecMap(Arc::new(RwLock::new(Vec::new())))
    }
}

impl CodecMap {
    /// A registry holding the built-in `gsn` codec, writing with `indent`.
    pub fn create(indent: &str) -> Self {
        CodecMap(Arc::new(RwLock::new(vec![(
            "gsn".to_string(),
            Arc::new(gsn::GsnCodec::new(indent)) as Arc<dyn DocCodec>,
        )])))
    }

    pub fn insert(&self, extension: &str, codec: Arc<dyn DocCodec>) {
        let mut writer = self.0.write();
        if let Some(entry) = writer.iter_mut().find(|(ext, _)| ext == extension) {
            entry.1 = codec;
        } else {
            writer.push((extension.to_string(), codec));
        }
    }

    pub fn get(&self, ext: &str) -> Option<Arc<dyn DocCodec>> {
        let reader = self.0.read();
        reader
            .iter()
            .find(|(codec_ext, _value)| ext == codec_ext)
            .map(|(_codec_ext, value)| value.clone())
    }

    /// The codec registered for a file's extension.
    pub fn for_path(&self, path: &Path) -> Result<Arc<dyn DocCodec>, AssuranceError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.get(ext).ok_or_else(|| {
            AssuranceError::Codec(format!(
                "no codec registered for extension \"{ext}\" ({})",
                path.display()
            ))
        })
    }

    pub fn extensions(&self) -> Vec<String> {
        let reader = self.0.read();
        reader
            .iter()
            .map(|(codec_ext, _value)| codec_ext.clone())
            .collect::<Vec<String>>()
    }
}
