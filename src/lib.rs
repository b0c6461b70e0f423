//! # assurance-core
//!
//! The command engine behind an editor for assurance cases: goal/strategy/evidence argument
//! graphs written as `.gsn` text documents.
//!
//! ## Overview
//!
//! A model directory holds any number of case documents. Each request loads all of them into a
//! [`case::Case`], applies a batch of editor commands, projects the result into a flat,
//! deterministically ordered JSON view, and writes the documents back to disk. Cross-document
//! references are kept consistent as nodes are renamed, removed and deleted.
//!
//! ### Key Features
//!
//! - **Unique identifiers**: node paths and persisted uuids are checked for collisions on every load
//! - **Referential integrity**: deleting a node sweeps every reference to it; renaming retargets them
//! - **Deterministic projection**: byte-identical JSON for an unchanged case
//! - **Two-phase saves**: a failed save leaves every document on disk untouched
//! - **Extensible codecs**: the `.gsn` codec sits behind the [`codec::DocCodec`] trait
//!
//! ## Architecture
//!
//! Per request, leaves first:
//!
//! - **[`loader`]**: reads every case document in a directory
//! - **[`case`]**: the in-memory case, the identity [`case::Index`] and the reference resolver
//! - **[`commands`]**: the editor command set and the [`commands::CommandInterpreter`]
//! - **[`projection`]**: the flat JSON view
//! - **[`persist`]**: two-phase save and uuid assignment
//! - **[`origin`]**: node identifier to source file and line
//! - **[`service`]**: the [`service::Engine`] tying the stages together per editor operation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assurance_core::service::Engine;
//!
//! let engine = Engine::new();
//! let payload = r#"{
//!     "modelDir": "/work/case",
//!     "commandList": [
//!         {"cmd": "onNewChildNode", "nodeId": "top/G1", "childType": "Strategy", "childName": "S1"}
//!     ]
//! }"#;
//! // Success returns the new projection; failure returns the error message.
//! println!("{}", engine.execute("gsn.MODEL_UPDATE", Some(payload)));
//! ```
//!
//! The stages can also be driven directly:
//!
//! ```rust,no_run
//! use assurance_core::{
//!     codec::CodecMap, commands::CommandInterpreter, config::EngineConfig, loader, projection,
//! };
//! use std::path::Path;
//!
//! # fn main() -> Result<(), assurance_core::AssuranceError> {
//! let config = EngineConfig::default();
//! let codecs = CodecMap::create(&config.indent);
//! let case = loader::load(Path::new("/work/case"), &config, &codecs)?;
//! let interpreter = CommandInterpreter::new(case)?;
//! let records = projection::project(interpreter.case());
//! println!("{}", projection::to_json(&records)?);
//! # Ok(())
//! # }
//! ```

pub mod case;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod event;
pub mod loader;
pub mod nodekey;
pub mod origin;
pub mod persist;
pub mod projection;
pub mod properties;
pub mod service;
#[cfg(test)]
mod tests;

pub use error::*;
