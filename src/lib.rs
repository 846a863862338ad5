//! Layer configuration compiler for map portals.
//!
//! Moves a portal's layer configuration between a normalised SQLite database and the nested JSON
//! layer document consumed by the map viewer. Export prunes every field equal to its layer-type
//! default; import is transactional and runs in two passes so switchlayers can reference layers
//! defined anywhere in the batch. Navigation trees are validated against the layer document
//! before they replace the stored tree.

pub mod common;
pub mod config;
pub mod database;
pub mod document;
pub mod errors;
pub mod repositories;
pub mod services;
pub mod tree;
