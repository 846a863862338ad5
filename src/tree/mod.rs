//! Portal navigation trees: folder/leaf parsing, validation against a layer document's closure,
//! and the tree file format written on export.

pub mod node;
pub mod validator;

pub use node::{is_folder, FolderSpec, LeafSpec, TreeDocument, TreeNodeSpec};
pub use validator::{check_registered, TreeValidator};
