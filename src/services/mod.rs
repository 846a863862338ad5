pub mod defaults_store;
pub mod export_service;
pub mod import_service;
pub mod portal_service;
pub mod tree_service;

pub use defaults_store::*;
pub use export_service::*;
pub use import_service::*;
pub use portal_service::*;
pub use tree_service::*;
