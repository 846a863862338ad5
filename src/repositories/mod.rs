//! Narrow data-access types over the configuration database. Each one borrows a connection or an
//! open transaction; none holds connection state of its own.

pub mod defaults_repository;
pub mod layer_repository;
pub mod tree_repository;

pub use defaults_repository::DefaultsRepository;
pub use layer_repository::LayerRepository;
pub use tree_repository::TreeRepository;
