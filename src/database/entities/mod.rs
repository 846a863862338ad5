pub mod global_defaults;
pub mod layer_server_options;
pub mod layer_styles;
pub mod layer_type_defaults;
pub mod layer_xyz_options;
pub mod layers;
pub mod portal_tree_nodes;
pub mod portals;
pub mod service_layers;
pub mod switch_layer_children;
