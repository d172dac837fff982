pub mod bake_settings;
pub mod config_loader;
pub mod mesh_writer;
pub mod obj_loader;
pub mod simple_cli;
