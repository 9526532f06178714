// Library exports for the Tnua CLI
// This allows testing of internal modules

pub mod commands;
pub mod config;
pub mod models;
