pub mod assets;
pub mod config;
pub mod errors;
pub mod models;
pub mod show_info;
pub mod utils;
