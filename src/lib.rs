pub mod config;
pub mod errors;
pub mod loader;
pub mod reference;
pub mod resolution;
pub mod schema;
pub mod types;
