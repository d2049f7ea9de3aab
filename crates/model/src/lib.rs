pub mod config;
pub mod core;
pub mod records;
pub mod schema;
pub mod verify;
