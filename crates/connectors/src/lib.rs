pub mod error;
pub mod manager;
pub mod source;
pub mod target;
