pub mod analyzer;
pub mod config;
pub mod error;
pub mod handle;
pub mod integrity;
pub mod mapper;
pub mod metrics;
pub mod processor;
pub mod retry;
pub mod run;
pub mod service;

#[cfg(test)]
mod testkit;
