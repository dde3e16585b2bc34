// Library surface for the binary and for headless/integration tests.
pub mod app_dirs;
pub mod config;
pub mod drill;
pub mod error;
pub mod input;
pub mod runtime;
pub mod session;
pub mod speech;
pub mod word_source;
