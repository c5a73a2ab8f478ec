pub mod cli;
pub mod context;
pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod services;
pub mod tools;
pub mod utils;
pub mod workflows;

#[cfg(test)]
mod test_support;

pub use cli::{Cli, Commands};
pub use context::AppContext;
pub use error::AppError;
pub use models::{Config, OutputFormat};
