//! Runtime configuration for type inference.

mod options;

pub use options::{Config, ConfigOption, ScopedConfig};
