//! Command-line interface module.

mod commands;
mod health;
mod limits;
mod validate;

pub use commands::{Cli, Commands, OutputFormat, ValueKind};
pub use health::check_health;
pub use limits::show_limits;
pub use validate::validate_value;
