#[macro_use]
extern crate tracing;

mod cli;
mod logging;

pub use cli::{
    Cli,
    Command,
};
pub use logging::{
    init_errors,
    init_logging,
};
