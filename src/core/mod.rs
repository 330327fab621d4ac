mod args;
mod error;
mod ident;
mod logger;

pub use args::CliArgs;
pub use error::SweepError;
pub use ident::{Ident, qualified};
pub use logger::setup_logging;
