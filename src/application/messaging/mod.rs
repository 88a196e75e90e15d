//! Message handling - parsing and capability dispatch

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use parser::MessageParser;
