//! Adapters - interactive front ends over the dispatcher

pub mod console;

pub use console::ConsoleAdapter;
