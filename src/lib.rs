//! Tourwise chat - conversational property search over SQLite

pub mod application;
pub mod domain;
pub mod infrastructure;
