//! Search helpers - keyword extraction and fuzzy ranking

pub mod fuzzy;
pub mod query_parser;

pub use fuzzy::{relevance, token_set_ratio};
pub use query_parser::{contains_any, contains_term, extract_locations, extract_max_price, LocationInfo};
