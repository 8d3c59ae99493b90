//! Listing field extraction
//!
//! `css_extractor` holds element-scoped selection helpers, `expand` the
//! best-effort description reveal, and `field_extractor` assembles a record
//! from one listing container.

mod css_extractor;
mod expand;
mod field_extractor;

pub use css_extractor::*;
pub use expand::*;
pub use field_extractor::*;
