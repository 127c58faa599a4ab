//! Data module - loading, joining, cleaning and filtering

pub mod column;
pub mod schema;
mod cleaner;
mod filter;
mod join;
mod loader;

pub use cleaner::{CleanReport, Cleaner};
pub use filter::{filter, FilterValue, Predicate, PredicateParseError};
pub use join::{join_country_names, JoinPolicy, JoinReport};
pub use loader::{DataLoader, LoaderError};
