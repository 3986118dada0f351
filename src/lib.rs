pub mod api;
pub mod config;
pub mod error;
pub mod explore;
pub mod models;
pub mod query;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;

pub use error::{ExploreError, FieldError, StoreError, ValidationError};
pub use explore::Explorer;
pub use models::{EnrichedListing, Listing, ResultPage};
pub use query::{compile, normalize, QuerySpec, RawQuery};
pub use session::{SearchBackend, SearchSession};
