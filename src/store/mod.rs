pub mod memory;
pub mod rest;
pub mod traits;

pub use memory::{MemoryStore, SeedData};
pub use rest::RestStore;
pub use traits::{GeoIndex, ListingRelations, ListingStore, ProfileDirectory, StoreResult};
