pub mod compiler;
pub mod geo;
pub mod params;
pub mod spec;

pub use compiler::{compile, CompiledQuery, FilterChain, OrderBy, Predicate, Window};
pub use geo::{GeoCandidate, GeoPoint, GeoRadius};
pub use params::RawQuery;
pub use spec::{normalize, QuerySpec, DEFAULT_PER_PAGE, MAX_PER_PAGE};
