pub mod api;
pub mod extract;
pub mod pipeline;
pub mod rate_limit;

pub use api::{BioApiClient, BioLookup};
pub use extract::{capitalize, PronounMatcher};
pub use pipeline::BioFetchPipeline;
pub use rate_limit::LookupLimiter;
