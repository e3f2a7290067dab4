//! Domain types and the seams between the service and its collaborators

pub mod cache;
pub mod convert;
pub mod freshness;
pub mod provider;
pub mod rates;

// Re-export main types for cleaner imports
pub use cache::{Artifact, ArtifactStore, Resource};
pub use freshness::FreshnessPolicy;
pub use provider::RateProvider;
pub use rates::{ConversionRequest, ConversionResult, RateSnapshot, SymbolMap, USD};
