pub mod normalize;
pub mod scout;
pub mod sources;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use normalize::{NormalizationWarning, Normalizer, TopicMatcher};
pub use scout::{Scout, SyncStats};
pub use sources::{ListingKind, ListingPlan, SourcePlan};
