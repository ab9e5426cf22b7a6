pub mod browser;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod links;
pub mod listing;

pub use browser::{reveal_all, ChromeRevealDriver, ClickOutcome, RevealConfig, RevealDriver, RevealPage};
pub use error::{ExtractionError, FetchError};
pub use extract::{extract, extract_general_sections, extract_reading_groups, Document, Extraction, PageKind};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use links::{extract_marked_links, LinkMarker};
pub use listing::{collect_candidates, fetch_listing, Harvest, InteractiveListing, ListingSource, StaticListing};
