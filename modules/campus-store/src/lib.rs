pub mod error;
pub mod merge;
pub mod store;

pub use error::MergeError;
pub use merge::{merge_categories, merge_records};
pub use store::{write_atomic, write_bytes_atomic, Dataset, DatasetStore};
