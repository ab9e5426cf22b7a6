pub mod config;
pub mod error;
pub mod text;
pub mod types;
pub mod urls;

pub use config::Config;
pub use error::CommonError;
pub use text::{mentions, slugify};
pub use types::*;
pub use urls::{canonical_url, sanitize_url};
