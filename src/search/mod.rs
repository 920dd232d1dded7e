mod algolia;
pub mod content;

pub use algolia::SearchClient;
pub use content::{MAX_CONTENT_CHARS, MAX_README_BYTES, fetch_readme, index_content};
