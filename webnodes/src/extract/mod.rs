//! Unsubscribe link and page heuristics.
//!
//! Pure functions over text and fetched HTML. Nothing here performs I/O.

mod links;
mod page;

pub use links::{categorize, extract_links, ExtractedLinks, LinkCategory};
pub use page::{
    extract_description, extract_title, has_unsubscribe_confirmation, WebpageInfo,
    CONFIRMATION_KEYWORDS, NO_TITLE,
};
