/// Whole-page caching for the site-wide listing
pub mod page_cache;

pub use page_cache::PageCache;
