pub mod cache;
pub mod web;

pub use cache::{MemoryCache, PageCache};
pub use web::Crawler;
