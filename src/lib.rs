#![forbid(unsafe_code)]

pub mod cli;
pub mod crawl;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod logging;
pub mod normalize;
pub mod page;
pub mod sink;
