use crate::error::Result;

pub mod history;
pub mod movers;

pub use history::HistoryFetcher;
pub use movers::{MarketSegment, MoversCategory, MoversFetcher, Stock};

/// Default fan-out applied when fetching per-symbol history concurrently.
pub const HISTORY_CONCURRENCY_LIMIT: usize = 4;

pub type FetchResult<T> = Result<T>;
