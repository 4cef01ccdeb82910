use async_trait::async_trait;

use crate::error::Result;
use crate::fetch::{MarketSegment, MoversCategory, Stock};

pub mod client;
pub mod controller;
pub mod state;

pub use client::HttpMoversClient;
pub use controller::{PollController, PollHandle};
pub use state::{PendingWork, PollMachine, PollState};

/// Category and segment a polling session is tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollParams {
    pub category: MoversCategory,
    pub segment: MarketSegment,
}

/// Source of movers listings the poller drives. Implemented over the HTTP
/// API for real use and by scripted fakes in tests.
#[async_trait]
pub trait MoversApi: Send + Sync {
    async fn fetch_movers(&self, params: PollParams) -> Result<Vec<Stock>>;
}
