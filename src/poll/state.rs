use crate::config::PollConfig;
use crate::fetch::Stock;

/// Snapshot of the polling lifecycle as consumers observe it.
#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    pub stocks: Vec<Stock>,
    pub loading: bool,
    pub errored: bool,
    pub retry_countdown_secs: u32,
}

impl PollState {
    fn initial() -> Self {
        Self {
            stocks: Vec::new(),
            loading: true,
            errored: false,
            retry_countdown_secs: 0,
        }
    }
}

/// The single piece of work outstanding for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingWork {
    /// A fetch is in flight (or due immediately).
    Fetch,
    /// A failed fetch is counting down to its retry.
    CountdownTick,
    /// Steady state; wait out the refresh interval.
    RefreshSleep,
}

/// Pure polling state machine. The async driver owns the clock and calls
/// back in whenever the work named by [`PollMachine::pending`] completes,
/// so every transition here is synchronous and directly testable.
pub struct PollMachine {
    state: PollState,
    config: PollConfig,
}

impl PollMachine {
    pub fn new(config: PollConfig) -> Self {
        Self {
            state: PollState::initial(),
            config,
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn pending(&self) -> PendingWork {
        if self.state.loading {
            PendingWork::Fetch
        } else if self.state.errored && self.state.retry_countdown_secs > 0 {
            PendingWork::CountdownTick
        } else {
            PendingWork::RefreshSleep
        }
    }

    pub fn finish_success(&mut self, stocks: Vec<Stock>) {
        self.state.stocks = stocks;
        self.state.loading = false;
        self.state.errored = false;
        self.state.retry_countdown_secs = 0;
    }

    /// A fetch failed; arm the retry countdown.
    pub fn finish_failure(&mut self) {
        self.state.loading = false;
        self.state.errored = true;
        self.state.retry_countdown_secs = self.config.retry_delay_secs;
    }

    /// One countdown second elapsed. Reaching zero re-enters loading, so a
    /// failure retries exactly once per countdown.
    pub fn tick(&mut self) {
        self.state.retry_countdown_secs = self.state.retry_countdown_secs.saturating_sub(1);
        if self.state.retry_countdown_secs == 0 {
            self.begin_loading();
        }
    }

    /// The steady-state refresh interval elapsed.
    pub fn refresh(&mut self) {
        self.begin_loading();
    }

    /// Parameters switched; reload immediately, abandoning any countdown.
    ///
    /// Stale rows are kept. Consumers hide them behind the loading flag and
    /// the next success replaces them wholesale.
    pub fn restart(&mut self) {
        self.begin_loading();
    }

    fn begin_loading(&mut self) {
        self.state.loading = true;
        self.state.errored = false;
        self.state.retry_countdown_secs = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    fn test_config() -> PollConfig {
        PollConfig {
            refresh_interval: Duration::from_secs(60),
            retry_delay_secs: 10,
            countdown_tick: Duration::from_secs(1),
        }
    }

    fn stock(symbol: &str) -> Stock {
        Stock {
            symbol: symbol.to_string(),
            last_traded_price: 100.0,
            percent_change: 1.0,
        }
    }

    #[test]
    fn starts_loading() {
        let machine = PollMachine::new(test_config());

        assert!(machine.state().loading);
        assert!(!machine.state().errored);
        assert_eq!(machine.pending(), PendingWork::Fetch);
    }

    #[test]
    fn success_enters_steady_refresh() {
        let mut machine = PollMachine::new(test_config());
        machine.finish_success(vec![stock("TCS")]);

        assert!(!machine.state().loading);
        assert_eq!(machine.state().stocks.len(), 1);
        assert_eq!(machine.pending(), PendingWork::RefreshSleep);
    }

    #[test]
    fn failure_arms_retry_countdown() {
        let mut machine = PollMachine::new(test_config());
        machine.finish_failure();

        assert!(machine.state().errored);
        assert_eq!(machine.state().retry_countdown_secs, 10);
        assert_eq!(machine.pending(), PendingWork::CountdownTick);
    }

    #[test]
    fn countdown_reenters_loading_exactly_once() {
        let mut machine = PollMachine::new(test_config());
        machine.finish_failure();

        let mut loading_entries = 0;
        for _ in 0..10 {
            assert_eq!(machine.pending(), PendingWork::CountdownTick);
            machine.tick();
            if machine.state().loading {
                loading_entries += 1;
            }
        }

        assert_eq!(loading_entries, 1);
        assert_eq!(machine.pending(), PendingWork::Fetch);
        assert!(!machine.state().errored);
    }

    #[test]
    fn refresh_reenters_loading() {
        let mut machine = PollMachine::new(test_config());
        machine.finish_success(vec![stock("TCS")]);
        machine.refresh();

        assert!(machine.state().loading);
        assert_eq!(machine.pending(), PendingWork::Fetch);
    }

    #[test]
    fn restart_keeps_stale_rows_while_reloading() {
        let mut machine = PollMachine::new(test_config());
        machine.finish_success(vec![stock("TCS")]);
        machine.restart();

        assert!(machine.state().loading);
        assert!(!machine.state().errored);
        assert_eq!(machine.state().stocks.len(), 1);
    }

    #[test]
    fn restart_abandons_a_running_countdown() {
        let mut machine = PollMachine::new(test_config());
        machine.finish_failure();
        machine.tick();
        machine.restart();

        assert!(machine.state().loading);
        assert!(!machine.state().errored);
        assert_eq!(machine.state().retry_countdown_secs, 0);
    }
}
