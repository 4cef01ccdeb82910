use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::config::PollConfig;
use crate::error::{AppError, Result};
use crate::poll::state::{PendingWork, PollMachine, PollState};
use crate::poll::{MoversApi, PollParams};

#[derive(Debug, Clone, Copy)]
enum PollCommand {
    Switch(PollParams),
    Shutdown,
}

/// Drives a [`PollMachine`] against a movers source, publishing every
/// state change over a watch channel.
pub struct PollController {
    api: Arc<dyn MoversApi>,
    config: PollConfig,
}

impl PollController {
    pub fn new(api: Arc<dyn MoversApi>, config: PollConfig) -> Self {
        Self { api, config }
    }

    /// Spawn a poll loop tracking `params`.
    pub fn spawn(&self, params: PollParams) -> PollHandle {
        let machine = PollMachine::new(self.config.clone());
        let (command_tx, command_rx) = mpsc::channel(8);
        let (state_tx, state_rx) = watch::channel(machine.state().clone());

        let api = Arc::clone(&self.api);
        let config = self.config.clone();
        let task = tokio::spawn(run_loop(api, config, machine, params, command_rx, state_tx));

        PollHandle {
            commands: command_tx,
            states: state_rx,
            task,
        }
    }
}

/// Handle to a spawned poll loop. Dropping it stops the loop at the next
/// phase boundary; [`PollHandle::shutdown`] stops it and waits.
pub struct PollHandle {
    commands: mpsc::Sender<PollCommand>,
    states: watch::Receiver<PollState>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Receiver over published state snapshots.
    pub fn states(&self) -> watch::Receiver<PollState> {
        self.states.clone()
    }

    /// Switch the tracked category or segment. The loop abandons whatever
    /// fetch or timer it was holding and reloads immediately.
    pub async fn switch(&self, params: PollParams) -> Result<()> {
        self.commands
            .send(PollCommand::Switch(params))
            .await
            .map_err(|_| AppError::message("Poll loop is no longer running"))
    }

    pub async fn shutdown(self) -> Result<()> {
        // A closed channel means the loop already stopped on its own.
        let _ = self.commands.send(PollCommand::Shutdown).await;
        self.task.await?;
        Ok(())
    }
}

async fn run_loop(
    api: Arc<dyn MoversApi>,
    config: PollConfig,
    mut machine: PollMachine,
    mut params: PollParams,
    mut commands: mpsc::Receiver<PollCommand>,
    states: watch::Sender<PollState>,
) {
    loop {
        // Each phase races exactly one fetch or timer against the command
        // channel; dropping the un-taken branch is what cancels it.
        let command = match machine.pending() {
            PendingWork::Fetch => {
                tokio::select! {
                    command = commands.recv() => Some(command.unwrap_or(PollCommand::Shutdown)),
                    outcome = api.fetch_movers(params) => {
                        match outcome {
                            Ok(stocks) => machine.finish_success(stocks),
                            Err(err) => {
                                log::warn!("Movers fetch failed: {}", err);
                                machine.finish_failure();
                            }
                        }
                        None
                    }
                }
            }
            PendingWork::CountdownTick => {
                tokio::select! {
                    command = commands.recv() => Some(command.unwrap_or(PollCommand::Shutdown)),
                    _ = sleep(config.countdown_tick) => {
                        machine.tick();
                        None
                    }
                }
            }
            PendingWork::RefreshSleep => {
                tokio::select! {
                    command = commands.recv() => Some(command.unwrap_or(PollCommand::Shutdown)),
                    _ = sleep(config.refresh_interval) => {
                        machine.refresh();
                        None
                    }
                }
            }
        };

        match command {
            Some(PollCommand::Switch(next)) => {
                params = next;
                machine.restart();
            }
            Some(PollCommand::Shutdown) => break,
            None => {}
        }

        // Send only fails once every receiver is gone, which is harmless
        // for a loop that publishes fire-and-forget snapshots.
        let _ = states.send(machine.state().clone());
    }
}
