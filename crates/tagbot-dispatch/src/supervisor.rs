//! The outer retry loop.
//!
//! A failed start (configuration unavailable) is retried after the config
//! retry delay. Any error escaping a cycle tears the bot down; after the
//! restart cooldown a fresh bot is built from scratch, so no in-memory state
//! survives a failure.

use tagbot_core::{Config, Forum};

use crate::pacing::Pause;
use crate::session::TagBot;

/// Counters from a supervised run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorReport {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub failed_starts: u64,
}

impl SupervisorReport {
    const fn iterations(&self) -> u64 {
        self.cycles + self.failed_cycles + self.failed_starts
    }
}

/// Keeps a [`TagBot`] running.
#[derive(Debug)]
pub struct Supervisor<P> {
    config: Config,
    pause: P,
    limit: Option<u64>,
}

impl<P: Pause> Supervisor<P> {
    #[must_use]
    pub const fn new(config: Config, pause: P) -> Self {
        Self {
            config,
            pause,
            limit: None,
        }
    }

    /// Stop after `iterations` cycles and failed starts in total.
    #[must_use]
    pub const fn with_limit(mut self, iterations: u64) -> Self {
        self.limit = Some(iterations);
        self
    }

    fn exhausted(&self, report: &SupervisorReport) -> bool {
        self.limit.is_some_and(|limit| report.iterations() >= limit)
    }

    /// Wait `delay` unless the run is over.
    fn rest(&mut self, report: &SupervisorReport, delay: std::time::Duration) {
        if !self.exhausted(report) {
            self.pause.pause(delay);
        }
    }

    /// Run until the iteration limit (forever without one).
    ///
    /// `connect` is called for every fresh start and yields a new forum
    /// connection.
    pub fn run<F, C>(&mut self, mut connect: C) -> SupervisorReport
    where
        F: Forum,
        C: FnMut() -> tagbot_core::Result<F>,
    {
        let mut report = SupervisorReport::default();
        while !self.exhausted(&report) {
            let started = connect().and_then(|forum| TagBot::start(forum, self.config.clone()));
            let mut bot = match started {
                Ok(bot) => bot,
                Err(e) => {
                    report.failed_starts += 1;
                    let delay = if matches!(e, tagbot_core::Error::ConfigUnavailable { .. }) {
                        self.config.config_retry_delay()
                    } else {
                        self.config.restart_cooldown()
                    };
                    tracing::error!(
                        error = %e,
                        error_type = e.error_type(),
                        retry_in_secs = delay.as_secs(),
                        "unable to start tag bot"
                    );
                    self.rest(&report, delay);
                    continue;
                }
            };

            while !self.exhausted(&report) {
                match bot.run_cycle() {
                    Ok(_) => {
                        report.cycles += 1;
                        tracing::debug!("sleeping...");
                        self.rest(&report, self.config.poll_interval());
                    }
                    Err(e) => {
                        report.failed_cycles += 1;
                        tracing::error!(
                            error = %e,
                            error_type = e.error_type(),
                            restart_in_secs = self.config.restart_cooldown_seconds,
                            "cycle failed; restarting"
                        );
                        self.rest(&report, self.config.restart_cooldown());
                        break;
                    }
                }
            }
        }
        tracing::info!(
            cycles = report.cycles,
            failed_cycles = report.failed_cycles,
            failed_starts = report.failed_starts,
            "supervisor stopped"
        );
        report
    }
}
