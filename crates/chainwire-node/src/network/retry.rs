use crate::config::{parse_duration, TransferConfig};
use crate::p2p::BackoffStrategy;
use chainwire_types::{ChainwireError, ChainwireResult};
use std::time::Duration;

/// Retry schedule handed to the data-transfer collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferRetry {
    pub initial: Duration,
    pub max: Duration,
    pub attempts: u32,
    pub factor: f64,
}

impl TransferRetry {
    pub fn from_config(config: &TransferConfig) -> ChainwireResult<Self> {
        if config.factor < 1.0 {
            return Err(ChainwireError::Config(format!(
                "transfer retry factor {} is below 1",
                config.factor
            )));
        }
        Ok(Self {
            initial: parse_duration(&config.initial_delay)?,
            max: parse_duration(&config.max_delay)?,
            attempts: config.attempts,
            factor: config.factor,
        })
    }

    /// A fresh, jitter-free backoff following this schedule.
    pub fn backoff(&self) -> BackoffStrategy {
        BackoffStrategy::exponential(self.initial, self.max)
            .with_multiplier(self.factor)
            .with_max_attempts(self.attempts)
            .with_jitter(false)
    }

    pub fn delays(&self) -> Vec<Duration> {
        let mut backoff = self.backoff();
        std::iter::from_fn(|| backoff.next_delay()).collect()
    }

    pub fn total_wait(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}

impl Default for TransferRetry {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(300),
            attempts: crate::config::DEFAULT_TRANSFER_ATTEMPTS,
            factor: crate::config::DEFAULT_TRANSFER_FACTOR,
        }
    }
}
