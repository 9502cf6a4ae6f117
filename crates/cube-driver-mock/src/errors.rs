//! Error injection for the mock cube.
//!
//! Lets tests make individual lamp operations fail on demand so the
//! scheduler's start, render and shutdown error paths can be exercised.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Operation name of [`DeviceLink::set_power`](cube_core::DeviceLink::set_power).
pub const OP_SET_POWER: &str = "set_power";
/// Operation name of the direct-mode handshake.
pub const OP_DIRECT_MODE: &str = "enter_direct_mode";
/// Operation name of frame delivery.
pub const OP_SEND_FRAME: &str = "send_frame";

/// Matches every operation.
pub const ANY_OPERATION: &str = "*";

/// A failure pattern to inject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorScenario {
    /// Every call to `operation` fails.
    AlwaysFail {
        /// Operation name, or [`ANY_OPERATION`]
        operation: &'static str,
    },
    /// The first `count` calls succeed, every later call fails.
    FailAfterN {
        /// Operation name, or [`ANY_OPERATION`]
        operation: &'static str,
        /// Calls allowed to succeed
        count: u32,
    },
    /// Exactly the call with this 1-based ordinal fails.
    FailOnce {
        /// Operation name, or [`ANY_OPERATION`]
        operation: &'static str,
        /// 1-based call number that fails
        call: u32,
    },
    /// The lamp stops answering: once triggered, everything fails.
    CommunicationLoss {
        /// Calls across all operations before the loss
        after: u32,
    },
}

impl ErrorScenario {
    fn operation(&self) -> &'static str {
        match self {
            ErrorScenario::AlwaysFail { operation }
            | ErrorScenario::FailAfterN { operation, .. }
            | ErrorScenario::FailOnce { operation, .. } => operation,
            ErrorScenario::CommunicationLoss { .. } => ANY_OPERATION,
        }
    }
}

#[derive(Default, Debug)]
struct ErrorState {
    /// Calls seen per operation name, plus a total under [`ANY_OPERATION`].
    operation_counts: HashMap<&'static str, u32>,
    communication_lost: bool,
}

/// Error injection configuration shared by clones of a mock cube.
#[derive(Clone, Debug, Default)]
pub struct ErrorConfig {
    scenarios: Arc<Vec<ErrorScenario>>,
    state: Arc<Mutex<ErrorState>>,
}

impl ErrorConfig {
    /// No injected failures.
    pub fn none() -> Self {
        Self::default()
    }

    /// A single injected failure.
    pub fn scenario(scenario: ErrorScenario) -> Self {
        Self::scenarios(vec![scenario])
    }

    /// Several failures, checked in order.
    pub fn scenarios(scenarios: Vec<ErrorScenario>) -> Self {
        Self {
            scenarios: Arc::new(scenarios),
            state: Arc::default(),
        }
    }

    /// Count one call to `operation` and decide whether it fails.
    pub fn check_operation(&self, operation: &'static str) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let total = {
            let entry = state.operation_counts.entry(ANY_OPERATION).or_insert(0);
            *entry += 1;
            *entry
        };
        let current = {
            let entry = state.operation_counts.entry(operation).or_insert(0);
            *entry += 1;
            *entry
        };

        if state.communication_lost {
            anyhow::bail!("communication lost");
        }

        for scenario in self.scenarios.iter() {
            let applies = scenario.operation() == ANY_OPERATION || scenario.operation() == operation;
            if !applies {
                continue;
            }
            match scenario {
                ErrorScenario::AlwaysFail { .. } => {
                    anyhow::bail!("injected failure on '{}'", operation);
                }
                ErrorScenario::FailAfterN { count, .. } if current > *count => {
                    anyhow::bail!("injected failure on '{}' after {} calls", operation, count);
                }
                ErrorScenario::FailOnce { call, .. } if current == *call => {
                    anyhow::bail!("injected failure on '{}' call {}", operation, call);
                }
                ErrorScenario::CommunicationLoss { after } if total > *after => {
                    state.communication_lost = true;
                    anyhow::bail!("communication lost");
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Clear counters and any lost-communication state.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = ErrorState::default();
    }
}
