//! State classifier
//!
//! Before time may advance, the simulator asks what must happen to the
//! running process. The checks run in a fixed priority order, so at most one
//! of kill, pause and block fires per sub-step.

use crate::queues::RunningSlot;
use crate::ALMOST_ZERO;
use serde::{Deserialize, Serialize};

/// What happens to the running process before the next time step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The terminal CPU burst is done: release the process
    Kill,
    /// The quantum expired: back of the ready queue
    Pause,
    /// The CPU burst is done and I/O follows: move to the blocked set
    Block,
    /// Nothing fires; the running process (if any) keeps the CPU
    Keep,
}

impl Decision {
    /// True if the decision empties the running slot
    pub fn vacates_cpu(self) -> bool {
        !matches!(self, Decision::Keep)
    }
}

/// Result of one classification pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub decision: Decision,
    /// A new process must be chosen for the CPU
    pub dispatch_needed: bool,
}

impl Classification {
    /// The blocked set must be reconciled before dispatching
    ///
    /// Every situation that frees the CPU also requires it.
    pub fn blocked_handling_needed(&self) -> bool {
        self.dispatch_needed
    }
}

/// Classifies the running slot
pub(crate) fn classify(running: Option<&RunningSlot>) -> Classification {
    let Some(slot) = running else {
        return Classification {
            decision: Decision::Keep,
            dispatch_needed: true,
        };
    };

    let process = &slot.process;
    let decision = if process.is_final_burst() && process.head() < ALMOST_ZERO {
        Decision::Kill
    } else if slot.remaining_quantum < ALMOST_ZERO {
        Decision::Pause
    } else if process.head() < ALMOST_ZERO {
        Decision::Block
    } else {
        Decision::Keep
    };

    Classification {
        decision,
        dispatch_needed: decision.vacates_cpu(),
    }
}
