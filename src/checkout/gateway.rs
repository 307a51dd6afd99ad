//! Payment gateway port.

use tracing::info;
use uuid::Uuid;

use super::PaymentIntent;

/// Verdict a gateway returns for one presented intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayVerdict {
    /// The payment was captured; `payment_ref` identifies it with the gateway.
    Approved {
        /// Gateway-side reference for the captured payment.
        payment_ref: String,
    },

    /// The payer dismissed the confirmation without paying.
    Cancelled,

    /// The gateway reported a failure; the reason is surfaced verbatim.
    Failed(String),
}

/// Capability that turns a [`PaymentIntent`] into a [`GatewayVerdict`].
///
/// A simulated confirmation and a real gateway integration are interchangeable
/// implementations of this contract. The call blocks the single-threaded core
/// until the payer or gateway answers; it is the only suspension point.
pub trait PaymentGateway {
    /// Present the intent for confirmation and block until a verdict.
    fn initiate(&mut self, intent: &PaymentIntent) -> GatewayVerdict;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Approve,
    Cancel,
    Fail,
}

/// Deterministic stand-in for a hosted confirmation dialog.
///
/// Scripted to approve, cancel or decline every intent it is shown; used by
/// the demo and the test suite in place of a real gateway.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    script: Script,
    failure_reason: String,
    initiated: usize,
}

impl SimulatedGateway {
    /// A gateway that approves every intent.
    pub fn approving() -> Self {
        SimulatedGateway {
            script: Script::Approve,
            failure_reason: String::new(),
            initiated: 0,
        }
    }

    /// A gateway whose payer cancels every confirmation.
    pub fn cancelling() -> Self {
        SimulatedGateway {
            script: Script::Cancel,
            failure_reason: String::new(),
            initiated: 0,
        }
    }

    /// A gateway that declines every intent with the given reason.
    pub fn failing(reason: impl Into<String>) -> Self {
        SimulatedGateway {
            script: Script::Fail,
            failure_reason: reason.into(),
            initiated: 0,
        }
    }

    /// How many intents this gateway has been shown.
    pub fn initiated_count(&self) -> usize {
        self.initiated
    }
}

impl PaymentGateway for SimulatedGateway {
    fn initiate(&mut self, intent: &PaymentIntent) -> GatewayVerdict {
        self.initiated += 1;

        info!(
            amount_minor = intent.amount_minor(),
            currency = intent.currency_code(),
            track_count = intent.tracks().len(),
            "simulated gateway presented intent"
        );

        match self.script {
            Script::Approve => GatewayVerdict::Approved {
                payment_ref: format!("sim_pay_{}", Uuid::now_v7()),
            },
            Script::Cancel => GatewayVerdict::Cancelled,
            Script::Fail => GatewayVerdict::Failed(self.failure_reason.clone()),
        }
    }
}
