use std::time::Duration;

use solana_sdk::signature::Signature;

use crate::rpc::{Commitment, SignatureState};

use super::error::DeliveryError;

pub const DEFAULT_SEND_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2_000);
pub const DEFAULT_STATUS_RETRIES: u32 = 5;
pub const DEFAULT_STATUS_RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// 投递重试策略。`retries` 为提交总次数上限，`status_retries` 为每次提交后的轮询上限。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastPolicy {
    pub retries: u32,
    pub retry_delay: Duration,
    pub status_retries: u32,
    pub status_retry_delay: Duration,
}

impl Default for BroadcastPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_SEND_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            status_retries: DEFAULT_STATUS_RETRIES,
            status_retry_delay: DEFAULT_STATUS_RETRY_DELAY,
        }
    }
}

/// 单笔交易的投递状态。`attempt` 从 1 开始计数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryState {
    Submitting {
        attempt: u32,
        last_signature: Option<Signature>,
    },
    Polling {
        attempt: u32,
        signature: Signature,
        polls: u32,
    },
    Confirmed {
        signature: Signature,
        commitment: Commitment,
        attempts: u32,
    },
    ExhaustedRetry {
        next_attempt: u32,
        last_signature: Option<Signature>,
        cause: DeliveryError,
    },
    Failed {
        last_signature: Option<Signature>,
        cause: DeliveryError,
        attempts: u32,
    },
}

impl DeliveryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Submitting { .. } => "submitting",
            Self::Polling { .. } => "polling",
            Self::Confirmed { .. } => "confirmed",
            Self::ExhaustedRetry { .. } => "exhausted_retry",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryEvent {
    Sent(Signature),
    SendFailed(String),
    /// `None` 表示节点尚未看到该签名。
    StatusObserved(Option<SignatureState>),
    StatusUnavailable(String),
    BackoffElapsed,
}

impl DeliveryEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Sent(_) => "sent",
            Self::SendFailed(_) => "send_failed",
            Self::StatusObserved(_) => "status_observed",
            Self::StatusUnavailable(_) => "status_unavailable",
            Self::BackoffElapsed => "backoff_elapsed",
        }
    }
}

/// 投递状态迁移表，不做任何 IO。
#[derive(Debug, Clone, Copy)]
pub struct DeliveryMachine {
    policy: BroadcastPolicy,
    target: Commitment,
}

impl DeliveryMachine {
    pub fn new(policy: BroadcastPolicy, target: Commitment) -> Self {
        Self { policy, target }
    }

    pub fn policy(&self) -> &BroadcastPolicy {
        &self.policy
    }

    pub fn target(&self) -> Commitment {
        self.target
    }

    pub fn start(&self) -> DeliveryState {
        DeliveryState::Submitting {
            attempt: 1,
            last_signature: None,
        }
    }

    pub fn transition(&self, state: DeliveryState, event: DeliveryEvent) -> DeliveryState {
        match (state, event) {
            (DeliveryState::Submitting { attempt, .. }, DeliveryEvent::Sent(signature)) => {
                DeliveryState::Polling {
                    attempt,
                    signature,
                    polls: 0,
                }
            }
            (
                DeliveryState::Submitting {
                    attempt,
                    last_signature,
                },
                DeliveryEvent::SendFailed(reason),
            ) => self.retry_or_fail(attempt, last_signature, DeliveryError::Send(reason)),
            (
                DeliveryState::Polling {
                    attempt, signature, ..
                },
                DeliveryEvent::StatusObserved(Some(SignatureState {
                    err: Some(reason), ..
                })),
            ) => DeliveryState::Failed {
                last_signature: Some(signature),
                cause: DeliveryError::Execution { signature, reason },
                attempts: attempt,
            },
            (
                DeliveryState::Polling {
                    attempt, signature, ..
                },
                DeliveryEvent::StatusObserved(Some(SignatureState {
                    confirmation: Some(commitment),
                    err: None,
                })),
            ) if commitment.satisfies(self.target) => DeliveryState::Confirmed {
                signature,
                commitment,
                attempts: attempt,
            },
            (
                DeliveryState::Polling {
                    attempt,
                    signature,
                    polls,
                },
                DeliveryEvent::StatusObserved(_) | DeliveryEvent::StatusUnavailable(_),
            ) => {
                let polls = polls.saturating_add(1);
                if polls >= self.policy.status_retries {
                    self.retry_or_fail(
                        attempt,
                        Some(signature),
                        DeliveryError::ConfirmationTimeout {
                            target: self.target,
                            polls,
                        },
                    )
                } else {
                    DeliveryState::Polling {
                        attempt,
                        signature,
                        polls,
                    }
                }
            }
            (
                DeliveryState::ExhaustedRetry {
                    next_attempt,
                    last_signature,
                    ..
                },
                DeliveryEvent::BackoffElapsed,
            ) => DeliveryState::Submitting {
                attempt: next_attempt,
                last_signature,
            },
            (state, _) if state.is_terminal() => state,
            (state, event) => {
                let attempts = attempts_of(&state);
                DeliveryState::Failed {
                    last_signature: last_signature_of(&state),
                    cause: DeliveryError::InvalidTransition(format!(
                        "{} 状态下收到 {}",
                        state.name(),
                        event.name()
                    )),
                    attempts,
                }
            }
        }
    }

    fn retry_or_fail(
        &self,
        attempt: u32,
        last_signature: Option<Signature>,
        cause: DeliveryError,
    ) -> DeliveryState {
        if attempt >= self.policy.retries {
            DeliveryState::Failed {
                last_signature,
                cause,
                attempts: attempt,
            }
        } else {
            DeliveryState::ExhaustedRetry {
                next_attempt: attempt + 1,
                last_signature,
                cause,
            }
        }
    }
}

fn attempts_of(state: &DeliveryState) -> u32 {
    match state {
        DeliveryState::Submitting { attempt, .. } | DeliveryState::Polling { attempt, .. } => {
            *attempt
        }
        DeliveryState::ExhaustedRetry { next_attempt, .. } => next_attempt.saturating_sub(1),
        DeliveryState::Confirmed { attempts, .. } | DeliveryState::Failed { attempts, .. } => {
            *attempts
        }
    }
}

fn last_signature_of(state: &DeliveryState) -> Option<Signature> {
    match state {
        DeliveryState::Submitting { last_signature, .. }
        | DeliveryState::ExhaustedRetry { last_signature, .. }
        | DeliveryState::Failed { last_signature, .. } => *last_signature,
        DeliveryState::Polling { signature, .. } | DeliveryState::Confirmed { signature, .. } => {
            Some(*signature)
        }
    }
}
