use std::sync::Arc;
use std::time::Instant;

use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::monitoring::events;
use crate::rpc::{Commitment, Connection, SendOptions};
use crate::wallet::{SignerError, TransactionSigner};

use super::error::DeliveryError;
use super::state::{BroadcastPolicy, DeliveryEvent, DeliveryMachine, DeliveryState};

/// 单笔交易的投递结果，与输入交易一一对应。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub index: usize,
    pub signature: Option<Signature>,
    pub attempts: u32,
    pub outcome: Result<Commitment, DeliveryError>,
}

impl SendResult {
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&DeliveryError> {
        self.outcome.as_ref().err()
    }
}

/// 批量签名后逐笔提交，并轮询到目标确认级别。
#[derive(Clone)]
pub struct Broadcaster {
    connection: Arc<dyn Connection>,
    policy: BroadcastPolicy,
}

impl Broadcaster {
    pub fn new(connection: Arc<dyn Connection>, policy: BroadcastPolicy) -> Self {
        Self { connection, policy }
    }

    pub fn policy(&self) -> &BroadcastPolicy {
        &self.policy
    }

    /// 签名失败时整体返回错误，此时没有任何交易被提交。
    pub async fn broadcast(
        &self,
        transactions: Vec<VersionedTransaction>,
        signer: &dyn TransactionSigner,
        options: &SendOptions,
    ) -> Result<Vec<SendResult>, SignerError> {
        let expected = transactions.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let signed = signer.sign_all(transactions).await?;
        if signed.len() != expected {
            return Err(SignerError::CountMismatch {
                expected,
                actual: signed.len(),
            });
        }

        let started = Instant::now();
        let machine = DeliveryMachine::new(self.policy, options.confirm_commitment);
        let mut results = Vec::with_capacity(expected);
        for (index, tx) in signed.iter().enumerate() {
            results.push(self.deliver(&machine, index, expected, tx, options).await);
        }

        let succeeded = results.iter().filter(|result| result.success()).count();
        events::batch_finished(expected, succeeded, started.elapsed());
        Ok(results)
    }

    async fn deliver(
        &self,
        machine: &DeliveryMachine,
        index: usize,
        total: usize,
        tx: &VersionedTransaction,
        options: &SendOptions,
    ) -> SendResult {
        let started = Instant::now();
        let mut state = machine.start();

        loop {
            let event = match &state {
                DeliveryState::Submitting { attempt, .. } => {
                    events::delivery_attempt(index, total, *attempt);
                    match self.connection.send_transaction(tx, options).await {
                        Ok(signature) => {
                            debug!(
                                target: "lander::broadcaster",
                                index,
                                attempt = *attempt,
                                signature = %signature,
                                "交易已提交"
                            );
                            DeliveryEvent::Sent(signature)
                        }
                        Err(err) => {
                            warn!(
                                target: "lander::broadcaster",
                                index,
                                attempt = *attempt,
                                error = %err,
                                "交易提交失败"
                            );
                            DeliveryEvent::SendFailed(err.to_string())
                        }
                    }
                }
                DeliveryState::Polling {
                    signature, polls, ..
                } => {
                    if *polls > 0 {
                        sleep(self.policy.status_retry_delay).await;
                    }
                    match self.connection.signature_status(signature).await {
                        Ok(status) => DeliveryEvent::StatusObserved(status),
                        Err(err) => {
                            debug!(
                                target: "lander::broadcaster",
                                index,
                                signature = %signature,
                                error = %err,
                                "查询签名状态失败，按未确认处理"
                            );
                            DeliveryEvent::StatusUnavailable(err.to_string())
                        }
                    }
                }
                DeliveryState::ExhaustedRetry {
                    next_attempt,
                    cause,
                    ..
                } => {
                    debug!(
                        target: "lander::broadcaster",
                        index,
                        next_attempt = *next_attempt,
                        cause = %cause,
                        delay_ms = self.policy.retry_delay.as_millis() as u64,
                        "等待后重新提交"
                    );
                    sleep(self.policy.retry_delay).await;
                    DeliveryEvent::BackoffElapsed
                }
                DeliveryState::Confirmed { .. } | DeliveryState::Failed { .. } => break,
            };
            state = machine.transition(state, event);
        }

        match state {
            DeliveryState::Confirmed {
                signature,
                commitment,
                attempts,
            } => {
                events::delivery_confirmed(
                    index,
                    &signature,
                    commitment,
                    attempts,
                    started.elapsed(),
                );
                SendResult {
                    index,
                    signature: Some(signature),
                    attempts,
                    outcome: Ok(commitment),
                }
            }
            DeliveryState::Failed {
                last_signature,
                cause,
                attempts,
            } => {
                events::delivery_failed(index, attempts, &cause);
                SendResult {
                    index,
                    signature: last_signature,
                    attempts,
                    outcome: Err(cause),
                }
            }
            other => SendResult {
                index,
                signature: None,
                attempts: 0,
                outcome: Err(DeliveryError::InvalidTransition(format!(
                    "投递在 {} 状态结束",
                    other.name()
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::testing::{FakeConnection, unsigned_memo_batch};
    use crate::rpc::{ConnectionError, SignatureState};
    use crate::wallet::KeypairSigner;
    use solana_sdk::signature::Keypair;

    fn signer() -> KeypairSigner {
        KeypairSigner::new(Arc::new(Keypair::new()))
    }

    fn processed() -> SendOptions {
        SendOptions {
            skip_preflight: false,
            confirm_commitment: Commitment::Processed,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_send_is_attempted_three_times() {
        let connection = Arc::new(FakeConnection::default().failing_sends());
        let broadcaster = Broadcaster::new(connection.clone(), BroadcastPolicy::default());
        let signer = signer();
        let txs = unsigned_memo_batch(&signer.pubkey(), 1);

        let started = tokio::time::Instant::now();
        let results = broadcaster.broadcast(txs, &signer, &processed()).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].attempts, 3);
        assert!(matches!(results[0].outcome, Err(DeliveryError::Send(_))));
        assert_eq!(connection.send_attempt_count(), 3);
        assert_eq!(connection.send_count(), 0);
        assert!(started.elapsed() >= Duration::from_millis(4_000));
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_on_first_poll_returns_signature() {
        let connection = Arc::new(FakeConnection::default().with_default_status(Some(
            SignatureState {
                confirmation: Some(Commitment::Confirmed),
                err: None,
            },
        )));
        let broadcaster = Broadcaster::new(connection.clone(), BroadcastPolicy::default());
        let signer = signer();
        let txs = unsigned_memo_batch(&signer.pubkey(), 1);

        let results = broadcaster.broadcast(txs, &signer, &processed()).await.unwrap();

        assert_eq!(results[0].outcome, Ok(Commitment::Confirmed));
        assert_eq!(results[0].attempts, 1);
        assert_eq!(connection.status_count(), 1);
        assert_eq!(results[0].signature, connection.sent_signatures().first().copied());
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_transaction_is_resent_with_same_signature() {
        let connection = Arc::new(FakeConnection::default());
        let broadcaster = Broadcaster::new(connection.clone(), BroadcastPolicy::default());
        let signer = signer();
        let txs = unsigned_memo_batch(&signer.pubkey(), 1);

        let results = broadcaster.broadcast(txs, &signer, &processed()).await.unwrap();

        assert!(matches!(
            results[0].outcome,
            Err(DeliveryError::ConfirmationTimeout { polls: 5, .. })
        ));
        assert_eq!(connection.send_attempt_count(), 3);
        assert_eq!(connection.send_count(), 3);
        assert_eq!(connection.status_count(), 15);
        let sent = connection.sent_signatures();
        assert!(sent.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_abort_the_batch() {
        let connection = Arc::new(
            FakeConnection::default()
                .with_send_script(vec![
                    Err("rejected".into()),
                    Err("rejected".into()),
                    Err("rejected".into()),
                ])
                .with_default_status(Some(SignatureState {
                    confirmation: Some(Commitment::Finalized),
                    err: None,
                })),
        );
        let broadcaster = Broadcaster::new(connection.clone(), BroadcastPolicy::default());
        let signer = signer();
        let txs = unsigned_memo_batch(&signer.pubkey(), 2);

        let results = broadcaster.broadcast(txs, &signer, &processed()).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 0);
        assert!(!results[0].success());
        assert_eq!(results[1].index, 1);
        assert!(results[1].success());
        assert_eq!(connection.send_attempt_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn status_query_errors_keep_polling_until_confirmed() {
        let connection = Arc::new(
            FakeConnection::default()
                .with_status_script(vec![
                    Err(ConnectionError::unavailable("node is behind")),
                    Ok(None),
                    Err(ConnectionError::unavailable("node is behind")),
                    Ok(Some(SignatureState {
                        confirmation: Some(Commitment::Processed),
                        err: None,
                    })),
                ])
                .with_default_status(Some(SignatureState {
                    confirmation: Some(Commitment::Confirmed),
                    err: None,
                })),
        );
        let broadcaster = Broadcaster::new(connection.clone(), BroadcastPolicy::default());
        let signer = signer();
        let txs = unsigned_memo_batch(&signer.pubkey(), 1);
        let options = SendOptions {
            skip_preflight: false,
            confirm_commitment: Commitment::Confirmed,
        };

        let results = broadcaster.broadcast(txs, &signer, &options).await.unwrap();

        assert_eq!(results[0].outcome, Ok(Commitment::Confirmed));
        assert_eq!(results[0].attempts, 1);
        assert_eq!(connection.status_count(), 5);
        assert_eq!(connection.send_attempt_count(), 1);
    }

    #[tokio::test]
    async fn signer_count_mismatch_sends_nothing() {
        struct DroppingSigner(KeypairSigner);

        #[async_trait::async_trait]
        impl TransactionSigner for DroppingSigner {
            fn pubkey(&self) -> solana_sdk::pubkey::Pubkey {
                self.0.pubkey()
            }

            async fn sign_all(
                &self,
                transactions: Vec<VersionedTransaction>,
            ) -> Result<Vec<VersionedTransaction>, SignerError> {
                let mut signed = self.0.sign_all(transactions).await?;
                signed.pop();
                Ok(signed)
            }
        }

        let connection = Arc::new(FakeConnection::default());
        let broadcaster = Broadcaster::new(connection.clone(), BroadcastPolicy::default());
        let signer = DroppingSigner(signer());
        let txs = unsigned_memo_batch(&signer.pubkey(), 2);

        let err = broadcaster.broadcast(txs, &signer, &processed()).await.unwrap_err();
        assert_eq!(
            err,
            SignerError::CountMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(connection.send_count(), 0);
    }
}
