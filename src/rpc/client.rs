use std::sync::Arc;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::message::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use tracing::debug;

use super::connection::{Connection, SendOptions, SignatureState, SimulationOutcome};
use super::error::{ConnectionError, ConnectionResult};
use super::lookup::deserialize_lookup_table;
use super::Commitment;

/// 基于 `solana-client` 非阻塞客户端的 [`Connection`] 实现。
#[derive(Clone)]
pub struct RpcConnection {
    client: Arc<RpcClient>,
}

impl RpcConnection {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self::new(Arc::new(RpcClient::new_with_commitment(
            url.into(),
            CommitmentConfig::confirmed(),
        )))
    }

    pub fn client(&self) -> &Arc<RpcClient> {
        &self.client
    }
}

#[async_trait]
impl Connection for RpcConnection {
    fn endpoint(&self) -> String {
        self.client.url()
    }

    async fn latest_blockhash(&self) -> ConnectionResult<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(ConnectionError::LatestBlockhash)
    }

    async fn simulate(&self, tx: &VersionedTransaction) -> ConnectionResult<SimulationOutcome> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            ..RpcSimulateTransactionConfig::default()
        };
        let response = self
            .client
            .simulate_transaction_with_config(tx, config)
            .await
            .map_err(ConnectionError::Simulate)?;
        let value = response.value;
        let outcome = SimulationOutcome {
            err: value.err.map(|err| format!("{err:?}")),
            units_consumed: value.units_consumed,
            logs: value.logs.unwrap_or_default(),
        };
        debug!(
            target: "rpc::simulate",
            units = ?outcome.units_consumed,
            err = ?outcome.err,
            "模拟完成"
        );
        Ok(outcome)
    }

    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        options: &SendOptions,
    ) -> ConnectionResult<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            preflight_commitment: Some(options.confirm_commitment.into()),
            ..RpcSendTransactionConfig::default()
        };
        self.client
            .send_transaction_with_config(tx, config)
            .await
            .map_err(ConnectionError::SendTransaction)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> ConnectionResult<Option<SignatureState>> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(ConnectionError::SignatureStatus)?;
        let status = response.value.into_iter().next().flatten();
        Ok(status.map(|status| SignatureState {
            confirmation: status.confirmation_status.as_ref().map(Commitment::from),
            err: status.err.map(|err| format!("{err:?}")),
        }))
    }

    async fn lookup_table(
        &self,
        address: &Pubkey,
    ) -> ConnectionResult<Option<AddressLookupTableAccount>> {
        let response = self
            .client
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await
            .map_err(|source| ConnectionError::LookupTableFetch {
                address: *address,
                source,
            })?;
        match response.value {
            Some(account) => deserialize_lookup_table(address, &account.data).map(Some),
            None => Ok(None),
        }
    }
}
