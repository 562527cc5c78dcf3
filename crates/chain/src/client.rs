use crate::{
    BlockData, BlockHeader, ChainError, EthscriptionsValidator, LogRecord, TxRecord,
};
use alloy_consensus::{Transaction as _, TxReceipt as _};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::{Block, TransactionInput, TransactionReceipt, TransactionRequest};
use alloy_sol_types::{sol, SolCall};
use backon::{ExponentialBuilder, Retryable};
use futures_util::{stream::BoxStream, StreamExt};
use std::{collections::HashMap, future::IntoFuture, time::Duration};
use tracing::{debug, warn};

sol! {
    function points(address user) external view returns (uint256);
    function activeMultiplier() external view returns (uint256);
}

/// [`crate::ChainClient`] over an alloy WebSocket provider.
///
/// Every RPC round-trip carries the configured per-call timeout and a short
/// jittered retry for transient transport failures; sustained failures
/// surface to the caller, which owns the slower outer retry loop.
#[derive(Debug, Clone)]
pub struct RpcChainClient {
    provider: RootProvider,
    validator: EthscriptionsValidator,
    points_address: Address,
    timeout: Duration,
}

impl RpcChainClient {
    /// Connects to the given WebSocket endpoint.
    pub async fn connect(
        rpc_url: &str,
        points_address: Address,
        validator: EthscriptionsValidator,
        timeout: Duration,
    ) -> Result<Self, ChainError> {
        let provider = RootProvider::connect(rpc_url).await?;
        Ok(Self { provider, validator, points_address, timeout })
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, ChainError>
    where
        F: IntoFuture<Output = Result<T, alloy_transport::TransportError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(ChainError::Timeout(self.timeout)),
        }
    }

    fn retry_policy() -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(250))
            .with_max_times(3)
            .with_jitter()
    }

    async fn fetch_block(&self, number: u64) -> Result<BlockData, ChainError> {
        let block = self
            .with_timeout(self.provider.get_block_by_number(number.into()).full())
            .await?
            .ok_or(ChainError::BlockNotFound(number))?;
        let receipts = self
            .with_timeout(self.provider.get_block_receipts(number.into()))
            .await?
            .ok_or(ChainError::BlockNotFound(number))?;
        into_block_data(number, block, receipts)
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainError> {
        let request =
            TransactionRequest::default().to(to).input(TransactionInput::new(input));
        self.with_timeout(self.provider.call(request)).await
    }
}

#[async_trait::async_trait]
impl crate::ChainClient for RpcChainClient {
    async fn latest_block_number(&self) -> Result<u64, ChainError> {
        self.with_timeout(self.provider.get_block_number()).await
    }

    async fn block_with_receipts(&self, number: u64) -> Result<BlockData, ChainError> {
        (|| self.fetch_block(number))
            .retry(Self::retry_policy())
            .when(ChainError::is_transient)
            .notify(|err, delay| {
                warn!(target: "chain::client", %err, ?delay, number, "retrying block fetch")
            })
            .await
    }

    async fn block_hash(&self, number: u64) -> Result<Option<B256>, ChainError> {
        let block = self
            .with_timeout(self.provider.get_block_by_number(number.into()))
            .await?;
        Ok(block.map(|block| block.header.hash))
    }

    async fn subscribe_heads(&self) -> Result<BoxStream<'static, u64>, ChainError> {
        let subscription = self.provider.subscribe_blocks().await?;
        debug!(target: "chain::client", "subscribed to new heads");
        Ok(subscription.into_stream().map(|header| header.inner.number).boxed())
    }

    async fn validate_ethscriptions(&self, hash_ids: &[B256]) -> Result<Vec<B256>, ChainError> {
        self.validator.validate(hash_ids).await
    }

    async fn points_balance(&self, user: Address) -> Result<U256, ChainError> {
        let data = pointsCall { user }.abi_encode();
        let out = self.call(self.points_address, data.into()).await?;
        Ok(pointsCall::abi_decode_returns(&out)?)
    }

    async fn active_multiplier(&self) -> Result<U256, ChainError> {
        let data = activeMultiplierCall {}.abi_encode();
        let out = self.call(self.points_address, data.into()).await?;
        Ok(activeMultiplierCall::abi_decode_returns(&out)?)
    }
}

fn into_block_data(
    number: u64,
    block: Block,
    receipts: Vec<TransactionReceipt>,
) -> Result<BlockData, ChainError> {
    let got = block.header.inner.number;
    if got != number {
        return Err(ChainError::NumberMismatch { requested: number, got });
    }

    let header = BlockHeader {
        number,
        hash: block.header.hash,
        parent_hash: block.header.inner.parent_hash,
        timestamp: block.header.inner.timestamp,
    };

    let mut by_hash: HashMap<B256, TransactionReceipt> =
        receipts.into_iter().map(|receipt| (receipt.transaction_hash, receipt)).collect();

    let mut transactions = Vec::new();
    for (position, tx) in block.transactions.into_transactions().enumerate() {
        let tx_hash = *tx.inner.tx_hash();
        let receipt = by_hash
            .remove(&tx_hash)
            .ok_or(ChainError::MissingReceipt { number, tx_hash })?;
        let logs = receipt
            .inner
            .logs()
            .iter()
            .enumerate()
            .map(|(i, log)| LogRecord {
                address: log.inner.address,
                log_index: log.log_index.unwrap_or(i as u64),
                data: log.inner.data.clone(),
            })
            .collect();
        transactions.push(TxRecord {
            tx_hash,
            tx_index: tx.transaction_index.unwrap_or(position as u64),
            from: tx.inner.signer(),
            to: tx.to(),
            value: tx.value(),
            input: tx.input().clone(),
            success: receipt.inner.status(),
            logs,
        });
    }
    transactions.sort_by_key(|tx| tx.tx_index);

    Ok(BlockData { header, transactions })
}
