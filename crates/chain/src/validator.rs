use crate::ChainError;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};
use tracing::trace;

/// HTTP client for the ethscriptions provider.
///
/// The batch-transfer decoder runs candidate calldata words through this
/// endpoint to reject padding and malformed concatenations before any item
/// is applied.
#[derive(Debug, Clone)]
pub struct EthscriptionsValidator {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct ExistsRequest<'a> {
    hash_ids: &'a [B256],
}

#[derive(Deserialize)]
struct ExistsResponse {
    result: HashMap<B256, bool>,
}

impl EthscriptionsValidator {
    /// Builds a client against the provider's base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url: base_url.into() })
    }

    /// Returns the subset of `hash_ids` that are real, uniquely inscribed
    /// ethscriptions, preserving input order.
    pub async fn validate(&self, hash_ids: &[B256]) -> Result<Vec<B256>, ChainError> {
        if hash_ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/ethscriptions/exists_multi", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .json(&ExistsRequest { hash_ids })
            .send()
            .await?
            .error_for_status()?;
        let body: ExistsResponse = response.json().await?;
        let valid: Vec<B256> = hash_ids
            .iter()
            .copied()
            .filter(|hash| body.result.get(hash).copied().unwrap_or(false))
            .collect();
        trace!(target: "chain::validator", requested = hash_ids.len(), valid = valid.len(), "validated batch");
        Ok(valid)
    }
}
