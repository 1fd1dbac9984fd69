//! HTTP client for a ledger node.
//!
//! Submission follows the node's standard command sequence: ask for two
//! tip transactions to approve, attach the trytes to them (node-side
//! proof-of-work), then broadcast and store the attached result. Every
//! command is a POST of `{"command": ...}` to the node root with the
//! `X-IOTA-API-Version` header.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::trytes::TryteString;

/// Connection and attachment parameters for one node.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Node URL, e.g. `http://localhost:14265/`.
    pub node: String,
    /// Depth at which to start the tip selection walk.
    pub depth: u32,
    /// Minimum proof-of-work weight the node calibrates against.
    pub min_weight_magnitude: u32,
}

#[derive(Debug, Deserialize)]
struct TransactionsToApprove {
    #[serde(rename = "trunkTransaction")]
    trunk_transaction: String,
    #[serde(rename = "branchTransaction")]
    branch_transaction: String,
}

#[derive(Debug, Deserialize)]
struct AttachedTrytes {
    trytes: Vec<TryteString>,
}

/// Client for submitting encoded transaction units to one ledger node.
#[derive(Debug)]
pub struct LedgerClient {
    config: LedgerConfig,
    client: Client,
}

impl LedgerClient {
    /// Creates a client for the configured node.
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        if config.node.is_empty() {
            return Err(LedgerError::Config("node URL must not be empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { config, client })
    }

    /// The node this client submits to.
    pub fn node(&self) -> &str {
        &self.config.node
    }

    /// Attaches, broadcasts and stores the given trytes.
    ///
    /// Returns the attached (proof-of-work carrying) trytes on success.
    /// Any non-success reply from the node propagates as
    /// [`LedgerError::Api`] carrying the node's own error text.
    pub async fn send_trytes(&self, trytes: &[TryteString]) -> LedgerResult<Vec<TryteString>> {
        if trytes.is_empty() {
            return Err(LedgerError::Api {
                command: "attachToTangle".into(),
                detail: "nothing to attach".into(),
            });
        }

        debug!(count = trytes.len(), node = %self.config.node, "selecting tips");
        let tips: TransactionsToApprove = self
            .command(json!({
                "command": "getTransactionsToApprove",
                "depth": self.config.depth,
            }))
            .await?;

        debug!(
            trunk = %tips.trunk_transaction,
            branch = %tips.branch_transaction,
            "attaching trytes"
        );
        let attached: AttachedTrytes = self
            .command(json!({
                "command": "attachToTangle",
                "trunkTransaction": tips.trunk_transaction,
                "branchTransaction": tips.branch_transaction,
                "minWeightMagnitude": self.config.min_weight_magnitude,
                "trytes": trytes,
            }))
            .await?;

        let _: serde_json::Value = self
            .command(json!({
                "command": "broadcastTransactions",
                "trytes": attached.trytes,
            }))
            .await?;
        let _: serde_json::Value = self
            .command(json!({
                "command": "storeTransactions",
                "trytes": attached.trytes,
            }))
            .await?;

        info!(
            count = attached.trytes.len(),
            node = %self.config.node,
            "transactions attached to the ledger"
        );
        Ok(attached.trytes)
    }

    /// Runs one node command and decodes its reply.
    async fn command<T: DeserializeOwned>(&self, body: serde_json::Value) -> LedgerResult<T> {
        let command = body
            .get("command")
            .and_then(|c| c.as_str())
            .unwrap_or("unknown")
            .to_string();

        let response = self
            .client
            .post(&self.config.node)
            .header("X-IOTA-API-Version", "1")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let reply: serde_json::Value = response.json().await.map_err(|e| LedgerError::Api {
            command: command.clone(),
            detail: format!("unparseable node reply: {e}"),
        })?;

        // Nodes report failures both via HTTP status and via an
        // `error`/`exception` field in an otherwise-200 body.
        let node_error = reply
            .get("error")
            .or_else(|| reply.get("exception"))
            .and_then(|e| e.as_str());
        if !status.is_success() || node_error.is_some() {
            return Err(LedgerError::Api {
                command,
                detail: node_error
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP {status}: {reply}")),
            });
        }

        serde_json::from_value(reply).map_err(Into::into)
    }
}
