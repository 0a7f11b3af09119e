//! HTTPS transport for chain reads and broadcasts, and the [`ChainClient`]
//! that pairs it with an SDK connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chain_btc::esplora;
use chain_eth::rpc as eth_rpc;
use chain_sol::rpc as sol_rpc;
use secrecy::SecretString;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ApiCredential;
use crate::error::ProviderError;
use crate::provider::{ChainClient, ClientFactory, UnsignedTransfer, WalletSdk, WalletSdkFactory};
use crate::registry::{AssetKind, NetworkConfig, TrackedAsset};
use crate::types::{ChainFamily, ChainId};

/// Error texts that mean the sender cannot cover amount plus fees.
const INSUFFICIENT_FUNDS_MARKERS: &[&str] = &[
    "insufficient funds",
    "insufficient lamports",
    "insufficient balance",
    "found no record of a prior credit",
];

/// Map a node's error text onto a provider error, picking out
/// insufficient-funds rejections.
pub fn classify_error_message(message: &str) -> ProviderError {
    let lower = message.to_ascii_lowercase();
    if INSUFFICIENT_FUNDS_MARKERS.iter().any(|m| lower.contains(m)) {
        ProviderError::InsufficientFunds(message.to_string())
    } else {
        ProviderError::Rpc(message.to_string())
    }
}

/// A failed JSON-RPC call.
#[derive(Debug)]
pub enum CallError {
    /// The node answered with a JSON-RPC `error` object.
    Rpc(Value),
    /// Transport failure or an unusable response.
    Failed(ProviderError),
}

impl From<CallError> for ProviderError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Failed(err) => err,
            CallError::Rpc(error) => {
                let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown rpc error");
                match classify_error_message(message) {
                    ProviderError::Rpc(msg) => ProviderError::Rpc(format!("{code}: {msg}")),
                    other => other,
                }
            }
        }
    }
}

fn transport(e: reqwest::Error) -> ProviderError {
    ProviderError::Transport(e.to_string())
}

/// Minimal JSON-RPC 2.0 and REST client shared by every session.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// POST a JSON-RPC request and return its `result`.
    pub async fn call(&self, url: &str, method: &str, params: Value) -> Result<Value, CallError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "json-rpc request");

        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CallError::Failed(transport(e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CallError::Failed(transport(e)))?;

        let reply: Value = match serde_json::from_str(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(CallError::Failed(ProviderError::Transport(format!(
                    "{method}: HTTP {status}"
                ))))
            }
            Err(e) => {
                return Err(CallError::Failed(ProviderError::Rpc(format!(
                    "{method}: invalid JSON reply: {e}"
                ))))
            }
        };

        if let Some(error) = reply.get("error") {
            return Err(CallError::Rpc(error.clone()));
        }
        if !status.is_success() {
            return Err(CallError::Failed(ProviderError::Transport(format!(
                "{method}: HTTP {status}"
            ))));
        }
        reply
            .get("result")
            .cloned()
            .ok_or_else(|| CallError::Failed(ProviderError::Rpc(format!("{method}: reply has no result"))))
    }

    /// GET a JSON document (Esplora).
    pub async fn get_json(&self, url: &str) -> Result<Value, ProviderError> {
        let response = self.http.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Transport(format!("HTTP {status}: {}", text.trim())));
        }
        response.json().await.map_err(transport)
    }

    /// POST a plain-text body and return the plain-text reply (Esplora
    /// broadcast). Rejections carry the node's reason in the body.
    pub async fn post_text(&self, url: &str, body: String) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(classify_error_message(text.trim()))
        }
    }
}

/// A chain session's client: identity and signing from the SDK, balances
/// and broadcast over public endpoints.
pub struct RpcChainClient {
    chain: ChainId,
    sdk: Arc<dyn WalletSdk>,
    rpc: JsonRpcClient,
}

impl RpcChainClient {
    pub fn new(chain: ChainId, sdk: Arc<dyn WalletSdk>, rpc: JsonRpcClient) -> Self {
        Self { chain, sdk, rpc }
    }

    async fn sign(&self, transfer: &UnsignedTransfer) -> Result<Vec<u8>, ProviderError> {
        self.sdk.sign_transfer(transfer).await.map_err(|e| {
            warn!(chain = %self.chain, error = %e, "signing failed");
            e
        })
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn chain(&self) -> ChainId {
        self.chain
    }

    async fn is_authenticated(&self) -> Result<bool, ProviderError> {
        self.sdk.is_logged_in().await
    }

    async fn resolve_address(&self) -> Result<String, ProviderError> {
        let info = self.sdk.user_info().await?;
        let address = info.public_address.trim();
        if address.is_empty() {
            return Err(ProviderError::Rpc(format!("{}: SDK returned no address", self.chain)));
        }
        Ok(address.to_string())
    }

    async fn native_balance(&self, network: &NetworkConfig, address: &str) -> Result<u128, ProviderError> {
        match network.family() {
            ChainFamily::Solana => {
                let result = self
                    .rpc
                    .call(&network.rpc_url, sol_rpc::GET_BALANCE, sol_rpc::balance_params(address))
                    .await?;
                Ok(u128::from(sol_rpc::parse_balance(&result)?))
            }
            ChainFamily::Evm => {
                let result = self
                    .rpc
                    .call(&network.rpc_url, eth_rpc::GET_BALANCE, eth_rpc::balance_params(address))
                    .await?;
                Ok(eth_rpc::parse_quantity(&result)?)
            }
            ChainFamily::Bitcoin => {
                let body = self
                    .rpc
                    .get_json(&esplora::address_path(&network.rpc_url, address))
                    .await?;
                Ok(u128::from(esplora::parse_address_info(&body)?.confirmed_balance()))
            }
        }
    }

    async fn token_balance(
        &self,
        network: &NetworkConfig,
        address: &str,
        asset: &TrackedAsset,
    ) -> Result<u128, ProviderError> {
        let AssetKind::SplToken { mint } = &asset.kind else {
            return Err(ProviderError::Unsupported(format!("{} is a native asset", asset.symbol)));
        };
        if network.family() != ChainFamily::Solana {
            return Err(ProviderError::Unsupported(format!(
                "SPL tokens on {}",
                network.display_name
            )));
        }

        let token_account = chain_sol::associated_token_address_for(address, mint)?;
        let params = sol_rpc::token_account_balance_params(&token_account);
        match self
            .rpc
            .call(&network.rpc_url, sol_rpc::GET_TOKEN_ACCOUNT_BALANCE, params)
            .await
        {
            Ok(result) => Ok(u128::from(sol_rpc::parse_token_account_balance(&result)?)),
            Err(CallError::Rpc(error)) if sol_rpc::is_missing_account_error(&error) => {
                debug!(symbol = %asset.symbol, "no token account, balance is zero");
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn send_native(
        &self,
        network: &NetworkConfig,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<String, ProviderError> {
        let mut transfer = UnsignedTransfer {
            network: network.id,
            evm_chain_id: network.evm_chain_id,
            from: from.to_string(),
            to: to.to_string(),
            amount,
            recent_blockhash: None,
        };

        match network.family() {
            ChainFamily::Solana => {
                let result = self
                    .rpc
                    .call(
                        &network.rpc_url,
                        sol_rpc::GET_LATEST_BLOCKHASH,
                        sol_rpc::latest_blockhash_params(),
                    )
                    .await?;
                transfer.recent_blockhash = Some(sol_rpc::parse_latest_blockhash(&result)?);
                let signed = self.sign(&transfer).await?;
                let result = self
                    .rpc
                    .call(
                        &network.rpc_url,
                        sol_rpc::SEND_TRANSACTION,
                        sol_rpc::send_transaction_params(&signed),
                    )
                    .await?;
                Ok(sol_rpc::parse_signature(&result)?)
            }
            ChainFamily::Evm => {
                let signed = self.sign(&transfer).await?;
                let result = self
                    .rpc
                    .call(
                        &network.rpc_url,
                        eth_rpc::SEND_RAW_TRANSACTION,
                        eth_rpc::send_raw_transaction_params(&signed),
                    )
                    .await?;
                Ok(eth_rpc::parse_transaction_hash(&result)?)
            }
            ChainFamily::Bitcoin => {
                let signed = self.sign(&transfer).await?;
                let reply = self
                    .rpc
                    .post_text(&esplora::broadcast_path(&network.rpc_url), hex::encode(signed))
                    .await?;
                Ok(esplora::parse_txid(&reply)?)
            }
        }
    }

    async fn reveal_private_key(&self) -> Result<SecretString, ProviderError> {
        self.sdk.reveal_private_key().await
    }

    async fn logout(&self) -> Result<(), ProviderError> {
        self.sdk.logout().await
    }
}

/// Builds [`RpcChainClient`]s, opening one SDK connection per chain family
/// and handing each chain its own client around it.
pub struct SdkClientFactory {
    sdk_factory: Arc<dyn WalletSdkFactory>,
    rpc: JsonRpcClient,
    connections: Mutex<HashMap<ChainFamily, Arc<dyn WalletSdk>>>,
}

impl SdkClientFactory {
    pub fn new(sdk_factory: Arc<dyn WalletSdkFactory>, rpc: JsonRpcClient) -> Self {
        Self {
            sdk_factory,
            rpc,
            connections: Mutex::new(HashMap::new()),
        }
    }
}

impl ClientFactory for SdkClientFactory {
    fn create(
        &self,
        chain: ChainId,
        network: &NetworkConfig,
        credential: &ApiCredential,
    ) -> Result<Arc<dyn ChainClient>, ProviderError> {
        let family = chain.family();
        let mut connections = self.connections.lock().unwrap_or_else(PoisonError::into_inner);
        let sdk = match connections.get(&family) {
            Some(sdk) => Arc::clone(sdk),
            None => {
                let sdk = self.sdk_factory.connect(family, network, credential)?;
                debug!(%family, network = %network.id, "opened SDK connection");
                connections.insert(family, Arc::clone(&sdk));
                sdk
            }
        };
        Ok(Arc::new(RpcChainClient::new(chain, sdk, self.rpc.clone())))
    }

    fn reset(&self) {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
