use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, JsonRpcClient, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{TransactionReceipt, H256, U256, U64},
    utils::{format_ether, hex},
};
use tokio::time::sleep;
use url::Url;

use crate::{config::NetworkConfig, error::ScriptError};

pub type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Consecutive polls the node may not know the transaction before it counts as dropped.
const DROPPED_AFTER_MISSES: u32 = 30;

/// Connects a signing client for `config`, signing with the chain id the node reports.
pub async fn connect(config: &NetworkConfig) -> Result<Arc<Client>, ScriptError> {
    let sk = config.private_key.as_deref().ok_or_else(|| {
        ScriptError::Config(format!(
            "no signing key configured for network {}, set PRIVATE_KEY",
            config.network
        ))
    })?;
    let wallet = LocalWallet::from_bytes(
        &hex::decode(sk.strip_prefix("0x").unwrap_or(sk)).context("private key is not hex")?,
    )
    .context("invalid private key")?;

    let url = Url::parse(&config.rpc_url)
        .with_context(|| format!("invalid RPC URL {}", config.rpc_url))?;
    let provider = match config.timeout {
        Some(timeout) => {
            let http = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .context("failed to build HTTP client")?;
            Provider::new(Http::new_with_client(url, http))
        }
        None => Provider::new(Http::new(url)),
    };

    Ok(Arc::new(attach_signer(provider, wallet, config).await?))
}

/// Wraps `provider` in a signer for the chain the node is actually on.
pub async fn attach_signer<P: JsonRpcClient>(
    provider: Provider<P>,
    wallet: LocalWallet,
    config: &NetworkConfig,
) -> Result<SignerMiddleware<Provider<P>, LocalWallet>, ScriptError> {
    let chain_id = provider.get_chainid().await?.as_u64();
    if chain_id != config.chain_id {
        log::warn!(
            "network {} expects chain id {} but {} reports {}",
            config.network,
            config.chain_id,
            config.rpc_url,
            chain_id
        );
    }
    log::info!("connected to {} (chain id {})", config.rpc_url, chain_id);

    Ok(SignerMiddleware::new(provider, wallet.with_chain_id(chain_id)))
}

/// Polls until the receipt of `transaction_hash` is available.
pub async fn wait_transaction<M: Middleware>(
    client: &M,
    transaction_hash: H256,
) -> Result<TransactionReceipt, ScriptError> {
    poll_receipt(client, transaction_hash, RECEIPT_POLL_INTERVAL).await
}

async fn poll_receipt<M: Middleware>(
    client: &M,
    transaction_hash: H256,
    interval: Duration,
) -> Result<TransactionReceipt, ScriptError> {
    let mut misses = 0;
    loop {
        if let Some(receipt) = client
            .get_transaction_receipt(transaction_hash)
            .await
            .map_err(ScriptError::from_middleware_error)?
        {
            return check_receipt(receipt);
        }
        let known = client
            .get_transaction(transaction_hash)
            .await
            .map_err(ScriptError::from_middleware_error)?
            .is_some();
        if known {
            misses = 0;
        } else {
            misses += 1;
            if misses >= DROPPED_AFTER_MISSES {
                return Err(ScriptError::Dropped(transaction_hash));
            }
        }
        log::debug!("waiting for receipt of {:?}", transaction_hash);
        sleep(interval).await;
    }
}

/// Rejects receipts of transactions that reverted on chain.
pub fn check_receipt(receipt: TransactionReceipt) -> Result<TransactionReceipt, ScriptError> {
    if receipt.status == Some(U64::zero()) {
        return Err(ScriptError::Reverted(format!(
            "transaction {:?} failed in block {}",
            receipt.transaction_hash,
            receipt
                .block_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string())
        )));
    }
    Ok(receipt)
}

pub fn block_number(receipt: &TransactionReceipt) -> Result<u64, ScriptError> {
    receipt
        .block_number
        .map(|n| n.as_u64())
        .ok_or_else(|| anyhow!("receipt {:?} has no block number", receipt.transaction_hash).into())
}

/// Ether amount without the trailing zeros `format_ether` pads to 18 decimals.
pub fn format_eth(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use ethers::{providers::MockProvider, types::Transaction};
    use serde_json::Value;

    use super::*;
    use crate::config::Network;

    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    enum Poll {
        Unknown,
        Pending,
        Mined(TransactionReceipt),
    }

    /// Queues node answers in the order the poller asks for them.
    fn node(polls: Vec<Poll>) -> Provider<MockProvider> {
        let (provider, mock) = Provider::mocked();
        let mut answers = Vec::new();
        for poll in polls {
            match poll {
                Poll::Unknown => answers.extend([Value::Null, Value::Null]),
                Poll::Pending => answers.extend([
                    Value::Null,
                    serde_json::to_value(Transaction::default()).unwrap(),
                ]),
                Poll::Mined(receipt) => answers.push(serde_json::to_value(receipt).unwrap()),
            }
        }
        // the mock answers last-in first-out
        for answer in answers.into_iter().rev() {
            mock.push::<Value, _>(answer).unwrap();
        }
        provider
    }

    fn mined(status: u64) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: H256::repeat_byte(0xab),
            status: Some(U64::from(status)),
            block_number: Some(U64::from(12)),
            ..Default::default()
        }
    }

    fn localhost() -> NetworkConfig {
        NetworkConfig::resolve(Network::Localhost, |_| None).unwrap()
    }

    fn wallet() -> LocalWallet {
        LocalWallet::from_bytes(&hex::decode(DEV_KEY).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn receipt_is_returned_once_mined() {
        let provider = node(vec![Poll::Pending, Poll::Unknown, Poll::Mined(mined(1))]);

        let receipt = poll_receipt(&provider, H256::repeat_byte(0xab), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(block_number(&receipt).unwrap(), 12);
    }

    #[tokio::test]
    async fn mined_failure_is_reverted() {
        let provider = node(vec![Poll::Mined(mined(0))]);

        let err = poll_receipt(&provider, H256::repeat_byte(0xab), Duration::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::Reverted(_)));
    }

    #[tokio::test]
    async fn unknown_transaction_is_dropped() {
        let polls = (0..DROPPED_AFTER_MISSES).map(|_| Poll::Unknown).collect();
        let provider = node(polls);

        let err = poll_receipt(&provider, H256::repeat_byte(0xab), Duration::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::Dropped(hash) if hash == H256::repeat_byte(0xab)));
    }

    #[tokio::test]
    async fn pending_transaction_resets_the_miss_count() {
        let mut polls: Vec<Poll> = (1..DROPPED_AFTER_MISSES).map(|_| Poll::Unknown).collect();
        polls.push(Poll::Pending);
        polls.extend((1..DROPPED_AFTER_MISSES).map(|_| Poll::Unknown));
        polls.push(Poll::Mined(mined(1)));
        let provider = node(polls);

        let receipt = poll_receipt(&provider, H256::repeat_byte(0xab), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(receipt.transaction_hash, H256::repeat_byte(0xab));
    }

    #[tokio::test]
    async fn signer_uses_the_chain_id_of_the_node() {
        let (provider, mock) = Provider::mocked();
        mock.push::<U256, _>(U256::from(31337)).unwrap();
        let config = localhost();
        assert_eq!(config.chain_id, 1337);

        let client = attach_signer(provider, wallet(), &config).await.unwrap();

        assert_eq!(client.signer().chain_id(), 31337);
        assert_eq!(client.address(), wallet().address());
    }

    #[tokio::test]
    async fn matching_chain_id_is_kept() {
        let (provider, mock) = Provider::mocked();
        mock.push::<U256, _>(U256::from(1337)).unwrap();

        let client = attach_signer(provider, wallet(), &localhost()).await.unwrap();

        assert_eq!(client.signer().chain_id(), 1337);
    }

    #[tokio::test]
    async fn unreachable_node_fails_to_connect() {
        let (provider, _mock) = Provider::<MockProvider>::mocked();

        let err = attach_signer(provider, wallet(), &localhost()).await.unwrap_err();

        assert!(matches!(err, ScriptError::Network(_)));
    }

    #[test]
    fn formats_ether_amounts() {
        assert_eq!(format_eth(U256::exp10(16)), "0.01");
        assert_eq!(format_eth(U256::exp10(18)), "1");
        assert_eq!(format_eth(U256::from(15) * U256::exp10(17)), "1.5");
        assert_eq!(format_eth(U256::zero()), "0");
        assert_eq!(format_eth(U256::one()), "0.000000000000000001");
    }

    #[test]
    fn failed_receipt_is_reverted() {
        let receipt = TransactionReceipt {
            status: Some(U64::zero()),
            block_number: Some(U64::from(7)),
            ..Default::default()
        };
        assert!(matches!(check_receipt(receipt), Err(ScriptError::Reverted(msg)) if msg.contains("block 7")));

        let receipt = TransactionReceipt {
            status: Some(U64::one()),
            block_number: Some(U64::from(8)),
            ..Default::default()
        };
        assert_eq!(block_number(&check_receipt(receipt).unwrap()).unwrap(), 8);
    }
}
