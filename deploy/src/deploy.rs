use std::{fs, io::Write, path::Path};

use chrono::{DateTime, Utc};
use ethers::{
    types::Address,
    utils::{hex, to_checksum},
};
use serde::{Deserialize, Serialize};

use crate::{
    collection::{Collection, CollectionFactory, CollectionParams},
    config::Network,
    error::ScriptError,
    utils::format_eth,
};

/// Where a workflow runs and who signs for it.
#[derive(Debug, Clone, Copy)]
pub struct NetworkInfo {
    pub network: Network,
    pub chain_id: u64,
    pub signer: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract_address: String,
    pub deployer: String,
    pub network: String,
    pub chain_id: String,
    pub timestamp: DateTime<Utc>,
    pub transaction_hash: String,
    pub contract_name: String,
    pub contract_symbol: String,
    #[serde(rename = "baseURI")]
    pub base_uri: String,
    pub max_supply: String,
    pub mint_price: String,
}

impl DeploymentRecord {
    pub fn contract_address(&self) -> Result<Address, ScriptError> {
        self.contract_address.parse().map_err(|_| {
            ScriptError::Config(format!(
                "deployment record holds an invalid address {:?}",
                self.contract_address
            ))
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ScriptError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("deployment record written to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

/// Deploys the collection, reads its initial state back and reports the
/// deployment. Nothing is reported if the creation transaction fails.
pub async fn run<F: CollectionFactory>(
    factory: &F,
    params: &CollectionParams,
    info: &NetworkInfo,
    out: &mut impl Write,
) -> Result<DeploymentRecord, ScriptError> {
    writeln!(out, "🚀 Starting {} deployment...", params.name)?;
    writeln!(out, "📋 Deploying contract with parameters:")?;
    writeln!(out, "   Name: {}", params.name)?;
    writeln!(out, "   Symbol: {}", params.symbol)?;
    writeln!(out, "   Base URI: {}", params.base_uri)?;

    writeln!(out, "⏳ Deploying contract...")?;
    let tx_hash = factory.submit(params).await?;
    writeln!(out, "📝 Transaction hash: {:?}", tx_hash)?;

    let deployed = factory.confirm(tx_hash).await?;
    let address = to_checksum(&deployed.collection.address(), None);
    writeln!(
        out,
        "✅ {} deployed to: {} (block {})",
        params.name, address, deployed.block_number
    )?;
    writeln!(out, "👤 Deployed by: {}", to_checksum(&info.signer, None))?;
    writeln!(out, "🌐 Network: {} (Chain ID: {})", info.network, info.chain_id)?;

    let state = deployed.collection.state().await?;
    state.write_to(out)?;

    let record = DeploymentRecord {
        contract_address: address,
        deployer: to_checksum(&info.signer, None),
        network: info.network.to_string(),
        chain_id: info.chain_id.to_string(),
        timestamp: Utc::now(),
        transaction_hash: format!("{:?}", deployed.tx_hash),
        contract_name: params.name.clone(),
        contract_symbol: params.symbol.clone(),
        base_uri: params.base_uri.clone(),
        max_supply: state.max_supply.to_string(),
        mint_price: format_eth(state.mint_price),
    };

    writeln!(out, "\n📄 Deployment Summary:")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;

    write_next_steps(out, &record, params, info.network)?;
    Ok(record)
}

fn write_next_steps(
    out: &mut impl Write,
    record: &DeploymentRecord,
    params: &CollectionParams,
    network: Network,
) -> Result<(), ScriptError> {
    writeln!(out, "\n🎯 Next Steps:")?;
    writeln!(out, "1. Copy the contract address above")?;
    match network.explorer_url() {
        Some(explorer) => {
            writeln!(out, "2. Verify the contract on the block explorer:")?;
            writeln!(
                out,
                "   npx hardhat verify --network {} {} \"{}\" \"{}\" \"{}\"",
                network, record.contract_address, params.name, params.symbol, params.base_uri
            )?;
            writeln!(
                out,
                "   constructor arguments: 0x{}",
                hex::encode(params.constructor_args())
            )?;
            writeln!(
                out,
                "   {}/address/{}",
                explorer, record.contract_address
            )?;
        }
        None => writeln!(out, "2. Local deployments have no block explorer to verify on")?,
    }
    writeln!(
        out,
        "3. Mint your first NFT: parr-odessa42 --network {} mint --contract {} --metadata-uri <CID>",
        network, record.contract_address
    )?;
    writeln!(out, "4. Test ownership verification")?;
    Ok(())
}
