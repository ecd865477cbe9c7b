use std::{io::Write, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use ethers::{signers::Signer, types::H160, utils::to_checksum};

use crate::{
    collection::{CollectionParams, OnChainCollection, OnChainFactory},
    config::{Network, NetworkConfig},
    contracts::Artifact,
    deploy::{self, DeploymentRecord, NetworkInfo},
    error::ScriptError,
    mint::{self, MintRequest},
    utils,
};

/// Deploys the ParrOdessa42 collection and mints tokens against it.
#[derive(Debug, Parser)]
#[clap(name = "parr-odessa42", version)]
pub struct CommandLine {
    /// Network profile to resolve RPC URL, chain id and gas price for.
    #[clap(short, long, global = true, value_enum, env = "NETWORK", default_value_t = Network::Localhost)]
    network: Network,

    /// Overrides the profile RPC URL.
    #[clap(long, global = true)]
    rpc_url: Option<String>,

    /// Overrides PRIVATE_KEY.
    #[clap(long, global = true)]
    private_key: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Deploy a new collection contract.
    Deploy(DeployArgs),
    /// Mint one token on a deployed collection.
    Mint(MintArgs),
}

#[derive(Debug, Args)]
struct DeployArgs {
    #[clap(long, default_value = "ParrOdessa42")]
    name: String,

    #[clap(long, default_value = "POD42")]
    symbol: String,

    #[clap(long, default_value = "https://ipfs.io/ipfs/")]
    base_uri: String,

    /// Hardhat artifact holding the ABI and creation bytecode.
    #[clap(
        long,
        default_value = "artifacts/contracts/ParrOdessa42.sol/ParrOdessa42.json"
    )]
    artifact: PathBuf,

    /// Also write the deployment record to this file.
    #[clap(long)]
    save: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct MintArgs {
    /// Address of the deployed collection.
    #[clap(short, long, env = "CONTRACT_ADDRESS")]
    contract: Option<H160>,

    /// Deployment record written by `deploy --save`. Takes precedence over `--contract`.
    #[clap(short, long)]
    deployment: Option<PathBuf>,

    /// Token metadata URI, usually an IPFS CID.
    #[clap(short, long, env = "METADATA_URI")]
    metadata_uri: String,

    /// Defaults to the signer address.
    #[clap(short, long)]
    recipient: Option<H160>,
}

/// Where the collection to mint on comes from.
#[derive(Debug, PartialEq, Eq)]
enum MintTarget {
    Address(H160),
    Record(PathBuf),
}

impl MintArgs {
    /// A record path is always explicit, while the address may only come from
    /// `CONTRACT_ADDRESS`, so the record wins.
    fn target(&self) -> Result<MintTarget, ScriptError> {
        match (self.contract, &self.deployment) {
            (_, Some(path)) => Ok(MintTarget::Record(path.clone())),
            (Some(address), None) => Ok(MintTarget::Address(address)),
            (None, None) => Err(ScriptError::Config(
                "either --contract or --deployment is required".to_string(),
            )),
        }
    }
}

impl CommandLine {
    /// Name of the workflow for failure reports.
    pub fn workflow(&self) -> &'static str {
        match self.command {
            Command::Deploy(_) => "Deployment",
            Command::Mint(_) => "Minting",
        }
    }

    pub async fn execute(self) -> Result<(), ScriptError> {
        let config =
            NetworkConfig::from_env(self.network)?.with_overrides(self.rpc_url, self.private_key);
        log::debug!("resolved {:?}", config);

        let client = utils::connect(&config).await?;
        let info = NetworkInfo {
            network: config.network,
            chain_id: client.signer().chain_id(),
            signer: client.address(),
        };
        let mut out = std::io::stdout().lock();

        match self.command {
            Command::Deploy(args) => {
                if config.etherscan_api_key.is_none() && config.network.explorer_url().is_some() {
                    log::warn!("ETHERSCAN_API_KEY is not set, contract verification will need it");
                }
                let factory = OnChainFactory::new(
                    Artifact::load(&args.artifact)?,
                    client.clone(),
                    config.gas_price,
                );
                let params = CollectionParams {
                    name: args.name,
                    symbol: args.symbol,
                    base_uri: args.base_uri,
                };
                let record = deploy::run(&factory, &params, &info, &mut out).await?;
                if let Some(path) = args.save {
                    record.save(&path)?;
                    writeln!(out, "💾 Deployment record saved to {}", path.display())?;
                }
                writeln!(out, "\n🎉 Deployment completed successfully!")?;
                writeln!(out, "Contract Address: {}", record.contract_address)?;
            }
            Command::Mint(args) => {
                let address = match args.target()? {
                    MintTarget::Address(address) => address,
                    MintTarget::Record(path) => DeploymentRecord::load(&path)?.contract_address()?,
                };
                let collection = OnChainCollection::at(address, client.clone(), config.gas_price);
                let request = MintRequest {
                    recipient: args.recipient.unwrap_or(info.signer),
                    metadata_uri: args.metadata_uri,
                };
                let outcome = mint::run(&collection, &request, &mut out).await?;
                log::info!(
                    "token {} ({}) minted to {} by {:?} in block {} (verified: {}, balance: {})",
                    outcome.token_id,
                    outcome.token_uri,
                    to_checksum(&outcome.owner, None),
                    outcome.tx_hash,
                    outcome.block_number,
                    outcome.verified,
                    outcome.balance
                );
                writeln!(out, "\n🎉 Minting process completed!")?;
            }
        }
        Ok(())
    }
}
