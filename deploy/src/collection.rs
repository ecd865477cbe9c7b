//! Contract-interaction layer for the ParrOdessa42 collection.
//!
//! Workflows only see the [`Collection`] and [`CollectionFactory`] traits, so
//! they run the same against a live node or an in-memory double.

use std::{io::Write, sync::Arc};

use ethers::{
    abi::{encode, Token},
    contract::ContractFactory,
    providers::Middleware,
    types::{Address, Bytes, H256, U256},
};

use crate::{
    contracts::{Artifact, ParrOdessa42},
    error::ScriptError,
    utils::{block_number, format_eth, wait_transaction, Client},
};

/// Constructor arguments of the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionParams {
    pub name: String,
    pub symbol: String,
    pub base_uri: String,
}

impl CollectionParams {
    /// ABI-encoded constructor arguments, as block explorers ask for them.
    pub fn constructor_args(&self) -> Bytes {
        encode(&[
            Token::String(self.name.clone()),
            Token::String(self.symbol.clone()),
            Token::String(self.base_uri.clone()),
        ])
        .into()
    }
}

/// Live view of the collection, read fresh on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractState {
    pub max_supply: U256,
    pub total_supply: U256,
    pub mint_price: U256,
    pub minting_enabled: bool,
}

impl ContractState {
    pub fn is_sold_out(&self) -> bool {
        self.total_supply >= self.max_supply
    }

    pub fn write_to(&self, out: &mut impl Write) -> Result<(), ScriptError> {
        writeln!(out, "\n📊 Contract State:")?;
        writeln!(out, "   Max Supply: {}", self.max_supply)?;
        writeln!(out, "   Total Supply: {}", self.total_supply)?;
        writeln!(out, "   Mint Price: {} ETH", format_eth(self.mint_price))?;
        writeln!(out, "   Minting Enabled: {}", self.minting_enabled)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Deployed<C> {
    pub collection: C,
    pub tx_hash: H256,
    pub block_number: u64,
}

pub trait Collection {
    fn address(&self) -> Address;

    async fn state(&self) -> Result<ContractState, ScriptError>;

    async fn total_supply(&self) -> Result<U256, ScriptError>;

    /// Sends `mintNFT` and returns as soon as the node accepted the transaction.
    async fn submit_mint(&self, recipient: Address, metadata_uri: &str)
        -> Result<H256, ScriptError>;

    /// Waits for `tx_hash` to be mined and returns its block number.
    async fn confirm(&self, tx_hash: H256) -> Result<u64, ScriptError>;

    async fn owner_of(&self, token_id: U256) -> Result<Address, ScriptError>;

    async fn token_uri(&self, token_id: U256) -> Result<String, ScriptError>;

    async fn balance_of(&self, owner: Address) -> Result<U256, ScriptError>;
}

pub trait CollectionFactory {
    type Collection: Collection;

    /// Sends the creation transaction and returns its hash.
    async fn submit(&self, params: &CollectionParams) -> Result<H256, ScriptError>;

    async fn confirm(&self, tx_hash: H256) -> Result<Deployed<Self::Collection>, ScriptError>;
}

pub struct OnChainCollection {
    contract: ParrOdessa42<Client>,
    client: Arc<Client>,
    gas_price: Option<U256>,
}

impl OnChainCollection {
    /// Binds to `address` without checking that code lives there.
    pub fn at(address: Address, client: Arc<Client>, gas_price: Option<U256>) -> Self {
        Self {
            contract: ParrOdessa42::new(address, client.clone()),
            client,
            gas_price,
        }
    }
}

impl Collection for OnChainCollection {
    fn address(&self) -> Address {
        self.contract.address()
    }

    async fn state(&self) -> Result<ContractState, ScriptError> {
        Ok(ContractState {
            max_supply: self.contract.max_supply().call().await?,
            total_supply: self.contract.total_supply().call().await?,
            mint_price: self.contract.mint_price().call().await?,
            minting_enabled: self.contract.minting_enabled().call().await?,
        })
    }

    async fn total_supply(&self) -> Result<U256, ScriptError> {
        Ok(self.contract.total_supply().call().await?)
    }

    async fn submit_mint(
        &self,
        recipient: Address,
        metadata_uri: &str,
    ) -> Result<H256, ScriptError> {
        let mut call = self.contract.mint_nft(recipient, metadata_uri.to_string());
        if let Some(gas_price) = self.gas_price {
            call = call.legacy().gas_price(gas_price);
        }
        let tx_hash = call.send().await?.tx_hash();
        log::info!("mint transaction hash:{:?}", tx_hash);
        Ok(tx_hash)
    }

    async fn confirm(&self, tx_hash: H256) -> Result<u64, ScriptError> {
        let receipt = wait_transaction(self.client.as_ref(), tx_hash).await?;
        block_number(&receipt)
    }

    async fn owner_of(&self, token_id: U256) -> Result<Address, ScriptError> {
        Ok(self.contract.owner_of(token_id).call().await?)
    }

    async fn token_uri(&self, token_id: U256) -> Result<String, ScriptError> {
        Ok(self.contract.token_uri(token_id).call().await?)
    }

    async fn balance_of(&self, owner: Address) -> Result<U256, ScriptError> {
        Ok(self.contract.balance_of(owner).call().await?)
    }
}

/// Deploys the collection from a compiled Hardhat artifact.
pub struct OnChainFactory {
    artifact: Artifact,
    client: Arc<Client>,
    gas_price: Option<U256>,
}

impl OnChainFactory {
    pub fn new(artifact: Artifact, client: Arc<Client>, gas_price: Option<U256>) -> Self {
        Self {
            artifact,
            client,
            gas_price,
        }
    }
}

impl CollectionFactory for OnChainFactory {
    type Collection = OnChainCollection;

    async fn submit(&self, params: &CollectionParams) -> Result<H256, ScriptError> {
        let factory = ContractFactory::new(
            self.artifact.abi.clone(),
            self.artifact.bytecode.clone(),
            self.client.clone(),
        );
        let mut deployer = factory.deploy((
            params.name.clone(),
            params.symbol.clone(),
            params.base_uri.clone(),
        ))?;
        if let Some(gas_price) = self.gas_price {
            deployer = deployer.legacy();
            deployer.tx.set_gas_price(gas_price);
        }

        let tx_hash = self
            .client
            .send_transaction(deployer.tx, None)
            .await
            .map_err(ScriptError::from_middleware_error)?
            .tx_hash();
        log::info!("deployment transaction hash:{:?}", tx_hash);
        Ok(tx_hash)
    }

    async fn confirm(&self, tx_hash: H256) -> Result<Deployed<OnChainCollection>, ScriptError> {
        let receipt = wait_transaction(self.client.as_ref(), tx_hash).await?;
        let address = receipt.contract_address.ok_or_else(|| {
            ScriptError::Reverted(format!("transaction {tx_hash:?} created no contract"))
        })?;
        Ok(Deployed {
            collection: OnChainCollection::at(address, self.client.clone(), self.gas_price),
            tx_hash,
            block_number: block_number(&receipt)?,
        })
    }
}
