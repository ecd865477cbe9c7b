use std::io::Write;

use anyhow::anyhow;
use ethers::{
    types::{Address, H256, U256},
    utils::to_checksum,
};

use crate::{collection::Collection, error::ScriptError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub recipient: Address,
    pub metadata_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOutcome {
    pub tx_hash: H256,
    pub block_number: u64,
    pub token_id: U256,
    pub owner: Address,
    pub token_uri: String,
    pub balance: U256,
    pub verified: bool,
}

/// Mints one token after checking the collection can accept it, then reads
/// the token back to confirm where it landed.
///
/// The minted id is taken as `totalSupply() - 1`, which only holds while the
/// collection hands out ids sequentially and nobody else mints in between.
pub async fn run<C: Collection>(
    collection: &C,
    request: &MintRequest,
    out: &mut impl Write,
) -> Result<MintOutcome, ScriptError> {
    writeln!(out, "🎨 Starting NFT minting process...")?;
    writeln!(out, "📋 Minting parameters:")?;
    writeln!(out, "   Contract: {}", to_checksum(&collection.address(), None))?;
    writeln!(out, "   Metadata URI: {}", request.metadata_uri)?;
    writeln!(out, "👤 Minting to: {}", to_checksum(&request.recipient, None))?;

    let state = collection.state().await?;
    state.write_to(out)?;

    if state.is_sold_out() {
        log::warn!(
            "supply {} of {} already minted",
            state.total_supply,
            state.max_supply
        );
        return Err(ScriptError::SupplyCapReached);
    }
    if !state.minting_enabled {
        return Err(ScriptError::MintingDisabled);
    }

    writeln!(out, "\n⏳ Minting NFT...")?;
    let tx_hash = collection
        .submit_mint(request.recipient, &request.metadata_uri)
        .await?;
    writeln!(out, "📝 Transaction hash: {:?}", tx_hash)?;

    writeln!(out, "⏳ Waiting for confirmation...")?;
    let block_number = collection.confirm(tx_hash).await?;
    writeln!(out, "✅ Transaction confirmed in block: {}", block_number)?;

    let token_id = collection
        .total_supply()
        .await?
        .checked_sub(U256::one())
        .ok_or_else(|| anyhow!("total supply is still zero after mint {:?}", tx_hash))?;
    writeln!(out, "🎉 NFT minted successfully!")?;
    writeln!(out, "   Token ID: {}", token_id)?;
    writeln!(out, "   Metadata URI: {}", request.metadata_uri)?;

    let owner = collection.owner_of(token_id).await?;
    let verified = owner == request.recipient;
    if !verified {
        log::warn!(
            "token {} is owned by {:?}, expected {:?}",
            token_id,
            owner,
            request.recipient
        );
    }
    writeln!(
        out,
        "🔍 Ownership verification: {}",
        if verified { "✅ Verified" } else { "❌ Failed" }
    )?;
    writeln!(out, "   Owner: {}", to_checksum(&owner, None))?;

    let token_uri = collection.token_uri(token_id).await?;
    writeln!(out, "📄 Token URI: {}", token_uri)?;

    let balance = collection.balance_of(request.recipient).await?;
    writeln!(out, "💰 Balance: {} NFT(s)", balance)?;

    writeln!(out, "\n🎯 Next Steps:")?;
    writeln!(out, "1. View your NFT on the block explorer")?;
    writeln!(out, "2. Test the ownerOf function")?;
    writeln!(out, "3. Transfer NFT to another address (optional)")?;

    Ok(MintOutcome {
        tx_hash,
        block_number,
        token_id,
        owner,
        token_uri,
        balance,
        verified,
    })
}
