use std::{fs, path::Path};

use ethers::{abi::Abi, contract::abigen, types::Bytes};
use serde::Deserialize;

use crate::error::ScriptError;

abigen!(
    ParrOdessa42,
    r#"[
        function MAX_SUPPLY() external view returns (uint256)
        function mintPrice() external view returns (uint256)
        function mintingEnabled() external view returns (bool)
        function totalSupply() external view returns (uint256)
        function mintNFT(address recipient, string metadataURI) external returns (uint256)
        function ownerOf(uint256 tokenId) external view returns (address)
        function tokenURI(uint256 tokenId) external view returns (string)
        function balanceOf(address owner) external view returns (uint256)
    ]"#
);

/// Compiled contract as written by `hardhat compile` under `artifacts/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl Artifact {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ScriptError::Artifact(format!("cannot read {}: {e}", path.display()))
        })?;
        let artifact: Artifact = serde_json::from_str(&raw).map_err(|e| {
            ScriptError::Artifact(format!("malformed artifact {}: {e}", path.display()))
        })?;
        if artifact.bytecode.is_empty() {
            return Err(ScriptError::Artifact(format!(
                "{} has no creation bytecode (abstract contract or interface?)",
                artifact.contract_name
            )));
        }
        log::debug!(
            "loaded artifact {} ({} bytes of bytecode)",
            artifact.contract_name,
            artifact.bytecode.len()
        );
        Ok(artifact)
    }
}
