//! In-memory stand-in for the collection contract.

use std::cell::RefCell;

use ethers::types::{Address, H256, U256};

use crate::{
    collection::{Collection, CollectionFactory, CollectionParams, ContractState, Deployed},
    error::ScriptError,
};

#[derive(Debug, Clone)]
struct Token {
    owner: Address,
    uri: String,
}

#[derive(Debug)]
struct Inner {
    max_supply: U256,
    mint_price: U256,
    minting_enabled: bool,
    tokens: Vec<Token>,
    pending: Vec<(H256, Token)>,
    submitted: usize,
    next_tx: u64,
    fail_submit: Option<fn() -> ScriptError>,
    mint_to: Option<Address>,
}

#[derive(Debug)]
pub struct MockCollection {
    address: Address,
    inner: RefCell<Inner>,
}

impl MockCollection {
    pub fn new(max_supply: u64) -> Self {
        Self {
            address: Address::repeat_byte(0x42),
            inner: RefCell::new(Inner {
                max_supply: U256::from(max_supply),
                mint_price: U256::exp10(16),
                minting_enabled: true,
                tokens: Vec::new(),
                pending: Vec::new(),
                submitted: 0,
                next_tx: 1,
                fail_submit: None,
                mint_to: None,
            }),
        }
    }

    /// Pre-mints `count` tokens to `owner`.
    pub fn with_minted(self, count: u64, owner: Address) -> Self {
        self.inner.borrow_mut().tokens.extend((0..count).map(|id| Token {
            owner,
            uri: format!("premint-{id}"),
        }));
        self
    }

    pub fn with_minting_enabled(self, enabled: bool) -> Self {
        self.inner.borrow_mut().minting_enabled = enabled;
        self
    }

    pub fn failing_submit(self, err: fn() -> ScriptError) -> Self {
        self.inner.borrow_mut().fail_submit = Some(err);
        self
    }

    /// Confirmed mints land on `owner` instead of the requested recipient.
    pub fn minting_to(self, owner: Address) -> Self {
        self.inner.borrow_mut().mint_to = Some(owner);
        self
    }

    pub fn submitted(&self) -> usize {
        self.inner.borrow().submitted
    }

    fn next_hash(inner: &mut Inner) -> H256 {
        let hash = H256::from_low_u64_be(inner.next_tx);
        inner.next_tx += 1;
        hash
    }
}

impl Collection for MockCollection {
    fn address(&self) -> Address {
        self.address
    }

    async fn state(&self) -> Result<ContractState, ScriptError> {
        let inner = self.inner.borrow();
        Ok(ContractState {
            max_supply: inner.max_supply,
            total_supply: U256::from(inner.tokens.len()),
            mint_price: inner.mint_price,
            minting_enabled: inner.minting_enabled,
        })
    }

    async fn total_supply(&self) -> Result<U256, ScriptError> {
        Ok(U256::from(self.inner.borrow().tokens.len()))
    }

    async fn submit_mint(
        &self,
        recipient: Address,
        metadata_uri: &str,
    ) -> Result<H256, ScriptError> {
        let mut inner = self.inner.borrow_mut();
        inner.submitted += 1;
        if let Some(err) = inner.fail_submit {
            return Err(err());
        }
        let owner = inner.mint_to.unwrap_or(recipient);
        let hash = Self::next_hash(&mut inner);
        inner.pending.push((
            hash,
            Token {
                owner,
                uri: metadata_uri.to_string(),
            },
        ));
        Ok(hash)
    }

    async fn confirm(&self, tx_hash: H256) -> Result<u64, ScriptError> {
        let mut inner = self.inner.borrow_mut();
        let index = inner
            .pending
            .iter()
            .position(|(hash, _)| *hash == tx_hash)
            .ok_or(ScriptError::Dropped(tx_hash))?;
        let (_, token) = inner.pending.remove(index);
        inner.tokens.push(token);
        Ok(100 + inner.tokens.len() as u64)
    }

    async fn owner_of(&self, token_id: U256) -> Result<Address, ScriptError> {
        self.token(token_id).map(|token| token.owner)
    }

    async fn token_uri(&self, token_id: U256) -> Result<String, ScriptError> {
        self.token(token_id).map(|token| token.uri)
    }

    async fn balance_of(&self, owner: Address) -> Result<U256, ScriptError> {
        let inner = self.inner.borrow();
        Ok(U256::from(
            inner.tokens.iter().filter(|token| token.owner == owner).count(),
        ))
    }
}

impl MockCollection {
    fn token(&self, token_id: U256) -> Result<Token, ScriptError> {
        let inner = self.inner.borrow();
        usize::try_from(token_id)
            .ok()
            .and_then(|id| inner.tokens.get(id).cloned())
            .ok_or_else(|| ScriptError::Reverted("ERC721: invalid token ID".to_string()))
    }
}

/// Deploys [`MockCollection`]s, recording the constructor arguments it saw.
#[derive(Debug, Default)]
pub struct MockFactory {
    pub max_supply: u64,
    pub fail_submit: Option<fn() -> ScriptError>,
    pub submitted: RefCell<Vec<CollectionParams>>,
}

impl MockFactory {
    pub fn new(max_supply: u64) -> Self {
        Self {
            max_supply,
            ..Default::default()
        }
    }
}

impl CollectionFactory for MockFactory {
    type Collection = MockCollection;

    async fn submit(&self, params: &CollectionParams) -> Result<H256, ScriptError> {
        self.submitted.borrow_mut().push(params.clone());
        match self.fail_submit {
            Some(err) => Err(err()),
            None => Ok(H256::repeat_byte(0xde)),
        }
    }

    async fn confirm(&self, tx_hash: H256) -> Result<Deployed<MockCollection>, ScriptError> {
        Ok(Deployed {
            collection: MockCollection::new(self.max_supply),
            tx_hash,
            block_number: 1,
        })
    }
}
