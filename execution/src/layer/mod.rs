use anyhow::{Context as _, Result};
use commonware_cryptography::ed25519::PublicKey;
use pixelspace_types::{
    execution::{Event, Instruction, Key, Output, Transaction, Value},
    ArtworkConfig,
};
use std::collections::BTreeMap;
use tracing::debug;

use crate::reveal::{RevealBinding, TokenOwners};
use crate::state::{load_account, validate_and_increment_nonce, PrepareError, State, Status};

mod handlers;

/// Executes a block of transactions against a read-only view of `state`.
///
/// Writes are buffered until [Layer::commit].
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    config: ArtworkConfig,
    store_owner: PublicKey,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, config: ArtworkConfig, store_owner: PublicKey) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            config,
            store_owner,
        }
    }

    fn binding(&self) -> RevealBinding<TokenOwners> {
        RevealBinding::new(TokenOwners, self.store_owner.clone(), &self.config)
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        if !transaction.verify() {
            return Err(PrepareError::InvalidSignature);
        }
        let mut account = load_account(self, &transaction.public)
            .await
            .map_err(PrepareError::State)?;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.pending.insert(
            Key::Account(transaction.public.clone()),
            Status::Update(Value::Account(account)),
        );

        Ok(())
    }

    async fn apply(&mut self, transaction: &Transaction) -> Result<Vec<Event>> {
        let public = &transaction.public;

        match &transaction.instruction {
            Instruction::MintArtwork {
                name,
                channels,
                transparency_hint,
            } => {
                self.handle_mint_artwork(public, name, channels, transparency_hint)
                    .await
            }
            Instruction::RevealArtwork { token_id, channels } => {
                self.handle_reveal_artwork(public, *token_id, channels)
                    .await
            }
            Instruction::FillArtwork { key, channels } => {
                self.handle_fill_artwork(public, key, channels).await
            }
        }
    }

    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> Result<(Vec<Output>, BTreeMap<PublicKey, u64>)> {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            match self.prepare(&tx).await {
                Ok(()) => {}
                Err(PrepareError::InvalidSignature) => {
                    debug!(public = ?tx.public, "invalid signature; dropping transaction");
                    continue;
                }
                Err(PrepareError::NonceMismatch { expected, got }) => {
                    debug!(
                        public = ?tx.public,
                        expected,
                        got,
                        "nonce mismatch; dropping transaction"
                    );
                    continue;
                }
                Err(PrepareError::State(err)) => {
                    return Err(err).context("state error during prepare");
                }
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));
            outputs.extend(self.apply(&tx).await?.into_iter().map(Output::Event));
            outputs.push(Output::Transaction(tx));
        }

        Ok((outputs, processed_nonces))
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await?,
        })
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.pending.insert(key, Status::Update(value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.pending.insert(key.clone(), Status::Delete);
        Ok(())
    }
}
