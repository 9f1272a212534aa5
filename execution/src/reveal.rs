//! Binding between minted artwork tokens and the data store.
//!
//! Minting commits to the identity hash of an artwork without storing its pixels. The
//! current holder may later reveal the pixels; they are only forwarded to the store when
//! they hash back to the committed identity.

use crate::{
    error::Result,
    state::{load_binding, load_fill, load_supply, load_token, State},
    store::{ArtworkStore, FillReceipt},
    validator::count_opaque_pixels,
};
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::hex;
use pixelspace_types::{
    artwork::ARTWORK_MAX_NAME_LENGTH,
    execution::{Key, Value},
    identity_hash, ArtworkChannels, ArtworkConfig, ArtworkError, ArtworkToken, PixelLayout,
    RevealState,
};
use std::future::Future;
use tracing::{debug, warn};

/// Source of truth for who currently holds a token.
pub trait HolderRegistry {
    fn current_holder<S: State>(
        &self,
        state: &S,
        token_id: u64,
    ) -> impl Future<Output = anyhow::Result<Option<PublicKey>>>;
}

/// Holder lookup backed by the owner recorded on the ledger token.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenOwners;

impl HolderRegistry for TokenOwners {
    async fn current_holder<S: State>(
        &self,
        state: &S,
        token_id: u64,
    ) -> anyhow::Result<Option<PublicKey>> {
        Ok(load_token(state, token_id).await?.map(|token| token.owner))
    }
}

pub struct RevealBinding<R: HolderRegistry> {
    registry: R,
    store: ArtworkStore,
    layout: PixelLayout,
    alpha_enabled: bool,
}

impl<R: HolderRegistry> RevealBinding<R> {
    pub fn new(registry: R, store_owner: PublicKey, config: &ArtworkConfig) -> Self {
        Self {
            registry,
            store: ArtworkStore::new(store_owner, config.store.clone()),
            layout: config.layout,
            alpha_enabled: config.alpha_enabled,
        }
    }

    pub fn store(&self) -> &ArtworkStore {
        &self.store
    }

    /// Mint a token committing to the identity hash of `channels`.
    ///
    /// The pixels themselves are not stored, but they must fit in a single store write so the
    /// holder can later reveal them. Token ids (and mint numbers) start at 1.
    pub async fn commit<S: State>(
        &self,
        state: &mut S,
        owner: &PublicKey,
        name: &str,
        channels: &ArtworkChannels,
        hint: &[u32],
    ) -> Result<ArtworkToken> {
        if name.is_empty() || name.len() > ARTWORK_MAX_NAME_LENGTH {
            return Err(ArtworkError::malformed(format!(
                "name must be 1..={ARTWORK_MAX_NAME_LENGTH} bytes (got {})",
                name.len()
            ))
            .into());
        }
        if channels.is_empty() {
            return Err(ArtworkError::malformed("artwork carries no pixel data").into());
        }
        let words = channels.total_words();
        if words > self.store.max_batch_words() {
            return Err(ArtworkError::malformed(format!(
                "artwork of {words} words exceeds reveal limit of {}",
                self.store.max_batch_words()
            ))
            .into());
        }
        let opaque_pixels = count_opaque_pixels(&self.layout, channels, self.alpha_enabled, hint)?;
        let identity = identity_hash(channels);

        let id = load_supply(&*state).await? + 1;
        let token = ArtworkToken {
            id,
            owner: owner.clone(),
            identity,
            name: name.to_string(),
            number: id,
            opaque_pixels,
        };
        state
            .insert(Key::Artwork(id), Value::Artwork(token.clone()))
            .await?;
        state
            .insert(Key::ArtworkSupply, Value::ArtworkSupply(id))
            .await?;
        if load_binding(&*state, &identity).await?.is_none() {
            state
                .insert(Key::ArtworkIdentity(identity), Value::ArtworkIdentity(id))
                .await?;
        }

        debug!(
            token_id = id,
            identity = %hex(identity.as_ref()),
            opaque_pixels,
            "artwork committed"
        );
        Ok(token)
    }

    /// Reveal the pixels of `token_id` on behalf of its holder.
    ///
    /// The submitted channels, appended to whatever the store already holds for the bound
    /// identity, must hash to that identity. Once revealed, only a resubmission of the exact
    /// artwork is accepted (as a no-op). Nothing is written unless every check passes.
    pub async fn reveal<S: State>(
        &self,
        state: &mut S,
        caller: &PublicKey,
        token_id: u64,
        channels: &ArtworkChannels,
    ) -> Result<FillReceipt> {
        let token = load_token(&*state, token_id)
            .await?
            .ok_or(ArtworkError::UnknownToken { token_id })?;

        let holder = self.registry.current_holder(&*state, token_id).await?;
        if holder.as_ref() != Some(caller) {
            warn!(token_id, caller = ?caller, "reveal by non-holder rejected");
            return Err(ArtworkError::NotAuthorized {
                caller: caller.clone(),
            }
            .into());
        }

        let record = load_fill(&*state, &token.identity).await?;
        let computed = match &record {
            Some(record) if !record.finished => identity_hash(&record.channels.merged(channels)),
            _ => identity_hash(channels),
        };
        if computed != token.identity {
            warn!(
                token_id,
                expected = %hex(token.identity.as_ref()),
                computed = %hex(computed.as_ref()),
                "reveal data does not match identity"
            );
            return Err(ArtworkError::IncorrectData {
                expected: token.identity,
                computed,
            }
            .into());
        }

        let owner = self.store.owner().clone();
        self.store
            .fill(state, &owner, token.identity, channels)
            .await
    }

    /// Reveal progress of `token_id`.
    pub async fn state<S: State>(&self, state: &S, token_id: u64) -> Result<RevealState> {
        let token = load_token(state, token_id)
            .await?
            .ok_or(ArtworkError::UnknownToken { token_id })?;
        let record = load_fill(state, &token.identity).await?;
        Ok(RevealState::of(record.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        mocks::{create_account_keypair, create_store_owner_keypair, sample_artwork},
        store::{artwork_for_hash, fill_completion_status},
        Memory,
    };
    use commonware_runtime::deterministic::Runner;
    use commonware_runtime::Runner as _;
    use pixelspace_types::{execution::Event, StoreConfig, Word};
    use std::collections::BTreeMap;

    /// Registry that ignores the ledger, standing in for an external ownership contract.
    #[derive(Default)]
    struct FixedHolders(BTreeMap<u64, PublicKey>);

    impl HolderRegistry for FixedHolders {
        async fn current_holder<S: State>(
            &self,
            _state: &S,
            token_id: u64,
        ) -> anyhow::Result<Option<PublicKey>> {
            Ok(self.0.get(&token_id).cloned())
        }
    }

    fn binding() -> RevealBinding<TokenOwners> {
        let (_, store_owner) = create_store_owner_keypair();
        RevealBinding::new(TokenOwners, store_owner, &ArtworkConfig::default())
    }

    #[test]
    fn commit_binds_identity_and_counts_pixels() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let binding = binding();
            let (_, holder) = create_account_keypair(1);
            let (channels, hint) = sample_artwork(&PixelLayout::default());

            let token = binding
                .commit(&mut state, &holder, "Tide", &channels, &hint)
                .await
                .unwrap();
            assert_eq!(token.id, 1);
            assert_eq!(token.number, 1);
            assert_eq!(token.identity, identity_hash(&channels));
            assert_eq!(token.opaque_pixels, 55);
            assert_eq!(
                binding.state(&state, 1).await.unwrap(),
                RevealState::Committed
            );

            let second = binding
                .commit(&mut state, &holder, "Tide II", &channels, &hint)
                .await
                .unwrap();
            assert_eq!(second.id, 2);
        });
    }

    #[test]
    fn commit_rejects_malformed_artwork_without_writing() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let binding = binding();
            let (_, holder) = create_account_keypair(1);
            let (channels, _) = sample_artwork(&PixelLayout::default());

            assert!(matches!(
                binding.commit(&mut state, &holder, "Tide", &channels, &[7]).await,
                Err(Error::Artwork(ArtworkError::MalformedInput { .. }))
            ));
            assert!(matches!(
                binding.commit(&mut state, &holder, "", &channels, &[]).await,
                Err(Error::Artwork(ArtworkError::MalformedInput { .. }))
            ));
            assert!(matches!(
                binding
                    .commit(&mut state, &holder, "Void", &ArtworkChannels::default(), &[])
                    .await,
                Err(Error::Artwork(ArtworkError::MalformedInput { .. }))
            ));
            assert!(state.is_empty());
        });
    }

    #[test]
    fn holder_reveal_fills_store() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let binding = binding();
            let (_, holder) = create_account_keypair(1);
            let (channels, hint) = sample_artwork(&PixelLayout::default());
            let token = binding
                .commit(&mut state, &holder, "Tide", &channels, &hint)
                .await
                .unwrap();

            let receipt = binding
                .reveal(&mut state, &holder, token.id, &channels)
                .await
                .unwrap();
            assert!(receipt.finished);
            assert!(matches!(
                receipt.event(),
                Some(Event::ArtworkRevealed { identity, .. }) if identity == token.identity
            ));
            assert_eq!(
                binding.state(&state, token.id).await.unwrap(),
                RevealState::Revealed
            );
            assert_eq!(
                artwork_for_hash(&state, &token.identity).await.unwrap(),
                channels
            );

            // A second reveal is a no-op.
            let receipt = binding
                .reveal(&mut state, &holder, token.id, &channels)
                .await
                .unwrap();
            assert!(receipt.ignored);
        });
    }

    #[test]
    fn only_touched_channels_are_counted() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let binding = binding();
            let (_, holder) = create_account_keypair(1);
            let layout = PixelLayout::default();
            let (sample, _) = sample_artwork(&layout);
            let channels = ArtworkChannels {
                individual_pixels: sample.individual_pixels.clone(),
                pixel_groups: sample.pixel_groups.clone(),
                pixel_group_indexes: sample.pixel_group_indexes.clone(),
                ..Default::default()
            };
            let token = binding
                .commit(&mut state, &holder, "Opaque", &channels, &[])
                .await
                .unwrap();
            assert_eq!(token.opaque_pixels, 21 + 40);

            let receipt = binding
                .reveal(&mut state, &holder, token.id, &channels)
                .await
                .unwrap();
            assert_eq!(receipt.counters.0, [0, 1, 1, 1, 0, 0]);
            assert!(receipt.finished);
        });
    }

    #[test]
    fn mismatched_reveal_is_rejected() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let binding = binding();
            let (_, holder) = create_account_keypair(1);
            let (channels, hint) = sample_artwork(&PixelLayout::default());
            let token = binding
                .commit(&mut state, &holder, "Tide", &channels, &hint)
                .await
                .unwrap();

            let mut tampered = channels.clone();
            tampered.individual_pixels[0] = Word::from_u64(0xdead);
            let result = binding
                .reveal(&mut state, &holder, token.id, &tampered)
                .await;
            assert!(matches!(
                result,
                Err(Error::Artwork(ArtworkError::IncorrectData { expected, .. }))
                    if expected == token.identity
            ));
            assert!(fill_completion_status(&state, &token.identity)
                .await
                .unwrap()
                .is_untouched());
            assert_eq!(
                binding.state(&state, token.id).await.unwrap(),
                RevealState::Committed
            );
        });
    }

    #[test]
    fn non_holder_reveal_is_rejected() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let binding = binding();
            let (_, holder) = create_account_keypair(1);
            let (_, stranger) = create_account_keypair(2);
            let (channels, hint) = sample_artwork(&PixelLayout::default());
            let token = binding
                .commit(&mut state, &holder, "Tide", &channels, &hint)
                .await
                .unwrap();

            let result = binding
                .reveal(&mut state, &stranger, token.id, &channels)
                .await;
            assert!(matches!(
                result,
                Err(Error::Artwork(ArtworkError::NotAuthorized { .. }))
            ));
            assert!(fill_completion_status(&state, &token.identity)
                .await
                .unwrap()
                .is_untouched());
        });
    }

    #[test]
    fn unknown_token_is_rejected() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let binding = binding();
            let (_, holder) = create_account_keypair(1);
            let (channels, _) = sample_artwork(&PixelLayout::default());
            assert!(matches!(
                binding.reveal(&mut state, &holder, 9, &channels).await,
                Err(Error::Artwork(ArtworkError::UnknownToken { token_id: 9 }))
            ));
            assert!(matches!(
                binding.state(&state, 9).await,
                Err(Error::Artwork(ArtworkError::UnknownToken { token_id: 9 }))
            ));
        });
    }

    #[test]
    fn tampered_reveal_after_finish_is_rejected() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let binding = binding();
            let (_, holder) = create_account_keypair(1);
            let (channels, hint) = sample_artwork(&PixelLayout::default());
            let token = binding
                .commit(&mut state, &holder, "Tide", &channels, &hint)
                .await
                .unwrap();
            binding
                .reveal(&mut state, &holder, token.id, &channels)
                .await
                .unwrap();

            let mut tampered = channels.clone();
            tampered.individual_pixels[0] = Word::from_u64(0xdead);
            assert!(matches!(
                binding.reveal(&mut state, &holder, token.id, &tampered).await,
                Err(Error::Artwork(ArtworkError::IncorrectData { .. }))
            ));
            assert_eq!(
                artwork_for_hash(&state, &token.identity).await.unwrap(),
                channels
            );
        });
    }

    #[test]
    fn commit_rejects_artwork_over_batch_limit() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let (_, store_owner) = create_store_owner_keypair();
            let config = ArtworkConfig {
                store: StoreConfig { max_batch_words: 3 },
                ..Default::default()
            };
            let binding = RevealBinding::new(TokenOwners, store_owner, &config);
            let (_, holder) = create_account_keypair(1);
            let (channels, hint) = sample_artwork(&PixelLayout::default());
            assert_eq!(channels.total_words(), 7);

            assert!(matches!(
                binding.commit(&mut state, &holder, "Tide", &channels, &hint).await,
                Err(Error::Artwork(ArtworkError::MalformedInput { .. }))
            ));
            assert!(state.is_empty());

            // Anything that mints can be revealed in one call.
            let small = ArtworkChannels {
                individual_pixels: channels.individual_pixels.clone(),
                ..Default::default()
            };
            let token = binding
                .commit(&mut state, &holder, "Small", &small, &[])
                .await
                .unwrap();
            assert!(binding
                .reveal(&mut state, &holder, token.id, &small)
                .await
                .unwrap()
                .finished);
        });
    }

    #[test]
    fn owner_cannot_append_to_bound_identity() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let binding = binding();
            let (_, holder) = create_account_keypair(1);
            let (channels, hint) = sample_artwork(&PixelLayout::default());
            let token = binding
                .commit(&mut state, &holder, "Tide", &channels, &hint)
                .await
                .unwrap();

            let stray = ArtworkChannels {
                color_index: vec![Word::from_u64(7)],
                ..Default::default()
            };
            let store_owner = binding.store().owner().clone();
            assert!(matches!(
                binding
                    .store()
                    .append(&mut state, &store_owner, token.identity, &stray)
                    .await,
                Err(Error::Artwork(ArtworkError::NotAuthorized { .. }))
            ));
            assert!(fill_completion_status(&state, &token.identity)
                .await
                .unwrap()
                .is_untouched());

            let receipt = binding
                .reveal(&mut state, &holder, token.id, &channels)
                .await
                .unwrap();
            assert!(receipt.newly_finished);
            assert_eq!(receipt.counters.0, [0, 3, 1, 1, 1, 1]);
        });
    }

    #[test]
    fn external_registry_decides_holder() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let (_, store_owner) = create_store_owner_keypair();
            let (_, minter) = create_account_keypair(1);
            let (_, buyer) = create_account_keypair(2);
            let mut holders = FixedHolders::default();
            holders.0.insert(1, buyer.clone());
            let binding = RevealBinding::new(holders, store_owner, &ArtworkConfig::default());

            let (channels, hint) = sample_artwork(&PixelLayout::default());
            let token = binding
                .commit(&mut state, &minter, "Tide", &channels, &hint)
                .await
                .unwrap();

            assert!(matches!(
                binding.reveal(&mut state, &minter, token.id, &channels).await,
                Err(Error::Artwork(ArtworkError::NotAuthorized { .. }))
            ));
            assert!(binding
                .reveal(&mut state, &buyer, token.id, &channels)
                .await
                .unwrap()
                .finished);
        });
    }
}
