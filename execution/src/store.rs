//! Content-addressed, append-only artwork data store.
//!
//! Records are keyed by the identity hash of the artwork they are expected to reconstruct.
//! Writes only ever append words to a record; a record is finished once its accumulated
//! channels hash back to its key, after which further writes are ignored.
//!
//! Keys bound to a minted token only accept data that has been checked against the token's
//! identity (see [crate::reveal::RevealBinding]); unverified chunks could never be removed.

use crate::{
    error::Result,
    state::{load_binding, load_fill, State},
};
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest};
use commonware_utils::hex;
use pixelspace_types::{
    artwork::MAX_CHANNEL_WORDS,
    execution::{Event, Key, Value},
    identity_hash, ArtworkChannels, ArtworkError, Channel, ChannelCounters, StoreConfig,
};
use tracing::{debug, info};

/// Outcome of a write to the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillReceipt {
    pub key: Digest,
    pub counters: ChannelCounters,
    pub finished: bool,
    /// This write completed the record.
    pub newly_finished: bool,
    /// The record was already finished and the write changed nothing.
    pub ignored: bool,
}

impl FillReceipt {
    /// Event announcing the write, if it changed anything.
    pub fn event(&self) -> Option<Event> {
        if self.ignored {
            return None;
        }
        Some(if self.newly_finished {
            Event::ArtworkRevealed {
                identity: self.key,
                counters: self.counters,
            }
        } else {
            Event::ArtworkFilled {
                identity: self.key,
                counters: self.counters,
            }
        })
    }
}

/// Writer for fill records. Only `owner` may write.
#[derive(Clone, Debug)]
pub struct ArtworkStore {
    owner: PublicKey,
    config: StoreConfig,
}

impl ArtworkStore {
    pub fn new(owner: PublicKey, config: StoreConfig) -> Self {
        Self { owner, config }
    }

    pub fn owner(&self) -> &PublicKey {
        &self.owner
    }

    pub fn max_batch_words(&self) -> usize {
        self.config.max_batch_words
    }

    /// Write a complete artwork in one call, keyed by the identity hash of `batch` alone.
    ///
    /// Chunked uploads go through [ArtworkStore::append] with an explicit key.
    pub async fn write<S: State>(
        &self,
        state: &mut S,
        caller: &PublicKey,
        batch: &ArtworkChannels,
    ) -> Result<FillReceipt> {
        self.fill(state, caller, identity_hash(batch), batch).await
    }

    /// Append `batch` to the record stored under `key`, creating it if needed.
    ///
    /// Keys bound to a minted token are refused; their data arrives through reveals.
    pub async fn append<S: State>(
        &self,
        state: &mut S,
        caller: &PublicKey,
        key: Digest,
        batch: &ArtworkChannels,
    ) -> Result<FillReceipt> {
        if caller != &self.owner {
            return Err(ArtworkError::NotAuthorized {
                caller: caller.clone(),
            }
            .into());
        }
        if let Some(token_id) = load_binding(&*state, &key).await? {
            debug!(key = %hex(key.as_ref()), token_id, "append to token-bound key refused");
            return Err(ArtworkError::NotAuthorized {
                caller: caller.clone(),
            }
            .into());
        }
        self.fill(state, caller, key, batch).await
    }

    /// Append `batch` under `key` without consulting token bindings.
    ///
    /// Each channel that receives at least one word has its counter bumped once.
    pub(crate) async fn fill<S: State>(
        &self,
        state: &mut S,
        caller: &PublicKey,
        key: Digest,
        batch: &ArtworkChannels,
    ) -> Result<FillReceipt> {
        if caller != &self.owner {
            return Err(ArtworkError::NotAuthorized {
                caller: caller.clone(),
            }
            .into());
        }
        if batch.is_empty() {
            return Err(ArtworkError::malformed("batch carries no words").into());
        }
        let words = batch.total_words();
        if words > self.config.max_batch_words {
            return Err(ArtworkError::malformed(format!(
                "batch of {words} words exceeds limit of {}",
                self.config.max_batch_words
            ))
            .into());
        }

        let mut record = load_fill(&*state, &key).await?.unwrap_or_default();
        if record.finished {
            debug!(key = %hex(key.as_ref()), "artwork already filled; ignoring write");
            return Ok(FillReceipt {
                key,
                counters: record.counters,
                finished: true,
                newly_finished: false,
                ignored: true,
            });
        }
        for channel in Channel::ALL {
            let stored = record.channels.channel(channel).len();
            let added = batch.channel(channel).len();
            if stored + added > MAX_CHANNEL_WORDS {
                return Err(ArtworkError::malformed(format!(
                    "{} would hold {} words (max {MAX_CHANNEL_WORDS})",
                    channel.as_str(),
                    stored + added
                ))
                .into());
            }
        }

        for channel in Channel::ALL {
            let words = batch.channel(channel);
            if words.is_empty() {
                continue;
            }
            record.channels.channel_mut(channel).extend_from_slice(words);
            record.counters.bump(channel);
        }
        record.finished = identity_hash(&record.channels) == key;

        let receipt = FillReceipt {
            key,
            counters: record.counters,
            finished: record.finished,
            newly_finished: record.finished,
            ignored: false,
        };
        state.insert(Key::Fill(key), Value::Fill(record)).await?;

        if receipt.finished {
            info!(key = %hex(key.as_ref()), counters = ?receipt.counters, "artwork filled");
        } else {
            debug!(
                key = %hex(key.as_ref()),
                words,
                counters = ?receipt.counters,
                "artwork words appended"
            );
        }
        Ok(receipt)
    }
}

/// Whether the record under `key` reproduces its identity hash.
pub async fn is_filled<S: State>(state: &S, key: &Digest) -> anyhow::Result<bool> {
    Ok(load_fill(state, key)
        .await?
        .is_some_and(|record| record.finished))
}

/// Per-channel write counters of the record under `key` (all zero if unseen).
pub async fn fill_completion_status<S: State>(
    state: &S,
    key: &Digest,
) -> anyhow::Result<ChannelCounters> {
    Ok(load_fill(state, key)
        .await?
        .map(|record| record.counters)
        .unwrap_or_default())
}

/// Channel data of a finished record.
pub async fn artwork_for_hash<S: State>(state: &S, key: &Digest) -> Result<ArtworkChannels> {
    match load_fill(state, key).await? {
        Some(record) if record.finished => Ok(record.channels),
        _ => Err(ArtworkError::NotFound { key: *key }.into()),
    }
}
