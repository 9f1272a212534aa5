use anyhow::Result;
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest};
use pixelspace_types::{
    execution::{Account, Key, Value},
    ArtworkToken, FillRecord,
};
use std::future::Future;

#[cfg(any(test, feature = "mocks"))]
use std::collections::HashMap;

#[derive(Debug)]
pub enum PrepareError {
    InvalidSignature,
    NonceMismatch { expected: u64, got: u64 },
    State(anyhow::Error),
}

pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Result<Option<Value>>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = Result<()>>;
    fn delete(&mut self, key: &Key) -> impl Future<Output = Result<()>>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> impl Future<Output = Result<()>> {
        async {
            for (key, status) in changes {
                match status {
                    Status::Update(value) => self.insert(key, value).await?,
                    Status::Delete => self.delete(&key).await?,
                }
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "mocks"))]
#[derive(Default)]
pub struct Memory {
    state: HashMap<Key, Value>,
}

#[cfg(any(test, feature = "mocks"))]
impl Memory {
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

#[cfg(any(test, feature = "mocks"))]
impl State for Memory {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.state.get(key).cloned())
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.state.insert(key, value);
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.state.remove(key);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Status {
    Update(Value),
    Delete,
}

pub async fn nonce<S: State>(state: &S, public: &PublicKey) -> Result<u64> {
    Ok(load_account(state, public).await?.nonce)
}

pub(crate) async fn load_account<S: State>(state: &S, public: &PublicKey) -> Result<Account> {
    Ok(match state.get(&Key::Account(public.clone())).await? {
        Some(Value::Account(account)) => account,
        _ => Account::default(),
    })
}

pub(crate) fn validate_and_increment_nonce(
    account: &mut Account,
    provided_nonce: u64,
) -> Result<(), PrepareError> {
    if account.nonce != provided_nonce {
        return Err(PrepareError::NonceMismatch {
            expected: account.nonce,
            got: provided_nonce,
        });
    }
    account.nonce += 1;
    Ok(())
}

pub(crate) async fn load_fill<S: State>(state: &S, key: &Digest) -> Result<Option<FillRecord>> {
    Ok(match state.get(&Key::Fill(*key)).await? {
        Some(Value::Fill(record)) => Some(record),
        _ => None,
    })
}

pub(crate) async fn load_token<S: State>(state: &S, token_id: u64) -> Result<Option<ArtworkToken>> {
    Ok(match state.get(&Key::Artwork(token_id)).await? {
        Some(Value::Artwork(token)) => Some(token),
        _ => None,
    })
}

/// Token bound to `identity`, if any artwork committed to it.
pub(crate) async fn load_binding<S: State>(state: &S, identity: &Digest) -> Result<Option<u64>> {
    Ok(match state.get(&Key::ArtworkIdentity(*identity)).await? {
        Some(Value::ArtworkIdentity(token_id)) => Some(token_id),
        _ => None,
    })
}

pub(crate) async fn load_supply<S: State>(state: &S) -> Result<u64> {
    Ok(match state.get(&Key::ArtworkSupply).await? {
        Some(Value::ArtworkSupply(supply)) => supply,
        _ => 0,
    })
}
