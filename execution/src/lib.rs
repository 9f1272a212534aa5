//! Pixelspace execution layer.
//!
//! This crate contains the artwork components (opaque pixel validator, content-addressed data
//! store, reveal binding) and the deterministic transaction execution logic (`Layer`) that
//! drives them.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution.
//! - Do not use randomness; token ids come from the ledger's artwork supply.
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! ## Atomicity
//! Every component checks its preconditions before writing. The `Layer` buffers writes in a
//! pending set that is only handed out by [`Layer::commit`], so a rejected instruction leaves
//! nothing behind but the sender's nonce.
//!
//! ## Minimal execution pipeline (example)
//! ```rust,ignore
//! use pixelspace_execution::{mocks::create_store_owner_keypair, Layer, Memory, State};
//! use pixelspace_types::ArtworkConfig;
//!
//! # async fn example(transactions: Vec<pixelspace_types::Transaction>) -> anyhow::Result<()> {
//! let mut state = Memory::default();
//! let (_, store_owner) = create_store_owner_keypair();
//! let mut layer = Layer::new(&state, ArtworkConfig::default(), store_owner);
//! let (_outputs, _nonces) = layer.execute(transactions).await?;
//! let changes = layer.commit();
//! state.apply(changes).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod reveal;
pub mod store;
pub mod validator;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod layer;

mod state;

pub use error::Error;
pub use layer::Layer;
pub use reveal::{HolderRegistry, RevealBinding, TokenOwners};
pub use state::{nonce, PrepareError, State, Status};
pub use store::{artwork_for_hash, fill_completion_status, is_filled, ArtworkStore, FillReceipt};
pub use validator::count_opaque_pixels;

#[cfg(any(test, feature = "mocks"))]
pub use state::Memory;
