pub mod artwork;
pub use artwork::{
    ArtworkChannels, ArtworkError, ArtworkToken, Channel, ChannelCounters, FillRecord,
    RevealState, Word,
};
pub mod config;
pub use config::{ArtworkConfig, ConfigError, StoreConfig};
pub mod execution;
pub use execution::{Instruction, Transaction, NAMESPACE};
pub mod pixels;
pub use pixels::{identity_hash, PixelLayout};
