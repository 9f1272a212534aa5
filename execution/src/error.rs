use pixelspace_types::ArtworkError;
use thiserror::Error;

/// Failure of an artwork operation.
///
/// Domain rejections are reported to the caller (and surface as error events); state
/// failures are infrastructure errors that abort the block.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Artwork(#[from] ArtworkError),
    #[error(transparent)]
    State(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
