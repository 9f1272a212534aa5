use super::*;
use crate::error::Error;
use pixelspace_types::{execution::MAX_ERROR_MESSAGE_LENGTH, ArtworkError};

fn artwork_error(caller: &PublicKey, token_id: Option<u64>, error: &ArtworkError) -> Event {
    let mut message = error.to_string();
    if message.len() > MAX_ERROR_MESSAGE_LENGTH {
        let mut end = MAX_ERROR_MESSAGE_LENGTH;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
    }
    Event::ArtworkError {
        caller: caller.clone(),
        token_id,
        error_code: error.code(),
        message,
    }
}

/// Report a domain rejection as an error event; propagate state failures.
fn artwork_error_vec(
    caller: &PublicKey,
    token_id: Option<u64>,
    error: Error,
) -> anyhow::Result<Vec<Event>> {
    match error {
        Error::Artwork(error) => {
            debug!(caller = ?caller, token_id, %error, "artwork instruction rejected");
            Ok(vec![artwork_error(caller, token_id, &error)])
        }
        Error::State(error) => Err(error),
    }
}

mod artwork;
