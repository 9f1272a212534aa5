use super::*;
use commonware_cryptography::sha256::Digest;
use pixelspace_types::ArtworkChannels;

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) async fn handle_mint_artwork(
        &mut self,
        public: &PublicKey,
        name: &str,
        channels: &ArtworkChannels,
        transparency_hint: &[u32],
    ) -> anyhow::Result<Vec<Event>> {
        let binding = self.binding();
        match binding
            .commit(self, public, name, channels, transparency_hint)
            .await
        {
            Ok(token) => Ok(vec![Event::ArtworkMinted {
                token_id: token.id,
                owner: token.owner,
                identity: token.identity,
                number: token.number,
                opaque_pixels: token.opaque_pixels,
            }]),
            Err(error) => artwork_error_vec(public, None, error),
        }
    }

    pub(in crate::layer) async fn handle_reveal_artwork(
        &mut self,
        public: &PublicKey,
        token_id: u64,
        channels: &ArtworkChannels,
    ) -> anyhow::Result<Vec<Event>> {
        let binding = self.binding();
        match binding.reveal(self, public, token_id, channels).await {
            Ok(receipt) => Ok(receipt.event().into_iter().collect()),
            Err(error) => artwork_error_vec(public, Some(token_id), error),
        }
    }

    pub(in crate::layer) async fn handle_fill_artwork(
        &mut self,
        public: &PublicKey,
        key: &Digest,
        channels: &ArtworkChannels,
    ) -> anyhow::Result<Vec<Event>> {
        let binding = self.binding();
        match binding.store().append(self, public, *key, channels).await {
            Ok(receipt) => Ok(receipt.event().into_iter().collect()),
            Err(error) => artwork_error_vec(public, None, error),
        }
    }
}
