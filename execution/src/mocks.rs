//! Keypairs and artwork fixtures for tests.

use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use pixelspace_types::{
    pixels::{
        encode_group_placement, encode_group_word, encode_individual_word,
        encode_transparency_word, Pixel,
    },
    ArtworkChannels, PixelLayout, Word,
};

/// Seed reserved for the store owner keypair.
pub const STORE_OWNER_SEED: u64 = 0;

/// Creates an account keypair for Ed25519 signatures used by users
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let private = PrivateKey::from_seed(seed);
    let public = private.public_key();
    (private, public)
}

/// Creates the keypair allowed to write to the artwork data store
pub fn create_store_owner_keypair() -> (PrivateKey, PublicKey) {
    create_account_keypair(STORE_OWNER_SEED)
}

/// An individual pixel word with `count` set slots at consecutive coordinates.
pub fn individual_word(layout: &PixelLayout, first_coordinate: u64, count: u32) -> Word {
    let slots: Vec<Option<Pixel>> = (0..u64::from(count))
        .map(|i| {
            Some(Pixel {
                coordinate: first_coordinate + i,
                color: ((first_coordinate + i) % 255 + 1) as u32,
            })
        })
        .collect();
    encode_individual_word(layout, &slots).expect("fixture pixels fit the layout")
}

/// A group word whose `G` pixels cycle through the palette.
pub fn group_word(layout: &PixelLayout, salt: u32) -> Word {
    let palette = 1u32 << layout.group_color_bits;
    let colors: Vec<u32> = (0..layout.group_size)
        .map(|i| (i + salt) % palette)
        .collect();
    encode_group_word(layout, &colors).expect("fixture colors fit the layout")
}

/// A small artwork and its transparency hint.
///
/// Three full individual words (21 pixels) and one group at index 0 with six transparent
/// slots that the hint covers. Under the default layout it has 21 + 34 = 55 opaque pixels.
pub fn sample_artwork(layout: &PixelLayout) -> (ArtworkChannels, Vec<u32>) {
    let individual_pixels = (0..3u64)
        .map(|i| individual_word(layout, 1 + i * 100, layout.slots_per_word))
        .collect();
    let transparent = (0..6).collect::<Vec<u32>>();
    let channels = ArtworkChannels {
        color_index: vec![],
        individual_pixels,
        pixel_groups: vec![group_word(layout, 0)],
        pixel_group_indexes: vec![encode_group_placement(4_096)],
        transparent_pixel_groups: vec![encode_transparency_word(layout, &transparent)
            .expect("fixture slots fit the group")],
        transparent_pixel_group_indexes: vec![encode_group_placement(0)],
    };
    (channels, vec![0])
}
