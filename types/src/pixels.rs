//! Pixel word codec and artwork identity hash.
//!
//! Channel words are interpreted under a [PixelLayout]. Bits are counted from the least
//! significant end of the big-endian [Word]:
//!
//! ```text
//! individual / color index word:  [spare][slot n-1]...[slot 1][slot 0]
//! slot:                           [coordinate][color]
//! group word:                     [spare][color G-1]...[color 1][color 0]
//! transparency word:              [ignored][flag G-1]...[flag 1][flag 0]
//! group index word:               [ignored][placement: u64]
//! ```
//!
//! A slot whose bits are all zero is unset. Group words have no such sentinel: every one of
//! the `G` pixels they describe is real unless its transparency flag is raised.

use crate::artwork::{ArtworkChannels, ArtworkError, Word, WORD_BITS};
use commonware_codec::Encode;
use commonware_cryptography::{
    sha256::{Digest, Sha256},
    Hasher,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain separator mixed into every identity hash.
pub const ARTWORK_HASH_NAMESPACE: &[u8] = b"_PIXELSPACE_ARTWORK";

pub const DEFAULT_SLOT_BITS: u32 = 36;
pub const DEFAULT_SLOTS_PER_WORD: u32 = 7;
pub const DEFAULT_COLOR_BITS: u32 = 8;
pub const DEFAULT_GROUP_SIZE: u32 = 40;
pub const DEFAULT_GROUP_COLOR_BITS: u32 = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{field} must be non-zero")]
    Zero { field: &'static str },
    #[error("{field} too wide (bits={bits}, max={max})")]
    TooWide {
        field: &'static str,
        bits: u32,
        max: u32,
    },
    #[error("color bits leave no room for a coordinate (color_bits={color_bits}, slot_bits={slot_bits})")]
    NoCoordinate { color_bits: u32, slot_bits: u32 },
    #[error("{what} overflows a 256-bit word (bits={bits})")]
    Overflow { what: &'static str, bits: u32 },
}

/// Bit layout of channel words.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelLayout {
    /// Width of an individual pixel (or color index) slot.
    pub slot_bits: u32,
    /// Slots packed into one individual pixel (or color index) word.
    pub slots_per_word: u32,
    /// Low bits of a slot holding the color reference. The remaining bits are the coordinate.
    pub color_bits: u32,
    /// Number of pixels described by one group word (`G`).
    pub group_size: u32,
    /// Palette bits per pixel of a group word.
    pub group_color_bits: u32,
}

impl Default for PixelLayout {
    fn default() -> Self {
        Self {
            slot_bits: DEFAULT_SLOT_BITS,
            slots_per_word: DEFAULT_SLOTS_PER_WORD,
            color_bits: DEFAULT_COLOR_BITS,
            group_size: DEFAULT_GROUP_SIZE,
            group_color_bits: DEFAULT_GROUP_COLOR_BITS,
        }
    }
}

impl PixelLayout {
    pub fn validate(&self) -> Result<(), LayoutError> {
        for (field, value) in [
            ("slot_bits", self.slot_bits),
            ("slots_per_word", self.slots_per_word),
            ("color_bits", self.color_bits),
            ("group_size", self.group_size),
            ("group_color_bits", self.group_color_bits),
        ] {
            if value == 0 {
                return Err(LayoutError::Zero { field });
            }
        }
        if self.slot_bits > 64 {
            return Err(LayoutError::TooWide {
                field: "slot_bits",
                bits: self.slot_bits,
                max: 64,
            });
        }
        if self.color_bits > 32 {
            return Err(LayoutError::TooWide {
                field: "color_bits",
                bits: self.color_bits,
                max: 32,
            });
        }
        if self.group_color_bits > 32 {
            return Err(LayoutError::TooWide {
                field: "group_color_bits",
                bits: self.group_color_bits,
                max: 32,
            });
        }
        if self.color_bits >= self.slot_bits {
            return Err(LayoutError::NoCoordinate {
                color_bits: self.color_bits,
                slot_bits: self.slot_bits,
            });
        }
        let slot_span = self.slot_bits.saturating_mul(self.slots_per_word);
        if slot_span > WORD_BITS {
            return Err(LayoutError::Overflow {
                what: "individual slots",
                bits: slot_span,
            });
        }
        let group_span = self.group_color_bits.saturating_mul(self.group_size);
        if group_span > WORD_BITS {
            return Err(LayoutError::Overflow {
                what: "group pixels",
                bits: group_span,
            });
        }
        Ok(())
    }

    pub fn coordinate_bits(&self) -> u32 {
        self.slot_bits - self.color_bits
    }
}

fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// A single decoded pixel: a canvas coordinate and a color reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub coordinate: u64,
    pub color: u32,
}

impl Pixel {
    fn unpack(layout: &PixelLayout, raw: u64) -> Self {
        Self {
            coordinate: raw >> layout.color_bits,
            color: (raw & mask(layout.color_bits)) as u32,
        }
    }

    fn pack(&self, layout: &PixelLayout) -> Result<u64, ArtworkError> {
        if u64::from(self.color) > mask(layout.color_bits) {
            return Err(ArtworkError::malformed(format!(
                "pixel color {} exceeds {} bits",
                self.color, layout.color_bits
            )));
        }
        if self.coordinate > mask(layout.coordinate_bits()) {
            return Err(ArtworkError::malformed(format!(
                "pixel coordinate {} exceeds {} bits",
                self.coordinate,
                layout.coordinate_bits()
            )));
        }
        let raw = (self.coordinate << layout.color_bits) | u64::from(self.color);
        if raw == 0 {
            return Err(ArtworkError::malformed(
                "pixel encodes to the unset sentinel",
            ));
        }
        Ok(raw)
    }
}

/// One of the `G` pixels described by a group word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupPixel {
    /// Position of the pixel within the group's run.
    pub offset: u32,
    pub color: u32,
}

/// Which of the `G` slots of a group are transparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransparencyMask {
    bits: Word,
    slots: u32,
}

impl TransparencyMask {
    pub fn slots(&self) -> u32 {
        self.slots
    }

    pub fn is_transparent(&self, slot: u32) -> bool {
        slot < self.slots && self.bits.bit(slot)
    }

    /// Number of transparent slots.
    pub fn count(&self) -> u32 {
        self.bits.count_ones()
    }

    pub fn transparent_slots(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.slots).filter(|slot| self.bits.bit(*slot))
    }
}

/// Decode every slot of an individual pixel (or color index) word.
///
/// Always yields `slots_per_word` entries; unset slots decode to `None`.
pub fn decode_individual_word(layout: &PixelLayout, word: &Word) -> Vec<Option<Pixel>> {
    (0..layout.slots_per_word)
        .map(|slot| {
            let raw = word.bits(slot * layout.slot_bits, layout.slot_bits);
            (raw != 0).then(|| Pixel::unpack(layout, raw))
        })
        .collect()
}

/// Number of set slots in an individual pixel (or color index) word.
pub fn count_set_slots(layout: &PixelLayout, word: &Word) -> u32 {
    (0..layout.slots_per_word)
        .filter(|slot| word.bits(slot * layout.slot_bits, layout.slot_bits) != 0)
        .count() as u32
}

/// Decode a group word into exactly `G` pixel descriptors.
pub fn decode_group_word(layout: &PixelLayout, word: &Word) -> Vec<GroupPixel> {
    (0..layout.group_size)
        .map(|offset| GroupPixel {
            offset,
            color: word.bits(offset * layout.group_color_bits, layout.group_color_bits) as u32,
        })
        .collect()
}

/// Decode a transparency word. Bits at or above `G` are ignored.
pub fn decode_transparency_word(layout: &PixelLayout, word: &Word) -> TransparencyMask {
    TransparencyMask {
        bits: word.masked(layout.group_size),
        slots: layout.group_size,
    }
}

/// Canvas coordinate of the first pixel of a group.
pub fn decode_group_placement(word: &Word) -> u64 {
    word.low_u64()
}

/// Pack up to `slots_per_word` pixels into an individual pixel (or color index) word.
pub fn encode_individual_word(
    layout: &PixelLayout,
    slots: &[Option<Pixel>],
) -> Result<Word, ArtworkError> {
    if slots.len() > layout.slots_per_word as usize {
        return Err(ArtworkError::malformed(format!(
            "{} slots exceed {} per word",
            slots.len(),
            layout.slots_per_word
        )));
    }
    let mut word = Word::ZERO;
    for (slot, pixel) in slots.iter().enumerate() {
        if let Some(pixel) = pixel {
            word.set_bits(
                slot as u32 * layout.slot_bits,
                layout.slot_bits,
                pixel.pack(layout)?,
            );
        }
    }
    Ok(word)
}

/// Pack exactly `G` palette colors into a group word.
pub fn encode_group_word(layout: &PixelLayout, colors: &[u32]) -> Result<Word, ArtworkError> {
    if colors.len() != layout.group_size as usize {
        return Err(ArtworkError::malformed(format!(
            "group has {} pixels, expected {}",
            colors.len(),
            layout.group_size
        )));
    }
    let mut word = Word::ZERO;
    for (offset, color) in colors.iter().enumerate() {
        if u64::from(*color) > mask(layout.group_color_bits) {
            return Err(ArtworkError::malformed(format!(
                "group color {color} exceeds {} bits",
                layout.group_color_bits
            )));
        }
        word.set_bits(
            offset as u32 * layout.group_color_bits,
            layout.group_color_bits,
            u64::from(*color),
        );
    }
    Ok(word)
}

/// Raise the transparency flag of every listed group slot.
pub fn encode_transparency_word(
    layout: &PixelLayout,
    transparent: &[u32],
) -> Result<Word, ArtworkError> {
    let mut word = Word::ZERO;
    for slot in transparent {
        if *slot >= layout.group_size {
            return Err(ArtworkError::malformed(format!(
                "transparent slot {slot} outside group of {}",
                layout.group_size
            )));
        }
        word.set_bits(*slot, 1, 1);
    }
    Ok(word)
}

pub fn encode_group_placement(coordinate: u64) -> Word {
    Word::from_u64(coordinate)
}

/// Content address of an artwork.
///
/// SHA-256 over a namespace followed by the six channels in canonical order, each behind a
/// length prefix.
pub fn identity_hash(channels: &ArtworkChannels) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(ARTWORK_HASH_NAMESPACE);
    hasher.update(channels.encode().as_ref());
    hasher.finalize()
}
