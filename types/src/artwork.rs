//! Artwork records and their canonical encodings.
//!
//! An artwork is carried as six parallel channels of 256-bit [Word]s. The channels are
//! content-addressed by their identity hash (see [crate::pixels::identity_hash]) and are
//! accumulated into a [FillRecord] as they are revealed.

use bytes::{Buf, BufMut};
use commonware_codec::{varint::UInt, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest, Digestible};
use commonware_utils::{from_hex_formatted, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error as ThisError;

/// Width of a channel word in bytes.
pub const WORD_LEN: usize = 32;

/// Width of a channel word in bits.
pub const WORD_BITS: u32 = (WORD_LEN * 8) as u32;

/// Number of channels carried by an artwork.
pub const CHANNEL_COUNT: usize = 6;

/// Maximum number of words accepted in a single channel of an encoded artwork.
pub const MAX_CHANNEL_WORDS: usize = 1 << 16;

/// Maximum artwork name length.
pub const ARTWORK_MAX_NAME_LENGTH: usize = 64;

// Error codes carried by `Event::ArtworkError`.
pub const ERROR_MALFORMED_INPUT: u8 = 1;
pub const ERROR_INCORRECT_DATA: u8 = 2;
pub const ERROR_NOT_AUTHORIZED: u8 = 3;
pub const ERROR_NOT_FOUND: u8 = 4;

/// Write a string as length-prefixed UTF-8 bytes.
pub(crate) fn write_string(s: &str, writer: &mut impl BufMut) {
    let bytes = s.as_bytes();
    (bytes.len() as u32).write(writer);
    writer.put_slice(bytes);
}

/// Read a string from length-prefixed UTF-8 bytes.
pub(crate) fn read_string(reader: &mut impl Buf, max_len: usize) -> Result<String, Error> {
    let len = u32::read(reader)? as usize;
    if len > max_len {
        return Err(Error::Invalid("String", "too long"));
    }
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = vec![0u8; len];
    reader.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| Error::Invalid("String", "invalid UTF-8"))
}

pub(crate) fn string_encode_size(s: &str) -> usize {
    u32::SIZE + s.len()
}

/// Write a word sequence behind a varint length prefix.
fn write_words(words: &[Word], writer: &mut impl BufMut) {
    UInt(words.len() as u32).write(writer);
    for word in words {
        word.write(writer);
    }
}

/// Read a varint length-prefixed word sequence of at most `max_len` words.
fn read_words(reader: &mut impl Buf, max_len: usize) -> Result<Vec<Word>, Error> {
    let len: u32 = UInt::read(reader)?.into();
    let len = len as usize;
    if len > max_len {
        return Err(Error::Invalid("ArtworkChannels", "too many words"));
    }
    if reader.remaining() < len * WORD_LEN {
        return Err(Error::EndOfBuffer);
    }
    (0..len).map(|_| Word::read(reader)).collect()
}

fn words_encode_size(words: &[Word]) -> usize {
    UInt(words.len() as u32).encode_size() + words.len() * WORD_LEN
}

/// A 256-bit channel word, stored big-endian.
///
/// Bit `0` is the least significant bit of the last byte.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word(pub [u8; WORD_LEN]);

impl Word {
    pub const ZERO: Self = Self([0u8; WORD_LEN]);

    /// Word holding `value` in its low 64 bits.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; WORD_LEN];
        bytes[WORD_LEN - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// The low 64 bits of the word.
    pub fn low_u64(&self) -> u64 {
        self.bits(0, 64)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn bit(&self, index: u32) -> bool {
        debug_assert!(index < WORD_BITS);
        let byte = self.0[WORD_LEN - 1 - (index / 8) as usize];
        (byte >> (index % 8)) & 1 == 1
    }

    /// Read `width` (at most 64) bits starting at bit `offset`.
    pub fn bits(&self, offset: u32, width: u32) -> u64 {
        debug_assert!(width <= 64 && offset + width <= WORD_BITS);
        (0..width)
            .rev()
            .fold(0u64, |acc, i| (acc << 1) | self.bit(offset + i) as u64)
    }

    /// Overwrite `width` (at most 64) bits starting at bit `offset` with the low bits of `value`.
    pub(crate) fn set_bits(&mut self, offset: u32, width: u32, value: u64) {
        debug_assert!(width <= 64 && offset + width <= WORD_BITS);
        for i in 0..width {
            let index = offset + i;
            let byte = &mut self.0[WORD_LEN - 1 - (index / 8) as usize];
            let flag = 1u8 << (index % 8);
            if (value >> i) & 1 == 1 {
                *byte |= flag;
            } else {
                *byte &= !flag;
            }
        }
    }

    /// Copy of the word with every bit at or above `width` cleared.
    pub fn masked(&self, width: u32) -> Self {
        let mut out = Self::ZERO;
        for index in 0..width.min(WORD_BITS) {
            if self.bit(index) {
                out.0[WORD_LEN - 1 - (index / 8) as usize] |= 1u8 << (index % 8);
            }
        }
        out
    }

    pub fn count_ones(&self) -> u32 {
        self.0.iter().map(|b| b.count_ones()).sum()
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex(&self.0))
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex(&self.0))
    }
}

impl Write for Word {
    fn write(&self, writer: &mut impl BufMut) {
        writer.put_slice(&self.0);
    }
}

impl Read for Word {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(<[u8; WORD_LEN]>::read(reader)?))
    }
}

impl FixedSize for Word {
    const SIZE: usize = WORD_LEN;
}

impl Serialize for Word {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex(&self.0)))
    }
}

impl<'de> Deserialize<'de> for Word {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = from_hex_formatted(&s)
            .ok_or_else(|| serde::de::Error::custom("invalid hex string"))?;
        if bytes.len() > WORD_LEN {
            return Err(serde::de::Error::custom("word longer than 32 bytes"));
        }
        // Short hex strings are left-padded, matching how integers are usually written.
        let mut word = [0u8; WORD_LEN];
        word[WORD_LEN - bytes.len()..].copy_from_slice(&bytes);
        Ok(Self(word))
    }
}

/// The six artwork channels, in canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Channel {
    ColorIndex = 0,
    IndividualPixels = 1,
    PixelGroups = 2,
    PixelGroupIndexes = 3,
    TransparentPixelGroups = 4,
    TransparentPixelGroupIndexes = 5,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::ColorIndex,
        Channel::IndividualPixels,
        Channel::PixelGroups,
        Channel::PixelGroupIndexes,
        Channel::TransparentPixelGroups,
        Channel::TransparentPixelGroupIndexes,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::ColorIndex => "color_index",
            Channel::IndividualPixels => "individual_pixels",
            Channel::PixelGroups => "pixel_groups",
            Channel::PixelGroupIndexes => "pixel_group_indexes",
            Channel::TransparentPixelGroups => "transparent_pixel_groups",
            Channel::TransparentPixelGroupIndexes => "transparent_pixel_group_indexes",
        }
    }
}

/// Raw pixel data of an artwork: six parallel, ordered word sequences.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkChannels {
    pub color_index: Vec<Word>,
    pub individual_pixels: Vec<Word>,
    pub pixel_groups: Vec<Word>,
    pub pixel_group_indexes: Vec<Word>,
    pub transparent_pixel_groups: Vec<Word>,
    pub transparent_pixel_group_indexes: Vec<Word>,
}

impl ArtworkChannels {
    pub fn channel(&self, channel: Channel) -> &[Word] {
        match channel {
            Channel::ColorIndex => &self.color_index,
            Channel::IndividualPixels => &self.individual_pixels,
            Channel::PixelGroups => &self.pixel_groups,
            Channel::PixelGroupIndexes => &self.pixel_group_indexes,
            Channel::TransparentPixelGroups => &self.transparent_pixel_groups,
            Channel::TransparentPixelGroupIndexes => &self.transparent_pixel_group_indexes,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut Vec<Word> {
        match channel {
            Channel::ColorIndex => &mut self.color_index,
            Channel::IndividualPixels => &mut self.individual_pixels,
            Channel::PixelGroups => &mut self.pixel_groups,
            Channel::PixelGroupIndexes => &mut self.pixel_group_indexes,
            Channel::TransparentPixelGroups => &mut self.transparent_pixel_groups,
            Channel::TransparentPixelGroupIndexes => &mut self.transparent_pixel_group_indexes,
        }
    }

    pub fn is_empty(&self) -> bool {
        Channel::ALL.iter().all(|c| self.channel(*c).is_empty())
    }

    pub fn total_words(&self) -> usize {
        Channel::ALL.iter().map(|c| self.channel(*c).len()).sum()
    }

    /// Append every channel of `batch` to the matching channel of `self`.
    pub fn extend(&mut self, batch: &ArtworkChannels) {
        for channel in Channel::ALL {
            self.channel_mut(channel)
                .extend_from_slice(batch.channel(channel));
        }
    }

    /// Contents of `self` followed by the contents of `batch`, channel by channel.
    pub fn merged(&self, batch: &ArtworkChannels) -> ArtworkChannels {
        let mut out = self.clone();
        out.extend(batch);
        out
    }
}

impl Write for ArtworkChannels {
    fn write(&self, writer: &mut impl BufMut) {
        for channel in Channel::ALL {
            write_words(self.channel(channel), writer);
        }
    }
}

impl Read for ArtworkChannels {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let mut channels = Self::default();
        for channel in Channel::ALL {
            *channels.channel_mut(channel) = read_words(reader, MAX_CHANNEL_WORDS)?;
        }
        Ok(channels)
    }
}

impl EncodeSize for ArtworkChannels {
    fn encode_size(&self) -> usize {
        Channel::ALL
            .iter()
            .map(|c| words_encode_size(self.channel(*c)))
            .sum()
    }
}

impl Digestible for ArtworkChannels {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        crate::pixels::identity_hash(self)
    }
}

/// Per-channel count of write operations that contributed data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelCounters(pub [u32; CHANNEL_COUNT]);

impl ChannelCounters {
    pub fn get(&self, channel: Channel) -> u32 {
        self.0[channel.index()]
    }

    pub fn bump(&mut self, channel: Channel) {
        let counter = &mut self.0[channel.index()];
        *counter = counter.saturating_add(1);
    }

    pub fn is_untouched(&self) -> bool {
        self.0.iter().all(|c| *c == 0)
    }
}

impl Write for ChannelCounters {
    fn write(&self, writer: &mut impl BufMut) {
        for counter in self.0 {
            counter.write(writer);
        }
    }
}

impl Read for ChannelCounters {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let mut counters = [0u32; CHANNEL_COUNT];
        for counter in counters.iter_mut() {
            *counter = u32::read(reader)?;
        }
        Ok(Self(counters))
    }
}

impl FixedSize for ChannelCounters {
    const SIZE: usize = u32::SIZE * CHANNEL_COUNT;
}

/// Accumulated pixel data stored under an identity hash.
///
/// The key is not stored in the record; it is the ledger key the record lives under.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FillRecord {
    pub channels: ArtworkChannels,
    pub counters: ChannelCounters,
    pub finished: bool,
}

impl Write for FillRecord {
    fn write(&self, writer: &mut impl BufMut) {
        self.channels.write(writer);
        self.counters.write(writer);
        self.finished.write(writer);
    }
}

impl Read for FillRecord {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            channels: ArtworkChannels::read(reader)?,
            counters: ChannelCounters::read(reader)?,
            finished: bool::read(reader)?,
        })
    }
}

impl EncodeSize for FillRecord {
    fn encode_size(&self) -> usize {
        self.channels.encode_size() + ChannelCounters::SIZE + bool::SIZE
    }
}

/// A minted artwork bound to the identity hash committed at creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtworkToken {
    pub id: u64,
    pub owner: PublicKey,
    pub identity: Digest,
    pub name: String,
    pub number: u64,
    pub opaque_pixels: u64,
}

impl Write for ArtworkToken {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.owner.write(writer);
        self.identity.write(writer);
        write_string(&self.name, writer);
        self.number.write(writer);
        self.opaque_pixels.write(writer);
    }
}

impl Read for ArtworkToken {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: u64::read(reader)?,
            owner: PublicKey::read(reader)?,
            identity: Digest::read(reader)?,
            name: read_string(reader, ARTWORK_MAX_NAME_LENGTH)?,
            number: u64::read(reader)?,
            opaque_pixels: u64::read(reader)?,
        })
    }
}

impl EncodeSize for ArtworkToken {
    fn encode_size(&self) -> usize {
        u64::SIZE
            + PublicKey::SIZE
            + Digest::SIZE
            + string_encode_size(&self.name)
            + u64::SIZE
            + u64::SIZE
    }
}

/// Reveal progress of a minted artwork, derived from the fill record of its identity hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealState {
    /// Only the identity hash is known.
    Committed,
    /// Some channel data has been written but it does not yet reproduce the identity hash.
    Revealing,
    /// The accumulated data reproduces the identity hash.
    Revealed,
}

impl RevealState {
    pub fn of(record: Option<&FillRecord>) -> Self {
        match record {
            Some(record) if record.finished => RevealState::Revealed,
            Some(record) if !record.counters.is_untouched() => RevealState::Revealing,
            _ => RevealState::Committed,
        }
    }
}

#[derive(Debug, Clone, ThisError, PartialEq, Eq)]
pub enum ArtworkError {
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },
    #[error("incorrect data (expected={expected:?}, computed={computed:?})")]
    IncorrectData { expected: Digest, computed: Digest },
    #[error("not authorized (caller={caller:?})")]
    NotAuthorized { caller: PublicKey },
    #[error("artwork is not filled (key={key:?})")]
    NotFound { key: Digest },
    #[error("artwork token not found (id={token_id})")]
    UnknownToken { token_id: u64 },
}

impl ArtworkError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::MalformedInput { .. } => ERROR_MALFORMED_INPUT,
            Self::IncorrectData { .. } => ERROR_INCORRECT_DATA,
            Self::NotAuthorized { .. } => ERROR_NOT_AUTHORIZED,
            Self::NotFound { .. } | Self::UnknownToken { .. } => ERROR_NOT_FOUND,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::{DecodeExt, Encode};
    use commonware_cryptography::{ed25519::PrivateKey, Hasher, Sha256, Signer};

    fn channels() -> ArtworkChannels {
        ArtworkChannels {
            individual_pixels: vec![Word::from_u64(7), Word::from_u64(9)],
            pixel_groups: vec![Word::from_u64(1)],
            pixel_group_indexes: vec![Word::from_u64(1024)],
            ..Default::default()
        }
    }

    #[test]
    fn word_bits_round_trip_across_byte_boundaries() {
        let mut word = Word::ZERO;
        word.set_bits(3, 36, 0xA_BCDE_F012);
        assert_eq!(word.bits(3, 36), 0xA_BCDE_F012);
        assert_eq!(word.bits(0, 3), 0);
        assert_eq!(word.bits(39, 64), 0);

        word.set_bits(250, 6, 0b10_1101);
        assert_eq!(word.bits(250, 6), 0b10_1101);
        assert_eq!(word.0[0], 0b1011_0100);
    }

    #[test]
    fn word_masked_clears_high_bits() {
        let word = Word([0xFF; WORD_LEN]);
        let masked = word.masked(40);
        assert_eq!(masked.count_ones(), 40);
        assert!(!masked.bit(40));
        assert!(masked.bit(39));
    }

    #[test]
    fn word_serde_accepts_short_hex() {
        let word: Word = serde_json::from_str("\"0x01ff\"").unwrap();
        assert_eq!(word, Word::from_u64(0x01ff));
        let json = serde_json::to_string(&word).unwrap();
        let back: Word = serde_json::from_str(&json).unwrap();
        assert_eq!(back, word);
    }

    #[test]
    fn channels_codec_is_length_prefixed() {
        let channels = channels();
        let encoded = channels.encode();
        assert_eq!(encoded.len(), channels.encode_size());
        let decoded = ArtworkChannels::decode(encoded).unwrap();
        assert_eq!(decoded, channels);

        // Moving a word across a channel boundary must change the encoding.
        let mut shifted = channels.clone();
        let moved = shifted.individual_pixels.pop().unwrap();
        shifted.color_index.push(moved);
        assert_ne!(shifted.encode(), channels.encode());
    }

    #[test]
    fn merged_appends_per_channel() {
        let first = ArtworkChannels {
            pixel_groups: vec![Word::from_u64(1)],
            ..Default::default()
        };
        let second = ArtworkChannels {
            pixel_groups: vec![Word::from_u64(2)],
            color_index: vec![Word::from_u64(3)],
            ..Default::default()
        };
        let merged = first.merged(&second);
        assert_eq!(
            merged.pixel_groups,
            vec![Word::from_u64(1), Word::from_u64(2)]
        );
        assert_eq!(merged.color_index, vec![Word::from_u64(3)]);
        assert_eq!(merged.total_words(), 3);
    }

    #[test]
    fn fill_record_and_token_codec() {
        let mut counters = ChannelCounters::default();
        counters.bump(Channel::PixelGroups);
        let record = FillRecord {
            channels: channels(),
            counters,
            finished: true,
        };
        let decoded = FillRecord::decode(record.encode()).unwrap();
        assert_eq!(decoded, record);

        let token = ArtworkToken {
            id: 3,
            owner: PrivateKey::from_seed(1).public_key(),
            identity: Sha256::hash(b"artwork"),
            name: "Sunset".to_string(),
            number: 3,
            opaque_pixels: 55,
        };
        let encoded = token.encode();
        assert_eq!(encoded.len(), token.encode_size());
        assert_eq!(ArtworkToken::decode(encoded).unwrap(), token);
    }

    #[test]
    fn reveal_state_follows_record() {
        assert_eq!(RevealState::of(None), RevealState::Committed);

        let mut record = FillRecord::default();
        assert_eq!(RevealState::of(Some(&record)), RevealState::Committed);

        record.counters.bump(Channel::ColorIndex);
        assert_eq!(RevealState::of(Some(&record)), RevealState::Revealing);

        record.finished = true;
        assert_eq!(RevealState::of(Some(&record)), RevealState::Revealed);
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ArtworkError::malformed("x").code(), ERROR_MALFORMED_INPUT);
        assert_eq!(
            ArtworkError::UnknownToken { token_id: 1 }.code(),
            ERROR_NOT_FOUND
        );
    }
}
