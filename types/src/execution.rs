use crate::artwork::{
    read_string, string_encode_size, write_string, ArtworkChannels, ArtworkToken,
    ChannelCounters, FillRecord, ARTWORK_MAX_NAME_LENGTH, MAX_CHANNEL_WORDS,
};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::{
    ed25519::{self, PublicKey},
    sha256::Digest,
    Signer, Verifier,
};
use commonware_utils::union;

pub const NAMESPACE: &[u8] = b"_PIXELSPACE";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

/// Maximum length of the message carried by an error event.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 256;

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Mint an artwork, committing to the identity hash of its channels.
    /// Binary: [0] [name] [channels] [hint:Vec<u32>]
    MintArtwork {
        name: String,
        channels: ArtworkChannels,
        /// Group indexes whose transparency flags are honored when counting opaque pixels.
        transparency_hint: Vec<u32>,
    },

    /// Reveal the channel data of a minted artwork (holder only).
    /// Binary: [1] [tokenId:u64] [channels]
    RevealArtwork {
        token_id: u64,
        channels: ArtworkChannels,
    },

    /// Append channel data under an explicit identity hash (store owner only).
    /// Binary: [2] [key:32] [channels]
    FillArtwork {
        key: Digest,
        channels: ArtworkChannels,
    },
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::MintArtwork {
                name,
                channels,
                transparency_hint,
            } => {
                0u8.write(writer);
                write_string(name, writer);
                channels.write(writer);
                transparency_hint.write(writer);
            }
            Self::RevealArtwork { token_id, channels } => {
                1u8.write(writer);
                token_id.write(writer);
                channels.write(writer);
            }
            Self::FillArtwork { key, channels } => {
                2u8.write(writer);
                key.write(writer);
                channels.write(writer);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            0 => Self::MintArtwork {
                name: read_string(reader, ARTWORK_MAX_NAME_LENGTH)?,
                channels: ArtworkChannels::read(reader)?,
                transparency_hint: Vec::<u32>::read_range(reader, 0..=MAX_CHANNEL_WORDS)?,
            },
            1 => Self::RevealArtwork {
                token_id: u64::read(reader)?,
                channels: ArtworkChannels::read(reader)?,
            },
            2 => Self::FillArtwork {
                key: Digest::read(reader)?,
                channels: ArtworkChannels::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::MintArtwork {
                    name,
                    channels,
                    transparency_hint,
                } => {
                    string_encode_size(name)
                        + channels.encode_size()
                        + transparency_hint.encode_size()
                }
                Self::RevealArtwork { channels, .. } => u64::SIZE + channels.encode_size(),
                Self::FillArtwork { channels, .. } => Digest::SIZE + channels.encode_size(),
            }
    }
}

/// Minimal account structure for transaction nonce tracking.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
    }
}

#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Clone)]
pub enum Key {
    /// Account for nonce tracking (tag 0)
    Account(PublicKey),

    // Artwork keys (tags 10-13)
    Artwork(u64),
    ArtworkSupply,
    Fill(Digest),
    /// Token bound to an identity hash.
    ArtworkIdentity(Digest),
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::Artwork(id) => {
                10u8.write(writer);
                id.write(writer);
            }
            Self::ArtworkSupply => 11u8.write(writer),
            Self::Fill(key) => {
                12u8.write(writer);
                key.write(writer);
            }
            Self::ArtworkIdentity(identity) => {
                13u8.write(writer);
                identity.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Account(PublicKey::read(reader)?),
            10 => Self::Artwork(u64::read(reader)?),
            11 => Self::ArtworkSupply,
            12 => Self::Fill(Digest::read(reader)?),
            13 => Self::ArtworkIdentity(Digest::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) => PublicKey::SIZE,
                Self::Artwork(_) => u64::SIZE,
                Self::ArtworkSupply => 0,
                Self::Fill(_) | Self::ArtworkIdentity(_) => Digest::SIZE,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    /// Account for nonce tracking (tag 0)
    Account(Account),

    // Artwork values (tags 10-13)
    Artwork(ArtworkToken),
    ArtworkSupply(u64),
    Fill(FillRecord),
    ArtworkIdentity(u64),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::Artwork(token) => {
                10u8.write(writer);
                token.write(writer);
            }
            Self::ArtworkSupply(supply) => {
                11u8.write(writer);
                supply.write(writer);
            }
            Self::Fill(record) => {
                12u8.write(writer);
                record.write(writer);
            }
            Self::ArtworkIdentity(token_id) => {
                13u8.write(writer);
                token_id.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Account(Account::read(reader)?),
            10 => Self::Artwork(ArtworkToken::read(reader)?),
            11 => Self::ArtworkSupply(u64::read(reader)?),
            12 => Self::Fill(FillRecord::read(reader)?),
            13 => Self::ArtworkIdentity(u64::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),
                Self::Artwork(token) => token.encode_size(),
                Self::ArtworkSupply(supply) => supply.encode_size(),
                Self::Fill(record) => record.encode_size(),
                Self::ArtworkIdentity(token_id) => token_id.encode_size(),
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Artwork events (tags 20-23)
    ArtworkMinted {
        token_id: u64,
        owner: PublicKey,
        identity: Digest,
        number: u64,
        opaque_pixels: u64,
    },
    /// Channel data was accepted but does not yet reproduce the identity hash.
    ArtworkFilled {
        identity: Digest,
        counters: ChannelCounters,
    },
    /// The accumulated channel data reproduces the identity hash.
    ArtworkRevealed {
        identity: Digest,
        counters: ChannelCounters,
    },
    ArtworkError {
        caller: PublicKey,
        token_id: Option<u64>,
        error_code: u8,
        message: String,
    },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::ArtworkMinted {
                token_id,
                owner,
                identity,
                number,
                opaque_pixels,
            } => {
                20u8.write(writer);
                token_id.write(writer);
                owner.write(writer);
                identity.write(writer);
                number.write(writer);
                opaque_pixels.write(writer);
            }
            Self::ArtworkFilled { identity, counters } => {
                21u8.write(writer);
                identity.write(writer);
                counters.write(writer);
            }
            Self::ArtworkRevealed { identity, counters } => {
                22u8.write(writer);
                identity.write(writer);
                counters.write(writer);
            }
            Self::ArtworkError {
                caller,
                token_id,
                error_code,
                message,
            } => {
                23u8.write(writer);
                caller.write(writer);
                token_id.write(writer);
                error_code.write(writer);
                write_string(message, writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            20 => Self::ArtworkMinted {
                token_id: u64::read(reader)?,
                owner: PublicKey::read(reader)?,
                identity: Digest::read(reader)?,
                number: u64::read(reader)?,
                opaque_pixels: u64::read(reader)?,
            },
            21 => Self::ArtworkFilled {
                identity: Digest::read(reader)?,
                counters: ChannelCounters::read(reader)?,
            },
            22 => Self::ArtworkRevealed {
                identity: Digest::read(reader)?,
                counters: ChannelCounters::read(reader)?,
            },
            23 => Self::ArtworkError {
                caller: PublicKey::read(reader)?,
                token_id: Option::<u64>::read(reader)?,
                error_code: u8::read(reader)?,
                message: read_string(reader, MAX_ERROR_MESSAGE_LENGTH)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::ArtworkMinted { .. } => {
                    u64::SIZE + PublicKey::SIZE + Digest::SIZE + u64::SIZE + u64::SIZE
                }
                Self::ArtworkFilled { .. } | Self::ArtworkRevealed { .. } => {
                    Digest::SIZE + ChannelCounters::SIZE
                }
                Self::ArtworkError {
                    token_id, message, ..
                } => {
                    PublicKey::SIZE
                        + token_id.encode_size()
                        + u8::SIZE
                        + string_encode_size(message)
                }
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Event(event) => event.encode_size(),
                Self::Transaction(transaction) => transaction.encode_size(),
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::{Channel, Word};
    use commonware_codec::{DecodeExt, Encode};
    use commonware_cryptography::{ed25519::PrivateKey, Hasher, Sha256};

    fn channels() -> ArtworkChannels {
        ArtworkChannels {
            pixel_groups: vec![Word::from_u64(1), Word::from_u64(2)],
            pixel_group_indexes: vec![Word::from_u64(10), Word::from_u64(50)],
            ..Default::default()
        }
    }

    #[test]
    fn transaction_signature_covers_instruction() {
        let private = PrivateKey::from_seed(7);
        let tx = Transaction::sign(
            &private,
            3,
            Instruction::RevealArtwork {
                token_id: 1,
                channels: channels(),
            },
        );
        assert!(tx.verify());

        let mut tampered = tx.clone();
        tampered.instruction = Instruction::RevealArtwork {
            token_id: 2,
            channels: channels(),
        };
        assert!(!tampered.verify());

        let decoded = Transaction::decode(tx.encode()).unwrap();
        assert_eq!(decoded, tx);
        assert!(decoded.verify());
    }

    #[test]
    fn mint_instruction_encodes_hint() {
        let instruction = Instruction::MintArtwork {
            name: "Tide".to_string(),
            channels: channels(),
            transparency_hint: vec![0, 1],
        };
        let encoded = instruction.encode();
        assert_eq!(encoded.len(), instruction.encode_size());
        assert_eq!(Instruction::decode(encoded).unwrap(), instruction);
    }

    #[test]
    fn oversized_name_is_rejected() {
        let instruction = Instruction::MintArtwork {
            name: "x".repeat(ARTWORK_MAX_NAME_LENGTH + 1),
            channels: ArtworkChannels::default(),
            transparency_hint: vec![],
        };
        assert!(Instruction::decode(instruction.encode()).is_err());
    }

    #[test]
    fn events_encode_with_declared_size() {
        let mut counters = ChannelCounters::default();
        counters.bump(Channel::PixelGroups);
        let identity = Sha256::hash(b"identity");
        let caller = PrivateKey::from_seed(1).public_key();
        let events = vec![
            Event::ArtworkMinted {
                token_id: 1,
                owner: caller.clone(),
                identity,
                number: 1,
                opaque_pixels: 80,
            },
            Event::ArtworkFilled { identity, counters },
            Event::ArtworkRevealed { identity, counters },
            Event::ArtworkError {
                caller,
                token_id: Some(1),
                error_code: crate::artwork::ERROR_INCORRECT_DATA,
                message: "incorrect data".to_string(),
            },
        ];
        for event in events {
            let output = Output::Event(event);
            let encoded = output.encode();
            assert_eq!(encoded.len(), output.encode_size());
            assert_eq!(Output::decode(encoded).unwrap(), output);
        }
    }

    #[test]
    fn fill_and_identity_keys_are_distinct() {
        let identity = Sha256::hash(b"artwork");
        let fill = Key::Fill(identity);
        let bound = Key::ArtworkIdentity(identity);
        assert_ne!(fill.encode(), bound.encode());
        for key in [fill, bound] {
            assert_eq!(key.encode().len(), key.encode_size());
            assert_eq!(Key::decode(key.encode()).unwrap(), key);
        }

        let value = Value::ArtworkIdentity(7);
        assert_eq!(Value::decode(value.encode()).unwrap(), value);
    }
}
