//! Development tool: mint and reveal an artwork against an in-memory ledger.
//!
//! Reads the channels from a JSON file (hex words per channel), optionally a JSON
//! `ArtworkConfig`, then executes a mint followed by a reveal and prints the resulting events.

use clap::Parser;
use commonware_runtime::{deterministic, Runner};
use commonware_utils::hex;
use pixelspace_execution::{
    fill_completion_status,
    mocks::{create_account_keypair, create_store_owner_keypair},
    Layer, Memory, State,
};
use pixelspace_types::{
    execution::{Instruction, Output, Transaction},
    identity_hash, ArtworkChannels, ArtworkConfig,
};
use std::fs;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mint and reveal an artwork locally")]
struct Args {
    /// Channels JSON file.
    #[arg(short, long)]
    artwork: String,

    /// ArtworkConfig JSON file (defaults apply when omitted).
    #[arg(short, long)]
    config: Option<String>,

    #[arg(short, long, default_value = "untitled")]
    name: String,

    /// Group indexes whose transparency is honored.
    #[arg(long, value_delimiter = ',')]
    hint: Vec<u32>,

    /// Reveal with one corrupted word to exercise the rejection path.
    #[arg(long)]
    corrupt: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = match &args.config {
        Some(path) => ArtworkConfig::from_json(&fs::read_to_string(path)?)?,
        None => ArtworkConfig::default(),
    };
    let channels: ArtworkChannels = serde_json::from_str(&fs::read_to_string(&args.artwork)?)?;
    let identity = identity_hash(&channels);
    info!(identity = %hex(identity.as_ref()), words = channels.total_words(), "loaded artwork");

    let mut revealed = channels.clone();
    if args.corrupt {
        let word = revealed
            .individual_pixels
            .first_mut()
            .or_else(|| revealed.pixel_groups.first_mut())
            .ok_or("artwork has no pixel words to corrupt")?;
        word.0[31] ^= 1;
    }

    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut state = Memory::default();
        let (_, store_owner) = create_store_owner_keypair();
        let (holder, _) = create_account_keypair(1);
        let txs = vec![
            Transaction::sign(
                &holder,
                0,
                Instruction::MintArtwork {
                    name: args.name,
                    channels,
                    transparency_hint: args.hint,
                },
            ),
            Transaction::sign(
                &holder,
                1,
                Instruction::RevealArtwork {
                    token_id: 1,
                    channels: revealed,
                },
            ),
        ];

        let mut layer = Layer::new(&state, config, store_owner);
        let (outputs, _) = layer.execute(txs).await?;
        for output in outputs {
            if let Output::Event(event) = output {
                println!("{event:?}");
            }
        }
        let changes = layer.commit();
        state.apply(changes).await?;

        let counters = fill_completion_status(&state, &identity).await?;
        println!("counters {:?}", counters.0);
        Ok::<_, anyhow::Error>(())
    })?;

    Ok(())
}
