use commonware_utils::hex;
use pixelspace_types::{identity_hash, ArtworkChannels, Channel};
use std::{env, fs};

fn main() {
    let path = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("usage: artwork_hash <channels.json>");
        std::process::exit(1);
    });

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("could not read {path}: {err}");
            std::process::exit(1);
        }
    };

    let channels: ArtworkChannels = match serde_json::from_str(&raw) {
        Ok(channels) => channels,
        Err(err) => {
            eprintln!("invalid channels: {err}");
            std::process::exit(1);
        }
    };

    for channel in Channel::ALL {
        println!("{:<32} {}", channel.as_str(), channels.channel(channel).len());
    }
    println!("identity {}", hex(identity_hash(&channels).as_ref()));
}
