use commonware_codec::ReadExt;
use commonware_utils::from_hex_formatted;
use pixelspace_types::execution::Output;
use std::env;

fn main() {
    let hex_str = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("usage: decode_output <hex>");
        std::process::exit(1);
    });

    let bytes = match from_hex_formatted(hex_str.trim()) {
        Some(bytes) => bytes,
        None => {
            eprintln!("invalid hex string");
            std::process::exit(1);
        }
    };

    let mut buf = bytes.as_slice();
    let output = match Output::read(&mut buf) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("decode error: {err}");
            std::process::exit(1);
        }
    };

    match output {
        Output::Event(event) => println!("event {event:?}"),
        Output::Transaction(tx) => println!(
            "tx nonce={} verified={} instruction={:?}",
            tx.nonce,
            tx.verify(),
            tx.instruction
        ),
    }
    println!("remaining bytes: {}", buf.len());
}
