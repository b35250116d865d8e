use clap::Parser;

use zbnet_cat::FrameParser;

/// `cat` for the frames spoken by the zbnet stack: an IEEE 802.15.4 MAC
/// frame given as hex, with any NWK frame inside it decoded as well.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The frame to parse, as a hex string without the FCS.
    #[clap(value_parser(clap::builder::NonEmptyStringValueParser::new()))]
    input: String,
}

fn main() {
    let args = Args::parse();

    match FrameParser::parse_hex(&args.input) {
        Ok(output) => print!("{output}"),
        Err(_) => {
            eprintln!("not a valid frame");
            std::process::exit(1);
        }
    }
}
