/*!
Inspect command - decode CBOR and display it in various formats
*/

use crate::io::{Input, Output};
use clap::Parser;
use scry_cbor::{decode, decode_with_source_map, diag, DecodeOptions};

/// Inspect and display CBOR data
#[derive(Parser, Debug)]
#[command(about = "Decode CBOR and display it", long_about = None)]
pub struct Command {
    /// Output format
    #[arg(
        long,
        default_value = "diag",
        value_name = "FORMAT",
        help = "Output format: diag/diagnostic (human-readable), map (source map as JSON), hex"
    )]
    format: OutputFormat,

    /// Treat the input as hex text rather than binary CBOR
    #[arg(short = 'x', long)]
    hex: bool,

    /// Validate RFC 8949 deterministic form while decoding
    #[arg(short = 'c', long)]
    canonical: bool,

    /// Fail on unknown tags and fully validate text-content tags
    #[arg(short = 's', long)]
    strict: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<Output>,

    /// Input CBOR file (use '-' for stdin)
    input: Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// CBOR Diagnostic Notation
    #[value(alias = "diagnostic")]
    Diag,
    /// The source map as JSON
    Map,
    /// Hexadecimal dump of the input
    Hex,
}

impl Command {
    pub fn exec(self) -> anyhow::Result<()> {
        let raw = self.input.read_all()?;
        let bytes = if self.hex {
            scry_cbor::hex::hex_to_bytes(String::from_utf8(raw)?.trim())?
        } else {
            raw
        };
        let options = DecodeOptions {
            validate_canonical: self.canonical,
            strict_tags: self.strict,
            ..Default::default()
        };

        let output_text = match self.format {
            OutputFormat::Diag => {
                let decoded = decode(&bytes, &options)?;
                diag::to_diagnostic(&decoded.value)
            }
            OutputFormat::Map => {
                let mapped = decode_with_source_map(&bytes, &options)?;
                serde_json::to_string_pretty(&mapped.source_map)?
            }
            OutputFormat::Hex => hex::encode(&bytes),
        };

        let output = self.output.unwrap_or(Output::Stdout);
        output.write_str(&output_text)?;

        // Trailing newline for terminal output
        if matches!(output, Output::Stdout) {
            println!();
        }

        Ok(())
    }
}
