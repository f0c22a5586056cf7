/*!
scry - a CLI for inspecting CBOR data

# Examples

```bash
# Diagnostic notation from a hex string
echo 83010203 | scry inspect --hex -

# Source map as JSON, for driving a hex-to-value view
scry inspect --format map datum.cbor

# Canonical-form validation of a Plutus datum
scry inspect --canonical --hex datum.hex
```
*/

use clap::{Parser, Subcommand};

mod inspect;
mod io;

/// A CLI tool for inspecting CBOR data
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Inspect CBOR: diagnostic notation, byte-range source maps, Plutus data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode CBOR and display it in various formats
    Inspect(inspect::Command),
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Commands::Inspect(args) => args.exec(),
    }
}
