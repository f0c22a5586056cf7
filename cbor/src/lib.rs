/*!
An RFC 8949 CBOR engine built for inspection work: decoding under strict
resource limits, deterministic-form (canonical) validation, a byte-range
source map for hex-to-value visualization, and the Cardano Plutus Data tag
family (102, 121..=127, 1280..=1400).

Decoding and encoding are pure synchronous functions over owned memory; a
call touches no shared state, so callers may run any number of them in
parallel.

```rust
use scry_cbor::{decode_hex, DecodeOptions};

let decoded = decode_hex("83010203", &DecodeOptions::default()).unwrap();
assert_eq!(scry_cbor::diag::to_diagnostic(&decoded.value), "[1, 2, 3]");
```
*/

pub mod decode;
pub mod diag;
pub mod encode;
pub mod hex;

mod error;
mod float;
mod limits;
mod plutus;
mod source_map;
mod tags;
mod value;

pub use decode::{
    decode, decode_hex, decode_sequence, decode_with_source_map, decode_with_source_map_hex,
    Decoded, SourceMapped,
};
pub use encode::{encode, encode_hex, encode_sequence, EncodeOptions};
pub use error::{Error, ErrorKind};
pub use limits::DecodeOptions;
pub use plutus::PlutusData;
pub use source_map::SourceMapEntry;
pub use value::{FloatWidth, Value};



#[cfg(test)]
mod source_map_tests;
