//! Serializes and deserializes an [`Index`] to/from its on-disk JSON
//! form.
//!
//! Wire shape: `{"by_schema": {...}, "by_package": {...}, "by_name": {...}}`
//! where each value maps a string key to an array of `[offset, length]`
//! pairs. The 2-element array shape is part of the compatibility contract,
//! not an implementation detail — do not change it to an object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Index, Section};

#[derive(Serialize, Deserialize)]
struct WireIndex {
    by_schema: BTreeMap<String, Vec<(u64, u64)>>,
    by_package: BTreeMap<String, Vec<(u64, u64)>>,
    by_name: BTreeMap<String, Vec<(u64, u64)>>,
}

fn to_wire(sections: &BTreeMap<String, Vec<Section>>) -> BTreeMap<String, Vec<(u64, u64)>> {
    sections
        .iter()
        .map(|(k, v)| (k.clone(), v.iter().map(|s| (s.offset, s.length)).collect()))
        .collect()
}

fn from_wire(wire: BTreeMap<String, Vec<(u64, u64)>>) -> BTreeMap<String, Vec<Section>> {
    wire.into_iter()
        .map(|(k, v)| {
            (
                k,
                v.into_iter().map(|(o, l)| Section::new(o, l)).collect(),
            )
        })
        .collect()
}

/// Serializes an [`Index`] to its JSON wire form.
pub fn encode(index: &Index) -> serde_json::Result<Vec<u8>> {
    let wire = WireIndex {
        by_schema: to_wire(&index.by_schema),
        by_package: to_wire(&index.by_package),
        by_name: to_wire(&index.by_name),
    };
    serde_json::to_vec(&wire)
}

/// Writes an [`Index`] directly to a writer, avoiding an intermediate
/// buffer for large indexes.
pub fn encode_to<W: std::io::Write>(index: &Index, writer: W) -> serde_json::Result<()> {
    let wire = WireIndex {
        by_schema: to_wire(&index.by_schema),
        by_package: to_wire(&index.by_package),
        by_name: to_wire(&index.by_name),
    };
    serde_json::to_writer(writer, &wire)
}

/// Parses an [`Index`] from its JSON wire form.
pub fn decode(bytes: &[u8]) -> serde_json::Result<Index> {
    let wire: WireIndex = serde_json::from_slice(bytes)?;
    Ok(Index {
        by_schema: from_wire(wire.by_schema),
        by_package: from_wire(wire.by_package),
        by_name: from_wire(wire.by_name),
    })
}

/// Parses an [`Index`] from a reader.
pub fn decode_from<R: std::io::Read>(reader: R) -> serde_json::Result<Index> {
    let wire: WireIndex = serde_json::from_reader(reader)?;
    Ok(Index {
        by_schema: from_wire(wire.by_schema),
        by_package: from_wire(wire.by_package),
        by_name: from_wire(wire.by_name),
    })
}
