use std::collections::BTreeMap;

use models::metadata;
use sha2::{Digest, Sha256};

/// Builds the metadata map a source-unit's chunks all share, before
/// `chunk`/`chunk_index`/`chunk_count`/`content_sha256`/`content_runes`
/// are filled in per-chunk (spec.md §3).
pub fn base_metadata(source_type: &str, source_ref: &str, extract_method: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(metadata::SOURCE_TYPE.to_string(), source_type.to_string());
    map.insert(metadata::SOURCE_REF.to_string(), source_ref.to_string());
    map.insert(metadata::EXTRACT_METHOD.to_string(), extract_method.to_string());
    map
}

/// Stamps per-chunk provenance (`chunk`, `content_sha256`,
/// `content_runes`) onto a cloned base metadata map.
pub fn annotate_chunk(base: &BTreeMap<String, String>, ordinal: usize, content: &str) -> BTreeMap<String, String> {
    let mut map = base.clone();
    map.insert(metadata::CHUNK.to_string(), ordinal.to_string());
    map.insert(metadata::CONTENT_SHA256.to_string(), sha256_hex(content));
    map.insert(metadata::CONTENT_RUNES.to_string(), content.chars().count().to_string());
    map
}

pub fn sha256_hex(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)
}
