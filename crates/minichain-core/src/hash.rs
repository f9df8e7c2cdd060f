use crate::Block;
use sha2::{Digest, Sha256};

/// SHA-256 of a block's canonical JSON form, as 64 lowercase hex chars.
///
/// The block is first converted to a `serde_json::Value`, whose object maps
/// are BTree-backed, so keys come out sorted and two structurally identical
/// blocks always hash identically regardless of field insertion order.
pub fn block_hash(block: &Block) -> String {
    let value = serde_json::to_value(block).expect("block serializes to JSON");
    hex::encode(Sha256::digest(value.to_string().as_bytes()))
}
