use ethers::utils::{hex, keccak256};
use serde::Deserialize;

/// Derives the storage identifier for a (contract, block) pair.
///
/// Pure and deterministic: the lowercased contract address concatenated
/// with the block number's decimal text is hashed with keccak256 and
/// hex-encoded. Duplicate submissions of the same pair therefore collapse
/// onto the same row, with deduplication delegated entirely to the
/// primary-key conflict path of the storage engine.
pub fn derive_checkpoint_id(contract_address: &str, block_number: u64) -> String {
    let preimage = format!("{}{}", contract_address.to_lowercase(), block_number);

    hex::encode(keccak256(preimage.as_bytes()))
}

/// A checkpoint not yet persisted: contract C had at least one indexable
/// event at block B.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsavedCheckpoint {
    pub id: String,
    pub block_number: i64,
    pub contract_address: String,
}

impl UnsavedCheckpoint {
    pub fn new(contract_address: &str, block_number: u64) -> Self {
        Self {
            id: derive_checkpoint_id(contract_address, block_number),
            block_number: block_number as i64,
            contract_address: contract_address.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub block_number: i64,
    pub contract_address: String,
}

impl Checkpoint {
    pub fn get_block_number(&self) -> u64 {
        self.block_number as u64
    }
}
