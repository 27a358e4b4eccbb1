use chainpoint::UnsavedCheckpoint;
use rand::Rng;

/// A unique, well-formed EVM address per call so concurrently running
/// tests never share checkpoint rows.
pub fn random_contract_address() -> String {
    let bytes: [u8; 20] = rand::thread_rng().gen();

    let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();

    format!("0x{hex}")
}

pub fn checkpoints_at(contract_address: &str, block_numbers: &[u64]) -> Vec<UnsavedCheckpoint> {
    block_numbers
        .iter()
        .map(|block_number| UnsavedCheckpoint::new(contract_address, *block_number))
        .collect()
}
