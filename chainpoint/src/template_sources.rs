use serde::Deserialize;

/// A contract discovered at runtime (e.g. through a factory) that must be
/// watched going forward. Append-only: created once per discovery, read
/// exhaustively at startup, never updated or deleted here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateSource {
    pub id: i32,
    pub contract_address: String,
    pub start_block: i64,
    pub template: String,
}

impl TemplateSource {
    pub fn get_start_block(&self) -> u64 {
        self.start_block as u64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsavedTemplateSource {
    pub contract_address: String,
    pub start_block: i64,
    pub template: String,
}

impl UnsavedTemplateSource {
    pub fn new(contract_address: &str, start_block: u64, template: &str) -> Self {
        Self {
            contract_address: contract_address.to_lowercase(),
            start_block: start_block as i64,
            template: template.to_string(),
        }
    }
}
