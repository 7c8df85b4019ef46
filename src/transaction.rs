//! Transaction type for Replichain

use serde::{Deserialize, Serialize};

/// A single transfer record.
///
/// Transactions live in the ledger's pending pool until a mined block seals
/// them, after which they are owned by that block and never mutated again.
/// The serialized field names are part of the wire format shared by every
/// node; changing them breaks cross-node hash agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    /// Milliseconds since the UNIX epoch, taken when the transfer was submitted.
    pub initiation_timestamp: u64,
    /// Index of the block that sealed this transaction. Present on the wire
    /// for compatibility; the mining path does not populate it.
    pub resolved_in: Option<u64>,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            initiation_timestamp: chrono::Utc::now().timestamp_millis() as u64,
            resolved_in: None,
        }
    }
}
