//! Proof-of-work puzzle
//!
//! The puzzle is a deliberately simple leading-zero search: find the smallest
//! `proof` such that SHA-256 of the decimal concatenation
//! `"{last_proof}{proof}"` starts with [`difficulty`] zero hex characters.
//! There is no shortcut; the miner scans from zero, which is the intended
//! work-imposing property. Mining and chain-side checks share the single
//! [`valid_proof`] predicate.

use crate::error::{ChainError, Result};
use sha2::{Digest, Sha256};

/// Default number of leading zero hex characters a winning digest must have.
///
/// Deployments have run with both 4 and 5; the target is a config knob
/// (`mining.difficulty`) rather than a constant baked into the predicate.
/// At 4, the expected search length is about 16^4 = 65,536 attempts.
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Default upper bound on the proof search, roughly a thousand times the
/// expectation at [`DEFAULT_DIFFICULTY`].
pub const DEFAULT_MAX_ATTEMPTS: u64 = 67_108_864;

/// Does `proof` solve the puzzle posed by `last_proof`?
///
/// Deterministic: identical inputs always produce the same answer.
pub fn valid_proof(last_proof: u64, proof: u64, difficulty: u32) -> bool {
    let guess = format!("{}{}", last_proof, proof);
    let digest = hex::encode(Sha256::digest(guess.as_bytes()));
    digest
        .as_bytes()
        .iter()
        .take(difficulty as usize)
        .all(|b| *b == b'0')
}

/// Scan proofs from 0 upward until [`valid_proof`] holds.
///
/// Returns the smallest winning proof. The search is bounded by
/// `max_attempts` so a misconfigured difficulty cannot wedge a worker
/// forever; exhaustion surfaces as [`ChainError::ProofSearchExhausted`].
/// CPU-bound: callers on an async runtime should run this on a blocking
/// worker.
pub fn proof_of_work(last_proof: u64, difficulty: u32, max_attempts: u64) -> Result<u64> {
    for proof in 0..max_attempts {
        if valid_proof(last_proof, proof, difficulty) {
            return Ok(proof);
        }
    }
    Err(ChainError::ProofSearchExhausted(max_attempts))
}
