use crate::constants::DIFFICULTY_PREFIX;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Digest of the puzzle operation for a candidate proof.
///
/// The operation is deliberately asymmetric in its two inputs; the square
/// difference may be negative, so it is taken in i128 and hashed in its
/// signed-decimal form.
fn puzzle_digest(previous_proof: u64, proof: u64) -> String {
    let gap =
        (proof as i128) * (proof as i128) - (previous_proof as i128) * (previous_proof as i128);
    hex::encode(Sha256::digest(gap.to_string().as_bytes()))
}

/// Pure re-check of a candidate proof against the difficulty predicate.
pub fn verify(previous_proof: u64, proof: u64) -> bool {
    puzzle_digest(previous_proof, proof).starts_with(DIFFICULTY_PREFIX)
}

/// Brute-force the smallest proof satisfying [`verify`].
///
/// The search is unbounded by construction; callers that need to stay
/// responsive run it on a worker and impose their own deadline.
pub fn solve(previous_proof: u64) -> u64 {
    let mut proof: u64 = 1;
    while !verify(previous_proof, proof) {
        proof += 1;
    }
    debug!(previous_proof, proof, "proof-of-work search finished");
    proof
}
