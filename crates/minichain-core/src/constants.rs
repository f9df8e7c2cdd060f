/// Hex-zero prefix a puzzle digest must carry to count as solved.
pub const DIFFICULTY_PREFIX: &str = "0000";

pub const GENESIS_PROOF: u64 = 1;
pub const GENESIS_PREVIOUS_HASH: &str = "0";

pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
