//! Client id generation
//!
//! Ids are `CLIENT_ID_LEN` characters drawn uniformly from lowercase ASCII
//! letters and digits. Uniqueness is only as good as the birthday bound of
//! 36^7; collisions with a live client surface as `AlreadySubscribed`.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::broker::message::ClientId;

pub const CLIENT_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
pub const CLIENT_ID_LEN: usize = 7;

/// Source of fresh client ids. Constructed once and shared by the HTTP layer.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> ClientId;
}

/// Random generator seeded once at construction.
#[derive(Debug)]
pub struct RandomIdGenerator {
    rng: Mutex<StdRng>,
}

impl RandomIdGenerator {
    /// Seed from operating system entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator, useful in tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> ClientId {
        let mut rng = self.rng.lock();
        (0..CLIENT_ID_LEN)
            .map(|_| CLIENT_ID_ALPHABET[rng.gen_range(0..CLIENT_ID_ALPHABET.len())] as char)
            .collect()
    }
}
