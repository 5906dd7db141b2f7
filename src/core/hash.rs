//! State Hashing
//!
//! SHA-256 digests of game state, used to check that a replayed
//! playthrough ends in exactly the same state as the first run.
//!
//! The byte layout is part of the replay format: fields go in a fixed
//! order, integers little-endian, strings and collections length-prefixed,
//! maps and sets in sorted order.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Domain tag for game state snapshots.
const STATE_DOMAIN: &[u8] = b"STAGE_QUEST_STATE_V1";

/// A value with a fixed byte encoding inside a state hash.
pub trait HashField {
    /// Append this value's encoding.
    fn feed(&self, hasher: &mut Sha256);
}

impl HashField for u8 {
    fn feed(&self, hasher: &mut Sha256) {
        hasher.update([*self]);
    }
}

impl HashField for bool {
    fn feed(&self, hasher: &mut Sha256) {
        u8::from(*self).feed(hasher);
    }
}

impl HashField for u32 {
    fn feed(&self, hasher: &mut Sha256) {
        hasher.update(self.to_le_bytes());
    }
}

impl HashField for u64 {
    fn feed(&self, hasher: &mut Sha256) {
        hasher.update(self.to_le_bytes());
    }
}

impl HashField for usize {
    fn feed(&self, hasher: &mut Sha256) {
        (*self as u64).feed(hasher);
    }
}

impl HashField for str {
    fn feed(&self, hasher: &mut Sha256) {
        (self.len() as u32).feed(hasher);
        hasher.update(self.as_bytes());
    }
}

/// Deterministic hasher for game state.
pub struct StateHasher {
    digest: Sha256,
}

impl StateHasher {
    /// Hasher seeded with a domain tag.
    pub fn new(domain: &[u8]) -> Self {
        Self { digest: Sha256::new_with_prefix(domain) }
    }

    /// Hasher for `GameState` snapshots.
    pub fn for_game_state() -> Self {
        Self::new(STATE_DOMAIN)
    }

    /// Append one field.
    #[inline]
    pub fn field<T: HashField + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.feed(&mut self.digest);
        self
    }

    /// Append a collection length. Call before feeding its entries.
    #[inline]
    pub fn len_prefix(&mut self, len: usize) -> &mut Self {
        self.field(&(len as u32))
    }

    /// Finish and return the digest.
    pub fn finalize(self) -> StateHash {
        self.digest.finalize().into()
    }
}

/// Hash the stage index and score, then whatever `add_state` feeds.
pub fn compute_state_hash<F>(stage: u8, score: u32, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_game_state();
    hasher.field(&stage).field(&score);
    add_state(&mut hasher);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(build: impl FnOnce(&mut StateHasher)) -> StateHash {
        let mut hasher = StateHasher::new(b"test");
        build(&mut hasher);
        hasher.finalize()
    }

    #[test]
    fn test_same_fields_same_digest() {
        let feed = |h: &mut StateHasher| {
            h.field(&100u32).field(&12345u64).field("q1").field(&true);
        };
        assert_eq!(digest(feed), digest(feed));
    }

    #[test]
    fn test_field_order_matters() {
        let a = digest(|h| {
            h.field(&1u32).field(&2u32);
        });
        let b = digest(|h| {
            h.field(&2u32).field(&1u32);
        });
        assert_ne!(a, b);
    }

    #[test]
    fn test_strings_are_length_prefixed() {
        let a = digest(|h| {
            h.field("ab").field("c");
        });
        let b = digest(|h| {
            h.field("a").field("bc");
        });
        assert_ne!(a, b);
    }

    #[test]
    fn test_domain_separates() {
        let mut a = StateHasher::new(b"one");
        let mut b = StateHasher::new(b"two");
        a.field(&7u8);
        b.field(&7u8);
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_compute_state_hash() {
        let hash = compute_state_hash(2, 150, |h| {
            h.field(&true);
        });
        let same = compute_state_hash(2, 150, |h| {
            h.field(&true);
        });
        assert_eq!(hash, same);
        assert_ne!(hash, compute_state_hash(3, 150, |h| {
            h.field(&true);
        }));
        assert_ne!(hash, compute_state_hash(2, 151, |h| {
            h.field(&true);
        }));
    }
}
