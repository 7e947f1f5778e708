//! Deterministic Hash Sampler
//!
//! Derives repeatable floats in [0,1) from SHA-256 digests of the input.
//! Only used to mint display identifiers; scores never read from it.

use sha2::{Digest, Sha256};

const SAMPLE_MODULUS: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashSampler {
    seed: u64,
}

impl HashSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from text plus ordered history. History lines are joined with `\n`
    /// so that their order is part of the digest.
    pub fn from_input(text: &str, history: &[String]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        if !history.is_empty() {
            hasher.update(history.join("\n").as_bytes());
        }
        let digest = hasher.finalize();
        Self::new(Self::leading_u64(&digest))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Float in [0,1) for `index`: digest of (8-byte BE seed ∥ 4-byte BE index),
    /// leading 8 bytes reduced mod 10⁹.
    pub fn sample(&self, index: u32) -> f64 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_be_bytes());
        hasher.update(index.to_be_bytes());
        let digest = hasher.finalize();
        let value = Self::leading_u64(&digest);
        (value % SAMPLE_MODULUS) as f64 / SAMPLE_MODULUS as f64
    }

    fn leading_u64(digest: &[u8]) -> u64 {
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_is_reproducible() {
        let a = HashSampler::from_input("inventory delay", &["prev".to_string()]);
        let b = HashSampler::from_input("inventory delay", &["prev".to_string()]);
        assert_eq!(a.seed(), b.seed());
        for idx in 0..32 {
            assert_eq!(a.sample(idx).to_bits(), b.sample(idx).to_bits());
        }
    }

    #[test]
    fn test_known_seed_and_sample() {
        // BE seed from the digest head, then digest of (BE seed ∥ BE index)
        let sampler = HashSampler::from_input("everything looks fine", &[]);
        assert_eq!(sampler.seed(), 5385334496951482901);
        assert_eq!(sampler.sample(1000), 0.57954194);

        let with_history =
            HashSampler::from_input("everything looks fine", &["calm morning".to_string(), "then a delay".to_string()]);
        assert_eq!(with_history.seed(), 2504279754281737167);
        assert_eq!(with_history.sample(1000), 0.193352043);
    }

    #[test]
    fn test_history_order_changes_seed() {
        let ab = HashSampler::from_input("x", &["a".to_string(), "b".to_string()]);
        let ba = HashSampler::from_input("x", &["b".to_string(), "a".to_string()]);
        assert_ne!(ab.seed(), ba.seed());
    }

    #[test]
    fn test_samples_stay_in_half_open_unit_range() {
        let sampler = HashSampler::from_input("", &[]);
        for idx in 0..256 {
            let r = sampler.sample(idx);
            assert!((0.0..1.0).contains(&r));
        }
    }
}
