//! Initialization vector sources.
//!
//! Reusing an IV under a fixed CBC key lets an observer correlate identical
//! credentials, so every request draws a fresh one. Two sources exist:
//!
//! - [`OsIvSource`] reads the operating system CSPRNG (`getrandom`). On boards
//!   with a hardware TRNG the kernel pool is fed from it. This is the default.
//! - [`ReseedingIvSource`] runs ChaCha20 in user space and reseeds it from the
//!   operating system every [`IV_RESEED_INTERVAL`] vectors. Use it where
//!   system calls per request are too costly.
//!
//! An entropy failure is returned as [`Error::Entropy`]; no source ever falls
//! back to a constant or previously used vector.

use doorgate_core::constants::{IV_RESEED_INTERVAL, IV_SIZE};
use doorgate_core::{Error, Result};
use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::debug;

/// Produces one fresh IV per call.
pub trait IvSource {
    /// # Errors
    /// Returns `Error::Entropy` if the underlying generator fails.
    fn next_iv(&mut self) -> Result<[u8; IV_SIZE]>;
}

/// IVs straight from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsIvSource;

impl IvSource for OsIvSource {
    fn next_iv(&mut self) -> Result<[u8; IV_SIZE]> {
        let mut iv = [0u8; IV_SIZE];
        OsRng
            .try_fill_bytes(&mut iv)
            .map_err(|e| Error::Entropy(e.to_string()))?;
        Ok(iv)
    }
}

/// ChaCha20 generator periodically reseeded from the operating system.
pub struct ReseedingIvSource {
    rng: ChaCha20Rng,
    drawn: u64,
    interval: u64,
}

impl ReseedingIvSource {
    /// Seed from the operating system with the default reseed interval.
    ///
    /// # Errors
    /// Returns `Error::Entropy` if seeding fails.
    pub fn new() -> Result<Self> {
        Self::with_interval(IV_RESEED_INTERVAL)
    }

    /// Seed from the operating system, reseeding every `interval` IVs.
    ///
    /// # Errors
    /// Returns `Error::Entropy` if seeding fails and `Error::Config` for a
    /// zero interval.
    pub fn with_interval(interval: u64) -> Result<Self> {
        if interval == 0 {
            return Err(Error::Config("IV reseed interval must be > 0".to_string()));
        }
        Ok(Self {
            rng: seed_from_os()?,
            drawn: 0,
            interval,
        })
    }

    /// Number of IVs drawn since the last reseed.
    pub fn drawn_since_reseed(&self) -> u64 {
        self.drawn
    }
}

impl std::fmt::Debug for ReseedingIvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReseedingIvSource")
            .field("drawn", &self.drawn)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl IvSource for ReseedingIvSource {
    fn next_iv(&mut self) -> Result<[u8; IV_SIZE]> {
        if self.drawn >= self.interval {
            debug!(drawn = self.drawn, "Reseeding IV generator");
            self.rng = seed_from_os()?;
            self.drawn = 0;
        }

        let mut iv = [0u8; IV_SIZE];
        self.rng.fill_bytes(&mut iv);
        self.drawn += 1;
        Ok(iv)
    }
}

fn seed_from_os() -> Result<ChaCha20Rng> {
    ChaCha20Rng::from_rng(OsRng).map_err(|e| Error::Entropy(e.to_string()))
}

impl<T: IvSource + ?Sized> IvSource for Box<T> {
    fn next_iv(&mut self) -> Result<[u8; IV_SIZE]> {
        (**self).next_iv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_distinct(source: &mut impl IvSource, count: usize) {
        let mut seen = HashSet::with_capacity(count);
        for _ in 0..count {
            assert!(seen.insert(source.next_iv().unwrap()), "IV repeated");
        }
    }

    #[test]
    fn test_os_source_distinct() {
        assert_distinct(&mut OsIvSource, 10_000);
    }

    #[test]
    fn test_reseeding_source_distinct_across_reseeds() {
        let mut source = ReseedingIvSource::with_interval(64).unwrap();
        assert_distinct(&mut source, 10_000);
    }

    #[test]
    fn test_reseed_counter_wraps() {
        let mut source = ReseedingIvSource::with_interval(3).unwrap();
        for _ in 0..3 {
            source.next_iv().unwrap();
        }
        assert_eq!(source.drawn_since_reseed(), 3);

        source.next_iv().unwrap();
        assert_eq!(source.drawn_since_reseed(), 1);
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            ReseedingIvSource::with_interval(0),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_boxed_source() {
        let mut source: Box<dyn IvSource> = Box::new(OsIvSource);
        let a = source.next_iv().unwrap();
        let b = source.next_iv().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_iv_not_all_zero() {
        // 2^-128 chance of a false failure.
        assert_ne!(OsIvSource.next_iv().unwrap(), [0u8; IV_SIZE]);
    }
}
