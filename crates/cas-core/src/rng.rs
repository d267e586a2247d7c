//! Deterministic simulation RNG wrapper and replica seed mixing.
//!
//! # Determinism strategy
//!
//! Every replica of a job gets its own `SmallRng` seeded by:
//!
//!   seed = job_seed XOR (replica * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive replica ids uniformly across the seed space.
//! A replica therefore produces the same trajectory whether it runs locally,
//! on a rayon worker thread, or on a remote worker after being rescheduled.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::ReplicaId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seed for replica `replica` of a job seeded with `job_seed`.
#[inline]
pub fn replica_seed(job_seed: u64, replica: ReplicaId) -> u64 {
    job_seed ^ replica.0.wrapping_mul(MIXING_CONSTANT)
}

/// Simulation RNG.
///
/// Owned by exactly one simulation run.  Implements [`RngCore`] so it can be
/// handed to anything generic over `rand::Rng` (probability vectors sample
/// through it directly).
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// RNG for one replica of a job.
    pub fn for_replica(job_seed: u64, replica: ReplicaId) -> Self {
        Self::new(replica_seed(job_seed, replica))
    }
}

impl RngCore for SimRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}
