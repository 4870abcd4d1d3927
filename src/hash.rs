//! Hash functions mapping arbitrary bytes onto ring slots.
//!
//! A `SlotHasher` produces a signed 64-bit digest; the provided
//! [`SlotHasher::slot`] method reduces it into `[0, total_slots)`. The
//! reduction takes the remainder first and the absolute value second, so a
//! negative digest never yields a negative (or out of range) slot.

use {
    crate::Error,
    sha2::{Digest, Sha256},
    siphasher::sip::SipHasher13,
    std::hash::Hasher,
};

/// Largest slot count the signed reduction can handle.
pub const MAX_TOTAL_SLOTS: u64 = i64::MAX as u64;

/// Number of slots on a ring, in `1..=MAX_TOTAL_SLOTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotCount(u64);

impl SlotCount {
    pub fn new(total_slots: u64) -> Result<Self, Error> {
        if (1..=MAX_TOTAL_SLOTS).contains(&total_slots) {
            Ok(SlotCount(total_slots))
        } else {
            Err(Error::InvalidSlotCount(total_slots))
        }
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for SlotCount {
    type Error = Error;

    fn try_from(total_slots: u64) -> Result<Self, Self::Error> {
        Self::new(total_slots)
    }
}

pub trait SlotHasher: Clone {
    /// Returns the signed 64-bit digest of `input`.
    fn digest(&self, input: &[u8]) -> i64;

    /// Maps `input` onto a slot in `[0, total_slots)`.
    #[inline]
    fn slot(&self, input: &[u8], total_slots: SlotCount) -> u64 {
        reduce(self.digest(input), total_slots)
    }
}

/// Reduces a signed digest into `[0, total_slots)`.
#[inline]
pub fn reduce(digest: i64, total_slots: SlotCount) -> u64 {
    // A divisor in 1..=i64::MAX never overflows the signed remainder.
    (digest % total_slots.0 as i64).unsigned_abs()
}

/// Default slot hasher. Takes the low 64 bits of the SHA-256 digest (its last
/// eight bytes, big-endian) as a signed integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl SlotHasher for Sha256Hasher {
    fn digest(&self, input: &[u8]) -> i64 {
        let hash = Sha256::digest(input);
        let mut low = [0u8; 8];
        low.copy_from_slice(&hash[24..]);
        i64::from_be_bytes(low)
    }
}

const SIP_KEYS: (u64, u64) = (0x736c_6f74_7269_6e67, 0x0f0e_0d0c_0b0a_0908);

/// SipHash-1-3 slot hasher with fixed keys, so slots agree across processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SipSlotHasher;

impl SlotHasher for SipSlotHasher {
    fn digest(&self, input: &[u8]) -> i64 {
        let mut hasher = SipHasher13::new_with_keys(SIP_KEYS.0, SIP_KEYS.1);
        hasher.write(input);
        hasher.finish() as i64
    }
}
