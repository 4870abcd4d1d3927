use {
    crate::{hash::SlotCount, Error},
    serde::{Deserialize, Serialize},
};

/// Ring size used when none is configured.
pub const DEFAULT_TOTAL_SLOTS: u64 = 50;

/// Ring configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RingConfig {
    /// Number of slots on the ring, in `1..=MAX_TOTAL_SLOTS`.
    pub total_slots: u64,
}

impl Default for RingConfig {
    fn default() -> Self {
        RingConfig {
            total_slots: DEFAULT_TOTAL_SLOTS,
        }
    }
}

impl RingConfig {
    pub fn with_total_slots(mut self, total_slots: u64) -> Self {
        self.total_slots = total_slots;
        self
    }

    /// Checks the configuration, returning the validated slot count.
    pub fn validate(&self) -> Result<SlotCount, Error> {
        SlotCount::new(self.total_slots)
    }
}
