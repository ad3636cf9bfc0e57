use std::fmt;

/// Slot occupancy statistics of a bucket array.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MapInfo {
    /// The number of buckets.
    pub slots: usize,

    /// The number of entries.
    pub len: usize,

    /// The number of non-empty buckets.
    pub occupied_slots: usize,

    /// The number of entries that are not the head of their bucket chain.
    pub excess_entries: usize,
}

impl MapInfo {
    /// Returns the ratio of entries sharing a bucket with an earlier entry to all the entries.
    ///
    /// `0.0` means no collision at all.
    #[allow(clippy::cast_precision_loss)]
    #[inline]
    #[must_use]
    pub fn collision_level(&self) -> f64 {
        if self.len == 0 {
            0.0
        } else {
            self.excess_entries as f64 / self.len as f64
        }
    }
}

impl fmt::Display for MapInfo {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total slots: {}, total item count: {}",
            self.slots, self.len
        )?;
        writeln!(f, "Num of slots non-empty: {}", self.occupied_slots)?;
        write!(f, "Collision level: {}", self.collision_level())
    }
}
