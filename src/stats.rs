/// Chain length summary of an [`ArrayMap`](crate::ArrayMap).
///
/// Taken by walking every bucket, so it is only exact once writers are quiet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainStats {
    /// Number of buckets.
    pub buckets: usize,
    /// Buckets holding at least one entry.
    pub occupied: usize,
    /// Buckets holding two or more entries.
    pub collided: usize,
    /// Length of the longest chain.
    pub longest: usize,
    /// Entries found across all chains.
    pub entries: usize,
}

impl ChainStats {
    pub(crate) fn new(buckets: usize) -> Self {
        Self {
            buckets,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, len: usize) {
        self.entries += len;
        self.longest = self.longest.max(len);
        if len >= 1 {
            self.occupied += 1;
        }
        if len >= 2 {
            self.collided += 1;
        }
    }

    /// Entries per bucket.
    pub fn load_factor(&self) -> f64 {
        if self.buckets == 0 {
            return 0.0;
        }
        self.entries as f64 / self.buckets as f64
    }

    /// Fraction of all buckets whose chain holds more than one entry.
    pub fn collision_rate(&self) -> f64 {
        if self.buckets == 0 {
            return 0.0;
        }
        self.collided as f64 / self.buckets as f64
    }
}
