//! Enum for the two FATX variants (FATX16 and FATX32).
//!
//! The variant only decides the width of an allocation table entry. It is derived from
//! the number of clusters that fit in the volume.

use std::fmt;

use crate::constants::FATX16_MAX_CLUSTERS;

/// Represents the width of the allocation table entries.
///
/// # Values
/// - `FATX16`: 16-bit entries, for volumes with at most 0xFFF5 clusters
/// - `FATX32`: 32-bit entries, for larger volumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FATXType {
    FATX16,
    FATX32,
}

impl FATXType {
    /// Picks the entry width for a volume holding `cluster_count` clusters.
    pub fn from_cluster_count(cluster_count: u64) -> Self {
        if cluster_count <= FATX16_MAX_CLUSTERS {
            FATXType::FATX16
        } else {
            FATXType::FATX32
        }
    }

    /// The size in bytes of one allocation table entry.
    pub fn entry_size(&self) -> usize {
        match self {
            FATXType::FATX16 => 2,
            FATXType::FATX32 => 4,
        }
    }

    /// The largest value an entry can hold.
    pub fn max_value(&self) -> u32 {
        match self {
            FATXType::FATX16 => u16::MAX as u32,
            FATXType::FATX32 => u32::MAX,
        }
    }

    /// The marker of a bad cluster. Every value above it ends a chain.
    pub fn bad_cluster_marker(&self) -> u32 {
        self.max_value() - 8
    }
}

impl fmt::Display for FATXType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FATXType::FATX16 => "FATX16",
            FATXType::FATX32 => "FATX32",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_from_cluster_count() {
        assert_eq!(FATXType::from_cluster_count(10_000), FATXType::FATX16);
        assert_eq!(FATXType::from_cluster_count(0xFFF5), FATXType::FATX16);
        assert_eq!(FATXType::from_cluster_count(0xFFF6), FATXType::FATX32);
        assert_eq!(FATXType::from_cluster_count(70_000), FATXType::FATX32);
    }

    #[test]
    fn test_bad_cluster_marker() {
        assert_eq!(FATXType::FATX16.bad_cluster_marker(), 0xFFF7);
        assert_eq!(FATXType::FATX32.bad_cluster_marker(), 0xFFFF_FFF7);
    }
}
