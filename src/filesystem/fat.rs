//! FATX allocation table.
//!
//! The table is an array of little-endian entries, one per cluster. The entry at
//! position `n` describes cluster `n`; position 0 exists on disk but never belongs to a
//! chain since cluster numbers start at 1.
//!
//! | Value                 | Meaning                                    |
//! |-----------------------|--------------------------------------------|
//! | 0                     | Cluster free for use                       |
//! | 1                     | Reserved                                   |
//! | 2 .. bad marker       | Part of a chain, points to the next cluster|
//! | bad marker            | Bad cluster, must not be used              |
//! | above the bad marker  | End of a cluster chain                     |

use log::debug;
use std::fmt;

use super::fatx_error::FATXError;
use super::fatx_type::FATXType;
use crate::utils::{u16_at, u32_at};

/// Classification of a raw allocation table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Available,
    Reserved,
    Bad,
    EndOfChain,
    /// Part of a chain, holds the number of the next cluster
    Data(u32),
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Available => write!(f, "available"),
            EntryKind::Reserved => write!(f, "reserved"),
            EntryKind::Bad => write!(f, "bad"),
            EntryKind::EndOfChain => write!(f, "end of chain"),
            EntryKind::Data(next) => write!(f, "data (next: {next})"),
        }
    }
}

/// Number of allocation table entries of each kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableUsage {
    pub available: usize,
    pub reserved: usize,
    pub bad: usize,
    pub data: usize,
    pub end_of_chain: usize,
}

/// The parsed allocation table of a FATX volume.
#[derive(Debug)]
pub struct AllocationTable {
    fatx_type: FATXType,
    entries: Vec<u32>,
}

impl AllocationTable {
    /// Splits the raw bytes of an allocation table into entries.
    ///
    /// # Errors
    /// - `FATXError::InvalidTableSize`: If `raw` cannot be split into whole entries
    pub fn parse(raw: &[u8], fatx_type: FATXType) -> Result<Self, FATXError> {
        let width = fatx_type.entry_size();
        if raw.len() % width != 0 {
            return Err(FATXError::InvalidTableSize {
                len: raw.len(),
                width,
            });
        }

        let entries = (0..raw.len())
            .step_by(width)
            .map(|off| match fatx_type {
                FATXType::FATX16 => u16_at(raw, off) as u32,
                FATXType::FATX32 => u32_at(raw, off),
            })
            .collect();

        Ok(Self { fatx_type, entries })
    }

    /// Returns the width of the entries of this table.
    pub fn fatx_type(&self) -> FATXType {
        self.fatx_type
    }

    /// Returns the number of entries in the table, position 0 included.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the raw entry of a cluster.
    pub fn entry(&self, cluster: u32) -> Result<u32, FATXError> {
        self.entries
            .get(cluster as usize)
            .copied()
            .ok_or(FATXError::ClusterOutOfRange {
                cluster,
                count: self.entries.len(),
            })
    }

    /// Classifies a raw entry value according to the width of this table.
    pub fn classify(&self, value: u32) -> EntryKind {
        let bad = self.fatx_type.bad_cluster_marker();
        match value {
            0 => EntryKind::Available,
            1 => EntryKind::Reserved,
            v if v == bad => EntryKind::Bad,
            v if v > bad => EntryKind::EndOfChain,
            v => EntryKind::Data(v),
        }
    }

    /// Returns the classification of the entry of a cluster.
    pub fn kind_of(&self, cluster: u32) -> Result<EntryKind, FATXError> {
        Ok(self.classify(self.entry(cluster)?))
    }

    /// Lazily walks the chain starting at `start`.
    ///
    /// The iterator yields the cluster numbers of the chain in order, `start` first and
    /// the end-of-chain cluster last. After an error it yields nothing more.
    pub fn chain(&self, start: u32) -> Chain<'_> {
        Chain {
            table: self,
            start,
            next: Some(start),
            visited: 0,
        }
    }

    /// Collects the cluster numbers of the chain starting at `start`.
    ///
    /// # Errors
    /// - `FATXError::InvalidCluster`: If `start` is 0
    /// - `FATXError::ChainStart`: If the entry of `start` is neither data nor end of chain
    /// - `FATXError::ChainCorruption`: If the chain goes through an available, reserved or bad entry
    /// - `FATXError::ClusterOutOfRange`: If the chain points outside the table
    /// - `FATXError::ChainCycle`: If the chain is longer than the table
    pub fn walk_chain(&self, start: u32) -> Result<Vec<u32>, FATXError> {
        let clusters = self.chain(start).collect::<Result<Vec<u32>, FATXError>>()?;
        debug!("Chain starting at cluster {start}: {} clusters", clusters.len());
        Ok(clusters)
    }

    /// Counts the entries of each kind, position 0 excluded.
    pub fn usage(&self) -> TableUsage {
        let mut usage = TableUsage::default();
        for value in self.entries.iter().skip(1) {
            match self.classify(*value) {
                EntryKind::Available => usage.available += 1,
                EntryKind::Reserved => usage.reserved += 1,
                EntryKind::Bad => usage.bad += 1,
                EntryKind::EndOfChain => usage.end_of_chain += 1,
                EntryKind::Data(_) => usage.data += 1,
            }
        }
        usage
    }
}

impl fmt::Display for AllocationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} clusters in map ({})",
            self.entries.len(),
            self.fatx_type
        )
    }
}

/// Iterator over the clusters of a chain. See [`AllocationTable::chain`].
pub struct Chain<'a> {
    table: &'a AllocationTable,
    start: u32,
    next: Option<u32>,
    visited: usize,
}

impl Chain<'_> {
    fn step(&mut self, cluster: u32) -> Result<u32, FATXError> {
        if cluster == 0 {
            return Err(FATXError::InvalidCluster(0));
        }

        if self.visited > self.table.entry_count() {
            return Err(FATXError::ChainCycle {
                start: self.start,
                limit: self.table.entry_count(),
            });
        }

        let kind = self.table.kind_of(cluster)?;
        match kind {
            EntryKind::Data(next) => self.next = Some(next),
            EntryKind::EndOfChain => {}
            _ if self.visited == 1 => {
                return Err(FATXError::ChainStart { cluster, kind });
            }
            _ => {
                return Err(FATXError::ChainCorruption {
                    start: self.start,
                    cluster,
                    kind,
                });
            }
        }

        Ok(cluster)
    }
}

impl Iterator for Chain<'_> {
    type Item = Result<u32, FATXError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cluster = self.next.take()?;
        self.visited += 1;
        Some(self.step(cluster))
    }
}
