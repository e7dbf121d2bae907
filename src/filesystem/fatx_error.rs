//! Error types for FATX volume decoding and traversal.
//!
//! Structural errors in the fixed-size regions (superblock, allocation table shape) are
//! raised while opening a volume. Chain, record and range errors are raised while walking
//! the allocation table or decoding directory clusters.

use std::io;
use thiserror::Error;

use super::fat::EntryKind;

/// Errors that can occur while decoding or navigating a FATX volume.
#[derive(Error, Debug)]
pub enum FATXError {
    /// The superblock must be exactly one 4096-byte block.
    #[error("Invalid superblock size: `{0}` bytes. Expected 4096 bytes.")]
    InvalidSuperblockSize(usize),

    /// The first four bytes of the superblock must read "FATX".
    #[error("Invalid signature `{0}`. Expected signature: FATX")]
    InvalidSignature(String),

    /// Only volumes carrying a single allocation table are supported.
    #[error("Invalid number of FAT copies: `{0}`. Expected 1.")]
    InvalidFatCopies(u16),

    /// Sectors per cluster must be a power of 2 between 1 and 128.
    #[error(
        "Invalid number of sectors per cluster: `{0}`. Legal values: 1, 2, 4, 8, 16, 32, 64, 128"
    )]
    InvalidSecPerClus(u32),

    /// The raw allocation table cannot be split into whole entries.
    #[error("Invalid allocation table size: {len} bytes is not a multiple of {width} bytes.")]
    InvalidTableSize { len: usize, width: usize },

    /// The image cannot hold the superblock and the allocation table.
    #[error("Image too small: {size} bytes available, at least {needed} bytes needed.")]
    ImageTooSmall { size: u64, needed: u64 },

    /// Cluster indices start at 1.
    #[error("Invalid cluster number `{0}`. Cluster numbers start at 1.")]
    InvalidCluster(u32),

    /// The cluster number has no slot in the allocation table.
    #[error("Cluster `{cluster}` is outside the allocation table ({count} entries).")]
    ClusterOutOfRange { cluster: u32, count: usize },

    /// A chain must start on a data or end-of-chain slot.
    #[error("Cluster `{cluster}` is not part of a chain: its entry is {kind}.")]
    ChainStart { cluster: u32, kind: EntryKind },

    /// A chain went through a slot that is neither data nor end of chain.
    #[error("Chain starting at cluster `{start}` is corrupted: cluster {cluster} is {kind}.")]
    ChainCorruption {
        start: u32,
        cluster: u32,
        kind: EntryKind,
    },

    /// A chain visited more clusters than the allocation table holds.
    #[error("Chain starting at cluster `{start}` exceeds {limit} clusters. It likely loops.")]
    ChainCycle { start: u32, limit: usize },

    /// The name length of a directory record exceeds the name field.
    #[error("Invalid name length `0x{0:02X}` in directory record. The maximum is 42.")]
    InvalidNameLength(u8),

    /// The operation requires a directory entry.
    #[error("`{0}` is not a directory")]
    NotADirectory(String),

    /// The operation requires a file entry.
    #[error("`{0}` is a directory, not a file")]
    NotAFile(String),

    /// The file was not found
    #[error("File not found: `{0}`")]
    FileNotFound(String),

    /// Underlying I/O errors that occur while reading the image.
    #[error("IO Error: `{0}`")]
    IOError(io::Error),

    /// Parsing error occured during structure initialization
    #[error("BinRead Error: `{0}`")]
    BinReadError(binread::Error),
}

/// Converts standard I/O errors into FATXError.
impl From<io::Error> for FATXError {
    fn from(err: io::Error) -> Self {
        FATXError::IOError(err)
    }
}

/// Converts BinRead errors into FATXError.
impl From<binread::Error> for FATXError {
    fn from(err: binread::Error) -> Self {
        FATXError::BinReadError(err)
    }
}
