//! FATX superblock structure.
//!
//! This module implements:
//! - Superblock parsing from the first 4096 bytes of a volume
//! - Superblock validation (signature, FAT copies, cluster geometry)

use binread::{BinRead, BinReaderExt};
use getset::Getters;
use std::fmt;
use std::io;

use super::fatx_error::FATXError;
use crate::constants::{FATX_SIGNATURE, SECTOR_SIZE, SUPERBLOCK_SIZE};
use crate::utils;

/// Superblock found at the start of every FATX volume.
///
/// Only the first 18 bytes carry information, the rest of the 4096-byte block is unused.
#[derive(BinRead, Debug, Getters)]
#[br(little)]
pub struct Superblock {
    /// Signature, "FATX" in ASCII
    signature: [u8; 4],
    /// Volume identifier
    #[get = "pub"]
    volume_id: u32,
    /// Number of 512-byte sectors per cluster
    #[get = "pub"]
    sec_per_clus: u32,
    /// Number of allocation table copies (always 1)
    #[get = "pub"]
    fat_copies: u16,
    /// Unknown, usually 0
    reserved: u32,
}

impl Superblock {
    /// Reads and validates the superblock of a volume starting at byte `start`.
    ///
    /// # Errors
    /// - Returns `FATXError::IOError` if the block cannot be read
    /// - Returns the errors of [`Superblock::from_bytes`] if validation fails
    pub fn from_reader<T: io::Read + io::Seek>(
        reader: &mut T,
        start: u64,
    ) -> Result<Superblock, FATXError> {
        let mut buf = vec![0; SUPERBLOCK_SIZE];
        utils::read_at(reader, start, SUPERBLOCK_SIZE, &mut buf)?;

        Self::from_bytes(&buf)
    }

    /// Decodes and validates a superblock from one 4096-byte block.
    ///
    /// # Errors
    /// - `FATXError::InvalidSuperblockSize`: If the block is not 4096 bytes long
    /// - `FATXError::InvalidSignature`: If the block does not start with "FATX"
    /// - `FATXError::InvalidFatCopies`: If the volume does not hold exactly one FAT
    /// - `FATXError::InvalidSecPerClus`: If the cluster geometry is not supported
    pub fn from_bytes(buf: &[u8]) -> Result<Superblock, FATXError> {
        if buf.len() != SUPERBLOCK_SIZE {
            return Err(FATXError::InvalidSuperblockSize(buf.len()));
        }

        let mut reader = io::Cursor::new(buf);
        let superblock: Superblock = reader.read_le()?;

        superblock.validate()
    }

    /// The size of a cluster in bytes.
    pub fn cluster_size(&self) -> u64 {
        self.sec_per_clus as u64 * SECTOR_SIZE as u64
    }

    fn validate(self) -> Result<Self, FATXError> {
        if &self.signature != FATX_SIGNATURE {
            return Err(FATXError::InvalidSignature(
                String::from_utf8_lossy(&self.signature).to_string(),
            ));
        }

        if self.fat_copies != 1 {
            return Err(FATXError::InvalidFatCopies(self.fat_copies));
        }

        const VALID_SEC_PER_CLUS: [u32; 8] = [1, 2, 4, 8, 16, 32, 64, 128];
        if !VALID_SEC_PER_CLUS.contains(&self.sec_per_clus) {
            return Err(FATXError::InvalidSecPerClus(self.sec_per_clus));
        }

        Ok(self)
    }
}

/// Implements the Display trait for Superblock
impl fmt::Display for Superblock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut offset = 0;

        macro_rules! field {
            ($name:expr, $val:expr, $size:expr) => {{
                writeln!(f, "  {:<20} 0x{:>04X}: {}", $name, offset, $val)?;
                offset += $size;
            }};
        }

        writeln!(f, "FATX Superblock:")?;

        field!("signature", String::from_utf8_lossy(&self.signature), 4);
        field!("volume_id", format!("0x{:08X}", self.volume_id), 4);
        field!("sec_per_clus", self.sec_per_clus, 4);
        field!("fat_copies", self.fat_copies, 2);
        field!("reserved", format!("0x{:X}", self.reserved), 4);

        writeln!(
            f,
            "\nUnused 0x{:04X} ({} bytes)",
            offset,
            SUPERBLOCK_SIZE - offset
        )?;
        writeln!(f, "Cluster size: {} bytes", self.cluster_size())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_superblock(signature: &[u8; 4], sec_per_clus: u32, fat_copies: u16) -> Vec<u8> {
        let mut buf = vec![0u8; SUPERBLOCK_SIZE];
        buf[0..4].copy_from_slice(signature);
        buf[4..8].copy_from_slice(&0xCAFEBABEu32.to_le_bytes());
        buf[8..12].copy_from_slice(&sec_per_clus.to_le_bytes());
        buf[12..14].copy_from_slice(&fat_copies.to_le_bytes());
        buf
    }

    #[test]
    fn test_valid_superblock() {
        let sb = Superblock::from_bytes(&raw_superblock(b"FATX", 32, 1)).unwrap();
        assert_eq!(*sb.volume_id(), 0xCAFEBABE);
        assert_eq!(*sb.sec_per_clus(), 32);
        assert_eq!(*sb.fat_copies(), 1);
        assert_eq!(sb.cluster_size(), 16384);
    }

    #[test]
    fn test_bad_signature() {
        let err = Superblock::from_bytes(&raw_superblock(b"FATY", 32, 1)).unwrap_err();
        assert!(matches!(err, FATXError::InvalidSignature(ref s) if s == "FATY"));
    }

    #[test]
    fn test_bad_fat_copies() {
        let err = Superblock::from_bytes(&raw_superblock(b"FATX", 32, 2)).unwrap_err();
        assert!(matches!(err, FATXError::InvalidFatCopies(2)));
    }

    #[test]
    fn test_bad_sec_per_clus() {
        let err = Superblock::from_bytes(&raw_superblock(b"FATX", 3, 1)).unwrap_err();
        assert!(matches!(err, FATXError::InvalidSecPerClus(3)));
        let err = Superblock::from_bytes(&raw_superblock(b"FATX", 0, 1)).unwrap_err();
        assert!(matches!(err, FATXError::InvalidSecPerClus(0)));
    }

    #[test]
    fn test_wrong_block_length() {
        let mut buf = raw_superblock(b"FATX", 32, 1);
        buf.truncate(512);
        let err = Superblock::from_bytes(&buf).unwrap_err();
        assert!(matches!(err, FATXError::InvalidSuperblockSize(512)));
    }

    #[test]
    fn test_from_reader_at_offset() {
        let mut image = vec![0xAAu8; 1024];
        image.extend(raw_superblock(b"FATX", 1, 1));
        let mut cursor = io::Cursor::new(image);
        let sb = Superblock::from_reader(&mut cursor, 1024).unwrap();
        assert_eq!(sb.cluster_size(), 512);
    }

    #[test]
    fn test_display_lists_fields() {
        let sb = Superblock::from_bytes(&raw_superblock(b"FATX", 32, 1)).unwrap();
        let out = sb.to_string();
        assert!(out.contains("FATX Superblock"));
        assert!(out.contains("0xCAFEBABE"));
        assert!(out.contains("Unused 0x0012 (4078 bytes)"));
    }
}
