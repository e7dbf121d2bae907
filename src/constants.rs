/// The size in bytes of the superblock at the start of a FATX volume.
pub const SUPERBLOCK_SIZE: usize = 4096;

/// The size of a sector in bytes.
pub const SECTOR_SIZE: usize = 512;

/// The size in bytes of a directory record.
pub const DIR_ENTRY_SIZE: usize = 64;

/// The capacity in bytes of the name field of a directory record.
pub const MAX_NAME_LEN: usize = 42;

/// The allocation table is padded up to a multiple of this many bytes.
pub const FAT_ALIGNMENT: u64 = 4096;

/// Volumes with at most this many clusters use 16-bit allocation table entries.
pub const FATX16_MAX_CLUSTERS: u64 = 0xFFF5;

/// The signature found in the first four bytes of the superblock.
pub const FATX_SIGNATURE: &[u8; 4] = b"FATX";

/// The cluster holding the root directory.
pub const ROOT_CLUSTER: u32 = 1;
