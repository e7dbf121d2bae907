//! FATX filesystem structures and navigation.
//!
//! - [`superblock`]: the 4096-byte volume header
//! - [`fat`]: the allocation table and cluster chains
//! - [`dir_entry`]: the 64-byte directory records
//! - [`fatx`]: the volume, which reads clusters, directories and files

pub mod dir_entry;
pub mod fat;
pub mod fatx;
pub mod fatx_error;
pub mod fatx_type;
pub mod superblock;
