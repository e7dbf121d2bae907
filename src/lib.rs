//!
//! FATXForensics: A library and CLI for analyzing FATX (Xbox) filesystem images.
//!
//! This crate provides tools for:
//! - Parsing and validating the FATX superblock
//! - Walking the allocation table and its cluster chains
//! - Listing directories and extracting files, deleted entries included
//! - Printing the volume layout and its directory tree
//!
//! Everything is read-only: no function of this crate writes to an image.
//!
//! # Re-exports
//! - [`FATXVol`]: FATX volume abstraction
//! - [`DirEntry`]: Directory entry of a FATX volume
//! - [`FATXError`]: Errors raised while decoding a volume

pub mod commands;
pub mod constants;
pub mod filesystem;
pub mod traits;
pub mod utils;

/// FATX volume abstraction (see [`filesystem::fatx::FATXVol`]).
pub use crate::filesystem::fatx::FATXVol;
/// Directory entry (see [`filesystem::dir_entry::DirEntry`]).
pub use crate::filesystem::dir_entry::DirEntry;
/// Error type (see [`filesystem::fatx_error::FATXError`]).
pub use crate::filesystem::fatx_error::FATXError;
