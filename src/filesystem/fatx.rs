//! FATX volume structure and operations.
//!
//! This module implements the core functions to interact with a FATX volume, including:
//! - Reading the superblock and the allocation table
//! - Locating and reading clusters
//! - Listing directories and reading files by following cluster chains
//! - Displaying the volume layout and its directory tree
//!
//! The volume is generic over `Read + Seek`: nothing in this module can write to the image.

use getset::Getters;
use log::{debug, error, info, warn};
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;

use super::dir_entry::{DirEntries, DirEntry};
use super::fat::AllocationTable;
use super::fatx_error::FATXError;
use super::fatx_type::FATXType;
use super::superblock::Superblock;
use crate::constants::{FAT_ALIGNMENT, ROOT_CLUSTER, SUPERBLOCK_SIZE};
use crate::traits::{LayoutDisplay, TraitError, TreeDisplay};
use crate::utils;

/// Picks the allocation table entry width for a volume.
///
/// # Parameters
/// - `partition_size`: The size of the volume in bytes
/// - `cluster_size`: The size of a cluster in bytes
pub fn fatx_type(partition_size: u64, cluster_size: u64) -> FATXType {
    FATXType::from_cluster_count(partition_size.div_ceil(cluster_size))
}

/// Computes the size in bytes of the allocation table of a volume.
///
/// The table holds one entry per cluster fitting in the volume and is padded up to the
/// next 4096-byte boundary.
///
/// # Parameters
/// - `partition_size`: The size of the volume in bytes
/// - `cluster_size`: The size of a cluster in bytes
pub fn fat_size(partition_size: u64, cluster_size: u64) -> u64 {
    let width = fatx_type(partition_size, cluster_size).entry_size() as u64;
    (partition_size * width)
        .div_ceil(cluster_size)
        .next_multiple_of(FAT_ALIGNMENT)
}

/// The content of a file, possibly incomplete.
///
/// When the cluster chain of a file is corrupted, the bytes read before the failure are
/// kept along with the failure.
#[derive(Debug, Getters)]
pub struct FileContents {
    /// The bytes read, never more than the declared file size
    #[get = "pub"]
    data: Vec<u8>,
    /// The error which interrupted the read, if any
    #[get = "pub"]
    failure: Option<FATXError>,
}

impl FileContents {
    /// Checks if the whole file was read.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Returns the bytes read.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Structure for a FATX volume.
///
/// It owns the image handle for its whole lifetime.
#[derive(Getters)]
pub struct FATXVol<R: Read + Seek> {
    reader: R,
    /// Byte offset of the volume within the image
    #[get = "pub"]
    start: u64,
    /// Size of the volume in bytes
    #[get = "pub"]
    size: u64,
    #[get = "pub"]
    superblock: Superblock,
    #[get = "pub"]
    fat: AllocationTable,
    /// Size of the allocation table in bytes
    #[get = "pub"]
    fat_size: u64,
}

impl FATXVol<File> {
    /// Opens the FATX volume starting `start` bytes into the image at `path`.
    ///
    /// The image is opened read-only.
    pub fn open(path: &Path, start: u64) -> Result<Self, FATXError> {
        let file = File::open(path)?;
        Self::from_reader(file, start)
    }
}

impl<R: Read + Seek> FATXVol<R> {
    /// Reads the superblock and the allocation table of a volume.
    ///
    /// # Parameters
    /// - `reader`: The image containing the volume
    /// - `start`: The byte offset of the volume within the image
    ///
    /// # Returns
    /// - `Ok(FATXVol)`: The FATX volume
    /// - `Err(FATXError)`: If reading fails or the volume is malformed
    ///
    /// # Errors
    /// - Returns `FATXError::IOError` if reading from the image fails
    /// - Returns `FATXError::ImageTooSmall` if the image cannot hold the superblock and the FAT
    /// - Returns the superblock and allocation table errors if the structures are malformed
    pub fn from_reader(mut reader: R, start: u64) -> Result<Self, FATXError> {
        let size = utils::stream_len(&mut reader)?.saturating_sub(start);
        if size < SUPERBLOCK_SIZE as u64 {
            return Err(FATXError::ImageTooSmall {
                size,
                needed: SUPERBLOCK_SIZE as u64,
            });
        }

        let superblock = Superblock::from_reader(&mut reader, start)?;
        let cluster_size = superblock.cluster_size();
        let fatx_type = fatx_type(size, cluster_size);
        let fat_size = fat_size(size, cluster_size);

        let needed = SUPERBLOCK_SIZE as u64 + fat_size;
        if size < needed {
            return Err(FATXError::ImageTooSmall { size, needed });
        }

        let mut raw_fat = vec![];
        utils::read_at(
            &mut reader,
            start + SUPERBLOCK_SIZE as u64,
            fat_size as usize,
            &mut raw_fat,
        )?;
        let fat = AllocationTable::parse(&raw_fat, fatx_type)?;

        info!(
            "Opened {fatx_type} volume 0x{:08X}: {size} bytes, {cluster_size}-byte clusters, {fat_size}-byte FAT",
            superblock.volume_id()
        );

        Ok(Self {
            reader,
            start,
            size,
            superblock,
            fat,
            fat_size,
        })
    }

    /// The size of a cluster in bytes.
    pub fn cluster_size(&self) -> u64 {
        self.superblock.cluster_size()
    }

    /// Returns the byte offset of the data region, relative to the start of the volume.
    pub fn data_start(&self) -> u64 {
        SUPERBLOCK_SIZE as u64 + self.fat_size
    }

    /// Returns the number of whole clusters in the data region.
    pub fn cluster_count(&self) -> u64 {
        (self.size - self.data_start()) / self.cluster_size()
    }

    /// Returns the byte offset of a cluster, relative to the start of the volume.
    ///
    /// # Errors
    /// - `FATXError::InvalidCluster`: If `cluster` is 0
    pub fn cluster_offset(&self, cluster: u32) -> Result<u64, FATXError> {
        if cluster == 0 {
            return Err(FATXError::InvalidCluster(cluster));
        }

        Ok((cluster as u64 - 1) * self.cluster_size() + self.data_start())
    }

    /// Reads a whole cluster.
    ///
    /// # Errors
    /// - `FATXError::InvalidCluster`: If `cluster` is 0
    /// - `FATXError::IOError`: If the image ends before the end of the cluster
    pub fn read_cluster(&mut self, cluster: u32) -> Result<Vec<u8>, FATXError> {
        let offset = self.start + self.cluster_offset(cluster)?;
        let mut buf = vec![];
        Self::read_cluster_at(
            &mut self.reader,
            offset,
            cluster,
            self.superblock.cluster_size() as usize,
            &mut buf,
        )?;
        Ok(buf)
    }

    fn read_cluster_at(
        reader: &mut R,
        offset: u64,
        cluster: u32,
        cluster_size: usize,
        buf: &mut Vec<u8>,
    ) -> io::Result<()> {
        debug!("Reading cluster {cluster} at offset 0x{offset:X}");
        utils::read_at(reader, offset, cluster_size, buf).map_err(|err| {
            io::Error::new(err.kind(), format!("Failed to read cluster {cluster}: {err}"))
        })
    }

    /// Concatenates the clusters of the chain starting at `first_cluster`, up to `limit`
    /// bytes.
    ///
    /// Past `limit` the remaining links are still checked but their clusters are not read.
    /// Returns the bytes read so far along with the error which stopped the walk, if any.
    fn read_chain(&mut self, first_cluster: u32, limit: usize) -> (Vec<u8>, Option<FATXError>) {
        let cluster_size = self.cluster_size() as usize;
        let mut data = vec![];
        let mut buf = vec![];

        for cluster in self.fat.chain(first_cluster) {
            let cluster = match cluster {
                Ok(cluster) => cluster,
                Err(err) => return (data, Some(err)),
            };
            if data.len() >= limit {
                continue;
            }
            let offset = match self.cluster_offset(cluster) {
                Ok(offset) => self.start + offset,
                Err(err) => return (data, Some(err)),
            };

            if let Err(err) =
                Self::read_cluster_at(&mut self.reader, offset, cluster, cluster_size, &mut buf)
            {
                return (data, Some(err.into()));
            }
            data.extend_from_slice(&buf);
        }

        (data, None)
    }

    /// Lists the entries of the directory whose chain starts at `first_cluster`.
    ///
    /// The whole chain is validated before any of its clusters is read.
    ///
    /// # Errors
    /// Any chain, record or I/O error met while reading the directory.
    pub fn list_dir(&mut self, first_cluster: u32) -> Result<Vec<DirEntry>, FATXError> {
        let clusters = self.fat.walk_chain(first_cluster)?;
        let mut data = Vec::with_capacity(clusters.len() * self.cluster_size() as usize);
        for cluster in clusters {
            data.extend(self.read_cluster(cluster)?);
        }

        DirEntries::new(data).collect()
    }

    /// Lists the root directory.
    pub fn root_dir(&mut self) -> Result<Vec<DirEntry>, FATXError> {
        self.list_dir(ROOT_CLUSTER)
    }

    /// Lists the entries of a subdirectory.
    ///
    /// A corrupted directory is reported in the logs and yields `Ok(None)`, so that one
    /// bad directory does not stop the traversal of its siblings.
    ///
    /// # Errors
    /// - `FATXError::NotADirectory`: If `entry` is not a directory
    pub fn open_directory(&mut self, entry: &DirEntry) -> Result<Option<Vec<DirEntry>>, FATXError> {
        if !entry.is_dir() {
            return Err(FATXError::NotADirectory(entry.name()));
        }

        match self.list_dir(*entry.first_cluster()) {
            Ok(entries) => Ok(Some(entries)),
            Err(err) => {
                error!("{err}");
                self.log_entry(entry);
                Ok(None)
            }
        }
    }

    /// Reads the content of a file.
    ///
    /// The content is truncated to the size declared by the entry. When the chain of the
    /// file is corrupted, the bytes read before the failure are returned along with it.
    ///
    /// # Errors
    /// - `FATXError::NotAFile`: If `entry` is a directory
    pub fn read_file(&mut self, entry: &DirEntry) -> Result<FileContents, FATXError> {
        if entry.is_dir() {
            return Err(FATXError::NotAFile(entry.name()));
        }

        let size = *entry.file_size() as usize;
        if size == 0 && *entry.first_cluster() == 0 {
            return Ok(FileContents {
                data: vec![],
                failure: None,
            });
        }

        let (mut data, failure) = self.read_chain(*entry.first_cluster(), size);
        data.truncate(size);

        if let Some(err) = &failure {
            error!("{err}");
            self.log_entry(entry);
            warn!("\tread {} from {} bytes", data.len(), size);
        }

        Ok(FileContents { data, failure })
    }

    /// Finds an entry from its path, starting at the root directory.
    ///
    /// Components are separated by `/` and compared without case. Deleted entries are
    /// ignored.
    ///
    /// # Errors
    /// - `FATXError::FileNotFound`: If a component does not exist or is not a directory
    /// - Any error met while listing the directories on the path
    pub fn find(&mut self, path: &str) -> Result<DirEntry, FATXError> {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let (last, dirs) = match parts.split_last() {
            Some(split) => split,
            None => return Err(FATXError::FileNotFound(path.to_string())),
        };

        let mut entries = self.root_dir()?;
        for part in dirs {
            let dir = Self::lookup(entries, part)
                .filter(|entry| entry.is_dir())
                .ok_or_else(|| FATXError::FileNotFound(path.to_string()))?;
            entries = self.list_dir(*dir.first_cluster())?;
        }

        Self::lookup(entries, last).ok_or_else(|| FATXError::FileNotFound(path.to_string()))
    }

    fn lookup(entries: Vec<DirEntry>, name: &str) -> Option<DirEntry> {
        entries
            .into_iter()
            .find(|entry| !entry.is_deleted() && entry.name().eq_ignore_ascii_case(name))
    }

    fn log_entry(&self, entry: &DirEntry) {
        error!("\tName: {}", entry.name());
        error!("\tCluster ID: {}", entry.first_cluster());
        match self.cluster_offset(*entry.first_cluster()) {
            Ok(offset) => error!("\tOffset: 0x{:X}", self.start + offset),
            Err(_) => error!("\tOffset: Failed calculating the offset"),
        }
    }

    /// Recursively renders the entries of a directory.
    ///
    /// # Parameters
    /// - `entries`: The entries of the directory.
    /// - `indent`: The indentation level for pretty-printing.
    /// - `ancestors`: The first clusters of the directories on the current path.
    fn print_dir_rec(
        &mut self,
        entries: Vec<DirEntry>,
        indent: usize,
        ancestors: &mut Vec<u32>,
        out: &mut String,
    ) -> Result<(), TraitError> {
        for entry in entries {
            writeln!(out, "{}{}", " ".repeat(indent), entry)?;
            if !entry.is_dir() || entry.is_deleted() {
                continue;
            }

            let cluster = *entry.first_cluster();
            if ancestors.contains(&cluster) {
                warn!("Directory {} loops back to cluster {cluster}", entry.name());
                writeln!(out, "{}<loop to cluster {cluster}>", " ".repeat(indent + 3))?;
                continue;
            }

            match self.open_directory(&entry)? {
                Some(children) => {
                    ancestors.push(cluster);
                    self.print_dir_rec(children, indent + 3, ancestors, out)?;
                    ancestors.pop();
                }
                None => writeln!(out, "{}<unreadable directory>", " ".repeat(indent + 3))?,
            }
        }

        Ok(())
    }
}

/// Implements the LayoutDisplay trait for FATXVol
impl<R: Read + Seek> LayoutDisplay for FATXVol<R> {
    fn display_layout(&self, indent: u8) -> Result<String, std::fmt::Error> {
        let mut out = String::from("");
        let indent = " ".repeat(indent.into());
        let data_end = self.data_start() + self.cluster_count() * self.cluster_size();

        writeln!(out, "{}┌{:─^55}┐", indent, " FATX Volume Layout ")?;
        writeln!(
            out,
            "{}├{:^12}┬{:^12}┬{:^12}┬{:^16}┤",
            indent, "Region", "Start", "End", "Description"
        )?;
        writeln!(
            out,
            "{}├{:─<12}┼{:─<12}┼{:─<12}┼{:─<16}┤",
            indent, "", "", "", ""
        )?;

        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent, "Superblock", 0, SUPERBLOCK_SIZE, "Volume Header"
        )?;
        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent,
            "FAT",
            SUPERBLOCK_SIZE,
            self.data_start(),
            self.fat.fatx_type().to_string()
        )?;
        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent,
            "Data",
            self.data_start(),
            data_end,
            "Cluster Data"
        )?;
        if data_end < self.size {
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent, "", data_end, self.size, "Volume Slack"
            )?;
        }

        writeln!(
            out,
            "{}└{:─<12}┴{:─<12}┴{:─<12}┴{:─<16}┘",
            indent, "", "", "", ""
        )?;

        let usage = self.fat.usage();
        writeln!(
            out,
            "{}{} clusters of {} bytes: {} available, {} in use, {} bad, {} reserved",
            indent,
            self.cluster_count(),
            self.cluster_size(),
            usage.available,
            usage.data + usage.end_of_chain,
            usage.bad,
            usage.reserved
        )?;

        Ok(out)
    }
}

impl<R: Read + Seek> TreeDisplay for FATXVol<R> {
    fn display_tree(&mut self) -> Result<String, TraitError> {
        let mut out = String::new();
        let root = self.root_dir()?;
        let mut ancestors = vec![ROOT_CLUSTER];

        writeln!(out, "/")?;
        self.print_dir_rec(root, 3, &mut ancestors, &mut out)?;

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_fat_size_fatx16() {
        // 10,000 clusters of 16 KiB
        let cluster_size = 16 * 1024;
        let size = 10_000 * cluster_size;
        assert_eq!(fatx_type(size, cluster_size), FATXType::FATX16);
        assert_eq!(fat_size(size, cluster_size), 20_480);
    }

    #[test]
    fn test_fat_size_fatx32() {
        // 70,000 clusters of 16 KiB
        let cluster_size = 16 * 1024;
        let size = 70_000 * cluster_size;
        assert_eq!(fatx_type(size, cluster_size), FATXType::FATX32);
        assert_eq!(fat_size(size, cluster_size), 282_624);
    }

    #[test]
    fn test_fat_size_boundaries() {
        let cluster_size = 512;
        assert_eq!(fat_size(16 * 1024, cluster_size), 4096);
        assert_eq!(fatx_type(0xFFF5 * cluster_size, cluster_size), FATXType::FATX16);
        // A partial cluster above the limit already needs 32-bit entries.
        assert_eq!(
            fatx_type(0xFFF5 * cluster_size + 1, cluster_size),
            FATXType::FATX32
        );
        assert_eq!(fat_size(MIB, cluster_size), 4096);
    }

    fn empty_volume(image_size: usize) -> Vec<u8> {
        let mut image = vec![0u8; image_size];
        image[0..4].copy_from_slice(b"FATX");
        image[8..12].copy_from_slice(&1u32.to_le_bytes());
        image[12..14].copy_from_slice(&1u16.to_le_bytes());
        image
    }

    #[test]
    fn test_cluster_offset() {
        let vol = FATXVol::from_reader(Cursor::new(empty_volume(16 * 1024)), 0).unwrap();
        assert_eq!(*vol.fat_size(), 4096);
        assert_eq!(vol.cluster_offset(1).unwrap(), 4096 + 4096);
        assert_eq!(vol.cluster_offset(3).unwrap(), 8192 + 2 * 512);
        assert!(matches!(
            vol.cluster_offset(0).unwrap_err(),
            FATXError::InvalidCluster(0)
        ));
        assert_eq!(vol.cluster_count(), 16);
    }

    #[test]
    fn test_read_cluster_past_end() {
        let mut vol = FATXVol::from_reader(Cursor::new(empty_volume(16 * 1024)), 0).unwrap();
        assert_eq!(vol.read_cluster(16).unwrap().len(), 512);
        let err = vol.read_cluster(17).unwrap_err();
        assert!(matches!(err, FATXError::IOError(ref e) if e.to_string().contains("cluster 17")));
    }

    #[test]
    fn test_image_too_small() {
        let err = FATXVol::from_reader(Cursor::new(empty_volume(6 * 1024)), 0)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            FATXError::ImageTooSmall {
                size: 6144,
                needed: 8192
            }
        ));

        let err = FATXVol::from_reader(Cursor::new(vec![0u8; 100]), 0)
            .err()
            .unwrap();
        assert!(matches!(err, FATXError::ImageTooSmall { size: 100, .. }));
    }

    #[test]
    fn test_layout() {
        let vol = FATXVol::from_reader(Cursor::new(empty_volume(16 * 1024 + 100)), 0).unwrap();
        let layout = vol.display_layout(0).unwrap();
        assert!(layout.contains("FATX Volume Layout"));
        assert!(layout.contains("FATX16"));
        assert!(layout.contains("Volume Slack"));
        assert!(layout.contains("16 clusters of 512 bytes"));
    }
}
