//! FATX directory entry structure and parsing.
//!
//! A directory is a list of 64-byte records stored in the clusters of its chain. Each
//! record holds the name, the attributes, the first cluster, the size and the timestamps
//! of one file or subdirectory. The list ends at the first record whose name length is
//! 0x00 or 0xFF.
//!
//! | Offset | Size | Field                                         |
//! |--------|------|-----------------------------------------------|
//! | 0      | 1    | Name length (max. 42, 0xE5 if deleted)        |
//! | 1      | 1    | Attributes                                    |
//! | 2      | 42   | Name in ASCII, padded with 0xFF               |
//! | 44     | 4    | First cluster                                 |
//! | 48     | 4    | File size in bytes                            |
//! | 52     | 12   | Modification, creation and access time/date   |

use binread::{BinRead, BinReaderExt};
use getset::Getters;
use std::fmt;
use std::io;
use std::iter::FusedIterator;

use super::fatx_error::FATXError;
use crate::constants::{DIR_ENTRY_SIZE, MAX_NAME_LEN};
use crate::utils::printable_ascii;

/// Name length marking a deleted entry.
pub const DELETED_MARKER: u8 = 0xE5;
/// Name length marking the end of the directory list.
pub const END_MARKER: u8 = 0xFF;

/// Attribute byte of a directory entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attributes(u8);

impl Attributes {
    pub const READ_ONLY: u8 = 0x01;
    pub const HIDDEN: u8 = 0x02;
    pub const SYSTEM: u8 = 0x04;
    pub const VOLUME_LABEL: u8 = 0x08;
    pub const DIRECTORY: u8 = 0x10;
    pub const ARCHIVE: u8 = 0x20;

    pub fn from_bits(bits: u8) -> Self {
        Attributes(bits)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn read_only(&self) -> bool {
        self.0 & Self::READ_ONLY != 0
    }

    pub fn hidden(&self) -> bool {
        self.0 & Self::HIDDEN != 0
    }

    pub fn system(&self) -> bool {
        self.0 & Self::SYSTEM != 0
    }

    pub fn volume_label(&self) -> bool {
        self.0 & Self::VOLUME_LABEL != 0
    }

    pub fn directory(&self) -> bool {
        self.0 & Self::DIRECTORY != 0
    }

    pub fn archive(&self) -> bool {
        self.0 & Self::ARCHIVE != 0
    }
}

/// Renders the attributes as `RHSVDA`, with `-` for every flag not set.
impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.read_only(), 'R'),
            (self.hidden(), 'H'),
            (self.system(), 'S'),
            (self.volume_label(), 'V'),
            (self.directory(), 'D'),
            (self.archive(), 'A'),
        ];
        for (set, c) in flags {
            write!(f, "{}", if set { c } else { '-' })?;
        }
        Ok(())
    }
}

/// Packed time and date pair.
///
/// Time: bits 0-4 seconds / 2, bits 5-10 minutes, bits 11-15 hours.
/// Date: bits 0-4 day, bits 5-8 month, bits 9-15 years since 2000.
#[derive(BinRead, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[br(little)]
pub struct Timestamp {
    time: u16,
    date: u16,
}

impl Timestamp {
    pub fn new(time: u16, date: u16) -> Self {
        Timestamp { time, date }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_fatx_datetime(self.date, self.time))
    }
}

/// Formats a packed date and time as `YYYY-MM-DD HH:MM:SS`.
///
/// Returns an empty string when both values are zero.
pub fn format_fatx_datetime(date: u16, time: u16) -> String {
    if date == 0 && time == 0 {
        return String::new();
    }

    let day = date & 0x1F;
    let month = (date >> 5) & 0x0F;
    let year = 2000 + (date >> 9);
    let second = (time & 0x1F) * 2;
    let minute = (time >> 5) & 0x3F;
    let hour = time >> 11;

    format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")
}

/// FATX directory entry structure.
///
/// # Notes
/// - `name_len` is kept raw, see [`DirEntry::name_len`] for the decoded length
/// - The name field is padded with 0xFF and is not null-terminated
#[derive(BinRead, Debug, Clone, Getters)]
#[br(little)]
pub struct DirEntry {
    /// Length of the name, or a deletion marker
    name_len: u8,
    /// File attributes byte
    #[br(map = |raw: u8| Attributes::from_bits(raw))]
    #[get = "pub"]
    attributes: Attributes,
    /// Name in ASCII
    #[br(count = MAX_NAME_LEN)]
    name: Vec<u8>,
    /// First cluster of the file or directory
    #[get = "pub"]
    first_cluster: u32,
    /// File size in bytes (0 for directories)
    #[get = "pub"]
    file_size: u32,
    /// Last modification
    #[get = "pub"]
    modified: Timestamp,
    /// Creation
    #[get = "pub"]
    created: Timestamp,
    /// Last access
    #[get = "pub"]
    accessed: Timestamp,
}

impl DirEntry {
    /// Decodes one directory record from the front of a byte slice.
    ///
    /// # Returns
    /// - `Ok(Some(DirEntry))`: The decoded entry, deleted entries included
    /// - `Ok(None)`: The record marks the end of the directory list
    ///
    /// # Errors
    /// - `FATXError::InvalidNameLength`: If the name length exceeds 42 bytes
    /// - `FATXError::BinReadError`: If the slice is shorter than a record
    pub fn from_slice(buf: &[u8]) -> Result<Option<Self>, FATXError> {
        let mut reader = io::Cursor::new(buf);
        let entry: DirEntry = reader.read_le()?;

        match entry.name_len {
            0x00 | END_MARKER => Ok(None),
            DELETED_MARKER => Ok(Some(entry)),
            len if len as usize > MAX_NAME_LEN => Err(FATXError::InvalidNameLength(len)),
            _ => Ok(Some(entry)),
        }
    }

    /// Checks if the entry was deleted.
    pub fn is_deleted(&self) -> bool {
        self.name_len == DELETED_MARKER
    }

    /// Checks if this directory entry represents a directory.
    pub fn is_dir(&self) -> bool {
        self.attributes.directory()
    }

    /// Returns the decoded length of the name.
    ///
    /// The length of a deleted entry is lost, the whole name field is used instead.
    pub fn name_len(&self) -> usize {
        if self.is_deleted() {
            MAX_NAME_LEN
        } else {
            self.name_len as usize
        }
    }

    /// Returns the name of the entry, keeping only its printable ASCII characters.
    pub fn name(&self) -> String {
        let len = self.name_len().min(self.name.len());
        printable_ascii(&self.name[..len])
    }
}

impl fmt::Display for DirEntry {
    /// Formats the directory entry for display.
    ///
    /// # Returns
    /// - The attributes, the name and, for files, the size
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.attributes)?;
        if self.is_deleted() {
            write!(f, "[deleted] ")?;
        }
        if self.is_dir() {
            write!(f, "\"{}/\"", self.name())
        } else {
            write!(f, "\"{}\" {}B", self.name(), self.file_size)
        }
    }
}

/// Lazy decoder of the records of a directory.
///
/// It yields the entries found in the concatenated clusters of a directory until the end
/// marker, the end of the buffer or the first invalid record, which is yielded as an error.
pub struct DirEntries {
    buf: Vec<u8>,
    pos: usize,
    done: bool,
}

impl DirEntries {
    pub fn new(buf: Vec<u8>) -> Self {
        Self {
            buf,
            pos: 0,
            done: false,
        }
    }
}

impl Iterator for DirEntries {
    type Item = Result<DirEntry, FATXError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos + DIR_ENTRY_SIZE > self.buf.len() {
            self.done = true;
            return None;
        }

        let record = &self.buf[self.pos..self.pos + DIR_ENTRY_SIZE];
        self.pos += DIR_ENTRY_SIZE;

        match DirEntry::from_slice(record) {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for DirEntries {}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name_len: u8, name: &[u8], attr: u8, cluster: u32, size: u32) -> Vec<u8> {
        let mut buf = vec![0xFFu8; DIR_ENTRY_SIZE];
        buf[0] = name_len;
        buf[1] = attr;
        buf[2..2 + name.len()].copy_from_slice(name);
        buf[44..48].copy_from_slice(&cluster.to_le_bytes());
        buf[48..52].copy_from_slice(&size.to_le_bytes());
        buf[52..64].fill(0);
        buf
    }

    #[test]
    fn test_decode_file_entry() {
        let attrs = Attributes::ARCHIVE | Attributes::HIDDEN;
        let mut buf = record(8, b"save.xbx", attrs, 7, 1234);
        // Modification: 2005-03-14 10:20:30
        let time = (10u16 << 11) | (20 << 5) | 15;
        let date = (5u16 << 9) | (3 << 5) | 14;
        buf[52..54].copy_from_slice(&time.to_le_bytes());
        buf[54..56].copy_from_slice(&date.to_le_bytes());

        let entry = DirEntry::from_slice(&buf).unwrap().unwrap();
        assert_eq!(entry.name(), "save.xbx");
        assert_eq!(*entry.first_cluster(), 7);
        assert_eq!(*entry.file_size(), 1234);
        assert_eq!(entry.attributes().bits(), attrs);
        assert!(entry.attributes().archive());
        assert!(entry.attributes().hidden());
        assert_eq!(*entry.modified(), Timestamp::new(time, date));
        assert!(!entry.is_dir());
        assert!(!entry.is_deleted());
        assert_eq!(entry.modified().to_string(), "2005-03-14 10:20:30");
        assert_eq!(entry.created().to_string(), "");
    }

    #[test]
    fn test_name_truncated_to_name_len() {
        let buf = record(4, b"gamesave", 0, 2, 0);
        let entry = DirEntry::from_slice(&buf).unwrap().unwrap();
        assert_eq!(entry.name(), "game");
    }

    #[test]
    fn test_name_drops_non_printable() {
        let buf = record(6, b"a\x01b\x7Fcd", 0, 2, 0);
        let entry = DirEntry::from_slice(&buf).unwrap().unwrap();
        assert_eq!(entry.name(), "abcd");
    }

    #[test]
    fn test_end_markers() {
        assert!(DirEntry::from_slice(&record(0x00, b"", 0, 0, 0)).unwrap().is_none());
        assert!(DirEntry::from_slice(&[0xFFu8; 64]).unwrap().is_none());
    }

    #[test]
    fn test_deleted_entry() {
        let buf = record(DELETED_MARKER, b"old.txt", Attributes::DIRECTORY, 5, 0);
        let entry = DirEntry::from_slice(&buf).unwrap().unwrap();
        assert!(entry.is_deleted());
        assert!(entry.is_dir());
        assert_eq!(entry.name_len(), 42);
        assert_eq!(entry.name(), "old.txt");
    }

    #[test]
    fn test_invalid_name_len() {
        for len in [43u8, 0x80, 0xE4, 0xFE] {
            let err = DirEntry::from_slice(&record(len, b"x", 0, 1, 0)).unwrap_err();
            assert!(matches!(err, FATXError::InvalidNameLength(l) if l == len));
        }
    }

    #[test]
    fn test_attributes() {
        let attr = Attributes::from_bits(Attributes::READ_ONLY | Attributes::DIRECTORY);
        assert!(attr.read_only());
        assert!(attr.directory());
        assert!(!attr.hidden() && !attr.system() && !attr.volume_label() && !attr.archive());
        assert_eq!(attr.to_string(), "R---D-");
    }

    #[test]
    fn test_dir_entries_stop_at_end_marker() {
        let mut buf = record(1, b"a", 0, 2, 1);
        buf.extend(record(DELETED_MARKER, b"b", 0, 3, 1));
        buf.extend(record(0xFF, b"", 0, 0, 0));
        buf.extend(record(1, b"c", 0, 4, 1));

        let names: Vec<String> = DirEntries::new(buf)
            .map(|entry| entry.unwrap().name())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_dir_entries_zero_length_ends_list() {
        let mut buf = record(1, b"a", 0, 2, 1);
        buf.extend(vec![0u8; DIR_ENTRY_SIZE]);
        buf.extend(record(1, b"c", 0, 4, 1));
        assert_eq!(DirEntries::new(buf).count(), 1);
    }

    #[test]
    fn test_dir_entries_error_is_last_item() {
        let mut buf = record(1, b"a", 0, 2, 1);
        buf.extend(record(50, b"b", 0, 3, 1));
        buf.extend(record(1, b"c", 0, 4, 1));

        let mut entries = DirEntries::new(buf);
        assert!(entries.next().unwrap().is_ok());
        assert!(matches!(
            entries.next().unwrap(),
            Err(FATXError::InvalidNameLength(50))
        ));
        assert!(entries.next().is_none());
    }

    #[test]
    fn test_dir_entries_ignore_trailing_fragment() {
        let mut buf = record(1, b"a", 0, 2, 1);
        buf.extend([1u8, 0, b'x']);
        assert_eq!(DirEntries::new(buf).count(), 1);
    }

    #[test]
    fn test_display() {
        let file = DirEntry::from_slice(&record(5, b"a.xbe", Attributes::HIDDEN, 2, 10))
            .unwrap()
            .unwrap();
        assert_eq!(file.to_string(), "-H---- \"a.xbe\" 10B");
        let dir = DirEntry::from_slice(&record(4, b"UDATA", Attributes::DIRECTORY, 2, 0))
            .unwrap()
            .unwrap();
        assert_eq!(dir.to_string(), "----D- \"UDAT/\"");
    }

    #[test]
    fn test_format_fatx_datetime() {
        // 2024-12-31 23:59:58
        let date = 31 | (12 << 5) | (24 << 9);
        let time = 29 | (59 << 5) | (23 << 11);
        assert_eq!(format_fatx_datetime(date, time), "2024-12-31 23:59:58");
        assert_eq!(format_fatx_datetime(0, 0), "");
    }
}
