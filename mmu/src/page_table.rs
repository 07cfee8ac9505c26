use std::collections::HashMap;

use bitflags::bitflags;

/// Entries in the flat 16-bit-mode table.
pub const FLAT_TABLE_LEN: usize = 256;
/// Entries in one inner 32-bit-mode table.
pub const INNER_TABLE_LEN: usize = 1024;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntryFlags: u8 {
        const VALID = 1 << 0;
        const ACCESSED = 1 << 1;
        /// Tracked but never set: no write path exists.
        const DIRTY = 1 << 2;
    }
}

/// One page-table entry. Starts invalid with no frame; becomes valid
/// exactly once, when the owning page is first loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageTableEntry {
    flags: EntryFlags,
    frame: Option<u32>,
}

impl PageTableEntry {
    pub fn is_valid(&self) -> bool {
        self.flags.contains(EntryFlags::VALID)
    }

    pub fn is_accessed(&self) -> bool {
        self.flags.contains(EntryFlags::ACCESSED)
    }

    pub fn is_dirty(&self) -> bool {
        self.flags.contains(EntryFlags::DIRTY)
    }

    /// Frame of a valid entry; `None` while the page has never been
    /// loaded.
    pub fn mapped_frame(&self) -> Option<u32> {
        if self.is_valid() {
            self.frame
        } else {
            None
        }
    }

    pub fn mark_accessed(&mut self) {
        self.flags.insert(EntryFlags::ACCESSED);
    }

    pub fn assign_frame(&mut self, frame: u32) {
        self.frame = Some(frame);
        self.flags.insert(EntryFlags::VALID | EntryFlags::ACCESSED);
    }
}

/// Flat page table for 16-bit addresses. All 256 entries exist up
/// front in the invalid state, which absorbs "create entry on first
/// reference"; entries are never removed.
#[derive(Debug)]
pub struct FlatTable {
    entries: Box<[PageTableEntry; FLAT_TABLE_LEN]>,
}

impl Default for FlatTable {
    fn default() -> Self {
        FlatTable {
            entries: Box::new([PageTableEntry::default(); FLAT_TABLE_LEN]),
        }
    }
}

impl FlatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, page: u8) -> &PageTableEntry {
        &self.entries[page as usize]
    }

    pub fn entry_mut(&mut self, page: u8) -> &mut PageTableEntry {
        &mut self.entries[page as usize]
    }
}

/// Two-level page table for 32-bit addresses. Inner tables are
/// allocated the first time their directory is referenced and persist
/// for the table's lifetime.
#[derive(Debug, Default)]
pub struct TwoLevelTable {
    directories: HashMap<u16, Box<[PageTableEntry; INNER_TABLE_LEN]>>,
}

impl TwoLevelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_directory(&self, directory: u16) -> bool {
        self.directories.contains_key(&directory)
    }

    pub fn entry(&self, directory: u16, table: u16) -> Option<&PageTableEntry> {
        self.directories
            .get(&directory)
            .map(|inner| &inner[table as usize])
    }

    pub fn entry_mut(&mut self, directory: u16, table: u16) -> &mut PageTableEntry {
        let inner = self
            .directories
            .entry(directory)
            .or_insert_with(|| Box::new([PageTableEntry::default(); INNER_TABLE_LEN]));
        &mut inner[table as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_starts_invalid() {
        let entry = PageTableEntry::default();
        assert!(!entry.is_valid());
        assert!(!entry.is_accessed());
        assert!(!entry.is_dirty());
        assert_eq!(entry.mapped_frame(), None);
    }

    #[test]
    fn test_assign_frame_validates_entry() {
        let mut entry = PageTableEntry::default();
        entry.assign_frame(5);
        assert!(entry.is_valid());
        assert!(entry.is_accessed());
        assert!(!entry.is_dirty());
        assert_eq!(entry.mapped_frame(), Some(5));
    }

    #[test]
    fn test_flat_table_entries_exist_invalid() {
        let table = FlatTable::new();
        assert!(!table.entry(0).is_valid());
        assert!(!table.entry(255).is_valid());
    }

    #[test]
    fn test_two_level_table_allocates_directory_lazily() {
        let mut table = TwoLevelTable::new();
        assert!(!table.has_directory(1));
        assert!(table.entry(1, 3).is_none());

        table.entry_mut(1, 3).assign_frame(1027);
        assert!(table.has_directory(1));
        assert_eq!(table.entry(1, 3).unwrap().mapped_frame(), Some(1027));
        // siblings in the same directory exist but stay invalid
        assert!(!table.entry(1, 4).unwrap().is_valid());
    }
}
