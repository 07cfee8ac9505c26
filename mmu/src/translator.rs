use backing_store::{PageStore, StoreError};
use log::info;
use memory::{MemoryError, PhysicalMemory};
use thiserror::Error;

use crate::page_table::{FlatTable, TwoLevelTable};
use crate::tlb::{Tlb, TlbKey, TLB_ENTRIES};

/// Words addressed by one 16-bit-mode frame.
pub const PAGE_SIZE_16: usize = 256;
/// Words addressed by one 32-bit-mode frame.
pub const PAGE_SIZE_32: usize = 4096;

pub const MAX_ADDRESS_16: u64 = 0xFFFF;
pub const MAX_ADDRESS_32: u64 = 0xFFFF_FFFF;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("invalid address {0:?}: expected decimal or 0x-prefixed hex")]
    BadAddress(String),
    #[error("address {address:#x} is outside the addressable range")]
    AddressOutOfRange { address: u64 },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Splits a 16-bit address into (page, offset).
pub fn split16(address: u16) -> (u8, u8) {
    ((address >> 8) as u8, (address & 0xFF) as u8)
}

/// Splits a 32-bit address into (directory, table, offset).
pub fn split32(address: u32) -> (u16, u16, u16) {
    (
        ((address >> 22) & 0x3FF) as u16,
        ((address >> 12) & 0x3FF) as u16,
        (address & 0xFFF) as u16,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation16 {
    pub page: u8,
    pub offset: u8,
    pub value: i64,
    pub tlb_hit: bool,
    pub page_hit: bool,
    pub loaded_from_store: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation32 {
    pub directory: u16,
    pub table: u16,
    pub offset: u16,
    pub value: i64,
    pub tlb_hit: bool,
    pub page_hit: bool,
    pub loaded_from_store: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    Bit16(Translation16),
    Bit32(Translation32),
}

/// Owns the whole translation state: TLB, both page tables, physical
/// memory and the backing store. Not synchronized; one caller drives
/// it through `&mut self`.
pub struct Translator<S: PageStore> {
    tlb: Tlb,
    flat: FlatTable,
    two_level: TwoLevelTable,
    memory: PhysicalMemory,
    store: S,
    next_frame: u32,
}

impl<S: PageStore> Translator<S> {
    pub fn new(memory: PhysicalMemory, store: S) -> Self {
        Translator {
            tlb: Tlb::new(TLB_ENTRIES),
            flat: FlatTable::new(),
            two_level: TwoLevelTable::new(),
            memory,
            store,
            next_frame: 0,
        }
    }

    pub fn memory(&self) -> &PhysicalMemory {
        &self.memory
    }

    /// Routes by magnitude: addresses up to 0xFFFF take the 16-bit
    /// path, anything larger that fits 32 bits takes the 32-bit path.
    pub fn translate(&mut self, address: u64) -> Result<Translation, TranslateError> {
        if address <= MAX_ADDRESS_16 {
            self.translate16(address as u32).map(Translation::Bit16)
        } else if address <= MAX_ADDRESS_32 {
            self.translate32(address).map(Translation::Bit32)
        } else {
            Err(TranslateError::AddressOutOfRange { address })
        }
    }

    pub fn translate16(&mut self, address: u32) -> Result<Translation16, TranslateError> {
        if u64::from(address) > MAX_ADDRESS_16 {
            return Err(TranslateError::AddressOutOfRange {
                address: address.into(),
            });
        }
        let (page, offset) = split16(address as u16);
        let key = TlbKey::Page { page };

        let cached = self.tlb.get(key);
        let tlb_hit = cached.is_some();
        let (frame, page_hit, loaded_from_store) = match cached {
            // a cached page is resident by construction
            Some(frame) => (frame, true, false),
            None => {
                let entry = self.flat.entry_mut(page);
                let (frame, page_hit, loaded) = match entry.mapped_frame() {
                    Some(frame) => {
                        entry.mark_accessed();
                        (frame, true, false)
                    }
                    None => {
                        info!("page fault: loading page {} from the backing store", page);
                        let word = self.store.load(page as usize)?;
                        let frame = self.next_frame;
                        self.next_frame += 1;
                        self.memory.append(word);
                        entry.assign_frame(frame);
                        (frame, false, true)
                    }
                };
                self.tlb.put(key, frame);
                (frame, page_hit, loaded)
            }
        };

        let physical = frame as usize * PAGE_SIZE_16 + offset as usize;
        let value = self.memory.read(physical)?;
        Ok(Translation16 {
            page,
            offset,
            value,
            tlb_hit,
            page_hit,
            loaded_from_store,
        })
    }

    pub fn translate32(&mut self, address: u64) -> Result<Translation32, TranslateError> {
        if address > MAX_ADDRESS_32 {
            return Err(TranslateError::AddressOutOfRange { address });
        }
        let (directory, table, offset) = split32(address as u32);
        let key = TlbKey::Directory { directory, table };

        let cached = self.tlb.get(key);
        let tlb_hit = cached.is_some();
        let (frame, page_hit, loaded_from_store) = match cached {
            Some(frame) => (frame, true, false),
            None => {
                if !self.two_level.has_directory(directory) {
                    info!("creating page table for directory {}", directory);
                }
                let entry = self.two_level.entry_mut(directory, table);
                let (frame, page_hit, loaded) = match entry.mapped_frame() {
                    Some(frame) => {
                        entry.mark_accessed();
                        (frame, true, false)
                    }
                    None => {
                        let page_index = (usize::from(directory) << 10) | usize::from(table);
                        info!(
                            "page fault: loading page {} ({}-{}) from the backing store",
                            page_index, directory, table
                        );
                        let word = self.store.load(page_index)?;
                        // frames in this mode derive from the address,
                        // independent of the 16-bit counter
                        let frame = u32::from(directory) * 1024 + u32::from(table);
                        self.memory.append(word);
                        entry.assign_frame(frame);
                        (frame, false, true)
                    }
                };
                self.tlb.put(key, frame);
                (frame, page_hit, loaded)
            }
        };

        let physical = frame as usize * PAGE_SIZE_32 + usize::from(offset);
        let value = self.memory.read(physical)?;
        Ok(Translation32 {
            directory,
            table,
            offset,
            value,
            tlb_hit,
            page_hit,
            loaded_from_store,
        })
    }
}
