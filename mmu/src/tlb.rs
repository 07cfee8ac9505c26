use log::debug;

/// Translation lookaside buffer capacity.
pub const TLB_ENTRIES: usize = 16;

/// Lookup key: a bare page number in 16-bit mode, a directory/table
/// pair in 32-bit mode. The two modes share one buffer but their keys
/// never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlbKey {
    Page { page: u8 },
    Directory { directory: u16, table: u16 },
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    key: TlbKey,
    frame: u32,
    stamp: u64,
}

/// Fixed-capacity associative cache mapping translation keys to
/// physical frames. Recency is tracked with an access-order counter;
/// the slot with the oldest stamp is the eviction victim.
#[derive(Debug)]
pub struct Tlb {
    slots: Vec<Slot>,
    capacity: usize,
    clock: u64,
}

impl Tlb {
    pub fn new(capacity: usize) -> Self {
        Tlb {
            slots: Vec::with_capacity(capacity),
            capacity,
            clock: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Returns the cached frame and refreshes the key's recency.
    /// A miss has no side effects.
    pub fn get(&mut self, key: TlbKey) -> Option<u32> {
        let stamp = self.tick();
        let slot = self.slots.iter_mut().find(|slot| slot.key == key)?;
        slot.stamp = stamp;
        Some(slot.frame)
    }

    /// Inserts or refreshes a mapping, evicting the least recently
    /// used slot when the buffer is full.
    pub fn put(&mut self, key: TlbKey, frame: u32) {
        let stamp = self.tick();
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.key == key) {
            slot.frame = frame;
            slot.stamp = stamp;
            return;
        }
        let fresh = Slot { key, frame, stamp };
        if self.slots.len() < self.capacity {
            self.slots.push(fresh);
            return;
        }
        let victim = self
            .slots
            .iter()
            .enumerate()
            .min_by_key(|(_, slot)| slot.stamp)
            .map(|(index, _)| index);
        if let Some(victim) = victim {
            debug!("tlb full, evicting {:?}", self.slots[victim].key);
            self.slots[victim] = fresh;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u8) -> TlbKey {
        TlbKey::Page { page }
    }

    #[test]
    fn test_get_miss_has_no_side_effects() {
        let mut tlb = Tlb::new(TLB_ENTRIES);
        assert_eq!(tlb.get(page(1)), None);
        assert!(tlb.is_empty());
    }

    #[test]
    fn test_put_then_get() {
        let mut tlb = Tlb::new(TLB_ENTRIES);
        tlb.put(page(1), 7);
        assert_eq!(tlb.get(page(1)), Some(7));
        assert_eq!(tlb.len(), 1);
    }

    #[test]
    fn test_put_existing_key_updates_frame() {
        let mut tlb = Tlb::new(TLB_ENTRIES);
        tlb.put(page(1), 7);
        tlb.put(page(1), 9);
        assert_eq!(tlb.len(), 1);
        assert_eq!(tlb.get(page(1)), Some(9));
    }

    #[test]
    fn test_seventeenth_key_evicts_least_recently_used() {
        let mut tlb = Tlb::new(TLB_ENTRIES);
        for p in 0..16 {
            tlb.put(page(p), p as u32);
        }
        assert_eq!(tlb.len(), 16);
        tlb.put(page(16), 16);
        assert_eq!(tlb.len(), 16);
        assert_eq!(tlb.get(page(0)), None);
        for p in 1..17 {
            assert_eq!(tlb.get(page(p)), Some(p as u32));
        }
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut tlb = Tlb::new(TLB_ENTRIES);
        for p in 0..16 {
            tlb.put(page(p), p as u32);
        }
        assert_eq!(tlb.get(page(0)), Some(0));
        tlb.put(page(16), 16);
        // page 1 became the oldest once page 0 was touched
        assert_eq!(tlb.get(page(1)), None);
        assert_eq!(tlb.get(page(0)), Some(0));
    }

    #[test]
    fn test_mode_keys_do_not_collide() {
        let mut tlb = Tlb::new(TLB_ENTRIES);
        tlb.put(page(3), 3);
        tlb.put(
            TlbKey::Directory {
                directory: 0,
                table: 3,
            },
            99,
        );
        assert_eq!(tlb.get(page(3)), Some(3));
        assert_eq!(tlb.len(), 2);
    }

    #[test]
    fn test_random_accesses_match_naive_model() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0x7_1b);
        let capacity = 4;
        let mut tlb = Tlb::new(capacity);
        // model keeps least recently used at the front
        let mut model: Vec<(TlbKey, u32)> = Vec::new();

        for _ in 0..10_000 {
            let key = page(rng.gen_range(0..12));
            if rng.gen_bool(0.5) {
                let frame = rng.gen_range(0..100);
                if let Some(pos) = model.iter().position(|(k, _)| *k == key) {
                    model.remove(pos);
                } else if model.len() == capacity {
                    model.remove(0);
                }
                model.push((key, frame));
                tlb.put(key, frame);
            } else {
                let expected = model.iter().position(|(k, _)| *k == key).map(|pos| {
                    let entry = model.remove(pos);
                    model.push(entry);
                    entry.1
                });
                assert_eq!(tlb.get(key), expected);
            }
            assert!(tlb.len() <= capacity);
        }
    }
}
