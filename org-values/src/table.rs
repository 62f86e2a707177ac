//! Hybrid hash/array tables.
//!
//! A table is one physical open-addressed store holding both
//! integer-indexed positional values and string-keyed bindings. The entry
//! array lives in arena memory and is abandoned (never freed) on growth;
//! the arena reclaims it in bulk. Keys are exactly small integers or
//! strings; `UNUSED` marks vacant slots and never appears as a key.

use crate::arena::{Addr, Arena};
use crate::heap::{self, HeapKind};
use crate::word::Value;

/// Minimum capacity of a fresh table.
const MIN_CAPACITY: u32 = 8;

/// Bytes per entry: key word, value word, cached hash.
const ENTRY_SIZE: u64 = 24;

// Table payload offsets, relative to the object base.
const OFF_ENTRIES: u64 = 8;
const OFF_CAP: u64 = 16;
const OFF_COUNT: u64 = 20;
const OFF_NEXT_INDEX: u64 = 24;
const PAYLOAD_LEN: u32 = 24;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over a byte slice.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Two multiply-shift rounds for small-integer keys.
fn mix_int(value: i64) -> u64 {
    let mut h = value as u64;
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^ (h >> 33)
}

/// Handle to a table object in arena memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table(Addr);

enum Probe {
    /// Key present at this slot address.
    Found(Addr),
    /// Key absent; this is the first vacant slot on its probe path.
    Vacant(Addr),
}

impl Table {
    /// Allocate an empty table. The capacity hint rounds up to the next
    /// power of two, no smaller than 8.
    pub fn alloc(arena: &mut Arena, cap_hint: u32) -> Option<Table> {
        let cap = cap_hint.max(MIN_CAPACITY).next_power_of_two();
        let entries = Self::alloc_entries(arena, cap)?;

        let total = heap::HEADER_SIZE.checked_add(PAYLOAD_LEN)?;
        let addr = arena.alloc(total as usize, 8);
        if addr.is_null() {
            return None;
        }
        arena.write_u8(addr, HeapKind::Table as u8);
        arena.write_u8(addr.offset(1), 0);
        arena.write_u32(addr.offset(4), total);
        arena.write_u64(addr.offset(OFF_ENTRIES), entries.raw());
        arena.write_u32(addr.offset(OFF_CAP), cap);
        arena.write_u32(addr.offset(OFF_COUNT), 0);
        arena.write_i64(addr.offset(OFF_NEXT_INDEX), 0);
        Some(Table(addr))
    }

    /// View `value` as a table, if it is one.
    pub fn from_value(arena: &Arena, value: Value) -> Option<Table> {
        let addr = value.as_addr()?;
        (heap::kind_of(arena, addr) == HeapKind::Table).then_some(Table(addr))
    }

    /// The table as a tagged value word.
    pub fn as_value(self) -> Value {
        Value::from_addr(self.0)
    }

    fn alloc_entries(arena: &mut Arena, cap: u32) -> Option<Addr> {
        let bytes = ENTRY_SIZE.checked_mul(u64::from(cap))?;
        let entries = arena.alloc(bytes as usize, 8);
        if entries.is_null() {
            return None;
        }
        for slot in 0..cap {
            let at = entries.offset(u64::from(slot).wrapping_mul(ENTRY_SIZE));
            arena.write_u64(at, Value::UNUSED.raw());
        }
        Some(entries)
    }

    fn entries_addr(self, arena: &Arena) -> Addr {
        Addr::from_raw(arena.read_u64(self.0.offset(OFF_ENTRIES)))
    }

    fn capacity(self, arena: &Arena) -> u32 {
        arena.read_u32(self.0.offset(OFF_CAP))
    }

    /// Live entry count.
    pub fn len(self, arena: &Arena) -> u32 {
        arena.read_u32(self.0.offset(OFF_COUNT))
    }

    /// Whether the table holds no entries.
    pub fn is_empty(self, arena: &Arena) -> bool {
        self.len(arena) == 0
    }

    /// The next auto-assigned positional key.
    pub fn next_index(self, arena: &Arena) -> i64 {
        arena.read_i64(self.0.offset(OFF_NEXT_INDEX))
    }

    fn hash_key(arena: &Arena, key: Value) -> Option<u64> {
        if let Some(small) = key.as_small_int() {
            return Some(mix_int(small));
        }
        let addr = key.as_addr()?;
        (heap::kind_of(arena, addr) == HeapKind::Str)
            .then(|| fnv1a(heap::read_str(arena, addr).as_bytes()))
    }

    fn keys_equal(arena: &Arena, a: Value, b: Value) -> bool {
        if a == b {
            return true;
        }
        match (a.as_addr(), b.as_addr()) {
            (Some(pa), Some(pb)) => {
                heap::kind_of(arena, pa) == HeapKind::Str
                    && heap::kind_of(arena, pb) == HeapKind::Str
                    && heap::str_byte_len(arena, pa) == heap::str_byte_len(arena, pb)
                    && heap::read_str(arena, pa) == heap::read_str(arena, pb)
            }
            _ => false,
        }
    }

    fn probe(self, arena: &Arena, key: Value, hash: u64) -> Probe {
        let entries = self.entries_addr(arena);
        let cap = self.capacity(arena);
        let mask = u64::from(cap).saturating_sub(1);
        let mut index = hash & mask;
        // The 75% load cap guarantees a vacant slot on every probe path.
        for _ in 0..cap {
            let slot = entries.offset(index.wrapping_mul(ENTRY_SIZE));
            let stored = Value::from_raw_word(arena.read_u64(slot));
            if stored.is_unused() {
                return Probe::Vacant(slot);
            }
            if Self::keys_equal(arena, stored, key) {
                return Probe::Found(slot);
            }
            index = index.wrapping_add(1) & mask;
        }
        unreachable!("table probe exhausted a full pass without a vacant slot")
    }

    /// Insert or overwrite `key`, returning the table handle, or `ERROR`
    /// for a key that is neither a small integer nor a string.
    pub fn set(self, arena: &mut Arena, key: Value, value: Value) -> Value {
        let Some(hash) = Self::hash_key(arena, key) else {
            return Value::ERROR;
        };

        match self.probe(arena, key, hash) {
            Probe::Found(slot) => {
                arena.write_u64(slot.offset(8), value.raw());
            }
            Probe::Vacant(_) => {
                let count = self.len(arena);
                let cap = self.capacity(arena);
                // Grow before crossing the 75% load threshold.
                if u64::from(count).saturating_add(1).saturating_mul(4)
                    > u64::from(cap).saturating_mul(3)
                {
                    if !self.grow(arena) {
                        return Value::ERROR;
                    }
                }
                let slot = match self.probe(arena, key, hash) {
                    Probe::Vacant(slot) => slot,
                    Probe::Found(slot) => slot,
                };
                arena.write_u64(slot, key.raw());
                arena.write_u64(slot.offset(8), value.raw());
                arena.write_u64(slot.offset(16), hash);
                arena.write_u32(self.0.offset(OFF_COUNT), count.saturating_add(1));
            }
        }
        self.as_value()
    }

    /// Append `value` at the next positional index, returning the key.
    pub fn push(self, arena: &mut Arena, value: Value) -> Value {
        let index = self.next_index(arena);
        let Some(key) = Value::from_small_int(index) else {
            return Value::ERROR;
        };
        if self.set(arena, key, value).is_error() {
            return Value::ERROR;
        }
        arena.write_i64(self.0.offset(OFF_NEXT_INDEX), index.saturating_add(1));
        key
    }

    /// Look up `key`, yielding `ERROR` on a miss or invalid key.
    pub fn get(self, arena: &Arena, key: Value) -> Value {
        let Some(hash) = Self::hash_key(arena, key) else {
            return Value::ERROR;
        };
        match self.probe(arena, key, hash) {
            Probe::Found(slot) => Value::from_raw_word(arena.read_u64(slot.offset(8))),
            Probe::Vacant(_) => Value::ERROR,
        }
    }

    /// Look up a string key without materializing a string object.
    ///
    /// This is the hot path for variable lookup: the name is hashed
    /// directly and compared against inline string entries.
    pub fn get_by_str(self, arena: &Arena, name: &str) -> Value {
        let hash = fnv1a(name.as_bytes());
        let entries = self.entries_addr(arena);
        let cap = self.capacity(arena);
        let mask = u64::from(cap).saturating_sub(1);
        let mut index = hash & mask;
        for _ in 0..cap {
            let slot = entries.offset(index.wrapping_mul(ENTRY_SIZE));
            let stored = Value::from_raw_word(arena.read_u64(slot));
            if stored.is_unused() {
                return Value::ERROR;
            }
            if arena.read_u64(slot.offset(16)) == hash {
                if let Some(addr) = stored.as_addr() {
                    if heap::kind_of(arena, addr) == HeapKind::Str
                        && heap::read_str(arena, addr) == name
                    {
                        return Value::from_raw_word(arena.read_u64(slot.offset(8)));
                    }
                }
            }
            index = index.wrapping_add(1) & mask;
        }
        Value::ERROR
    }

    /// Whether `key` is present.
    pub fn has(self, arena: &Arena, key: Value) -> bool {
        Self::hash_key(arena, key)
            .is_some_and(|hash| matches!(self.probe(arena, key, hash), Probe::Found(_)))
    }

    /// Live `(key, value)` pairs in slot order.
    pub fn entries(self, arena: &Arena) -> Vec<(Value, Value)> {
        let entries = self.entries_addr(arena);
        let cap = self.capacity(arena);
        (0..cap)
            .filter_map(|slot| {
                let at = entries.offset(u64::from(slot).wrapping_mul(ENTRY_SIZE));
                let key = Value::from_raw_word(arena.read_u64(at));
                (!key.is_unused()).then(|| {
                    (key, Value::from_raw_word(arena.read_u64(at.offset(8))))
                })
            })
            .collect()
    }

    /// Double the capacity and rehash every live entry. The old entry
    /// array is abandoned; the arena reclaims it in bulk.
    fn grow(self, arena: &mut Arena) -> bool {
        let old_entries = self.entries_addr(arena);
        let old_cap = self.capacity(arena);
        let Some(new_cap) = old_cap.checked_mul(2) else {
            return false;
        };
        let Some(new_entries) = Self::alloc_entries(arena, new_cap) else {
            return false;
        };

        let mask = u64::from(new_cap).saturating_sub(1);
        for slot in 0..old_cap {
            let at = old_entries.offset(u64::from(slot).wrapping_mul(ENTRY_SIZE));
            let key = arena.read_u64(at);
            if Value::from_raw_word(key).is_unused() {
                continue;
            }
            let value = arena.read_u64(at.offset(8));
            let hash = arena.read_u64(at.offset(16));

            let mut index = hash & mask;
            loop {
                let dst = new_entries.offset(index.wrapping_mul(ENTRY_SIZE));
                if Value::from_raw_word(arena.read_u64(dst)).is_unused() {
                    arena.write_u64(dst, key);
                    arena.write_u64(dst.offset(8), value);
                    arena.write_u64(dst.offset(16), hash);
                    break;
                }
                index = index.wrapping_add(1) & mask;
            }
        }

        arena.write_u64(self.0.offset(OFF_ENTRIES), new_entries.raw());
        arena.write_u32(self.0.offset(OFF_CAP), new_cap);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::ObjFlags;
    use quickcheck_macros::quickcheck;
    use rstest::{fixture, rstest};

    #[fixture]
    fn fixture() -> (Arena, Table) {
        let mut arena = Arena::new();
        let table = Table::alloc(&mut arena, 0).unwrap();
        (arena, table)
    }

    #[test]
    fn capacity_hint_rounds_up() {
        let mut arena = Arena::new();
        let t = Table::alloc(&mut arena, 9).unwrap();
        assert_eq!(t.capacity(&arena), 16);
        let t = Table::alloc(&mut arena, 0).unwrap();
        assert_eq!(t.capacity(&arena), 8);
    }

    #[rstest]
    fn set_then_get_both_key_kinds(fixture: (Arena, Table)) {
        let (mut arena, t) = fixture;
        let k_int = Value::from_small_int(7).unwrap();
        let name = heap::alloc_str(&mut arena, "answer", ObjFlags::empty());
        let v1 = Value::from_small_int(1).unwrap();
        let v2 = Value::from_small_int(42).unwrap();

        t.set(&mut arena, k_int, v1);
        t.set(&mut arena, name, v2);
        assert_eq!(t.len(&arena), 2);
        assert_eq!(t.get(&arena, k_int), v1);
        assert_eq!(t.get(&arena, name), v2);
        assert_eq!(t.get_by_str(&arena, "answer"), v2);
    }

    #[test]
    fn string_keys_compare_by_content() {
        let (mut arena, t) = fixture();
        let k1 = heap::alloc_str(&mut arena, "key", ObjFlags::empty());
        let k2 = heap::alloc_str(&mut arena, "key", ObjFlags::empty());
        let v = Value::from_small_int(1).unwrap();
        t.set(&mut arena, k1, v);
        assert!(t.has(&arena, k2));
        assert_eq!(t.len(&arena), 1);
    }

    #[test]
    fn overwrite_does_not_bump_count() {
        let (mut arena, t) = fixture();
        let k = Value::from_small_int(3).unwrap();
        t.set(&mut arena, k, Value::TRUE);
        t.set(&mut arena, k, Value::FALSE);
        assert_eq!(t.len(&arena), 1);
        assert_eq!(t.get(&arena, k), Value::FALSE);
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let (mut arena, t) = fixture();
        assert_eq!(t.set(&mut arena, Value::TRUE, Value::FALSE), Value::ERROR);
        assert_eq!(t.get(&arena, Value::TRUE), Value::ERROR);
        let other = Table::alloc(&mut arena, 0).unwrap().as_value();
        assert_eq!(t.set(&mut arena, other, Value::TRUE), Value::ERROR);
    }

    #[test]
    fn missing_key_is_an_error_not_a_trap() {
        let (arena, t) = fixture();
        let k = Value::from_small_int(99).unwrap();
        assert_eq!(t.get(&arena, k), Value::ERROR);
        assert!(!t.has(&arena, k));
    }

    #[rstest]
    fn push_assigns_ascending_indices(fixture: (Arena, Table)) {
        let (mut arena, t) = fixture;
        for i in 0..5i64 {
            let v = Value::from_small_int(i * 10).unwrap();
            let key = t.push(&mut arena, v);
            assert_eq!(key.as_small_int(), Some(i));
        }
        for i in 0..5i64 {
            let k = Value::from_small_int(i).unwrap();
            assert_eq!(t.get(&arena, k).as_small_int(), Some(i * 10));
        }
        assert_eq!(t.next_index(&arena), 5);
    }

    #[test]
    fn growth_preserves_every_mapping() {
        let (mut arena, t) = fixture();
        // Push enough entries to force 8 -> 16 -> 32 growth.
        for i in 0..20i64 {
            t.push(&mut arena, Value::from_small_int(i + 100).unwrap());
        }
        assert_eq!(t.len(&arena), 20);
        assert!(t.capacity(&arena) >= 32);
        for i in 0..20i64 {
            let k = Value::from_small_int(i).unwrap();
            assert_eq!(t.get(&arena, k).as_small_int(), Some(i + 100));
        }
    }

    #[test]
    fn growth_keeps_string_keys_reachable() {
        let (mut arena, t) = fixture();
        let names: Vec<String> = (0..12).map(|i| format!("name{i}")).collect();
        for (i, name) in names.iter().enumerate() {
            let k = heap::alloc_str(&mut arena, name, ObjFlags::empty());
            t.set(&mut arena, k, Value::from_small_int(i as i64).unwrap());
        }
        for (i, name) in names.iter().enumerate() {
            assert_eq!(
                t.get_by_str(&arena, name).as_small_int(),
                Some(i as i64)
            );
        }
    }

    #[quickcheck]
    fn qc_distinct_keys_count_and_latest_value(keys: Vec<i16>) -> bool {
        let (mut arena, t) = fixture();
        let mut model = std::collections::HashMap::new();
        for (i, key) in keys.iter().enumerate() {
            let k = Value::from_small_int(*key as i64).unwrap();
            let v = Value::from_small_int(i as i64).unwrap();
            t.set(&mut arena, k, v);
            model.insert(*key, i as i64);
        }
        model.len() as u32 == t.len(&arena)
            && model.iter().all(|(key, expected)| {
                let k = Value::from_small_int(*key as i64).unwrap();
                t.get(&arena, k).as_small_int() == Some(*expected)
            })
    }
}
