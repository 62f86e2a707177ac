//! Chained bump-pointer arena.
//!
//! The arena owns a chain of pages and hands out addresses in a private
//! 64-bit address space. Individual allocations are never freed; the whole
//! chain rewinds to a [`Checkpoint`] or is released when the arena drops.
//! Addresses handed out after a [`Arena::save`] become invalid at the
//! matching [`Arena::restore`].

use tracing::trace;

/// Default capacity of a freshly chained page, in bytes.
pub const DEFAULT_PAGE_SIZE: usize = 16 * 1024;

/// Base of the first page. Address zero is reserved as the null sentinel.
const FIRST_BASE: u64 = 0x1000;

/// An address inside an [`Arena`].
///
/// Addresses are opaque to callers; the only observable guarantees are the
/// alignment requested at allocation time and stability until the
/// enclosing checkpoint is restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Addr(u64);

impl Addr {
    /// The null sentinel, returned only when the host refuses memory.
    pub const NULL: Self = Self(0);

    /// Raw 64-bit representation.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Rebuild an address from its raw representation.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Whether this is the null sentinel.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Address `count` bytes past this one.
    pub fn offset(self, count: u64) -> Self {
        Self(self.0.saturating_add(count))
    }
}

struct Page {
    base: u64,
    cap: usize,
    buf: Vec<u8>,
}

impl Page {
    fn used(&self) -> usize {
        self.buf.len()
    }

    fn end(&self) -> u64 {
        self.base.saturating_add(self.cap as u64)
    }
}

/// A point-in-time snapshot of the arena, produced by [`Arena::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pages: usize,
    used: usize,
}

/// Chained bump-pointer allocator.
pub struct Arena {
    /// Pages ordered oldest first; the last entry is the current page.
    pages: Vec<Page>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// Create an empty arena. The first page is chained on first use.
    pub fn new() -> Self {
        Self { pages: Vec::new() }
    }

    /// Allocate `size` bytes aligned to `align` (a power of two).
    ///
    /// Oversized requests get a page of their own instead of wasting the
    /// remainder of the current page. Returns [`Addr::NULL`] only when the
    /// host allocator refuses the page.
    pub fn alloc(&mut self, size: usize, align: usize) -> Addr {
        debug_assert!(align.is_power_of_two());
        let align = align.max(1);

        if let Some(page) = self.pages.last_mut() {
            let cursor = page.base.saturating_add(page.used() as u64);
            if let Some(aligned) = round_up(cursor, align as u64) {
                let end = aligned.saturating_add(size as u64);
                if end <= page.end() {
                    let pad = (aligned.saturating_sub(page.base)) as usize;
                    page.buf.resize(pad, 0);
                    page.buf.resize(pad.saturating_add(size), 0);
                    return Addr(aligned);
                }
            }
        }

        self.chain_page(size, align)
    }

    /// Chain a fresh page sized for `size`/`align` and allocate from its base.
    fn chain_page(&mut self, size: usize, align: usize) -> Addr {
        let cap = match round_up(size as u64, align as u64) {
            Some(rounded) => DEFAULT_PAGE_SIZE.max(rounded as usize),
            None => return Addr::NULL,
        };
        let chain_end = self
            .pages
            .last()
            .map(Page::end)
            .unwrap_or(FIRST_BASE);
        let base = match round_up(chain_end, align.max(8) as u64) {
            Some(base) => base,
            None => return Addr::NULL,
        };

        let mut buf = Vec::new();
        if buf.try_reserve_exact(cap).is_err() {
            return Addr::NULL;
        }
        buf.resize(size, 0);

        trace!(base, cap, "arena: chained page");
        self.pages.push(Page { base, cap, buf });
        Addr(base)
    }

    /// Snapshot the current page and its used offset.
    pub fn save(&self) -> Checkpoint {
        Checkpoint {
            pages: self.pages.len(),
            used: self.pages.last().map(Page::used).unwrap_or(0),
        }
    }

    /// Rewind to `cp`, releasing every page chained after it.
    ///
    /// Every address handed out after the matching [`Arena::save`] is
    /// invalid once this returns.
    pub fn restore(&mut self, cp: Checkpoint) {
        self.pages.truncate(cp.pages);
        if let Some(page) = self.pages.last_mut() {
            page.buf.truncate(cp.used);
        }
    }

    /// Total bytes currently in use across all pages.
    pub fn used(&self) -> usize {
        self.pages.iter().fold(0, |acc, p| acc.saturating_add(p.used()))
    }

    fn page_of(&self, addr: u64) -> &Page {
        let idx = self.pages.partition_point(|p| p.base <= addr);
        debug_assert!(idx > 0, "address outside arena");
        &self.pages[idx.saturating_sub(1)]
    }

    fn page_of_mut(&mut self, addr: u64) -> &mut Page {
        let idx = self.pages.partition_point(|p| p.base <= addr);
        debug_assert!(idx > 0, "address outside arena");
        &mut self.pages[idx.saturating_sub(1)]
    }

    /// Borrow `len` bytes starting at `addr`.
    pub fn bytes(&self, addr: Addr, len: usize) -> &[u8] {
        let page = self.page_of(addr.0);
        let start = (addr.0.saturating_sub(page.base)) as usize;
        &page.buf[start..start.saturating_add(len)]
    }

    /// Mutably borrow `len` bytes starting at `addr`.
    pub fn bytes_mut(&mut self, addr: Addr, len: usize) -> &mut [u8] {
        let page = self.page_of_mut(addr.0);
        let start = (addr.0.saturating_sub(page.base)) as usize;
        &mut page.buf[start..start.saturating_add(len)]
    }

    /// Read one byte.
    pub fn read_u8(&self, addr: Addr) -> u8 {
        self.bytes(addr, 1)[0]
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&self, addr: Addr) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.bytes(addr, 4));
        u32::from_le_bytes(raw)
    }

    /// Read a little-endian `u64`.
    pub fn read_u64(&self, addr: Addr) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.bytes(addr, 8));
        u64::from_le_bytes(raw)
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&self, addr: Addr) -> i32 {
        self.read_u32(addr) as i32
    }

    /// Read a little-endian `i64`.
    pub fn read_i64(&self, addr: Addr) -> i64 {
        self.read_u64(addr) as i64
    }

    /// Write one byte.
    pub fn write_u8(&mut self, addr: Addr, value: u8) {
        self.bytes_mut(addr, 1)[0] = value;
    }

    /// Write a little-endian `u32`.
    pub fn write_u32(&mut self, addr: Addr, value: u32) {
        self.bytes_mut(addr, 4).copy_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian `u64`.
    pub fn write_u64(&mut self, addr: Addr, value: u64) {
        self.bytes_mut(addr, 8).copy_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian `i32`.
    pub fn write_i32(&mut self, addr: Addr, value: i32) {
        self.write_u32(addr, value as u32);
    }

    /// Write a little-endian `i64`.
    pub fn write_i64(&mut self, addr: Addr, value: i64) {
        self.write_u64(addr, value as u64);
    }

    /// Copy `src` into arena memory at `addr`.
    pub fn write_bytes(&mut self, addr: Addr, src: &[u8]) {
        self.bytes_mut(addr, src.len()).copy_from_slice(src);
    }
}

/// Round `value` up to a multiple of `align` (a power of two).
fn round_up(value: u64, align: u64) -> Option<u64> {
    let mask = align.saturating_sub(1);
    Some(value.checked_add(mask)? & !mask)
}
