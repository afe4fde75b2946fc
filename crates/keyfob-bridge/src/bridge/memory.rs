//! Fixed-capacity linear memory with an explicit allocate/free protocol.
//!
//! Models the engine's addressable region: a flat byte buffer sized in 64 KiB
//! pages, a first-fit free list, and per-allocation bookkeeping so that every
//! pointer handed out can be checked on use and must be released exactly once.

use std::collections::BTreeMap;

use keyfob_core::otp::{OtpError, OtpErrorKind};

/// Linear memory page size in bytes.
pub const PAGE_SIZE: usize = 64 * 1024;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Free-list block
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy)]
struct Block {
    offset: u32,
    len: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Linear memory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The engine's linear memory region.
///
/// The region never grows: an allocation that does not fit is `OutOfMemory`.
/// Counters for allocations and releases are kept so tests can assert the
/// pair-on-every-path invariant.
pub struct LinearMemory {
    data: Vec<u8>,
    /// Free blocks, sorted by offset and coalesced.
    free: Vec<Block>,
    /// Live allocations: offset → length.
    live: BTreeMap<u32, u32>,
    allocations: u64,
    releases: u64,
}

impl LinearMemory {
    /// Create a region of `pages` 64 KiB pages (minimum one page).
    pub fn new(pages: u32) -> Self {
        let size = PAGE_SIZE * pages.max(1) as usize;
        Self {
            data: vec![0; size],
            free: vec![Block {
                offset: 0,
                len: size as u32,
            }],
            live: BTreeMap::new(),
            allocations: 0,
            releases: 0,
        }
    }

    /// Total region size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Number of allocations currently live.
    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    /// Total successful `allocate` calls so far.
    pub fn allocation_count(&self) -> u64 {
        self.allocations
    }

    /// Total successful `free` calls so far.
    pub fn release_count(&self) -> u64 {
        self.releases
    }

    /// Reserve `len` bytes and return the region offset.
    ///
    /// Zero-length requests reserve a single byte so that every allocation has
    /// a distinct pointer. First-fit over the free list.
    pub fn allocate(&mut self, len: usize) -> Result<u32, OtpError> {
        let need = (len.max(1)).try_into().map_err(|_| oom(len))?;
        let slot = self
            .free
            .iter()
            .position(|b| b.len >= need)
            .ok_or_else(|| oom(len))?;

        let block = self.free[slot];
        if block.len == need {
            self.free.remove(slot);
        } else {
            self.free[slot] = Block {
                offset: block.offset + need,
                len: block.len - need,
            };
        }
        self.live.insert(block.offset, need);
        self.allocations += 1;
        Ok(block.offset)
    }

    /// Copy caller bytes into a live allocation.
    pub fn write(&mut self, ptr: u32, bytes: &[u8]) -> Result<(), OtpError> {
        let len = self.checked_len(ptr, bytes.len())?;
        let start = ptr as usize;
        self.data[start..start + len].copy_from_slice(bytes);
        Ok(())
    }

    /// Copy `len` bytes out of a live allocation.
    pub fn read(&self, ptr: u32, len: usize) -> Result<Vec<u8>, OtpError> {
        let len = self.checked_len(ptr, len)?;
        let start = ptr as usize;
        Ok(self.data[start..start + len].to_vec())
    }

    /// Release a previously allocated range. Each pointer must be freed
    /// exactly once; anything else is `InvalidPointer`.
    pub fn free(&mut self, ptr: u32) -> Result<(), OtpError> {
        let len = self.live.remove(&ptr).ok_or_else(|| bad_ptr(ptr))?;
        self.insert_free(Block { offset: ptr, len });
        self.releases += 1;
        Ok(())
    }

    /// Validate that `ptr` is live and `len` fits inside its allocation.
    fn checked_len(&self, ptr: u32, len: usize) -> Result<usize, OtpError> {
        let alloc_len = *self.live.get(&ptr).ok_or_else(|| bad_ptr(ptr))?;
        if len > alloc_len as usize {
            return Err(OtpError::new(
                OtpErrorKind::InvalidPointer,
                format!("access of {} bytes exceeds allocation of {}", len, alloc_len),
            ));
        }
        Ok(len)
    }

    /// Insert a block into the free list, coalescing with neighbours.
    fn insert_free(&mut self, block: Block) {
        let idx = self
            .free
            .iter()
            .position(|b| b.offset > block.offset)
            .unwrap_or(self.free.len());
        self.free.insert(idx, block);

        // Merge with the following block, then with the preceding one.
        if idx + 1 < self.free.len()
            && self.free[idx].offset + self.free[idx].len == self.free[idx + 1].offset
        {
            self.free[idx].len += self.free[idx + 1].len;
            self.free.remove(idx + 1);
        }
        if idx > 0 && self.free[idx - 1].offset + self.free[idx - 1].len == self.free[idx].offset {
            self.free[idx - 1].len += self.free[idx].len;
            self.free.remove(idx);
        }
    }
}

fn oom(len: usize) -> OtpError {
    OtpError::new(
        OtpErrorKind::OutOfMemory,
        format!("cannot reserve {} bytes in the linear memory region", len),
    )
}

fn bad_ptr(ptr: u32) -> OtpError {
    OtpError::new(
        OtpErrorKind::InvalidPointer,
        format!("pointer {:#x} is not a live allocation", ptr),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Allocate / write / read / free ───────────────────────────

    #[test]
    fn roundtrip() {
        let mut mem = LinearMemory::new(1);
        let ptr = mem.allocate(11).unwrap();
        mem.write(ptr, b"hello world").unwrap();
        assert_eq!(mem.read(ptr, 11).unwrap(), b"hello world");
        mem.free(ptr).unwrap();
        assert_eq!(mem.live_allocations(), 0);
    }

    #[test]
    fn distinct_pointers() {
        let mut mem = LinearMemory::new(1);
        let a = mem.allocate(16).unwrap();
        let b = mem.allocate(16).unwrap();
        assert_ne!(a, b);
        mem.write(a, b"aaaa").unwrap();
        mem.write(b, b"bbbb").unwrap();
        assert_eq!(mem.read(a, 4).unwrap(), b"aaaa");
        assert_eq!(mem.read(b, 4).unwrap(), b"bbbb");
        mem.free(a).unwrap();
        mem.free(b).unwrap();
    }

    #[test]
    fn zero_length_allocation_gets_a_pointer() {
        let mut mem = LinearMemory::new(1);
        let a = mem.allocate(0).unwrap();
        let b = mem.allocate(0).unwrap();
        assert_ne!(a, b);
        mem.free(a).unwrap();
        mem.free(b).unwrap();
    }

    // ── Misuse ───────────────────────────────────────────────────

    #[test]
    fn double_free_is_rejected() {
        let mut mem = LinearMemory::new(1);
        let ptr = mem.allocate(8).unwrap();
        mem.free(ptr).unwrap();
        let err = mem.free(ptr).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidPointer);
    }

    #[test]
    fn stale_pointer_read_is_rejected() {
        let mut mem = LinearMemory::new(1);
        let ptr = mem.allocate(8).unwrap();
        mem.free(ptr).unwrap();
        assert_eq!(mem.read(ptr, 8).unwrap_err().kind, OtpErrorKind::InvalidPointer);
        assert_eq!(mem.write(ptr, b"x").unwrap_err().kind, OtpErrorKind::InvalidPointer);
    }

    #[test]
    fn oversized_access_is_rejected() {
        let mut mem = LinearMemory::new(1);
        let ptr = mem.allocate(4).unwrap();
        let err = mem.read(ptr, 5).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidPointer);
        mem.free(ptr).unwrap();
    }

    // ── Exhaustion ───────────────────────────────────────────────

    #[test]
    fn exhaustion_is_out_of_memory() {
        let mut mem = LinearMemory::new(1);
        let err = mem.allocate(PAGE_SIZE + 1).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::OutOfMemory);

        let ptr = mem.allocate(PAGE_SIZE).unwrap();
        assert_eq!(mem.allocate(1).unwrap_err().kind, OtpErrorKind::OutOfMemory);
        mem.free(ptr).unwrap();
        // The whole region is usable again.
        let ptr = mem.allocate(PAGE_SIZE).unwrap();
        mem.free(ptr).unwrap();
    }

    // ── Coalescing ───────────────────────────────────────────────

    #[test]
    fn freed_neighbours_coalesce() {
        let mut mem = LinearMemory::new(1);
        let a = mem.allocate(PAGE_SIZE / 4).unwrap();
        let b = mem.allocate(PAGE_SIZE / 4).unwrap();
        let c = mem.allocate(PAGE_SIZE / 2).unwrap();
        mem.free(a).unwrap();
        mem.free(b).unwrap();
        // a and b merged back into one block large enough for half the page.
        let d = mem.allocate(PAGE_SIZE / 2).unwrap();
        mem.free(c).unwrap();
        mem.free(d).unwrap();
    }

    // ── Counters ─────────────────────────────────────────────────

    #[test]
    fn counters_track_pairing() {
        let mut mem = LinearMemory::new(1);
        let mut ptrs = Vec::new();
        for i in 1..=5 {
            ptrs.push(mem.allocate(i * 8).unwrap());
        }
        assert_eq!(mem.allocation_count(), 5);
        assert_eq!(mem.live_allocations(), 5);
        for p in ptrs {
            mem.free(p).unwrap();
        }
        assert_eq!(mem.release_count(), 5);
        assert_eq!(mem.live_allocations(), 0);
    }
}
