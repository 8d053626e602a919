//! Cache coherency for DMA memory
//!
//! The EQoS DMA masters on the system bus without snooping the CPU caches
//! on most SoCs. Software therefore has to clean (flush) a line after
//! writing anything the hardware will read, and invalidate it before
//! reading anything the hardware may have written.
//!
//! [`CacheMaintenance`] is the platform binding: two raw operations on a
//! line-aligned range. [`Coherency`] sits on top and does the rounding, so
//! every range handed to the platform starts and ends on a line boundary.
//! Platforms with hardware-coherent DMA implement both operations as
//! no-ops.

// =============================================================================
// Alignment Helpers
// =============================================================================

/// Round `addr` down to a multiple of `align` (a power of two)
#[inline(always)]
pub const fn align_down(addr: usize, align: usize) -> usize {
    addr & !(align - 1)
}

/// Round `addr` up to a multiple of `align` (a power of two)
#[inline(always)]
pub const fn align_up(addr: usize, align: usize) -> usize {
    (addr + align - 1) & !(align - 1)
}

// =============================================================================
// Cache Range
// =============================================================================

/// Byte range `[start, end)` aligned to whole cache lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CacheRange {
    /// First byte (line aligned)
    pub start: usize,
    /// One past the last byte (line aligned)
    pub end: usize,
}

impl CacheRange {
    /// Smallest line-aligned range covering `len` bytes at `addr`
    pub const fn covering(addr: usize, len: usize, line: usize) -> Self {
        if len == 0 {
            let start = align_down(addr, line);
            return Self { start, end: start };
        }
        Self {
            start: align_down(addr, line),
            end: align_up(addr + len, line),
        }
    }

    /// Length in bytes
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Range covers nothing
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Range contains `addr`
    pub const fn contains(&self, addr: usize) -> bool {
        addr >= self.start && addr < self.end
    }
}

// =============================================================================
// Platform Binding
// =============================================================================

/// Data cache maintenance supplied by the platform
///
/// Both operations receive line-aligned, non-empty ranges. They are
/// synchronous and infallible: when they return, the operation is complete
/// and visible to the DMA master.
pub trait CacheMaintenance {
    /// Clean the range so the DMA master observes CPU writes
    fn flush_range(&mut self, range: CacheRange);

    /// Discard the range so CPU reads observe DMA writes
    fn invalidate_range(&mut self, range: CacheRange);
}

impl<T: CacheMaintenance + ?Sized> CacheMaintenance for &mut T {
    #[inline(always)]
    fn flush_range(&mut self, range: CacheRange) {
        (**self).flush_range(range);
    }

    #[inline(always)]
    fn invalidate_range(&mut self, range: CacheRange) {
        (**self).invalidate_range(range);
    }
}

/// Cache maintenance for DMA masters that snoop the CPU caches
#[derive(Debug, Clone, Copy, Default)]
pub struct HardwareCoherent;

impl CacheMaintenance for HardwareCoherent {
    #[inline(always)]
    fn flush_range(&mut self, _range: CacheRange) {}

    #[inline(always)]
    fn invalidate_range(&mut self, _range: CacheRange) {}
}

// =============================================================================
// Coherency Layer
// =============================================================================

/// Rounds descriptor and buffer accesses to cache lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coherency {
    line: usize,
    descriptor_size: usize,
}

impl Coherency {
    /// Create the layer for a given line size and logical descriptor size
    pub const fn new(line: usize, descriptor_size: usize) -> Self {
        Self {
            line,
            descriptor_size,
        }
    }

    /// Cache line size
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Publish one descriptor (and its line-mates) to hardware
    pub fn flush_descriptor<C: CacheMaintenance + ?Sized>(&self, cache: &mut C, addr: usize) {
        self.flush_buffer(cache, addr, self.descriptor_size);
    }

    /// Drop cached copies of one descriptor (and its line-mates)
    pub fn invalidate_descriptor<C: CacheMaintenance + ?Sized>(&self, cache: &mut C, addr: usize) {
        self.invalidate_buffer(cache, addr, self.descriptor_size);
    }

    /// Publish `len` bytes at `addr`
    pub fn flush_buffer<C: CacheMaintenance + ?Sized>(&self, cache: &mut C, addr: usize, len: usize) {
        let range = CacheRange::covering(addr, len, self.line);
        if !range.is_empty() {
            cache.flush_range(range);
        }
    }

    /// Drop cached copies of `len` bytes at `addr`
    pub fn invalidate_buffer<C: CacheMaintenance + ?Sized>(
        &self,
        cache: &mut C,
        addr: usize,
        len: usize,
    ) {
        let range = CacheRange::covering(addr, len, self.line);
        if !range.is_empty() {
            cache.invalidate_range(range);
        }
    }
}
