//! Circular descriptor ring over an owned DMA region.

use super::alloc::{DmaRegion, RingGeometry};
use super::descriptor::Descriptor;

/// Circular descriptor ring with wraparound index.
///
/// Descriptors are laid out `stride` bytes apart in a single region; the
/// ring hands out references by index and never exposes raw addresses
/// beyond what the DMA registers need.
pub struct DescriptorRing {
    region: DmaRegion,
    count: usize,
    stride: usize,
    current: usize,
}

impl DescriptorRing {
    /// Wrap `region` as a ring of `count` descriptors
    ///
    /// The region must hold at least `count * geometry.stride` bytes and be
    /// aligned to at least 4 bytes.
    pub fn new(region: DmaRegion, count: usize, geometry: &RingGeometry) -> Self {
        assert!(count > 0 && region.len() >= geometry.ring_bytes(count));
        assert!(region.addr() % core::mem::align_of::<Descriptor>() == 0);
        Self {
            region,
            count,
            stride: geometry.stride,
            current: 0,
        }
    }

    /// Get the number of descriptors in the ring
    #[inline(always)]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Check if the ring is empty (never true once constructed)
    #[inline(always)]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Distance between descriptors in bytes
    #[inline(always)]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Get the current index
    #[inline(always)]
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// Advance the current index by one, wrapping around
    #[inline(always)]
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.count;
    }

    /// Reset the current index to 0
    #[inline(always)]
    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Address of the descriptor at `index` (wrapping)
    #[inline(always)]
    pub fn addr_of(&self, index: usize) -> usize {
        self.region.addr() + (index % self.count) * self.stride
    }

    /// Get a reference to a descriptor at a specific index
    #[inline(always)]
    pub fn get(&self, index: usize) -> &Descriptor {
        // SAFETY: addr_of stays inside the region, which is aligned and
        // large enough for `count` descriptors at `stride` spacing
        unsafe { &*(self.addr_of(index) as *const Descriptor) }
    }

    /// Get a reference to the current descriptor
    #[inline(always)]
    pub fn current(&self) -> &Descriptor {
        self.get(self.current)
    }

    /// Base address for the ring list registers
    #[inline(always)]
    pub fn base_addr(&self) -> u64 {
        self.region.addr() as u64
    }

    /// Address of the last descriptor
    #[inline(always)]
    pub fn last_addr(&self) -> usize {
        self.addr_of(self.count - 1)
    }

    /// Iterate over all descriptors
    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        (0..self.count).map(move |i| self.get(i))
    }
}

// =============================================================================
// Tests
// =============================================================================
