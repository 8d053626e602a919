//! Descriptor stride computation and DMA memory allocation
//!
//! The DMA fetches descriptors at `base + n * (16 + DSL * bus_width)`, so
//! the distance between descriptors can only grow in bus-width steps up to
//! the skip-field limit. When that distance cannot reach a full cache line,
//! several descriptors share one line and are cache-maintained as a group.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::driver::error::{DmaError, DmaResult};
use crate::hal::cache::align_up;

// =============================================================================
// Ring Geometry
// =============================================================================

/// Spacing of descriptors in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RingGeometry {
    /// Logical descriptor size in bytes
    pub descriptor_size: usize,
    /// Byte distance between consecutive descriptors
    pub stride: usize,
    /// Descriptors sharing one cache line (1 when none share)
    pub per_cacheline: usize,
    /// Value for the DMA descriptor skip length field
    pub skip_length: u32,
}

impl RingGeometry {
    /// Work out the stride for the given cache line and bus
    ///
    /// `skip_limit` is the largest descriptor skip value the hardware field
    /// accepts; `bus_width` is the AXI data width in bytes.
    pub const fn compute(
        descriptor_size: usize,
        cacheline: usize,
        bus_width: usize,
        skip_limit: u32,
    ) -> Self {
        let max_step = descriptor_size + skip_limit as usize * bus_width;

        let mut stride = align_up(descriptor_size, cacheline);
        if max_step < cacheline {
            let pow2 = prev_power_of_two(max_step);
            if pow2 >= descriptor_size {
                stride = pow2;
            }
        }

        let per_cacheline = if stride < cacheline { cacheline / stride } else { 1 };

        Self {
            descriptor_size,
            stride,
            per_cacheline,
            skip_length: ((stride - descriptor_size) / bus_width) as u32,
        }
    }

    /// The hardware can actually step by this stride
    pub const fn is_addressable(&self, bus_width: usize, skip_limit: u32) -> bool {
        (self.stride - self.descriptor_size) % bus_width == 0 && self.skip_length <= skip_limit
    }

    /// Bytes occupied by `count` descriptors
    pub const fn ring_bytes(&self, count: usize) -> usize {
        count * self.stride
    }
}

/// Largest power of two not above `n` (n > 0)
const fn prev_power_of_two(n: usize) -> usize {
    1 << (usize::BITS - 1 - n.leading_zeros())
}

// =============================================================================
// DMA Region
// =============================================================================

/// Zeroed, aligned heap block handed to the DMA
///
/// The block is released when the region is dropped, so an allocation
/// sequence that fails half way leaves nothing behind.
pub struct DmaRegion {
    ptr: NonNull<u8>,
    layout: Layout,
}

// The region is plain owned memory; the DMA only reaches it through
// descriptors software hands over explicitly.
unsafe impl Send for DmaRegion {}

impl DmaRegion {
    /// Allocate a zeroed block from the global allocator
    pub fn zeroed(layout: Layout) -> Option<Self> {
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: layout has a non-zero size
        let raw = unsafe { alloc::alloc::alloc_zeroed(layout) };
        NonNull::new(raw).map(|ptr| Self { ptr, layout })
    }

    /// Start address
    #[inline(always)]
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Size in bytes
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Region is empty (never true for a live region)
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    /// Alignment the region was allocated with
    #[inline(always)]
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    /// Borrow `len` bytes at `offset`
    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        assert!(offset + len <= self.len());
        // SAFETY: bounds checked above, memory is initialized (zeroed)
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr().add(offset), len) }
    }

    /// Mutably borrow `len` bytes at `offset`
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        assert!(offset + len <= self.len());
        // SAFETY: bounds checked above, &mut self gives exclusive access
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr().add(offset), len) }
    }
}

impl Drop for DmaRegion {
    fn drop(&mut self) {
        // SAFETY: ptr was returned by alloc_zeroed with this layout
        unsafe { alloc::alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

impl core::fmt::Debug for DmaRegion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DmaRegion")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("len", &self.len())
            .finish()
    }
}

// =============================================================================
// Allocator Seam
// =============================================================================

/// Source of DMA-capable memory
///
/// Returning `None` makes the caller fail with
/// [`DmaError::ResourceExhausted`].
pub trait DmaAllocator {
    /// Allocate a zeroed region for `layout`
    fn allocate(&mut self, layout: Layout) -> Option<DmaRegion>;
}

/// Allocates from the global heap
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalDmaAllocator;

impl DmaAllocator for GlobalDmaAllocator {
    fn allocate(&mut self, layout: Layout) -> Option<DmaRegion> {
        DmaRegion::zeroed(layout)
    }
}

/// Allocate `size` bytes aligned to `align` or fail with `ResourceExhausted`
pub fn allocate_region<A: DmaAllocator + ?Sized>(
    allocator: &mut A,
    size: usize,
    align: usize,
) -> DmaResult<DmaRegion> {
    let layout = Layout::from_size_align(size, align).map_err(|_| DmaError::ResourceExhausted)?;
    match allocator.allocate(layout) {
        Some(region) => Ok(region),
        None => {
            #[cfg(feature = "defmt")]
            defmt::warn!("DMA allocation of {} bytes failed", size);
            Err(DmaError::ResourceExhausted)
        }
    }
}
