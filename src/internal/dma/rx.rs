//! RX engine: zero-copy receive with grouped recycling.
//!
//! Every RX descriptor owns one buffer slot `frame_stride` bytes wide.
//! [`RxEngine::poll`] never waits: it either finds the descriptor at the
//! consume cursor released by the DMA or returns `None`. Frames must be
//! released strictly in the order they were received.
//!
//! Every successful release and every cursor reset starts a new epoch.
//! A frame token carries the epoch it was polled in, so a token left over
//! from an earlier pass over the same slot is refused instead of
//! re-arming a descriptor that holds a frame nobody has seen.
//!
//! When descriptors share a cache line, none of them can be written back
//! to memory on its own without also publishing its neighbours. Slots are
//! therefore handed back to the DMA one cache-line group at a time, when
//! the last slot of the group is released.

use super::alloc::DmaRegion;
use super::ring::DescriptorRing;
use crate::driver::error::{DmaError, DmaResult};
use crate::hal::cache::{CacheMaintenance, Coherency};
use crate::internal::register::RegisterAccess;
use crate::internal::register::dma::DmaRegs;

/// A received frame waiting to be released
///
/// Obtained from `poll_receive` and consumed by `release`. Polling again
/// before the release yields an equal token for the same slot; once one of
/// them has been released the others are refused with
/// [`DmaError::UnexpectedBuffer`].
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceivedFrame {
    index: usize,
    addr: usize,
    len: usize,
    epoch: u32,
}

impl ReceivedFrame {
    /// Frame length in bytes
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Zero-length frame
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ring slot the frame was received into
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// RX descriptor ring plus its buffer slots
pub struct RxEngine {
    ring: DescriptorRing,
    buffers: DmaRegion,
    coherency: Coherency,
    frame_stride: usize,
    per_cacheline: usize,
    descriptor_size: usize,
    epoch: u32,
}

impl RxEngine {
    /// Build an engine over an allocated ring and buffer block
    pub fn new(
        ring: DescriptorRing,
        buffers: DmaRegion,
        coherency: Coherency,
        frame_stride: usize,
        per_cacheline: usize,
        descriptor_size: usize,
    ) -> Self {
        assert!(buffers.len() >= ring.len() * frame_stride);
        assert!(per_cacheline.is_power_of_two() && ring.len() % per_cacheline == 0);
        Self {
            ring,
            buffers,
            coherency,
            frame_stride,
            per_cacheline,
            descriptor_size,
            epoch: 0,
        }
    }

    /// Descriptor ring
    pub fn ring(&self) -> &DescriptorRing {
        &self.ring
    }

    /// Consume cursor
    #[inline(always)]
    pub fn next_index(&self) -> usize {
        self.ring.current_index()
    }

    /// Distance between buffer slots
    #[inline(always)]
    pub fn frame_stride(&self) -> usize {
        self.frame_stride
    }

    /// Descriptors recycled together
    #[inline(always)]
    pub fn per_cacheline(&self) -> usize {
        self.per_cacheline
    }

    /// Address of buffer slot `index`
    #[inline(always)]
    pub fn buffer_addr(&self, index: usize) -> usize {
        self.buffers.addr() + index * self.frame_stride
    }

    /// Arm every descriptor with its buffer slot
    pub fn init<C: CacheMaintenance + ?Sized>(&mut self, cache: &mut C) {
        self.reset_cursor();
        for i in 0..self.ring.len() {
            let buf = self.buffer_addr(i);
            self.ring.get(i).arm_rx(buf as u64);
            self.coherency.flush_descriptor(cache, self.ring.addr_of(i));
            self.coherency.invalidate_buffer(cache, buf, self.frame_stride);
        }
    }

    /// Rewind the consume cursor
    pub fn reset_cursor(&mut self) {
        self.ring.reset();
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Check the descriptor at the cursor for a completed frame
    pub fn poll<C: CacheMaintenance + ?Sized>(&self, cache: &mut C) -> Option<ReceivedFrame> {
        let index = self.ring.current_index();
        self.coherency.invalidate_descriptor(cache, self.ring.addr_of(index));

        let desc = self.ring.get(index);
        if desc.is_owned() {
            return None;
        }

        let addr = self.buffer_addr(index);
        let len = desc.rx_length().min(self.frame_stride);
        self.coherency.invalidate_buffer(cache, addr, len);

        Some(ReceivedFrame {
            index,
            addr,
            len,
            epoch: self.epoch,
        })
    }

    /// Payload of a received frame
    pub fn frame_data(&self, frame: &ReceivedFrame) -> &[u8] {
        self.buffers.slice(frame.index * self.frame_stride, frame.len)
    }

    /// Give a frame's slot back
    ///
    /// `rearm` is false while the controller is not running, in which case
    /// only the cursor moves.
    pub fn release<R, C>(
        &mut self,
        regs: &R,
        cache: &mut C,
        frame: ReceivedFrame,
        rearm: bool,
    ) -> DmaResult<()>
    where
        R: RegisterAccess,
        C: CacheMaintenance + ?Sized,
    {
        let index = self.ring.current_index();
        if frame.epoch != self.epoch || frame.addr != self.buffer_addr(index) {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "RX release refused: slot {} (epoch {}) while expecting {} (epoch {})",
                frame.index,
                frame.epoch,
                index,
                self.epoch
            );
            return Err(DmaError::UnexpectedBuffer);
        }

        self.coherency.invalidate_buffer(cache, frame.addr, frame.len);

        let mask = self.per_cacheline - 1;
        if rearm && index & mask == mask {
            self.rearm_group(regs, cache, index - mask, index);
        }

        self.ring.advance();
        self.epoch = self.epoch.wrapping_add(1);
        Ok(())
    }

    /// Re-arm descriptors `first..=last`, publish them with one flush and
    /// move the tail pointer to `last`
    fn rearm_group<R, C>(&self, regs: &R, cache: &mut C, first: usize, last: usize)
    where
        R: RegisterAccess,
        C: CacheMaintenance + ?Sized,
    {
        for i in first..=last {
            let buf = self.buffer_addr(i);
            self.coherency.invalidate_buffer(cache, buf, self.frame_stride);
            self.ring.get(i).arm_rx(buf as u64);
        }

        let start = self.ring.addr_of(first);
        let end = self.ring.addr_of(last) + self.descriptor_size;
        self.coherency.flush_buffer(cache, start, end - start);

        DmaRegs::new(regs).set_rxdesc_tail_pointer(self.ring.addr_of(last) as u32);
    }
}
