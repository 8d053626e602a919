//! TX engine: one synchronous packet per call.
//!
//! Each send copies the packet into the shared scratch buffer, hands the
//! descriptor at the produce cursor to the DMA, moves the tail pointer one
//! past it and then busy-waits for the DMA to give the descriptor back.

use embedded_hal::delay::DelayNs;

use super::alloc::DmaRegion;
use super::descriptor::Descriptor;
use super::ring::DescriptorRing;
use crate::driver::error::{DmaError, IoError, Result};
use crate::hal::cache::{CacheMaintenance, Coherency};
use crate::hal::poll::PollBudget;
use crate::internal::register::RegisterAccess;
use crate::internal::register::dma::DmaRegs;

/// TX descriptor ring plus its scratch buffer
pub struct TxEngine {
    ring: DescriptorRing,
    buffer: DmaRegion,
    coherency: Coherency,
    max_frame: usize,
}

impl TxEngine {
    /// Build an engine over an allocated ring and scratch buffer
    pub fn new(ring: DescriptorRing, buffer: DmaRegion, coherency: Coherency, max_frame: usize) -> Self {
        let max_frame = max_frame.min(buffer.len());
        Self {
            ring,
            buffer,
            coherency,
            max_frame,
        }
    }

    /// Descriptor ring
    pub fn ring(&self) -> &DescriptorRing {
        &self.ring
    }

    /// Produce cursor
    #[inline(always)]
    pub fn next_index(&self) -> usize {
        self.ring.current_index()
    }

    /// Largest packet accepted by [`send`](Self::send)
    #[inline(always)]
    pub fn max_frame(&self) -> usize {
        self.max_frame
    }

    /// Address of the scratch buffer
    #[inline(always)]
    pub fn buffer_addr(&self) -> usize {
        self.buffer.addr()
    }

    /// Zero every descriptor and publish the ring
    pub fn init<C: CacheMaintenance + ?Sized>(&mut self, cache: &mut C) {
        self.ring.reset();
        for i in 0..self.ring.len() {
            self.ring.get(i).clear();
            self.coherency.flush_descriptor(cache, self.ring.addr_of(i));
        }
    }

    /// Rewind the produce cursor
    pub fn reset_cursor(&mut self) {
        self.ring.reset();
    }

    /// Transmit one packet and wait for the DMA to release it
    ///
    /// The descriptor at the cursor must be software-owned; a descriptor
    /// left owned by an earlier timed-out send yields
    /// [`DmaError::DescriptorBusy`] without touching the ring.
    pub fn send<R, C, D>(
        &mut self,
        regs: &R,
        cache: &mut C,
        delay: &mut D,
        budget: PollBudget,
        data: &[u8],
    ) -> Result<()>
    where
        R: RegisterAccess,
        C: CacheMaintenance + ?Sized,
        D: DelayNs,
    {
        let len = data.len();
        if len == 0 {
            return Err(DmaError::InvalidLength.into());
        }
        if len > self.max_frame {
            return Err(DmaError::FrameTooLarge.into());
        }

        let idx = self.ring.current_index();
        let desc_addr = self.ring.addr_of(idx);

        self.coherency.invalidate_descriptor(cache, desc_addr);
        if self.ring.get(idx).is_owned() {
            return Err(DmaError::DescriptorBusy.into());
        }

        self.buffer.slice_mut(0, len).copy_from_slice(data);
        self.coherency.flush_buffer(cache, self.buffer.addr(), len);

        self.ring.advance();
        let desc: &Descriptor = self.ring.get(idx);
        desc.prepare_tx(self.buffer.addr() as u64, len);
        self.coherency.flush_descriptor(cache, desc_addr);

        let tail = self.ring.addr_of(self.ring.current_index());
        DmaRegs::new(regs).set_txdesc_tail_pointer(tail as u32);

        let coherency = self.coherency;
        let done = budget.wait(delay, || {
            coherency.invalidate_descriptor(cache, desc_addr);
            !desc.is_owned()
        });

        if done {
            Ok(())
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("TX timeout on descriptor {}", idx);
            Err(IoError::TxTimeout.into())
        }
    }
}
