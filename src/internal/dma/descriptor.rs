//! EQoS DMA descriptor layout
//!
//! Both rings use the same four-word "normal" descriptor. In read format
//! (software to hardware) DES0/DES1 carry the buffer address, DES2 the
//! buffer length and DES3 the control flags. In write-back format
//! (hardware to software) DES3 carries the status, including the received
//! packet length.
//!
//! DES3 bit 31 is the ownership bit. Whoever does not own a descriptor
//! must not touch it or its buffer, and the write that sets OWN has to be
//! the last one the hardware can observe.

use core::sync::atomic::{Ordering, fence};

/// DES3 bit field constants
pub mod des3 {
    /// Descriptor owned by the DMA
    pub const OWN: u32 = 1 << 31;
    /// First descriptor of a packet (TX read format)
    pub const FD: u32 = 1 << 29;
    /// Last descriptor of a packet (TX read format)
    pub const LD: u32 = 1 << 28;
    /// Buffer 1 address valid (RX read format)
    pub const BUF1V: u32 = 1 << 24;
    /// Packet length (RX write-back format)
    pub const PL_MASK: u32 = 0x7fff;
}

/// Volatile cell wrapper for descriptor fields
///
/// Every access is a volatile load or store so the compiler never caches
/// or elides a descriptor word the DMA may have changed.
#[repr(transparent)]
pub(crate) struct VolatileCell<T: Copy> {
    value: core::cell::UnsafeCell<T>,
}

// Safety: u32 volatile accesses are single bus transactions; the ownership
// protocol decides who may write.
unsafe impl<T: Copy> Sync for VolatileCell<T> {}

impl<T: Copy> VolatileCell<T> {
    /// Read the value (volatile read)
    #[inline(always)]
    pub fn get(&self) -> T {
        // SAFETY: the cell always holds an initialized T
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    /// Write a value (volatile write)
    #[inline(always)]
    pub fn set(&self, value: T) {
        // SAFETY: the cell is valid for writes for its whole lifetime
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }
}

/// Hardware DMA descriptor
///
/// Only the first 16 bytes are defined; descriptors in a ring are spaced
/// by the ring stride, which may be larger.
#[repr(C)]
pub struct Descriptor {
    des0: VolatileCell<u32>,
    des1: VolatileCell<u32>,
    des2: VolatileCell<u32>,
    des3: VolatileCell<u32>,
}

impl Descriptor {
    /// Logical descriptor size in bytes
    pub const SIZE: usize = 16;

    /// Hardware currently owns this descriptor
    #[inline(always)]
    pub fn is_owned(&self) -> bool {
        self.des3.get() & des3::OWN != 0
    }

    /// Raw DES3 word
    #[inline(always)]
    pub fn raw_des3(&self) -> u32 {
        self.des3.get()
    }

    /// Buffer address from DES0/DES1
    #[inline(always)]
    pub fn buffer_addr(&self) -> u64 {
        ((self.des1.get() as u64) << 32) | self.des0.get() as u64
    }

    /// Received packet length (write-back format)
    #[inline(always)]
    pub fn rx_length(&self) -> usize {
        (self.des3.get() & des3::PL_MASK) as usize
    }

    /// Zero all four words
    pub fn clear(&self) {
        self.des0.set(0);
        self.des1.set(0);
        self.des2.set(0);
        self.des3.set(0);
    }

    /// Hand a single-buffer packet to the TX DMA
    ///
    /// The buffer fields are ordered before the DES3 write that sets OWN.
    pub fn prepare_tx(&self, buffer: u64, len: usize) {
        let len = len as u32 & des3::PL_MASK;
        self.des0.set(buffer as u32);
        self.des1.set((buffer >> 32) as u32);
        self.des2.set(len);
        fence(Ordering::SeqCst);
        self.des3.set(des3::OWN | des3::FD | des3::LD | len);
    }

    /// Re-arm an RX descriptor with `buffer`
    ///
    /// The stale address is cleared first so a half-written descriptor
    /// never carries a valid buffer pointer.
    pub fn arm_rx(&self, buffer: u64) {
        self.des0.set(0);
        self.des1.set(0);
        fence(Ordering::SeqCst);
        self.des0.set(buffer as u32);
        self.des1.set((buffer >> 32) as u32);
        self.des2.set(0);
        fence(Ordering::SeqCst);
        self.des3.set(des3::OWN | des3::BUF1V);
    }

    /// Complete a TX descriptor (simulated hardware side)
    #[cfg(test)]
    pub(crate) fn complete_tx(&self) {
        self.des3.set(self.des3.get() & !des3::OWN);
    }

    /// Write back a received packet (simulated hardware side)
    #[cfg(test)]
    pub(crate) fn complete_rx(&self, len: usize) {
        self.des3.set((len as u32) & des3::PL_MASK);
    }
}
