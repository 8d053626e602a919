//! Register access for the EQoS register window
//!
//! The controller exposes one 32-bit register window, either memory-mapped
//! or behind a PCI BAR. Everything above this module talks to it through
//! [`RegisterAccess`], so the same code drives real hardware ([`Mmio`]) and
//! the simulated register file used by the host tests.
//!
//! The typed views ([`mac::MacRegs`], [`mtl::MtlRegs`], [`dma::DmaRegs`])
//! borrow a `RegisterAccess` and expose one accessor per register.

pub mod dma;
pub mod mac;
pub mod mtl;

// =============================================================================
// Register Access Trait
// =============================================================================

/// 32-bit register window addressed by byte offset
///
/// Implementations must perform each access exactly once and in program
/// order (volatile semantics). Accesses take `&self`: a register window is
/// shared hardware state, not Rust-owned memory.
pub trait RegisterAccess {
    /// Read the register at `offset`
    fn read(&self, offset: usize) -> u32;

    /// Write `value` to the register at `offset`
    fn write(&self, offset: usize, value: u32);

    /// Read-modify-write a register
    #[inline(always)]
    fn modify<F>(&self, offset: usize, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    /// Set bits in a register (read-modify-write)
    #[inline(always)]
    fn set_bits(&self, offset: usize, bits: u32) {
        self.modify(offset, |v| v | bits);
    }

    /// Clear bits in a register (read-modify-write)
    #[inline(always)]
    fn clear_bits(&self, offset: usize, bits: u32) {
        self.modify(offset, |v| v & !bits);
    }

    /// Clear then set bits in one read-modify-write
    #[inline(always)]
    fn clear_set_bits(&self, offset: usize, clear: u32, set: u32) {
        self.modify(offset, |v| (v & !clear) | set);
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &T {
    #[inline(always)]
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    #[inline(always)]
    fn write(&self, offset: usize, value: u32) {
        (**self).write(offset, value);
    }
}

// =============================================================================
// Memory-Mapped Window
// =============================================================================

/// Memory-mapped register window at a fixed base address
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Create a register window at `base`
    ///
    /// # Safety
    ///
    /// `base` must be the address of the EQoS register block, mapped for
    /// device access and valid for the lifetime of the returned value. No
    /// other code may drive the same controller concurrently.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address of the window
    pub const fn base(&self) -> usize {
        self.base
    }
}

impl RegisterAccess for Mmio {
    #[inline(always)]
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: the constructor contract guarantees the window is mapped
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    #[inline(always)]
    fn write(&self, offset: usize, value: u32) {
        // SAFETY: the constructor contract guarantees the window is mapped
        unsafe { core::ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }
}

// =============================================================================
// Field Helpers
// =============================================================================

/// Place `value` into a field described by `mask` (unshifted) and `shift`
#[inline(always)]
pub const fn field_prep(value: u32, mask: u32, shift: u32) -> u32 {
    (value & mask) << shift
}

/// Extract a field described by `mask` (unshifted) and `shift`
#[inline(always)]
pub const fn field_get(reg: u32, mask: u32, shift: u32) -> u32 {
    (reg >> shift) & mask
}

// =============================================================================
// Register Access Macros
// =============================================================================

/// Generate read/write accessor methods for a register.
///
/// # Example
/// ```ignore
/// impl<R: RegisterAccess> DmaRegs<'_, R> {
///     reg_rw!(mode, set_mode, DMA_MODE, "DMA Mode register");
/// }
/// ```
macro_rules! reg_rw {
    ($read_fn:ident, $write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            self.bus.read($offset)
        }

        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) {
            self.bus.write($offset, value)
        }
    };
}

/// Generate a read-only accessor method for a register.
macro_rules! reg_ro {
    ($read_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            self.bus.read($offset)
        }
    };
}

/// Generate set/clear bit operation methods for a register.
///
/// # Example
/// ```ignore
/// impl<R: RegisterAccess> DmaRegs<'_, R> {
///     reg_bit_ops!(start_tx, stop_tx, DMA_CH0_TX_CONTROL, TX_CONTROL_ST,
///                  "TX DMA", "Start", "Stop");
/// }
/// ```
macro_rules! reg_bit_ops {
    ($set_fn:ident, $clear_fn:ident, $offset:expr, $bit:expr, $what:expr, $set_verb:expr, $clear_verb:expr) => {
        #[doc = concat!($set_verb, " ", $what)]
        #[inline(always)]
        pub fn $set_fn(&self) {
            self.bus.set_bits($offset, $bit)
        }

        #[doc = concat!($clear_verb, " ", $what)]
        #[inline(always)]
        pub fn $clear_fn(&self) {
            self.bus.clear_bits($offset, $bit)
        }
    };
}

// Export macros for use in submodules
pub(crate) use reg_bit_ops;
pub(crate) use reg_ro;
pub(crate) use reg_rw;
