//! ISR-Safe Shared Access
//!
//! [`SharedEqos`] lets the controller live in a `static` and be reached from
//! both thread context and interrupt handlers. Every access runs inside
//! `critical_section::with()`, so interrupts are masked for the duration of
//! the closure and the handle is never entered twice.
//!
//! The handle is only known after [`Eqos::probe`], so the static starts out
//! empty and is filled with [`SharedEqos::install`].
//!
//! # Example
//!
//! ```ignore
//! static EQOS: SharedEqos<Mmio, Tegra186, Delay> = SharedEqos::new();
//!
//! let eqos = Eqos::probe(regs, Tegra186::new(), delay, config)?;
//! EQOS.install(eqos);
//!
//! EQOS.with(|eqos| eqos.send(&frame)).transpose()?;
//! ```

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;

use crate::driver::eqos::Eqos;
use crate::hal::platform::Platform;
use crate::internal::register::RegisterAccess;

/// ISR-safe slot holding an [`Eqos`] handle
pub struct SharedEqos<R: RegisterAccess, P: Platform, D: DelayNs> {
    inner: Mutex<RefCell<Option<Eqos<R, P, D>>>>,
}

impl<R, P, D> SharedEqos<R, P, D>
where
    R: RegisterAccess,
    P: Platform,
    D: DelayNs,
{
    /// Create an empty slot (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Place a probed handle in the slot, returning the previous one
    pub fn install(&self, eqos: Eqos<R, P, D>) -> Option<Eqos<R, P, D>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(eqos))
    }

    /// Remove the handle from the slot
    pub fn take(&self) -> Option<Eqos<R, P, D>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    /// A handle has been installed
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    /// Run `f` with exclusive access to the handle
    ///
    /// Returns `None` when the slot is empty.
    ///
    /// # Panics
    /// If called from inside another `with` on the same slot.
    #[inline]
    pub fn with<T, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce(&mut Eqos<R, P, D>) -> T,
    {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }

    /// Like [`with`](Self::with), but returns `None` instead of panicking
    /// when the handle is already borrowed
    #[inline]
    pub fn try_with<T, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce(&mut Eqos<R, P, D>) -> T,
    {
        critical_section::with(|cs| {
            let mut slot = self.inner.borrow(cs).try_borrow_mut().ok()?;
            slot.as_mut().map(f)
        })
    }
}

impl<R, P, D> Default for SharedEqos<R, P, D>
where
    R: RegisterAccess,
    P: Platform,
    D: DelayNs,
{
    fn default() -> Self {
        Self::new()
    }
}
