//! smoltcp Network Stack Integration
#![cfg_attr(docsrs, doc(cfg(feature = "smoltcp")))]
//!
//! Implements `smoltcp::phy::Device` for [`Eqos`], so a running controller
//! can back a smoltcp interface directly.
//!
//! # Example
//!
//! ```ignore
//! use smoltcp::iface::{Config, Interface, SocketSet};
//! use smoltcp::wire::IpCidr;
//! use dwc_eqos::integration::smoltcp::ethernet_address;
//!
//! let mut eqos = Eqos::probe(regs, platform, delay, EqosConfig::tegra186())?;
//! eqos.start(&mut GenericPhy::scan())?;
//!
//! let config = Config::new(ethernet_address(&eqos).into());
//! let mut iface = Interface::new(config, &mut eqos, Instant::ZERO);
//! ```
//!
//! # Reception
//!
//! The RX token hands smoltcp the frame straight out of its DMA buffer and
//! releases the buffer once smoltcp is done with it. A token dropped
//! without being consumed leaves the frame in place; the next `receive`
//! returns it again.
//!
//! # Safety Notes
//!
//! `Device::receive` must return an RX and a TX token at the same time,
//! both needing the controller. They share a raw pointer to it:
//!
//! 1. **Temporal safety**: tokens are consumed in the caller's stack frame,
//!    before anything else can reach the `Eqos`.
//! 2. **Spatial safety**: RX and TX use separate rings and buffers.
//! 3. **No aliasing during access**: `consume()` takes the token by value,
//!    and smoltcp never runs two consumers at once.

use embedded_hal::delay::DelayNs;
use smoltcp::phy::{Checksum, ChecksumCapabilities, Device, DeviceCapabilities, Medium};
use smoltcp::time::Instant;

use crate::driver::config::State;
use crate::driver::eqos::Eqos;
use crate::hal::platform::Platform;
use crate::internal::constants::{DEFAULT_MAX_FRAME_SIZE, MTU};
use crate::internal::dma::ReceivedFrame;
use crate::internal::register::RegisterAccess;

/// Destination and source addresses plus EtherType
const ETHERNET_HEADER_LEN: usize = 14;

// =============================================================================
// RX Token
// =============================================================================

/// Receive token for smoltcp
///
/// Carries one received frame still sitting in its DMA buffer.
pub struct EqosRxToken<'a, R: RegisterAccess, P: Platform, D: DelayNs> {
    eqos: *mut Eqos<R, P, D>,
    frame: ReceivedFrame,
    _marker: core::marker::PhantomData<&'a mut Eqos<R, P, D>>,
}

impl<R, P, D> smoltcp::phy::RxToken for EqosRxToken<'_, R, P, D>
where
    R: RegisterAccess,
    P: Platform,
    D: DelayNs,
{
    fn consume<T, F>(self, f: F) -> T
    where
        F: FnOnce(&[u8]) -> T,
    {
        // SAFETY: the pointer is valid for 'a; the token is consumed by
        // value, so no other reference to the Eqos is live.
        let eqos = unsafe { &mut *self.eqos };

        let result = f(eqos.frame_data(&self.frame));

        // Frames are taken in ring order, so release cannot be refused
        // here; a stopped controller just moves its cursor.
        if eqos.release(self.frame).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("smoltcp: RX release refused");
        }
        result
    }
}

// =============================================================================
// TX Token
// =============================================================================

/// Transmit token for smoltcp
pub struct EqosTxToken<'a, R: RegisterAccess, P: Platform, D: DelayNs> {
    eqos: *mut Eqos<R, P, D>,
    _marker: core::marker::PhantomData<&'a mut Eqos<R, P, D>>,
}

impl<R, P, D> smoltcp::phy::TxToken for EqosTxToken<'_, R, P, D>
where
    R: RegisterAccess,
    P: Platform,
    D: DelayNs,
{
    fn consume<T, F>(self, len: usize, f: F) -> T
    where
        F: FnOnce(&mut [u8]) -> T,
    {
        // SAFETY: the pointer is valid for 'a; the token is consumed by
        // value, so no other reference to the Eqos is live.
        let eqos = unsafe { &mut *self.eqos };

        let limit = frame_limit(eqos);
        if len > limit {
            // Let smoltcp build the frame, then drop it whole
            let mut scratch = alloc::vec![0u8; len];
            let result = f(&mut scratch);
            #[cfg(feature = "defmt")]
            defmt::warn!("smoltcp: dropped {} byte frame, limit {}", len, limit);
            return result;
        }

        let mut buffer = [0u8; DEFAULT_MAX_FRAME_SIZE];
        let result = f(&mut buffer[..len]);

        // smoltcp retransmits at its own layer
        if let Err(_err) = eqos.send(&buffer[..len]) {
            #[cfg(feature = "defmt")]
            defmt::warn!("smoltcp: TX failed: {}", _err);
        }
        result
    }
}

// =============================================================================
// Device Implementation
// =============================================================================

impl<R, P, D> Device for Eqos<R, P, D>
where
    R: RegisterAccess,
    P: Platform,
    D: DelayNs,
{
    type RxToken<'a>
        = EqosRxToken<'a, R, P, D>
    where
        Self: 'a;
    type TxToken<'a>
        = EqosTxToken<'a, R, P, D>
    where
        Self: 'a;

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        let frame = self.poll_receive()?;

        let self_ptr = self as *mut Self;
        Some((
            EqosRxToken {
                eqos: self_ptr,
                frame,
                _marker: core::marker::PhantomData,
            },
            EqosTxToken {
                eqos: self_ptr,
                _marker: core::marker::PhantomData,
            },
        ))
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        if self.state() != State::Running {
            return None;
        }

        Some(EqosTxToken {
            eqos: self as *mut Self,
            _marker: core::marker::PhantomData,
        })
    }

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.medium = Medium::Ethernet;

        // Ethernet MTU here includes the header but not the FCS
        caps.max_transmission_unit = frame_limit(self).min(MTU + ETHERNET_HEADER_LEN);

        // One frame in flight; send waits for completion
        caps.max_burst_size = Some(1);

        // No checksum offload is configured
        caps.checksum = ChecksumCapabilities::default();
        caps.checksum.ipv4 = Checksum::Both;
        caps.checksum.udp = Checksum::Both;
        caps.checksum.tcp = Checksum::Both;
        caps.checksum.icmpv4 = Checksum::Both;

        caps
    }
}

/// Largest frame a TX token will send
fn frame_limit<R, P, D>(eqos: &Eqos<R, P, D>) -> usize
where
    R: RegisterAccess,
    P: Platform,
    D: DelayNs,
{
    eqos.config().max_frame_size.min(DEFAULT_MAX_FRAME_SIZE)
}

/// Station address as a smoltcp `EthernetAddress`
pub fn ethernet_address<R, P, D>(eqos: &Eqos<R, P, D>) -> smoltcp::wire::EthernetAddress
where
    R: RegisterAccess,
    P: Platform,
    D: DelayNs,
{
    smoltcp::wire::EthernetAddress(*eqos.mac_address())
}
