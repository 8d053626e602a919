//! Platform capability interface
//!
//! Everything SoC-specific (reset lines, clock gates, pad calibration, the
//! TX clock mux, where the MAC address is stored) stays outside the core
//! and is reached through [`Platform`]. One implementation exists per
//! target; it is handed to [`Eqos::probe`] and owned by the handle.
//!
//! Errors from these hooks are returned as [`PlatformError`] and reach the
//! caller unchanged.
//!
//! [`Eqos::probe`]: crate::Eqos::probe

use crate::driver::config::Speed;
use crate::driver::error::PlatformResult;
use crate::hal::cache::CacheMaintenance;

/// SoC glue required by the EQoS core
///
/// The cache maintenance supertrait is the coherency binding; the rest are
/// the reset/clock/calibration hooks invoked during probe, start, link
/// adaptation and stop.
pub trait Platform: CacheMaintenance {
    /// Release the controller's reset lines
    fn start_resets(&mut self) -> PlatformResult<()>;

    /// Assert the controller's reset lines
    fn stop_resets(&mut self) -> PlatformResult<()>;

    /// Enable the controller's clocks
    fn start_clocks(&mut self) -> PlatformResult<()>;

    /// Disable the controller's clocks
    fn stop_clocks(&mut self) -> PlatformResult<()>;

    /// Run pad/voltage calibration
    fn calibrate_pads(&mut self) -> PlatformResult<()> {
        Ok(())
    }

    /// Turn pad calibration off (used at 10 Mb/s)
    fn disable_calibration(&mut self) -> PlatformResult<()> {
        Ok(())
    }

    /// Set the MAC transmit clock for the negotiated speed
    fn set_tx_clock_rate(&mut self, speed: Speed) -> PlatformResult<()>;

    /// Rate of the clock feeding the microsecond tick counter, if known
    fn tick_clock_rate(&self) -> Option<u64> {
        None
    }

    /// Hook invoked right after the DMA software reset bit is asserted
    fn fix_soc_reset(&mut self) {}

    /// Station address stored by the platform (fuses, EEPROM, ...)
    fn mac_address(&mut self) -> PlatformResult<Option<[u8; 6]>> {
        Ok(None)
    }
}

impl<T: Platform + ?Sized> Platform for &mut T {
    fn start_resets(&mut self) -> PlatformResult<()> {
        (**self).start_resets()
    }

    fn stop_resets(&mut self) -> PlatformResult<()> {
        (**self).stop_resets()
    }

    fn start_clocks(&mut self) -> PlatformResult<()> {
        (**self).start_clocks()
    }

    fn stop_clocks(&mut self) -> PlatformResult<()> {
        (**self).stop_clocks()
    }

    fn calibrate_pads(&mut self) -> PlatformResult<()> {
        (**self).calibrate_pads()
    }

    fn disable_calibration(&mut self) -> PlatformResult<()> {
        (**self).disable_calibration()
    }

    fn set_tx_clock_rate(&mut self, speed: Speed) -> PlatformResult<()> {
        (**self).set_tx_clock_rate(speed)
    }

    fn tick_clock_rate(&self) -> Option<u64> {
        (**self).tick_clock_rate()
    }

    fn fix_soc_reset(&mut self) {
        (**self).fix_soc_reset();
    }

    fn mac_address(&mut self) -> PlatformResult<Option<[u8; 6]>> {
        (**self).mac_address()
    }
}
