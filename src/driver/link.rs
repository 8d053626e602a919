//! Link adaptation and MTL flow-control thresholds.
//!
//! Once the PHY has resolved a link, the MAC has to follow it: duplex bit,
//! speed-select bits, pad calibration and the transmit clock all depend on
//! the negotiated speed. [`adapt_link`] applies those in a fixed order and
//! stops at the first failure, leaving the link in
//! [`LinkState::Negotiating`] so the caller can retry.
//!
//! The flow-control thresholds are a separate, one-time decision taken when
//! the MTL is configured; they depend only on the RX FIFO size.

use embedded_hal::delay::DelayNs;

use super::config::{Duplex, Speed, State};
use super::eqos::Eqos;
use super::error::{IoError, Result};
use crate::hal::platform::Platform;
use crate::internal::constants::{FIFO_SIZE_UNIT, FLOW_CONTROL_MIN_FIFO};
use crate::internal::register::RegisterAccess;
use crate::internal::register::mac::MacRegs;
use crate::internal::register::mtl::MtlRegs;
use crate::phy::LinkStatus;

// =============================================================================
// Link State
// =============================================================================

/// Where link adaptation stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No link reported
    #[default]
    Down,
    /// Link reported, MAC not (yet) reprogrammed to match
    Negotiating,
    /// MAC follows the PHY
    Configured {
        /// Negotiated speed
        speed: Speed,
        /// Negotiated duplex
        duplex: Duplex,
    },
}

impl LinkState {
    /// MAC is configured for an up link
    pub const fn is_configured(&self) -> bool {
        matches!(self, LinkState::Configured { .. })
    }
}

/// Reprogram the MAC for a link the PHY has brought up
///
/// Order: duplex (half duplex also flushes the TX queue), speed bits, pad
/// calibration (disabled at 10 Mb/s), TX clock. A speed outside
/// 10/100/1000 is rejected before anything is written.
pub fn adapt_link<R, P>(regs: &R, platform: &mut P, status: &LinkStatus) -> Result<(Speed, Duplex)>
where
    R: RegisterAccess,
    P: Platform + ?Sized,
{
    let speed = match Speed::from_mbps(status.speed_mbps) {
        Ok(speed) => speed,
        Err(err) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("PHY reported unsupported speed {}", status.speed_mbps);
            return Err(err.into());
        }
    };

    let mac = MacRegs::new(regs);
    match status.duplex {
        Duplex::Full => mac.enable_full_duplex(),
        Duplex::Half => {
            mac.enable_half_duplex();
            MtlRegs::new(regs).flush_tx_queue();
        }
    }

    match speed {
        Speed::Mbps1000 => mac.set_speed_bits(false, false),
        Speed::Mbps100 => mac.set_speed_bits(true, true),
        Speed::Mbps10 => mac.set_speed_bits(true, false),
    }

    if speed.wants_calibration() {
        platform.calibrate_pads()?;
    } else {
        platform.disable_calibration()?;
    }

    platform.set_tx_clock_rate(speed)?;

    Ok((speed, status.duplex))
}

impl<R, P, D> Eqos<R, P, D>
where
    R: RegisterAccess,
    P: Platform,
    D: DelayNs,
{
    /// Follow a link change reported by the PHY
    ///
    /// A down link only updates the link state. An up link runs the full
    /// adaptation; if any step fails the state stays
    /// [`LinkState::Negotiating`] and the error is returned.
    pub fn adjust_link(&mut self, status: &LinkStatus) -> Result<()> {
        if self.state() == State::Stopped {
            return Err(IoError::InvalidState.into());
        }

        if !status.link_up {
            self.link = LinkState::Down;
            #[cfg(feature = "defmt")]
            defmt::info!("link down");
            return Ok(());
        }

        self.link = LinkState::Negotiating;
        let (speed, duplex) = adapt_link(&self.regs, &mut self.platform, status)?;
        self.link = LinkState::Configured { speed, duplex };

        #[cfg(feature = "defmt")]
        defmt::info!("link configured: {} {}", speed, duplex);
        Ok(())
    }
}

// =============================================================================
// Flow-Control Thresholds
// =============================================================================

/// RX queue flow-control setting for one FIFO size
///
/// `rfd`/`rfa` are the raw MTL threshold fields (deactivate/activate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlowControlThresholds {
    /// Hardware flow control enabled
    pub enabled: bool,
    /// Threshold for deactivating flow control
    pub rfd: u32,
    /// Threshold for activating flow control
    pub rfa: u32,
}

impl FlowControlThresholds {
    /// Flow control off
    pub const DISABLED: Self = Self {
        enabled: false,
        rfd: 0,
        rfa: 0,
    };
}

/// Encode a FIFO size for the TQS/RQS fields
pub const fn queue_size_field(fifo_bytes: u32) -> u32 {
    (fifo_bytes / FIFO_SIZE_UNIT).saturating_sub(1)
}

/// Thresholds for an RX FIFO of `rx_fifo_bytes`
///
/// A table keyed on the exact FIFO size; sizes not listed that are above
/// 16 KiB use the last row.
pub const fn flow_control_thresholds(rx_fifo_bytes: u32) -> FlowControlThresholds {
    if rx_fifo_bytes < FLOW_CONTROL_MIN_FIFO {
        return FlowControlThresholds::DISABLED;
    }

    // 4 KiB leaves little headroom and can overflow under load
    let (rfd, rfa) = match queue_size_field(rx_fifo_bytes) {
        15 => (0x3, 0x1),
        31 => (0x6, 0xa),
        63 => (0x6, 0x12),
        _ => (0x6, 0x1e),
    };
    FlowControlThresholds {
        enabled: true,
        rfd,
        rfa,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec;

    use super::*;
    use crate::driver::error::{ConfigError, Error, PlatformError};
    use crate::internal::register::mac::{
        CONFIGURATION_DM, CONFIGURATION_FES, CONFIGURATION_PS, MAC_CONFIGURATION,
    };
    use crate::internal::register::mtl::MTL_TXQ0_OPERATION_MODE;
    use crate::testing::{PlatformCall, RecordingPlatform, SimulatedEqos};

    fn status(mbps: u32, duplex: Duplex) -> LinkStatus {
        LinkStatus {
            link_up: true,
            speed_mbps: mbps,
            duplex,
        }
    }

    // =========================================================================
    // Flow-Control Table
    // =========================================================================

    #[test]
    fn flow_control_table() {
        let rows = [
            (4096, FlowControlThresholds { enabled: true, rfd: 0x3, rfa: 0x1 }),
            (8192, FlowControlThresholds { enabled: true, rfd: 0x6, rfa: 0xa }),
            (16384, FlowControlThresholds { enabled: true, rfd: 0x6, rfa: 0x12 }),
            (32768, FlowControlThresholds { enabled: true, rfd: 0x6, rfa: 0x1e }),
            (2048, FlowControlThresholds::DISABLED),
        ];
        for (fifo, expected) in rows {
            assert_eq!(flow_control_thresholds(fifo), expected, "fifo {fifo}");
        }
    }

    #[test]
    fn queue_size_encoding() {
        assert_eq!(queue_size_field(4096), 15);
        assert_eq!(queue_size_field(16384), 63);
        assert_eq!(queue_size_field(256), 0);
        assert_eq!(queue_size_field(0), 0);
    }

    // =========================================================================
    // Speed / Duplex Table
    // =========================================================================

    #[test]
    fn speed_bits_per_speed() {
        let cases = [
            (1000, 0),
            (100, CONFIGURATION_PS | CONFIGURATION_FES),
            (10, CONFIGURATION_PS),
        ];
        for (mbps, bits) in cases {
            let hw = SimulatedEqos::new();
            hw.write(MAC_CONFIGURATION, CONFIGURATION_PS | CONFIGURATION_FES);
            let mut platform = RecordingPlatform::new();
            adapt_link(&hw, &mut platform, &status(mbps, Duplex::Full)).unwrap();
            assert_eq!(
                hw.read(MAC_CONFIGURATION) & (CONFIGURATION_PS | CONFIGURATION_FES),
                bits,
                "{mbps} Mb/s"
            );
        }
    }

    #[test]
    fn full_duplex_sets_dm_without_flush() {
        let hw = SimulatedEqos::new();
        let mut platform = RecordingPlatform::new();
        adapt_link(&hw, &mut platform, &status(1000, Duplex::Full)).unwrap();
        assert_ne!(hw.read(MAC_CONFIGURATION) & CONFIGURATION_DM, 0);
        assert!(hw.writes_to(MTL_TXQ0_OPERATION_MODE).is_empty());
    }

    #[test]
    fn half_duplex_clears_dm_and_flushes_tx_queue() {
        let hw = SimulatedEqos::new();
        hw.write(MAC_CONFIGURATION, CONFIGURATION_DM);
        let mut platform = RecordingPlatform::new();
        adapt_link(&hw, &mut platform, &status(100, Duplex::Half)).unwrap();
        assert_eq!(hw.read(MAC_CONFIGURATION) & CONFIGURATION_DM, 0);
        assert_eq!(hw.writes_to(MTL_TXQ0_OPERATION_MODE), vec![1]);
    }

    #[test]
    fn calibration_and_clock_order() {
        let hw = SimulatedEqos::new();
        let mut platform = RecordingPlatform::new();
        adapt_link(&hw, &mut platform, &status(100, Duplex::Full)).unwrap();
        assert_eq!(
            platform.calls(),
            [
                PlatformCall::CalibratePads,
                PlatformCall::SetTxClockRate(Speed::Mbps100)
            ]
        );

        let mut platform = RecordingPlatform::new();
        adapt_link(&hw, &mut platform, &status(10, Duplex::Full)).unwrap();
        assert_eq!(
            platform.calls(),
            [
                PlatformCall::DisableCalibration,
                PlatformCall::SetTxClockRate(Speed::Mbps10)
            ]
        );
    }

    #[test]
    fn unsupported_speed_writes_nothing() {
        let hw = SimulatedEqos::new();
        let mut platform = RecordingPlatform::new();
        assert_eq!(
            adapt_link(&hw, &mut platform, &status(2500, Duplex::Full)),
            Err(Error::Config(ConfigError::InvalidSpeed))
        );
        assert!(hw.writes().is_empty());
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn platform_failure_stops_adaptation() {
        let hw = SimulatedEqos::new();
        let mut platform = RecordingPlatform::new();
        platform.fail_on(PlatformCall::CalibratePads);
        assert_eq!(
            adapt_link(&hw, &mut platform, &status(1000, Duplex::Full)),
            Err(Error::Platform(PlatformError::CalibrationFailed))
        );
        assert_eq!(platform.count(PlatformCall::SetTxClockRate(Speed::Mbps10)), 0);
    }
}
