//! MDIO (Management Data Input/Output) HAL
//!
//! This module drives the MDIO master built into the EQoS MAC. A
//! transaction is: wait for the busy bit to clear, load the data register
//! (writes and clause 45 reads), write the command word with the busy bit
//! set, let the bus settle, then wait for busy to clear again. Reads return
//! the low 16 bits of the data register.
//!
//! Only one transaction may be outstanding at a time. The controller
//! borrows the register window and delay provider from the driver handle,
//! which is what serializes access.

use embedded_hal::delay::DelayNs;

use crate::driver::config::{EqosConfig, MdcClockRange};
use crate::driver::error::{IoError, Result};
use crate::hal::poll::PollBudget;
use crate::internal::constants::{MDIO_POLL_INTERVAL_US, MDIO_SETTLE_US, MDIO_TIMEOUT_US};
use crate::internal::register::RegisterAccess;
use crate::internal::register::field_prep;
use crate::internal::register::mac::{
    MDIO_ADDRESS_C45E, MDIO_ADDRESS_CR_MASK, MDIO_ADDRESS_CR_SHIFT, MDIO_ADDRESS_GB,
    MDIO_ADDRESS_GOC_READ, MDIO_ADDRESS_GOC_SHIFT, MDIO_ADDRESS_GOC_WRITE, MDIO_ADDRESS_PA_MASK,
    MDIO_ADDRESS_PA_SHIFT, MDIO_ADDRESS_RDA_MASK, MDIO_ADDRESS_RDA_SHIFT, MDIO_ADDRESS_SKAP,
    MDIO_DATA_GD_MASK, MDIO_DATA_RA_SHIFT, MacRegs,
};

// =============================================================================
// MDIO Constants
// =============================================================================

/// Maximum valid PHY address (5-bit field)
pub const MAX_PHY_ADDR: u8 = 31;

// =============================================================================
// MDIO Bus Trait
// =============================================================================

/// Trait for MDIO bus operations
///
/// `devad` selects clause 45 addressing when `Some`; with `None` the
/// transaction is a plain clause 22 access and `reg` is a 5-bit register
/// number. Out-of-range values are masked to the hardware field widths.
pub trait MdioBus {
    /// Read a PHY register
    fn read(&mut self, phy_addr: u8, devad: Option<u8>, reg: u16) -> Result<u16>;

    /// Write a PHY register
    fn write(&mut self, phy_addr: u8, devad: Option<u8>, reg: u16, value: u16) -> Result<()>;

    /// Check if the MDIO bus is busy
    fn is_busy(&self) -> bool;

    /// Clause 22 read
    fn read_c22(&mut self, phy_addr: u8, reg: u8) -> Result<u16> {
        self.read(phy_addr, None, reg as u16)
    }

    /// Clause 22 write
    fn write_c22(&mut self, phy_addr: u8, reg: u8, value: u16) -> Result<()> {
        self.write(phy_addr, None, reg as u16, value)
    }
}

// =============================================================================
// MDIO Controller
// =============================================================================

/// MDIO master of an EQoS MAC
pub struct MdioController<'a, R: RegisterAccess, D: DelayNs> {
    regs: &'a R,
    delay: &'a mut D,
    clock_range: MdcClockRange,
    settle_us: u32,
    timeout_us: u32,
}

impl<'a, R: RegisterAccess, D: DelayNs> MdioController<'a, R, D> {
    /// Create a controller with default timing
    pub fn new(regs: &'a R, delay: &'a mut D) -> Self {
        Self {
            regs,
            delay,
            clock_range: MdcClockRange::default(),
            settle_us: MDIO_SETTLE_US,
            timeout_us: MDIO_TIMEOUT_US,
        }
    }

    /// Create a controller using the timing from `config`
    pub fn from_config(regs: &'a R, delay: &'a mut D, config: &EqosConfig) -> Self {
        Self {
            regs,
            delay,
            clock_range: config.mdc_clock_range,
            settle_us: config.mdio_settle_us,
            timeout_us: config.mdio_timeout_us,
        }
    }

    /// Set the MDC clock range
    pub fn set_clock_range(&mut self, range: MdcClockRange) {
        self.clock_range = range;
    }

    /// Set the busy timeout
    pub fn set_timeout_us(&mut self, timeout_us: u32) {
        self.timeout_us = timeout_us;
    }

    /// Wait for the busy bit to clear
    fn wait_idle(&mut self) -> Result<()> {
        let mac = MacRegs::new(self.regs);
        let budget = PollBudget::new(self.timeout_us, MDIO_POLL_INTERVAL_US);
        if budget.wait(self.delay, || mac.mdio_address() & MDIO_ADDRESS_GB == 0) {
            Ok(())
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("MDIO busy timeout");
            Err(IoError::MdioTimeout.into())
        }
    }

    /// Build the MDIO address register value for one transaction
    ///
    /// The skip-address-packet bit is carried over from the current
    /// register contents.
    fn command(&self, current: u32, phy_addr: u8, devad: Option<u8>, reg: u16, goc: u32) -> u32 {
        let rda = match devad {
            Some(dev) => dev as u32,
            None => reg as u32,
        };

        let mut val = (current & MDIO_ADDRESS_SKAP)
            | field_prep(phy_addr as u32, MDIO_ADDRESS_PA_MASK, MDIO_ADDRESS_PA_SHIFT)
            | field_prep(rda, MDIO_ADDRESS_RDA_MASK, MDIO_ADDRESS_RDA_SHIFT)
            | field_prep(
                self.clock_range.bits(),
                MDIO_ADDRESS_CR_MASK,
                MDIO_ADDRESS_CR_SHIFT,
            )
            | (goc << MDIO_ADDRESS_GOC_SHIFT)
            | MDIO_ADDRESS_GB;

        if devad.is_some() {
            val |= MDIO_ADDRESS_C45E;
        }
        val
    }
}

impl<R: RegisterAccess, D: DelayNs> MdioBus for MdioController<'_, R, D> {
    fn read(&mut self, phy_addr: u8, devad: Option<u8>, reg: u16) -> Result<u16> {
        self.wait_idle()?;

        let mac = MacRegs::new(self.regs);
        let cmd = self.command(mac.mdio_address(), phy_addr, devad, reg, MDIO_ADDRESS_GOC_READ);

        if devad.is_some() {
            mac.set_mdio_data((reg as u32) << MDIO_DATA_RA_SHIFT);
        }
        mac.set_mdio_address(cmd);

        self.delay.delay_us(self.settle_us);
        self.wait_idle()?;

        Ok((mac.mdio_data() & MDIO_DATA_GD_MASK) as u16)
    }

    fn write(&mut self, phy_addr: u8, devad: Option<u8>, reg: u16, value: u16) -> Result<()> {
        self.wait_idle()?;

        let mac = MacRegs::new(self.regs);
        let cmd = self.command(mac.mdio_address(), phy_addr, devad, reg, MDIO_ADDRESS_GOC_WRITE);

        let mut data = value as u32;
        if devad.is_some() {
            data |= (reg as u32) << MDIO_DATA_RA_SHIFT;
        }
        mac.set_mdio_data(data);
        mac.set_mdio_address(cmd);

        self.delay.delay_us(self.settle_us);
        self.wait_idle()
    }

    fn is_busy(&self) -> bool {
        MacRegs::new(self.regs).mdio_address() & MDIO_ADDRESS_GB != 0
    }
}

// =============================================================================
// PHY Register Definitions (IEEE 802.3 standard registers)
// =============================================================================

/// Standard PHY register addresses (IEEE 802.3 Clause 22)
pub mod phy_reg {
    /// Basic Mode Control Register
    pub const BMCR: u8 = 0;
    /// Basic Mode Status Register
    pub const BMSR: u8 = 1;
    /// PHY Identifier 1
    pub const PHYIDR1: u8 = 2;
    /// PHY Identifier 2
    pub const PHYIDR2: u8 = 3;
    /// Auto-Negotiation Advertisement Register
    pub const ANAR: u8 = 4;
    /// Auto-Negotiation Link Partner Ability Register
    pub const ANLPAR: u8 = 5;
    /// 1000BASE-T Control Register
    pub const GBCR: u8 = 9;
    /// 1000BASE-T Status Register
    pub const GBSR: u8 = 10;
    /// Extended Status Register
    pub const ESTATUS: u8 = 15;
}

/// BMCR (Basic Mode Control Register) bits
pub mod bmcr {
    /// Soft reset
    pub const RESET: u16 = 1 << 15;
    /// Loopback mode
    pub const LOOPBACK: u16 = 1 << 14;
    /// Speed select LSB (100 Mbps if set and SPEED_1000 clear)
    pub const SPEED_100: u16 = 1 << 13;
    /// Auto-negotiation enable
    pub const AN_ENABLE: u16 = 1 << 12;
    /// Power down
    pub const POWER_DOWN: u16 = 1 << 11;
    /// Isolate
    pub const ISOLATE: u16 = 1 << 10;
    /// Restart auto-negotiation
    pub const AN_RESTART: u16 = 1 << 9;
    /// Duplex mode (full duplex if set)
    pub const DUPLEX_FULL: u16 = 1 << 8;
    /// Speed select MSB (1000 Mbps)
    pub const SPEED_1000: u16 = 1 << 6;
}

/// BMSR (Basic Mode Status Register) bits
pub mod bmsr {
    /// 100BASE-TX full duplex capable
    pub const TX_FD_CAPABLE: u16 = 1 << 14;
    /// 100BASE-TX half duplex capable
    pub const TX_HD_CAPABLE: u16 = 1 << 13;
    /// 10BASE-T full duplex capable
    pub const T10_FD_CAPABLE: u16 = 1 << 12;
    /// 10BASE-T half duplex capable
    pub const T10_HD_CAPABLE: u16 = 1 << 11;
    /// Extended status register present
    pub const ESTATUS: u16 = 1 << 8;
    /// Auto-negotiation complete
    pub const AN_COMPLETE: u16 = 1 << 5;
    /// Auto-negotiation ability
    pub const AN_ABILITY: u16 = 1 << 3;
    /// Link status (latched low)
    pub const LINK_STATUS: u16 = 1 << 2;
    /// Extended capabilities
    pub const EXT_CAPABLE: u16 = 1 << 0;
}

/// ANAR / ANLPAR (Auto-Negotiation Advertisement / Link Partner) bits
pub mod anar {
    /// Pause capable
    pub const PAUSE: u16 = 1 << 10;
    /// 100BASE-TX full duplex
    pub const TX_FD: u16 = 1 << 8;
    /// 100BASE-TX half duplex
    pub const TX_HD: u16 = 1 << 7;
    /// 10BASE-T full duplex
    pub const T10_FD: u16 = 1 << 6;
    /// 10BASE-T half duplex
    pub const T10_HD: u16 = 1 << 5;
    /// IEEE 802.3 selector field
    pub const SELECTOR_802_3: u16 = 0x0001;
    /// All 10/100 abilities
    pub const ALL_10_100: u16 = TX_FD | TX_HD | T10_FD | T10_HD;
}

/// GBCR / GBSR (1000BASE-T Control / Status) bits
pub mod gbcr {
    /// Advertise 1000BASE-T full duplex (GBCR)
    pub const ADV_1000_FD: u16 = 1 << 9;
    /// Advertise 1000BASE-T half duplex (GBCR)
    pub const ADV_1000_HD: u16 = 1 << 8;
    /// Link partner 1000BASE-T full duplex (GBSR)
    pub const LP_1000_FD: u16 = 1 << 11;
    /// Link partner 1000BASE-T half duplex (GBSR)
    pub const LP_1000_HD: u16 = 1 << 10;
}

/// ESTATUS (Extended Status) bits
pub mod estatus {
    /// 1000BASE-T full duplex capable
    pub const T1000_FD: u16 = 1 << 13;
    /// 1000BASE-T half duplex capable
    pub const T1000_HD: u16 = 1 << 12;
}

// =============================================================================
// Unit Tests
// =============================================================================
