//! Ethernet PHY Drivers
//!
//! The MAC only needs three things from a PHY: bring the link up and
//! report what was negotiated, power it down, and say which MDIO address it
//! answers on. [`PhyDriver`] captures exactly that, independent of the MAC,
//! talking to the PHY only through an [`MdioBus`].
//!
//! # Implementations
//!
//! - [`GenericPhy`]: any IEEE 802.3 clause 22 PHY, with address scan
//! - [`FixedLink`]: no PHY at all, a fixed speed/duplex
//!
//! # Example
//!
//! ```ignore
//! use dwc_eqos::phy::{GenericPhy, PhyDriver};
//!
//! let mut phy = GenericPhy::scan().with_max_speed(Speed::Mbps100);
//! eqos.start(&mut phy)?;
//! ```

pub mod fixed;
pub mod generic;

pub use fixed::FixedLink;
pub use generic::GenericPhy;

// Re-export IEEE 802.3 standard register definitions from mdio
pub use crate::hal::mdio::{MdioBus, anar, bmcr, bmsr, phy_reg};

use crate::driver::config::{Duplex, Speed};
use crate::driver::error::Result;

// =============================================================================
// Link Status
// =============================================================================

/// Link parameters reported by a PHY after startup
///
/// The speed is kept as the raw Mb/s figure the PHY resolved; mapping it
/// onto a MAC speed (and rejecting anything else) is the MAC's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStatus {
    /// Link is up
    pub link_up: bool,
    /// Resolved speed in Mb/s
    pub speed_mbps: u32,
    /// Resolved duplex
    pub duplex: Duplex,
}

impl LinkStatus {
    /// A link that is up at `speed`
    pub const fn up(speed: Speed, duplex: Duplex) -> Self {
        Self {
            link_up: true,
            speed_mbps: speed.mbps(),
            duplex,
        }
    }

    /// No link
    pub const fn down() -> Self {
        Self {
            link_up: false,
            speed_mbps: 0,
            duplex: Duplex::Half,
        }
    }
}

// =============================================================================
// PHY Driver Trait
// =============================================================================

/// Trait for Ethernet PHY drivers
///
/// # Example Implementation
///
/// ```ignore
/// struct MyPhy {
///     addr: u8,
/// }
///
/// impl PhyDriver for MyPhy {
///     fn address(&self) -> u8 { self.addr }
///
///     fn startup<M: MdioBus>(&mut self, mdio: &mut M) -> Result<LinkStatus> {
///         // reset, negotiate, resolve
///     }
///
///     fn shutdown<M: MdioBus>(&mut self, mdio: &mut M) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait PhyDriver {
    /// MDIO address the PHY answers on (0-31)
    fn address(&self) -> u8;

    /// Bring the PHY up and report the resolved link
    ///
    /// A link that did not come up is reported as `link_up == false`
    /// rather than as an error.
    fn startup<M: MdioBus>(&mut self, mdio: &mut M) -> Result<LinkStatus>;

    /// Power the PHY down
    fn shutdown<M: MdioBus>(&mut self, mdio: &mut M) -> Result<()>;

    /// Limit the speed advertised on the next startup
    fn set_max_speed(&mut self, _speed: Speed) {}
}
