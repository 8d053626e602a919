//! Fixed-link pseudo-PHY
//!
//! For MACs wired straight to a switch or another MAC: there is nothing to
//! negotiate, the link is always up at the configured speed and duplex and
//! the MDIO bus is never touched.

use crate::driver::config::{Duplex, Speed};
use crate::driver::error::Result;
use crate::hal::mdio::MdioBus;

use super::{LinkStatus, PhyDriver};

/// Always-up link at a fixed speed/duplex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedLink {
    speed: Speed,
    duplex: Duplex,
}

impl FixedLink {
    /// Fixed link at `speed`/`duplex`
    pub const fn new(speed: Speed, duplex: Duplex) -> Self {
        Self { speed, duplex }
    }
}

impl PhyDriver for FixedLink {
    fn address(&self) -> u8 {
        0
    }

    fn startup<M: MdioBus>(&mut self, _mdio: &mut M) -> Result<LinkStatus> {
        Ok(LinkStatus::up(self.speed, self.duplex))
    }

    fn shutdown<M: MdioBus>(&mut self, _mdio: &mut M) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockMdioBus;

    #[test]
    fn reports_configured_link_without_mdio() {
        let mut mdio = MockMdioBus::new();
        mdio.set_timeout(true);
        let mut phy = FixedLink::new(Speed::Mbps100, Duplex::Half);

        let status = phy.startup(&mut mdio).unwrap();
        assert!(status.link_up);
        assert_eq!(status.speed_mbps, 100);
        assert_eq!(status.duplex, Duplex::Half);
        assert_eq!(phy.shutdown(&mut mdio), Ok(()));
    }
}
