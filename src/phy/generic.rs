//! Generic IEEE 802.3 PHY
//!
//! Drives any PHY through the standard clause 22 registers: soft reset,
//! advertisement, auto-negotiation restart and resolution of the
//! negotiated speed/duplex from the link-partner registers.

use crate::driver::config::{Duplex, Speed};
use crate::driver::error::{ConfigError, Result};
use crate::hal::mdio::{MAX_PHY_ADDR, MdioBus, anar, bmcr, bmsr, estatus, gbcr, phy_reg};

use super::{LinkStatus, PhyDriver};

/// BMCR reads allowed for the soft reset bit to self-clear
const RESET_ATTEMPTS: u32 = 1_000;

/// BMSR reads allowed for auto-negotiation to finish
const AUTONEG_ATTEMPTS: u32 = 400_000;

/// Clause 22 PHY driven through the standard register set
#[derive(Debug, Clone, Copy)]
pub struct GenericPhy {
    addr: Option<u8>,
    max_speed: Option<Speed>,
    autoneg_attempts: u32,
}

impl GenericPhy {
    /// PHY at a known address
    pub const fn new(addr: u8) -> Self {
        Self {
            addr: Some(addr),
            max_speed: None,
            autoneg_attempts: AUTONEG_ATTEMPTS,
        }
    }

    /// PHY found by scanning the bus on first startup
    pub const fn scan() -> Self {
        Self {
            addr: None,
            max_speed: None,
            autoneg_attempts: AUTONEG_ATTEMPTS,
        }
    }

    /// Do not advertise anything faster than `speed`
    #[must_use]
    pub const fn with_max_speed(mut self, speed: Speed) -> Self {
        self.max_speed = Some(speed);
        self
    }

    /// Number of BMSR reads to wait for auto-negotiation
    #[must_use]
    pub const fn with_autoneg_attempts(mut self, attempts: u32) -> Self {
        self.autoneg_attempts = attempts;
        self
    }

    /// Read the 32-bit PHY identifier `(PHYIDR1 << 16) | PHYIDR2`
    pub fn phy_id<M: MdioBus>(mdio: &mut M, addr: u8) -> Result<u32> {
        let id1 = mdio.read_c22(addr, phy_reg::PHYIDR1)? as u32;
        let id2 = mdio.read_c22(addr, phy_reg::PHYIDR2)? as u32;
        Ok((id1 << 16) | id2)
    }

    /// First address with a plausible PHY identifier
    pub fn find<M: MdioBus>(mdio: &mut M) -> Result<u8> {
        for addr in 0..=MAX_PHY_ADDR {
            let id = Self::phy_id(mdio, addr)?;
            // Empty bus reads all ones; some parts return zeros
            if id & 0x1fff_ffff != 0x1fff_ffff && id != 0 {
                #[cfg(feature = "defmt")]
                defmt::debug!("PHY {:08x} at address {}", id, addr);
                return Ok(addr);
            }
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("no PHY found on MDIO bus");
        Err(ConfigError::PhyNotFound.into())
    }

    fn resolve_address<M: MdioBus>(&mut self, mdio: &mut M) -> Result<u8> {
        match self.addr {
            Some(addr) if addr > MAX_PHY_ADDR => Err(ConfigError::InvalidPhyAddress.into()),
            Some(addr) => Ok(addr),
            None => {
                let addr = Self::find(mdio)?;
                self.addr = Some(addr);
                Ok(addr)
            }
        }
    }

    fn soft_reset<M: MdioBus>(mdio: &mut M, addr: u8) -> Result<()> {
        mdio.write_c22(addr, phy_reg::BMCR, bmcr::RESET)?;
        for _ in 0..RESET_ATTEMPTS {
            if mdio.read_c22(addr, phy_reg::BMCR)? & bmcr::RESET == 0 {
                return Ok(());
            }
        }
        // Some PHYs are slow to clear the bit but work regardless
        #[cfg(feature = "defmt")]
        defmt::warn!("PHY {} reset bit still set", addr);
        Ok(())
    }

    /// Program ANAR/GBCR from the PHY's abilities and the speed limit
    fn advertise<M: MdioBus>(&self, mdio: &mut M, addr: u8) -> Result<()> {
        let status = mdio.read_c22(addr, phy_reg::BMSR)?;
        let limit = self.max_speed.unwrap_or(Speed::Mbps1000);

        let mut adv = anar::SELECTOR_802_3 | anar::PAUSE;
        if status & bmsr::T10_HD_CAPABLE != 0 {
            adv |= anar::T10_HD;
        }
        if status & bmsr::T10_FD_CAPABLE != 0 {
            adv |= anar::T10_FD;
        }
        if limit >= Speed::Mbps100 {
            if status & bmsr::TX_HD_CAPABLE != 0 {
                adv |= anar::TX_HD;
            }
            if status & bmsr::TX_FD_CAPABLE != 0 {
                adv |= anar::TX_FD;
            }
        }
        mdio.write_c22(addr, phy_reg::ANAR, adv)?;

        if status & bmsr::ESTATUS != 0 {
            let ext = mdio.read_c22(addr, phy_reg::ESTATUS)?;
            let mut gig = mdio.read_c22(addr, phy_reg::GBCR)?;
            gig &= !(gbcr::ADV_1000_FD | gbcr::ADV_1000_HD);
            if limit == Speed::Mbps1000 {
                if ext & estatus::T1000_FD != 0 {
                    gig |= gbcr::ADV_1000_FD;
                }
                if ext & estatus::T1000_HD != 0 {
                    gig |= gbcr::ADV_1000_HD;
                }
            }
            mdio.write_c22(addr, phy_reg::GBCR, gig)?;
        }
        Ok(())
    }

    /// Wait for auto-negotiation and read the (latched-low) link bit
    fn update_link<M: MdioBus>(&self, mdio: &mut M, addr: u8) -> Result<bool> {
        let control = mdio.read_c22(addr, phy_reg::BMCR)?;
        if control & bmcr::AN_ENABLE != 0 {
            let mut complete = false;
            for _ in 0..self.autoneg_attempts {
                if mdio.read_c22(addr, phy_reg::BMSR)? & bmsr::AN_COMPLETE != 0 {
                    complete = true;
                    break;
                }
            }
            if !complete {
                #[cfg(feature = "defmt")]
                defmt::info!("PHY {}: auto-negotiation did not complete", addr);
                return Ok(false);
            }
        }

        // First read clears a stale latched link-down
        mdio.read_c22(addr, phy_reg::BMSR)?;
        Ok(mdio.read_c22(addr, phy_reg::BMSR)? & bmsr::LINK_STATUS != 0)
    }

    /// Resolve speed and duplex from what both sides advertised
    fn parse_link<M: MdioBus>(mdio: &mut M, addr: u8) -> Result<(u32, Duplex)> {
        let control = mdio.read_c22(addr, phy_reg::BMCR)?;

        if control & bmcr::AN_ENABLE == 0 {
            let speed = if control & bmcr::SPEED_1000 != 0 {
                1000
            } else if control & bmcr::SPEED_100 != 0 {
                100
            } else {
                10
            };
            let duplex = if control & bmcr::DUPLEX_FULL != 0 {
                Duplex::Full
            } else {
                Duplex::Half
            };
            return Ok((speed, duplex));
        }

        let status = mdio.read_c22(addr, phy_reg::BMSR)?;
        if status & bmsr::ESTATUS != 0 {
            // Partner bits sit two above our advertisement bits
            let gig = mdio.read_c22(addr, phy_reg::GBSR)? & (mdio.read_c22(addr, phy_reg::GBCR)? << 2);
            if gig & (gbcr::LP_1000_FD | gbcr::LP_1000_HD) != 0 {
                let duplex = if gig & gbcr::LP_1000_FD != 0 {
                    Duplex::Full
                } else {
                    Duplex::Half
                };
                return Ok((1000, duplex));
            }
        }

        let common = mdio.read_c22(addr, phy_reg::ANAR)? & mdio.read_c22(addr, phy_reg::ANLPAR)?;
        let resolved = if common & (anar::TX_FD | anar::TX_HD) != 0 {
            (100, if common & anar::TX_FD != 0 { Duplex::Full } else { Duplex::Half })
        } else {
            (10, if common & anar::T10_FD != 0 { Duplex::Full } else { Duplex::Half })
        };
        Ok(resolved)
    }
}

impl PhyDriver for GenericPhy {
    fn address(&self) -> u8 {
        self.addr.unwrap_or(0)
    }

    fn startup<M: MdioBus>(&mut self, mdio: &mut M) -> Result<LinkStatus> {
        let addr = self.resolve_address(mdio)?;

        Self::soft_reset(mdio, addr)?;
        self.advertise(mdio, addr)?;
        mdio.write_c22(addr, phy_reg::BMCR, bmcr::AN_ENABLE | bmcr::AN_RESTART)?;

        if !self.update_link(mdio, addr)? {
            return Ok(LinkStatus::down());
        }

        let (speed_mbps, duplex) = Self::parse_link(mdio, addr)?;
        #[cfg(feature = "defmt")]
        defmt::info!("PHY {}: link up {} Mb/s {}", addr, speed_mbps, duplex);
        Ok(LinkStatus {
            link_up: true,
            speed_mbps,
            duplex,
        })
    }

    fn shutdown<M: MdioBus>(&mut self, mdio: &mut M) -> Result<()> {
        let addr = self.resolve_address(mdio)?;
        let control = mdio.read_c22(addr, phy_reg::BMCR)?;
        mdio.write_c22(addr, phy_reg::BMCR, control | bmcr::POWER_DOWN)
    }

    fn set_max_speed(&mut self, speed: Speed) {
        self.max_speed = Some(speed);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
