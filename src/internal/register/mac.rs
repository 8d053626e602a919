//! MAC Core Register Definitions
//!
//! The MAC core handles framing, flow control, the station address and the
//! MDIO master. Offsets are relative to the start of the EQoS window.

use super::{RegisterAccess, reg_bit_ops, reg_ro, reg_rw};

// =============================================================================
// Register Offsets
// =============================================================================

/// MAC Configuration register
pub const MAC_CONFIGURATION: usize = 0x000;
/// MAC Packet Filter register
pub const MAC_PACKET_FILTER: usize = 0x008;
/// MAC Queue 0 TX Flow Control register
pub const MAC_Q0_TX_FLOW_CTRL: usize = 0x070;
/// MAC RX Flow Control register
pub const MAC_RX_FLOW_CTRL: usize = 0x090;
/// MAC TX Queue Priority Mapping 0 register
pub const MAC_TXQ_PRTY_MAP0: usize = 0x098;
/// MAC RX Queue Control 0 register
pub const MAC_RXQ_CTRL0: usize = 0x0a0;
/// MAC RX Queue Control 1 register
pub const MAC_RXQ_CTRL1: usize = 0x0a4;
/// MAC RX Queue Control 2 register
pub const MAC_RXQ_CTRL2: usize = 0x0a8;
/// MAC 1us Tick Counter register
pub const MAC_US_TIC_COUNTER: usize = 0x0dc;
/// MAC HW Feature 0 register
pub const MAC_HW_FEATURE0: usize = 0x11c;
/// MAC HW Feature 1 register
pub const MAC_HW_FEATURE1: usize = 0x120;
/// MAC MDIO Address register
pub const MAC_MDIO_ADDRESS: usize = 0x200;
/// MAC MDIO Data register
pub const MAC_MDIO_DATA: usize = 0x204;
/// MAC Address 0 High register (bytes 4-5)
pub const MAC_ADDRESS0_HIGH: usize = 0x300;
/// MAC Address 0 Low register (bytes 0-3)
pub const MAC_ADDRESS0_LOW: usize = 0x304;

// =============================================================================
// MAC Configuration Bits
// =============================================================================

/// Giant Packet Size Limit Control Enable
pub const CONFIGURATION_GPSLCE: u32 = 1 << 23;
/// CRC Stripping for Type packets
pub const CONFIGURATION_CST: u32 = 1 << 21;
/// Automatic Pad or CRC Stripping
pub const CONFIGURATION_ACS: u32 = 1 << 20;
/// Watchdog Disable
pub const CONFIGURATION_WD: u32 = 1 << 19;
/// Jabber Disable
pub const CONFIGURATION_JD: u32 = 1 << 17;
/// Jumbo Packet Enable
pub const CONFIGURATION_JE: u32 = 1 << 16;
/// Port Select (set = 10/100 MII, clear = GMII)
pub const CONFIGURATION_PS: u32 = 1 << 15;
/// Speed (set = 100 Mb/s when PS is set)
pub const CONFIGURATION_FES: u32 = 1 << 14;
/// Duplex Mode (set = full duplex)
pub const CONFIGURATION_DM: u32 = 1 << 13;
/// Transmitter Enable
pub const CONFIGURATION_TE: u32 = 1 << 1;
/// Receiver Enable
pub const CONFIGURATION_RE: u32 = 1 << 0;

// =============================================================================
// Filter / Flow Control / Queue Bits
// =============================================================================

/// Promiscuous mode
pub const PACKET_FILTER_PR: u32 = 1 << 0;

/// Pause Time field shift
pub const Q0_TX_FLOW_CTRL_PT_SHIFT: u32 = 16;
/// Pause Time field mask
pub const Q0_TX_FLOW_CTRL_PT_MASK: u32 = 0xffff;
/// Transmit Flow Control Enable
pub const Q0_TX_FLOW_CTRL_TFE: u32 = 1 << 1;

/// Receive Flow Control Enable
pub const RX_FLOW_CTRL_RFE: u32 = 1 << 0;

/// Priorities Selected in TX Queue 0 shift
pub const TXQ_PRTY_MAP0_PSTQ0_SHIFT: u32 = 0;
/// Priorities Selected in TX Queue 0 mask
pub const TXQ_PRTY_MAP0_PSTQ0_MASK: u32 = 0xff;

/// RX Queue 0 Enable field shift
pub const RXQ_CTRL0_RXQ0EN_SHIFT: u32 = 0;
/// RX Queue 0 Enable field mask
pub const RXQ_CTRL0_RXQ0EN_MASK: u32 = 3;

/// Multicast and Broadcast Queue Enable
pub const RXQ_CTRL1_MCBCQEN: u32 = 1 << 20;

/// Priorities Selected in RX Queue 0 shift
pub const RXQ_CTRL2_PSRQ0_SHIFT: u32 = 0;
/// Priorities Selected in RX Queue 0 mask
pub const RXQ_CTRL2_PSRQ0_MASK: u32 = 0xff;

// =============================================================================
// HW Feature 1 Fields
// =============================================================================

/// TX FIFO size field shift (encoded as log2(bytes / 128))
pub const HW_FEATURE1_TXFIFOSIZE_SHIFT: u32 = 6;
/// TX FIFO size field mask
pub const HW_FEATURE1_TXFIFOSIZE_MASK: u32 = 0x1f;
/// RX FIFO size field shift (encoded as log2(bytes / 128))
pub const HW_FEATURE1_RXFIFOSIZE_SHIFT: u32 = 0;
/// RX FIFO size field mask
pub const HW_FEATURE1_RXFIFOSIZE_MASK: u32 = 0x1f;

// =============================================================================
// MDIO Address Register Fields
// =============================================================================

/// Physical Layer Address shift
pub const MDIO_ADDRESS_PA_SHIFT: u32 = 21;
/// Physical Layer Address mask
pub const MDIO_ADDRESS_PA_MASK: u32 = 0x1f;
/// Register/Device Address shift
pub const MDIO_ADDRESS_RDA_SHIFT: u32 = 16;
/// Register/Device Address mask
pub const MDIO_ADDRESS_RDA_MASK: u32 = 0x1f;
/// CSR Clock Range shift
pub const MDIO_ADDRESS_CR_SHIFT: u32 = 8;
/// CSR Clock Range mask
pub const MDIO_ADDRESS_CR_MASK: u32 = 0xf;
/// Skip Address Packet
pub const MDIO_ADDRESS_SKAP: u32 = 1 << 4;
/// GMII Operation Command shift
pub const MDIO_ADDRESS_GOC_SHIFT: u32 = 2;
/// GMII Operation Command: read
pub const MDIO_ADDRESS_GOC_READ: u32 = 3;
/// GMII Operation Command: write
pub const MDIO_ADDRESS_GOC_WRITE: u32 = 1;
/// Clause 45 PHY Enable
pub const MDIO_ADDRESS_C45E: u32 = 1 << 1;
/// GMII Busy
pub const MDIO_ADDRESS_GB: u32 = 1 << 0;

/// Register Address field of the MDIO data register (clause 45)
pub const MDIO_DATA_RA_SHIFT: u32 = 16;
/// GMII Data mask
pub const MDIO_DATA_GD_MASK: u32 = 0xffff;

// =============================================================================
// MAC Register Block
// =============================================================================

/// Typed view of the MAC register block
pub struct MacRegs<'a, R: RegisterAccess> {
    bus: &'a R,
}

impl<'a, R: RegisterAccess> MacRegs<'a, R> {
    /// Create a view over `bus`
    pub const fn new(bus: &'a R) -> Self {
        Self { bus }
    }

    reg_rw!(configuration, set_configuration, MAC_CONFIGURATION, "MAC Configuration register");
    reg_rw!(packet_filter, set_packet_filter, MAC_PACKET_FILTER, "Packet Filter register");
    reg_rw!(q0_tx_flow_ctrl, set_q0_tx_flow_ctrl, MAC_Q0_TX_FLOW_CTRL, "Q0 TX Flow Control register");
    reg_rw!(rx_flow_ctrl, set_rx_flow_ctrl, MAC_RX_FLOW_CTRL, "RX Flow Control register");
    reg_rw!(rxq_ctrl0, set_rxq_ctrl0, MAC_RXQ_CTRL0, "RX Queue Control 0 register");
    reg_rw!(us_tic_counter, set_us_tic_counter, MAC_US_TIC_COUNTER, "1us Tick Counter register");
    reg_rw!(mdio_address, set_mdio_address, MAC_MDIO_ADDRESS, "MDIO Address register");
    reg_rw!(mdio_data, set_mdio_data, MAC_MDIO_DATA, "MDIO Data register");
    reg_rw!(address0_high, set_address0_high, MAC_ADDRESS0_HIGH, "MAC Address 0 High register");
    reg_rw!(address0_low, set_address0_low, MAC_ADDRESS0_LOW, "MAC Address 0 Low register");

    reg_ro!(hw_feature0, MAC_HW_FEATURE0, "HW Feature 0 register");
    reg_ro!(hw_feature1, MAC_HW_FEATURE1, "HW Feature 1 register");

    reg_bit_ops!(enable_full_duplex, enable_half_duplex, MAC_CONFIGURATION, CONFIGURATION_DM, "full duplex", "Enable", "Disable");
    reg_bit_ops!(enable_tx_flow_control, disable_tx_flow_control, MAC_Q0_TX_FLOW_CTRL, Q0_TX_FLOW_CTRL_TFE, "TX flow control", "Enable", "Disable");
    reg_bit_ops!(enable_rx_flow_control, disable_rx_flow_control, MAC_RX_FLOW_CTRL, RX_FLOW_CTRL_RFE, "RX flow control", "Enable", "Disable");
    reg_bit_ops!(enable_promiscuous, disable_promiscuous, MAC_PACKET_FILTER, PACKET_FILTER_PR, "promiscuous mode", "Enable", "Disable");
    reg_bit_ops!(enable_mc_bc_queue, disable_mc_bc_queue, MAC_RXQ_CTRL1, RXQ_CTRL1_MCBCQEN, "multicast/broadcast routing to queue 0", "Enable", "Disable");

    /// Enable MAC transmitter and receiver
    #[inline(always)]
    pub fn enable_tx_rx(&self) {
        self.bus
            .set_bits(MAC_CONFIGURATION, CONFIGURATION_TE | CONFIGURATION_RE);
    }

    /// Disable MAC transmitter and receiver
    #[inline(always)]
    pub fn disable_tx_rx(&self) {
        self.bus
            .clear_bits(MAC_CONFIGURATION, CONFIGURATION_TE | CONFIGURATION_RE);
    }

    /// Program the speed-select bits
    #[inline(always)]
    pub fn set_speed_bits(&self, ps: bool, fes: bool) {
        let mut set = 0;
        if ps {
            set |= CONFIGURATION_PS;
        }
        if fes {
            set |= CONFIGURATION_FES;
        }
        self.bus.clear_set_bits(
            MAC_CONFIGURATION,
            CONFIGURATION_PS | CONFIGURATION_FES,
            set,
        );
    }

    /// Clear the queue 0 priority maps used for TX/RX flow control
    pub fn clear_queue_priorities(&self) {
        self.bus.clear_bits(
            MAC_TXQ_PRTY_MAP0,
            TXQ_PRTY_MAP0_PSTQ0_MASK << TXQ_PRTY_MAP0_PSTQ0_SHIFT,
        );
        self.bus.clear_bits(
            MAC_RXQ_CTRL2,
            RXQ_CTRL2_PSRQ0_MASK << RXQ_CTRL2_PSRQ0_SHIFT,
        );
    }

    /// Write the station address
    ///
    /// The low register holds bytes 0-3, the high register bytes 4-5 in
    /// its low 16 bits.
    pub fn set_station_address(&self, mac: &[u8; 6]) {
        let (high, low) = station_address_words(mac);
        self.set_address0_high(high);
        self.set_address0_low(low);
    }

    /// Read back the station address
    pub fn station_address(&self) -> [u8; 6] {
        let high = self.address0_high();
        let low = self.address0_low();
        [
            low as u8,
            (low >> 8) as u8,
            (low >> 16) as u8,
            (low >> 24) as u8,
            high as u8,
            (high >> 8) as u8,
        ]
    }
}

/// Split a MAC address into the (high, low) ADDRESS0 register words
pub const fn station_address_words(mac: &[u8; 6]) -> (u32, u32) {
    let high = ((mac[5] as u32) << 8) | mac[4] as u32;
    let low = ((mac[3] as u32) << 24)
        | ((mac[2] as u32) << 16)
        | ((mac[1] as u32) << 8)
        | mac[0] as u32;
    (high, low)
}
