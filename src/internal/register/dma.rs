//! DMA Register Definitions
//!
//! Global DMA mode/bus registers and the channel 0 registers that own the
//! TX and RX descriptor rings.

use super::{RegisterAccess, reg_bit_ops, reg_rw};

// =============================================================================
// Register Offsets
// =============================================================================

/// DMA Mode register
pub const DMA_MODE: usize = 0x1000;
/// DMA System Bus Mode register
pub const DMA_SYSBUS_MODE: usize = 0x1004;
/// DMA Channel 0 Control register
pub const DMA_CH0_CONTROL: usize = 0x1100;
/// DMA Channel 0 TX Control register
pub const DMA_CH0_TX_CONTROL: usize = 0x1104;
/// DMA Channel 0 RX Control register
pub const DMA_CH0_RX_CONTROL: usize = 0x1108;
/// DMA Channel 0 TX Descriptor List High Address register
pub const DMA_CH0_TXDESC_LIST_HADDRESS: usize = 0x1110;
/// DMA Channel 0 TX Descriptor List Address register
pub const DMA_CH0_TXDESC_LIST_ADDRESS: usize = 0x1114;
/// DMA Channel 0 RX Descriptor List High Address register
pub const DMA_CH0_RXDESC_LIST_HADDRESS: usize = 0x1118;
/// DMA Channel 0 RX Descriptor List Address register
pub const DMA_CH0_RXDESC_LIST_ADDRESS: usize = 0x111c;
/// DMA Channel 0 TX Descriptor Tail Pointer register
pub const DMA_CH0_TXDESC_TAIL_POINTER: usize = 0x1120;
/// DMA Channel 0 RX Descriptor Tail Pointer register
pub const DMA_CH0_RXDESC_TAIL_POINTER: usize = 0x1128;
/// DMA Channel 0 TX Descriptor Ring Length register
pub const DMA_CH0_TXDESC_RING_LENGTH: usize = 0x112c;
/// DMA Channel 0 RX Descriptor Ring Length register
pub const DMA_CH0_RXDESC_RING_LENGTH: usize = 0x1130;

// =============================================================================
// Mode / System Bus Bits
// =============================================================================

/// Software Reset
pub const MODE_SWR: u32 = 1 << 0;

/// Read outstanding request limit shift
pub const SYSBUS_MODE_RD_OSR_LMT_SHIFT: u32 = 16;
/// Read outstanding request limit mask
pub const SYSBUS_MODE_RD_OSR_LMT_MASK: u32 = 0xf;
/// Enhanced Address Mode Enable
pub const SYSBUS_MODE_EAME: u32 = 1 << 11;
/// AXI burst length 16
pub const SYSBUS_MODE_BLEN16: u32 = 1 << 3;
/// AXI burst length 8
pub const SYSBUS_MODE_BLEN8: u32 = 1 << 2;
/// AXI burst length 4
pub const SYSBUS_MODE_BLEN4: u32 = 1 << 1;

// =============================================================================
// Channel 0 Control Bits
// =============================================================================

/// Descriptor Skip Length shift
pub const CONTROL_DSL_SHIFT: u32 = 18;
/// Descriptor Skip Length mask
pub const CONTROL_DSL_MASK: u32 = 7;
/// 8xPBL mode
pub const CONTROL_PBLX8: u32 = 1 << 16;

/// TX Programmable Burst Length shift
pub const TX_CONTROL_TXPBL_SHIFT: u32 = 16;
/// TX Programmable Burst Length mask
pub const TX_CONTROL_TXPBL_MASK: u32 = 0x3f;
/// Operate on Second Packet
pub const TX_CONTROL_OSP: u32 = 1 << 4;
/// Start or Stop Transmission
pub const TX_CONTROL_ST: u32 = 1 << 0;

/// RX Programmable Burst Length shift
pub const RX_CONTROL_RXPBL_SHIFT: u32 = 16;
/// RX Programmable Burst Length mask
pub const RX_CONTROL_RXPBL_MASK: u32 = 0x3f;
/// Receive Buffer Size shift
pub const RX_CONTROL_RBSZ_SHIFT: u32 = 1;
/// Receive Buffer Size mask
pub const RX_CONTROL_RBSZ_MASK: u32 = 0x3fff;
/// Start or Stop Receive
pub const RX_CONTROL_SR: u32 = 1 << 0;

// =============================================================================
// DMA Register Block
// =============================================================================

/// Typed view of the DMA register block
pub struct DmaRegs<'a, R: RegisterAccess> {
    bus: &'a R,
}

impl<'a, R: RegisterAccess> DmaRegs<'a, R> {
    /// Create a view over `bus`
    pub const fn new(bus: &'a R) -> Self {
        Self { bus }
    }

    reg_rw!(mode, set_mode, DMA_MODE, "DMA Mode register");
    reg_rw!(sysbus_mode, set_sysbus_mode, DMA_SYSBUS_MODE, "System Bus Mode register");
    reg_rw!(ch0_control, set_ch0_control, DMA_CH0_CONTROL, "Channel 0 Control register");
    reg_rw!(ch0_tx_control, set_ch0_tx_control, DMA_CH0_TX_CONTROL, "Channel 0 TX Control register");
    reg_rw!(ch0_rx_control, set_ch0_rx_control, DMA_CH0_RX_CONTROL, "Channel 0 RX Control register");
    reg_rw!(txdesc_tail_pointer, set_txdesc_tail_pointer, DMA_CH0_TXDESC_TAIL_POINTER, "TX Descriptor Tail Pointer register");
    reg_rw!(rxdesc_tail_pointer, set_rxdesc_tail_pointer, DMA_CH0_RXDESC_TAIL_POINTER, "RX Descriptor Tail Pointer register");

    reg_bit_ops!(start_tx, stop_tx, DMA_CH0_TX_CONTROL, TX_CONTROL_ST, "TX DMA", "Start", "Stop");
    reg_bit_ops!(start_rx, stop_rx, DMA_CH0_RX_CONTROL, RX_CONTROL_SR, "RX DMA", "Start", "Stop");
    reg_bit_ops!(enable_osp, disable_osp, DMA_CH0_TX_CONTROL, TX_CONTROL_OSP, "operate-on-second-packet", "Enable", "Disable");

    /// Assert the software reset bit
    #[inline(always)]
    pub fn assert_soft_reset(&self) {
        self.bus.set_bits(DMA_MODE, MODE_SWR);
    }

    /// Software reset still in progress
    #[inline(always)]
    pub fn soft_reset_pending(&self) -> bool {
        self.mode() & MODE_SWR != 0
    }

    /// Program the RX buffer size
    pub fn set_rx_buffer_size(&self, bytes: u32) {
        self.bus.clear_set_bits(
            DMA_CH0_RX_CONTROL,
            RX_CONTROL_RBSZ_MASK << RX_CONTROL_RBSZ_SHIFT,
            (bytes & RX_CONTROL_RBSZ_MASK) << RX_CONTROL_RBSZ_SHIFT,
        );
    }

    /// Enable 8xPBL and program the descriptor skip length
    pub fn set_pblx8_and_skip(&self, skip: u32) {
        self.bus.set_bits(
            DMA_CH0_CONTROL,
            CONTROL_PBLX8 | ((skip & CONTROL_DSL_MASK) << CONTROL_DSL_SHIFT),
        );
    }

    /// Program the TX programmable burst length
    pub fn set_tx_pbl(&self, pbl: u32) {
        self.bus.clear_set_bits(
            DMA_CH0_TX_CONTROL,
            TX_CONTROL_TXPBL_MASK << TX_CONTROL_TXPBL_SHIFT,
            (pbl & TX_CONTROL_TXPBL_MASK) << TX_CONTROL_TXPBL_SHIFT,
        );
    }

    /// Program the RX programmable burst length
    pub fn set_rx_pbl(&self, pbl: u32) {
        self.bus.clear_set_bits(
            DMA_CH0_RX_CONTROL,
            RX_CONTROL_RXPBL_MASK << RX_CONTROL_RXPBL_SHIFT,
            (pbl & RX_CONTROL_RXPBL_MASK) << RX_CONTROL_RXPBL_SHIFT,
        );
    }

    /// Point the TX ring registers at `base` with `count` descriptors
    pub fn set_tx_ring(&self, base: u64, count: usize) {
        self.bus
            .write(DMA_CH0_TXDESC_LIST_HADDRESS, (base >> 32) as u32);
        self.bus.write(DMA_CH0_TXDESC_LIST_ADDRESS, base as u32);
        self.bus
            .write(DMA_CH0_TXDESC_RING_LENGTH, (count - 1) as u32);
    }

    /// Point the RX ring registers at `base` with `count` descriptors
    pub fn set_rx_ring(&self, base: u64, count: usize) {
        self.bus
            .write(DMA_CH0_RXDESC_LIST_HADDRESS, (base >> 32) as u32);
        self.bus.write(DMA_CH0_RXDESC_LIST_ADDRESS, base as u32);
        self.bus
            .write(DMA_CH0_RXDESC_RING_LENGTH, (count - 1) as u32);
    }
}
