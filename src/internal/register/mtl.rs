//! MTL Register Definitions
//!
//! The MAC Transaction Layer holds the TX/RX queue FIFOs between the MAC
//! and the DMA, along with their store-and-forward and flow-control
//! thresholds. Only queue 0 is used.

use super::{RegisterAccess, field_get, reg_bit_ops, reg_ro, reg_rw};

// =============================================================================
// Register Offsets
// =============================================================================

/// MTL TX Queue 0 Operation Mode register
pub const MTL_TXQ0_OPERATION_MODE: usize = 0xd00;
/// MTL TX Queue 0 Debug register
pub const MTL_TXQ0_DEBUG: usize = 0xd08;
/// MTL TX Queue 0 Quantum Weight register
pub const MTL_TXQ0_QUANTUM_WEIGHT: usize = 0xd18;
/// MTL RX Queue 0 Operation Mode register
pub const MTL_RXQ0_OPERATION_MODE: usize = 0xd30;
/// MTL RX Queue 0 Debug register
pub const MTL_RXQ0_DEBUG: usize = 0xd38;

// =============================================================================
// TX Queue 0 Operation Mode
// =============================================================================

/// Transmit Queue Size field shift
pub const TXQ0_OPERATION_MODE_TQS_SHIFT: u32 = 16;
/// Transmit Queue Size field mask
pub const TXQ0_OPERATION_MODE_TQS_MASK: u32 = 0x1ff;
/// Transmit Queue Enable field shift
pub const TXQ0_OPERATION_MODE_TXQEN_SHIFT: u32 = 2;
/// Transmit Queue Enable field mask
pub const TXQ0_OPERATION_MODE_TXQEN_MASK: u32 = 3;
/// Transmit Queue Enable: enabled
pub const TXQ0_OPERATION_MODE_TXQEN_ENABLED: u32 = 2;
/// Transmit Store and Forward
pub const TXQ0_OPERATION_MODE_TSF: u32 = 1 << 1;
/// Flush Transmit Queue
pub const TXQ0_OPERATION_MODE_FTQ: u32 = 1 << 0;

// =============================================================================
// TX Queue 0 Debug
// =============================================================================

/// TX queue not empty
pub const TXQ0_DEBUG_TXQSTS: u32 = 1 << 4;
/// Read controller status shift
pub const TXQ0_DEBUG_TRCSTS_SHIFT: u32 = 1;
/// Read controller status mask
pub const TXQ0_DEBUG_TRCSTS_MASK: u32 = 3;
/// Read controller status: reading a frame
pub const TXQ0_DEBUG_TRCSTS_READING: u32 = 1;

// =============================================================================
// RX Queue 0 Operation Mode
// =============================================================================

/// Receive Queue Size field shift
pub const RXQ0_OPERATION_MODE_RQS_SHIFT: u32 = 20;
/// Receive Queue Size field mask
pub const RXQ0_OPERATION_MODE_RQS_MASK: u32 = 0x3ff;
/// Threshold for Deactivating Flow Control shift
pub const RXQ0_OPERATION_MODE_RFD_SHIFT: u32 = 14;
/// Threshold for Deactivating Flow Control mask
pub const RXQ0_OPERATION_MODE_RFD_MASK: u32 = 0x3f;
/// Threshold for Activating Flow Control shift
pub const RXQ0_OPERATION_MODE_RFA_SHIFT: u32 = 8;
/// Threshold for Activating Flow Control mask
pub const RXQ0_OPERATION_MODE_RFA_MASK: u32 = 0x3f;
/// Enable Hardware Flow Control
pub const RXQ0_OPERATION_MODE_EHFC: u32 = 1 << 7;
/// Receive Store and Forward
pub const RXQ0_OPERATION_MODE_RSF: u32 = 1 << 5;

// =============================================================================
// RX Queue 0 Debug
// =============================================================================

/// Number of packets in the RX queue shift
pub const RXQ0_DEBUG_PRXQ_SHIFT: u32 = 16;
/// Number of packets in the RX queue mask
pub const RXQ0_DEBUG_PRXQ_MASK: u32 = 0x7fff;
/// RX queue fill-level status shift
pub const RXQ0_DEBUG_RXQSTS_SHIFT: u32 = 4;
/// RX queue fill-level status mask
pub const RXQ0_DEBUG_RXQSTS_MASK: u32 = 3;

// =============================================================================
// MTL Register Block
// =============================================================================

/// Typed view of the MTL register block
pub struct MtlRegs<'a, R: RegisterAccess> {
    bus: &'a R,
}

impl<'a, R: RegisterAccess> MtlRegs<'a, R> {
    /// Create a view over `bus`
    pub const fn new(bus: &'a R) -> Self {
        Self { bus }
    }

    reg_rw!(txq0_operation_mode, set_txq0_operation_mode, MTL_TXQ0_OPERATION_MODE, "TX Queue 0 Operation Mode register");
    reg_rw!(txq0_quantum_weight, set_txq0_quantum_weight, MTL_TXQ0_QUANTUM_WEIGHT, "TX Queue 0 Quantum Weight register");
    reg_rw!(rxq0_operation_mode, set_rxq0_operation_mode, MTL_RXQ0_OPERATION_MODE, "RX Queue 0 Operation Mode register");

    reg_ro!(txq0_debug, MTL_TXQ0_DEBUG, "TX Queue 0 Debug register");
    reg_ro!(rxq0_debug, MTL_RXQ0_DEBUG, "RX Queue 0 Debug register");

    reg_bit_ops!(enable_rx_store_forward, disable_rx_store_forward, MTL_RXQ0_OPERATION_MODE, RXQ0_OPERATION_MODE_RSF, "RX store-and-forward", "Enable", "Disable");
    reg_bit_ops!(enable_hw_flow_control, disable_hw_flow_control, MTL_RXQ0_OPERATION_MODE, RXQ0_OPERATION_MODE_EHFC, "hardware flow control", "Enable", "Disable");

    /// Request a TX queue flush
    #[inline(always)]
    pub fn flush_tx_queue(&self) {
        self.bus
            .set_bits(MTL_TXQ0_OPERATION_MODE, TXQ0_OPERATION_MODE_FTQ);
    }

    /// Enable TX queue 0 in store-and-forward mode
    pub fn enable_tx_queue(&self) {
        self.bus.set_bits(
            MTL_TXQ0_OPERATION_MODE,
            TXQ0_OPERATION_MODE_TSF
                | (TXQ0_OPERATION_MODE_TXQEN_ENABLED << TXQ0_OPERATION_MODE_TXQEN_SHIFT),
        );
    }

    /// Program the TX queue size field (encoded as bytes / 256 - 1)
    pub fn set_tx_queue_size(&self, tqs: u32) {
        self.bus.clear_set_bits(
            MTL_TXQ0_OPERATION_MODE,
            TXQ0_OPERATION_MODE_TQS_MASK << TXQ0_OPERATION_MODE_TQS_SHIFT,
            (tqs & TXQ0_OPERATION_MODE_TQS_MASK) << TXQ0_OPERATION_MODE_TQS_SHIFT,
        );
    }

    /// Program the RX queue size field (encoded as bytes / 256 - 1)
    pub fn set_rx_queue_size(&self, rqs: u32) {
        self.bus.clear_set_bits(
            MTL_RXQ0_OPERATION_MODE,
            RXQ0_OPERATION_MODE_RQS_MASK << RXQ0_OPERATION_MODE_RQS_SHIFT,
            (rqs & RXQ0_OPERATION_MODE_RQS_MASK) << RXQ0_OPERATION_MODE_RQS_SHIFT,
        );
    }

    /// Program the flow-control deactivate/activate thresholds
    pub fn set_flow_thresholds(&self, rfd: u32, rfa: u32) {
        self.bus.clear_set_bits(
            MTL_RXQ0_OPERATION_MODE,
            (RXQ0_OPERATION_MODE_RFD_MASK << RXQ0_OPERATION_MODE_RFD_SHIFT)
                | (RXQ0_OPERATION_MODE_RFA_MASK << RXQ0_OPERATION_MODE_RFA_SHIFT),
            ((rfd & RXQ0_OPERATION_MODE_RFD_MASK) << RXQ0_OPERATION_MODE_RFD_SHIFT)
                | ((rfa & RXQ0_OPERATION_MODE_RFA_MASK) << RXQ0_OPERATION_MODE_RFA_SHIFT),
        );
    }

    /// TX queue has drained: read controller idle and queue empty
    pub fn tx_queue_drained(&self) -> bool {
        let val = self.txq0_debug();
        let trcsts = field_get(val, TXQ0_DEBUG_TRCSTS_MASK, TXQ0_DEBUG_TRCSTS_SHIFT);
        trcsts != TXQ0_DEBUG_TRCSTS_READING && val & TXQ0_DEBUG_TXQSTS == 0
    }

    /// RX queue has drained: no packets and fill level empty
    pub fn rx_queue_drained(&self) -> bool {
        let val = self.rxq0_debug();
        field_get(val, RXQ0_DEBUG_PRXQ_MASK, RXQ0_DEBUG_PRXQ_SHIFT) == 0
            && field_get(val, RXQ0_DEBUG_RXQSTS_MASK, RXQ0_DEBUG_RXQSTS_SHIFT) == 0
    }
}
