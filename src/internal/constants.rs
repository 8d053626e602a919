//! Centralized driver constants.
//!
//! Values that define ring geometry, frame sizes and timing budgets live here
//! so the configuration defaults and the engines agree on them.

// =============================================================================
// Frame and Buffer Sizes
// =============================================================================

/// Maximum transmission unit (payload bytes)
pub const MTU: usize = 1500;

/// Default maximum frame size in bytes, before cache-line rounding
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1568;

/// Size of one hardware descriptor (four 32-bit words)
pub const DESCRIPTOR_SIZE: usize = 16;

/// Length of a MAC address
pub const MAC_ADDR_LEN: usize = 6;

/// Default station address (locally administered)
pub const DEFAULT_MAC_ADDR: [u8; MAC_ADDR_LEN] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];

// =============================================================================
// Ring Geometry
// =============================================================================

/// Default number of TX descriptors
pub const DEFAULT_TX_DESCRIPTORS: usize = 4;

/// Default number of RX descriptors
pub const DEFAULT_RX_DESCRIPTORS: usize = 4;

/// Default CPU cache line / DMA minimum alignment
pub const DEFAULT_CACHELINE_SIZE: usize = 64;

/// Largest value the descriptor-skip-length field can hold
pub const DESCRIPTOR_SKIP_MAX: u32 = 7;

// =============================================================================
// MTL / DMA Tuning
// =============================================================================

/// TX queue 0 quantum weight
pub const TX_QUANTUM_WEIGHT: u32 = 0x10;

/// Pause time sent in TX flow-control frames
pub const PAUSE_TIME_MAX: u32 = 0xffff;

/// RX programmable burst length
pub const RX_PBL: u32 = 8;

/// Upper bound for the TX programmable burst length
pub const TX_PBL_MAX: u32 = 32;

/// Granularity of the TQS/RQS queue-size fields
pub const FIFO_SIZE_UNIT: u32 = 256;

/// Base unit of the FIFO size encoding in HW_FEATURE1
pub const HW_FIFO_SIZE_BASE: u32 = 128;

/// Smallest RX FIFO that gets hardware flow control
pub const FLOW_CONTROL_MIN_FIFO: u32 = 4096;

// =============================================================================
// Timing
// =============================================================================

/// Settle time after releasing resets, before touching registers
pub const RESET_SETTLE_US: u32 = 10;

/// Default DMA software reset timeout
pub const SOFT_RESET_TIMEOUT_MS: u32 = 10;

/// Poll interval while waiting for the software reset to clear
pub const RESET_POLL_INTERVAL_US: u32 = 10;

/// Default MDIO settle delay between issuing a command and polling
pub const MDIO_SETTLE_US: u32 = 10;

/// Default MDIO busy timeout
pub const MDIO_TIMEOUT_US: u32 = 1_000_000;

/// Poll interval while waiting for MDIO idle
pub const MDIO_POLL_INTERVAL_US: u32 = 1;

/// Default TX completion budget
pub const TX_TIMEOUT_US: u32 = 1_000_000;

/// Default budget for each MTL drain during stop
pub const DRAIN_TIMEOUT_US: u32 = 1_000_000;

/// Poll interval used by TX completion and queue drains
pub const POLL_INTERVAL_US: u32 = 1;

// =============================================================================
// Clock Rates
// =============================================================================

/// TX clock for 1000 Mb/s (GMII/RGMII)
pub const TX_CLK_1000M_HZ: u64 = 125_000_000;

/// TX clock for 100 Mb/s
pub const TX_CLK_100M_HZ: u64 = 25_000_000;

/// TX clock for 10 Mb/s
pub const TX_CLK_10M_HZ: u64 = 2_500_000;
