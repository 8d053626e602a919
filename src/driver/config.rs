//! Driver configuration types.
//!
//! [`EqosConfig`] collects the per-platform parameters the core needs:
//! ring geometry, bus width, MDIO timing and the timeout budgets used by
//! every bounded wait. Start from [`EqosConfig::new`] (or a preset such as
//! [`EqosConfig::tegra186`]) and adjust with the `with_*` builders.

use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_CACHELINE_SIZE, DEFAULT_MAC_ADDR, DEFAULT_MAX_FRAME_SIZE, DEFAULT_RX_DESCRIPTORS,
    DEFAULT_TX_DESCRIPTORS, DESCRIPTOR_SIZE, DESCRIPTOR_SKIP_MAX, DRAIN_TIMEOUT_US,
    MDIO_SETTLE_US, MDIO_TIMEOUT_US, SOFT_RESET_TIMEOUT_MS, TX_CLK_10M_HZ, TX_CLK_100M_HZ,
    TX_CLK_1000M_HZ, TX_TIMEOUT_US,
};
use crate::internal::register::dma::RX_CONTROL_RBSZ_MASK;

// =============================================================================
// Link Parameters
// =============================================================================

/// Ethernet link speed supported by the MAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    /// 10 Mbps
    Mbps10,
    /// 100 Mbps
    Mbps100,
    /// 1000 Mbps
    Mbps1000,
}

impl Speed {
    /// Map a PHY-reported speed in Mb/s onto a MAC speed
    pub const fn from_mbps(mbps: u32) -> ConfigResult<Self> {
        match mbps {
            10 => Ok(Speed::Mbps10),
            100 => Ok(Speed::Mbps100),
            1000 => Ok(Speed::Mbps1000),
            _ => Err(ConfigError::InvalidSpeed),
        }
    }

    /// Speed in Mb/s
    pub const fn mbps(self) -> u32 {
        match self {
            Speed::Mbps10 => 10,
            Speed::Mbps100 => 100,
            Speed::Mbps1000 => 1000,
        }
    }

    /// Canonical transmit clock rate for this speed
    pub const fn tx_clock_hz(self) -> u64 {
        match self {
            Speed::Mbps10 => TX_CLK_10M_HZ,
            Speed::Mbps100 => TX_CLK_100M_HZ,
            Speed::Mbps1000 => TX_CLK_1000M_HZ,
        }
    }

    /// Pad calibration is unreliable below 100 Mb/s
    pub const fn wants_calibration(self) -> bool {
        !matches!(self, Speed::Mbps10)
    }
}

/// Ethernet duplex mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Duplex {
    /// Half duplex
    Half,
    /// Full duplex
    #[default]
    Full,
}

// =============================================================================
// Bus and Queue Parameters
// =============================================================================

/// Width of the AXI system bus the DMA masters on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxiBusWidth {
    /// 32-bit bus
    Bits32,
    /// 64-bit bus
    Bits64,
    /// 128-bit bus
    #[default]
    Bits128,
}

impl AxiBusWidth {
    /// Bus width in bytes (the unit of the descriptor-skip field)
    pub const fn bytes(self) -> usize {
        match self {
            AxiBusWidth::Bits32 => 4,
            AxiBusWidth::Bits64 => 8,
            AxiBusWidth::Bits128 => 16,
        }
    }
}

/// MDC clock range (CSR clock to MDC divider selection)
///
/// The discriminant is the value of the MDIO address register CR field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MdcClockRange {
    /// CSR clock 60-100 MHz, MDC = CSR/42
    Csr60To100 = 0,
    /// CSR clock 100-150 MHz, MDC = CSR/62
    Csr100To150 = 1,
    /// CSR clock 20-35 MHz, MDC = CSR/16
    #[default]
    Csr20To35 = 2,
    /// CSR clock 35-60 MHz, MDC = CSR/26
    Csr35To60 = 3,
    /// CSR clock 150-250 MHz, MDC = CSR/102
    Csr150To250 = 4,
    /// CSR clock 250-300 MHz, MDC = CSR/124
    Csr250To300 = 5,
    /// CSR clock 300-500 MHz, MDC = CSR/204
    Csr300To500 = 6,
    /// CSR clock 500-800 MHz, MDC = CSR/324
    Csr500To800 = 7,
}

impl MdcClockRange {
    /// Raw CR field value
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// How RX queue 0 is enabled in MAC_RXQ_CTRL0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RxQueueMode {
    /// Enabled for AV traffic
    Av = 1,
    /// Enabled for DCB/generic traffic
    #[default]
    Dcb = 2,
}

impl RxQueueMode {
    /// Raw RXQ0EN field value
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

// =============================================================================
// Driver Configuration
// =============================================================================

/// Complete driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EqosConfig {
    /// Number of TX descriptors
    pub tx_descriptors: usize,
    /// Number of RX descriptors (and RX buffers)
    pub rx_descriptors: usize,
    /// CPU cache line size, also the DMA buffer alignment
    pub cacheline_size: usize,
    /// Logical size of one descriptor
    pub descriptor_size: usize,
    /// Largest descriptor-skip value the ring layout may use
    pub descriptor_skip_limit: u32,
    /// AXI bus width
    pub axi_bus_width: AxiBusWidth,
    /// Maximum frame size before cache-line rounding
    pub max_frame_size: usize,
    /// MDC clock range
    pub mdc_clock_range: MdcClockRange,
    /// Delay between issuing an MDIO command and polling for completion
    pub mdio_settle_us: u32,
    /// MDIO busy timeout
    pub mdio_timeout_us: u32,
    /// DMA software reset timeout
    pub soft_reset_timeout_ms: u32,
    /// TX completion budget per `send`
    pub tx_timeout_us: u32,
    /// Budget for each MTL queue drain during `stop`
    pub drain_timeout_us: u32,
    /// RX queue 0 enable mode
    pub rx_queue_mode: RxQueueMode,
    /// Receive all frames regardless of destination
    pub promiscuous: bool,
    /// TX FIFO size override in bytes (None = read from HW_FEATURE1)
    pub tx_fifo_size: Option<u32>,
    /// RX FIFO size override in bytes (None = read from HW_FEATURE1)
    pub rx_fifo_size: Option<u32>,
    /// Highest speed the PHY may advertise
    pub max_speed: Option<Speed>,
    /// Registers may be accessed while the controller is stopped
    pub reg_access_always_ok: bool,
    /// Station MAC address
    pub mac_address: [u8; 6],
}

impl Default for EqosConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EqosConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tx_descriptors: DEFAULT_TX_DESCRIPTORS,
            rx_descriptors: DEFAULT_RX_DESCRIPTORS,
            cacheline_size: DEFAULT_CACHELINE_SIZE,
            descriptor_size: DESCRIPTOR_SIZE,
            descriptor_skip_limit: DESCRIPTOR_SKIP_MAX,
            axi_bus_width: AxiBusWidth::Bits128,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            mdc_clock_range: MdcClockRange::Csr20To35,
            mdio_settle_us: MDIO_SETTLE_US,
            mdio_timeout_us: MDIO_TIMEOUT_US,
            soft_reset_timeout_ms: SOFT_RESET_TIMEOUT_MS,
            tx_timeout_us: TX_TIMEOUT_US,
            drain_timeout_us: DRAIN_TIMEOUT_US,
            rx_queue_mode: RxQueueMode::Dcb,
            promiscuous: true,
            tx_fifo_size: None,
            rx_fifo_size: None,
            max_speed: None,
            reg_access_always_ok: false,
            mac_address: DEFAULT_MAC_ADDR,
        }
    }

    /// NVIDIA Tegra186 integration
    #[must_use]
    pub const fn tegra186() -> Self {
        Self::new()
            .with_axi_bus_width(AxiBusWidth::Bits128)
            .with_rx_queue_mode(RxQueueMode::Dcb)
            .with_mdc_clock_range(MdcClockRange::Csr20To35)
            .with_mdio_settle_us(10)
            .with_soft_reset_timeout_ms(10)
    }

    /// Set the TX and RX ring depths
    #[must_use]
    pub const fn with_descriptors(mut self, tx: usize, rx: usize) -> Self {
        self.tx_descriptors = tx;
        self.rx_descriptors = rx;
        self
    }

    /// Set the cache line size
    #[must_use]
    pub const fn with_cacheline_size(mut self, size: usize) -> Self {
        self.cacheline_size = size;
        self
    }

    /// Set the largest descriptor-skip value
    #[must_use]
    pub const fn with_descriptor_skip_limit(mut self, limit: u32) -> Self {
        self.descriptor_skip_limit = limit;
        self
    }

    /// Set the AXI bus width
    #[must_use]
    pub const fn with_axi_bus_width(mut self, width: AxiBusWidth) -> Self {
        self.axi_bus_width = width;
        self
    }

    /// Override the maximum frame size
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set the MDC clock range
    #[must_use]
    pub const fn with_mdc_clock_range(mut self, range: MdcClockRange) -> Self {
        self.mdc_clock_range = range;
        self
    }

    /// Set the MDIO settle delay
    #[must_use]
    pub const fn with_mdio_settle_us(mut self, us: u32) -> Self {
        self.mdio_settle_us = us;
        self
    }

    /// Set the MDIO busy timeout
    #[must_use]
    pub const fn with_mdio_timeout_us(mut self, us: u32) -> Self {
        self.mdio_timeout_us = us;
        self
    }

    /// Set the DMA software reset timeout
    #[must_use]
    pub const fn with_soft_reset_timeout_ms(mut self, ms: u32) -> Self {
        self.soft_reset_timeout_ms = ms;
        self
    }

    /// Set the TX completion budget
    #[must_use]
    pub const fn with_tx_timeout_us(mut self, us: u32) -> Self {
        self.tx_timeout_us = us;
        self
    }

    /// Set the MTL drain budget
    #[must_use]
    pub const fn with_drain_timeout_us(mut self, us: u32) -> Self {
        self.drain_timeout_us = us;
        self
    }

    /// Set the RX queue 0 enable mode
    #[must_use]
    pub const fn with_rx_queue_mode(mut self, mode: RxQueueMode) -> Self {
        self.rx_queue_mode = mode;
        self
    }

    /// Enable or disable promiscuous reception
    #[must_use]
    pub const fn with_promiscuous(mut self, enabled: bool) -> Self {
        self.promiscuous = enabled;
        self
    }

    /// Override the MTL FIFO sizes in bytes
    #[must_use]
    pub const fn with_fifo_sizes(mut self, tx: Option<u32>, rx: Option<u32>) -> Self {
        self.tx_fifo_size = tx;
        self.rx_fifo_size = rx;
        self
    }

    /// Limit the speed the PHY advertises
    #[must_use]
    pub const fn with_max_speed(mut self, speed: Speed) -> Self {
        self.max_speed = Some(speed);
        self
    }

    /// Declare that registers stay accessible while stopped
    #[must_use]
    pub const fn with_reg_access_always_ok(mut self, ok: bool) -> Self {
        self.reg_access_always_ok = ok;
        self
    }

    /// Set the station MAC address
    #[must_use]
    pub const fn with_mac_address(mut self, mac: [u8; 6]) -> Self {
        self.mac_address = mac;
        self
    }

    /// Distance between consecutive RX buffers, a multiple of the cache line
    ///
    /// Saturates at `usize::MAX` when the rounded size does not fit (or the
    /// cache line is zero); [`validate`](Self::validate) rejects both.
    pub const fn frame_stride(&self) -> usize {
        match self.max_frame_size.checked_next_multiple_of(self.cacheline_size) {
            Some(stride) => stride,
            None => usize::MAX,
        }
    }

    /// Check that the configuration can be realised by the hardware
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cacheline_size == 0 || !self.cacheline_size.is_power_of_two() {
            return Err(ConfigError::InvalidCacheLine);
        }
        if self.tx_descriptors == 0 || self.rx_descriptors == 0 {
            return Err(ConfigError::InvalidConfig);
        }
        // Ring length registers hold count - 1 in 10 bits
        if self.tx_descriptors > 1024 || self.rx_descriptors > 1024 {
            return Err(ConfigError::InvalidConfig);
        }
        if self.descriptor_size < DESCRIPTOR_SIZE || self.descriptor_skip_limit > DESCRIPTOR_SKIP_MAX
        {
            return Err(ConfigError::InvalidConfig);
        }
        if self.max_frame_size == 0 || self.frame_stride() > RX_CONTROL_RBSZ_MASK as usize {
            return Err(ConfigError::InvalidConfig);
        }
        if self.frame_stride() % self.axi_bus_width.bytes() != 0 {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(())
    }
}

/// Controller run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Held in reset, registers must not be touched
    #[default]
    Stopped,
    /// Resets released, bring-up in progress or failed part way
    Starting,
    /// DMA and MAC running
    Running,
}

// =============================================================================
// Unit Tests
// =============================================================================
