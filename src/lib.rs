//! Synopsys DesignWare Ethernet QoS (EQoS) Driver Core
//!
//! A `no_std` driver for the data plane of the DesignWare EQoS MAC as
//! integrated in SoCs such as the NVIDIA Tegra186: descriptor rings, cache
//! coherency, the MDIO client, link adaptation and the controller
//! lifecycle. Everything SoC-specific (resets, clocks, pad calibration,
//! cache maintenance) sits behind the [`Platform`] trait.
//!
//! # Architecture
//!
//! The driver is organized into four layers:
//!
//! 1. **Controller** ([`driver::eqos`]): probe/start/stop, TX and zero-copy RX
//! 2. **Link** ([`driver::link`]): MAC reprogramming after PHY negotiation
//! 3. **PHY Layer** ([`phy`]): generic clause 22 PHY and fixed links
//! 4. **HAL Layer** ([`hal`]): cache maintenance, MDIO, platform glue
//!
//! ## Operating Model
//!
//! - Polled, single-context: no interrupts, every wait is bounded
//! - One TX and one RX DMA channel
//! - Descriptors are handed between CPU and DMA with explicit cache
//!   flush/invalidate; rings whose descriptors share a cache line are
//!   recycled a whole line at a time
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting and log output
//! - `smoltcp`: Enable smoltcp network stack integration
//! - `critical-section`: Enable the ISR-safe [`SharedEqos`] wrapper
//!
//! # Example
//!
//! ```ignore
//! use dwc_eqos::{Eqos, EqosConfig, GenericPhy, Mmio};
//!
//! // SAFETY: EQOS_BASE is the controller's register block
//! let regs = unsafe { Mmio::new(EQOS_BASE) };
//! let config = EqosConfig::tegra186()
//!     .with_descriptors(4, 8)
//!     .with_mac_address([0x02, 0x00, 0x00, 0x12, 0x34, 0x56]);
//!
//! let mut eqos = Eqos::probe(regs, MyPlatform::new(), delay, config)?;
//! let mut phy = GenericPhy::scan();
//! eqos.start(&mut phy)?;
//!
//! eqos.send(&frame)?;
//! while let Some(rx) = eqos.poll_receive() {
//!     process(eqos.frame_data(&rx));
//!     eqos.release(rx)?;
//! }
//!
//! eqos.shutdown_phy(&mut phy)?;
//! eqos.remove()?;
//! ```
//!
//! # Memory Requirements
//!
//! Rings and buffers come from the global allocator (or a caller-supplied
//! [`DmaAllocator`]), each aligned to the cache line:
//! - descriptors: `count * stride` bytes per ring
//! - one TX scratch buffer plus one RX buffer per RX descriptor, each the
//!   maximum frame size rounded up to a cache line

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels, mirrored by the [lints] table in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

extern crate alloc;

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;
pub mod phy;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "smoltcp")]
#[cfg_attr(docsrs, doc(cfg(feature = "smoltcp")))]
pub mod integration;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{
    AxiBusWidth, Duplex, EqosConfig, MdcClockRange, RxQueueMode, Speed, State,
};
pub use driver::eqos::Eqos;
pub use driver::error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, PlatformError,
    PlatformResult, Result,
};
pub use driver::link::{FlowControlThresholds, LinkState};

pub use hal::cache::{CacheMaintenance, CacheRange, HardwareCoherent};
pub use hal::mdio::{MdioBus, MdioController};
pub use hal::platform::Platform;

pub use internal::dma::{DmaAllocator, DmaRegion, GlobalDmaAllocator, ReceivedFrame, RingGeometry};
pub use internal::register::{Mmio, RegisterAccess};

// Re-export PHY types
pub use phy::{FixedLink, GenericPhy, LinkStatus, PhyDriver};

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::SharedEqos;

/// Low-level register accessors for advanced use.
///
/// These are intentionally separated from the primary facade. Most users should
/// prefer the driver APIs instead of touching registers directly.
///
/// # Safety
///
/// Direct register access bypasses driver invariants. Use only if you fully
/// understand the EQoS hardware and accept responsibility for correct
/// sequencing, and only while the controller is out of reset.
pub mod unsafe_registers {
    pub use crate::internal::register::dma::DmaRegs;
    pub use crate::internal::register::mac::MacRegs;
    pub use crate::internal::register::mtl::MtlRegs;
}

/// Shared driver constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on driver types and integration points.
pub mod constants {
    pub use crate::internal::constants::{
        // Frame/buffer sizes
        DEFAULT_MAX_FRAME_SIZE,
        DESCRIPTOR_SIZE,
        // MAC address
        DEFAULT_MAC_ADDR,
        MAC_ADDR_LEN,
        MTU,
        // Ring geometry
        DEFAULT_CACHELINE_SIZE,
        DEFAULT_RX_DESCRIPTORS,
        DEFAULT_TX_DESCRIPTORS,
        DESCRIPTOR_SKIP_MAX,
        // Timing
        DRAIN_TIMEOUT_US,
        MDIO_TIMEOUT_US,
        SOFT_RESET_TIMEOUT_MS,
        TX_TIMEOUT_US,
        // Clocks
        TX_CLK_10M_HZ,
        TX_CLK_100M_HZ,
        TX_CLK_1000M_HZ,
    };
}
