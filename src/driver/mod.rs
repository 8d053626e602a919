//! Core driver components for the EQoS controller.
//!
//! This module contains the building blocks for configuring and operating
//! the MAC:
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`error`] - Error types and result aliases
//! - [`eqos`] - The controller handle: lifecycle and data path
//! - [`link`] - Link adaptation and flow-control thresholds
//!
//! # Example
//!
//! ```ignore
//! use dwc_eqos::driver::{Eqos, EqosConfig, Error};
//!
//! let config = EqosConfig::tegra186()
//!     .with_mac_address([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
//! ```

// Submodules
pub mod config;
pub mod eqos;
pub mod error;
pub mod link;

// Re-exports for convenience
pub use config::{AxiBusWidth, Duplex, EqosConfig, MdcClockRange, RxQueueMode, Speed, State};
pub use eqos::Eqos;
pub use error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, PlatformError,
    PlatformResult, Result,
};
pub use link::{FlowControlThresholds, LinkState, adapt_link, flow_control_thresholds};
