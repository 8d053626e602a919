//! Hardware Abstraction Layer
//!
//! The seams between the driver core and the SoC it runs on.
//!
//! # Modules
//!
//! - [`cache`]: Cache maintenance and cache-line aware ranges
//! - [`mdio`]: MDIO bus for PHY communication (clause 22 and 45)
//! - [`platform`]: Resets, clocks, pad calibration and stored MAC address
//! - [`poll`]: Bounded polling on top of a delay provider
//!
//! # Delay Integration
//!
//! Every bounded wait uses `embedded_hal::delay::DelayNs` directly. Pass any
//! delay implementation from your HAL.

pub mod cache;
pub mod mdio;
pub mod platform;
pub mod poll;

// Re-export commonly used types
pub use cache::{CacheMaintenance, CacheRange, Coherency, HardwareCoherent};
pub use mdio::{MdioBus, MdioController};
pub use platform::Platform;
pub use poll::PollBudget;
