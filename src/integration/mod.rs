//! External Stack Integrations
//!
//! - **smoltcp** (`smoltcp`): implements `smoltcp::phy::Device` for
//!   [`Eqos`](crate::Eqos) with zero-copy RX tokens. Requires the
//!   `smoltcp` feature.
//!
//! # Example
//!
//! ```ignore
//! use smoltcp::phy::Device;
//! let caps = eqos.capabilities();
//! ```

#[cfg(feature = "smoltcp")]
pub mod smoltcp;

#[cfg(feature = "smoltcp")]
pub use smoltcp::{EqosRxToken, EqosTxToken, ethernet_address};
