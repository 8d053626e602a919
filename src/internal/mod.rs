//! Internal Implementation Details
//!
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`register`]: Memory-mapped register definitions and typed views
//! - [`constants`]: Timing, sizing and encoding constants
//! - [`dma`]: Descriptor rings, DMA memory and the TX/RX engines

pub(crate) mod constants;
pub(crate) mod dma;
pub(crate) mod register;
