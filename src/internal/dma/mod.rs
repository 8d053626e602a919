//! DMA rings
//!
//! This module owns all memory shared with the EQoS DMA: the TX and RX
//! descriptor rings, the TX scratch buffer and the RX buffer slots.
//!
//! # Architecture
//!
//! - [`RingGeometry`]: descriptor stride and cache-line sharing
//! - [`DescriptorRing`]: index-addressed arena of descriptors
//! - [`TxEngine`] / [`RxEngine`]: the send and receive paths
//! - [`Rings`]: allocates everything above in one go

pub mod alloc;
pub mod descriptor;
pub mod ring;
pub mod rx;
pub mod tx;

pub use self::alloc::{DmaAllocator, DmaRegion, GlobalDmaAllocator, RingGeometry};
pub use descriptor::Descriptor;
pub use ring::DescriptorRing;
pub use rx::{ReceivedFrame, RxEngine};
pub use tx::TxEngine;

use crate::driver::config::EqosConfig;
use crate::driver::error::DmaResult;
use crate::hal::cache::Coherency;
use self::alloc::allocate_region;

/// Both rings and their buffers
pub struct Rings {
    /// Descriptor spacing shared by both rings
    pub geometry: RingGeometry,
    /// Transmit side
    pub tx: TxEngine,
    /// Receive side
    pub rx: RxEngine,
}

impl Rings {
    /// Descriptor geometry implied by `config`
    pub const fn geometry(config: &EqosConfig) -> RingGeometry {
        RingGeometry::compute(
            config.descriptor_size,
            config.cacheline_size,
            config.axi_bus_width.bytes(),
            config.descriptor_skip_limit,
        )
    }

    /// Allocate descriptor rings and buffers for `config`
    ///
    /// Every allocation is owned by the returned value; when one fails the
    /// earlier ones are dropped before the error is returned.
    pub fn allocate<A: DmaAllocator + ?Sized>(
        allocator: &mut A,
        config: &EqosConfig,
    ) -> DmaResult<Self> {
        let geometry = Self::geometry(config);
        let line = config.cacheline_size;
        let frame_stride = config.frame_stride();

        let tx_descs = allocate_region(allocator, geometry.ring_bytes(config.tx_descriptors), line)?;
        let rx_descs = allocate_region(allocator, geometry.ring_bytes(config.rx_descriptors), line)?;
        let tx_buf = allocate_region(allocator, frame_stride, line)?;
        let rx_bufs = allocate_region(allocator, frame_stride * config.rx_descriptors, line)?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "rings: stride {} ({} per line), frame stride {}",
            geometry.stride,
            geometry.per_cacheline,
            frame_stride
        );

        let coherency = Coherency::new(line, config.descriptor_size);
        let tx = TxEngine::new(
            DescriptorRing::new(tx_descs, config.tx_descriptors, &geometry),
            tx_buf,
            coherency,
            config.max_frame_size,
        );
        let rx = RxEngine::new(
            DescriptorRing::new(rx_descs, config.rx_descriptors, &geometry),
            rx_bufs,
            coherency,
            frame_stride,
            geometry.per_cacheline,
            config.descriptor_size,
        );

        Ok(Self { geometry, tx, rx })
    }
}
