//! EQoS controller handle.
//!
//! This module contains the main [`Eqos`] structure and its lifecycle:
//!
//! - Probe (configuration checks, ring allocation, clocks) and remove
//! - Start (reset, PHY bring-up, MTL/MAC/DMA programming) and stop
//! - Frame transmission and zero-copy reception
//! - Station address and MDIO access
//!
//! Link adaptation lives in the [`link`](super::link) module.

use embedded_hal::delay::DelayNs;

use super::config::{EqosConfig, State};
use super::error::{ConfigError, IoError, PlatformError, Result};
use super::link::{LinkState, adapt_link, flow_control_thresholds, queue_size_field};
use crate::hal::mdio::MdioController;
use crate::hal::platform::Platform;
use crate::hal::poll::PollBudget;
use crate::internal::constants::{
    HW_FIFO_SIZE_BASE, PAUSE_TIME_MAX, POLL_INTERVAL_US, RESET_POLL_INTERVAL_US, RESET_SETTLE_US,
    RX_PBL, TX_PBL_MAX, TX_QUANTUM_WEIGHT,
};
use crate::internal::dma::{DmaAllocator, GlobalDmaAllocator, ReceivedFrame, RingGeometry, Rings};
use crate::internal::register::RegisterAccess;
use crate::internal::register::dma::{
    DmaRegs, SYSBUS_MODE_BLEN4, SYSBUS_MODE_BLEN8, SYSBUS_MODE_BLEN16, SYSBUS_MODE_EAME,
    SYSBUS_MODE_RD_OSR_LMT_SHIFT,
};
use crate::internal::register::mac::{
    CONFIGURATION_ACS, CONFIGURATION_CST, CONFIGURATION_GPSLCE, CONFIGURATION_JD,
    CONFIGURATION_JE, CONFIGURATION_WD, HW_FEATURE1_RXFIFOSIZE_MASK, HW_FEATURE1_RXFIFOSIZE_SHIFT,
    HW_FEATURE1_TXFIFOSIZE_MASK, HW_FEATURE1_TXFIFOSIZE_SHIFT, MAC_CONFIGURATION,
    MAC_Q0_TX_FLOW_CTRL, MAC_RXQ_CTRL0, MacRegs, Q0_TX_FLOW_CTRL_PT_SHIFT,
    RXQ_CTRL0_RXQ0EN_MASK, RXQ_CTRL0_RXQ0EN_SHIFT,
};
use crate::internal::register::mtl::MtlRegs;
use crate::internal::register::field_get;
use crate::phy::{LinkStatus, PhyDriver};

// =============================================================================
// EQoS Driver
// =============================================================================

/// EQoS controller handle
///
/// Owns the register window, the platform glue, the delay provider and
/// all DMA memory. Every operation runs in the caller's context; the
/// handle is the single point of access to the hardware.
///
/// # Type Parameters
/// * `R` - Register window ([`Mmio`](crate::Mmio) on target)
/// * `P` - SoC glue implementing [`Platform`]
/// * `D` - Delay provider used by every bounded wait
///
/// # Example
/// ```ignore
/// let config = EqosConfig::tegra186().with_descriptors(4, 8);
/// let mut eqos = Eqos::probe(regs, platform, delay, config)?;
/// let mut phy = GenericPhy::scan();
/// eqos.start(&mut phy)?;
///
/// eqos.send(&frame)?;
/// if let Some(rx) = eqos.poll_receive() {
///     handle(eqos.frame_data(&rx));
///     eqos.release(rx)?;
/// }
/// ```
pub struct Eqos<R: RegisterAccess, P: Platform, D: DelayNs> {
    pub(crate) regs: R,
    pub(crate) platform: P,
    pub(crate) delay: D,
    pub(crate) config: EqosConfig,
    pub(crate) rings: Rings,
    pub(crate) state: State,
    pub(crate) link: LinkState,
    pub(crate) mac_address: [u8; 6],
}

impl<R, P, D> Eqos<R, P, D>
where
    R: RegisterAccess,
    P: Platform,
    D: DelayNs,
{
    // =========================================================================
    // Probe / Remove
    // =========================================================================

    /// Probe the controller with rings from the global allocator
    pub fn probe(regs: R, platform: P, delay: D, config: EqosConfig) -> Result<Self> {
        Self::probe_with_allocator(regs, platform, delay, config, &mut GlobalDmaAllocator)
    }

    /// Probe the controller with rings from `allocator`
    ///
    /// Validates `config`, allocates every ring and buffer, then enables
    /// the controller clocks. On error nothing stays allocated.
    pub fn probe_with_allocator<A: DmaAllocator + ?Sized>(
        regs: R,
        mut platform: P,
        delay: D,
        config: EqosConfig,
        allocator: &mut A,
    ) -> Result<Self> {
        config.validate()?;

        let geometry = Rings::geometry(&config);
        if !geometry.is_addressable(config.axi_bus_width.bytes(), config.descriptor_skip_limit) {
            return Err(ConfigError::InvalidConfig.into());
        }
        // RX slots are recycled a whole cache line at a time
        if config.rx_descriptors % geometry.per_cacheline != 0 {
            return Err(ConfigError::InvalidConfig.into());
        }

        let rings = Rings::allocate(allocator, &config)?;
        platform.start_clocks()?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "EQoS probed: {} TX / {} RX descriptors, stride {}",
            config.tx_descriptors,
            config.rx_descriptors,
            geometry.stride
        );

        Ok(Self {
            regs,
            platform,
            delay,
            mac_address: config.mac_address,
            config,
            rings,
            state: State::Stopped,
            link: LinkState::Down,
        })
    }

    /// Stop the controller, gate its clocks and free the rings
    pub fn remove(mut self) -> Result<()> {
        let stopped = self.stop();
        let clocks = self.platform.stop_clocks();
        stopped?;
        clocks?;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current run state
    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    /// Current link adaptation state
    #[inline(always)]
    pub fn link_state(&self) -> LinkState {
        self.link
    }

    /// Station address
    #[inline(always)]
    pub fn mac_address(&self) -> &[u8; 6] {
        &self.mac_address
    }

    /// Active configuration
    pub fn config(&self) -> &EqosConfig {
        &self.config
    }

    /// Descriptor ring layout
    pub fn geometry(&self) -> RingGeometry {
        self.rings.geometry
    }

    /// Platform glue
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Platform glue, mutably
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Register window
    pub fn regs(&self) -> &R {
        &self.regs
    }

    /// Registers may be touched in the current state
    fn reg_access_ok(&self) -> bool {
        self.config.reg_access_always_ok || self.state != State::Stopped
    }

    // =========================================================================
    // Start / Stop
    // =========================================================================

    /// Bring the controller up
    ///
    /// Releases the resets, soft-resets the DMA, starts the PHY, adapts
    /// the MAC to the link and programs MTL, MAC and DMA before enabling
    /// both directions. Calling `start` while running does nothing.
    ///
    /// # Errors
    /// Any failure after the resets were released leaves the handle in
    /// [`State::Starting`]; call [`stop`](Self::stop) to put the
    /// controller back into reset before retrying.
    pub fn start<Y: PhyDriver>(&mut self, phy: &mut Y) -> Result<()> {
        match self.state {
            State::Running => return Ok(()),
            State::Starting => return Err(IoError::InvalidState.into()),
            State::Stopped => {}
        }

        self.rings.tx.reset_cursor();
        self.rings.rx.reset_cursor();

        self.platform.start_resets()?;
        self.delay.delay_us(RESET_SETTLE_US);
        self.state = State::Starting;

        if let Err(err) = self.bring_up(phy) {
            #[cfg(feature = "defmt")]
            defmt::warn!("EQoS start failed: {}", err);
            return Err(err);
        }

        self.state = State::Running;
        #[cfg(feature = "defmt")]
        defmt::info!("EQoS started");
        Ok(())
    }

    fn bring_up<Y: PhyDriver>(&mut self, phy: &mut Y) -> Result<()> {
        self.soft_reset()?;

        self.platform.calibrate_pads()?;
        if let Some(rate) = self.platform.tick_clock_rate() {
            let tics = (rate / 1_000_000).saturating_sub(1) as u32;
            MacRegs::new(&self.regs).set_us_tic_counter(tics);
        }

        if let Some(speed) = self.config.max_speed {
            phy.set_max_speed(speed);
        }
        let status = {
            let mut mdio = MdioController::from_config(&self.regs, &mut self.delay, &self.config);
            phy.startup(&mut mdio)
        };

        if let Err(err) = status.and_then(|status| self.configure(&status)) {
            // Best effort: the PHY error, if any, is less useful than `err`
            let mut mdio = MdioController::from_config(&self.regs, &mut self.delay, &self.config);
            let _ = phy.shutdown(&mut mdio);
            return Err(err);
        }
        Ok(())
    }

    /// Everything after the PHY reported its link
    fn configure(&mut self, status: &LinkStatus) -> Result<()> {
        if !status.link_up {
            self.link = LinkState::Down;
            #[cfg(feature = "defmt")]
            defmt::warn!("no link");
            return Err(IoError::NoLink.into());
        }

        self.link = LinkState::Negotiating;
        let (speed, duplex) = adapt_link(&self.regs, &mut self.platform, status)?;
        self.link = LinkState::Configured { speed, duplex };

        let tqs = self.configure_mtl();
        self.configure_mac();
        self.configure_dma(tqs);
        self.enable_rings();
        Ok(())
    }

    /// Assert the DMA software reset and wait for it to self-clear
    fn soft_reset(&mut self) -> Result<()> {
        let dma = DmaRegs::new(&self.regs);
        dma.assert_soft_reset();
        self.platform.fix_soc_reset();

        let budget = PollBudget::from_ms(self.config.soft_reset_timeout_ms, RESET_POLL_INTERVAL_US);
        if budget.wait(&mut self.delay, || !dma.soft_reset_pending()) {
            Ok(())
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("DMA software reset stuck");
            Err(IoError::ResetTimeout.into())
        }
    }

    /// Program queue 0 and return the encoded TX queue size
    fn configure_mtl(&self) -> u32 {
        let mac = MacRegs::new(&self.regs);
        let mtl = MtlRegs::new(&self.regs);

        mtl.enable_tx_queue();
        mtl.set_txq0_quantum_weight(TX_QUANTUM_WEIGHT);
        mtl.enable_rx_store_forward();

        // HW_FEATURE1 encodes each FIFO as log2(bytes / 128)
        let feature = mac.hw_feature1();
        let hw_tx = HW_FIFO_SIZE_BASE
            << field_get(feature, HW_FEATURE1_TXFIFOSIZE_MASK, HW_FEATURE1_TXFIFOSIZE_SHIFT);
        let hw_rx = HW_FIFO_SIZE_BASE
            << field_get(feature, HW_FEATURE1_RXFIFOSIZE_MASK, HW_FEATURE1_RXFIFOSIZE_SHIFT);
        let tx_fifo = self.config.tx_fifo_size.unwrap_or(hw_tx);
        let rx_fifo = self.config.rx_fifo_size.unwrap_or(hw_rx);

        let tqs = queue_size_field(tx_fifo);
        mtl.set_tx_queue_size(tqs);
        mtl.set_rx_queue_size(queue_size_field(rx_fifo));

        let flow = flow_control_thresholds(rx_fifo);
        if flow.enabled {
            mtl.enable_hw_flow_control();
            mtl.set_flow_thresholds(flow.rfd, flow.rfa);
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("MTL: TX FIFO {} RX FIFO {} flow {}", tx_fifo, rx_fifo, flow);
        tqs
    }

    fn configure_mac(&self) {
        let mac = MacRegs::new(&self.regs);

        self.regs.clear_set_bits(
            MAC_RXQ_CTRL0,
            RXQ_CTRL0_RXQ0EN_MASK << RXQ_CTRL0_RXQ0EN_SHIFT,
            self.config.rx_queue_mode.bits() << RXQ_CTRL0_RXQ0EN_SHIFT,
        );
        mac.enable_mc_bc_queue();
        if self.config.promiscuous {
            mac.enable_promiscuous();
        }

        self.regs
            .set_bits(MAC_Q0_TX_FLOW_CTRL, PAUSE_TIME_MAX << Q0_TX_FLOW_CTRL_PT_SHIFT);
        mac.clear_queue_priorities();
        mac.enable_tx_flow_control();
        mac.enable_rx_flow_control();

        self.regs.clear_set_bits(
            MAC_CONFIGURATION,
            CONFIGURATION_GPSLCE | CONFIGURATION_WD | CONFIGURATION_JD | CONFIGURATION_JE,
            CONFIGURATION_CST | CONFIGURATION_ACS,
        );

        mac.set_station_address(&self.mac_address);
    }

    fn configure_dma(&self, tqs: u32) {
        let dma = DmaRegs::new(&self.regs);

        dma.enable_osp();
        dma.set_rx_buffer_size(self.rings.rx.frame_stride() as u32);
        dma.set_pblx8_and_skip(self.rings.geometry.skip_length);

        // Bursts must stay below half the TX FIFO
        dma.set_tx_pbl((tqs + 1).min(TX_PBL_MAX));
        dma.set_rx_pbl(RX_PBL);

        dma.set_sysbus_mode(
            (2 << SYSBUS_MODE_RD_OSR_LMT_SHIFT)
                | SYSBUS_MODE_EAME
                | SYSBUS_MODE_BLEN16
                | SYSBUS_MODE_BLEN8
                | SYSBUS_MODE_BLEN4,
        );
    }

    /// Initialise both rings, hand them to the DMA and enable traffic
    fn enable_rings(&mut self) {
        self.rings.tx.init(&mut self.platform);
        self.rings.rx.init(&mut self.platform);

        let dma = DmaRegs::new(&self.regs);
        dma.set_tx_ring(self.rings.tx.ring().base_addr(), self.rings.tx.ring().len());
        dma.set_rx_ring(self.rings.rx.ring().base_addr(), self.rings.rx.ring().len());

        dma.start_tx();
        dma.start_rx();
        MacRegs::new(&self.regs).enable_tx_rx();

        // The TX tail moves on the first send. The RX tail points at the
        // last descriptor: "first" would read as an empty ring.
        dma.set_rxdesc_tail_pointer(self.rings.rx.ring().last_addr() as u32);
    }

    /// Stop traffic and put the controller back into reset
    ///
    /// Waits for the MTL TX and RX queues to drain. A drain that runs out of
    /// budget is reported after the teardown has completed. Stopping a
    /// stopped controller does nothing.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            State::Stopped => return Ok(()),
            State::Starting => {
                // Failed start: nothing is running, just reassert resets
                self.state = State::Stopped;
                self.link = LinkState::Down;
                self.platform.stop_resets()?;
                return Ok(());
            }
            State::Running => {}
        }

        self.state = State::Stopped;
        self.link = LinkState::Down;

        let dma = DmaRegs::new(&self.regs);
        let mac = MacRegs::new(&self.regs);
        let mtl = MtlRegs::new(&self.regs);
        let budget = PollBudget::new(self.config.drain_timeout_us, POLL_INTERVAL_US);

        dma.stop_tx();
        let tx_drained = budget.wait(&mut self.delay, || mtl.tx_queue_drained());

        mac.disable_tx_rx();
        let rx_drained = budget.wait(&mut self.delay, || mtl.rx_queue_drained());

        dma.stop_rx();
        let resets = self.platform.stop_resets();

        #[cfg(feature = "defmt")]
        defmt::info!("EQoS stopped (TX drained {}, RX drained {})", tx_drained, rx_drained);

        if !tx_drained {
            return Err(IoError::TxDrainTimeout.into());
        }
        if !rx_drained {
            return Err(IoError::RxDrainTimeout.into());
        }
        resets?;
        Ok(())
    }

    // =========================================================================
    // TX / RX Operations
    // =========================================================================

    /// Transmit one frame and wait for the DMA to finish with it
    ///
    /// # Errors
    /// - `InvalidState` - controller not running
    /// - `InvalidLength` / `FrameTooLarge` - bad frame length
    /// - `DescriptorBusy` - an earlier timed-out frame still owns the slot
    /// - `TxTimeout` - the DMA did not complete within the budget
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.state != State::Running {
            return Err(IoError::InvalidState.into());
        }
        let budget = PollBudget::new(self.config.tx_timeout_us, POLL_INTERVAL_US);
        self.rings
            .tx
            .send(&self.regs, &mut self.platform, &mut self.delay, budget, data)
    }

    /// Take the next received frame, if any
    ///
    /// Never waits. The frame stays in its DMA buffer until it is handed
    /// back with [`release`](Self::release).
    pub fn poll_receive(&mut self) -> Option<ReceivedFrame> {
        if self.state != State::Running {
            return None;
        }
        self.rings.rx.poll(&mut self.platform)
    }

    /// Payload of a received frame
    pub fn frame_data(&self, frame: &ReceivedFrame) -> &[u8] {
        self.rings.rx.frame_data(frame)
    }

    /// Hand a received frame's buffer back
    ///
    /// Frames must be released in the order they were received. A token for
    /// a slot that has already been released (a duplicate from polling
    /// twice, or one from before a restart) fails with `UnexpectedBuffer`
    /// and leaves the ring untouched.
    pub fn release(&mut self, frame: ReceivedFrame) -> Result<()> {
        let rearm = self.state == State::Running;
        self.rings
            .rx
            .release(&self.regs, &mut self.platform, frame, rearm)?;
        Ok(())
    }

    // =========================================================================
    // Station Address
    // =========================================================================

    /// Set the station address
    ///
    /// The address is always remembered and programmed on the next start;
    /// it reaches the registers now only if they are accessible.
    pub fn set_mac_address(&mut self, mac: [u8; 6]) -> Result<()> {
        if !is_valid_mac(&mac) {
            return Err(ConfigError::InvalidMacAddress.into());
        }
        self.mac_address = mac;
        if self.reg_access_ok() {
            MacRegs::new(&self.regs).set_station_address(&mac);
        }
        Ok(())
    }

    /// Adopt the address stored by the platform
    pub fn read_rom_mac_address(&mut self) -> Result<[u8; 6]> {
        let Some(mac) = self.platform.mac_address()? else {
            return Err(PlatformError::Unsupported.into());
        };
        if !is_valid_mac(&mac) {
            #[cfg(feature = "defmt")]
            defmt::warn!("platform MAC address invalid");
            return Err(ConfigError::InvalidMacAddress.into());
        }
        self.mac_address = mac;
        Ok(mac)
    }

    // =========================================================================
    // MDIO / PHY Access
    // =========================================================================

    /// MDIO client over this controller's management interface
    pub fn mdio(&mut self) -> Result<MdioController<'_, R, D>> {
        if self.state == State::Stopped {
            return Err(IoError::InvalidState.into());
        }
        Ok(MdioController::from_config(&self.regs, &mut self.delay, &self.config))
    }

    /// Power the PHY down; must happen before [`stop`](Self::stop)
    pub fn shutdown_phy<Y: PhyDriver>(&mut self, phy: &mut Y) -> Result<()> {
        let mut mdio = self.mdio()?;
        phy.shutdown(&mut mdio)
    }
}

/// Unicast and not all zeros
const fn is_valid_mac(mac: &[u8; 6]) -> bool {
    let zero = mac[0] == 0 && mac[1] == 0 && mac[2] == 0 && mac[3] == 0 && mac[4] == 0 && mac[5] == 0;
    !zero && mac[0] & 0x01 == 0
}

// =============================================================================
// Unit Tests
// =============================================================================
