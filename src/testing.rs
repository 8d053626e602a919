//! Testing utilities and mock implementations
//!
//! This module provides mock implementations and a register-level model of
//! the EQoS controller for testing the driver on the host without hardware
//! access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::alloc::Layout;
use core::cell::RefCell;
use std::collections::HashMap;
use std::vec::Vec;

use crate::driver::config::{Duplex, Speed};
use crate::driver::error::{IoError, PlatformError, PlatformResult, Result};
use crate::hal::cache::{CacheMaintenance, CacheRange};
use crate::hal::mdio::{MdioBus, bmcr, phy_reg};
use crate::hal::platform::Platform;
use crate::internal::dma::alloc::{DmaAllocator, DmaRegion};
use crate::internal::dma::descriptor::Descriptor;
use crate::internal::register::RegisterAccess;
use crate::internal::register::dma::*;
use crate::internal::register::mac::*;
use crate::internal::register::mtl::*;
use crate::phy::{LinkStatus, PhyDriver};

// =============================================================================
// Mock MDIO Bus
// =============================================================================

/// Mock MDIO bus for testing PHY drivers without hardware
///
/// Registers are keyed by `(phy_addr, devad, reg)`; unset registers read
/// as `0xffff`, like an empty bus.
#[derive(Debug, Default)]
pub struct MockMdioBus {
    registers: RefCell<HashMap<(u8, Option<u8>, u16), u16>>,
    write_log: RefCell<Vec<(u8, u8, u16)>>,
    /// Report every access as timed out
    timeout: bool,
}

impl MockMdioBus {
    /// Create a new mock MDIO bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a clause 22 register value
    pub fn set_register(&self, phy_addr: u8, reg: u8, value: u16) {
        self.registers
            .borrow_mut()
            .insert((phy_addr, None, reg as u16), value);
    }

    /// Get the current value of a clause 22 register
    pub fn get_register(&self, phy_addr: u8, reg: u8) -> Option<u16> {
        self.registers
            .borrow()
            .get(&(phy_addr, None, reg as u16))
            .copied()
    }

    /// Get all clause 22 writes that have been made
    pub fn get_writes(&self) -> Vec<(u8, u8, u16)> {
        self.write_log.borrow().clone()
    }

    /// Make every access fail with an MDIO timeout
    pub fn set_timeout(&mut self, timeout: bool) {
        self.timeout = timeout;
    }

    /// Populate a gigabit PHY at `phy_addr` with link down
    pub fn setup_gigabit_phy(&self, phy_addr: u8) {
        use crate::hal::mdio::bmsr;

        self.set_register(phy_addr, phy_reg::PHYIDR1, 0x001c);
        self.set_register(phy_addr, phy_reg::PHYIDR2, 0xc916);
        self.set_register(
            phy_addr,
            phy_reg::BMSR,
            bmsr::TX_FD_CAPABLE
                | bmsr::TX_HD_CAPABLE
                | bmsr::T10_FD_CAPABLE
                | bmsr::T10_HD_CAPABLE
                | bmsr::ESTATUS
                | bmsr::AN_ABILITY
                | bmsr::EXT_CAPABLE,
        );
        self.set_register(phy_addr, phy_reg::BMCR, bmcr::AN_ENABLE);
        self.set_register(phy_addr, phy_reg::ANAR, 0x01e1);
        self.set_register(phy_addr, phy_reg::ANLPAR, 0);
        self.set_register(phy_addr, phy_reg::GBCR, 0);
        self.set_register(phy_addr, phy_reg::GBSR, 0);
        self.set_register(phy_addr, phy_reg::ESTATUS, 0x3000);
    }

    /// Link up with the partner advertising `anlpar` and `gbsr`
    pub fn simulate_link_up(&self, phy_addr: u8, anlpar: u16, gbsr: u16) {
        use crate::hal::mdio::bmsr;

        let bmsr_val = self.get_register(phy_addr, phy_reg::BMSR).unwrap_or(0);
        self.set_register(
            phy_addr,
            phy_reg::BMSR,
            bmsr_val | bmsr::LINK_STATUS | bmsr::AN_COMPLETE,
        );
        self.set_register(phy_addr, phy_reg::ANLPAR, anlpar);
        self.set_register(phy_addr, phy_reg::GBSR, gbsr);
    }
}

impl MdioBus for MockMdioBus {
    fn read(&mut self, phy_addr: u8, devad: Option<u8>, reg: u16) -> Result<u16> {
        if self.timeout {
            return Err(IoError::MdioTimeout.into());
        }
        Ok(self
            .registers
            .borrow()
            .get(&(phy_addr, devad, reg))
            .copied()
            .unwrap_or(0xffff))
    }

    fn write(&mut self, phy_addr: u8, devad: Option<u8>, reg: u16, value: u16) -> Result<()> {
        if self.timeout {
            return Err(IoError::MdioTimeout.into());
        }
        if devad.is_none() {
            self.write_log
                .borrow_mut()
                .push((phy_addr, reg as u8, value));
        }

        // Reset and AN restart self-clear
        let mut stored = value;
        if devad.is_none() && reg == phy_reg::BMCR as u16 {
            stored &= !(bmcr::RESET | bmcr::AN_RESTART);
        }
        self.registers
            .borrow_mut()
            .insert((phy_addr, devad, reg), stored);
        Ok(())
    }

    fn is_busy(&self) -> bool {
        false
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }

    /// Get total microseconds that were "delayed"
    pub fn total_us(&self) -> u64 {
        self.total_ns() / 1_000
    }

    /// Get total milliseconds that were "delayed"
    pub fn total_ms(&self) -> u64 {
        self.total_ns() / 1_000_000
    }

    /// Reset the delay counter
    pub fn reset(&self) {
        *self.total_ns.borrow_mut() = 0;
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += ns as u64;
    }
}

// =============================================================================
// Mock Register File
// =============================================================================

/// Plain register file with a write log
#[derive(Debug, Default)]
pub struct MockRegisters {
    values: RefCell<HashMap<usize, u32>>,
    writes: RefCell<Vec<(usize, u32)>>,
}

impl MockRegisters {
    /// Create an all-zero register file
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write in order
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.writes.borrow().clone()
    }
}

impl RegisterAccess for MockRegisters {
    fn read(&self, offset: usize) -> u32 {
        self.values.borrow().get(&offset).copied().unwrap_or(0)
    }

    fn write(&self, offset: usize, value: u32) {
        self.writes.borrow_mut().push((offset, value));
        self.values.borrow_mut().insert(offset, value);
    }
}

// =============================================================================
// Simulated Controller
// =============================================================================

/// One MDIO transaction seen by the simulated PHY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdioOp {
    Read { phy: u8, devad: Option<u8>, reg: u16 },
    Write { phy: u8, devad: Option<u8>, reg: u16, value: u16 },
}

/// Ring position as the simulated DMA sees it
#[derive(Debug, Clone, Copy)]
struct RingView {
    base: u64,
    count: usize,
    stride: usize,
}

impl RingView {
    fn addr_of(&self, index: usize) -> usize {
        self.base as usize + index * self.stride
    }

    fn index_of(&self, addr: u64) -> usize {
        ((addr - self.base) as usize) / self.stride
    }

    fn descriptor(&self, index: usize) -> &'static Descriptor {
        // SAFETY: test rings outlive every simulated access
        unsafe { &*(self.addr_of(index) as *const Descriptor) }
    }
}

/// Who the model believes owns a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Software,
    Hardware { buffer: u64 },
    /// Written back by the DMA with injected frame `frame`
    Completed { frame: usize },
}

/// Per-descriptor ownership as last seen by the model
#[derive(Debug, Default)]
struct Shadow {
    ring: Option<(u64, usize, usize)>,
    slots: Vec<Slot>,
}

impl Shadow {
    fn forget(&mut self) {
        self.ring = None;
        self.slots.clear();
    }
}

#[derive(Debug, Default)]
struct SimState {
    regs: HashMap<usize, u32>,
    writes: Vec<(usize, u32)>,
    bus_width: usize,
    swr_stuck: bool,
    mdio_stuck: bool,
    tx_queue_stuck: bool,
    rx_queue_stuck: bool,
    tx_completion: bool,
    phy_regs: HashMap<(u8, Option<u8>, u16), u16>,
    mdio_log: Vec<MdioOp>,
    last_mdio_command: u32,
    tx_cursor: usize,
    rx_cursor: usize,
    sent: Vec<Vec<u8>>,
    rx_tail_writes: Vec<usize>,
    ownership_violations: usize,
    tx_shadow: Shadow,
    rx_shadow: Shadow,
    frames_injected: usize,
    recycled: Vec<usize>,
}

/// Register-level model of an EQoS controller
///
/// Besides storing registers it emulates the handshakes the driver waits
/// on: DMA soft reset, MDIO transactions against a PHY register map, TX
/// descriptor completion when the tail pointer moves and RX completion on
/// [`inject_rx`](Self::inject_rx). The DMA side only ever touches
/// descriptors whose ownership bit is set.
///
/// Ownership is checked from both sides. The DMA finding an owned
/// descriptor with no buffer is a violation. So is software clearing OWN
/// on, or pointing elsewhere, a descriptor the DMA still owns; this is
/// checked against a per-descriptor shadow on every register write and
/// every injected frame. A completed RX descriptor that software hands
/// back is recorded in [`recycled_frames`](Self::recycled_frames).
#[derive(Debug)]
pub struct SimulatedEqos {
    state: RefCell<SimState>,
}

impl Default for SimulatedEqos {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedEqos {
    /// Controller with 16 KiB FIFOs on a 128-bit bus
    pub fn new() -> Self {
        let sim = Self {
            state: RefCell::new(SimState {
                bus_width: 16,
                tx_completion: true,
                ..SimState::default()
            }),
        };
        sim.set_fifo_sizes(16384, 16384);
        sim
    }

    /// Model a different AXI bus width (bytes)
    pub fn with_bus_width(self, bytes: usize) -> Self {
        self.state.borrow_mut().bus_width = bytes;
        self
    }

    /// Set the FIFO sizes reported by HW_FEATURE1 (powers of two >= 128)
    pub fn set_fifo_sizes(&self, tx_bytes: u32, rx_bytes: u32) {
        let enc = |bytes: u32| (bytes / 128).trailing_zeros();
        let value = (enc(tx_bytes) << HW_FEATURE1_TXFIFOSIZE_SHIFT)
            | (enc(rx_bytes) << HW_FEATURE1_RXFIFOSIZE_SHIFT);
        self.state.borrow_mut().regs.insert(MAC_HW_FEATURE1, value);
    }

    /// Keep the software reset bit set forever
    pub fn set_swr_stuck(&self, stuck: bool) {
        self.state.borrow_mut().swr_stuck = stuck;
    }

    /// Keep the MDIO busy bit set forever
    pub fn set_mdio_stuck(&self, stuck: bool) {
        self.state.borrow_mut().mdio_stuck = stuck;
    }

    /// Report the MTL TX queue as never draining
    pub fn set_tx_queue_stuck(&self, stuck: bool) {
        self.state.borrow_mut().tx_queue_stuck = stuck;
    }

    /// Report the MTL RX queue as never draining
    pub fn set_rx_queue_stuck(&self, stuck: bool) {
        self.state.borrow_mut().rx_queue_stuck = stuck;
    }

    /// Enable or disable TX completion on tail pointer writes
    pub fn set_tx_completion(&self, enabled: bool) {
        self.state.borrow_mut().tx_completion = enabled;
    }

    /// Set a PHY register
    pub fn set_phy_register(&self, phy: u8, devad: Option<u8>, reg: u16, value: u16) {
        self.state
            .borrow_mut()
            .phy_regs
            .insert((phy, devad, reg), value);
    }

    /// Current PHY register value (0 if never written)
    pub fn phy_register(&self, phy: u8, devad: Option<u8>, reg: u16) -> u16 {
        self.state
            .borrow()
            .phy_regs
            .get(&(phy, devad, reg))
            .copied()
            .unwrap_or(0)
    }

    /// Every MDIO transaction performed
    pub fn mdio_log(&self) -> Vec<MdioOp> {
        self.state.borrow().mdio_log.clone()
    }

    /// Last value written to the MDIO address register with GB set
    pub fn last_mdio_command(&self) -> u32 {
        self.state.borrow().last_mdio_command
    }

    /// Every register write in order
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.state.borrow().writes.clone()
    }

    /// Writes to one register in order
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Forget the write log
    pub fn clear_writes(&self) {
        self.state.borrow_mut().writes.clear();
    }

    /// Snapshot of every register value
    pub fn register_snapshot(&self) -> Vec<(usize, u32)> {
        let mut regs: Vec<(usize, u32)> = self
            .state
            .borrow()
            .regs
            .iter()
            .map(|(o, v)| (*o, *v))
            .collect();
        regs.sort_unstable();
        regs
    }

    /// Frames the TX DMA has sent
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.state.borrow().sent.clone()
    }

    /// Descriptor index of every RX tail pointer write
    pub fn rx_tail_writes(&self) -> Vec<usize> {
        self.state.borrow().rx_tail_writes.clone()
    }

    /// Descriptors touched by the wrong side
    pub fn ownership_violations(&self) -> usize {
        self.state.borrow().ownership_violations
    }

    /// Injected frames (numbered from 0) whose descriptor software has
    /// re-armed, in the order the model noticed
    pub fn recycled_frames(&self) -> Vec<usize> {
        self.state.borrow().recycled.clone()
    }

    /// Point the TX DMA at a ring without going through `start`
    pub fn attach_tx_ring(&self, base: u64, count: usize, stride: usize) {
        self.attach(
            DMA_CH0_TXDESC_LIST_HADDRESS,
            DMA_CH0_TXDESC_LIST_ADDRESS,
            DMA_CH0_TXDESC_RING_LENGTH,
            base,
            count,
            stride,
        );
        let mut st = self.state.borrow_mut();
        st.tx_cursor = 0;
        st.tx_shadow.forget();
    }

    /// Point the RX DMA at a ring without going through `start`
    pub fn attach_rx_ring(&self, base: u64, count: usize, stride: usize) {
        self.attach(
            DMA_CH0_RXDESC_LIST_HADDRESS,
            DMA_CH0_RXDESC_LIST_ADDRESS,
            DMA_CH0_RXDESC_RING_LENGTH,
            base,
            count,
            stride,
        );
        let mut st = self.state.borrow_mut();
        st.rx_cursor = 0;
        st.rx_shadow.forget();
    }

    fn attach(&self, hi: usize, lo: usize, len: usize, base: u64, count: usize, stride: usize) {
        let mut st = self.state.borrow_mut();
        let dsl = ((stride - Descriptor::SIZE) / st.bus_width) as u32;
        st.regs.insert(hi, (base >> 32) as u32);
        st.regs.insert(lo, base as u32);
        st.regs.insert(len, (count - 1) as u32);
        let ctrl = st.regs.get(&DMA_CH0_CONTROL).copied().unwrap_or(0);
        st.regs.insert(
            DMA_CH0_CONTROL,
            (ctrl & !(CONTROL_DSL_MASK << CONTROL_DSL_SHIFT)) | (dsl << CONTROL_DSL_SHIFT),
        );
    }

    /// Complete every TX descriptor currently owned by the DMA
    pub fn complete_pending_tx(&self) {
        let mut st = self.state.borrow_mut();
        Self::sync_shadow(&mut st, true);
        Self::process_tx(&mut st);
    }

    /// Deliver one frame into the next RX descriptor
    ///
    /// Returns false without touching memory when that descriptor is still
    /// owned by software.
    pub fn inject_rx(&self, payload: &[u8]) -> bool {
        let mut st = self.state.borrow_mut();
        Self::sync_shadow(&mut st, false);
        let Some(ring) = Self::ring(&st, false) else {
            return false;
        };
        let desc = ring.descriptor(st.rx_cursor);
        if !desc.is_owned() {
            return false;
        }
        let buf = desc.buffer_addr();
        if buf == 0 {
            st.ownership_violations += 1;
            return false;
        }
        // SAFETY: the descriptor is owned by the model and points at a
        // buffer slot of the test's ring
        unsafe {
            core::ptr::copy_nonoverlapping(payload.as_ptr(), buf as usize as *mut u8, payload.len());
        }
        desc.complete_rx(payload.len());
        let frame = st.frames_injected;
        let cursor = st.rx_cursor;
        if let Some(slot) = st.rx_shadow.slots.get_mut(cursor) {
            *slot = Slot::Completed { frame };
        }
        st.frames_injected += 1;
        st.rx_cursor = (cursor + 1) % ring.count;
        true
    }

    /// Compare descriptor memory against the shadow and record every
    /// ownership change software made since the last look
    fn sync_shadow(st: &mut SimState, tx: bool) {
        let Some(ring) = Self::ring(st, tx) else {
            if tx {
                st.tx_shadow.forget();
            } else {
                st.rx_shadow.forget();
            }
            return;
        };
        let SimState {
            tx_shadow,
            rx_shadow,
            ownership_violations,
            recycled,
            ..
        } = st;
        let shadow = if tx { tx_shadow } else { rx_shadow };

        let key = (ring.base, ring.count, ring.stride);
        if shadow.ring != Some(key) {
            shadow.ring = Some(key);
            shadow.slots = (0..ring.count)
                .map(|i| {
                    let desc = ring.descriptor(i);
                    if desc.is_owned() {
                        Slot::Hardware {
                            buffer: desc.buffer_addr(),
                        }
                    } else {
                        Slot::Software
                    }
                })
                .collect();
            return;
        }

        for (i, slot) in shadow.slots.iter_mut().enumerate() {
            let desc = ring.descriptor(i);
            let owned = desc.is_owned();
            let buffer = desc.buffer_addr();
            *slot = match *slot {
                Slot::Hardware { buffer: expected } => {
                    if !owned || buffer != expected {
                        *ownership_violations += 1;
                    }
                    if owned {
                        Slot::Hardware { buffer }
                    } else {
                        Slot::Software
                    }
                }
                Slot::Completed { frame } if owned => {
                    recycled.push(frame);
                    Slot::Hardware { buffer }
                }
                Slot::Software if owned => Slot::Hardware { buffer },
                other => other,
            };
        }
    }

    fn ring(st: &SimState, tx: bool) -> Option<RingView> {
        let (hi, lo, len) = if tx {
            (
                DMA_CH0_TXDESC_LIST_HADDRESS,
                DMA_CH0_TXDESC_LIST_ADDRESS,
                DMA_CH0_TXDESC_RING_LENGTH,
            )
        } else {
            (
                DMA_CH0_RXDESC_LIST_HADDRESS,
                DMA_CH0_RXDESC_LIST_ADDRESS,
                DMA_CH0_RXDESC_RING_LENGTH,
            )
        };
        let reg = |o: usize| st.regs.get(&o).copied().unwrap_or(0);
        let base = ((reg(hi) as u64) << 32) | reg(lo) as u64;
        if base == 0 {
            return None;
        }
        let dsl = (reg(DMA_CH0_CONTROL) >> CONTROL_DSL_SHIFT) & CONTROL_DSL_MASK;
        Some(RingView {
            base,
            count: reg(len) as usize + 1,
            stride: Descriptor::SIZE + dsl as usize * st.bus_width,
        })
    }

    fn process_tx(st: &mut SimState) {
        let Some(ring) = Self::ring(st, true) else {
            return;
        };
        for _ in 0..ring.count {
            let desc = ring.descriptor(st.tx_cursor);
            if !desc.is_owned() {
                break;
            }
            let buf = desc.buffer_addr();
            let len = desc.raw_des3() as usize & 0x7fff;
            if buf == 0 || len == 0 {
                st.ownership_violations += 1;
                break;
            }
            // SAFETY: the descriptor is owned by the model and points at
            // the scratch buffer holding `len` valid bytes
            let frame = unsafe { core::slice::from_raw_parts(buf as usize as *const u8, len) };
            st.sent.push(frame.to_vec());
            desc.complete_tx();
            let cursor = st.tx_cursor;
            if let Some(slot) = st.tx_shadow.slots.get_mut(cursor) {
                *slot = Slot::Software;
            }
            st.tx_cursor = (cursor + 1) % ring.count;
        }
    }

    fn mdio_transaction(st: &mut SimState, cmd: u32) {
        let phy = ((cmd >> MDIO_ADDRESS_PA_SHIFT) & MDIO_ADDRESS_PA_MASK) as u8;
        let rda = ((cmd >> MDIO_ADDRESS_RDA_SHIFT) & MDIO_ADDRESS_RDA_MASK) as u8;
        let goc = (cmd >> MDIO_ADDRESS_GOC_SHIFT) & 3;
        let data = st.regs.get(&MAC_MDIO_DATA).copied().unwrap_or(0);

        let (devad, reg) = if cmd & MDIO_ADDRESS_C45E != 0 {
            (Some(rda), (data >> MDIO_DATA_RA_SHIFT) as u16)
        } else {
            (None, rda as u16)
        };

        if goc == MDIO_ADDRESS_GOC_READ {
            let value = st.phy_regs.get(&(phy, devad, reg)).copied().unwrap_or(0);
            st.regs
                .insert(MAC_MDIO_DATA, (data & !MDIO_DATA_GD_MASK) | value as u32);
            st.mdio_log.push(MdioOp::Read { phy, devad, reg });
        } else if goc == MDIO_ADDRESS_GOC_WRITE {
            let value = (data & MDIO_DATA_GD_MASK) as u16;
            let mut stored = value;
            if devad.is_none() && reg == phy_reg::BMCR as u16 {
                stored &= !(bmcr::RESET | bmcr::AN_RESTART);
            }
            st.phy_regs.insert((phy, devad, reg), stored);
            st.mdio_log.push(MdioOp::Write {
                phy,
                devad,
                reg,
                value,
            });
        }
    }
}

impl RegisterAccess for SimulatedEqos {
    fn read(&self, offset: usize) -> u32 {
        let st = self.state.borrow();
        let stored = st.regs.get(&offset).copied().unwrap_or(0);
        match offset {
            MTL_TXQ0_DEBUG if st.tx_queue_stuck => stored | TXQ0_DEBUG_TXQSTS,
            MTL_RXQ0_DEBUG if st.rx_queue_stuck => stored | (1 << RXQ0_DEBUG_PRXQ_SHIFT),
            _ => stored,
        }
    }

    fn write(&self, offset: usize, value: u32) {
        let mut st = self.state.borrow_mut();
        st.writes.push((offset, value));
        Self::sync_shadow(&mut st, true);
        Self::sync_shadow(&mut st, false);

        match offset {
            DMA_MODE if value & MODE_SWR != 0 && !st.swr_stuck => {
                // Soft reset clears everything but the feature registers
                let keep: Vec<(usize, u32)> = [MAC_HW_FEATURE0, MAC_HW_FEATURE1]
                    .iter()
                    .filter_map(|o| st.regs.get(o).map(|v| (*o, *v)))
                    .collect();
                st.regs.clear();
                st.regs.extend(keep);
                st.tx_cursor = 0;
                st.rx_cursor = 0;
                st.tx_shadow.forget();
                st.rx_shadow.forget();
            }
            MAC_MDIO_ADDRESS if value & MDIO_ADDRESS_GB != 0 => {
                st.last_mdio_command = value;
                if st.mdio_stuck {
                    st.regs.insert(offset, value);
                } else {
                    Self::mdio_transaction(&mut st, value);
                    st.regs.insert(offset, value & !MDIO_ADDRESS_GB);
                }
            }
            DMA_CH0_TXDESC_LIST_ADDRESS => {
                st.regs.insert(offset, value);
                st.tx_cursor = 0;
                st.tx_shadow.forget();
            }
            DMA_CH0_RXDESC_LIST_ADDRESS => {
                st.regs.insert(offset, value);
                st.rx_cursor = 0;
                st.rx_shadow.forget();
            }
            DMA_CH0_TXDESC_TAIL_POINTER => {
                st.regs.insert(offset, value);
                if st.tx_completion {
                    Self::process_tx(&mut st);
                }
            }
            DMA_CH0_RXDESC_TAIL_POINTER => {
                st.regs.insert(offset, value);
                if let Some(ring) = Self::ring(&st, false) {
                    let full = (ring.base & !0xffff_ffff) | value as u64;
                    let index = ring.index_of(full);
                    st.rx_tail_writes.push(index);
                }
            }
            // Flush requests complete immediately
            MTL_TXQ0_OPERATION_MODE => {
                st.regs.insert(offset, value & !TXQ0_OPERATION_MODE_FTQ);
            }
            _ => {
                st.regs.insert(offset, value);
            }
        }
    }
}

// =============================================================================
// Recording Platform
// =============================================================================

/// A platform capability invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformCall {
    StartResets,
    StopResets,
    StartClocks,
    StopClocks,
    CalibratePads,
    DisableCalibration,
    SetTxClockRate(Speed),
    FixSocReset,
}

impl PlatformCall {
    fn same_kind(&self, other: &PlatformCall) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

/// A cache maintenance call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    Flush(CacheRange),
    Invalidate(CacheRange),
}

/// Platform that records every call and can fail on demand
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    calls: Vec<PlatformCall>,
    cache: Vec<CacheOp>,
    fail_on: Option<PlatformCall>,
    tick_rate: Option<u64>,
    mac: Option<[u8; 6]>,
    watched: Option<(usize, usize, usize)>,
    flushed_descriptors: Vec<Vec<(usize, u32)>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a tick clock rate
    pub fn with_tick_rate(mut self, hz: u64) -> Self {
        self.tick_rate = Some(hz);
        self
    }

    /// Report a stored MAC address
    pub fn with_mac_address(mut self, mac: [u8; 6]) -> Self {
        self.mac = Some(mac);
        self
    }

    /// Make every call of the same kind as `call` fail
    pub fn fail_on(&mut self, call: PlatformCall) {
        self.fail_on = Some(call);
    }

    /// Stop failing
    pub fn clear_failure(&mut self) {
        self.fail_on = None;
    }

    pub fn calls(&self) -> &[PlatformCall] {
        &self.calls
    }

    /// Number of calls of the same kind as `call`
    pub fn count(&self, call: PlatformCall) -> usize {
        self.calls.iter().filter(|c| c.same_kind(&call)).count()
    }

    pub fn cache_log(&self) -> Vec<CacheOp> {
        self.cache.clone()
    }

    pub fn flushes(&self) -> Vec<CacheRange> {
        self.cache
            .iter()
            .filter_map(|op| match op {
                CacheOp::Flush(r) => Some(*r),
                CacheOp::Invalidate(_) => None,
            })
            .collect()
    }

    /// Snapshot DES3 of the descriptors at `base + i * stride` (for
    /// `i < count`) whenever a flush covers them
    ///
    /// The ring must stay allocated while it is watched.
    pub fn watch_descriptors(&mut self, base: usize, count: usize, stride: usize) {
        self.watched = Some((base, count, stride));
    }

    /// `(index, DES3)` of the watched descriptors covered by each flush,
    /// read at the time of the flush
    pub fn flushed_descriptors(&self) -> Vec<Vec<(usize, u32)>> {
        self.flushed_descriptors.clone()
    }

    /// Forget recorded calls and cache operations
    pub fn clear_log(&mut self) {
        self.calls.clear();
        self.cache.clear();
        self.flushed_descriptors.clear();
    }

    fn record(&mut self, call: PlatformCall, err: PlatformError) -> PlatformResult<()> {
        self.calls.push(call);
        match self.fail_on {
            Some(f) if f.same_kind(&call) => Err(err),
            _ => Ok(()),
        }
    }
}

impl CacheMaintenance for RecordingPlatform {
    fn flush_range(&mut self, range: CacheRange) {
        self.cache.push(CacheOp::Flush(range));

        let Some((base, count, stride)) = self.watched else {
            return;
        };
        let covered: Vec<(usize, u32)> = (0..count)
            .filter(|i| range.contains(base + i * stride))
            .map(|i| {
                // SAFETY: watched rings outlive the flushes that cover them
                let desc = unsafe { &*((base + i * stride) as *const Descriptor) };
                (i, desc.raw_des3())
            })
            .collect();
        if !covered.is_empty() {
            self.flushed_descriptors.push(covered);
        }
    }

    fn invalidate_range(&mut self, range: CacheRange) {
        self.cache.push(CacheOp::Invalidate(range));
    }
}

impl Platform for RecordingPlatform {
    fn start_resets(&mut self) -> PlatformResult<()> {
        self.record(PlatformCall::StartResets, PlatformError::ResetFailed)
    }

    fn stop_resets(&mut self) -> PlatformResult<()> {
        self.record(PlatformCall::StopResets, PlatformError::ResetFailed)
    }

    fn start_clocks(&mut self) -> PlatformResult<()> {
        self.record(PlatformCall::StartClocks, PlatformError::ClockFailed)
    }

    fn stop_clocks(&mut self) -> PlatformResult<()> {
        self.record(PlatformCall::StopClocks, PlatformError::ClockFailed)
    }

    fn calibrate_pads(&mut self) -> PlatformResult<()> {
        self.record(PlatformCall::CalibratePads, PlatformError::CalibrationFailed)
    }

    fn disable_calibration(&mut self) -> PlatformResult<()> {
        self.record(PlatformCall::DisableCalibration, PlatformError::CalibrationFailed)
    }

    fn set_tx_clock_rate(&mut self, speed: Speed) -> PlatformResult<()> {
        self.record(PlatformCall::SetTxClockRate(speed), PlatformError::TxClockFailed)
    }

    fn tick_clock_rate(&self) -> Option<u64> {
        self.tick_rate
    }

    fn fix_soc_reset(&mut self) {
        self.calls.push(PlatformCall::FixSocReset);
    }

    fn mac_address(&mut self) -> PlatformResult<Option<[u8; 6]>> {
        Ok(self.mac)
    }
}

// =============================================================================
// Mock PHY
// =============================================================================

/// PHY driver returning a canned link status
///
/// `startup` reads BMSR once so MDIO failures surface as they would with a
/// real PHY.
#[derive(Debug)]
pub struct MockPhy {
    addr: u8,
    status: LinkStatus,
    pub startups: usize,
    pub shutdowns: usize,
}

impl MockPhy {
    /// Link up at `speed_mbps`
    pub fn link_up(speed_mbps: u32, duplex: Duplex) -> Self {
        Self {
            addr: 0,
            status: LinkStatus {
                link_up: true,
                speed_mbps,
                duplex,
            },
            startups: 0,
            shutdowns: 0,
        }
    }

    /// No link
    pub fn link_down() -> Self {
        let mut phy = Self::link_up(0, Duplex::Half);
        phy.status.link_up = false;
        phy
    }

    /// Change what the next startup reports
    pub fn set_status(&mut self, speed_mbps: u32, duplex: Duplex) {
        self.status = LinkStatus {
            link_up: true,
            speed_mbps,
            duplex,
        };
    }
}

impl PhyDriver for MockPhy {
    fn address(&self) -> u8 {
        self.addr
    }

    fn startup<M: MdioBus>(&mut self, mdio: &mut M) -> Result<LinkStatus> {
        self.startups += 1;
        mdio.read_c22(self.addr, phy_reg::BMSR)?;
        Ok(self.status)
    }

    fn shutdown<M: MdioBus>(&mut self, _mdio: &mut M) -> Result<()> {
        self.shutdowns += 1;
        Ok(())
    }
}

// =============================================================================
// Limited Allocator
// =============================================================================

/// Global-heap allocator that fails after a fixed number of grants
#[derive(Debug)]
pub struct LimitedAllocator {
    remaining: usize,
    granted: usize,
}

impl LimitedAllocator {
    pub fn new(grants: usize) -> Self {
        Self {
            remaining: grants,
            granted: 0,
        }
    }

    /// Allocations granted so far
    pub fn allocations(&self) -> usize {
        self.granted
    }
}

impl DmaAllocator for LimitedAllocator {
    fn allocate(&mut self, layout: Layout) -> Option<DmaRegion> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.granted += 1;
        DmaRegion::zeroed(layout)
    }
}

// =============================================================================
// Test Assertions
// =============================================================================

/// Assert that a register was written with a specific value
#[macro_export]
macro_rules! assert_reg_written {
    ($regs:expr, $offset:expr, $value:expr) => {
        let offset: usize = $offset;
        let value: u32 = $value;
        let writes = $regs.writes();
        assert!(
            writes.iter().any(|w| w.0 == offset && w.1 == value),
            "Expected write of 0x{:08X} to register 0x{:04X}, but got: {:x?}",
            value,
            offset,
            writes
        );
    };
}

/// Assert that a register was never written
#[macro_export]
macro_rules! assert_reg_not_written {
    ($regs:expr, $offset:expr) => {
        let writes = $regs.writes();
        assert!(
            !writes.iter().any(|w| w.0 == $offset),
            "Expected no write to register 0x{:04X}, but got: {:x?}",
            $offset,
            writes
        );
    };
}
