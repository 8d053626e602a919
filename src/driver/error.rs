//! Error types for the EQoS driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Configuration and link-adaptation failures
//! - [`DmaError`]: Ring allocation, descriptor and buffer issues
//! - [`IoError`]: Hardware timeouts and runtime state failures
//! - [`PlatformError`]: Failures reported by a [`Platform`] capability
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods. Nothing is retried inside the driver; the
//! caller decides whether to retry `start`/`send` or tear down.
//!
//! [`Platform`]: crate::hal::platform::Platform

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and link-adaptation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Invalid configuration parameter
    InvalidConfig,
    /// Cache line size is zero or not a power of two
    InvalidCacheLine,
    /// Invalid PHY address (must be 0-31)
    InvalidPhyAddress,
    /// PHY reported a speed the MAC cannot run at
    InvalidSpeed,
    /// Station address is zero or multicast
    InvalidMacAddress,
    /// No PHY answered on the MDIO bus
    PhyNotFound,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::InvalidCacheLine => "invalid cache line size",
            ConfigError::InvalidPhyAddress => "invalid PHY address",
            ConfigError::InvalidSpeed => "invalid link speed",
            ConfigError::InvalidMacAddress => "invalid MAC address",
            ConfigError::PhyNotFound => "no PHY found",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// DMA ring, descriptor and buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Descriptor or buffer allocation failed
    ResourceExhausted,
    /// Released RX buffer is not the next one in recycle order
    UnexpectedBuffer,
    /// Descriptor is busy (owned by DMA hardware)
    DescriptorBusy,
    /// Frame too large for buffer capacity
    FrameTooLarge,
    /// Invalid frame length (zero)
    InvalidLength,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::ResourceExhausted => "DMA memory exhausted",
            DmaError::UnexpectedBuffer => "unexpected RX buffer released",
            DmaError::DescriptorBusy => "descriptor busy",
            DmaError::FrameTooLarge => "frame too large for buffers",
            DmaError::InvalidLength => "invalid frame length",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Hardware timeouts and runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// DMA software reset bit never cleared
    ResetTimeout,
    /// MDIO busy bit never cleared
    MdioTimeout,
    /// TX descriptor ownership never returned to software
    TxTimeout,
    /// MTL TX queue did not drain during stop
    TxDrainTimeout,
    /// MTL RX queue did not drain during stop
    RxDrainTimeout,
    /// PHY reports no link
    NoLink,
    /// Invalid state for operation (e.g., not running)
    InvalidState,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::ResetTimeout => "DMA software reset timed out",
            IoError::MdioTimeout => "MDIO transaction timed out",
            IoError::TxTimeout => "TX completion timed out",
            IoError::TxDrainTimeout => "TX queue drain timed out",
            IoError::RxDrainTimeout => "RX queue drain timed out",
            IoError::NoLink => "no link",
            IoError::InvalidState => "invalid state for operation",
        }
    }

    /// Returns true for the hardware-timeout family
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            IoError::ResetTimeout
                | IoError::MdioTimeout
                | IoError::TxTimeout
                | IoError::TxDrainTimeout
                | IoError::RxDrainTimeout
        )
    }
}

// =============================================================================
// Platform Errors
// =============================================================================

/// Error returned by a platform capability
///
/// The driver never inspects or rewrites these; they are carried unchanged
/// inside [`Error::Platform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlatformError {
    /// Reset line could not be asserted or released
    ResetFailed,
    /// Clock could not be enabled or disabled
    ClockFailed,
    /// Pad calibration failed or timed out
    CalibrationFailed,
    /// TX clock rate could not be set
    TxClockFailed,
    /// Capability not available on this platform
    Unsupported,
    /// Vendor-specific error code
    Vendor(i32),
}

impl core::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlatformError::Vendor(code) => write!(f, "vendor error {code}"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl PlatformError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PlatformError::ResetFailed => "reset control failed",
            PlatformError::ClockFailed => "clock control failed",
            PlatformError::CalibrationFailed => "pad calibration failed",
            PlatformError::TxClockFailed => "TX clock rate change failed",
            PlatformError::Unsupported => "unsupported capability",
            PlatformError::Vendor(_) => "vendor error",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Dma(DmaError::UnexpectedBuffer)) => { /* caller bug */ }
///     Err(e) if e.is_timeout() => { /* retry start */ }
///     Err(Error::Platform(e)) => { /* SoC glue failed */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// DMA error
    Dma(DmaError),
    /// I/O error
    Io(IoError),
    /// Platform capability error
    Platform(PlatformError),
}

impl Error {
    /// Returns true if this error is any kind of hardware timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        match self {
            Error::Io(e) => e.is_timeout(),
            _ => false,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
            Error::Platform(e) => write!(f, "platform: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// From impls for automatic conversion
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

impl From<PlatformError> for Error {
    fn from(e: PlatformError) -> Self {
        Error::Platform(e)
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for DMA operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

/// Result type alias for platform capabilities
pub type PlatformResult<T> = core::result::Result<T, PlatformError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;

    #[test]
    fn as_str_non_empty_for_every_variant() {
        let config = [
            ConfigError::InvalidConfig,
            ConfigError::InvalidCacheLine,
            ConfigError::InvalidPhyAddress,
            ConfigError::InvalidSpeed,
            ConfigError::InvalidMacAddress,
            ConfigError::PhyNotFound,
        ];
        for variant in config {
            assert!(!variant.as_str().is_empty(), "{:?}", variant);
        }

        let dma = [
            DmaError::ResourceExhausted,
            DmaError::UnexpectedBuffer,
            DmaError::DescriptorBusy,
            DmaError::FrameTooLarge,
            DmaError::InvalidLength,
        ];
        for variant in dma {
            assert!(!variant.as_str().is_empty(), "{:?}", variant);
        }

        let io = [
            IoError::ResetTimeout,
            IoError::MdioTimeout,
            IoError::TxTimeout,
            IoError::TxDrainTimeout,
            IoError::RxDrainTimeout,
            IoError::NoLink,
            IoError::InvalidState,
        ];
        for variant in io {
            assert!(!variant.as_str().is_empty(), "{:?}", variant);
        }
    }

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn timeouts_are_classified() {
        assert!(Error::from(IoError::ResetTimeout).is_timeout());
        assert!(Error::from(IoError::MdioTimeout).is_timeout());
        assert!(Error::from(IoError::TxTimeout).is_timeout());
        assert!(Error::from(IoError::TxDrainTimeout).is_timeout());
        assert!(Error::from(IoError::RxDrainTimeout).is_timeout());

        assert!(!Error::from(IoError::NoLink).is_timeout());
        assert!(!Error::from(DmaError::UnexpectedBuffer).is_timeout());
        assert!(!Error::from(PlatformError::ClockFailed).is_timeout());
    }

    #[test]
    fn platform_error_is_carried_unchanged() {
        let err: Error = PlatformError::Vendor(-110).into();
        assert_eq!(err, Error::Platform(PlatformError::Vendor(-110)));
    }

    // =========================================================================
    // Display
    // =========================================================================

    #[test]
    fn display_prefixes_domain() {
        assert_eq!(
            format!("{}", Error::from(ConfigError::InvalidSpeed)),
            "config: invalid link speed"
        );
        assert_eq!(
            format!("{}", Error::from(DmaError::UnexpectedBuffer)),
            "dma: unexpected RX buffer released"
        );
        assert_eq!(
            format!("{}", Error::from(IoError::TxTimeout)),
            "io: TX completion timed out"
        );
        assert_eq!(
            format!("{}", Error::from(PlatformError::Vendor(-5))),
            "platform: vendor error -5"
        );
    }
}
