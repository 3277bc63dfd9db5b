use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// Error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E: Sized + Debug> {
    /// No presence pulse after reset, or no device answered a search step
    NoResponse,
    /// Empty buffer passed to a buffer read or write
    InvalidArgument,
    /// Computed and received CRC differ: `(computed, received)`
    CrcMismatch(u8, u8),
    /// Every device on the bus has been reported
    Exhausted,
    /// Wire stuck low while searching
    WireFault,
    /// Failure reported by the line or the delay source
    PortError(E),
}

impl<E: Sized + Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::PortError(e)
    }
}

impl<E: Sized + Debug> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::NoResponse => f.write_str("no device responded"),
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::CrcMismatch(computed, received) => write!(
                f,
                "crc mismatch: computed {:02x}, received {:02x}",
                computed, received
            ),
            Error::Exhausted => f.write_str("no more devices"),
            Error::WireFault => f.write_str("wire stuck low"),
            Error::PortError(e) => write!(f, "port error: {:?}", e),
        }
    }
}
