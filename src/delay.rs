use embedded_hal::delay::DelayNs;

/// Microsecond blocking delay used to shape the time slots.
///
/// `E` is the error type of the wire the delay is paired with, so a failing
/// delay source surfaces through the same [`Error::PortError`](crate::Error::PortError).
pub trait Delayer<E> {
    fn delay(&mut self, us: u32) -> Result<(), E>;
}

impl<E, D: DelayNs> Delayer<E> for D {
    #[inline(always)]
    fn delay(&mut self, us: u32) -> Result<(), E> {
        self.delay_us(us);
        Ok(())
    }
}
