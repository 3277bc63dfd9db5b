use embedded_hal::digital::{Error, ErrorType, InputPin, OutputPin};

/// Direction of the bus line as seen from the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Output,
    Input,
}

/// The single signal line of a 1-Wire bus.
///
/// The line idles high through the pull-up. `turn_off` pulls it low,
/// `turn_on` releases it again.
pub trait IoWire {
    type Error: Error;

    /// Switches between driving and sampling the line.
    ///
    /// Open-drain pins can sample while configured as output, so the
    /// provided pin adapters treat this as a no-op.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Releases the line, letting the pull-up bring it high
    ///
    /// *NOTE* the actual electrical state of the line may stay low while a device holds it
    fn turn_on(&mut self) -> Result<(), Self::Error>;

    /// Drives the line low
    fn turn_off(&mut self) -> Result<(), Self::Error>;

    /// Samples the line, `true` for high
    fn get(&mut self) -> Result<bool, Self::Error>;
}

/// Single line config wrapper, for an open-drain pin
impl<IO> IoWire for (IO,)
where
    IO: ErrorType + OutputPin + InputPin,
{
    type Error = IO::Error;

    fn set_direction(&mut self, _direction: Direction) -> Result<(), Self::Error> {
        Ok(())
    }

    fn turn_on(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    fn turn_off(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }

    fn get(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }
}

/// Dual line config wrapper
impl<E, I, O> IoWire for (I, O)
where
    E: Error,
    I: ErrorType<Error = E> + InputPin,
    O: ErrorType<Error = E> + OutputPin,
{
    type Error = E;

    fn set_direction(&mut self, _direction: Direction) -> Result<(), Self::Error> {
        Ok(())
    }

    fn turn_on(&mut self) -> Result<(), Self::Error> {
        self.1.set_high()
    }

    fn turn_off(&mut self) -> Result<(), Self::Error> {
        self.1.set_low()
    }

    fn get(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }
}

/// Inverted wire wrapper, for lines driven through an inverting transistor stage
pub struct Inverted<P>(pub P);

impl<I: ErrorType> ErrorType for Inverted<I> {
    type Error = I::Error;
}

impl<I> InputPin for Inverted<I>
where
    I: InputPin,
{
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }
}

impl<O> OutputPin for Inverted<O>
where
    O: OutputPin,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }
}
