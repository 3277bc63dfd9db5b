use crate::{Command, Delayer, Direction, Error, IoWire, OpCode, Params, ParamsError, Remains};
use core::fmt::Debug;
use log::debug;

/// Bit-banged 1-Wire bus master.
///
/// Owns the line and the delay source. All data is transmitted least
/// significant bit first, one bit per time slot, and every primitive runs
/// to completion before returning. There is no locking: callers that share
/// one physical bus must serialize whole transactions themselves.
pub struct Bus<W: IoWire, D: Delayer<W::Error>> {
    io_wire: W,
    delay: D,
    params: Params,
    remains: Remains,
}

impl<E: Debug, W: IoWire<Error = E>, D: Delayer<E>> Bus<W, D> {
    /// Creates the bus.
    ///
    /// # Panics
    ///
    /// If `params` do not describe consistent time slots, see [`Params::remains`].
    pub fn new(io_wire: W, delay: D, params: Params) -> Self {
        match Self::try_new(io_wire, delay, params) {
            Ok(bus) => bus,
            Err(error) => panic!("invalid 1-Wire timing: {}", error),
        }
    }

    pub fn try_new(io_wire: W, delay: D, params: Params) -> Result<Self, ParamsError> {
        let remains = params.remains()?;
        Ok(Bus {
            io_wire,
            delay,
            params,
            remains,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Gives back the line and the delay source.
    pub fn release(self) -> (W, D) {
        (self.io_wire, self.delay)
    }

    /// Sends a reset pulse and listens for a presence pulse.
    ///
    /// Returns `Err(NoResponse)` if no device pulled the line low.
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.io_wire.set_direction(Direction::Output)?;

        // hold the line for the whole reset pulse
        self.io_wire.turn_off()?;
        self.delay.delay(self.params.reset_pulse)?;

        self.io_wire.turn_on()?;
        self.delay.delay(self.params.presence_pulse)?;

        self.io_wire.set_direction(Direction::Input)?;
        let level = self.io_wire.get()?;

        self.delay.delay(self.remains.reset)?;
        self.io_wire.set_direction(Direction::Output)?;

        if level {
            debug!("no presence pulse after reset");
            Err(Error::NoResponse)
        } else {
            Ok(())
        }
    }

    /// Resets the bus and addresses every device at once.
    pub fn skip_rom(&mut self) -> Result<(), Error<E>> {
        self.reset()?;
        self.write_command(Command::SkipRom)
    }

    pub fn write_command(&mut self, cmd: impl OpCode) -> Result<(), Error<E>> {
        self.write_byte(cmd.op_code())
    }

    pub fn write_bit(&mut self, high: bool) -> Result<(), Error<E>> {
        if high {
            self.write_bit_one()
        } else {
            self.write_bit_zero()
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, Error<E>> {
        self.io_wire.set_direction(Direction::Output)?;

        self.io_wire.turn_off()?;
        self.delay.delay(self.params.read_bit_init)?;

        self.io_wire.turn_on()?;
        // devices drive the line from the falling edge on, sample before they let go
        self.delay.delay(self.params.read_bit_rc)?;

        self.io_wire.set_direction(Direction::Input)?;
        let bit = self.io_wire.get()?;

        self.delay.delay(self.remains.read)?;
        self.delay.delay(self.params.read_recovery)?;
        self.io_wire.set_direction(Direction::Output)?;

        Ok(bit)
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error<E>> {
        let mut byte = byte;
        for _ in 0..8 {
            self.write_bit((byte & 0x01) == 0x01)?;
            byte >>= 1;
        }
        Ok(())
    }

    pub fn read_byte(&mut self) -> Result<u8, Error<E>> {
        let mut byte = 0_u8;
        for _ in 0..8 {
            byte >>= 1;
            if self.read_bit()? {
                byte |= 0x80;
            }
        }
        Ok(byte)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        if bytes.is_empty() {
            return Err(Error::InvalidArgument);
        }
        for b in bytes {
            self.write_byte(*b)?;
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, dst: &mut [u8]) -> Result<(), Error<E>> {
        if dst.is_empty() {
            return Err(Error::InvalidArgument);
        }
        for d in dst {
            *d = self.read_byte()?;
        }
        Ok(())
    }

    fn write_bit_one(&mut self) -> Result<(), Error<E>> {
        self.io_wire.set_direction(Direction::Output)?;

        self.io_wire.turn_off()?;
        self.delay.delay(self.params.write_bit)?;

        self.io_wire.turn_on()?;
        self.delay.delay(self.remains.write)?;

        self.delay.delay(self.params.write_recovery)?;
        Ok(())
    }

    fn write_bit_zero(&mut self) -> Result<(), Error<E>> {
        self.io_wire.set_direction(Direction::Output)?;

        // keep holding for the entire slot
        self.io_wire.turn_off()?;
        self.delay.delay(self.params.write_slot)?;

        self.io_wire.turn_on()?;
        self.delay.delay(self.params.write_recovery)?;
        Ok(())
    }
}
