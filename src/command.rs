/// Anything that is sent to the bus as a single command byte.
///
/// Sensor layers implement it for their function commands so they can go
/// through [`Bus::write_command`](crate::Bus::write_command).
pub trait OpCode {
    fn op_code(&self) -> u8;
}

/// ROM commands understood by every 1-Wire device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    MatchRom = 0x55,
    SearchRom = 0xF0,
    SkipRom = 0xCC,
    ReadRom = 0x33,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}

impl OpCode for u8 {
    fn op_code(&self) -> u8 {
        *self
    }
}
