use core::fmt::{Display, Formatter, Result as FmtResult};

/// Timing of the bus time slots, all values in microseconds.
///
/// The defaults follow the DS18B20 datasheet for standard speed. A write
/// slot holds the line low for `write_bit` (one) or the whole `write_slot`
/// (zero). A read slot holds it low for `read_bit_init`, releases it and
/// samples `read_bit_rc` later, which must land within 15us of the slot start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub reset_pulse: u32,
    /// Wait between releasing the reset pulse and sampling for presence
    pub presence_pulse: u32,
    pub write_slot: u32,
    pub write_bit: u32,
    pub write_recovery: u32,
    pub read_slot: u32,
    pub read_bit_init: u32,
    pub read_bit_rc: u32,
    pub read_recovery: u32,
}

impl Default for Params {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Durations left over once the fixed parts of each slot have elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remains {
    /// `reset_pulse - presence_pulse`
    pub reset: u32,
    /// `write_slot - write_bit`
    pub write: u32,
    /// `read_slot - read_bit_init - read_bit_rc`
    pub read: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsError {
    /// Named interval is zero
    ZeroInterval(&'static str),
    /// Fixed parts of the named slot exceed its total length
    SlotOverrun(&'static str),
}

impl Display for ParamsError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            ParamsError::ZeroInterval(name) => write!(f, "{} must not be zero", name),
            ParamsError::SlotOverrun(name) => write!(f, "{} is shorter than its parts", name),
        }
    }
}

impl Params {
    pub const STANDARD: Params = Params {
        reset_pulse: 480,
        presence_pulse: 60,
        write_slot: 60,
        write_bit: 10,
        write_recovery: 1,
        read_slot: 60,
        read_bit_init: 5,
        read_bit_rc: 5,
        read_recovery: 1,
    };

    /// Validates the intervals and derives the slot remainders.
    pub fn remains(&self) -> Result<Remains, ParamsError> {
        let intervals = [
            ("reset_pulse", self.reset_pulse),
            ("presence_pulse", self.presence_pulse),
            ("write_slot", self.write_slot),
            ("write_bit", self.write_bit),
            ("write_recovery", self.write_recovery),
            ("read_slot", self.read_slot),
            ("read_bit_init", self.read_bit_init),
            ("read_bit_rc", self.read_bit_rc),
            ("read_recovery", self.read_recovery),
        ];
        if let Some(&(name, _)) = intervals.iter().find(|&&(_, us)| us == 0) {
            return Err(ParamsError::ZeroInterval(name));
        }

        let reset = self
            .reset_pulse
            .checked_sub(self.presence_pulse)
            .ok_or(ParamsError::SlotOverrun("reset_pulse"))?;
        let write = self
            .write_slot
            .checked_sub(self.write_bit)
            .ok_or(ParamsError::SlotOverrun("write_slot"))?;
        let read = self
            .read_slot
            .checked_sub(self.read_bit_init)
            .and_then(|rest| rest.checked_sub(self.read_bit_rc))
            .ok_or(ParamsError::SlotOverrun("read_slot"))?;

        Ok(Remains { reset, write, read })
    }
}
