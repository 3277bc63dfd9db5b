//! Software model of a 1-Wire line with slave devices attached.
//!
//! Time only advances through the delay source. Devices decode the master's
//! pulses by their width and answer read slots by holding the line low, so
//! the model catches slots that are too short, too long or sampled late.

use crate::{Address, Bus, Command, Delayer, Direction, IoWire, Params};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error, ErrorKind};
use std::{cell::RefCell, rc::Rc};

/// Low pulses at least this long reset the devices.
const RESET_MIN_NS: u64 = 240_000;
/// Low pulses at least this long are write-zero slots.
const WRITE_ZERO_MIN_NS: u64 = 15_000;
/// How long a device holds the line low to answer a zero.
const READ_HOLD_NS: u64 = 15_000;
/// Presence pulse window, counted from the release of the reset pulse.
const PRESENCE_FROM_NS: u64 = 15_000;
const PRESENCE_UNTIL_NS: u64 = 135_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// Injected failure
    Fault,
    /// Line driven while sampling, or sampled while driving
    Direction,
}

impl Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Command { byte: u8, count: u8 },
    Search { position: u8, step: u8 },
    ReadRom { position: u8 },
    MatchRom { position: u8 },
    Function { byte: u8, count: u8 },
    WriteScratchpad,
    ReadScratchpad { position: usize },
}

/// A slave device with a ROM code and a bit-wide scratchpad.
pub struct SimDevice {
    rom: Address,
    phase: Phase,
    selected: bool,
    commands: Vec<u8>,
    scratchpad: Vec<bool>,
}

impl SimDevice {
    pub const WRITE_SCRATCHPAD: u8 = 0x4E;
    pub const READ_SCRATCHPAD: u8 = 0xBE;

    fn new(rom: Address) -> Self {
        SimDevice {
            rom,
            phase: Phase::Idle,
            selected: false,
            commands: Vec::new(),
            scratchpad: Vec::new(),
        }
    }

    fn on_reset(&mut self) {
        self.phase = Phase::Command { byte: 0, count: 0 };
        self.selected = false;
    }

    fn select(&mut self) {
        self.selected = true;
        self.phase = Phase::Function { byte: 0, count: 0 };
    }

    fn on_write(&mut self, bit: bool) {
        match self.phase {
            Phase::Command { byte, count } => {
                let byte = byte | (bit as u8) << count;
                if count < 7 {
                    self.phase = Phase::Command {
                        byte,
                        count: count + 1,
                    };
                    return;
                }
                self.commands.push(byte);
                self.phase = match byte {
                    b if b == Command::SearchRom as u8 => Phase::Search {
                        position: 0,
                        step: 0,
                    },
                    b if b == Command::ReadRom as u8 => Phase::ReadRom { position: 0 },
                    b if b == Command::MatchRom as u8 => Phase::MatchRom { position: 0 },
                    b if b == Command::SkipRom as u8 => {
                        self.select();
                        return;
                    }
                    _ => Phase::Idle,
                };
            }
            Phase::Search { position, step: 2 } | Phase::MatchRom { position } => {
                if bit != self.rom.bit(position) {
                    self.phase = Phase::Idle;
                } else if position + 1 == Address::BITS {
                    self.select();
                } else if let Phase::Search { .. } = self.phase {
                    self.phase = Phase::Search {
                        position: position + 1,
                        step: 0,
                    };
                } else {
                    self.phase = Phase::MatchRom {
                        position: position + 1,
                    };
                }
            }
            Phase::Function { byte, count } => {
                let byte = byte | (bit as u8) << count;
                if count < 7 {
                    self.phase = Phase::Function {
                        byte,
                        count: count + 1,
                    };
                    return;
                }
                self.phase = match byte {
                    Self::WRITE_SCRATCHPAD => {
                        self.scratchpad.clear();
                        Phase::WriteScratchpad
                    }
                    Self::READ_SCRATCHPAD => Phase::ReadScratchpad { position: 0 },
                    _ => Phase::Idle,
                };
            }
            Phase::WriteScratchpad => self.scratchpad.push(bit),
            // a write where a read was expected drops the device off the bus
            _ => self.phase = Phase::Idle,
        }
    }

    fn on_read(&mut self) -> bool {
        match self.phase {
            Phase::Search { position, step: 0 } => {
                self.phase = Phase::Search { position, step: 1 };
                self.rom.bit(position)
            }
            Phase::Search { position, step: 1 } => {
                self.phase = Phase::Search { position, step: 2 };
                !self.rom.bit(position)
            }
            Phase::ReadRom { position } => {
                self.phase = if position + 1 == Address::BITS {
                    Phase::Idle
                } else {
                    Phase::ReadRom {
                        position: position + 1,
                    }
                };
                self.rom.bit(position)
            }
            Phase::ReadScratchpad { position } => {
                self.phase = Phase::ReadScratchpad {
                    position: position + 1,
                };
                self.scratchpad.get(position).copied().unwrap_or(true)
            }
            _ => true,
        }
    }
}

struct Slot {
    start: u64,
    sample: Option<bool>,
}

struct Line {
    now: u64,
    direction: Direction,
    driven_low: bool,
    low_since: u64,
    slot: Option<Slot>,
    released_reset: Option<u64>,
    shorted: bool,
    devices: Vec<SimDevice>,
    pulses: Vec<u64>,
    written: Vec<bool>,
    ops: usize,
    fail_at: Option<usize>,
}

impl Line {
    fn op(&mut self) -> Result<(), SimError> {
        self.ops += 1;
        if self.fail_at == Some(self.ops) {
            Err(SimError::Fault)
        } else {
            Ok(())
        }
    }

    fn settle(&mut self) {
        if let Some(slot) = self.slot.take() {
            if slot.sample.is_none() {
                self.deliver(true);
            }
        }
    }

    fn deliver(&mut self, bit: bool) {
        self.written.push(bit);
        for device in self.devices.iter_mut() {
            device.on_write(bit);
        }
    }

    fn turn_off(&mut self) -> Result<(), SimError> {
        self.op()?;
        if self.direction != Direction::Output {
            return Err(SimError::Direction);
        }
        if !self.driven_low {
            self.settle();
            self.driven_low = true;
            self.low_since = self.now;
        }
        Ok(())
    }

    fn turn_on(&mut self) -> Result<(), SimError> {
        self.op()?;
        if self.direction != Direction::Output {
            return Err(SimError::Direction);
        }
        if !self.driven_low {
            return Ok(());
        }
        self.driven_low = false;

        let width = self.now - self.low_since;
        self.pulses.push(width);
        if width >= RESET_MIN_NS {
            self.released_reset = Some(self.now);
            for device in self.devices.iter_mut() {
                device.on_reset();
            }
        } else if width >= WRITE_ZERO_MIN_NS {
            self.deliver(false);
        } else {
            self.slot = Some(Slot {
                start: self.low_since,
                sample: None,
            });
        }
        Ok(())
    }

    fn get(&mut self) -> Result<bool, SimError> {
        self.op()?;
        if self.direction != Direction::Input {
            return Err(SimError::Direction);
        }
        if self.driven_low || self.shorted {
            return Ok(false);
        }

        if let Some(slot) = self.slot.as_mut() {
            let devices = &mut self.devices;
            let sample = *slot.sample.get_or_insert_with(|| {
                devices
                    .iter_mut()
                    .fold(true, |level, device| device.on_read() && level)
            });
            return Ok(sample || self.now - slot.start >= READ_HOLD_NS);
        }

        if let Some(released) = self.released_reset {
            let since = self.now - released;
            let presence = (PRESENCE_FROM_NS..PRESENCE_UNTIL_NS).contains(&since);
            return Ok(!(presence && !self.devices.is_empty()));
        }

        Ok(true)
    }
}

/// Handle to a simulated bus, shared by the wire, the delay and the test.
#[derive(Clone)]
pub struct Sim(Rc<RefCell<Line>>);

impl Sim {
    pub fn new(devices: &[Address]) -> Self {
        Sim(Rc::new(RefCell::new(Line {
            now: 0,
            direction: Direction::Output,
            driven_low: false,
            low_since: 0,
            slot: None,
            released_reset: None,
            shorted: false,
            devices: devices.iter().copied().map(SimDevice::new).collect(),
            pulses: Vec::new(),
            written: Vec::new(),
            ops: 0,
            fail_at: None,
        })))
    }

    pub fn wire(&self) -> SimWire {
        SimWire(self.0.clone())
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay(self.0.clone())
    }

    pub fn bus(&self, params: Params) -> Bus<SimWire, SimDelay> {
        Bus::new(self.wire(), self.delay(), params)
    }

    /// Like [`Sim::delay`], but every delay counts as an operation and can fail.
    pub fn fallible_delay(&self) -> SimFallibleDelay {
        SimFallibleDelay(self.0.clone())
    }

    pub fn fallible_bus(&self, params: Params) -> Bus<SimWire, SimFallibleDelay> {
        Bus::new(self.wire(), self.fallible_delay(), params)
    }

    pub fn now_us(&self) -> u64 {
        self.0.borrow().now / 1_000
    }

    /// Widths of the low pulses driven by the master, in microseconds.
    pub fn pulses_us(&self) -> Vec<u64> {
        self.0.borrow().pulses.iter().map(|ns| ns / 1_000).collect()
    }

    /// Bits the devices received, in order.
    pub fn written(&self) -> Vec<bool> {
        let mut line = self.0.borrow_mut();
        line.settle();
        line.written.clone()
    }

    /// ROM commands received by the device at `index`.
    pub fn commands(&self, index: usize) -> Vec<u8> {
        let mut line = self.0.borrow_mut();
        line.settle();
        line.devices[index].commands.clone()
    }

    /// Devices currently addressed for a function command.
    pub fn selected(&self) -> Vec<Address> {
        let mut line = self.0.borrow_mut();
        line.settle();
        line.devices
            .iter()
            .filter(|device| device.selected)
            .map(|device| device.rom)
            .collect()
    }

    /// Number of operations performed so far, delays of a fallible delay included.
    pub fn ops(&self) -> usize {
        self.0.borrow().ops
    }

    /// Makes the `op`-th operation, counted from the start, fail.
    pub fn fail_at(&self, op: usize) {
        self.0.borrow_mut().fail_at = Some(op);
    }

    /// Ties the line to ground.
    pub fn short(&self) {
        self.0.borrow_mut().shorted = true;
    }
}

pub struct SimWire(Rc<RefCell<Line>>);

impl IoWire for SimWire {
    type Error = SimError;

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        let mut line = self.0.borrow_mut();
        line.op()?;
        line.direction = direction;
        Ok(())
    }

    fn turn_on(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().turn_on()
    }

    fn turn_off(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().turn_off()
    }

    fn get(&mut self) -> Result<bool, Self::Error> {
        self.0.borrow_mut().get()
    }
}

pub struct SimDelay(Rc<RefCell<Line>>);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().now += ns as u64;
    }
}

pub struct SimFallibleDelay(Rc<RefCell<Line>>);

impl Delayer<SimError> for SimFallibleDelay {
    fn delay(&mut self, us: u32) -> Result<(), SimError> {
        let mut line = self.0.borrow_mut();
        line.op()?;
        line.now += us as u64 * 1_000;
        Ok(())
    }
}
