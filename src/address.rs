use crate::{crc8, Bus, Command, Delayer, Error, IoWire, Scanner};
use byteorder::{ByteOrder, LittleEndian};
use core::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    ops::{Deref, DerefMut},
    str::FromStr,
};

/// 64-bit ROM code of a device: family code, 48-bit serial number, CRC.
///
/// The raw bytes are the wire layout, in transmission order.
#[derive(Debug, Clone, Copy, PartialOrd, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Address {
    raw: [u8; Self::BYTES as usize],
}

impl Default for Address {
    fn default() -> Self {
        Self::from([0; Self::BYTES as usize])
    }
}

impl From<[u8; Self::BYTES as usize]> for Address {
    fn from(raw: [u8; Self::BYTES as usize]) -> Self {
        Address { raw }
    }
}

impl From<Address> for [u8; Address::BYTES as usize] {
    fn from(addr: Address) -> [u8; Address::BYTES as usize] {
        addr.raw
    }
}

/// The bus shifts the family code out first, so it ends up in the low byte.
impl From<u64> for Address {
    fn from(rom: u64) -> Self {
        let mut addr = Address::default();
        LittleEndian::write_u64(&mut addr.raw, rom);
        addr
    }
}

impl From<Address> for u64 {
    fn from(addr: Address) -> u64 {
        LittleEndian::read_u64(&addr.raw)
    }
}

impl Deref for Address {
    type Target = [u8; Self::BYTES as usize];

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl DerefMut for Address {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.raw
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        self.deref() as _
    }
}

impl AsMut<[u8]> for Address {
    fn as_mut(&mut self) -> &mut [u8] {
        self.deref_mut() as _
    }
}

impl Address {
    /// The length of device address in bytes
    pub const BYTES: u8 = 8;

    /// The length of device address in bits
    pub const BITS: u8 = Self::BYTES * 8;

    /// The length of the serial number in bytes
    pub const SERIAL_BYTES: usize = 6;

    /// Builds an address with a correct trailing CRC.
    pub fn new(family_code: u8, serial_number: [u8; Self::SERIAL_BYTES]) -> Self {
        let mut addr = Address::default();
        addr[0] = family_code;
        addr[1..7].copy_from_slice(&serial_number);
        addr[7] = addr.compute_crc8();
        addr
    }

    pub fn family_code(&self) -> u8 {
        self[0]
    }

    pub fn serial_number(&self) -> [u8; Self::SERIAL_BYTES] {
        let mut serial = [0u8; Self::SERIAL_BYTES];
        serial.copy_from_slice(&self[1..7]);
        serial
    }

    pub fn crc(&self) -> u8 {
        self[7]
    }

    /// CRC over family code and serial number.
    pub fn compute_crc8(&self) -> u8 {
        crc8(&self[..7])
    }

    /// Returns true if the stored CRC matches the family code and serial number.
    pub fn valid(&self) -> bool {
        self.compute_crc8() == self.crc()
    }

    pub fn ensure_valid<E: Debug>(&self) -> Result<(), Error<E>> {
        let computed = self.compute_crc8();
        if computed != self.crc() {
            Err(Error::CrcMismatch(computed, self.crc()))
        } else {
            Ok(())
        }
    }

    pub(crate) fn bit(&self, position: u8) -> bool {
        self[(position / 8) as usize] & (0x01 << (position % 8)) != 0x00
    }

    pub(crate) fn write_bit(&mut self, position: u8, value: bool) {
        let index = (position / 8) as usize;
        let mask = 0x01 << (position % 8);
        if value {
            self[index] |= mask;
        } else {
            self[index] &= !mask;
        }
    }
}

/// Error type
#[derive(Debug, PartialEq, Eq)]
pub enum AddressError {
    NotEnough,
    Invalid,
}

fn hex_to_u8(c: char) -> Option<u8> {
    c.to_digit(16).map(|d| d as u8)
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut addr = Address::default();
        let mut chars = s.chars().filter(|c| !c.is_whitespace() && *c != ':');

        for i in 0..Self::BYTES as usize {
            match (chars.next(), chars.next()) {
                (Some(h), Some(l)) => match (hex_to_u8(h), hex_to_u8(l)) {
                    (Some(h), Some(l)) => {
                        addr[i] = (h << 4) | l;
                    }
                    _ => return Err(AddressError::Invalid),
                },
                _ => return Err(AddressError::NotEnough),
            }
        }

        if chars.next().is_some() {
            return Err(AddressError::Invalid);
        }

        Ok(addr)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self[0], self[1], self[2], self[3], self[4], self[5], self[6], self[7],
        )
    }
}

impl Address {
    /// Resets the bus and selects this device for the following function command.
    pub fn match_rom<W: IoWire, D: Delayer<W::Error>>(
        &self,
        bus: &mut Bus<W, D>,
    ) -> Result<(), Error<W::Error>> {
        bus.reset()?;
        bus.write_command(Command::MatchRom)?;
        bus.write_bytes(self.as_ref())?;
        Ok(())
    }

    /// Resets the bus and reads the address of the only device on it.
    ///
    /// With more than one device the devices answer at the same time and the
    /// result is garbage; use a [`Scanner`] instead. The CRC is not checked.
    pub fn read<W: IoWire, D: Delayer<W::Error>>(
        &mut self,
        bus: &mut Bus<W, D>,
    ) -> Result<(), Error<W::Error>> {
        bus.reset()?;
        bus.write_command(Command::ReadRom)?;
        bus.read_bytes(self.as_mut())?;
        Ok(())
    }

    /// Like [`Address::read`], but rejects a corrupted address.
    pub fn get_single<W: IoWire, D: Delayer<W::Error>>(
        bus: &mut Bus<W, D>,
    ) -> Result<Self, Error<W::Error>> {
        let mut address = Self::default();
        address.read(bus)?;
        address.ensure_valid::<W::Error>()?;
        Ok(address)
    }

    /// Searches the bus for the first device of the given family.
    pub fn search_first<W: IoWire, D: Delayer<W::Error>>(
        bus: &mut Bus<W, D>,
        family_code: u8,
    ) -> Result<Option<Self>, Error<W::Error>> {
        let mut scanner = Scanner::new();
        for address in scanner.iter(bus) {
            let address = address?;
            if family_code == address.family_code() {
                return Ok(Some(address));
            }
        }
        Ok(None)
    }
}
