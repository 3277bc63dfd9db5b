/// Polynomial of the Dallas/Maxim CRC-8 (x^8 + x^5 + x^4 + 1), reflected.
pub const DALLAS_POLYNOMIAL: u8 = 0x8C;

/// Bit numbering of the shift register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    /// Least significant bit first.
    Lsb,
    /// Most significant bit first.
    Msb,
}

/// Dallas/Maxim CRC-8 of `data`, as used by every 1-Wire device family.
pub fn crc8(data: &[u8]) -> u8 {
    compute_partial_crc8(0u8, data)
}

/// Continues a Dallas/Maxim CRC-8 from `crc` over `data`.
pub fn compute_partial_crc8(crc: u8, data: &[u8]) -> u8 {
    let mut crc = crc;
    for byte in data.iter() {
        let mut byte = *byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0x00 {
                crc ^= DALLAS_POLYNOMIAL;
            }
            byte >>= 1;
        }
    }
    crc
}

/// Generic CRC-8 with explicit seed, polynomial and shift direction.
///
/// `crc8_with(data, 0x00, 0x8C, BitOrder::Lsb)` equals [`crc8`]; sensors on
/// other buses use e.g. `0xFF, 0x31, BitOrder::Msb`.
pub fn crc8_with(data: &[u8], initial: u8, polynomial: u8, order: BitOrder) -> u8 {
    let mut crc = initial;
    for byte in data.iter() {
        crc ^= *byte;
        for _ in 0..8 {
            crc = match order {
                BitOrder::Lsb if crc & 0x01 != 0 => (crc >> 1) ^ polynomial,
                BitOrder::Lsb => crc >> 1,
                BitOrder::Msb if crc & 0x80 != 0 => (crc << 1) ^ polynomial,
                BitOrder::Msb => crc << 1,
            };
        }
    }
    crc
}
