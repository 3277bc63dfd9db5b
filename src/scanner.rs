use crate::{Address, Bus, Command, Delayer, Error, IoWire};
use core::fmt::Debug;
use log::{debug, trace, warn};

/// Enumerates the devices on a bus with the Search ROM command.
///
/// Each [`scan`](Scanner::scan) performs one pass down the binary tree of
/// ROM codes and reports one device. Conflicting bits take the low branch
/// first; the next pass replays the previous path up to the deepest low
/// branch and takes the high branch there. Devices come out in ascending
/// order of their bit sequence, so an unchanged bus always yields the same
/// order.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    finished: bool,
    /// Deepest position where the low branch was taken in the running pass
    prev_discrepancy: Option<u8>,
    /// Position where the running pass takes the high branch
    curr_discrepancy: Option<u8>,
    /// Low branches taken in the running pass, each one still to be explored
    conflict_count: u8,
    /// Address found by the last pass
    path: Address,
}

impl Scanner {
    pub fn new() -> Scanner {
        Scanner::default()
    }

    /// Starts the enumeration over from the beginning of the tree.
    pub fn reset(&mut self) {
        *self = Scanner::default();
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Reports the next device on the bus.
    ///
    /// Returns `Err(Exhausted)` once every device has been reported. After any
    /// other error the pass is discarded and the next call repeats it, though
    /// calling [`reset`](Scanner::reset) first is the safe recovery.
    pub fn scan<W: IoWire, D: Delayer<W::Error>>(
        &mut self,
        bus: &mut Bus<W, D>,
    ) -> Result<Address, Error<W::Error>> {
        if self.finished {
            return Err(Error::Exhausted);
        }

        bus.reset()?;
        bus.write_command(Command::SearchRom)?;

        trace!("search pass, high branch at {:?}", self.curr_discrepancy);

        self.prev_discrepancy = None;
        self.conflict_count = 0;

        let mut address = Address::default();
        for position in 0..Address::BITS {
            let bit1 = bus.read_bit()?; // normal bit
            let bit2 = bus.read_bit()?; // complement bit

            let bit = match (bit1, bit2) {
                // no device responded
                (true, true) => return Err(Error::NoResponse),
                // devices with 0 and 1 at this position
                (false, false) => self.handle_discrepancy(position),
                // all remaining devices agree
                (bit, _) => bit,
            };

            address.write_bit(position, bit);
            bus.write_bit(bit)?;
        }

        // a shorted line answers every read with zero
        if address == Address::default() {
            warn!("search returned an all-zero ROM code, line stuck low?");
            return Err(Error::WireFault);
        }

        if let Err(error) = address.ensure_valid() {
            warn!("search returned {} with bad crc", address);
            return Err(error);
        }

        self.path = address;
        self.curr_discrepancy = self.prev_discrepancy;
        self.finished = self.conflict_count == 0;

        debug!("found device {}", address);
        Ok(address)
    }

    /// Returns an iterator over the remaining devices.
    pub fn iter<'a, W: IoWire, D: Delayer<W::Error>>(
        &'a mut self,
        bus: &'a mut Bus<W, D>,
    ) -> ScanIter<'a, W, D> {
        ScanIter {
            scanner: self,
            bus,
            failed: false,
        }
    }

    fn handle_discrepancy(&mut self, position: u8) -> bool {
        let bit = match self.curr_discrepancy {
            // the branch being resolved: low was taken last time
            Some(curr) if position == curr => true,
            // above the branch being resolved: follow the previous path
            Some(curr) if position < curr => self.path.bit(position),
            // new discrepancy
            _ => false,
        };

        if !bit {
            self.prev_discrepancy = Some(position);
            self.conflict_count += 1;
        }

        bit
    }
}

/// Iterator over the devices found by a [`Scanner`].
///
/// Ends when the scanner is exhausted and after the first error.
pub struct ScanIter<'a, W: IoWire, D: Delayer<W::Error>> {
    scanner: &'a mut Scanner,
    bus: &'a mut Bus<W, D>,
    failed: bool,
}

impl<E: Debug, W: IoWire<Error = E>, D: Delayer<E>> Iterator for ScanIter<'_, W, D> {
    type Item = Result<Address, Error<E>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.scanner.scan(self.bus) {
            Err(Error::Exhausted) => None,
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
            Ok(address) => Some(Ok(address)),
        }
    }
}
