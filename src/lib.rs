#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]

mod address;
mod bus;
mod command;
mod crc;
mod delay;
mod iowire;
mod params;
mod result;
mod scanner;
#[cfg(test)]
mod sim;

pub use address::{Address, AddressError};
pub use bus::Bus;
pub use command::{Command, OpCode};
pub use crc::{compute_partial_crc8, crc8, crc8_with, BitOrder};
pub use delay::Delayer;
pub use iowire::{Direction, Inverted, IoWire};
pub use params::{Params, ParamsError, Remains};
pub use result::Error;
pub use scanner::{ScanIter, Scanner};
