#![no_std]

pub mod constants;
pub mod controller;
pub mod eeprom;
pub mod memory;
pub mod sim;

pub use eeprom::{Eeprom, EepromError, EepromImage, Programmed, Progress};
pub use memory::RegisterWindow;
