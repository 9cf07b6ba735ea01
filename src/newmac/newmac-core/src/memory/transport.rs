use super::RegisterWindow;
use crate::constants::mac_csr::{CSR_ADDR, CSR_BUSY, CSR_READ};
use crate::constants::registers;

/// Stores a 32-bit register as two half-words, low half first
pub fn write_register<W: RegisterWindow + ?Sized>(window: &mut W, offset: usize, value: u32) {
    window.write(offset, (value & 0xFFFF) as u16);
    window.write(offset + 2, (value >> 16) as u16);
}

/// Loads a 32-bit register, low half first. The device is live, so two
/// reads may disagree.
pub fn read_register<W: RegisterWindow + ?Sized>(window: &W, offset: usize) -> u32 {
    let low = window.read(offset) as u32;
    let high = window.read(offset + 2) as u32;
    low | (high << 16)
}

/// Indirect read of a MAC CSR (diagnostics only)
pub fn read_mac_csr<W: RegisterWindow + ?Sized>(window: &mut W, index: u8) -> u32 {
    write_register(
        window,
        registers::MAC_CSR_CMD,
        CSR_BUSY | CSR_READ | (index as u32 & CSR_ADDR),
    );
    read_register(&*window, registers::MAC_CSR_DATA)
}
