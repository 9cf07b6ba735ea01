use hwaddr::HardwareAddress;
use log::debug;

use crate::constants::mac_csr::{ADDRH, ADDRL};
use crate::constants::registers::{E2P_CMD, GPIO_CFG};
use crate::eeprom::CommandStatus;
use crate::memory::{read_mac_csr, read_register, write_register, RegisterWindow};

/// MAC address registers as currently latched by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacCsr {
    pub addrh: u32,
    pub addrl: u32,
}

impl MacCsr {
    pub fn address(&self) -> HardwareAddress {
        HardwareAddress::from_mac_csr(self.addrh, self.addrl)
    }
}

/// GPIO_CFG around the pin release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioRelease {
    pub before: u32,
    pub after: u32,
}

pub fn read_mac_address<W: RegisterWindow + ?Sized>(window: &mut W) -> MacCsr {
    let addrh = read_mac_csr(window, ADDRH);
    let addrl = read_mac_csr(window, ADDRL);
    debug!("ADDRH {:08x} ADDRL {:08x}", addrh, addrl);
    MacCsr { addrh, addrl }
}

/// Raw E2P_CMD and its decoded form
pub fn eeprom_status<W: RegisterWindow + ?Sized>(window: &W) -> (u32, CommandStatus) {
    let raw = read_register(window, E2P_CMD);
    (raw, CommandStatus::decode(raw))
}

/// The EEPROM pins are shared with GPIO/LED functions; clearing GPIO_CFG
/// hands them back to the EEPROM controller.
pub fn release_eeprom_pins<W: RegisterWindow + ?Sized>(window: &mut W) -> GpioRelease {
    let before = read_register(&*window, GPIO_CFG);
    write_register(window, GPIO_CFG, 0);
    let after = read_register(&*window, GPIO_CFG);
    GpioRelease { before, after }
}
