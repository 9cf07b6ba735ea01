use core::fmt;
use core::fmt::Write as _;

use hwaddr::HardwareAddress;
use log::{debug, warn};

use crate::constants::e2p_cmd::*;
use crate::constants::e2p_data::EEPROM_DATA;
use crate::constants::eeprom::{ADDRESS_CELL, CELLS_PER_ROW, CELL_COUNT, MAGIC, MAGIC_CELL};
use crate::constants::registers::{E2P_CMD, E2P_DATA};
use crate::memory::{read_register, write_register, RegisterWindow};

/// EPC_CMD field of E2P_CMD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Read,
    Ewds, // erase/write disable
    Ewen, // erase/write enable
    Write,
    Wral, // write all
    Erase,
    Eral, // erase all
    Reload,
}

impl Command {
    pub fn code(self) -> u32 {
        match self {
            Command::Read => 0,
            Command::Ewds => 1,
            Command::Ewen => 2,
            Command::Write => 3,
            Command::Wral => 4,
            Command::Erase => 5,
            Command::Eral => 6,
            Command::Reload => 7,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code & 0x7 {
            0 => Command::Read,
            1 => Command::Ewds,
            2 => Command::Ewen,
            3 => Command::Write,
            4 => Command::Wral,
            5 => Command::Erase,
            6 => Command::Eral,
            _ => Command::Reload,
        }
    }
}

/// Decoded view of an E2P_CMD word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub busy: bool,
    pub command: Command,
    pub timeout: bool,
    pub mac_addr_loaded: bool,
    pub addr: u8,
}

impl CommandStatus {
    pub fn decode(word: u32) -> Self {
        CommandStatus {
            busy: word & EPC_BUSY != 0,
            command: Command::from_code((word & EPC_CMD) >> EPC_CMD_SHIFT),
            timeout: word & EPC_TIMEOUT != 0,
            mac_addr_loaded: word & MAC_ADDR_LOADED != 0,
            addr: (word & EPC_ADDR) as u8,
        }
    }

    /// Command word as written by the host; status-only bits are left out
    pub fn command_word(command: Command, addr: u8) -> u32 {
        (command.code() << EPC_CMD_SHIFT) | (addr as u32 & EPC_ADDR)
    }
}

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum EepromError {
    #[error("EEPROM timeout on {command:?} (E2P_CMD {status:#010x}), is an EEPROM fitted?")]
    Timeout { command: Command, status: u32 },
}

/// Snapshot of the cells this tool cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EepromImage {
    pub cells: [u8; CELL_COUNT],
}

impl EepromImage {
    pub fn new(cells: [u8; CELL_COUNT]) -> Self {
        EepromImage { cells }
    }

    pub fn has_magic(&self) -> bool {
        self.cells[MAGIC_CELL as usize] == MAGIC
    }

    /// Address stored in cells 1-6, whether or not the magic byte is there
    pub fn stored_address(&self) -> HardwareAddress {
        let start = ADDRESS_CELL as usize;
        let mut octets = [0u8; hwaddr::ADDRESS_LEN];
        octets.copy_from_slice(&self.cells[start..start + hwaddr::ADDRESS_LEN]);
        HardwareAddress::new(octets)
    }

    /// Dump lines of eight two-digit hex cells separated by spaces
    pub fn rows(&self) -> impl Iterator<Item = heapless::String<DUMP_ROW_LEN>> + '_ {
        self.cells.chunks(CELLS_PER_ROW).map(dump_row)
    }
}

/// Width of one dump line
pub const DUMP_ROW_LEN: usize = 3 * CELLS_PER_ROW - 1;

fn dump_row(cells: &[u8]) -> heapless::String<DUMP_ROW_LEN> {
    let mut line = heapless::String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i != 0 {
            let _ = line.push(' ');
        }
        let _ = write!(line, "{:02x}", cell);
    }
    line
}

impl fmt::Display for EepromImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

/// Hooks called while an address is being programmed
pub trait Progress {
    /// Image read before anything is unlocked
    fn baseline(&mut self, _image: &EepromImage) {}
    /// Unlock succeeded, cell writes are about to start
    fn writing(&mut self) {}
    /// Image read back after the array was locked again
    fn confirmed(&mut self, _image: &EepromImage) {}
}

impl Progress for () {}

/// Result of a complete program cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Programmed {
    pub before: EepromImage,
    pub after: EepromImage,
}

/// EEPROM command engine on top of E2P_CMD / E2P_DATA.
/// Every command waits for BUSY to clear before and after it is issued.
pub struct Eeprom<W: RegisterWindow> {
    window: W,
}

impl<W: RegisterWindow> Eeprom<W> {
    pub fn new(window: W) -> Self {
        Eeprom { window }
    }

    pub fn into_inner(self) -> W {
        self.window
    }

    pub fn status(&self) -> CommandStatus {
        CommandStatus::decode(read_register(&self.window, E2P_CMD))
    }

    /// Spins until EPC_BUSY reads clear. There is no bound: a dead
    /// controller hangs here.
    pub fn wait_idle(&self) {
        while read_register(&self.window, E2P_CMD) & EPC_BUSY != 0 {
            core::hint::spin_loop();
        }
    }

    /// Latches the fields with BUSY clear, then writes them again with BUSY
    /// set. The controller starts on the BUSY transition.
    pub fn submit_command(&mut self, command: Command, addr: u8) {
        let word = CommandStatus::command_word(command, addr);
        debug!("E2P_CMD <- {:?} addr {} ({:#010x})", command, addr, word);
        write_register(&mut self.window, E2P_CMD, word);
        write_register(&mut self.window, E2P_CMD, word | EPC_BUSY);
    }

    pub fn read_cell(&mut self, addr: u8) -> u8 {
        debug_assert!((addr as usize) < CELL_COUNT);
        self.wait_idle();
        self.submit_command(Command::Read, addr);
        self.wait_idle();
        (read_register(&self.window, E2P_DATA) & EEPROM_DATA) as u8
    }

    pub fn read_image(&mut self) -> EepromImage {
        let mut cells = [0u8; CELL_COUNT];
        for (addr, cell) in cells.iter_mut().enumerate() {
            *cell = self.read_cell(addr as u8);
        }
        EepromImage::new(cells)
    }

    /// EWEN. A timeout here is the only reliable sign of a missing EEPROM.
    pub fn enable_write(&mut self) -> Result<(), EepromError> {
        self.wait_idle();
        self.submit_command(Command::Ewen, 0);
        self.wait_idle();

        let status = read_register(&self.window, E2P_CMD);
        if status & EPC_TIMEOUT != 0 {
            warn!("EWEN timed out, E2P_CMD = {:#010x}", status);
            return Err(EepromError::Timeout {
                command: Command::Ewen,
                status,
            });
        }
        Ok(())
    }

    /// Not verified; read the cell back if that matters.
    pub fn write_cell(&mut self, addr: u8, value: u8) {
        self.wait_idle();
        write_register(&mut self.window, E2P_DATA, value as u32);
        self.submit_command(Command::Write, addr);
        self.wait_idle();
    }

    pub fn disable_write(&mut self) {
        self.wait_idle();
        self.submit_command(Command::Ewds, 0);
        self.wait_idle();
    }

    /// Dump, unlock, write magic + address into cells 0-6, lock, dump.
    /// Fails only if the unlock times out, before any cell is touched.
    pub fn program_address<P: Progress + ?Sized>(
        &mut self,
        address: &HardwareAddress,
        progress: &mut P,
    ) -> Result<Programmed, EepromError> {
        let before = self.read_image();
        progress.baseline(&before);

        self.enable_write()?;
        progress.writing();

        self.write_cell(MAGIC_CELL, MAGIC);
        for (i, octet) in address.octets().iter().enumerate() {
            self.write_cell(ADDRESS_CELL + i as u8, *octet);
        }

        self.disable_write();

        let after = self.read_image();
        progress.confirmed(&after);
        debug!("programmed {}", address);

        Ok(Programmed { before, after })
    }
}
