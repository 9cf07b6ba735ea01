//! Register-level model of the LAN9221 EEPROM and MAC CSR interfaces.
//!
//! Behaves like the controller seen through the 16-bit bus: commands are
//! started by the BUSY transition of E2P_CMD, BUSY stays up for a
//! configurable number of polls, a missing EEPROM reports EPC_TIMEOUT.
//! Host-side protocol mistakes (issuing while busy, reading data while
//! busy, skipping the latch write) are counted instead of being fatal.

use core::cell::Cell;

use log::warn;

use crate::constants::e2p_cmd::{EPC_ADDR, EPC_BUSY, EPC_CMD, EPC_TIMEOUT, MAC_ADDR_LOADED};
use crate::constants::eeprom::{ADDRESS_CELL, MAGIC, MAGIC_CELL};
use crate::constants::gpio_cfg::{EEPR_EN, LED1_EN, LED2_EN, LED3_EN};
use crate::constants::mac_csr::{ADDRH, ADDRL, CSR_ADDR, CSR_BUSY};
use crate::constants::registers::*;
use crate::constants::WINDOW_HALFWORDS;
use crate::eeprom::{Command, CommandStatus};
use crate::memory::RegisterWindow;

// 93C56 organised as 256 x 8
pub const SIM_EEPROM_SIZE: usize = 256;

const HISTORY_DEPTH: usize = 256;
const BUS_LOG_DEPTH: usize = 1024;

/// A command that reached the EEPROM state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submitted {
    pub command: Command,
    pub addr: u8,
    /// E2P_DATA low byte at submission time
    pub data: u8,
}

pub struct SimulatedController {
    regs: [u16; WINDOW_HALFWORDS],
    cells: [u8; SIM_EEPROM_SIZE],
    mac: [u8; 6],
    mac_loaded: bool,

    present: bool,
    fail_after: Option<usize>,
    write_enabled: bool,

    e2p_status: u32,
    e2p_low: u16, // low half written, waiting for the high half
    latched: Option<u32>,
    busy_polls: u32,
    busy_left: Cell<u32>,
    violations: Cell<u32>,

    executed: usize,
    truncated: bool,
    history: heapless::Vec<Submitted, HISTORY_DEPTH>,
    e2p_writes: heapless::Vec<u16, BUS_LOG_DEPTH>,
}

impl SimulatedController {
    /// Blank (erased) EEPROM fitted, MAC not loaded
    pub fn new() -> Self {
        Self::with_cells([0xFF; SIM_EEPROM_SIZE])
    }

    pub fn with_cells(cells: [u8; SIM_EEPROM_SIZE]) -> Self {
        let mut sim = SimulatedController {
            regs: [0; WINDOW_HALFWORDS],
            cells,
            mac: [0; 6],
            mac_loaded: false,
            present: true,
            fail_after: None,
            write_enabled: false,
            e2p_status: 0,
            e2p_low: 0,
            latched: None,
            busy_polls: 0,
            busy_left: Cell::new(0),
            violations: Cell::new(0),
            executed: 0,
            truncated: false,
            history: heapless::Vec::new(),
            e2p_writes: heapless::Vec::new(),
        };
        let gpio = LED3_EN | LED2_EN | LED1_EN | EEPR_EN;
        sim.store32(GPIO_CFG, gpio);
        // Power-on load, as the controller does after reset
        sim.reload();
        sim
    }

    /// No EEPROM on the pins: every command ends in EPC_TIMEOUT
    pub fn absent() -> Self {
        let mut sim = Self::new();
        sim.present = false;
        sim.reload();
        sim
    }

    /// The EEPROM stops answering after `count` commands
    pub fn fail_after(&mut self, count: usize) {
        self.fail_after = Some(count);
    }

    /// Number of status polls that still see BUSY after each command
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.busy_polls = polls;
    }

    pub fn set_mac_address(&mut self, mac: [u8; 6]) {
        self.mac = mac;
    }

    pub fn mac_address(&self) -> [u8; 6] {
        self.mac
    }

    pub fn cells(&self) -> [u8; SIM_EEPROM_SIZE] {
        self.cells
    }

    pub fn write_enabled(&self) -> bool {
        self.write_enabled
    }

    pub fn gpio_cfg(&self) -> u32 {
        self.load32(GPIO_CFG)
    }

    /// The first commands executed; see `log_truncated`
    pub fn history(&self) -> &[Submitted] {
        &self.history
    }

    /// Commands executed so far, including those past the history depth
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Whether the history or the E2P_CMD bus log ran out of room
    pub fn log_truncated(&self) -> bool {
        self.truncated
    }

    /// Raw half-words written to E2P_CMD and E2P_CMD + 2, in order
    pub fn e2p_cmd_writes(&self) -> &[u16] {
        &self.e2p_writes
    }

    pub fn protocol_violations(&self) -> u32 {
        self.violations.get()
    }

    fn violation(&self, what: &str) {
        warn!("host protocol violation: {}", what);
        self.violations.set(self.violations.get() + 1);
    }

    fn note_overflow(&mut self, what: &str) {
        if !self.truncated {
            warn!("{} full, later entries are not recorded", what);
        }
        self.truncated = true;
    }

    fn load32(&self, offset: usize) -> u32 {
        self.regs[offset] as u32 | (self.regs[offset + 2] as u32) << 16
    }

    fn store32(&mut self, offset: usize, value: u32) {
        self.regs[offset] = value as u16;
        self.regs[offset + 2] = (value >> 16) as u16;
    }

    fn responding(&self) -> bool {
        match self.fail_after {
            Some(limit) => self.present && self.executed < limit,
            None => self.present,
        }
    }

    fn reload(&mut self) {
        if self.responding() && self.cells[MAGIC_CELL as usize] == MAGIC {
            let start = ADDRESS_CELL as usize;
            self.mac.copy_from_slice(&self.cells[start..start + 6]);
            self.mac_loaded = true;
        } else {
            self.mac_loaded = false;
        }
    }

    fn e2p_cmd_written(&mut self, word: u32) {
        let fields = word & (EPC_CMD | EPC_ADDR);
        if word & EPC_BUSY == 0 {
            if self.busy_left.get() != 0 {
                self.violation("command latched while BUSY");
            }
            self.latched = Some(fields);
            return;
        }

        if self.latched.take() != Some(fields) {
            // The controller would run whatever it sampled; refuse instead
            self.violation("BUSY set without latching the same fields first");
            return;
        }
        self.execute(CommandStatus::decode(word));
    }

    fn execute(&mut self, request: CommandStatus) {
        let data = self.regs[E2P_DATA] as u8;
        let responding = self.responding();
        self.executed += 1;
        let entry = Submitted {
            command: request.command,
            addr: request.addr,
            data,
        };
        if self.history.push(entry).is_err() {
            self.note_overflow("command history");
        }

        let addr = request.addr as usize;
        if responding {
            match request.command {
                Command::Read => self.store32(E2P_DATA, self.cells[addr] as u32),
                Command::Ewen => self.write_enabled = true,
                Command::Ewds => self.write_enabled = false,
                Command::Write if self.write_enabled => self.cells[addr] = data,
                Command::Wral if self.write_enabled => self.cells = [data; SIM_EEPROM_SIZE],
                Command::Erase if self.write_enabled => self.cells[addr] = 0xFF,
                Command::Eral if self.write_enabled => self.cells = [0xFF; SIM_EEPROM_SIZE],
                Command::Reload => self.reload(),
                _ => warn!("{:?} ignored, array is write protected", request.command),
            }
        } else if request.command == Command::Read {
            // Floating data lines
            self.store32(E2P_DATA, 0xFF);
        }

        let mut status = CommandStatus::command_word(request.command, request.addr);
        if !responding {
            status |= EPC_TIMEOUT;
        }
        if self.mac_loaded {
            status |= MAC_ADDR_LOADED;
        }
        self.e2p_status = status;
        self.busy_left.set(self.busy_polls);
    }

    fn log_e2p_write(&mut self, value: u16) {
        if self.e2p_writes.push(value).is_err() {
            self.note_overflow("E2P_CMD bus log");
        }
    }

    fn mac_csr_written(&mut self, word: u32) {
        if word & CSR_BUSY == 0 {
            return;
        }
        let m = self.mac;
        let data = match (word & CSR_ADDR) as u8 {
            ADDRH => u32::from_le_bytes([m[4], m[5], 0, 0]),
            ADDRL => u32::from_le_bytes([m[0], m[1], m[2], m[3]]),
            _ => 0,
        };
        self.store32(MAC_CSR_DATA, data);
        self.store32(MAC_CSR_CMD, word & !CSR_BUSY);
    }
}

impl Default for SimulatedController {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterWindow for SimulatedController {
    fn read(&self, offset: usize) -> u16 {
        match offset {
            E2P_CMD => self.e2p_status as u16,
            o if o == E2P_CMD + 2 => {
                let high = (self.e2p_status >> 16) as u16;
                let left = self.busy_left.get();
                if left == 0 {
                    high
                } else {
                    self.busy_left.set(left - 1);
                    high | (EPC_BUSY >> 16) as u16
                }
            }
            o if o == E2P_DATA || o == E2P_DATA + 2 => {
                if self.busy_left.get() != 0 {
                    self.violation("E2P_DATA read while BUSY");
                }
                self.regs[offset]
            }
            _ => self.regs[offset],
        }
    }

    fn write(&mut self, offset: usize, value: u16) {
        match offset {
            E2P_CMD => {
                self.log_e2p_write(value);
                self.e2p_low = value;
            }
            o if o == E2P_CMD + 2 => {
                self.log_e2p_write(value);
                let word = self.e2p_low as u32 | (value as u32) << 16;
                self.e2p_cmd_written(word);
            }
            o if o == MAC_CSR_CMD + 2 => {
                self.regs[offset] = value;
                let word = self.load32(MAC_CSR_CMD);
                self.mac_csr_written(word);
            }
            _ => self.regs[offset] = value,
        }
    }
}
