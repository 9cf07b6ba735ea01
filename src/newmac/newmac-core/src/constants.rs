// Physical placement of the LAN9221 on the board (16-bit static memory bus)
pub const MAP_BASE: u64 = 0x5000_0000;
pub const MAP_SIZE: usize = 0x1000; // 4k

// Number of 16-bit slots inside the mapped window
pub const WINDOW_HALFWORDS: usize = MAP_SIZE / 2;

pub mod registers {
    // System CSR offsets, as listed in the LAN9221 datasheet
    pub const MAC_CSR_CMD: usize = 0xA4;
    pub const MAC_CSR_DATA: usize = 0xA8;
    pub const GPIO_CFG: usize = 0x88;
    pub const E2P_CMD: usize = 0xB0;
    pub const E2P_DATA: usize = 0xB4;
}

pub mod mac_csr {
    // MAC_CSR_CMD fields
    pub const CSR_BUSY: u32 = 0x8000_0000;
    pub const CSR_READ: u32 = 0x4000_0000;
    pub const CSR_ADDR: u32 = 0x0000_00FF;

    // Indirect MAC register indices
    pub const ADDRH: u8 = 2;
    pub const ADDRL: u8 = 3;
}

pub mod gpio_cfg {
    pub const LED3_EN: u32 = 0x4000_0000;
    pub const LED2_EN: u32 = 0x2000_0000;
    pub const LED1_EN: u32 = 0x1000_0000;
    // EEDIO/EECLK pin multiplexing; must be zero to reach the EEPROM
    pub const EEPR_EN: u32 = 0x0070_0000;
}

pub mod e2p_cmd {
    pub const EPC_BUSY: u32 = 0x8000_0000;
    pub const EPC_CMD: u32 = 0x7000_0000;
    pub const EPC_CMD_SHIFT: u32 = 28;
    pub const EPC_TIMEOUT: u32 = 0x0000_0200;
    pub const MAC_ADDR_LOADED: u32 = 0x0000_0100;
    pub const EPC_ADDR: u32 = 0x0000_00FF;
}

pub mod e2p_data {
    pub const EEPROM_DATA: u32 = 0x0000_00FF;
}

pub mod eeprom {
    // Cells reachable through the 8-bit address field that this tool uses
    pub const CELL_COUNT: usize = 32;
    pub const CELLS_PER_ROW: usize = 8;

    // Signature the controller checks before loading the address at reset
    pub const MAGIC: u8 = 0xA5;
    pub const MAGIC_CELL: u8 = 0;
    pub const ADDRESS_CELL: u8 = 1;
}
