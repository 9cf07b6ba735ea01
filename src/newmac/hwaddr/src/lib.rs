#![no_std]

use core::fmt;
use core::str::FromStr;

pub const ADDRESS_LEN: usize = 6;

/// IEEE 802 group (multicast) bit of the first octet
pub const GROUP_BIT: u8 = 0x01;
/// IEEE 802 locally administered bit of the first octet
pub const LOCAL_BIT: u8 = 0x02;

// 48-bit Ethernet hardware address, transmission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HardwareAddress(pub [u8; ADDRESS_LEN]);

/// Reasons a textual address is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseAddressError {
    /// Number of colon separated fields found (always != 6)
    #[error("expected {} fields, found {}", ADDRESS_LEN, .0)]
    FieldCount(usize),
    /// Index of a field that is empty, too long or not hexadecimal
    #[error("field {} is not a one or two digit hex byte", .0 + 1)]
    InvalidField(usize),
}

impl HardwareAddress {
    pub const fn new(octets: [u8; ADDRESS_LEN]) -> Self {
        HardwareAddress(octets)
    }

    /// Turns six random bytes into a usable station address:
    /// group bit cleared, locally administered bit set.
    pub fn local_from_random(mut bytes: [u8; ADDRESS_LEN]) -> Self {
        bytes[0] &= !GROUP_BIT;
        bytes[0] |= LOCAL_BIT;
        HardwareAddress(bytes)
    }

    /// Rebuilds the address latched in the LAN9221 MAC CSRs.
    /// ADDRL holds octets 0-3, the low half of ADDRH holds octets 4-5,
    /// both little-endian.
    pub fn from_mac_csr(addrh: u32, addrl: u32) -> Self {
        let lo = addrl.to_le_bytes();
        let hi = addrh.to_le_bytes();
        HardwareAddress([lo[0], lo[1], lo[2], lo[3], hi[0], hi[1]])
    }

    pub fn octets(&self) -> [u8; ADDRESS_LEN] {
        self.0
    }

    pub fn is_unicast(&self) -> bool {
        self.0[0] & GROUP_BIT == 0
    }

    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & LOCAL_BIT != 0
    }
}

impl From<[u8; ADDRESS_LEN]> for HardwareAddress {
    fn from(octets: [u8; ADDRESS_LEN]) -> Self {
        HardwareAddress(octets)
    }
}

/// Parses `xx:xx:xx:xx:xx:xx`; each field is one or two hex digits
impl FromStr for HardwareAddress {
    type Err = ParseAddressError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let count = text.split(':').count();
        if count != ADDRESS_LEN {
            return Err(ParseAddressError::FieldCount(count));
        }

        let mut octets = [0u8; ADDRESS_LEN];
        for (idx, field) in text.split(':').enumerate() {
            octets[idx] = parse_octet(field).ok_or(ParseAddressError::InvalidField(idx))?;
        }
        Ok(HardwareAddress(octets))
    }
}

fn parse_octet(field: &str) -> Option<u8> {
    // from_str_radix alone would accept a leading '+'
    let valid = matches!(field.len(), 1 | 2) && field.bytes().all(|b| b.is_ascii_hexdigit());
    if !valid {
        return None;
    }
    u8::from_str_radix(field, 16).ok()
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}
