mod transport;

pub use transport::{read_mac_csr, read_register, write_register};

/// 16-bit access to the controller's register window.
/// Offsets are register offsets from the datasheet; how they land on the
/// physical bus is up to the implementor.
pub trait RegisterWindow {
    fn read(&self, offset: usize) -> u16;
    fn write(&mut self, offset: usize, value: u16);
}

impl<W: RegisterWindow + ?Sized> RegisterWindow for &mut W {
    fn read(&self, offset: usize) -> u16 {
        (**self).read(offset)
    }

    fn write(&mut self, offset: usize, value: u16) {
        (**self).write(offset, value)
    }
}
