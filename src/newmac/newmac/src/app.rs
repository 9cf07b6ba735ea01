use std::io::{self, Write};

use hwaddr::{HardwareAddress, ParseAddressError, ADDRESS_LEN};
use log::info;
use newmac_core::controller::{eeprom_status, read_mac_address, release_eeprom_pins};
use newmac_core::{Eeprom, EepromError, EepromImage, Programmed, Progress, RegisterWindow};
use newmac_devmem::{EntropySource, HostError};

use crate::settings::Settings;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid mac address {input:?}: {source}")]
    BadAddress {
        input: String,
        source: ParseAddressError,
    },
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Eeprom(#[from] EepromError),
    #[error("cannot write output: {0}")]
    Output(#[from] io::Error),
}

/// What to store in the EEPROM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Given(HardwareAddress),
    Random,
}

impl Target {
    pub fn parse(text: &str) -> Result<Self, AppError> {
        text.parse()
            .map(Target::Given)
            .map_err(|source| AppError::BadAddress {
                input: text.to_string(),
                source,
            })
    }

    pub fn resolve<E: EntropySource + ?Sized>(
        &self,
        entropy: &mut E,
    ) -> Result<HardwareAddress, AppError> {
        match self {
            Target::Given(address) => Ok(*address),
            Target::Random => {
                let mut bytes = [0u8; ADDRESS_LEN];
                entropy.fill(&mut bytes)?;
                Ok(HardwareAddress::local_from_random(bytes))
            }
        }
    }
}

pub fn exit_code<T>(result: &Result<T, AppError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Prints the EEPROM dumps as the engine produces them
struct DumpPrinter<'o, O: Write> {
    out: &'o mut O,
    failed: Option<io::Error>,
}

impl<'o, O: Write> DumpPrinter<'o, O> {
    fn emit(&mut self, text: std::fmt::Arguments) {
        if self.failed.is_none() {
            if let Err(e) = self.out.write_fmt(text).and_then(|_| self.out.flush()) {
                self.failed = Some(e);
            }
        }
    }

    fn dump(&mut self, image: &EepromImage) {
        self.emit(format_args!("Current eeprom:\n{}", image));
    }
}

impl<'o, O: Write> Progress for DumpPrinter<'o, O> {
    fn baseline(&mut self, image: &EepromImage) {
        self.dump(image);
    }

    fn writing(&mut self) {
        self.emit(format_args!("Write...\n"));
    }

    fn confirmed(&mut self, image: &EepromImage) {
        self.dump(image);
    }
}

/// Report the current state, pick the address, then run the EEPROM cycle
pub fn provision<W, E, O>(
    settings: &Settings,
    window: &mut W,
    target: Target,
    entropy: &mut E,
    out: &mut O,
) -> Result<Programmed, AppError>
where
    W: RegisterWindow,
    E: EntropySource + ?Sized,
    O: Write,
{
    let csr = read_mac_address(window);
    writeln!(out, "Current mac registers: {:08x} {:08x}", csr.addrh, csr.addrl)?;
    writeln!(out, "Current mac address {}", csr.address())?;

    let (raw, status) = eeprom_status(&*window);
    writeln!(out, "Current status in E2P_CMD: {:08x}", raw)?;
    if settings.verbose {
        writeln!(out, "E2P_CMD decoded: {:?}", status)?;
    }

    let address = target.resolve(entropy)?;
    writeln!(out, "Writing mac address {}", address)?;

    let gpio = release_eeprom_pins(window);
    writeln!(out, "gpiocfg was {:08x}", gpio.before)?;
    writeln!(out, "gpiocfg  is {:08x}", gpio.after)?;
    out.flush()?;

    let mut printer = DumpPrinter { out, failed: None };
    let programmed = Eeprom::new(&mut *window).program_address(&address, &mut printer);
    if let Some(e) = printer.failed {
        return Err(e.into());
    }
    let programmed = programmed?;

    info!(
        "EEPROM now holds {} (magic {})",
        programmed.after.stored_address(),
        if programmed.after.has_magic() { "ok" } else { "missing" }
    );
    Ok(programmed)
}

#[cfg(test)]
mod provision_tests {
    use super::*;
    use newmac_core::sim::SimulatedController;

    struct Fixed([u8; ADDRESS_LEN]);

    impl EntropySource for Fixed {
        fn fill(&mut self, buf: &mut [u8]) -> newmac_devmem::Result<()> {
            buf.copy_from_slice(&self.0[..buf.len()]);
            Ok(())
        }
    }

    struct Broken;

    impl EntropySource for Broken {
        fn fill(&mut self, _buf: &mut [u8]) -> newmac_devmem::Result<()> {
            Err(HostError::Entropy {
                source: rand::Error::new(io::Error::from(io::ErrorKind::UnexpectedEof)),
            })
        }
    }

    const STUB: [u8; ADDRESS_LEN] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

    fn run(
        sim: &mut SimulatedController,
        target: Target,
        entropy: &mut dyn EntropySource,
    ) -> (Result<Programmed, AppError>, String) {
        let mut out = Vec::new();
        let result = provision(&Settings::default(), sim, target, entropy, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_explicit_address_end_to_end() {
        let mut sim = SimulatedController::new();
        sim.set_busy_polls(1);
        let target = Target::parse("02:00:00:00:00:01").unwrap();

        let (result, text) = run(&mut sim, target, &mut Fixed(STUB));
        let programmed = result.unwrap();

        assert_eq!(&programmed.after.cells[..7], &[0xa5, 0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
        assert!(text.contains("Writing mac address 02:00:00:00:00:01\n"));
        assert!(text.contains("Write...\n"));
        assert!(text.contains("a5 02 00 00 00 00 01 ff\n"));
        assert_eq!(text.matches("Current eeprom:\n").count(), 2);
        assert_eq!(sim.gpio_cfg(), 0);
    }

    #[test]
    fn test_random_address_end_to_end() {
        let mut sim = SimulatedController::new();

        let (result, text) = run(&mut sim, Target::Random, &mut Fixed(STUB));
        let programmed = result.unwrap();

        assert_eq!(&programmed.after.cells[..7], &[0xa5, 0x12, 0x22, 0x33, 0x44, 0x55, 0x66]);
        assert!(text.contains("Writing mac address 12:22:33:44:55:66\n"));
    }

    #[test]
    fn test_report_lines() {
        let mut sim = SimulatedController::new();
        sim.set_mac_address([0x02, 0x80, 0xe1, 0x00, 0x12, 0x34]);

        let (result, text) = run(&mut sim, Target::Random, &mut Fixed(STUB));
        assert!(result.is_ok());

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Current mac registers: 00003412 00e18002"));
        assert_eq!(lines.next(), Some("Current mac address 02:80:e1:00:12:34"));
        assert_eq!(lines.next(), Some("Current status in E2P_CMD: 00000000"));
        assert_eq!(lines.next(), Some("Writing mac address 12:22:33:44:55:66"));
        assert_eq!(lines.next(), Some("gpiocfg was 70700000"));
        assert_eq!(lines.next(), Some("gpiocfg  is 00000000"));
        assert_eq!(lines.next(), Some("Current eeprom:"));
        assert_eq!(lines.next(), Some("ff ff ff ff ff ff ff ff"));
    }

    #[test]
    fn test_missing_eeprom_is_fatal() {
        let mut sim = SimulatedController::absent();
        let target = Target::parse("02:00:00:00:00:01").unwrap();

        let (result, text) = run(&mut sim, target, &mut Fixed(STUB));

        assert!(matches!(result, Err(AppError::Eeprom(EepromError::Timeout { .. }))));
        assert_eq!(exit_code(&result), 1);
        assert_eq!(text.matches("Current eeprom:\n").count(), 1);
        assert!(!text.contains("Write..."));
        assert!(sim.cells().iter().all(|c| *c == 0xff));
    }

    #[test]
    fn test_entropy_failure_touches_nothing() {
        let mut sim = SimulatedController::new();

        let (result, text) = run(&mut sim, Target::Random, &mut Broken);

        assert!(matches!(result, Err(AppError::Host(HostError::Entropy { .. }))));
        assert_eq!(exit_code(&result), 1);
        assert!(!text.contains("Writing mac address"));
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_programming_twice_is_stable() {
        let mut sim = SimulatedController::new();
        let target = Target::parse("02:aa:bb:cc:dd:ee").unwrap();

        let first = run(&mut sim, target, &mut Fixed(STUB)).0.unwrap();
        let second = run(&mut sim, target, &mut Fixed(STUB)).0.unwrap();

        assert_eq!(&first.after.cells[..7], &second.after.cells[..7]);
        assert_eq!(exit_code(&Ok::<_, AppError>(second)), 0);
    }

    #[test]
    fn test_bad_address_message() {
        let err = Target::parse("02-00-00-00-00-01").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid mac address \"02-00-00-00-00-01\": expected 6 fields, found 1"
        );
    }
}
