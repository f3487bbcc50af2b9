//! Command/data transports for SSD1306-class panels.
//!
//! Both variants expose the same three operations so the display driver never knows
//! which wiring it sits on.

use embedded_hal::{
    delay::DelayNs,
    digital::OutputPin,
    i2c::{I2c, Operation},
    spi::SpiBus,
};

use crate::error::HardwareError;

pub const DEFAULT_I2C_ADDRESS: u8 = 0x3C;

/// Co=1, D/C#=0
const I2C_COMMAND_PREFIX: u8 = 0x80;
/// Co=0, D/C#=1
const I2C_DATA_PREFIX: u8 = 0x40;

pub trait DisplayBus {
    fn write_command(&mut self, command: u8) -> Result<(), HardwareError>;

    fn write_data(&mut self, data: &[u8]) -> Result<(), HardwareError>;

    fn write_command_with_arg(&mut self, command: u8, arg: u8) -> Result<(), HardwareError> {
        self.write_command(command)?;
        self.write_command(arg)
    }
}

/// Two-wire transport addressing a fixed 7-bit device.
pub struct I2cDisplayBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cDisplayBus<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> DisplayBus for I2cDisplayBus<I2C> {
    fn write_command(&mut self, command: u8) -> Result<(), HardwareError> {
        self.i2c
            .write(self.address, &[I2C_COMMAND_PREFIX, command])
            .map_err(HardwareError::i2c)
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), HardwareError> {
        // Adjacent writes in one transaction go out back to back, no repeated start.
        self.i2c
            .transaction(
                self.address,
                &mut [Operation::Write(&[I2C_DATA_PREFIX]), Operation::Write(data)],
            )
            .map_err(HardwareError::i2c)
    }
}

/// Four-wire transport: SPI plus data/command, reset and chip-select lines.
pub struct SpiDisplayBus<SPI, DC, CS> {
    spi: SPI,
    dc: DC,
    cs: CS,
}

impl<SPI, DC, CS> SpiDisplayBus<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    /// Takes the pins, pulses reset and leaves the panel ready for its init sequence.
    pub fn new<RST, D>(
        spi: SPI,
        mut dc: DC,
        mut rst: RST,
        mut cs: CS,
        delay: &mut D,
    ) -> Result<Self, HardwareError>
    where
        RST: OutputPin,
        D: DelayNs,
    {
        dc.set_low().map_err(HardwareError::pin)?;
        cs.set_high().map_err(HardwareError::pin)?;

        rst.set_high().map_err(HardwareError::pin)?;
        delay.delay_ms(1);
        rst.set_low().map_err(HardwareError::pin)?;
        delay.delay_ms(10);
        rst.set_high().map_err(HardwareError::pin)?;

        Ok(Self { spi, dc, cs })
    }

    pub fn release(self) -> (SPI, DC, CS) {
        (self.spi, self.dc, self.cs)
    }

    fn transfer(&mut self, data_mode: bool, bytes: &[u8]) -> Result<(), HardwareError> {
        self.cs.set_high().map_err(HardwareError::pin)?;
        if data_mode {
            self.dc.set_high().map_err(HardwareError::pin)?;
        } else {
            self.dc.set_low().map_err(HardwareError::pin)?;
        }
        self.cs.set_low().map_err(HardwareError::pin)?;
        self.spi.write(bytes).map_err(HardwareError::spi)?;
        self.spi.flush().map_err(HardwareError::spi)?;
        self.cs.set_high().map_err(HardwareError::pin)
    }
}

impl<SPI, DC, CS> DisplayBus for SpiDisplayBus<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    fn write_command(&mut self, command: u8) -> Result<(), HardwareError> {
        self.transfer(false, &[command])
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), HardwareError> {
        self.transfer(true, data)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, convert::Infallible, rc::Rc};

    use embedded_hal::{digital, i2c, spi};
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Frame {
        Command(u8),
        Data(Vec<u8>),
    }

    /// Records every frame a display driver pushes, optionally failing on demand.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingBus {
        pub frames: Vec<Frame>,
        pub fail: bool,
    }

    impl RecordingBus {
        pub(crate) fn commands(&self) -> Vec<u8> {
            self.frames
                .iter()
                .filter_map(|frame| match frame {
                    Frame::Command(cmd) => Some(*cmd),
                    Frame::Data(_) => None,
                })
                .collect()
        }

        pub(crate) fn last_data(&self) -> Option<&[u8]> {
            self.frames.iter().rev().find_map(|frame| match frame {
                Frame::Data(data) => Some(data.as_slice()),
                Frame::Command(_) => None,
            })
        }
    }

    impl DisplayBus for RecordingBus {
        fn write_command(&mut self, command: u8) -> Result<(), HardwareError> {
            if self.fail {
                return Err(HardwareError::I2c(i2c::ErrorKind::Bus));
            }
            self.frames.push(Frame::Command(command));
            Ok(())
        }

        fn write_data(&mut self, data: &[u8]) -> Result<(), HardwareError> {
            if self.fail {
                return Err(HardwareError::I2c(i2c::ErrorKind::Bus));
            }
            self.frames.push(Frame::Data(data.to_vec()));
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct FakeI2c {
        writes: Vec<(u8, Vec<u8>)>,
        nack: bool,
    }

    impl i2c::ErrorType for FakeI2c {
        type Error = i2c::ErrorKind;
    }

    impl I2c for FakeI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.nack {
                return Err(i2c::ErrorKind::NoAcknowledge(
                    i2c::NoAcknowledgeSource::Address,
                ));
            }
            let mut bytes = Vec::new();
            for op in operations.iter() {
                if let Operation::Write(chunk) = op {
                    bytes.extend_from_slice(chunk);
                }
            }
            self.writes.push((address, bytes));
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Dc(bool),
        Cs(bool),
        Rst(bool),
        DelayMs(u32),
        Spi(Vec<u8>),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct Pin {
        log: Log,
        event: fn(bool) -> Event,
    }

    impl digital::ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.event)(false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.event)(true));
            Ok(())
        }
    }

    struct Spi {
        log: Log,
    }

    impl spi::ErrorType for Spi {
        type Error = Infallible;
    }

    impl SpiBus for Spi {
        fn read(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
            self.log.borrow_mut().push(Event::Spi(words.to_vec()));
            Ok(())
        }

        fn transfer(&mut self, _read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
            self.write(write)
        }

        fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct Delay {
        log: Log,
    }

    impl DelayNs for Delay {
        fn delay_ns(&mut self, ns: u32) {
            self.log.borrow_mut().push(Event::DelayMs(ns / 1_000_000));
        }

        fn delay_ms(&mut self, ms: u32) {
            self.log.borrow_mut().push(Event::DelayMs(ms));
        }
    }

    fn spi_bus(log: &Log) -> SpiDisplayBus<Spi, Pin, Pin> {
        let mut delay = Delay { log: log.clone() };
        SpiDisplayBus::new(
            Spi { log: log.clone() },
            Pin {
                log: log.clone(),
                event: Event::Dc,
            },
            Pin {
                log: log.clone(),
                event: Event::Rst,
            },
            Pin {
                log: log.clone(),
                event: Event::Cs,
            },
            &mut delay,
        )
        .unwrap()
    }

    #[test]
    fn i2c_prefixes_commands_and_data() {
        let mut bus = I2cDisplayBus::new(FakeI2c::default(), DEFAULT_I2C_ADDRESS);

        bus.write_command(0xAF).unwrap();
        bus.write_command_with_arg(0x81, 0x7F).unwrap();
        bus.write_data(&[1, 2, 3]).unwrap();

        let i2c = bus.release();
        assert_eq!(
            i2c.writes,
            vec![
                (0x3C, vec![0x80, 0xAF]),
                (0x3C, vec![0x80, 0x81]),
                (0x3C, vec![0x80, 0x7F]),
                (0x3C, vec![0x40, 1, 2, 3]),
            ]
        );
    }

    #[test]
    fn i2c_nack_surfaces_as_hardware_error() {
        let mut bus = I2cDisplayBus::new(
            FakeI2c {
                nack: true,
                ..FakeI2c::default()
            },
            DEFAULT_I2C_ADDRESS,
        );

        assert_eq!(
            bus.write_command(0xAE),
            Err(HardwareError::I2c(i2c::ErrorKind::NoAcknowledge(
                i2c::NoAcknowledgeSource::Address
            )))
        );
    }

    #[test]
    fn spi_pulses_reset_before_first_use() {
        let log = Log::default();
        let _bus = spi_bus(&log);

        assert_eq!(
            *log.borrow(),
            vec![
                Event::Dc(false),
                Event::Cs(true),
                Event::Rst(true),
                Event::DelayMs(1),
                Event::Rst(false),
                Event::DelayMs(10),
                Event::Rst(true),
            ]
        );
    }

    #[test]
    fn spi_frames_each_transfer_with_dc_and_cs() {
        let log = Log::default();
        let mut bus = spi_bus(&log);
        log.borrow_mut().clear();

        bus.write_command(0xAE).unwrap();
        bus.write_data(&[0xFF, 0x00]).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                Event::Cs(true),
                Event::Dc(false),
                Event::Cs(false),
                Event::Spi(vec![0xAE]),
                Event::Cs(true),
                Event::Cs(true),
                Event::Dc(true),
                Event::Cs(false),
                Event::Spi(vec![0xFF, 0x00]),
                Event::Cs(true),
            ]
        );
    }
}
