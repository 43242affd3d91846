use embedded_hal::i2c::{Error as _, ErrorKind};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::config::EepromConfig;
use crate::logbook::{LogRecord, LogStore, RECORD_LEN, Slot};

/// Largest page the write path can frame in one bus transaction
pub const MAX_PAGE_SIZE: usize = 64;

/// 24Cxx EEPROM driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogError<E> {
    /// Bus transaction failed
    Bus(E),
    /// Request runs past the end of the device
    OutOfRange { address: u16, len: usize },
}

impl<E: embedded_hal::i2c::Error> LogError<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LogError::Bus(e) => e.kind(),
            LogError::OutOfRange { .. } => ErrorKind::Other,
        }
    }
}

/// Byte-addressed 24Cxx EEPROM on an I2C bus with 2-byte memory addresses.
///
/// Every operation is a sequence of bus phases: the memory address (plus
/// payload when writing) goes out first, and a read is a second transaction
/// that clocks the data back. Each phase is followed by the device's settle
/// delay. Failures are returned as-is and never retried here.
///
/// # Type parameters
/// - `I2C`: async bus implementing `embedded_hal_async::i2c::I2c`
/// - `D`: async delay used for the write-cycle settle time
pub struct Eeprom24x<I2C, D> {
    bus: I2C,
    delay: D,
    config: EepromConfig,
}

impl<I2C, D, E> Eeprom24x<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    pub fn new(bus: I2C, delay: D, config: EepromConfig) -> Self {
        Self { bus, delay, config }
    }

    pub fn config(&self) -> &EepromConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn bus_mut(&mut self) -> &mut I2C {
        &mut self.bus
    }

    /// Give the bus and delay back.
    pub fn release(self) -> (I2C, D) {
        (self.bus, self.delay)
    }

    /// Write `data` starting at memory `address`.
    ///
    /// The payload is split at page boundaries; the device would otherwise
    /// wrap around inside the page it started in.
    pub async fn write_bytes(&mut self, address: u16, data: &[u8]) -> Result<(), LogError<E>> {
        self.check_range(address, data.len())?;

        let page = usize::from(self.config.page_size).clamp(1, MAX_PAGE_SIZE);
        let mut offset = 0;
        while offset < data.len() {
            let at = usize::from(address) + offset;
            let room = page - at % page;
            let chunk = &data[offset..data.len().min(offset + room)];

            let mut frame: heapless::Vec<u8, { MAX_PAGE_SIZE + 2 }> = heapless::Vec::new();
            // at < capacity <= u16::MAX was checked above
            let _ = frame.extend_from_slice(&(at as u16).to_be_bytes());
            let _ = frame.extend_from_slice(chunk);

            self.bus
                .write(self.config.address, &frame)
                .await
                .map_err(LogError::Bus)?;
            self.settle().await;

            offset += chunk.len();
        }
        Ok(())
    }

    /// Fill `buf` from memory starting at `address`.
    pub async fn read_bytes(&mut self, address: u16, buf: &mut [u8]) -> Result<(), LogError<E>> {
        self.check_range(address, buf.len())?;

        self.bus
            .write(self.config.address, &address.to_be_bytes())
            .await
            .map_err(LogError::Bus)?;
        self.settle().await;

        self.bus
            .read(self.config.address, buf)
            .await
            .map_err(LogError::Bus)?;
        self.settle().await;

        Ok(())
    }

    async fn settle(&mut self) {
        self.delay.delay_ms(self.config.settle_ms).await;
    }

    fn check_range(&self, address: u16, len: usize) -> Result<(), LogError<E>> {
        if usize::from(address) + len > usize::from(self.config.capacity) {
            return Err(LogError::OutOfRange { address, len });
        }
        Ok(())
    }
}

impl<I2C, D, E> LogStore for Eeprom24x<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    type Error = LogError<E>;

    async fn read(&mut self, slot: Slot) -> Result<LogRecord, Self::Error> {
        let mut bytes = [0; RECORD_LEN];
        self.read_bytes(slot.address(), &mut bytes).await?;
        Ok(LogRecord::from_bytes(bytes))
    }

    async fn write(&mut self, slot: Slot, record: &LogRecord) -> Result<(), Self::Error> {
        self.write_bytes(slot.address(), record.as_bytes()).await
    }
}
