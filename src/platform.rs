use embedded_storage::Storage;

use crate::error::Error;

/// Byte addressable non-volatile memory, e.g. a 24LC32 I2C EEPROM. Any
/// `embedded_storage::Storage` implementation qualifies.
pub trait Platform: Storage {}

impl<T: Storage> Platform for T {}

/// Write page size of the 24LCxx family. A single bus write must not cross a page boundary,
/// otherwise the chip wraps around to the start of the page.
pub const EEPROM_PAGE_SIZE: usize = 32;

pub trait PagedOps: Platform {
    fn read_region(&mut self, offset: usize, bytes: &mut [u8]) -> Result<(), Error> {
        self.read(offset as u32, bytes)
            .map_err(|_| Error::StorageError)
    }

    /// Writes `bytes` at `offset`, split into chunks that never straddle an EEPROM page.
    fn write_region(&mut self, offset: usize, bytes: &[u8]) -> Result<(), Error> {
        let mut written = 0;
        while written < bytes.len() {
            let address = offset + written;
            let page_end = page_floor(address) + EEPROM_PAGE_SIZE;
            let chunk = (page_end - address).min(bytes.len() - written);
            self.write(address as u32, &bytes[written..written + chunk])
                .map_err(|_| Error::StorageError)?;
            written += chunk;
        }
        Ok(())
    }
}

#[inline(always)]
const fn page_floor(address: usize) -> usize {
    address & !(EEPROM_PAGE_SIZE - 1)
}

impl<T: Platform> PagedOps for T {}
