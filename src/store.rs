use alloc::vec::Vec;
#[cfg(feature = "defmt")]
use defmt::trace;

use crate::error::Error;
use crate::platform::{EEPROM_PAGE_SIZE, PagedOps, Platform};
use crate::raw::{
    self, HEADER_SIZE, MAGIC, REGION_SIZE, RECORD_SIZE, RawRecord, SlotCapacity, SlotMarker,
};
use crate::record::{AccountRecord, Label, Secret};

/// Slot based account database on a 4 KiB EEPROM.
///
/// Every operation except [`AccountStore::format`] checks for the magic marker first. Argument
/// validation happens before the first byte is written, so a rejected call leaves the region
/// untouched. There are no retries, storage driver failures surface as [`Error::StorageError`].
pub struct AccountStore<T: Platform> {
    pub(crate) hal: T,
    pub(crate) capacity: SlotCapacity,
}

impl<T: Platform> AccountStore<T> {
    pub fn new(hal: T, capacity: SlotCapacity) -> Self {
        Self { hal, capacity }
    }

    pub fn capacity(&self) -> SlotCapacity {
        self.capacity
    }

    /// Access to the underlying storage driver.
    pub fn storage(&self) -> &T {
        &self.hal
    }

    /// Returns the storage driver, e.g. to write an image back to disk.
    pub fn release(self) -> T {
        self.hal
    }

    /// Writes the header and zero-fills every record page. Destroys all accounts, the caller
    /// is responsible for obtaining confirmation first.
    pub fn format(&mut self) -> Result<(), Error> {
        let size = self.hal.capacity();
        if size != REGION_SIZE {
            return Err(Error::RegionSizeMismatch(size));
        }

        #[cfg(feature = "defmt")]
        trace!("format: {} bytes", size);

        #[cfg(feature = "debug-logs")]
        println!("  AccountStore: format");

        let mut header = [0u8; HEADER_SIZE];
        header[..MAGIC.len()].copy_from_slice(&MAGIC);
        self.hal.write_region(0, &header)?;

        let blank_page = [0u8; EEPROM_PAGE_SIZE];
        for offset in (HEADER_SIZE..REGION_SIZE).step_by(EEPROM_PAGE_SIZE) {
            self.hal.write_region(offset, &blank_page)?;
        }
        Ok(())
    }

    /// True iff the region starts with the magic marker.
    pub fn is_formatted(&mut self) -> Result<bool, Error> {
        let mut magic = [0u8; MAGIC.len()];
        self.hal.read_region(0, &mut magic)?;
        Ok(magic == MAGIC)
    }

    pub fn slot_in_use(&mut self, slot: u8) -> Result<bool, Error> {
        self.check_formatted()?;
        self.check_slot(slot)?;
        self.read_marker(slot)
    }

    /// Loads an occupied slot. The label is trimmed, the secret keeps its zero padding.
    pub fn load(&mut self, slot: u8) -> Result<AccountRecord, Error> {
        self.check_formatted()?;
        self.check_slot(slot)?;
        if !self.read_marker(slot)? {
            return Err(Error::SlotNotInUse(slot));
        }

        let record = self.read_record(slot)?;
        Ok(AccountRecord {
            slot,
            label: Label::from_raw(record.label)?,
            secret: Secret::from_raw(record.secret),
        })
    }

    /// Writes label and secret into `slot` and marks it in use afterwards. An occupied slot is
    /// overwritten without asking.
    ///
    /// A power loss between the record write and the marker update leaves the slot free with
    /// stale bytes. There is no journal to recover from that.
    pub fn write(&mut self, slot: u8, label: &str, secret: &[u8]) -> Result<(), Error> {
        let label = Label::new(label)?;
        let secret = Secret::new(secret)?;
        self.check_formatted()?;
        self.check_slot(slot)?;

        #[cfg(feature = "defmt")]
        trace!("write: slot {} label {}", slot, label.as_str());

        #[cfg(feature = "debug-logs")]
        println!("  AccountStore: write slot {slot} {label:?}");

        let record = RawRecord {
            label: *label.as_bytes(),
            reserved: [0; raw::RESERVED_SIZE],
            secret: *secret.as_bytes(),
        };
        self.write_record(slot, &record)?;
        self.write_marker(slot, SlotMarker::InUse)
    }

    /// Zero-fills the record and clears the marker. Erasing a free slot is fine.
    pub fn erase(&mut self, slot: u8) -> Result<(), Error> {
        self.check_formatted()?;
        self.check_slot(slot)?;

        #[cfg(feature = "defmt")]
        trace!("erase: slot {}", slot);

        #[cfg(feature = "debug-logs")]
        println!("  AccountStore: erase slot {slot}");

        self.write_record(slot, &RawRecord::empty())?;
        self.write_marker(slot, SlotMarker::Free)
    }

    /// Duplicates the raw record of `src` into `dst` and marks `dst` in use. Overwriting an
    /// occupied `dst` has to be confirmed by the caller.
    pub fn copy(&mut self, src: u8, dst: u8) -> Result<(), Error> {
        self.check_formatted()?;
        self.check_slot(src)?;
        if !self.read_marker(src)? {
            return Err(Error::SlotNotInUse(src));
        }
        self.check_slot(dst)?;

        #[cfg(feature = "defmt")]
        trace!("copy: slot {} -> slot {}", src, dst);

        #[cfg(feature = "debug-logs")]
        println!("  AccountStore: copy slot {src} -> {dst}");

        let record = self.read_record(src)?;
        self.write_record(dst, &record)?;
        self.write_marker(dst, SlotMarker::InUse)
    }

    /// Scans every slot. Free slots yield `None`, a slot that fails to load yields its error.
    pub fn accounts(&mut self) -> Result<Vec<Result<Option<AccountRecord>, Error>>, Error> {
        self.check_formatted()?;
        let accounts = (1..=self.capacity.slots())
            .map(|slot| match self.load(slot) {
                Ok(record) => Ok(Some(record)),
                Err(Error::SlotNotInUse(_)) => Ok(None),
                Err(e) => Err(e),
            })
            .collect();
        Ok(accounts)
    }

    fn check_formatted(&mut self) -> Result<(), Error> {
        if self.is_formatted()? {
            Ok(())
        } else {
            Err(Error::NotFormatted)
        }
    }

    fn check_slot(&self, slot: u8) -> Result<(), Error> {
        if self.capacity.contains(slot) {
            Ok(())
        } else {
            Err(Error::SlotOutOfRange(slot))
        }
    }

    fn read_marker(&mut self, slot: u8) -> Result<bool, Error> {
        let mut marker = [0u8; 1];
        self.hal.read_region(raw::marker_offset(slot), &mut marker)?;
        // anything but 0xFF counts as free
        Ok(SlotMarker::from_repr(marker[0]) == Some(SlotMarker::InUse))
    }

    fn write_marker(&mut self, slot: u8, marker: SlotMarker) -> Result<(), Error> {
        self.hal
            .write_region(raw::marker_offset(slot), &[marker as u8])
    }

    fn read_record(&mut self, slot: u8) -> Result<RawRecord, Error> {
        let mut buf = [0u8; RECORD_SIZE];
        self.hal.read_region(raw::record_offset(slot), &mut buf)?;
        Ok(RawRecord::from_bytes(&buf))
    }

    fn write_record(&mut self, slot: u8, record: &RawRecord) -> Result<(), Error> {
        self.hal
            .write_region(raw::record_offset(slot), &record.to_bytes())
    }
}
