use std::fs;
use std::path::{Path, PathBuf};

use embedded_storage::{ReadStorage, Storage};
use totp_keeper::{AccountStore, REGION_SIZE, SlotCapacity};

use crate::error::Error;

/// In-memory copy of the EEPROM contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EepromImage {
    bytes: Vec<u8>,
}

/// Access past the end of the image.
#[derive(Debug, PartialEq, Eq)]
pub struct OutOfBounds;

impl EepromImage {
    /// Factory state of the chip: every byte `0xFF`.
    pub fn blank() -> Self {
        Self {
            bytes: vec![0xFF; REGION_SIZE],
        }
    }

    /// Takes the bytes as they are. A size other than [`REGION_SIZE`] is reported by the store.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Ok(Self::from_bytes(fs::read(path)?))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        fs::write(path, &self.bytes)?;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl ReadStorage for EepromImage {
    type Error = OutOfBounds;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        let src = self
            .bytes
            .get(offset..offset + bytes.len())
            .ok_or(OutOfBounds)?;
        bytes.copy_from_slice(src);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

impl Storage for EepromImage {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        let dst = self
            .bytes
            .get_mut(offset..offset + bytes.len())
            .ok_or(OutOfBounds)?;
        dst.copy_from_slice(bytes);
        Ok(())
    }
}

/// An account store backed by an image file. Changes reach the file on [`ImageFile::save`].
pub struct ImageFile {
    path: PathBuf,
    store: AccountStore<EepromImage>,
}

impl ImageFile {
    /// Opens an existing image.
    pub fn open<P: AsRef<Path>>(path: P, capacity: SlotCapacity) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let image = EepromImage::open(&path)?;
        Ok(Self {
            path,
            store: AccountStore::new(image, capacity),
        })
    }

    /// Opens an existing image or starts from a blank one if the file does not exist yet.
    pub fn open_or_blank<P: AsRef<Path>>(path: P, capacity: SlotCapacity) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let image = if path.exists() {
            EepromImage::open(&path)?
        } else {
            EepromImage::blank()
        };
        Ok(Self {
            path,
            store: AccountStore::new(image, capacity),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&mut self) -> &mut AccountStore<EepromImage> {
        &mut self.store
    }

    pub fn save(self) -> Result<(), Error> {
        let image = self.store.release();
        image.save(&self.path)
    }
}
