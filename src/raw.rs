//! On-EEPROM byte layout.
//!
//! ```text
//! 0x000  "TOTP"                 magic marker
//! 0x004  [u8; capacity]         in-use markers, 0xFF = in use, 0x00 = free
//! ....   zero                   reserved up to 0x020
//! 0x020  slot 1 record          64 bytes
//! 0x060  slot 2 record          64 bytes
//! ...
//! ```
//!
//! A record is an 8 byte null padded label, 24 reserved zero bytes and a 32 byte null padded
//! raw secret.

use core::mem::size_of;

pub(crate) const REGION_SIZE: usize = 4096;
pub(crate) const MAGIC: [u8; 4] = *b"TOTP";
pub(crate) const HEADER_SIZE: usize = 32;
pub(crate) const MARKER_OFFSET: usize = MAGIC.len();

pub const LABEL_SIZE: usize = 8;
pub(crate) const RESERVED_SIZE: usize = 24;
pub const SECRET_SIZE: usize = 32;
pub(crate) const RECORD_SIZE: usize = LABEL_SIZE + RESERVED_SIZE + SECRET_SIZE;

/// Largest capacity any deployment uses.
const MAX_SLOTS: usize = 15;

const _: () = assert!(
    size_of::<RawRecord>() == RECORD_SIZE,
    "Record structure size must equal the slot size"
);

const _: () = assert!(
    MARKER_OFFSET + MAX_SLOTS <= HEADER_SIZE,
    "In-use markers must fit into the header"
);

const _: () = assert!(
    HEADER_SIZE + MAX_SLOTS * RECORD_SIZE <= REGION_SIZE,
    "All slots must fit into the region"
);

/// Number of account slots of a deployment. The marker of slot `n` lives at header byte
/// `4 + (n - 1)`, so the four slot variant uses exactly the 4 byte bitmap while the fifteen
/// slot variant extends it into the reserved header bytes.
#[derive(strum::FromRepr, strum::Display, Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SlotCapacity {
    #[default]
    Four = 4,
    Fifteen = 15,
}

impl SlotCapacity {
    pub const fn slots(self) -> u8 {
        self as u8
    }

    pub const fn contains(self, slot: u8) -> bool {
        slot >= 1 && slot <= self.slots()
    }
}

#[derive(strum::FromRepr, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub(crate) enum SlotMarker {
    Free = 0x00,
    InUse = 0xFF,
}

#[repr(C)]
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) struct RawRecord {
    pub(crate) label: [u8; LABEL_SIZE],
    pub(crate) reserved: [u8; RESERVED_SIZE],
    pub(crate) secret: [u8; SECRET_SIZE],
}

impl RawRecord {
    pub(crate) const fn empty() -> Self {
        Self {
            label: [0; LABEL_SIZE],
            reserved: [0; RESERVED_SIZE],
            secret: [0; SECRET_SIZE],
        }
    }

    pub(crate) fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut raw = [0u8; RECORD_SIZE];
        raw[..LABEL_SIZE].copy_from_slice(&self.label);
        raw[LABEL_SIZE..LABEL_SIZE + RESERVED_SIZE].copy_from_slice(&self.reserved);
        raw[LABEL_SIZE + RESERVED_SIZE..].copy_from_slice(&self.secret);
        raw
    }

    pub(crate) fn from_bytes(raw: &[u8; RECORD_SIZE]) -> Self {
        let mut record = Self::empty();
        record.label.copy_from_slice(&raw[..LABEL_SIZE]);
        record
            .reserved
            .copy_from_slice(&raw[LABEL_SIZE..LABEL_SIZE + RESERVED_SIZE]);
        record
            .secret
            .copy_from_slice(&raw[LABEL_SIZE + RESERVED_SIZE..]);
        record
    }
}

/// Callers have validated `slot` against the capacity.
pub(crate) const fn record_offset(slot: u8) -> usize {
    HEADER_SIZE + (slot as usize - 1) * RECORD_SIZE
}

pub(crate) const fn marker_offset(slot: u8) -> usize {
    MARKER_OFFSET + (slot as usize - 1)
}
