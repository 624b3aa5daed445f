//! Host side maintenance of totp-keeper EEPROM images: format, add, erase, copy and list
//! accounts, and compute the code an account shows at a given time.

pub mod error;
pub mod image;
pub mod otp;

pub use error::Error;
pub use image::{EepromImage, ImageFile};
pub use otp::{HmacSha1Generator, decode_secret, secret_from_uri, totp};

use totp_keeper::maintenance::Outcome;
use totp_keeper::platform::Platform;
use totp_keeper::{AccountStore, CodeGenerator, Config, Label, SlotCapacity};

/// Maps a slot count given on the command line to a layout.
pub fn capacity_from_count(slots: u8) -> Result<SlotCapacity, Error> {
    SlotCapacity::from_repr(slots).ok_or(Error::InvalidSlotCount(slots))
}

/// Turns a declined confirmation into [`Error::Canceled`].
pub fn completed(outcome: Outcome) -> Result<(), Error> {
    match outcome {
        Outcome::Done => Ok(()),
        Outcome::Canceled => Err(Error::Canceled),
    }
}

/// Label and code of `slot` at `unix_time`, computed the way the device does.
pub fn code_for_slot<T: Platform>(
    store: &mut AccountStore<T>,
    slot: u8,
    unix_time: u64,
    config: &Config,
) -> Result<(Label, String), Error> {
    let record = store.load(slot)?;
    let code = HmacSha1Generator.generate(
        &record.secret.to_base32(),
        unix_time,
        config.digits,
        config.period,
    )?;
    Ok((record.label, code))
}
