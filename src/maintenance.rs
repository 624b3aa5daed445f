//! Operator procedures over the account store and the clock: format, add, copy, erase, list
//! and clock setting. These run offline, outside of the device loop. Destructive steps ask a
//! [`Confirm`] implementation first and do nothing when declined.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::datetime::DateTime;
use crate::error::Error;
use crate::peripherals::Clock;
use crate::platform::Platform;
use crate::record::{Label, Secret};
use crate::store::AccountStore;

pub const CONFIRM_FORMAT: &str = "Are you sure? This will erase all data.";
pub const CONFIRM_OVERWRITE: &str = "Slot is in use. Overwrite?";

/// Yes/no question to the operator.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, question: &str) -> bool {
        self(question)
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Done,
    Canceled,
}

/// One line of the account listing.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct SlotSummary {
    pub slot: u8,
    pub label: Option<Label>,
}

impl fmt::Display for SlotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "Slot {}: '{}'", self.slot, label),
            None => write!(f, "Slot {}: -- empty --", self.slot),
        }
    }
}

pub fn format<T: Platform>(
    store: &mut AccountStore<T>,
    confirm: &mut impl Confirm,
) -> Result<Outcome, Error> {
    if !confirm.confirm(CONFIRM_FORMAT) {
        return Ok(Outcome::Canceled);
    }
    store.format()?;
    Ok(Outcome::Done)
}

/// Stores an account, asking before an occupied slot is overwritten. Label and secret are
/// checked before the question is asked.
pub fn add_account<T: Platform>(
    store: &mut AccountStore<T>,
    slot: u8,
    label: &str,
    secret: &[u8],
    confirm: &mut impl Confirm,
) -> Result<Outcome, Error> {
    Label::new(label)?;
    Secret::new(secret)?;
    if store.slot_in_use(slot)? && !confirm.confirm(CONFIRM_OVERWRITE) {
        return Ok(Outcome::Canceled);
    }
    store.write(slot, label, secret)?;
    Ok(Outcome::Done)
}

pub fn copy_account<T: Platform>(
    store: &mut AccountStore<T>,
    src: u8,
    dst: u8,
    confirm: &mut impl Confirm,
) -> Result<Outcome, Error> {
    if !store.slot_in_use(src)? {
        return Err(Error::SlotNotInUse(src));
    }
    if store.slot_in_use(dst)? && !confirm.confirm(CONFIRM_OVERWRITE) {
        return Ok(Outcome::Canceled);
    }
    store.copy(src, dst)?;
    Ok(Outcome::Done)
}

pub fn erase_account<T: Platform>(store: &mut AccountStore<T>, slot: u8) -> Result<(), Error> {
    store.erase(slot)
}

pub fn list_accounts<T: Platform>(store: &mut AccountStore<T>) -> Result<Vec<SlotSummary>, Error> {
    let mut summaries = Vec::new();
    for slot in 1..=store.capacity().slots() {
        let label = match store.load(slot) {
            Ok(record) => Some(record.label),
            Err(Error::SlotNotInUse(_)) => None,
            Err(e) => return Err(e),
        };
        summaries.push(SlotSummary { slot, label });
    }
    Ok(summaries)
}

/// Validates and writes `datetime`, then returns what the clock reads back.
pub fn set_clock<C: Clock>(clock: &mut C, datetime: DateTime) -> Result<DateTime, Error> {
    datetime.validate()?;
    clock.set(datetime).map_err(|_| Error::ClockError)?;
    clock.now().map_err(|_| Error::ClockError)
}

/// Current clock reading as `YYYY-MM-DD HH:MM:SS`.
pub fn clock_text<C: Clock>(clock: &mut C) -> Result<String, Error> {
    let now = clock.now().map_err(|_| Error::ClockError)?;
    Ok(now.to_string())
}
