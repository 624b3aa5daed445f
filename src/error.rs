use thiserror::Error;

/// Errors that can occur while operating the account store or the device loop. Store errors
/// are detected before any byte is written. The collaborator variants carry no payload, the
/// underlying driver error is dropped in the same way flash errors are.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The first four bytes of the region do not carry the `TOTP` magic marker.
    #[error("store not formatted")]
    NotFormatted,

    /// Slots are numbered from 1 up to and including the configured capacity.
    #[error("slot {0} out of range")]
    SlotOutOfRange(u8),

    /// The operation needs an occupied slot.
    #[error("slot {0} not in use")]
    SlotNotInUse(u8),

    /// Labels are limited to 8 bytes of UTF-8.
    #[error("label too long")]
    LabelTooLong,

    /// The stored label bytes are not valid UTF-8.
    #[error("label malformed")]
    LabelMalformed,

    /// Secrets are limited to 32 raw bytes.
    #[error("secret too long")]
    SecretTooLong,

    /// The physical region reports a capacity other than 4096 bytes.
    #[error("region size mismatch: {0} bytes")]
    RegionSizeMismatch(usize),

    /// A calendar field is outside its valid range.
    #[error("invalid date or time")]
    InvalidDateTime,

    /// The internal error value is returned from the provided storage driver.
    #[error("internal storage error")]
    StorageError,

    #[error("clock error")]
    ClockError,

    #[error("input error")]
    InputError,

    #[error("display error")]
    DisplayError,

    #[error("indicator error")]
    IndicatorError,

    #[error("keystroke error")]
    KeystrokeError,

    #[error("code generation error")]
    CodeGenerationError,
}
