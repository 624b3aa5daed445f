//! Narrow interfaces to the chips and stacks around the core. Drivers are polled, nothing is
//! pushed. Every method is blocking; only [`CodeGenerator::generate`] is allowed to take long.

use alloc::string::String;

use crate::datetime::DateTime;

/// Number of keys (and indicators) on the keypad variant.
pub const KEYPAD_KEYS: usize = 4;

/// Real-time clock. The run loop only reads, [`Clock::set`] is for the maintenance procedure.
pub trait Clock {
    type Error;

    fn now(&mut self) -> Result<DateTime, Self::Error>;

    fn set(&mut self, datetime: DateTime) -> Result<(), Self::Error>;
}

/// A single push button, `true` while held down regardless of the pin polarity.
pub trait Button {
    type Error;

    fn is_pressed(&mut self) -> Result<bool, Self::Error>;
}

pub trait ProximitySensor {
    type Error;

    /// Raw reading, larger means closer.
    fn proximity(&mut self) -> Result<u8, Self::Error>;
}

pub trait KeypadDriver {
    type Error;

    fn keys(&mut self) -> Result<[bool; KEYPAD_KEYS], Self::Error>;
}

/// Text display without auto refresh, plus its backlight.
pub trait Display {
    type Error;

    fn set_text(&mut self, text: &str) -> Result<(), Self::Error>;

    fn refresh(&mut self) -> Result<(), Self::Error>;

    fn set_backlight(&mut self, on: bool) -> Result<(), Self::Error>;

    /// Gives up exclusive use of the display hardware.
    fn release(&mut self) -> Result<(), Self::Error>;
}

/// One RGB indicator per keypad key.
pub trait Indicators {
    type Error;

    fn set_color(&mut self, key: usize, rgb: u32) -> Result<(), Self::Error>;

    fn set_off(&mut self, key: usize) -> Result<(), Self::Error>;
}

/// Wireless keyboard (BLE HID) used to type codes.
pub trait Keystrokes {
    type Error;

    fn advertise(&mut self) -> Result<(), Self::Error>;

    fn connected(&mut self) -> Result<bool, Self::Error>;

    fn send(&mut self, text: &str) -> Result<(), Self::Error>;
}

/// TOTP code generation. On small boards with a software SHA1 a call takes about two seconds
/// and stalls input polling for that long.
pub trait CodeGenerator {
    type Error;

    /// Returns the zero padded `digits` wide code for the period containing `unix_time`.
    fn generate(
        &mut self,
        secret_base32: &str,
        unix_time: u64,
        digits: u8,
        period: u32,
    ) -> Result<String, Self::Error>;
}

/// Monotonic milliseconds and blocking delays. The delay is the single cooperative yield point
/// of the run loop, board support code may run background housekeeping inside it.
pub trait Ticker {
    fn millis(&mut self) -> u64;

    fn delay_ms(&mut self, ms: u32);
}

/// Stand-in for boards without indicators.
pub struct NoIndicators;

impl Indicators for NoIndicators {
    type Error = core::convert::Infallible;

    fn set_color(&mut self, _key: usize, _rgb: u32) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_off(&mut self, _key: usize) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Stand-in for builds without a keystroke injector.
pub struct NoKeystrokes;

impl Keystrokes for NoKeystrokes {
    type Error = core::convert::Infallible;

    fn advertise(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn connected(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn send(&mut self, _text: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Bundles the concrete driver types of a board.
pub trait Board {
    type Storage: crate::platform::Platform;
    type Clock: Clock;
    type Input: crate::input::InputSource;
    type Display: Display;
    type Indicators: Indicators;
    type Keystrokes: Keystrokes;
    type Generator: CodeGenerator;
}

/// The driver instances handed to [`crate::Controller::new`].
pub struct Devices<B: Board> {
    pub storage: B::Storage,
    pub clock: B::Clock,
    pub input: B::Input,
    pub display: B::Display,
    pub indicators: B::Indicators,
    pub keystrokes: B::Keystrokes,
    pub generator: B::Generator,
}
