//! Maps controller state to display text and indicator colors. Pure, the controller does the
//! I/O.

use alloc::string::String;
use core::fmt::Write;

use crate::datetime::DateTime;
use crate::peripherals::KEYPAD_KEYS;

/// Label shown for a selected slot without an account.
pub const EMPTY_LABEL: &str = "empty";

/// Text left on the display after shutdown.
pub const OFFLINE_TEXT: &str = "OFFLINE";

const AMBER: u32 = 0x202000;
const RED: u32 = 0x400000;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    #[default]
    Off,
    /// Selected key, slot holds an account.
    Configured,
    /// Selected key, slot is free.
    Empty,
}

impl Indicator {
    /// `None` means the pixel is switched off.
    pub const fn rgb(self) -> Option<u32> {
        match self {
            Indicator::Off => None,
            Indicator::Configured => Some(AMBER),
            Indicator::Empty => Some(RED),
        }
    }
}

/// Everything the projection looks at.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub awake: bool,
    pub time: DateTime,
    pub slot: Option<u8>,
    pub label: &'a str,
    pub code: &'a str,
    /// Whether each slot holds an account, index 0 is slot 1.
    pub configured: &'a [bool],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub text: String,
    pub indicators: [Indicator; KEYPAD_KEYS],
}

pub fn render(view: &View<'_>) -> Frame {
    let mut frame = Frame {
        text: String::new(),
        indicators: [Indicator::Off; KEYPAD_KEYS],
    };
    if !view.awake {
        return frame;
    }

    let _ = write!(frame.text, "{}\n{}\n", view.time.date(), view.time.time());
    match view.slot {
        Some(slot) => {
            let _ = write!(frame.text, "{} {}\n{}", slot, view.label, view.code);
        }
        None => {
            let _ = write!(frame.text, "\n{}", view.code);
        }
    }

    if let Some(slot) = view.slot {
        let key = slot as usize - 1;
        if key < KEYPAD_KEYS {
            frame.indicators[key] = match view.configured.get(key) {
                Some(true) => Indicator::Configured,
                _ => Indicator::Empty,
            };
        }
    }
    frame
}
