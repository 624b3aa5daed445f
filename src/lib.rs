#![doc = include_str ! ("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod config;
pub mod controller;
pub mod datetime;
pub mod error;
pub mod input;
pub mod maintenance;
pub mod peripherals;
pub mod platform;
pub mod presentation;
mod raw;
pub mod record;
pub mod scheduler;
pub mod store;

extern crate alloc;

pub use config::Config;
pub use controller::{Account, CodeView, Controller, DisplaySession, Power};
pub use datetime::DateTime;
pub use error::Error;
pub use input::{ButtonsAndProximity, EdgeDetector, Event, InputSet, InputSource, Keypad};
pub use peripherals::{
    Board, Button, Clock, CodeGenerator, Devices, Display, Indicators, KeypadDriver, Keystrokes,
    NoIndicators, NoKeystrokes, ProximitySensor, Ticker,
};
pub use raw::{LABEL_SIZE, SECRET_SIZE, SlotCapacity};
pub use record::{AccountRecord, Label, Secret};
pub use scheduler::Scheduler;
pub use store::AccountStore;

/// Size of the EEPROM region the store expects, in bytes.
pub const REGION_SIZE: usize = raw::REGION_SIZE;
