#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_storage::{ReadStorage, Storage};
use totp_keeper::input::{ButtonsAndProximity, Keypad};
use totp_keeper::peripherals::{
    Board, Button, Clock, CodeGenerator, Devices, Display, Indicators, KEYPAD_KEYS, KeypadDriver,
    Keystrokes, ProximitySensor, Ticker,
};
use totp_keeper::{AccountStore, Config, DateTime, SlotCapacity};

pub const REGION_SIZE: usize = 4096;
pub const PAGE_SIZE: usize = 32;
pub const HEADER_SIZE: usize = 32;
pub const RECORD_SIZE: usize = 64;

pub fn record_range(slot: u8) -> std::ops::Range<usize> {
    let start = HEADER_SIZE + (slot as usize - 1) * RECORD_SIZE;
    start..start + RECORD_SIZE
}

pub fn marker(slot: u8) -> usize {
    4 + slot as usize - 1
}

#[derive(Default)]
pub struct Eeprom {
    pub buf: Vec<u8>,
    pub fail_after_operation: usize,
    pub operations: Vec<Operation>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Read { offset: u32, len: usize },
    Write { offset: u32, len: usize },
}

impl Eeprom {
    /// A factory fresh chip reads as 0xFF everywhere.
    pub fn new() -> Self {
        Self::with_size(REGION_SIZE)
    }

    pub fn with_size(size: usize) -> Self {
        Self {
            buf: vec![0xffu8; size],
            fail_after_operation: usize::MAX,
            ..Default::default()
        }
    }

    pub fn new_with_fault(fail_after_operation: usize) -> Self {
        Self {
            fail_after_operation,
            ..Self::new()
        }
    }

    /// Formatted image with the given accounts.
    pub fn with_accounts(capacity: SlotCapacity, accounts: &[(u8, &str, &[u8])]) -> Self {
        let mut store = AccountStore::new(Self::new(), capacity);
        store.format().unwrap();
        for &(slot, label, secret) in accounts {
            store.write(slot, label, secret).unwrap();
        }
        let mut eeprom = store.release();
        eeprom.operations.clear();
        eeprom
    }

    pub fn disable_faults(&mut self) {
        self.fail_after_operation = usize::MAX;
    }

    /// Makes the next `n` operations succeed and fails everything after.
    pub fn fail_after(&mut self, n: usize) {
        self.fail_after_operation = self.operations.len() + n;
    }

    pub fn writes(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Write { .. }))
            .count()
    }

    pub fn dump_operations(&self) {
        println!("Operations:");
        for op in &self.operations {
            println!("  {:?}", op);
        }
    }
}

#[derive(Debug)]
pub struct EepromError;

impl ReadStorage for Eeprom {
    type Error = EepromError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: read:  0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        self.operations.push(Operation::Read {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Storage for Eeprom {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: write: 0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        assert!(!bytes.is_empty());
        // the chip wraps around inside a page instead of crossing into the next one
        let offset = offset as usize;
        assert_eq!(
            offset / PAGE_SIZE,
            (offset + bytes.len() - 1) / PAGE_SIZE,
            "write crosses a page boundary"
        );

        self.operations.push(Operation::Write {
            offset: offset as u32,
            len: bytes.len(),
        });
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// A value that changes over simulated time.
#[derive(Clone)]
pub struct Signal<T: Copy> {
    elapsed: Rc<Cell<u64>>,
    changes: Rc<RefCell<Vec<(u64, T)>>>,
}

impl<T: Copy> Signal<T> {
    fn new(elapsed: Rc<Cell<u64>>, initial: T) -> Self {
        Self {
            elapsed,
            changes: Rc::new(RefCell::new(vec![(0, initial)])),
        }
    }

    /// Changes the value from now on.
    pub fn set(&self, value: T) {
        self.at(self.elapsed.get(), value);
    }

    /// Changes the value at `ms` of simulated time.
    pub fn at(&self, ms: u64, value: T) {
        let mut changes = self.changes.borrow_mut();
        let index = changes.partition_point(|&(t, _)| t <= ms);
        changes.insert(index, (ms, value));
    }

    pub fn get(&self) -> T {
        let now = self.elapsed.get();
        let changes = self.changes.borrow();
        changes
            .iter()
            .rev()
            .find(|&&(t, _)| t <= now)
            .map(|&(_, value)| value)
            .unwrap_or(changes[0].1)
    }
}

pub struct MockButton(pub Signal<bool>);

impl Button for MockButton {
    type Error = Infallible;

    fn is_pressed(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }
}

pub struct MockProximity(pub Signal<u8>);

impl ProximitySensor for MockProximity {
    type Error = Infallible;

    fn proximity(&mut self) -> Result<u8, Self::Error> {
        Ok(self.0.get())
    }
}

pub struct MockKeys(pub Signal<[bool; KEYPAD_KEYS]>);

impl KeypadDriver for MockKeys {
    type Error = Infallible;

    fn keys(&mut self) -> Result<[bool; KEYPAD_KEYS], Self::Error> {
        Ok(self.0.get())
    }
}

#[derive(Debug, Default)]
pub struct ClockState {
    pub base_unix: u64,
    pub reads: usize,
    pub set_to: Option<DateTime>,
    /// Returned instead of the simulated time, e.g. a garbage bus read.
    pub reading: Option<DateTime>,
    pub fail: bool,
}

pub struct MockClock {
    elapsed: Rc<Cell<u64>>,
    state: Rc<RefCell<ClockState>>,
}

impl Clock for MockClock {
    type Error = ();

    fn now(&mut self) -> Result<DateTime, Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.fail {
            return Err(());
        }
        state.reads += 1;
        if let Some(reading) = state.reading {
            return Ok(reading);
        }
        DateTime::from_unix(state.base_unix + self.elapsed.get() / 1000).map_err(|_| ())
    }

    fn set(&mut self, datetime: DateTime) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.base_unix = datetime.unix_timestamp().map_err(|_| ())? - self.elapsed.get() / 1000;
        state.set_to = Some(datetime);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DisplayState {
    pub text: String,
    /// Text at every refresh call.
    pub refreshed: Vec<String>,
    pub backlight: bool,
    pub released: bool,
    pub fail: bool,
}

pub struct MockDisplay(Rc<RefCell<DisplayState>>);

impl Display for MockDisplay {
    type Error = ();

    fn set_text(&mut self, text: &str) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        if state.fail {
            return Err(());
        }
        state.text = text.to_string();
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        if state.fail {
            return Err(());
        }
        let text = state.text.clone();
        state.refreshed.push(text);
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        if state.fail {
            return Err(());
        }
        state.backlight = on;
        Ok(())
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        if state.released {
            return Err(());
        }
        state.released = true;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct IndicatorState {
    pub colors: [Option<u32>; KEYPAD_KEYS],
    pub writes: usize,
}

pub struct MockIndicators(Rc<RefCell<IndicatorState>>);

impl Indicators for MockIndicators {
    type Error = Infallible;

    fn set_color(&mut self, key: usize, rgb: u32) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        state.colors[key] = Some(rgb);
        state.writes += 1;
        Ok(())
    }

    fn set_off(&mut self, key: usize) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        state.colors[key] = None;
        state.writes += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct KeystrokeState {
    pub connected: bool,
    pub advertised: usize,
    pub sent: Vec<String>,
}

pub struct MockKeystrokes(Rc<RefCell<KeystrokeState>>);

impl Keystrokes for MockKeystrokes {
    type Error = Infallible;

    fn advertise(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().advertised += 1;
        Ok(())
    }

    fn connected(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.borrow().connected)
    }

    fn send(&mut self, text: &str) -> Result<(), Self::Error> {
        self.0.borrow_mut().sent.push(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct GeneratorState {
    /// `(secret, unix_time)` of every call.
    pub calls: Vec<(String, u64)>,
    /// Simulated duration of one call.
    pub cost_ms: u64,
}

/// Deterministic stand-in for HMAC-SHA1: mixes secret and time step into six digits.
pub struct MockGenerator {
    elapsed: Rc<Cell<u64>>,
    state: Rc<RefCell<GeneratorState>>,
}

impl CodeGenerator for MockGenerator {
    type Error = Infallible;

    fn generate(
        &mut self,
        secret_base32: &str,
        unix_time: u64,
        digits: u8,
        period: u32,
    ) -> Result<String, Self::Error> {
        let mut state = self.state.borrow_mut();
        state.calls.push((secret_base32.to_string(), unix_time));
        self.elapsed.set(self.elapsed.get() + state.cost_ms);
        Ok(fake_code(secret_base32, unix_time, digits, period))
    }
}

pub fn fake_code(secret_base32: &str, unix_time: u64, digits: u8, period: u32) -> String {
    let step = unix_time / period as u64;
    // FNV-1a
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in secret_base32.bytes().chain(step.to_be_bytes()) {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    let modulus = 10u64.pow(digits as u32);
    format!("{:0width$}", hash % modulus, width = digits as usize)
}

pub struct MockTicker(Rc<Cell<u64>>);

impl Ticker for MockTicker {
    fn millis(&mut self) -> u64 {
        self.0.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.set(self.0.get() + ms as u64);
    }
}

pub struct ButtonBoard;

impl Board for ButtonBoard {
    type Storage = Eeprom;
    type Clock = MockClock;
    type Input = ButtonsAndProximity<MockButton, MockButton, MockProximity>;
    type Display = MockDisplay;
    type Indicators = MockIndicators;
    type Keystrokes = MockKeystrokes;
    type Generator = MockGenerator;
}

pub struct KeypadBoard;

impl Board for KeypadBoard {
    type Storage = Eeprom;
    type Clock = MockClock;
    type Input = Keypad<MockKeys>;
    type Display = MockDisplay;
    type Indicators = MockIndicators;
    type Keystrokes = MockKeystrokes;
    type Generator = MockGenerator;
}

/// Shared handles to every simulated device.
pub struct Bench {
    pub elapsed: Rc<Cell<u64>>,
    pub primary: Signal<bool>,
    pub secondary: Signal<bool>,
    pub proximity: Signal<u8>,
    pub keys: Signal<[bool; KEYPAD_KEYS]>,
    pub clock: Rc<RefCell<ClockState>>,
    pub display: Rc<RefCell<DisplayState>>,
    pub indicators: Rc<RefCell<IndicatorState>>,
    pub keystrokes: Rc<RefCell<KeystrokeState>>,
    pub generator: Rc<RefCell<GeneratorState>>,
}

impl Bench {
    pub fn new(base_unix: u64) -> Self {
        let elapsed = Rc::new(Cell::new(0));
        Self {
            primary: Signal::new(elapsed.clone(), false),
            secondary: Signal::new(elapsed.clone(), false),
            proximity: Signal::new(elapsed.clone(), 0),
            keys: Signal::new(elapsed.clone(), [false; KEYPAD_KEYS]),
            clock: Rc::new(RefCell::new(ClockState {
                base_unix,
                ..Default::default()
            })),
            display: Default::default(),
            indicators: Default::default(),
            keystrokes: Default::default(),
            generator: Default::default(),
            elapsed,
        }
    }

    pub fn button_devices(&self, eeprom: Eeprom) -> Devices<ButtonBoard> {
        Devices {
            storage: eeprom,
            clock: self.mock_clock(),
            input: ButtonsAndProximity::with_config(
                MockButton(self.primary.clone()),
                MockButton(self.secondary.clone()),
                MockProximity(self.proximity.clone()),
                &Config::default(),
            ),
            display: MockDisplay(self.display.clone()),
            indicators: MockIndicators(self.indicators.clone()),
            keystrokes: MockKeystrokes(self.keystrokes.clone()),
            generator: self.mock_generator(),
        }
    }

    pub fn keypad_devices(&self, eeprom: Eeprom) -> Devices<KeypadBoard> {
        Devices {
            storage: eeprom,
            clock: self.mock_clock(),
            input: Keypad::new(MockKeys(self.keys.clone())),
            display: MockDisplay(self.display.clone()),
            indicators: MockIndicators(self.indicators.clone()),
            keystrokes: MockKeystrokes(self.keystrokes.clone()),
            generator: self.mock_generator(),
        }
    }

    pub fn mock_clock(&self) -> MockClock {
        MockClock {
            elapsed: self.elapsed.clone(),
            state: self.clock.clone(),
        }
    }

    pub fn mock_generator(&self) -> MockGenerator {
        MockGenerator {
            elapsed: self.elapsed.clone(),
            state: self.generator.clone(),
        }
    }

    pub fn ticker(&self) -> MockTicker {
        MockTicker(self.elapsed.clone())
    }

    pub fn advance(&self, ms: u64) {
        self.elapsed.set(self.elapsed.get() + ms);
    }

    pub fn now_ms(&self) -> u64 {
        self.elapsed.get()
    }

    pub fn generator_calls(&self) -> usize {
        self.generator.borrow().calls.len()
    }
}
