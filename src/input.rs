//! Polled inputs and edge detection.
//!
//! Each poll produces an [`InputSet`], the state of every named input. Comparing it with the
//! previous sample yields one [`Edge`] per changed input, so simultaneous changes are all
//! reported within the same poll. The hardware variant then decides which edges mean something.

use strum::{EnumCount, IntoEnumIterator};

use crate::config::Config;
use crate::error::Error;
use crate::peripherals::{Button, KEYPAD_KEYS, KeypadDriver, ProximitySensor};

#[derive(
    strum::EnumCount, strum::EnumIter, strum::FromRepr, strum::Display, Debug, PartialEq, Eq, Copy, Clone,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Input {
    PrimaryButton,
    SecondaryButton,
    Proximity,
    Key0,
    Key1,
    Key2,
    Key3,
}

impl Input {
    const KEYS: [Input; KEYPAD_KEYS] = [Input::Key0, Input::Key1, Input::Key2, Input::Key3];

    pub const fn key(index: usize) -> Option<Input> {
        if index < KEYPAD_KEYS {
            Some(Self::KEYS[index])
        } else {
            None
        }
    }

    pub const fn key_index(self) -> Option<usize> {
        match self {
            Input::Key0 => Some(0),
            Input::Key1 => Some(1),
            Input::Key2 => Some(2),
            Input::Key3 => Some(3),
            _ => None,
        }
    }
}

/// Active/inactive state of every input at one point in time.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct InputSet([bool; Input::COUNT]);

impl InputSet {
    pub const fn new() -> Self {
        Self([false; Input::COUNT])
    }

    pub fn with(mut self, input: Input, active: bool) -> Self {
        self.set(input, active);
        self
    }

    pub fn set(&mut self, input: Input, active: bool) {
        self.0[input as usize] = active;
    }

    pub fn contains(&self, input: Input) -> bool {
        self.0[input as usize]
    }

    /// Edges from `previous` to `self`, in declaration order of [`Input`].
    pub fn changes_since(self, previous: InputSet) -> impl Iterator<Item = Edge> {
        Input::iter().filter_map(move |input| {
            match (previous.contains(input), self.contains(input)) {
                (false, true) => Some(Edge::Pressed(input)),
                (true, false) => Some(Edge::Released(input)),
                _ => None,
            }
        })
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Pressed(Input),
    Released(Input),
}

/// Variant independent meaning of an edge, consumed by the controller.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Something came close to the proximity sensor.
    ProximityApproach,
    /// Type the displayed code on the keystroke injector.
    SendCode,
    /// Cycle to the next configured account.
    NextAccount,
    /// Key `n` of the keypad went down, `n` counting from 0.
    KeyPressed(usize),
}

/// Capability interface of the input hardware.
pub trait InputSource {
    fn sample(&mut self) -> Result<InputSet, Error>;

    fn translate(edge: Edge) -> Option<Event>;
}

/// Two push buttons and an APDS9960 style proximity sensor.
pub struct ButtonsAndProximity<A, B, P> {
    primary: A,
    secondary: B,
    proximity: P,
    threshold: u8,
}

impl<A, B, P> ButtonsAndProximity<A, B, P> {
    /// Readings strictly above `threshold` count as "object detected".
    pub fn new(primary: A, secondary: B, proximity: P, threshold: u8) -> Self {
        Self {
            primary,
            secondary,
            proximity,
            threshold,
        }
    }

    /// Uses [`Config::proximity_threshold`].
    pub fn with_config(primary: A, secondary: B, proximity: P, config: &Config) -> Self {
        Self::new(primary, secondary, proximity, config.proximity_threshold)
    }
}

impl<A: Button, B: Button, P: ProximitySensor> InputSource for ButtonsAndProximity<A, B, P> {
    fn sample(&mut self) -> Result<InputSet, Error> {
        let primary = self.primary.is_pressed().map_err(|_| Error::InputError)?;
        let secondary = self.secondary.is_pressed().map_err(|_| Error::InputError)?;
        let near = self.proximity.proximity().map_err(|_| Error::InputError)? > self.threshold;
        Ok(InputSet::new()
            .with(Input::PrimaryButton, primary)
            .with(Input::SecondaryButton, secondary)
            .with(Input::Proximity, near))
    }

    fn translate(edge: Edge) -> Option<Event> {
        match edge {
            Edge::Pressed(Input::PrimaryButton) => Some(Event::SendCode),
            Edge::Pressed(Input::SecondaryButton) => Some(Event::NextAccount),
            Edge::Pressed(Input::Proximity) => Some(Event::ProximityApproach),
            _ => None,
        }
    }
}

/// NeoKey 1x4 style keypad with one indicator per key.
pub struct Keypad<K> {
    driver: K,
}

impl<K> Keypad<K> {
    pub fn new(driver: K) -> Self {
        Self { driver }
    }
}

impl<K: KeypadDriver> InputSource for Keypad<K> {
    fn sample(&mut self) -> Result<InputSet, Error> {
        let keys = self.driver.keys().map_err(|_| Error::InputError)?;
        let set = keys
            .iter()
            .enumerate()
            .filter_map(|(index, &pressed)| Input::key(index).map(|input| (input, pressed)))
            .fold(InputSet::new(), |set, (input, pressed)| set.with(input, pressed));
        Ok(set)
    }

    fn translate(edge: Edge) -> Option<Event> {
        match edge {
            Edge::Pressed(input) => input.key_index().map(Event::KeyPressed),
            Edge::Released(_) => None,
        }
    }
}

/// Keeps the previous sample of an [`InputSource`]. The first poll only primes it.
pub struct EdgeDetector<S> {
    source: S,
    previous: Option<InputSet>,
}

impl<S: InputSource> EdgeDetector<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            previous: None,
        }
    }

    pub fn poll(&mut self) -> Result<impl Iterator<Item = Event> + use<S>, Error> {
        let current = self.source.sample()?;
        let previous = self.previous.replace(current).unwrap_or(current);
        Ok(current.changes_since(previous).filter_map(S::translate))
    }
}
