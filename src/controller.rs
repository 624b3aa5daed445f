use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
#[cfg(feature = "defmt")]
use defmt::{debug, info, warn};

use crate::config::Config;
use crate::datetime::DateTime;
use crate::error::Error;
use crate::input::{EdgeDetector, Event};
use crate::peripherals::{
    Board, Clock, CodeGenerator, Devices, Display, Indicators, KEYPAD_KEYS, Keystrokes,
};
use crate::presentation::{self, EMPTY_LABEL, Indicator, OFFLINE_TEXT, View};
use crate::record::Label;
use crate::store::AccountStore;

/// An account loaded at startup, secret already in the form the generator wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub slot: u8,
    pub label: Label,
    pub secret_base32: String,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Power {
    /// Backlight on, code displayed.
    Awake,
    /// Backlight off, display and indicators cleared.
    Asleep,
}

/// Slot, label and code of the current selection. All empty without a selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeView {
    pub slot: Option<u8>,
    pub label: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplaySession {
    pub backlight: bool,
    /// Text of the last display update.
    pub text: String,
    pub refresh_pending: bool,
    indicators: [Indicator; KEYPAD_KEYS],
}

/// Owns every device handle and all mutable runtime state of the authenticator.
///
/// Dropping the controller runs [`Controller::shutdown`].
pub struct Controller<B: Board> {
    config: Config,
    store: AccountStore<B::Storage>,
    clock: B::Clock,
    input: EdgeDetector<B::Input>,
    display: B::Display,
    indicators: B::Indicators,
    keystrokes: B::Keystrokes,
    generator: B::Generator,

    accounts: Vec<Option<Account>>,
    selected: Option<u8>,
    power: Power,
    session: DisplaySession,
    current: CodeView,
    time: DateTime,
    shut_down: bool,
}

impl<B: Board> Controller<B> {
    /// Scans the account slots, selects the first configured one and switches the backlight
    /// on. A missing or damaged account database is logged and leaves the device without
    /// accounts instead of failing.
    pub fn new(devices: Devices<B>, config: Config) -> Result<Self, Error> {
        let mut controller = Self {
            config,
            store: AccountStore::new(devices.storage, config.capacity),
            clock: devices.clock,
            input: EdgeDetector::new(devices.input),
            display: devices.display,
            indicators: devices.indicators,
            keystrokes: devices.keystrokes,
            generator: devices.generator,
            accounts: Vec::new(),
            selected: None,
            power: Power::Awake,
            session: DisplaySession::default(),
            current: CodeView::default(),
            time: DateTime::default(),
            shut_down: false,
        };

        controller.load_accounts();
        controller.selected = controller.first_configured();

        #[cfg(feature = "defmt")]
        info!(
            "loaded {} accounts, selected slot {}",
            controller.accounts.iter().flatten().count(),
            controller.selected
        );

        #[cfg(feature = "debug-logs")]
        {
            println!(
                "Loaded data for {} TOTP account slots",
                controller.accounts.iter().flatten().count()
            );
            for (index, account) in controller.accounts.iter().enumerate() {
                match account {
                    Some(account) => println!(" slot {}: '{}'", account.slot, account.label),
                    None => println!(" slot {}: -- empty --", index + 1),
                }
            }
        }

        if !config.keystrokes {
            #[cfg(feature = "defmt")]
            info!("keystroke injection disabled");
        }

        controller.set_backlight(true)?;
        Ok(controller)
    }

    fn load_accounts(&mut self) {
        let slots = self.config.capacity.slots() as usize;
        self.accounts = match self.store.accounts() {
            Ok(records) => records
                .into_iter()
                .map(|record| match record {
                    Ok(record) => record.map(|record| Account {
                        slot: record.slot,
                        label: record.label,
                        secret_base32: record.secret.to_base32(),
                    }),
                    Err(_e) => {
                        #[cfg(feature = "defmt")]
                        warn!("skipping unreadable slot: {}", _e);
                        None
                    }
                })
                .collect(),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                warn!("no accounts: {}", _e);

                #[cfg(feature = "debug-logs")]
                println!("no accounts: {_e}");

                (0..slots).map(|_| None).collect()
            }
        };
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&mut self) -> &mut AccountStore<B::Storage> {
        &mut self.store
    }

    /// One entry per slot, index 0 is slot 1.
    pub fn accounts(&self) -> &[Option<Account>] {
        &self.accounts
    }

    pub fn selected_slot(&self) -> Option<u8> {
        self.selected
    }

    /// True if the selected slot holds no account, or nothing is selected.
    pub fn is_selected_slot_empty(&self) -> bool {
        self.selected_account().is_none()
    }

    pub fn power(&self) -> Power {
        self.power
    }

    pub fn is_awake(&self) -> bool {
        self.power == Power::Awake
    }

    pub fn session(&self) -> &DisplaySession {
        &self.session
    }

    pub fn current(&self) -> &CodeView {
        &self.current
    }

    /// Time of the last clock read.
    pub fn time(&self) -> DateTime {
        self.time
    }

    pub fn refresh_pending(&self) -> bool {
        self.session.refresh_pending
    }

    pub fn request_refresh(&mut self) {
        self.session.refresh_pending = true;
    }

    /// Selects `slot`. Returns whether it holds an account. Out of range slots are rejected
    /// and keep the previous selection.
    pub fn select(&mut self, slot: u8) -> Result<bool, Error> {
        if !self.config.capacity.contains(slot) {
            return Err(Error::SlotOutOfRange(slot));
        }
        self.selected = Some(slot);
        Ok(self.selected_account().is_some())
    }

    /// Moves to the next configured slot in ascending order, wrapping around. Does nothing
    /// without accounts.
    pub fn select_next(&mut self) -> Option<u8> {
        let current = self.selected.unwrap_or(0);
        let mut configured = self.accounts.iter().flatten().map(|account| account.slot);
        let next = configured
            .clone()
            .find(|&slot| slot > current)
            .or_else(|| configured.next());
        if next.is_some() {
            self.selected = next;
        }
        next
    }

    /// Slot, label and code valid at `unix_time`. The generator is not called without a
    /// configured selection.
    ///
    /// Blocks for as long as the generator takes, which can be seconds.
    pub fn code_at(&mut self, unix_time: u64) -> Result<CodeView, Error> {
        let Some(slot) = self.selected else {
            return Ok(CodeView::default());
        };
        let index = slot as usize - 1;
        let Some(Some(account)) = self.accounts.get(index) else {
            return Ok(CodeView {
                slot: Some(slot),
                label: String::from(EMPTY_LABEL),
                code: String::new(),
            });
        };

        let code = self
            .generator
            .generate(
                &account.secret_base32,
                unix_time,
                self.config.digits,
                self.config.period,
            )
            .map_err(|_| Error::CodeGenerationError)?;
        Ok(CodeView {
            slot: Some(slot),
            label: String::from(account.label.as_str()),
            code,
        })
    }

    /// Regenerates the displayed code and consumes a pending refresh request.
    pub fn refresh_code(&mut self, unix_time: u64) -> Result<(), Error> {
        self.current = self.code_at(unix_time)?;
        self.session.refresh_pending = false;

        #[cfg(feature = "defmt")]
        debug!("code refreshed for slot {} at {}", self.current.slot, unix_time);
        Ok(())
    }

    /// Reads the clock. A reading that is no valid calendar time is rejected and keeps the
    /// previous time.
    pub fn read_clock(&mut self) -> Result<DateTime, Error> {
        let now = self.clock.now().map_err(|_| Error::ClockError)?;
        if let Err(e) = now.validate() {
            #[cfg(feature = "defmt")]
            warn!("invalid clock reading: {}", now);
            return Err(e);
        }
        self.time = now;
        Ok(now)
    }

    /// Pushes the current state to the display and the indicators. No-op while asleep.
    pub fn render(&mut self) -> Result<(), Error> {
        if !self.is_awake() {
            return Ok(());
        }

        let configured: Vec<bool> = self.accounts.iter().map(Option::is_some).collect();
        let frame = presentation::render(&View {
            awake: true,
            time: self.time,
            slot: self.current.slot,
            label: &self.current.label,
            code: &self.current.code,
            configured: &configured,
        });

        self.show(&frame.text)?;
        for (key, &indicator) in frame.indicators.iter().enumerate() {
            if self.session.indicators[key] != indicator {
                self.set_indicator(key, indicator)?;
            }
        }
        Ok(())
    }

    /// Starts advertising the keystroke injector if it is enabled and not yet connected.
    pub fn advertise(&mut self) -> Result<(), Error> {
        if !self.config.keystrokes {
            return Ok(());
        }
        let connected = self
            .keystrokes
            .connected()
            .map_err(|_| Error::KeystrokeError)?;
        if !connected {
            self.keystrokes
                .advertise()
                .map_err(|_| Error::KeystrokeError)?;
        }
        Ok(())
    }

    /// Samples all inputs once and dispatches its edges. An edge that wakes the device or
    /// puts it to sleep consumes the rest of the poll, so a key going down together with
    /// the waking key is not taken as a selection.
    pub fn poll_inputs(&mut self) -> Result<(), Error> {
        let power = self.power;
        for event in self.input.poll()? {
            if self.power != power {
                #[cfg(feature = "defmt")]
                debug!("dropping event after power change: {}", event);
                break;
            }
            self.handle(event)?;
        }
        Ok(())
    }

    pub fn handle(&mut self, event: Event) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        debug!("event: {}", event);

        match event {
            Event::ProximityApproach => match self.power {
                Power::Awake => self.sleep(),
                Power::Asleep => self.wake(),
            },
            Event::SendCode if self.is_awake() => self.send_code(),
            Event::NextAccount if self.is_awake() => {
                if self.select_next().is_some() {
                    self.show_selection()?;
                    self.request_refresh();
                }
                Ok(())
            }
            Event::KeyPressed(_) if !self.is_awake() => self.wake(),
            Event::KeyPressed(key) => {
                let slot = key as u8 + 1;
                if self.selected == Some(slot) {
                    return self.sleep();
                }
                self.select(slot)?;
                self.show_selection()?;
                self.request_refresh();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn wake(&mut self) -> Result<(), Error> {
        self.power = Power::Awake;
        self.set_backlight(true)?;
        self.request_refresh();
        self.advertise()
    }

    pub fn sleep(&mut self) -> Result<(), Error> {
        self.power = Power::Asleep;
        self.set_backlight(false)?;
        self.show("")?;
        for key in 0..KEYPAD_KEYS {
            self.set_indicator(key, Indicator::Off)?;
        }
        Ok(())
    }

    /// Blanks the display with `OFFLINE`, releases it and switches all indicators off. Every
    /// step is attempted even if an earlier one failed. Runs only once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        #[cfg(feature = "defmt")]
        info!("shutdown");

        let _ = self.show(OFFLINE_TEXT);
        let _ = self.display.release();
        for key in 0..KEYPAD_KEYS {
            let _ = self.indicators.set_off(key);
        }
        self.session.indicators = [Indicator::Off; KEYPAD_KEYS];
    }

    fn send_code(&mut self) -> Result<(), Error> {
        if !self.config.keystrokes {
            return Ok(());
        }
        let connected = self
            .keystrokes
            .connected()
            .map_err(|_| Error::KeystrokeError)?;
        if !connected || self.current.code.is_empty() {
            #[cfg(feature = "defmt")]
            info!("not sending code, connected: {}", connected);
            return Ok(());
        }
        let text = format!("{}\n", self.current.code);
        self.keystrokes
            .send(&text)
            .map_err(|_| Error::KeystrokeError)
    }

    /// Shows slot and label of a fresh selection right away. The code follows with the next
    /// refresh since generating it is slow.
    fn show_selection(&mut self) -> Result<(), Error> {
        let label = match self.selected_account() {
            Some(account) => String::from(account.label.as_str()),
            None => String::from(EMPTY_LABEL),
        };
        self.current = CodeView {
            slot: self.selected,
            label,
            code: String::new(),
        };
        self.render()
    }

    fn selected_account(&self) -> Option<&Account> {
        let slot = self.selected?;
        self.accounts.get(slot as usize - 1)?.as_ref()
    }

    fn first_configured(&self) -> Option<u8> {
        self.accounts.iter().flatten().map(|account| account.slot).next()
    }

    fn show(&mut self, text: &str) -> Result<(), Error> {
        self.display
            .set_text(text)
            .map_err(|_| Error::DisplayError)?;
        self.display.refresh().map_err(|_| Error::DisplayError)?;
        self.session.text = String::from(text);
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), Error> {
        self.display
            .set_backlight(on)
            .map_err(|_| Error::DisplayError)?;
        self.session.backlight = on;
        Ok(())
    }

    fn set_indicator(&mut self, key: usize, indicator: Indicator) -> Result<(), Error> {
        let result = match indicator.rgb() {
            Some(rgb) => self.indicators.set_color(key, rgb),
            None => self.indicators.set_off(key),
        };
        result.map_err(|_| Error::IndicatorError)?;
        self.session.indicators[key] = indicator;
        Ok(())
    }
}

impl<B: Board> Drop for Controller<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
