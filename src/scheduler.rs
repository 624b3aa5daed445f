use core::convert::Infallible;
#[cfg(feature = "defmt")]
use defmt::trace;

use crate::controller::Controller;
use crate::error::Error;
use crate::peripherals::{Board, Ticker};

/// The outer control loop.
///
/// Once per clock second it renders, then fast polls the inputs in slices of
/// [`crate::Config::slice_ms`] until the clock's seconds field changes or a refresh was
/// requested. The code is regenerated when the clock has moved into another period than the
/// one of the displayed code, and on explicit refresh requests. A boundary second that passes
/// during a slow generation is therefore still caught by the next cycle.
///
/// Code generation runs synchronously inside the loop. While it runs, no input is sampled.
pub struct Scheduler<B: Board, T: Ticker> {
    controller: Controller<B>,
    ticker: T,
    previous_second: u8,
    /// `unix_time / period` of the displayed code.
    code_period: u64,
    advertised: bool,
}

impl<B: Board, T: Ticker> Scheduler<B, T> {
    /// Reads the clock and generates the first code.
    pub fn new(mut controller: Controller<B>, ticker: T) -> Result<Self, Error> {
        let now = controller.read_clock()?;
        let unix_time = now.unix_timestamp()?;
        controller.refresh_code(unix_time)?;
        let code_period = unix_time / controller.config().period as u64;
        Ok(Self {
            controller,
            ticker,
            previous_second: now.second,
            code_period,
            advertised: false,
        })
    }

    pub fn controller(&mut self) -> &mut Controller<B> {
        &mut self.controller
    }

    pub fn ticker(&mut self) -> &mut T {
        &mut self.ticker
    }

    /// Runs until a device fails. The controller's teardown runs when the scheduler is dropped.
    pub fn run(&mut self) -> Result<Infallible, Error> {
        loop {
            self.cycle()?;
        }
    }

    /// One iteration of the outer loop, roughly one clock second while awake.
    pub fn cycle(&mut self) -> Result<(), Error> {
        if self.controller.is_awake() {
            self.controller.render()?;
            if !self.advertised {
                // advertising is slow to start, do it after the first screen update
                self.controller.advertise()?;
                self.advertised = true;
            }
        }

        let mut now = self.controller.time();
        while now.second == self.previous_second && !self.controller.refresh_pending() {
            self.sample_slice()?;
            // the clock is left alone while asleep
            if self.controller.is_awake() {
                now = self.controller.read_clock()?;
            }
        }
        self.previous_second = now.second;

        let period = self.controller.config().period as u64;
        let stale = now.unix_timestamp()? / period != self.code_period;
        if stale || self.controller.refresh_pending() {
            let unix_time = self.controller.read_clock()?.unix_timestamp()?;

            #[cfg(feature = "defmt")]
            trace!("regenerate at {} stale: {}", unix_time, stale);

            self.controller.refresh_code(unix_time)?;
            self.code_period = unix_time / period;
        }
        Ok(())
    }

    /// Polls all inputs every `sample_interval_ms` until the slice ends or a refresh is due.
    fn sample_slice(&mut self) -> Result<(), Error> {
        let config = *self.controller.config();
        let deadline = self.ticker.millis() + config.slice_ms as u64;
        while self.ticker.millis() < deadline && !self.controller.refresh_pending() {
            self.controller.poll_inputs()?;
            self.ticker.delay_ms(config.sample_interval_ms);
        }
        Ok(())
    }
}
