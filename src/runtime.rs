//! Terminal input and time for the drill loop.
//!
//! The loop advances in steps. Each step is either one piece of terminal
//! input or, when nothing arrived within the tick interval, a tick. Every
//! step carries the clock reading it was taken at, so the app and the round
//! controller agree on "now" for the whole step.

use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrillEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

impl DrillEvent {
    /// Map a raw terminal event to something the drill reacts to.
    pub fn from_terminal(ev: CtEvent) -> Option<Self> {
        match ev {
            // release events would count as a second keystroke on Windows
            CtEvent::Key(key) if key.kind == KeyEventKind::Release => None,
            CtEvent::Key(key) => Some(DrillEvent::Key(key)),
            CtEvent::Resize(_, _) => Some(DrillEvent::Resize),
            _ => None,
        }
    }

    /// Pair the event with the instant it is handled at.
    pub fn at(self, at: Instant) -> Stamped {
        Stamped { event: self, at }
    }
}

/// An event together with the clock reading of its step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stamped {
    pub event: DrillEvent,
    pub at: Instant,
}

/// Where keys and resizes come from.
pub trait InputSource {
    /// Wait up to `timeout` for the next input. `None` when nothing arrived
    /// or the source is gone.
    fn next_within(&self, timeout: Duration) -> Option<DrillEvent>;
}

/// Queued input, as fed by [`TerminalInput`]'s reader thread or by tests.
impl InputSource for Receiver<DrillEvent> {
    fn next_within(&self, timeout: Duration) -> Option<DrillEvent> {
        match self.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Crossterm input read on a background thread.
pub struct TerminalInput {
    rx: Receiver<DrillEvent>,
}

impl TerminalInput {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(ev) => ev,
                Err(err) => {
                    debug!(%err, "terminal input closed");
                    break;
                }
            };
            if let Some(ev) = DrillEvent::from_terminal(ev) {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl InputSource for TerminalInput {
    fn next_within(&self, timeout: Duration) -> Option<DrillEvent> {
        self.rx.next_within(timeout)
    }
}

/// Source of "now" for the round controller
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to, for simulated time in tests
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Produces the loop's steps from an input source and a clock.
pub struct Runner<I: InputSource, C: Clock> {
    input: I,
    clock: C,
    tick: Duration,
}

impl<I: InputSource, C: Clock> Runner<I, C> {
    pub fn new(input: I, clock: C, tick: Duration) -> Self {
        Self { input, clock, tick }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Blocks up to one tick interval. The stamp is read after the wait, so
    /// a tick reports the time it fired at.
    pub fn step(&self) -> Stamped {
        let event = self.input.next_within(self.tick).unwrap_or(DrillEvent::Tick);
        event.at(self.clock.now())
    }
}
