use crate::error::DrillError;
use crate::form::SettingsForm;
use crate::round::{Phase, Round, RoundEvent};
use crate::runtime::{DrillEvent, Stamped};
use crate::settings::Settings;
use crate::store::{save_settings, KeyValueStore};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Settings,
    Playing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Screen state plus the round it drives. Everything the widget needs is
/// readable from here. Time comes in with each event.
pub struct App {
    pub form: SettingsForm,
    pub round: Round,
    pub state: AppState,
    /// Solved problems of the current round, oldest first.
    pub solved: Vec<String>,
    pub remaining_secs: u64,
    store: Box<dyn KeyValueStore>,
}

impl App {
    pub fn new(settings: &Settings, store: Box<dyn KeyValueStore>) -> Self {
        Self {
            form: SettingsForm::from_settings(settings),
            round: Round::new(),
            state: AppState::Settings,
            solved: Vec::new(),
            remaining_secs: u64::from(settings.duration),
            store,
        }
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn is_revealing(&self) -> bool {
        self.round.phase() == Phase::Revealing
    }

    /// Normalize the form, show the normalized values, persist them and
    /// start a round. Refused while no operation is selected.
    pub fn start_round(&mut self, now: Instant) {
        if !self.form.any_operation() {
            return;
        }
        let settings = self.form.read();
        self.form.apply(&settings);
        if let Err(err) = save_settings(self.store.as_mut(), &settings) {
            warn!(%err, "could not save settings");
        }

        match self.round.start(settings, now) {
            Ok(events) => {
                self.solved.clear();
                self.state = AppState::Playing;
                self.apply(events);
            }
            Err(DrillError::NoOperations) => {}
            Err(err) => warn!(%err, "round did not start"),
        }
    }

    fn apply(&mut self, events: Vec<RoundEvent>) {
        for event in events {
            match event {
                RoundEvent::Clock { remaining_secs } => self.remaining_secs = remaining_secs,
                RoundEvent::Solved { history, .. } => self.solved.push(history),
                RoundEvent::Ended(_) => self.state = AppState::Results,
                RoundEvent::ProblemShown { .. } | RoundEvent::InputEcho(_) => {}
            }
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        let events = self.round.tick(now);
        self.apply(events);
    }

    pub fn handle_event(&mut self, step: Stamped) -> Action {
        let action = match step.event {
            DrillEvent::Key(key) => self.handle_key(key, step.at),
            DrillEvent::Resize | DrillEvent::Tick => Action::Continue,
        };
        self.on_tick(step.at);
        action
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Action {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Action::Quit;
        }

        match self.state {
            AppState::Settings => match key.code {
                KeyCode::Up | KeyCode::BackTab => self.form.focus_prev(),
                KeyCode::Down | KeyCode::Tab => self.form.focus_next(),
                KeyCode::Char(' ') => self.form.toggle(),
                KeyCode::Char(c) => self.form.push_char(c),
                KeyCode::Backspace => self.form.backspace(),
                KeyCode::Enter => self.start_round(now),
                _ => {}
            },
            AppState::Playing => {
                let events = match key.code {
                    KeyCode::Char(c) => self.round.push_input(c, now),
                    KeyCode::Backspace => self.round.erase_input(now),
                    _ => Vec::new(),
                };
                self.apply(events);
            }
            AppState::Results => match key.code {
                KeyCode::Char('r') | KeyCode::Enter => self.state = AppState::Settings,
                KeyCode::Char('n') => self.start_round(now),
                _ => {}
            },
        }

        Action::Continue
    }
}
