//! Round controller: score, countdown and reveal delay for one drill session.
//!
//! Time is always passed in. The two scheduled activities of a round, the
//! countdown expiry and the end of a reveal delay, are stored as instants and
//! run in timestamp order whenever the controller is advanced, so a round
//! behaves the same under a real ticker and under a test that jumps the clock.

use crate::error::{DrillError, Result};
use crate::problem::{generate, Problem};
use crate::settings::Settings;
use crate::util::{display_secs, problems_per_minute, sanitize_digits};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the first start. Accepts no input.
    Idle,
    AwaitingAnswer,
    /// A correct answer is on screen; input is locked until the delay ends.
    Revealing,
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub score: u32,
    pub duration_secs: u32,
    pub ppm: f64,
}

impl RoundSummary {
    fn new(score: u32, duration_secs: u32) -> Self {
        Self {
            score,
            duration_secs,
            ppm: problems_per_minute(score, duration_secs),
        }
    }

    /// Problems per minute with one decimal, as shown on the results screen.
    pub fn ppm_display(&self) -> String {
        format!("{:.1}", self.ppm)
    }
}

/// What the presentation layer needs to know after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    ProblemShown { question: String },
    InputEcho(String),
    /// Append-only: one per solved problem.
    Solved { history: String, score: u32 },
    Clock { remaining_secs: u64 },
    Ended(RoundSummary),
}

#[derive(Debug)]
pub struct Round<R: Rng = StdRng> {
    rng: R,
    settings: Settings,
    phase: Phase,
    score: u32,
    problem: Option<Problem>,
    input: String,
    deadline: Option<Instant>,
    reveal_due: Option<Instant>,
    pending_end: bool,
    history: Vec<Problem>,
    summary: Option<RoundSummary>,
}

impl Round<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for Round<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Round<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            settings: Settings::default(),
            phase: Phase::Idle,
            score: 0,
            problem: None,
            input: String::new(),
            deadline: None,
            reveal_due: None,
            pending_end: false,
            history: Vec::new(),
            summary: None,
        }
    }

    /// Begin a fresh round. Anything scheduled by a previous round is dropped.
    /// Fails without touching the current state when no operation is enabled.
    pub fn start(&mut self, settings: Settings, now: Instant) -> Result<Vec<RoundEvent>> {
        let problem = generate(&settings, &mut self.rng).ok_or(DrillError::NoOperations)?;

        self.reveal_due = None;
        self.pending_end = false;
        self.score = 0;
        self.history.clear();
        self.summary = None;
        self.input.clear();
        self.deadline = Some(now + settings.round_length());
        self.phase = Phase::AwaitingAnswer;

        info!(
            duration = settings.duration,
            reveal_delay = settings.reveal_delay,
            operations = ?settings.operations.enabled(),
            "round started"
        );

        let events = vec![
            RoundEvent::ProblemShown {
                question: problem.question.clone(),
            },
            RoundEvent::InputEcho(String::new()),
            RoundEvent::Clock {
                remaining_secs: u64::from(settings.duration),
            },
        ];
        self.problem = Some(problem);
        self.settings = settings;
        Ok(events)
    }

    /// Feed the full raw text of the answer box. Only meaningful while
    /// awaiting an answer; anything due before `now` is processed first.
    pub fn submit_digits(&mut self, raw: &str, now: Instant) -> Vec<RoundEvent> {
        let mut events = self.run_due(now);
        self.accept(raw, now, &mut events);
        events
    }

    /// One typed character appended to the current answer. The answer is
    /// read after due work has run, so a problem shown by this very call
    /// starts from an empty box.
    pub fn push_input(&mut self, c: char, now: Instant) -> Vec<RoundEvent> {
        let mut events = self.run_due(now);
        let raw = format!("{}{}", self.input, c);
        self.accept(&raw, now, &mut events);
        events
    }

    /// Drop the last character of the current answer.
    pub fn erase_input(&mut self, now: Instant) -> Vec<RoundEvent> {
        let mut events = self.run_due(now);
        let mut raw = self.input.clone();
        raw.pop();
        self.accept(&raw, now, &mut events);
        events
    }

    fn accept(&mut self, raw: &str, now: Instant, events: &mut Vec<RoundEvent>) {
        if self.phase != Phase::AwaitingAnswer {
            return;
        }
        let Some(problem) = self.problem.as_ref() else {
            return;
        };

        let cleaned = sanitize_digits(raw);
        let solved = !cleaned.is_empty() && problem.is_answered_by(&cleaned);
        self.input = cleaned.clone();
        events.push(RoundEvent::InputEcho(cleaned));

        if solved {
            self.score += 1;
            debug!(problem = %problem.history, score = self.score, "problem solved");
            events.push(RoundEvent::Solved {
                history: problem.history.clone(),
                score: self.score,
            });
            self.history.push(problem.clone());
            self.phase = Phase::Revealing;
            self.reveal_due = Some(now + self.settings.reveal_delay());
        }
    }

    /// Advance the clock: run whatever is due, then report the time left.
    pub fn tick(&mut self, now: Instant) -> Vec<RoundEvent> {
        let mut events = self.run_due(now);
        if self.is_running() {
            events.push(RoundEvent::Clock {
                remaining_secs: self.remaining_secs(now),
            });
        }
        events
    }

    fn is_running(&self) -> bool {
        matches!(self.phase, Phase::AwaitingAnswer | Phase::Revealing)
    }

    fn run_due(&mut self, now: Instant) -> Vec<RoundEvent> {
        let mut events = Vec::new();

        loop {
            let expiry = self
                .deadline
                .filter(|d| *d <= now && self.is_running() && !self.pending_end);
            let reveal = self.reveal_due.filter(|r| *r <= now);

            match (expiry, reveal) {
                (Some(d), Some(r)) if d < r => self.expire(&mut events),
                (_, Some(_)) => self.complete_reveal(&mut events),
                (Some(_), None) => self.expire(&mut events),
                (None, None) => break,
            }
        }

        events
    }

    fn expire(&mut self, events: &mut Vec<RoundEvent>) {
        if self.phase == Phase::Revealing {
            debug!(score = self.score, "time expired during reveal, deferring end");
            self.pending_end = true;
            events.push(RoundEvent::Clock { remaining_secs: 0 });
        } else {
            self.end(events);
        }
    }

    fn complete_reveal(&mut self, events: &mut Vec<RoundEvent>) {
        self.reveal_due = None;
        if self.pending_end {
            self.end(events);
            return;
        }

        match generate(&self.settings, &mut self.rng) {
            Some(problem) => {
                events.push(RoundEvent::ProblemShown {
                    question: problem.question.clone(),
                });
                events.push(RoundEvent::InputEcho(String::new()));
                self.problem = Some(problem);
                self.input.clear();
                self.phase = Phase::AwaitingAnswer;
            }
            None => self.end(events),
        }
    }

    fn end(&mut self, events: &mut Vec<RoundEvent>) {
        let summary = RoundSummary::new(self.score, self.settings.duration);
        info!(
            score = summary.score,
            ppm = %summary.ppm_display(),
            "round ended"
        );

        self.phase = Phase::Ended;
        self.reveal_due = None;
        self.pending_end = false;
        self.summary = Some(summary.clone());
        events.push(RoundEvent::Clock { remaining_secs: 0 });
        events.push(RoundEvent::Ended(summary));
    }

    /// Whole seconds left on the clock, recomputed from the deadline.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        match (self.is_running(), self.deadline) {
            (true, Some(deadline)) => display_secs(deadline.saturating_duration_since(now)),
            _ => 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    /// The sanitized answer text currently echoed.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn history(&self) -> &[Problem] {
        &self.history
    }

    pub fn pending_end(&self) -> bool {
        self.pending_end
    }

    pub fn summary(&self) -> Option<&RoundSummary> {
        self.summary.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
