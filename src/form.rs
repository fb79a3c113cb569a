use crate::problem::Operation;
use crate::settings::{normalize, Operations, Settings, ALLOWED_DURATIONS};
use serde_json::{json, Value};
use std::collections::HashMap;

/// One focusable control on the settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Op(Operation),
    AddMinA,
    AddMaxA,
    AddMinB,
    AddMaxB,
    MulMinA,
    MulMaxA,
    MulMinB,
    MulMaxB,
    Duration,
    RevealDelay,
}

impl Field {
    /// Focus order, top to bottom.
    pub const ORDER: [Field; 14] = [
        Field::Op(Operation::Add),
        Field::Op(Operation::Sub),
        Field::Op(Operation::Mul),
        Field::Op(Operation::Div),
        Field::AddMinA,
        Field::AddMaxA,
        Field::AddMinB,
        Field::AddMaxB,
        Field::MulMinA,
        Field::MulMaxA,
        Field::MulMinB,
        Field::MulMaxB,
        Field::Duration,
        Field::RevealDelay,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Op(Operation::Add) => "addition",
            Field::Op(Operation::Sub) => "subtraction",
            Field::Op(Operation::Mul) => "multiplication",
            Field::Op(Operation::Div) => "division",
            Field::AddMinA | Field::MulMinA => "min a",
            Field::AddMaxA | Field::MulMaxA => "max a",
            Field::AddMinB | Field::MulMinB => "min b",
            Field::AddMaxB | Field::MulMaxB => "max b",
            Field::Duration => "duration",
            Field::RevealDelay => "reveal delay",
        }
    }

    fn accepts(&self, c: char) -> bool {
        match self {
            Field::Op(_) | Field::Duration => false,
            Field::RevealDelay => c.is_ascii_digit() || c == '.',
            _ => c.is_ascii_digit() || c == '-',
        }
    }
}

/// Editable, not yet validated copy of the settings. Values stay text until
/// [`SettingsForm::read`] runs them through the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    operations: Operations,
    texts: HashMap<Field, String>,
    focus: usize,
}

impl SettingsForm {
    pub fn from_settings(settings: &Settings) -> Self {
        let add = &settings.add_range;
        let mul = &settings.mul_range;
        let texts = [
            (Field::AddMinA, add.min_a.to_string()),
            (Field::AddMaxA, add.max_a.to_string()),
            (Field::AddMinB, add.min_b.to_string()),
            (Field::AddMaxB, add.max_b.to_string()),
            (Field::MulMinA, mul.min_a.to_string()),
            (Field::MulMaxA, mul.max_a.to_string()),
            (Field::MulMinB, mul.min_b.to_string()),
            (Field::MulMaxB, mul.max_b.to_string()),
            (Field::Duration, settings.duration.to_string()),
            (Field::RevealDelay, settings.reveal_delay.to_string()),
        ]
        .into_iter()
        .collect();

        Self {
            operations: settings.operations,
            texts,
            focus: 0,
        }
    }

    /// Replace every value with the given settings, keeping the focus.
    pub fn apply(&mut self, settings: &Settings) {
        let focus = self.focus;
        *self = Self::from_settings(settings);
        self.focus = focus;
    }

    pub fn text(&self, field: Field) -> &str {
        self.texts.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn operations(&self) -> Operations {
        self.operations
    }

    pub fn any_operation(&self) -> bool {
        self.operations.any()
    }

    /// Range fields follow their operation's checkbox: the addition range is
    /// editable only with addition on, the multiplication range with
    /// multiplication on.
    pub fn is_enabled(&self, field: Field) -> bool {
        match field {
            Field::AddMinA | Field::AddMaxA | Field::AddMinB | Field::AddMaxB => {
                self.operations.add
            }
            Field::MulMinA | Field::MulMaxA | Field::MulMinB | Field::MulMaxB => {
                self.operations.mul
            }
            _ => true,
        }
    }

    pub fn focused(&self) -> Field {
        Field::ORDER[self.focus]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % Field::ORDER.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + Field::ORDER.len() - 1) % Field::ORDER.len();
    }

    /// Space on the focused control: flips a checkbox, cycles the duration.
    pub fn toggle(&mut self) {
        match self.focused() {
            Field::Op(op) => {
                let on = self.operations.is_enabled(op);
                self.operations.set(op, !on);
            }
            Field::Duration => {
                let current = self.text(Field::Duration).parse::<u32>().ok();
                let next = ALLOWED_DURATIONS
                    .iter()
                    .position(|d| Some(*d) == current)
                    .map_or(ALLOWED_DURATIONS[0], |idx| {
                        ALLOWED_DURATIONS[(idx + 1) % ALLOWED_DURATIONS.len()]
                    });
                self.texts.insert(Field::Duration, next.to_string());
            }
            _ => {}
        }
    }

    pub fn push_char(&mut self, c: char) {
        let field = self.focused();
        if field.accepts(c) && self.is_enabled(field) {
            self.texts.entry(field).or_default().push(c);
        }
    }

    pub fn backspace(&mut self) {
        let field = self.focused();
        if field.accepts('0') && self.is_enabled(field) {
            if let Some(text) = self.texts.get_mut(&field) {
                text.pop();
            }
        }
    }

    /// The form as loosely typed input, exactly as typed.
    pub fn to_raw(&self) -> Value {
        json!({
            "duration": self.text(Field::Duration),
            "revealDelay": self.text(Field::RevealDelay),
            "operations": {
                "add": self.operations.add,
                "sub": self.operations.sub,
                "mul": self.operations.mul,
                "div": self.operations.div,
            },
            "addRange": {
                "minA": self.text(Field::AddMinA),
                "maxA": self.text(Field::AddMaxA),
                "minB": self.text(Field::AddMinB),
                "maxB": self.text(Field::AddMaxB),
            },
            "mulRange": {
                "minA": self.text(Field::MulMinA),
                "maxA": self.text(Field::MulMaxA),
                "minB": self.text(Field::MulMinB),
                "maxB": self.text(Field::MulMaxB),
            },
        })
    }

    pub fn read(&self) -> Settings {
        normalize(&self.to_raw())
    }
}
