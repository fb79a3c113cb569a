use crate::problem::Operation;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Round lengths offered by the settings form, in seconds.
pub const ALLOWED_DURATIONS: [u32; 5] = [30, 60, 90, 120, 300];
pub const DEFAULT_DURATION: u32 = 120;
pub const DEFAULT_REVEAL_DELAY: f64 = 0.5;
pub const MAX_REVEAL_DELAY: f64 = 5.0;

/// Lowest operand allowed in the addition/subtraction range.
pub const ADD_FLOOR: i64 = 0;
/// Lowest operand allowed in the multiplication/division range.
pub const MUL_FLOOR: i64 = 1;
/// Upper cap on every range bound so that `a * b` always fits in an `i64`.
pub const MAX_OPERAND: i64 = 1_000_000;

/// Inclusive bounds for the two operands of a problem.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperandRange {
    pub min_a: i64,
    pub max_a: i64,
    pub min_b: i64,
    pub max_b: i64,
}

impl OperandRange {
    pub fn new(min_a: i64, max_a: i64, min_b: i64, max_b: i64) -> Self {
        Self {
            min_a,
            max_a,
            min_b,
            max_b,
        }
    }
}

impl Default for OperandRange {
    fn default() -> Self {
        Self::new(2, 12, 2, 12)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Operations {
    pub add: bool,
    pub sub: bool,
    pub mul: bool,
    pub div: bool,
}

impl Default for Operations {
    fn default() -> Self {
        Self {
            add: true,
            sub: true,
            mul: true,
            div: true,
        }
    }
}

impl Operations {
    /// Only the given operations switched on.
    pub fn only(ops: &[Operation]) -> Self {
        let mut operations = Self {
            add: false,
            sub: false,
            mul: false,
            div: false,
        };
        for op in ops {
            operations.set(*op, true);
        }
        operations
    }

    pub fn is_enabled(&self, op: Operation) -> bool {
        match op {
            Operation::Add => self.add,
            Operation::Sub => self.sub,
            Operation::Mul => self.mul,
            Operation::Div => self.div,
        }
    }

    pub fn set(&mut self, op: Operation, enabled: bool) {
        match op {
            Operation::Add => self.add = enabled,
            Operation::Sub => self.sub = enabled,
            Operation::Mul => self.mul = enabled,
            Operation::Div => self.div = enabled,
        }
    }

    /// Enabled operations in fixed add, sub, mul, div order.
    pub fn enabled(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.is_enabled(*op))
            .collect()
    }

    pub fn any(&self) -> bool {
        self.add || self.sub || self.mul || self.div
    }
}

/// Canonical drill settings. Values coming from [`normalize`] or `Default`
/// satisfy every invariant; hand-built values are tolerated by the generator
/// and the round (inverted ranges are read min to max, a non-finite delay is
/// no delay).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub duration: u32,
    pub reveal_delay: f64,
    pub operations: Operations,
    pub add_range: OperandRange,
    pub mul_range: OperandRange,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            reveal_delay: DEFAULT_REVEAL_DELAY,
            operations: Operations::default(),
            add_range: OperandRange::default(),
            mul_range: OperandRange::default(),
        }
    }
}

impl Settings {
    pub fn round_length(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration))
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.reveal_delay.clamp(0.0, MAX_REVEAL_DELAY))
            .unwrap_or_default()
    }

    /// The loosely typed form of these settings, as stored and as fed back to
    /// [`normalize`].
    pub fn to_raw(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// "Parse as number": JSON numbers as-is, trimmed strings parsed (empty is 0),
/// booleans 1/0, null 0. Missing fields, arrays and objects are not numbers,
/// not even a one-element array such as `[7]`. Strings must be plain decimal:
/// hex like `"0x10"` or other radix prefixes are rejected and fall back to the
/// default.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let num = match value? {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    };
    num.filter(|n| n.is_finite())
}

fn to_int(value: Option<&Value>, fallback: i64) -> i64 {
    coerce_number(value).map_or(fallback, |n| n.trunc() as i64)
}

fn to_float(value: Option<&Value>, fallback: f64) -> f64 {
    coerce_number(value).unwrap_or(fallback)
}

fn normalize_range(raw: Option<&Value>, defaults: OperandRange, floor: i64) -> OperandRange {
    let bound = |key: &str, fallback: i64| {
        to_int(raw.and_then(|r| r.get(key)), fallback).clamp(floor, MAX_OPERAND)
    };

    let mut min_a = bound("minA", defaults.min_a);
    let mut max_a = bound("maxA", defaults.max_a);
    let mut min_b = bound("minB", defaults.min_b);
    let mut max_b = bound("maxB", defaults.max_b);

    if min_a > max_a {
        std::mem::swap(&mut min_a, &mut max_a);
    }
    if min_b > max_b {
        std::mem::swap(&mut min_b, &mut max_b);
    }

    OperandRange::new(min_a, max_a, min_b, max_b)
}

/// Fold arbitrary user or stored input into valid [`Settings`]. Never fails:
/// anything malformed falls back to its default.
pub fn normalize(raw: &Value) -> Settings {
    let defaults = Settings::default();

    let duration = to_int(raw.get("duration"), i64::from(defaults.duration));
    let duration = ALLOWED_DURATIONS
        .into_iter()
        .find(|allowed| i64::from(*allowed) == duration)
        .unwrap_or(defaults.duration);

    let reveal_delay =
        to_float(raw.get("revealDelay"), defaults.reveal_delay).clamp(0.0, MAX_REVEAL_DELAY);

    let raw_ops = raw.get("operations");
    let flag = |name: &str, fallback: bool| {
        raw_ops
            .and_then(|ops| ops.get(name))
            .and_then(Value::as_bool)
            .unwrap_or(fallback)
    };
    let operations = Operations {
        add: flag("add", defaults.operations.add),
        sub: flag("sub", defaults.operations.sub),
        mul: flag("mul", defaults.operations.mul),
        div: flag("div", defaults.operations.div),
    };

    Settings {
        duration,
        reveal_delay,
        operations,
        add_range: normalize_range(raw.get("addRange"), defaults.add_range, ADD_FLOOR),
        mul_range: normalize_range(raw.get("mulRange"), defaults.mul_range, MUL_FLOOR),
    }
}
