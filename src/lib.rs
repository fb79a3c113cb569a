// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod error;
pub mod form;
pub mod problem;
pub mod round;
pub mod runtime;
pub mod settings;
pub mod store;
pub mod ui;
pub mod util;

pub use error::{DrillError, Result};
pub use problem::{generate, Operation, Problem};
pub use round::{Phase, Round, RoundEvent, RoundSummary};
pub use settings::{normalize, OperandRange, Operations, Settings};
