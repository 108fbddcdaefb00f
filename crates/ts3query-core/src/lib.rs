//! Core definitions shared by the ts3query crates: protocol enumerations and
//! tracing setup.

pub mod definitions;
pub mod tracing;

pub use definitions::{
    ClientType, EventType, NotifyRegisterType, ReasonId, Subsystem, TargetMode,
};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
