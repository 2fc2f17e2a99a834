//! Application services for sandbox control.

mod interrupt;

pub use interrupt::{INTERRUPT_ACK_TIMEOUT, InterruptDispatcher, InterruptError, InterruptOutcome};
