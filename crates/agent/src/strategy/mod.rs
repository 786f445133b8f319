//! Group chat strategies.
//!
//! - [`selection`]: who speaks next
//! - [`termination`]: when the session is over

pub mod selection;
pub mod termination;

pub use selection::{AlternatingSelection, SelectionPolicy};
pub use termination::{MarkerTermination, TerminationPolicy};
