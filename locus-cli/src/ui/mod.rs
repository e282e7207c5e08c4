//! Terminal user interface.
//!
//! - [`TerminalIndicator`] - renders the background indicator as console lines
//! - [`Console`] - interactive consumer driven by typed commands

mod console;
mod indicator;

pub use self::console::Console;
pub use self::indicator::TerminalIndicator;
