//! Keypad input pipeline for the lockbox.
//!
//! Raw key codes flow through three stages, once per scan cycle:
//!
//! ```text
//! ┌──────────┐  Option<KeyCode>  ┌───────────┐  confirmed key  ┌─────────────┐
//! │ Scanner  │──────────────────►│ Debouncer │────────────────►│ EntryBuffer │
//! └──────────┘                   └───────────┘                 └─────────────┘
//!      ▲ frame (segment patterns)
//! ```
//!
//! - [`Scanner`] multiplexes the display digits and keypad rows on the shared
//!   select lines and reports at most one key per cycle.
//! - [`Debouncer`] confirms a key only after it has been seen on enough
//!   consecutive cycles, and fires once per press-and-release.
//! - [`EntryBuffer`] keeps the last four confirmed digits, most recent first.

pub mod debounce;
pub mod entry;
pub mod scanner;

pub use debounce::{DebounceState, Debouncer};
pub use entry::EntryBuffer;
pub use scanner::{ScanReport, Scanner};
