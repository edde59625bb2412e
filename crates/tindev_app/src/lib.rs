//! Tindev app library: Login and List screens, the screen router and the
//! commands behind the `tindev` binary.

pub mod commands;
pub mod error;
pub mod logging;
pub mod router;
pub mod screens;

pub use error::AppError;
pub use router::{App, Screen};
pub use screens::{CardView, ListOptions, ListScreen, ListView, LoginScreen, ScreenEvent, EMPTY_MESSAGE};
