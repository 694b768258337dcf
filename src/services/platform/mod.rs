//! Platform drivers: window enumeration, window minimization and
//! do-not-disturb control.
//!
//! One implementation of each capability exists per desktop family. The
//! concrete drivers are chosen once, from the detected environment, by
//! [`create_platform`]; nothing downstream branches on the platform again.

mod dnd;
mod dry_run;
mod fallback;
mod kde;
mod kdotool;
mod kwin_script;
mod qdbus;
mod r#trait;
mod windows;
mod wmctrl;
mod x11;
mod xdotool;

#[cfg(test)]
pub mod mock;

pub use self::dnd::{DndState, InhibitionSource};
pub use self::qdbus::QDBUS_CANDIDATES;
pub use self::fallback::{x11_minimize_chain, FallbackChain, FallbackStep};
pub use self::r#trait::{create_platform, DndController, Platform, WindowDriver};
