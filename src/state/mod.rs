//! Session state for the annotation tool.

mod error;
mod session;

#[cfg(test)]
mod tests;

pub use error::SessionError;
pub use session::{GuardDecision, LoadedScene, SelectionActions, Session};
