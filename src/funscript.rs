//! Script model: timed position actions and `.funscript` file loading.
pub mod action;
pub mod loader;

pub use action::{Action, FunscriptArray};
pub use loader::Funscript;
