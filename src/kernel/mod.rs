//! Headless view-model core (state/action/effect).

pub mod action;
pub mod chat;
pub mod coverage;
pub mod effect;
pub mod emitter;
pub mod services;
pub mod store;

pub use action::Action;
pub use effect::Effect;
pub use store::{DispatchResult, Store};
