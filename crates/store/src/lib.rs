//! Single-writer application store: actions, reducer, effects and view-model projections.

pub mod action;
pub mod bus;
pub mod command;
pub mod effects;
pub mod persist;
pub mod reducer;
pub mod request;
pub mod runtime;
pub mod state;
pub mod view_model;

pub use action::Action;
pub use bus::{BusEvent, EventBus, NoticeLevel};
pub use command::Command;
pub use effects::{EffectError, Effects};
pub use reducer::reduce;
pub use request::{RequestKey, RequestToken};
pub use runtime::{spawn_store, StoreClosed, StoreHandle};
pub use state::AppState;
