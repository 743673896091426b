//! Terminal UI for chatterm: the state machine, its components and the
//! render loop that drives them.

pub mod action;
pub mod app;
pub mod components;
pub mod event;
pub mod terminal;
pub mod theme;

pub use action::{Action, Effect};
pub use app::App;
pub use terminal::install_panic_hook;
