//! Application state module

mod app_state;
mod form_panel;
mod forms;

pub use app_state::*;
pub use form_panel::*;
pub use forms::*;
