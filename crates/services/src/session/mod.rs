mod controller;
mod state;
mod timer;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::SessionController;
