mod async_task;
mod config;
mod fill;
mod host;
mod listeners;
mod pointer;
mod ratio;
mod session;
mod stroke;
mod surface;

pub use async_task::*;
pub use config::*;
pub use fill::*;
pub use host::*;
pub use listeners::*;
pub use pointer::*;
pub use ratio::*;
pub use session::*;
pub use stroke::*;
pub use surface::*;
