mod config;
mod controller;
mod filter;
mod key;
mod topology;

pub use config::*;
pub use controller::*;
pub use filter::*;
pub use key::*;
pub use topology::*;
