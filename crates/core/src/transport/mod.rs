//! Transport port and the pacing decorator

pub mod ports;
pub mod throttled;

pub use ports::Transport;
pub use throttled::ThrottledTransport;
