pub mod gauge;
pub mod icons;
pub mod progress;

pub use gauge::Gauge;
pub use progress::TerminalUI;
