//! AI systems (threat routing, activation, steering tick)

pub mod steering;
pub mod threat;

// Re-export all systems
pub use steering::*;
pub use threat::*;
