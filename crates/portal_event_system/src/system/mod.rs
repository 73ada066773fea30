/// Event registry, split into construction, registration, emission and stats.
mod core;
mod emitters;
mod handlers;
mod stats;

pub use self::core::EventSystem;
pub use self::stats::EventSystemStats;
