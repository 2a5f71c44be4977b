pub mod diagnostics;
pub mod engine;
pub mod position;
pub mod session;
pub mod state;

#[cfg(test)]
mod tests;

pub use diagnostics::{DiagnosticCounters, OverlayText};
pub use engine::{DisplayFrame, DisplaySink, SessionEvent};
pub use position::{format_time, PositionModel, TooltipProbe, INDICATOR_MAX};
pub use session::{PlaybackSession, ViewScale};
pub use state::SharedState;
