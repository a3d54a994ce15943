//! Session bookkeeping shared between the HTTP surface and the apartment.

mod registry;
mod teletext;

pub use registry::{LiveStreamEntry, RecordingKey, RecordingSession, RemovedStream, SessionRegistry};
pub use teletext::TeletextCaptureState;
