//! Hardware backend boundary.
//!
//! The backend performs card allocation, tuning, recording and teletext
//! capture. It is not reentrant: every method takes `&mut self` and is only
//! ever invoked from the apartment dispatcher's thread.

mod simulated;

pub use simulated::SimulatedBackend;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use recorder_protocol::{CardChannelAllocation, Channel, ServiceTuning, TeletextPage, UpcomingProgram};

use crate::error::BackendError;

/// Static description of a tuner card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInfo {
    pub card_id: String,
    pub name: String,
    /// Higher priority cards are allocated first.
    pub priority: i32,
    /// Channels this card can tune. Empty means any channel.
    pub channels: Vec<Uuid>,
}

impl CardInfo {
    pub fn can_tune(&self, channel_id: &Uuid) -> bool {
        self.channels.is_empty() || self.channels.contains(channel_id)
    }
}

/// Parameters of a tune or retune.
#[derive(Debug, Clone, Copy)]
pub struct TuneRequest<'a> {
    pub stream_id: u64,
    pub channel: &'a Channel,
    /// Card currently serving the stream when retuning.
    pub current_card: Option<&'a str>,
    /// Cards that must not be used (e.g. reserved by an upcoming recording).
    pub excluded_cards: &'a [String],
}

/// Where a stream ended up after tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunedStream {
    pub card_id: String,
    pub rtsp_url: String,
    pub timeshift_file: Option<String>,
}

/// Result of starting a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedRecording {
    pub file_name: String,
    /// Whether the suggested base file name was honored.
    pub used_suggested_name: bool,
}

/// Non-reentrant driver-facing operations.
pub trait HardwareBackend: Send {
    /// Cheap liveness check of the driver layer.
    fn ping(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn cards(&mut self) -> Result<Vec<CardInfo>, BackendError>;

    fn mac_addresses(&mut self) -> Result<Vec<String>, BackendError>;

    /// Pick a card for `channel` for planning purposes only.
    fn allocate_card(
        &mut self,
        channel: &Channel,
        already_allocated: &[CardChannelAllocation],
        use_reverse_priority: bool,
    ) -> Result<Option<String>, BackendError>;

    fn tune(&mut self, request: TuneRequest<'_>) -> Result<TunedStream, BackendError>;

    fn stop_stream(&mut self, stream_id: u64) -> Result<(), BackendError>;

    fn tuning_details(&mut self, stream_id: u64) -> Result<Option<ServiceTuning>, BackendError>;

    fn start_recording(
        &mut self,
        allocation: &CardChannelAllocation,
        program: &UpcomingProgram,
        start_time: DateTime<Utc>,
        stop_time: DateTime<Utc>,
        suggested_base_file_name: &str,
    ) -> Result<StartedRecording, BackendError>;

    fn stop_recording(
        &mut self,
        allocation: &CardChannelAllocation,
        program: &UpcomingProgram,
    ) -> Result<(), BackendError>;

    fn validate_running(
        &mut self,
        allocation: &CardChannelAllocation,
        program: &UpcomingProgram,
    ) -> Result<bool, BackendError>;

    fn has_teletext(&mut self, stream_id: u64) -> Result<bool, BackendError>;

    fn start_teletext_capture(&mut self, stream_id: u64) -> Result<(), BackendError>;

    fn stop_teletext_capture(&mut self, stream_id: u64) -> Result<(), BackendError>;

    /// Returns `None` while the page has not been captured yet.
    fn fetch_teletext_page(
        &mut self,
        stream_id: u64,
        page: u16,
        sub_page: u16,
    ) -> Result<Option<TeletextPage>, BackendError>;
}
