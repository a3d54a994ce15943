//! Data contracts exchanged between the scheduler, the gateway and clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtocolError;

/// Version of the recorder contract answered by `Ping`.
pub const RECORDER_API_VERSION: i32 = 1;

/// Lowest valid teletext page number.
pub const MIN_TELETEXT_PAGE: u16 = 100;

/// Highest valid teletext page number.
pub const MAX_TELETEXT_PAGE: u16 = 899;

/// Highest valid teletext subpage number.
pub const MAX_TELETEXT_SUB_PAGE: u16 = 99;

/// Kind of service a channel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChannelType {
    #[default]
    Television,
    Radio,
}

/// A tunable source. Identity is `channel_id`; the rest is descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub channel_id: Uuid,
    pub display_name: String,
    #[serde(default)]
    pub channel_type: ChannelType,
    #[serde(default)]
    pub logical_channel_number: Option<i32>,
}

impl Channel {
    /// Create a television channel with the given id and name.
    pub fn new(channel_id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            channel_id,
            display_name: display_name.into(),
            channel_type: ChannelType::Television,
            logical_channel_number: None,
        }
    }
}

/// Advisory mapping of a channel to a card, produced by `AllocateCard`.
///
/// This is a planning record only; it does not lock the card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardChannelAllocation {
    pub card_id: String,
    pub channel_id: Uuid,
    #[serde(default)]
    pub use_reverse_priority: bool,
}

impl CardChannelAllocation {
    pub fn new(card_id: impl Into<String>, channel_id: Uuid, use_reverse_priority: bool) -> Self {
        Self {
            card_id: card_id.into(),
            channel_id,
            use_reverse_priority,
        }
    }
}

/// A program the scheduler wants recorded. Identity is `upcoming_program_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingProgram {
    pub upcoming_program_id: Uuid,
    #[serde(default)]
    pub schedule_id: Uuid,
    pub title: String,
    pub channel: Channel,
    pub start_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,
    #[serde(default)]
    pub pre_record_seconds: i32,
    #[serde(default)]
    pub post_record_seconds: i32,
}

/// Caller-visible handle to an active viewing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStream {
    pub stream_id: u64,
    pub recorder_id: Uuid,
    pub channel: Channel,
    pub card_id: String,
    pub rtsp_url: String,
    #[serde(default)]
    pub timeshift_file: Option<String>,
    pub stream_started_time: DateTime<Utc>,
}

/// Outcome of `TuneLiveStream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiveStreamResult {
    Succeeded,
    UnknownError,
    NoFreeCardFound,
    ChannelTuneFailed,
    NoRetunePossible,
    IsScrambled,
    NotSupported,
}

impl LiveStreamResult {
    pub fn is_success(self) -> bool {
        self == LiveStreamResult::Succeeded
    }
}

/// Whether a channel could be watched live right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelLiveState {
    /// Already streamed, or a free card can tune it.
    Tunable,
    /// No card is able to tune this channel at all.
    NotTunable,
    /// A capable card exists but every capable card is busy.
    NoFreeCard,
}

/// Backend-specific tuning descriptor of a live stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTuning {
    pub signal_source: String,
    pub name: String,
    #[serde(default)]
    pub frequency_khz: Option<u32>,
    #[serde(default)]
    pub original_network_id: Option<u16>,
    #[serde(default)]
    pub transport_stream_id: Option<u16>,
    #[serde(default)]
    pub service_id: Option<u16>,
}

/// Check a teletext page/subpage pair against the valid ranges.
pub fn validate_teletext_page(page: u16, sub_page: u16) -> Result<(), ProtocolError> {
    if !(MIN_TELETEXT_PAGE..=MAX_TELETEXT_PAGE).contains(&page) {
        return Err(ProtocolError::InvalidTeletextPage(page));
    }
    if sub_page > MAX_TELETEXT_SUB_PAGE {
        return Err(ProtocolError::InvalidTeletextSubPage(sub_page));
    }
    Ok(())
}

// ============================================================================
// Request arguments
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeArguments {
    pub scheduler_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateCardArguments {
    pub channel: Channel,
    #[serde(default)]
    pub already_allocated: Vec<CardChannelAllocation>,
    #[serde(default)]
    pub use_reverse_priority: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingArguments {
    pub scheduler_base_url: String,
    pub channel_allocation: CardChannelAllocation,
    pub start_time_utc: DateTime<Utc>,
    pub stop_time_utc: DateTime<Utc>,
    pub recording_program: UpcomingProgram,
    pub suggested_base_file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAndUpdateRecordingArguments {
    pub channel_allocation: CardChannelAllocation,
    pub recording_program: UpcomingProgram,
    pub stop_time_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortRecordingArguments {
    pub scheduler_base_url: String,
    pub recording_program: UpcomingProgram,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuneLiveStreamArguments {
    pub channel: Channel,
    #[serde(default)]
    pub upcoming_recording_allocation: Option<CardChannelAllocation>,
    #[serde(default)]
    pub stream: Option<LiveStream>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChannelsLiveStateArguments {
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub stream: Option<LiveStream>,
}

// ============================================================================
// Responses
// ============================================================================

/// `{ "result": ... }` envelope used by every operation that returns a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    pub result: T,
}

impl<T> ResultEnvelope<T> {
    pub fn new(result: T) -> Self {
        Self { result }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneLiveStreamResponse {
    pub result: LiveStreamResult,
    pub stream: Option<LiveStream>,
}
