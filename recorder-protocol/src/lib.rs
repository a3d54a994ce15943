//! Data contracts for the tuner recorder gateway.
//!
//! This crate defines the JSON records exchanged on the recorder request
//! surface and on the outbound calls to the scheduler.
//!
//! # Response Format
//!
//! Every operation that returns a value answers with an envelope:
//!
//! ```text
//! { "result": <value> }
//! ```
//!
//! `Live/Tune` adds a `stream` field and teletext page fetches add a
//! `subPageCount` field.
//!
//! # Example
//!
//! ```rust
//! use recorder_protocol::{Channel, ResultEnvelope, TeletextPage};
//! use uuid::Uuid;
//!
//! let channel = Channel::new(Uuid::nil(), "News 24");
//! assert_eq!(channel.display_name, "News 24");
//!
//! let envelope = ResultEnvelope::new(true);
//! assert!(envelope.result);
//!
//! // A page that was not captured yet
//! let page = TeletextPage::not_ready();
//! assert!(!page.is_ready());
//! assert_eq!(page.sub_page_count, 0);
//! ```

pub mod callback;
pub mod codec;
pub mod error;
pub mod types;

pub use callback::{
    AddNewRecordingArguments, EndRecordingArguments, RegisterRecorderArguments,
    StartRecordingFailedArguments,
};
pub use codec::{decode_page, encode_page, TeletextPage};
pub use error::{ErrorBody, ErrorCode, ProtocolError};
pub use types::{
    validate_teletext_page, AbortRecordingArguments, AllocateCardArguments, CardChannelAllocation,
    Channel, ChannelLiveState, ChannelType, GetChannelsLiveStateArguments, InitializeArguments,
    LiveStream, LiveStreamResult, ResultEnvelope, ServiceTuning, StartRecordingArguments,
    TuneLiveStreamArguments, TuneLiveStreamResponse, UpcomingProgram,
    ValidateAndUpdateRecordingArguments, MAX_TELETEXT_PAGE, MAX_TELETEXT_SUB_PAGE,
    MIN_TELETEXT_PAGE, RECORDER_API_VERSION,
};
