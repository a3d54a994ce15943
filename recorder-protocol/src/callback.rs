//! Payloads of the outbound calls made to the scheduler (peer coordinator).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{CardChannelAllocation, UpcomingProgram};

/// `PUT {scheduler}/RegisterRecorder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRecorderArguments {
    pub recorder_id: Uuid,
    pub name: String,
    pub version: String,
}

/// `POST {scheduler}/Recording/New`, sent once a recording has actually started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNewRecordingArguments {
    pub recording_program: UpcomingProgram,
    pub recording_start_time_utc: DateTime<Utc>,
    pub recording_file_name: String,
}

/// `PUT {scheduler}/Recording/StartFailed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingFailedArguments {
    pub channel_allocation: CardChannelAllocation,
    pub recording_program: UpcomingProgram,
    pub reason: String,
}

/// `PUT {scheduler}/Recording/End`
///
/// `ok_to_move_file` is false whenever the suggested file name was used,
/// in which case the scheduler must not move the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndRecordingArguments {
    pub recording_file_name: String,
    pub recording_stop_time_utc: DateTime<Utc>,
    pub partial_recording: bool,
    pub ok_to_move_file: bool,
}
