//! Fixed routing of every exposed operation.

/// Where an operation executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Serialized on the apartment thread; may touch the hardware backend.
    Apartment,
    /// Answered from the session registry on the caller's task.
    Direct,
}

/// Every operation of the request surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ping,
    GetMacAddresses,
    Initialize,
    AllocateCard,
    StartRecording,
    ValidateAndUpdateRecording,
    AbortRecording,
    GetRecordingShares,
    GetTimeshiftShares,
    TuneLiveStream,
    KeepAlive,
    StopLiveStream,
    GetLiveStreams,
    GetChannelsLiveState,
    GetLiveStreamTuningDetails,
    HasTeletext,
    StartGrabbingTeletext,
    StopGrabbingTeletext,
    IsGrabbingTeletext,
    GetTeletextPage,
}

impl Operation {
    pub const fn name(self) -> &'static str {
        match self {
            Operation::Ping => "Ping",
            Operation::GetMacAddresses => "GetMacAddresses",
            Operation::Initialize => "Initialize",
            Operation::AllocateCard => "AllocateCard",
            Operation::StartRecording => "StartRecording",
            Operation::ValidateAndUpdateRecording => "ValidateAndUpdateRecording",
            Operation::AbortRecording => "AbortRecording",
            Operation::GetRecordingShares => "GetRecordingShares",
            Operation::GetTimeshiftShares => "GetTimeshiftShares",
            Operation::TuneLiveStream => "TuneLiveStream",
            Operation::KeepAlive => "KeepAlive",
            Operation::StopLiveStream => "StopLiveStream",
            Operation::GetLiveStreams => "GetLiveStreams",
            Operation::GetChannelsLiveState => "GetChannelsLiveState",
            Operation::GetLiveStreamTuningDetails => "GetLiveStreamTuningDetails",
            Operation::HasTeletext => "HasTeletext",
            Operation::StartGrabbingTeletext => "StartGrabbingTeletext",
            Operation::StopGrabbingTeletext => "StopGrabbingTeletext",
            Operation::IsGrabbingTeletext => "IsGrabbingTeletext",
            Operation::GetTeletextPage => "GetTeletextPage",
        }
    }
}

/// Routing policy. Anything that issues a backend command goes through the
/// apartment; reads of materialized state do not.
pub const fn route(op: Operation) -> Route {
    match op {
        Operation::Ping
        | Operation::GetMacAddresses
        | Operation::AllocateCard
        | Operation::StartRecording
        | Operation::ValidateAndUpdateRecording
        | Operation::AbortRecording
        | Operation::TuneLiveStream
        | Operation::KeepAlive
        | Operation::StopLiveStream
        | Operation::GetLiveStreamTuningDetails
        | Operation::HasTeletext
        | Operation::StartGrabbingTeletext
        | Operation::StopGrabbingTeletext
        | Operation::GetTeletextPage => Route::Apartment,

        Operation::Initialize
        | Operation::GetRecordingShares
        | Operation::GetTimeshiftShares
        | Operation::GetLiveStreams
        | Operation::GetChannelsLiveState
        | Operation::IsGrabbingTeletext => Route::Direct,
    }
}
