//! Request gateway: the operation surface of the recorder.
//!
//! Every operation is routed either through the [`ApartmentDispatcher`]
//! (anything that issues a backend command) or answered directly from the
//! [`SessionRegistry`]. See [`routing::route`] for the fixed policy.
//!
//! Registry writes that accompany a hardware effect happen inside the
//! apartment closure, after the backend call succeeded, so a failed backend
//! call never leaves a registry entry behind.

pub mod routing;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use uuid::Uuid;

use recorder_protocol::{
    validate_teletext_page, AbortRecordingArguments, AddNewRecordingArguments,
    AllocateCardArguments, ChannelLiveState, EndRecordingArguments,
    GetChannelsLiveStateArguments, InitializeArguments, LiveStream, LiveStreamResult,
    RegisterRecorderArguments, ServiceTuning, StartRecordingArguments,
    StartRecordingFailedArguments, TeletextPage, TuneLiveStreamArguments, TuneLiveStreamResponse,
    ValidateAndUpdateRecordingArguments, RECORDER_API_VERSION,
};

use crate::apartment::ApartmentDispatcher;
use crate::backend::{HardwareBackend, TuneRequest};
use crate::config::GatewayConfig;
use crate::error::{BackendError, DispatchError, GatewayError, Result};
use crate::notifier::{SchedulerEvent, SchedulerNotifier};
use crate::session::{RecordingKey, RecordingSession, SessionRegistry};

pub use routing::{route, Operation, Route};

/// Identity assigned by the scheduler through `Initialize`.
#[derive(Debug, Clone)]
struct RecorderIdentity {
    recorder_id: Uuid,
    scheduler_base_url: String,
}

enum StartOutcome {
    Started(RecordingSession),
    Duplicate,
    Infeasible(String),
}

pub struct RecorderGateway {
    dispatcher: Arc<ApartmentDispatcher>,
    registry: Arc<SessionRegistry>,
    notifier: Arc<dyn SchedulerNotifier>,
    config: GatewayConfig,
    identity: RwLock<Option<RecorderIdentity>>,
}

impl RecorderGateway {
    pub fn new(
        dispatcher: Arc<ApartmentDispatcher>,
        registry: Arc<SessionRegistry>,
        notifier: Arc<dyn SchedulerNotifier>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            dispatcher,
            registry,
            notifier,
            config,
            identity: RwLock::new(None),
        }
    }

    pub fn dispatcher(&self) -> &Arc<ApartmentDispatcher> {
        &self.dispatcher
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Recorder id stamped on new streams; nil until initialized.
    pub fn recorder_id(&self) -> Uuid {
        self.identity
            .read()
            .as_ref()
            .map(|id| id.recorder_id)
            .unwrap_or_else(Uuid::nil)
    }

    /// Run a hardware-affine operation on the apartment.
    async fn apartment<T, F>(&self, op: Operation, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn HardwareBackend) -> std::result::Result<T, BackendError> + Send + 'static,
    {
        debug_assert_eq!(route(op), Route::Apartment, "{} is not hardware-affine", op.name());
        let result = self.dispatcher.submit(op.name(), work).await;
        if let Err(e) = &result {
            match e {
                DispatchError::Unavailable => warn!("[Gateway] {} refused: apartment unavailable", op.name()),
                _ => error!("[Gateway] {} failed: {}", op.name(), e),
            }
        }
        Ok(result?)
    }

    fn direct(&self, op: Operation) {
        debug_assert_eq!(route(op), Route::Direct, "{} must be serialized", op.name());
        debug!("[Gateway] {}", op.name());
    }

    // ------------------------------------------------------------------
    // Recorder
    // ------------------------------------------------------------------

    /// Contract version; fails only if the apartment is gone.
    pub async fn ping(&self) -> Result<i32> {
        self.apartment(Operation::Ping, |backend| backend.ping()).await?;
        Ok(RECORDER_API_VERSION)
    }

    pub async fn get_mac_addresses(&self) -> Result<Vec<String>> {
        self.apartment(Operation::GetMacAddresses, |backend| backend.mac_addresses())
            .await
    }

    /// Register with the scheduler. Re-initialization replaces the identity.
    pub fn initialize(&self, recorder_id: Uuid, args: InitializeArguments) -> Result<()> {
        self.direct(Operation::Initialize);
        let base_url = args.scheduler_base_url.trim().to_string();
        if base_url.is_empty() {
            return Err(GatewayError::InvalidArgument(
                "schedulerBaseUrl must not be empty".to_string(),
            ));
        }

        let previous = self.identity.write().replace(RecorderIdentity {
            recorder_id,
            scheduler_base_url: base_url.clone(),
        });
        match previous {
            Some(prev) if prev.recorder_id != recorder_id => info!(
                "[Gateway] re-initialized as {} (was {} for {})",
                recorder_id, prev.recorder_id, prev.scheduler_base_url
            ),
            Some(_) => debug!("[Gateway] re-initialized as {}", recorder_id),
            None => info!("[Gateway] initialized as {} for {}", recorder_id, base_url),
        }

        self.notifier.notify(SchedulerEvent::RegisterRecorder {
            base_url,
            args: RegisterRecorderArguments {
                recorder_id,
                name: self.config.recorder_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        });
        Ok(())
    }

    /// Load the backend's card inventory into the registry.
    pub async fn load_cards(&self) -> Result<usize> {
        let registry = Arc::clone(&self.registry);
        self.dispatcher
            .submit("LoadCards", move |backend| {
                let cards = backend.cards()?;
                let count = cards.len();
                registry.set_cards(cards);
                Ok(count)
            })
            .await
            .map_err(GatewayError::from)
    }

    /// Advisory card choice for planning. Never reserves anything.
    pub async fn allocate_card(&self, args: AllocateCardArguments) -> Result<Option<String>> {
        self.apartment(Operation::AllocateCard, move |backend| {
            let card = match backend.allocate_card(
                &args.channel,
                &args.already_allocated,
                args.use_reverse_priority,
            ) {
                Ok(card) => card,
                Err(BackendError::NoFreeCard) | Err(BackendError::NotTunable(_)) => None,
                Err(e) => return Err(e),
            };

            Ok(card.filter(|card_id| {
                let excluded = args.already_allocated.iter().any(|a| &a.card_id == card_id);
                if excluded {
                    warn!("[Gateway] backend proposed already allocated card {}", card_id);
                }
                !excluded
            }))
        })
        .await
    }

    // ------------------------------------------------------------------
    // Recordings
    // ------------------------------------------------------------------

    pub async fn start_recording(&self, args: StartRecordingArguments) -> Result<bool> {
        let registry = Arc::clone(&self.registry);
        let work_args = args.clone();
        let outcome = self
            .apartment(Operation::StartRecording, move |backend| {
                let args = work_args;
                let key = RecordingKey::new(&args.channel_allocation, &args.recording_program);
                if registry.get_recording(&key).is_some() {
                    return Ok(StartOutcome::Duplicate);
                }

                let started = match backend.start_recording(
                    &args.channel_allocation,
                    &args.recording_program,
                    args.start_time_utc,
                    args.stop_time_utc,
                    &args.suggested_base_file_name,
                ) {
                    Ok(started) => started,
                    Err(BackendError::Fault(msg)) => return Err(BackendError::Fault(msg)),
                    Err(e) => return Ok(StartOutcome::Infeasible(e.to_string())),
                };

                let session = RecordingSession {
                    allocation: args.channel_allocation,
                    program: args.recording_program,
                    scheduler_base_url: args.scheduler_base_url,
                    start_time: Utc::now(),
                    stop_time: args.stop_time_utc,
                    file_name: started.file_name,
                    used_suggested_name: started.used_suggested_name,
                    running: true,
                };
                registry.put_recording(session.clone());
                Ok(StartOutcome::Started(session))
            })
            .await;

        match outcome {
            Ok(StartOutcome::Started(session)) => {
                info!(
                    "[Gateway] recording '{}' started on card {} -> {}",
                    session.program.title, session.allocation.card_id, session.file_name
                );
                self.notifier.notify(SchedulerEvent::AddNewRecording {
                    base_url: session.scheduler_base_url.clone(),
                    args: AddNewRecordingArguments {
                        recording_program: session.program,
                        recording_start_time_utc: session.start_time,
                        recording_file_name: session.file_name,
                    },
                });
                Ok(true)
            }
            Ok(StartOutcome::Duplicate) => {
                warn!(
                    "[Gateway] recording of {} on card {} already running",
                    args.recording_program.upcoming_program_id, args.channel_allocation.card_id
                );
                Ok(false)
            }
            Ok(StartOutcome::Infeasible(reason)) => {
                info!("[Gateway] recording '{}' not started: {}", args.recording_program.title, reason);
                self.notify_start_failed(args, reason);
                Ok(false)
            }
            Err(GatewayError::Backend(reason)) => {
                self.notify_start_failed(args, reason.clone());
                Err(GatewayError::Backend(reason))
            }
            Err(e) => Err(e),
        }
    }

    fn notify_start_failed(&self, args: StartRecordingArguments, reason: String) {
        self.notifier.notify(SchedulerEvent::StartRecordingFailed {
            base_url: args.scheduler_base_url,
            args: StartRecordingFailedArguments {
                channel_allocation: args.channel_allocation,
                recording_program: args.recording_program,
                reason,
            },
        });
    }

    /// True only if a matching recording is running and its stop time was updated.
    pub async fn validate_and_update_recording(
        &self,
        args: ValidateAndUpdateRecordingArguments,
    ) -> Result<bool> {
        let registry = Arc::clone(&self.registry);
        self.apartment(Operation::ValidateAndUpdateRecording, move |backend| {
            let key = RecordingKey::new(&args.channel_allocation, &args.recording_program);
            match registry.get_recording(&key) {
                Some(session) if session.running => {}
                _ => return Ok(false),
            }

            let running = match backend.validate_running(&args.channel_allocation, &args.recording_program) {
                Ok(running) => running,
                Err(BackendError::NotFound(_)) => false,
                Err(e) => return Err(e),
            };
            if !running {
                registry.set_recording_running(&key, false);
                return Ok(false);
            }
            Ok(registry.update_stop_time(&key, args.stop_time_utc))
        })
        .await
    }

    /// Tear down a recording and report it ended. False if none matched.
    pub async fn abort_recording(&self, args: AbortRecordingArguments) -> Result<bool> {
        let registry = Arc::clone(&self.registry);
        let program_id = args.recording_program.upcoming_program_id;
        let removed = self
            .apartment(Operation::AbortRecording, move |backend| {
                let Some(session) = registry.find_recording_by_program(&program_id) else {
                    return Ok(None);
                };
                match backend.stop_recording(&session.allocation, &session.program) {
                    Ok(()) | Err(BackendError::NotFound(_)) => {}
                    Err(e) => return Err(e),
                }
                registry.remove_recording(&session.key());
                Ok(Some(session))
            })
            .await?;

        let Some(session) = removed else {
            debug!("[Gateway] abort: no recording of {}", program_id);
            return Ok(false);
        };
        info!("[Gateway] recording '{}' aborted", session.program.title);
        self.notify_end(args.scheduler_base_url, &session, Utc::now(), true);
        Ok(true)
    }

    fn notify_end(&self, base_url: String, session: &RecordingSession, stop_time: DateTime<Utc>, partial: bool) {
        self.notifier.notify(SchedulerEvent::EndRecording {
            base_url,
            args: EndRecordingArguments {
                recording_file_name: session.file_name.clone(),
                recording_stop_time_utc: stop_time,
                partial_recording: partial,
                ok_to_move_file: !session.used_suggested_name,
            },
        });
    }

    /// Stop every recording whose stop time has passed. Returns how many ended.
    pub async fn end_due_recordings(&self, now: DateTime<Utc>) -> usize {
        let mut ended = 0;
        for session in self.registry.due_recordings(now) {
            let registry = Arc::clone(&self.registry);
            let key = session.key();
            let result = self
                .dispatcher
                .submit("EndRecording", move |backend| {
                    let Some(session) = registry.get_recording(&key) else {
                        return Ok(None);
                    };
                    match backend.stop_recording(&session.allocation, &session.program) {
                        Ok(()) | Err(BackendError::NotFound(_)) => {}
                        Err(e) => return Err(e),
                    }
                    registry.remove_recording(&key);
                    Ok(Some(session))
                })
                .await;

            match result {
                Ok(Some(session)) => {
                    info!("[Gateway] recording '{}' finished -> {}", session.program.title, session.file_name);
                    self.notify_end(session.scheduler_base_url.clone(), &session, now, false);
                    ended += 1;
                }
                Ok(None) => {}
                Err(e) => error!("[Gateway] failed to end recording '{}': {}", session.program.title, e),
            }
        }
        ended
    }

    pub fn get_recording_shares(&self) -> Vec<String> {
        self.direct(Operation::GetRecordingShares);
        self.config.recording_shares.clone()
    }

    pub fn get_timeshift_shares(&self) -> Vec<String> {
        self.direct(Operation::GetTimeshiftShares);
        self.config.timeshift_shares.clone()
    }

    // ------------------------------------------------------------------
    // Live streams
    // ------------------------------------------------------------------

    /// Tune a new stream, or retune the supplied one.
    ///
    /// Without a supplied stream, an existing stream of this recorder on the
    /// same channel is retuned instead of creating a second one.
    pub async fn tune_live_stream(&self, args: TuneLiveStreamArguments) -> Result<TuneLiveStreamResponse> {
        let registry = Arc::clone(&self.registry);
        let recorder_id = self.recorder_id();
        let timeout = self.config.keep_alive_timeout;

        let (result, stream) = self
            .apartment(Operation::TuneLiveStream, move |backend| {
                let now = Instant::now();
                // Expired streams awaiting the sweep cannot be revived.
                let existing = match &args.stream {
                    Some(requested) => match registry.get_live_stream(requested.stream_id, now, timeout) {
                        Some(current) => Some(current),
                        None => return Ok((LiveStreamResult::NoRetunePossible, None)),
                    },
                    None => registry
                        .find_stream_on_channel(&args.channel.channel_id, now, timeout)
                        .filter(|s| s.recorder_id == recorder_id),
                };

                let stream_id = existing
                    .as_ref()
                    .map(|s| s.stream_id)
                    .unwrap_or_else(|| registry.next_stream_id());
                let excluded: Vec<String> = args
                    .upcoming_recording_allocation
                    .iter()
                    .map(|a| a.card_id.clone())
                    .collect();

                let tuned = backend.tune(TuneRequest {
                    stream_id,
                    channel: &args.channel,
                    current_card: existing.as_ref().map(|s| s.card_id.as_str()),
                    excluded_cards: &excluded,
                });

                let tuned = match tuned {
                    Ok(tuned) => tuned,
                    Err(e) => {
                        let code = match &e {
                            BackendError::NoFreeCard => LiveStreamResult::NoFreeCardFound,
                            BackendError::NotTunable(_) => LiveStreamResult::ChannelTuneFailed,
                            BackendError::NotFound(_) => LiveStreamResult::NoRetunePossible,
                            BackendError::Fault(_) => {
                                error!("[Gateway] tune of {} failed: {}", args.channel.display_name, e);
                                LiveStreamResult::UnknownError
                            }
                        };
                        return Ok((code, existing));
                    }
                };

                let stream = LiveStream {
                    stream_id,
                    recorder_id: existing.as_ref().map(|s| s.recorder_id).unwrap_or(recorder_id),
                    channel: args.channel,
                    card_id: tuned.card_id,
                    rtsp_url: tuned.rtsp_url,
                    timeshift_file: tuned.timeshift_file,
                    stream_started_time: existing
                        .as_ref()
                        .map(|s| s.stream_started_time)
                        .unwrap_or_else(Utc::now),
                };
                if registry.put_stream(stream.clone(), now) {
                    if let Err(e) = backend.stop_teletext_capture(stream_id) {
                        warn!("[Gateway] stream {}: stopping stale teletext failed: {}", stream_id, e);
                    }
                }
                Ok((LiveStreamResult::Succeeded, Some(stream)))
            })
            .await?;

        match &stream {
            Some(s) if result.is_success() => info!(
                "[Gateway] stream {} live on {} (card {})",
                s.stream_id, s.channel.display_name, s.card_id
            ),
            _ => info!("[Gateway] tune finished with {:?}", result),
        }
        Ok(TuneLiveStreamResponse { result, stream })
    }

    /// Refresh a stream's keep-alive. False if unknown or already expired.
    pub async fn keep_alive(&self, stream: LiveStream) -> Result<bool> {
        let registry = Arc::clone(&self.registry);
        let timeout = self.config.keep_alive_timeout;
        self.apartment(Operation::KeepAlive, move |_| {
            Ok(registry.keep_alive(stream.stream_id, Instant::now(), timeout))
        })
        .await
    }

    /// Release a stream and its teletext state.
    ///
    /// No-op unless the caller's stream carries the recorder id the stream
    /// was tuned with.
    pub async fn stop_live_stream(&self, stream: LiveStream) -> Result<bool> {
        let registry = Arc::clone(&self.registry);
        let stream_id = stream.stream_id;
        let stopped = self
            .apartment(Operation::StopLiveStream, move |backend| {
                match registry.get_stream(stream_id) {
                    None => Ok(false),
                    Some(current) if current.recorder_id != stream.recorder_id => {
                        debug!(
                            "[Gateway] stream {} belongs to recorder {}, ignoring stop from {}",
                            stream_id, current.recorder_id, stream.recorder_id
                        );
                        Ok(false)
                    }
                    Some(_) => release_stream(backend, &registry, stream_id),
                }
            })
            .await?;
        if stopped {
            info!("[Gateway] stream {} stopped", stream_id);
        }
        Ok(stopped)
    }

    /// Stop every live stream, e.g. during shutdown.
    pub async fn stop_all_streams(&self) -> usize {
        let mut stopped = 0;
        for stream in self.registry.list_streams() {
            let registry = Arc::clone(&self.registry);
            let stream_id = stream.stream_id;
            match self
                .dispatcher
                .submit("StopAllStreams", move |backend| release_stream(backend, &registry, stream_id))
                .await
            {
                Ok(true) => stopped += 1,
                Ok(false) => {}
                Err(e) => warn!("[Gateway] failed to stop stream {}: {}", stream_id, e),
            }
        }
        stopped
    }

    /// Evict streams silent for longer than the keep-alive timeout and
    /// release their hardware. Returns how many were evicted.
    ///
    /// The scan, the backend release and the registry removal run as one
    /// apartment job, so no tune or keep-alive can interleave with them.
    pub async fn evict_expired_streams(&self, now: Instant) -> usize {
        let registry = Arc::clone(&self.registry);
        let timeout = self.config.keep_alive_timeout;
        let result = self
            .dispatcher
            .submit("EvictExpired", move |backend| {
                let mut evicted = Vec::new();
                for entry in registry.expired_streams(now, timeout) {
                    let stream_id = entry.stream.stream_id;
                    match release_stream(backend, &registry, stream_id) {
                        Ok(true) => evicted.push(entry.stream),
                        Ok(false) => {}
                        // Entry stays; the next sweep retries.
                        Err(e) => warn!("[Gateway] releasing expired stream {} failed: {}", stream_id, e),
                    }
                }
                Ok(evicted)
            })
            .await;

        match result {
            Ok(evicted) => {
                for stream in &evicted {
                    info!(
                        "[Gateway] stream {} on {} expired, released card {}",
                        stream.stream_id, stream.channel.display_name, stream.card_id
                    );
                }
                evicted.len()
            }
            Err(e) => {
                warn!("[Gateway] expiry sweep failed: {}", e);
                0
            }
        }
    }

    pub fn get_live_streams(&self) -> Vec<LiveStream> {
        self.direct(Operation::GetLiveStreams);
        self.registry.list_streams()
    }

    pub fn get_channels_live_state(&self, args: &GetChannelsLiveStateArguments) -> Vec<ChannelLiveState> {
        self.direct(Operation::GetChannelsLiveState);
        self.registry
            .channels_live_state(&args.channels, args.stream.as_ref().map(|s| s.stream_id))
    }

    pub async fn get_live_stream_tuning_details(&self, stream: LiveStream) -> Result<Option<ServiceTuning>> {
        let registry = Arc::clone(&self.registry);
        self.apartment(Operation::GetLiveStreamTuningDetails, move |backend| {
            if registry.get_stream(stream.stream_id).is_none() {
                return Ok(None);
            }
            match backend.tuning_details(stream.stream_id) {
                Err(BackendError::NotFound(_)) => Ok(None),
                other => other,
            }
        })
        .await
    }

    // ------------------------------------------------------------------
    // Teletext
    // ------------------------------------------------------------------

    pub async fn has_teletext(&self, stream: LiveStream) -> Result<bool> {
        let registry = Arc::clone(&self.registry);
        self.apartment(Operation::HasTeletext, move |backend| {
            if registry.get_stream(stream.stream_id).is_none() {
                return Ok(false);
            }
            match backend.has_teletext(stream.stream_id) {
                Err(BackendError::NotFound(_)) => Ok(false),
                other => other,
            }
        })
        .await
    }

    /// Start capturing teletext. False if the stream is not live.
    pub async fn start_grabbing_teletext(&self, stream: LiveStream) -> Result<bool> {
        let registry = Arc::clone(&self.registry);
        let stream_id = stream.stream_id;
        self.apartment(Operation::StartGrabbingTeletext, move |backend| {
            if registry.get_stream(stream_id).is_none() {
                return Ok(false);
            }
            if registry.is_grabbing(stream_id) {
                return Ok(true);
            }
            match backend.start_teletext_capture(stream_id) {
                Ok(()) => {}
                Err(BackendError::NotFound(_)) => return Ok(false),
                Err(e) => return Err(e),
            }
            if !registry.start_teletext(stream_id) {
                // Stream expired meanwhile.
                backend.stop_teletext_capture(stream_id)?;
                return Ok(false);
            }
            Ok(true)
        })
        .await
    }

    /// Stop capturing teletext. Returns whether capture was active.
    pub async fn stop_grabbing_teletext(&self, stream: LiveStream) -> Result<bool> {
        let registry = Arc::clone(&self.registry);
        let stream_id = stream.stream_id;
        self.apartment(Operation::StopGrabbingTeletext, move |backend| {
            if !registry.stop_teletext(stream_id) {
                return Ok(false);
            }
            match backend.stop_teletext_capture(stream_id) {
                Ok(()) | Err(BackendError::NotFound(_)) => Ok(true),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub fn is_grabbing_teletext(&self, stream: &LiveStream) -> bool {
        self.direct(Operation::IsGrabbingTeletext);
        self.registry.is_grabbing(stream.stream_id)
    }

    /// Fetch a page. Not ready (no content, zero subpages) unless grabbing.
    pub async fn get_teletext_page(&self, stream: LiveStream, page: u16, sub_page: u16) -> Result<TeletextPage> {
        validate_teletext_page(page, sub_page)?;

        let registry = Arc::clone(&self.registry);
        let stream_id = stream.stream_id;
        self.apartment(Operation::GetTeletextPage, move |backend| {
            if !registry.is_grabbing(stream_id) {
                return Ok(TeletextPage::not_ready());
            }
            let cached = || registry.cached_page(stream_id, page, sub_page).unwrap_or_default();
            match backend.fetch_teletext_page(stream_id, page, sub_page) {
                Ok(Some(fetched)) => {
                    registry.cache_page(stream_id, page, sub_page, &fetched);
                    Ok(fetched)
                }
                Ok(None) | Err(BackendError::NotFound(_)) => Ok(cached()),
                Err(e) => Err(e),
            }
        })
        .await
    }
}

/// Stop capture and stream on the backend, then drop the registry entry.
/// The entry survives a backend fault so the sweep can retry.
fn release_stream(
    backend: &mut dyn HardwareBackend,
    registry: &SessionRegistry,
    stream_id: u64,
) -> std::result::Result<bool, BackendError> {
    if registry.get_stream(stream_id).is_none() {
        return Ok(false);
    }
    if registry.is_grabbing(stream_id) {
        if let Err(e) = backend.stop_teletext_capture(stream_id) {
            warn!("[Gateway] stream {}: stopping teletext failed: {}", stream_id, e);
        }
    }
    match backend.stop_stream(stream_id) {
        Ok(()) | Err(BackendError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }
    Ok(registry.remove_stream(stream_id).is_some())
}
