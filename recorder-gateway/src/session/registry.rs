//! In-memory registry of live streams, recordings and teletext capture.
//!
//! All three maps live behind one lock so that tearing down a stream and its
//! teletext state is a single atomic step. The registry never touches the
//! hardware; callers that need a hardware effect issue the registry write
//! from inside an apartment operation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::RwLock;
use uuid::Uuid;

use recorder_protocol::{
    CardChannelAllocation, Channel, ChannelLiveState, LiveStream, TeletextPage, UpcomingProgram,
};

use crate::backend::CardInfo;
use crate::session::teletext::TeletextCaptureState;

/// A live stream plus its keep-alive bookkeeping.
#[derive(Debug, Clone)]
pub struct LiveStreamEntry {
    pub stream: LiveStream,
    pub last_keep_alive: Instant,
}

/// A stream removed from the registry, with what was torn down alongside it.
#[derive(Debug, Clone)]
pub struct RemovedStream {
    pub stream: LiveStream,
    pub had_teletext: bool,
}

/// Recordings are keyed by card and program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordingKey {
    pub card_id: String,
    pub upcoming_program_id: Uuid,
}

impl RecordingKey {
    pub fn new(allocation: &CardChannelAllocation, program: &UpcomingProgram) -> Self {
        Self {
            card_id: allocation.card_id.clone(),
            upcoming_program_id: program.upcoming_program_id,
        }
    }
}

/// An in-progress recording.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub allocation: CardChannelAllocation,
    pub program: UpcomingProgram,
    pub scheduler_base_url: String,
    pub start_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,
    pub file_name: String,
    pub used_suggested_name: bool,
    pub running: bool,
}

impl RecordingSession {
    pub fn key(&self) -> RecordingKey {
        RecordingKey::new(&self.allocation, &self.program)
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    streams: HashMap<u64, LiveStreamEntry>,
    recordings: HashMap<RecordingKey, RecordingSession>,
    teletext: HashMap<u64, TeletextCaptureState>,
    cards: Vec<CardInfo>,
}

impl RegistryState {
    fn remove_stream(&mut self, stream_id: u64) -> Option<RemovedStream> {
        let entry = self.streams.remove(&stream_id)?;
        let had_teletext = self.teletext.remove(&stream_id).is_some();
        Some(RemovedStream {
            stream: entry.stream,
            had_teletext,
        })
    }

    fn busy_cards(&self, ignore_stream: Option<u64>) -> HashSet<&str> {
        self.streams
            .values()
            .filter(|e| Some(e.stream.stream_id) != ignore_stream)
            .map(|e| e.stream.card_id.as_str())
            .chain(self.recordings.keys().map(|k| k.card_id.as_str()))
            .collect()
    }
}

fn is_expired(entry: &LiveStreamEntry, now: Instant, timeout: Duration) -> bool {
    now.saturating_duration_since(entry.last_keep_alive) > timeout
}

/// Registry for tracking live streams, recordings and teletext capture.
#[derive(Debug)]
pub struct SessionRegistry {
    state: RwLock<RegistryState>,
    next_stream_id: AtomicU64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            next_stream_id: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh stream identifier.
    pub fn next_stream_id(&self) -> u64 {
        self.next_stream_id.fetch_add(1, Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Live streams
    // ------------------------------------------------------------------

    /// Insert or replace a stream and mark it alive at `now`.
    ///
    /// Replacing a stream that was retuned to another channel drops its
    /// teletext state; returns whether teletext state was dropped.
    pub fn put_stream(&self, stream: LiveStream, now: Instant) -> bool {
        let mut state = self.state.write();
        let stream_id = stream.stream_id;
        let channel_changed = state
            .streams
            .get(&stream_id)
            .map(|e| e.stream.channel.channel_id != stream.channel.channel_id)
            .unwrap_or(false);
        state.streams.insert(
            stream_id,
            LiveStreamEntry {
                stream,
                last_keep_alive: now,
            },
        );
        channel_changed && state.teletext.remove(&stream_id).is_some()
    }

    pub fn get_stream(&self, stream_id: u64) -> Option<LiveStream> {
        self.state.read().streams.get(&stream_id).map(|e| e.stream.clone())
    }

    pub fn get_stream_entry(&self, stream_id: u64) -> Option<LiveStreamEntry> {
        self.state.read().streams.get(&stream_id).cloned()
    }

    /// A stream that has not been silent for longer than `timeout`.
    ///
    /// Expired entries awaiting the sweep are reported as absent.
    pub fn get_live_stream(&self, stream_id: u64, now: Instant, timeout: Duration) -> Option<LiveStream> {
        self.state
            .read()
            .streams
            .get(&stream_id)
            .filter(|e| !is_expired(e, now, timeout))
            .map(|e| e.stream.clone())
    }

    /// Remove a stream together with its teletext state.
    pub fn remove_stream(&self, stream_id: u64) -> Option<RemovedStream> {
        self.state.write().remove_stream(stream_id)
    }

    /// Snapshot of all live streams ordered by id.
    pub fn list_streams(&self) -> Vec<LiveStream> {
        let mut streams: Vec<LiveStream> = self
            .state
            .read()
            .streams
            .values()
            .map(|e| e.stream.clone())
            .collect();
        streams.sort_by_key(|s| s.stream_id);
        streams
    }

    /// Any unexpired stream currently showing `channel_id`.
    pub fn find_stream_on_channel(&self, channel_id: &Uuid, now: Instant, timeout: Duration) -> Option<LiveStream> {
        self.state
            .read()
            .streams
            .values()
            .filter(|e| &e.stream.channel.channel_id == channel_id && !is_expired(e, now, timeout))
            .min_by_key(|e| e.stream.stream_id)
            .map(|e| e.stream.clone())
    }

    /// Refresh the keep-alive timestamp of a stream that is still live.
    ///
    /// Returns false, without creating anything, if the stream is absent or
    /// has already been silent for longer than `timeout`.
    pub fn keep_alive(&self, stream_id: u64, now: Instant, timeout: Duration) -> bool {
        let mut state = self.state.write();
        match state.streams.get_mut(&stream_id) {
            Some(entry) if !is_expired(entry, now, timeout) => {
                entry.last_keep_alive = now;
                true
            }
            Some(_) => {
                debug!("[Registry] keep-alive for expired stream {}", stream_id);
                false
            }
            None => false,
        }
    }

    /// Streams silent for longer than `timeout`, ordered by id.
    ///
    /// Nothing is removed; the caller releases the hardware first and then
    /// calls [`remove_stream`](Self::remove_stream).
    pub fn expired_streams(&self, now: Instant, timeout: Duration) -> Vec<LiveStreamEntry> {
        let mut expired: Vec<LiveStreamEntry> = self
            .state
            .read()
            .streams
            .values()
            .filter(|e| is_expired(e, now, timeout))
            .cloned()
            .collect();
        expired.sort_by_key(|e| e.stream.stream_id);
        expired
    }

    // ------------------------------------------------------------------
    // Recordings
    // ------------------------------------------------------------------

    /// Insert a recording; returns false if one with the same key exists.
    pub fn put_recording(&self, session: RecordingSession) -> bool {
        let mut state = self.state.write();
        let key = session.key();
        if state.recordings.contains_key(&key) {
            return false;
        }
        state.recordings.insert(key, session);
        true
    }

    pub fn get_recording(&self, key: &RecordingKey) -> Option<RecordingSession> {
        self.state.read().recordings.get(key).cloned()
    }

    pub fn remove_recording(&self, key: &RecordingKey) -> Option<RecordingSession> {
        self.state.write().recordings.remove(key)
    }

    /// Find a recording of `upcoming_program_id` on any card.
    pub fn find_recording_by_program(&self, upcoming_program_id: &Uuid) -> Option<RecordingSession> {
        self.state
            .read()
            .recordings
            .values()
            .find(|r| &r.program.upcoming_program_id == upcoming_program_id)
            .cloned()
    }

    /// Update the stop time of a running recording.
    pub fn update_stop_time(&self, key: &RecordingKey, stop_time: DateTime<Utc>) -> bool {
        match self.state.write().recordings.get_mut(key) {
            Some(session) if session.running => {
                session.stop_time = stop_time;
                true
            }
            _ => false,
        }
    }

    pub fn set_recording_running(&self, key: &RecordingKey, running: bool) {
        if let Some(session) = self.state.write().recordings.get_mut(key) {
            session.running = running;
        }
    }

    pub fn list_recordings(&self) -> Vec<RecordingSession> {
        self.state.read().recordings.values().cloned().collect()
    }

    /// Recordings whose stop time is at or before `now`.
    pub fn due_recordings(&self, now: DateTime<Utc>) -> Vec<RecordingSession> {
        self.state
            .read()
            .recordings
            .values()
            .filter(|r| r.stop_time <= now)
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Teletext
    // ------------------------------------------------------------------

    /// Create capture state for a live stream. Returns false if the stream
    /// does not exist. Starting twice keeps the existing state.
    pub fn start_teletext(&self, stream_id: u64) -> bool {
        let mut state = self.state.write();
        if !state.streams.contains_key(&stream_id) {
            return false;
        }
        state.teletext.entry(stream_id).or_default();
        true
    }

    /// Drop capture state; returns whether there was any.
    pub fn stop_teletext(&self, stream_id: u64) -> bool {
        self.state.write().teletext.remove(&stream_id).is_some()
    }

    pub fn is_grabbing(&self, stream_id: u64) -> bool {
        self.state.read().teletext.contains_key(&stream_id)
    }

    /// Cache a fetched page. Ignored if capture was stopped meanwhile.
    pub fn cache_page(&self, stream_id: u64, page: u16, sub_page: u16, fetched: &TeletextPage) {
        if let Some(capture) = self.state.write().teletext.get_mut(&stream_id) {
            capture.store(page, sub_page, fetched);
        }
    }

    /// Cached page, or `None` if the stream is not capturing.
    pub fn cached_page(&self, stream_id: u64, page: u16, sub_page: u16) -> Option<TeletextPage> {
        self.state
            .read()
            .teletext
            .get(&stream_id)
            .map(|capture| capture.page(page, sub_page))
    }

    // ------------------------------------------------------------------
    // Cards and live state
    // ------------------------------------------------------------------

    pub fn set_cards(&self, cards: Vec<CardInfo>) {
        self.state.write().cards = cards;
    }

    /// Live state of each channel, ignoring the caller's own stream.
    pub fn channels_live_state(
        &self,
        channels: &[Channel],
        ignore_stream: Option<u64>,
    ) -> Vec<ChannelLiveState> {
        let state = self.state.read();
        let busy = state.busy_cards(ignore_stream);

        channels
            .iter()
            .map(|channel| {
                let already_live = state.streams.values().any(|e| {
                    Some(e.stream.stream_id) != ignore_stream
                        && e.stream.channel.channel_id == channel.channel_id
                });
                if already_live {
                    return ChannelLiveState::Tunable;
                }

                let mut capable = state.cards.iter().filter(|c| c.can_tune(&channel.channel_id)).peekable();
                if capable.peek().is_none() {
                    ChannelLiveState::NotTunable
                } else if capable.any(|c| !busy.contains(c.card_id.as_str())) {
                    ChannelLiveState::Tunable
                } else {
                    ChannelLiveState::NoFreeCard
                }
            })
            .collect()
    }
}
