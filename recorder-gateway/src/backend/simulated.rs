//! Configuration-driven backend used when no driver layer is present.
//!
//! Cards, channels and MAC addresses come from the config file; streams,
//! recordings and teletext capture are tracked in memory.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use log::{debug, info};
use uuid::Uuid;

use recorder_protocol::{CardChannelAllocation, Channel, ServiceTuning, TeletextPage, UpcomingProgram};

use super::{CardInfo, HardwareBackend, StartedRecording, TuneRequest, TunedStream};
use crate::error::BackendError;

/// Number of subpages the simulated capture reports for every page.
const SIMULATED_SUB_PAGES: u32 = 1;

#[derive(Debug)]
struct SimStream {
    card_id: String,
    channel: Channel,
}

pub struct SimulatedBackend {
    cards: Vec<CardInfo>,
    mac_addresses: Vec<String>,
    rtsp_base_url: String,
    streams: HashMap<u64, SimStream>,
    /// (card id, upcoming program id) -> file name
    recordings: HashMap<(String, Uuid), String>,
    teletext: HashSet<u64>,
}

impl SimulatedBackend {
    pub fn new(cards: Vec<CardInfo>, mac_addresses: Vec<String>, rtsp_base_url: impl Into<String>) -> Self {
        Self {
            cards,
            mac_addresses,
            rtsp_base_url: rtsp_base_url.into(),
            streams: HashMap::new(),
            recordings: HashMap::new(),
            teletext: HashSet::new(),
        }
    }

    /// Cards able to tune `channel_id`, best first.
    fn candidates(&self, channel_id: &Uuid, reverse: bool) -> Vec<&CardInfo> {
        let mut cards: Vec<&CardInfo> = self.cards.iter().filter(|c| c.can_tune(channel_id)).collect();
        cards.sort_by(|a, b| b.priority.cmp(&a.priority));
        if reverse {
            cards.reverse();
        }
        cards
    }

    fn card_busy(&self, card_id: &str, ignore_stream: u64) -> bool {
        self.streams
            .iter()
            .any(|(id, s)| *id != ignore_stream && s.card_id == card_id)
            || self.recordings.keys().any(|(card, _)| card == card_id)
    }

    fn card(&self, card_id: &str) -> Option<&CardInfo> {
        self.cards.iter().find(|c| c.card_id == card_id)
    }
}

impl HardwareBackend for SimulatedBackend {
    fn cards(&mut self) -> Result<Vec<CardInfo>, BackendError> {
        Ok(self.cards.clone())
    }

    fn mac_addresses(&mut self) -> Result<Vec<String>, BackendError> {
        Ok(self.mac_addresses.clone())
    }

    fn allocate_card(
        &mut self,
        channel: &Channel,
        already_allocated: &[CardChannelAllocation],
        use_reverse_priority: bool,
    ) -> Result<Option<String>, BackendError> {
        let card = self
            .candidates(&channel.channel_id, use_reverse_priority)
            .into_iter()
            .find(|c| !already_allocated.iter().any(|a| a.card_id == c.card_id))
            .map(|c| c.card_id.clone());
        debug!("[Simulated] allocate {} -> {:?}", channel.display_name, card);
        Ok(card)
    }

    fn tune(&mut self, request: TuneRequest<'_>) -> Result<TunedStream, BackendError> {
        let channel_id = request.channel.channel_id;

        // Retune in place when the current card can take the new channel.
        let reuse = request
            .current_card
            .and_then(|id| self.card(id))
            .filter(|c| c.can_tune(&channel_id))
            .map(|c| c.card_id.clone());

        let card_id = match reuse {
            Some(card_id) => card_id,
            None => {
                let candidates = self.candidates(&channel_id, true);
                if candidates.is_empty() {
                    return Err(BackendError::NotTunable(request.channel.display_name.clone()));
                }
                candidates
                    .into_iter()
                    .filter(|c| !request.excluded_cards.contains(&c.card_id))
                    .find(|c| !self.card_busy(&c.card_id, request.stream_id))
                    .map(|c| c.card_id.clone())
                    .ok_or(BackendError::NoFreeCard)?
            }
        };

        info!(
            "[Simulated] stream {} tuned to {} on card {}",
            request.stream_id, request.channel.display_name, card_id
        );
        self.streams.insert(
            request.stream_id,
            SimStream {
                card_id: card_id.clone(),
                channel: request.channel.clone(),
            },
        );
        Ok(TunedStream {
            card_id,
            rtsp_url: format!("{}/stream{}", self.rtsp_base_url.trim_end_matches('/'), request.stream_id),
            timeshift_file: None,
        })
    }

    fn stop_stream(&mut self, stream_id: u64) -> Result<(), BackendError> {
        self.teletext.remove(&stream_id);
        self.streams
            .remove(&stream_id)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("stream {}", stream_id)))
    }

    fn tuning_details(&mut self, stream_id: u64) -> Result<Option<ServiceTuning>, BackendError> {
        Ok(self.streams.get(&stream_id).map(|s| ServiceTuning {
            signal_source: format!("simulated:{}", s.card_id),
            name: s.channel.display_name.clone(),
            frequency_khz: None,
            original_network_id: None,
            transport_stream_id: None,
            service_id: s.channel.logical_channel_number.and_then(|n| u16::try_from(n).ok()),
        }))
    }

    fn start_recording(
        &mut self,
        allocation: &CardChannelAllocation,
        program: &UpcomingProgram,
        _start_time: DateTime<Utc>,
        _stop_time: DateTime<Utc>,
        suggested_base_file_name: &str,
    ) -> Result<StartedRecording, BackendError> {
        let card = self
            .card(&allocation.card_id)
            .ok_or_else(|| BackendError::NotFound(format!("card {}", allocation.card_id)))?;
        if !card.can_tune(&allocation.channel_id) {
            return Err(BackendError::NotTunable(program.channel.display_name.clone()));
        }

        let used_suggested_name = !suggested_base_file_name.is_empty();
        let file_name = if used_suggested_name {
            format!("{}.ts", suggested_base_file_name)
        } else {
            format!("{}.ts", program.upcoming_program_id)
        };
        self.recordings.insert(
            (allocation.card_id.clone(), program.upcoming_program_id),
            file_name.clone(),
        );
        Ok(StartedRecording {
            file_name,
            used_suggested_name,
        })
    }

    fn stop_recording(
        &mut self,
        allocation: &CardChannelAllocation,
        program: &UpcomingProgram,
    ) -> Result<(), BackendError> {
        self.recordings
            .remove(&(allocation.card_id.clone(), program.upcoming_program_id))
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("recording {}", program.upcoming_program_id)))
    }

    fn validate_running(
        &mut self,
        allocation: &CardChannelAllocation,
        program: &UpcomingProgram,
    ) -> Result<bool, BackendError> {
        Ok(self
            .recordings
            .contains_key(&(allocation.card_id.clone(), program.upcoming_program_id)))
    }

    fn has_teletext(&mut self, stream_id: u64) -> Result<bool, BackendError> {
        Ok(self.streams.contains_key(&stream_id))
    }

    fn start_teletext_capture(&mut self, stream_id: u64) -> Result<(), BackendError> {
        if !self.streams.contains_key(&stream_id) {
            return Err(BackendError::NotFound(format!("stream {}", stream_id)));
        }
        self.teletext.insert(stream_id);
        Ok(())
    }

    fn stop_teletext_capture(&mut self, stream_id: u64) -> Result<(), BackendError> {
        self.teletext.remove(&stream_id);
        Ok(())
    }

    fn fetch_teletext_page(
        &mut self,
        stream_id: u64,
        page: u16,
        sub_page: u16,
    ) -> Result<Option<TeletextPage>, BackendError> {
        if !self.teletext.contains(&stream_id) || u32::from(sub_page) > SIMULATED_SUB_PAGES {
            return Ok(None);
        }
        Ok(Some(TeletextPage {
            content: Some(Bytes::from(format!("P{}/{}", page, sub_page))),
            sub_page_count: SIMULATED_SUB_PAGES,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, priority: i32) -> CardInfo {
        CardInfo {
            card_id: id.to_string(),
            name: id.to_string(),
            priority,
            channels: Vec::new(),
        }
    }

    fn backend() -> SimulatedBackend {
        SimulatedBackend::new(vec![card("A", 10), card("B", 5)], Vec::new(), "rtsp://localhost:554/")
    }

    #[test]
    fn test_allocate_prefers_priority_and_skips_allocated() {
        let mut backend = backend();
        let c1 = Channel::new(Uuid::from_u128(1), "C1");

        assert_eq!(backend.allocate_card(&c1, &[], false).unwrap().as_deref(), Some("A"));
        assert_eq!(backend.allocate_card(&c1, &[], true).unwrap().as_deref(), Some("B"));

        let taken = [CardChannelAllocation::new("A", Uuid::from_u128(2), false)];
        assert_eq!(backend.allocate_card(&c1, &taken, false).unwrap().as_deref(), Some("B"));

        let all = [
            CardChannelAllocation::new("A", Uuid::from_u128(2), false),
            CardChannelAllocation::new("B", Uuid::from_u128(3), false),
        ];
        assert_eq!(backend.allocate_card(&c1, &all, false).unwrap(), None);
    }

    #[test]
    fn test_tune_uses_free_cards_then_fails() {
        let mut backend = backend();
        let c1 = Channel::new(Uuid::from_u128(1), "C1");
        let req = |id| TuneRequest {
            stream_id: id,
            channel: &c1,
            current_card: None,
            excluded_cards: &[],
        };

        let first = backend.tune(req(1)).unwrap();
        assert_eq!(first.card_id, "B");
        assert_eq!(first.rtsp_url, "rtsp://localhost:554/stream1");
        assert_eq!(backend.tune(req(2)).unwrap().card_id, "A");
        assert_eq!(backend.tune(req(3)), Err(BackendError::NoFreeCard));

        backend.stop_stream(1).unwrap();
        assert_eq!(backend.tune(req(3)).unwrap().card_id, "B");
    }

    #[test]
    fn test_teletext_pages_need_capture() {
        let mut backend = backend();
        let c1 = Channel::new(Uuid::from_u128(1), "C1");
        backend
            .tune(TuneRequest {
                stream_id: 1,
                channel: &c1,
                current_card: None,
                excluded_cards: &[],
            })
            .unwrap();

        assert_eq!(backend.fetch_teletext_page(1, 100, 1).unwrap(), None);
        backend.start_teletext_capture(1).unwrap();
        let page = backend.fetch_teletext_page(1, 100, 1).unwrap().unwrap();
        assert_eq!(page.content, Some(Bytes::from_static(b"P100/1")));
        assert_eq!(page.sub_page_count, 1);
    }
}
