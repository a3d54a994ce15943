//! Outbound notifications to the scheduler (peer coordinator).
//!
//! Notifications are fire-and-forget: they are sent outside the
//! request/response cycle and a delivery failure is logged and dropped.

use std::sync::Arc;

use log::{debug, info, warn};

use recorder_protocol::{
    AddNewRecordingArguments, EndRecordingArguments, RegisterRecorderArguments,
    StartRecordingFailedArguments,
};

#[cfg(feature = "callbacks")]
use reqwest::Client;

/// A callback to deliver to a scheduler at `base_url`.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    RegisterRecorder {
        base_url: String,
        args: RegisterRecorderArguments,
    },
    AddNewRecording {
        base_url: String,
        args: AddNewRecordingArguments,
    },
    StartRecordingFailed {
        base_url: String,
        args: StartRecordingFailedArguments,
    },
    EndRecording {
        base_url: String,
        args: EndRecordingArguments,
    },
}

/// HTTP verb used for a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackMethod {
    Put,
    Post,
}

impl SchedulerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerEvent::RegisterRecorder { .. } => "RegisterRecorder",
            SchedulerEvent::AddNewRecording { .. } => "AddNewRecording",
            SchedulerEvent::StartRecordingFailed { .. } => "StartRecordingFailed",
            SchedulerEvent::EndRecording { .. } => "EndRecording",
        }
    }

    pub fn base_url(&self) -> &str {
        match self {
            SchedulerEvent::RegisterRecorder { base_url, .. }
            | SchedulerEvent::AddNewRecording { base_url, .. }
            | SchedulerEvent::StartRecordingFailed { base_url, .. }
            | SchedulerEvent::EndRecording { base_url, .. } => base_url,
        }
    }

    pub fn method(&self) -> CallbackMethod {
        match self {
            SchedulerEvent::AddNewRecording { .. } => CallbackMethod::Post,
            _ => CallbackMethod::Put,
        }
    }

    fn path(&self) -> &'static str {
        match self {
            SchedulerEvent::RegisterRecorder { .. } => "RegisterRecorder",
            SchedulerEvent::AddNewRecording { .. } => "Recording/New",
            SchedulerEvent::StartRecordingFailed { .. } => "Recording/StartFailed",
            SchedulerEvent::EndRecording { .. } => "Recording/End",
        }
    }

    /// Absolute callback URL.
    pub fn url(&self) -> String {
        format!("{}/{}", self.base_url().trim_end_matches('/'), self.path())
    }

    /// JSON request body.
    pub fn body(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            SchedulerEvent::RegisterRecorder { args, .. } => serde_json::to_value(args),
            SchedulerEvent::AddNewRecording { args, .. } => serde_json::to_value(args),
            SchedulerEvent::StartRecordingFailed { args, .. } => serde_json::to_value(args),
            SchedulerEvent::EndRecording { args, .. } => serde_json::to_value(args),
        }
    }
}

/// Sink for scheduler callbacks. `notify` must not block.
pub trait SchedulerNotifier: Send + Sync {
    fn notify(&self, event: SchedulerEvent);
}

/// Logs callbacks without delivering them.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl SchedulerNotifier for LogNotifier {
    fn notify(&self, event: SchedulerEvent) {
        info!("[Notifier] {} -> {} (delivery disabled)", event.name(), event.url());
    }
}

/// Delivers callbacks as JSON over HTTP on the tokio runtime.
#[cfg(feature = "callbacks")]
pub struct HttpNotifier {
    client: Client,
}

#[cfg(feature = "callbacks")]
impl HttpNotifier {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn deliver(client: Client, event: SchedulerEvent) -> Result<(), String> {
        let body = event.body().map_err(|e| format!("encode: {}", e))?;
        let url = event.url();
        let request = match event.method() {
            CallbackMethod::Put => client.put(&url),
            CallbackMethod::Post => client.post(&url),
        };
        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("send: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("status {}", response.status()));
        }
        Ok(())
    }
}

#[cfg(feature = "callbacks")]
impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "callbacks")]
impl SchedulerNotifier for HttpNotifier {
    fn notify(&self, event: SchedulerEvent) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("[Notifier] no runtime, dropping {}", event.name());
            return;
        };
        let client = self.client.clone();
        handle.spawn(async move {
            let name = event.name();
            let url = event.url();
            match Self::deliver(client, event).await {
                Ok(()) => debug!("[Notifier] {} delivered to {}", name, url),
                Err(e) => warn!("[Notifier] {} to {} failed: {}", name, url, e),
            }
        });
    }
}

/// Notifier used by the binary: HTTP delivery when built with `callbacks`.
pub fn default_notifier() -> Arc<dyn SchedulerNotifier> {
    #[cfg(feature = "callbacks")]
    {
        Arc::new(HttpNotifier::new())
    }
    #[cfg(not(feature = "callbacks"))]
    {
        Arc::new(LogNotifier)
    }
}

/// Collects events for assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    events: parking_lot::Mutex<Vec<SchedulerEvent>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub(crate) fn events(&self) -> Vec<SchedulerEvent> {
        self.events.lock().clone()
    }
}

#[cfg(test)]
impl SchedulerNotifier for RecordingNotifier {
    fn notify(&self, event: SchedulerEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_event_urls_and_methods() {
        let register = SchedulerEvent::RegisterRecorder {
            base_url: "http://scheduler:49943/".to_string(),
            args: RegisterRecorderArguments {
                recorder_id: Uuid::nil(),
                name: "Recorder".to_string(),
                version: "1.0".to_string(),
            },
        };
        assert_eq!(register.url(), "http://scheduler:49943/RegisterRecorder");
        assert_eq!(register.method(), CallbackMethod::Put);

        let end = SchedulerEvent::EndRecording {
            base_url: "http://scheduler".to_string(),
            args: EndRecordingArguments {
                recording_file_name: "a.ts".to_string(),
                recording_stop_time_utc: Utc::now(),
                partial_recording: false,
                ok_to_move_file: false,
            },
        };
        assert_eq!(end.url(), "http://scheduler/Recording/End");
        let body = end.body().unwrap();
        assert_eq!(body["okToMoveFile"], false);
        assert_eq!(body["recordingFileName"], "a.ts");
    }

    #[test]
    fn test_notify_without_runtime_is_harmless() {
        let notifier = default_notifier();
        notifier.notify(SchedulerEvent::RegisterRecorder {
            base_url: "http://127.0.0.1:9".to_string(),
            args: RegisterRecorderArguments {
                recorder_id: Uuid::nil(),
                name: "Recorder".to_string(),
                version: "1.0".to_string(),
            },
        });
    }
}
