//! Native messaging host for the tabsweep browser extension.
//!
//! Messages are a little-endian `u32` length followed by that many bytes of
//! UTF-8 JSON. The extension owns the tabs: it pushes events and snapshots,
//! and we answer with close/notify/indicator requests.

use crate::constants::MAX_MESSAGE_SIZE;
use crate::error::AppError;
use crate::models::{Settings, Tab, TabId};
use crate::service::{now_millis, BrowserActions, CleanupService, RunReport};
use crate::settings_store::SettingsStore;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// What caused a snapshot to be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    #[default]
    Timer,
    TabCreated,
    Manual,
    Command,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    #[serde(rename = "startup")]
    Startup {
        #[serde(default)]
        tabs: Vec<Tab>,
    },
    #[serde(rename = "snapshot")]
    Snapshot {
        tabs: Vec<Tab>,
        #[serde(default)]
        reason: TriggerReason,
    },
    #[serde(rename = "tab_activated")]
    TabActivated {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    #[serde(rename = "tab_updated")]
    TabUpdated {
        #[serde(rename = "tabId")]
        tab_id: TabId,
        #[serde(rename = "urlChanged", default)]
        url_changed: bool,
    },
    #[serde(rename = "tab_created")]
    TabCreated { tab: Tab },
    #[serde(rename = "tab_removed")]
    TabRemoved {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    /// Manual request from the popup or a keyboard command.
    #[serde(rename = "run_now")]
    RunNow {
        #[serde(default)]
        reason: Option<TriggerReason>,
    },
    #[serde(rename = "get_settings")]
    GetSettings,
    #[serde(rename = "update_settings")]
    UpdateSettings { settings: Settings },
    #[serde(rename = "reset_activity")]
    ResetActivity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "request_snapshot")]
    RequestSnapshot { reason: TriggerReason },
    #[serde(rename = "close_tabs")]
    CloseTabs {
        #[serde(rename = "tabIds")]
        tab_ids: Vec<TabId>,
    },
    #[serde(rename = "notify")]
    Notify { title: String, message: String },
    #[serde(rename = "warning_indicator")]
    WarningIndicator { enabled: bool },
    #[serde(rename = "settings")]
    Settings { settings: Settings },
    /// Acknowledges that a request was accepted, not that it succeeded.
    #[serde(rename = "ack")]
    Ack { request: String },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Read one framed message body.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    // Chrome Native Messaging protocol specifies little-endian byte order
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = usize::try_from(u32::from_le_bytes(len_bytes))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Message too large: {len} bytes (max: {MAX_MESSAGE_SIZE} bytes)"),
        ));
    }

    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

/// Write one framed message.
pub fn write_frame<W: Write>(writer: &mut W, message: &OutgoingMessage) -> io::Result<()> {
    let json = serde_json::to_vec(message)?;
    let len = u32::try_from(json.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()
}

/// Cloneable handle to the outgoing side of the connection.
///
/// The host loop and the scheduler thread both write through it; the mutex
/// keeps frames from interleaving.
pub struct MessageSender<W: Write> {
    writer: Arc<Mutex<W>>,
}

impl<W: Write> Clone for MessageSender<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<W: Write> MessageSender<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, W> {
        match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("MessageSender: writer mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn send(&self, message: &OutgoingMessage) -> io::Result<()> {
        let mut writer = self.lock_writer();
        write_frame(&mut *writer, message)
    }
}

impl<W: Write> BrowserActions for MessageSender<W> {
    fn close_tabs(&self, ids: &[TabId]) -> Result<(), AppError> {
        Ok(self.send(&OutgoingMessage::CloseTabs { tab_ids: ids.to_vec() })?)
    }

    fn notify(&self, title: &str, message: &str) -> Result<(), AppError> {
        Ok(self.send(&OutgoingMessage::Notify {
            title: title.to_string(),
            message: message.to_string(),
        })?)
    }

    fn set_warning_indicator(&self, enabled: bool) -> Result<(), AppError> {
        Ok(self.send(&OutgoingMessage::WarningIndicator { enabled })?)
    }
}

pub struct NativeHost<R: Read, W: Write> {
    reader: R,
    sender: MessageSender<W>,
    settings: SettingsStore,
    service: CleanupService,
}

impl<R: Read, W: Write> NativeHost<R, W> {
    pub fn new(reader: R, writer: W, settings: SettingsStore) -> Self {
        Self {
            reader,
            sender: MessageSender::new(writer),
            settings,
            service: CleanupService::new(),
        }
    }

    pub fn sender(&self) -> MessageSender<W> {
        self.sender.clone()
    }

    pub fn service(&self) -> &CleanupService {
        &self.service
    }

    /// Serve messages until the extension disconnects (`UnexpectedEof`) or the
    /// framing breaks.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            let frame = read_frame(&mut self.reader)?;
            let replies = match serde_json::from_slice::<IncomingMessage>(&frame) {
                Ok(message) => self.handle_message(message),
                Err(e) => {
                    warn!("Discarding malformed message: {e}");
                    vec![OutgoingMessage::Error {
                        message: format!("Malformed message: {e}"),
                    }]
                }
            };

            for reply in &replies {
                self.sender.send(reply)?;
            }
        }
    }

    pub fn handle_message(&mut self, message: IncomingMessage) -> Vec<OutgoingMessage> {
        let now = now_millis();
        match message {
            IncomingMessage::Startup { tabs } => {
                self.service.initialize(&tabs, now);
                self.run_cleanup(&tabs, TriggerReason::Timer, now);
                Vec::new()
            }
            IncomingMessage::Snapshot { tabs, reason } => {
                self.run_cleanup(&tabs, reason, now);
                Vec::new()
            }
            IncomingMessage::TabActivated { tab_id } => {
                self.service.on_tab_activated(tab_id, now);
                Vec::new()
            }
            IncomingMessage::TabUpdated { tab_id, url_changed } => {
                self.service.on_tab_updated(tab_id, url_changed, now);
                Vec::new()
            }
            IncomingMessage::TabCreated { tab } => {
                self.service.on_tab_created(&tab, now);
                vec![OutgoingMessage::RequestSnapshot {
                    reason: TriggerReason::TabCreated,
                }]
            }
            IncomingMessage::TabRemoved { tab_id } => {
                self.service.on_tab_removed(tab_id);
                Vec::new()
            }
            IncomingMessage::RunNow { reason } => vec![
                OutgoingMessage::Ack {
                    request: "run_now".to_string(),
                },
                OutgoingMessage::RequestSnapshot {
                    reason: reason.unwrap_or(TriggerReason::Manual),
                },
            ],
            IncomingMessage::GetSettings => vec![self.settings_reply()],
            IncomingMessage::UpdateSettings { settings } => match self.settings.update(&settings) {
                Ok((settings, changed)) => {
                    info!("Settings updated: {changed:?}");
                    self.service.on_settings_changed(&changed);
                    vec![OutgoingMessage::Settings { settings }]
                }
                Err(e) => vec![OutgoingMessage::Error { message: e.to_string() }],
            },
            IncomingMessage::ResetActivity => {
                self.service.reset_activity();
                vec![OutgoingMessage::Ack {
                    request: "reset_activity".to_string(),
                }]
            }
        }
    }

    fn run_cleanup(&mut self, tabs: &[Tab], reason: TriggerReason, now: f64) {
        match self.service.run(tabs, &self.settings, &self.sender, now) {
            RunReport::Completed { closed, close_failed } => {
                debug!(
                    "Cleanup ({reason:?}) finished: {} closed, close_failed={close_failed}",
                    closed.len()
                );
            }
            RunReport::Disabled => debug!("Cleanup ({reason:?}) skipped: disabled"),
            RunReport::Aborted { reason: why } => warn!("Cleanup ({reason:?}) aborted: {why}"),
        }
    }

    fn settings_reply(&self) -> OutgoingMessage {
        match self.settings.load() {
            Ok(settings) => OutgoingMessage::Settings { settings },
            Err(e) => OutgoingMessage::Error { message: e.to_string() },
        }
    }
}
