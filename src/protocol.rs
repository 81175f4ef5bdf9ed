//! Messages exchanged with the preview surface.
//! Both directions are JSON objects, one per line: requests are tagged by
//! `command`, outgoing messages by `type`.

use crate::error::{Error, Result};
use crate::scanner::TemplateRecord;
use serde::{Deserialize, Serialize};

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Requests sent by the preview surface or triggered by the user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Request {
    GetTemplates,
    RenderTemplate {
        name: String,
        #[serde(default = "empty_object")]
        data: serde_json::Value,
    },
    GetTemplateData {
        name: String,
    },
    ClearTemplateData {
        name: String,
    },
    RefreshTemplates,
    ReloadHelpers,
    ClearAllData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Responses and unsolicited pushes sent to the preview surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    Templates { templates: Vec<TemplateRecord> },
    Rendered { html: String },
    Error { message: String },
    TemplateData { data: serde_json::Value },
    TemplateDataCleared,
    PartialsRegistered { count: usize },
    AutoRerender,
    ClearAllData,
    /// A user-visible notification
    Notice { level: NoticeLevel, message: String },
}

impl Message {
    pub fn notice<S: Into<String>>(level: NoticeLevel, message: S) -> Self {
        Message::Notice { level, message: message.into() }
    }

    /// Serializes the message as a single JSON line without the trailing newline.
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parses one request line.
///
/// # Errors
/// * `Error::ProtocolError` if the line is not a known request
pub fn parse_request(line: &str) -> Result<Request> {
    serde_json::from_str(line.trim()).map_err(|e| Error::ProtocolError(e.to_string()))
}
