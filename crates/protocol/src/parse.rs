//! Tolerant decoder for poll replies and push payloads.
//!
//! A poll reply wraps the notice-info object in
//! `module.task.out.noti_info` behind a status gate; a push payload is the
//! notice-info object itself. Inside notice-info every field is optional.

use serde::Deserialize;
use serde_json::Value;

use crate::constants::SUCCESS_STATUS;
use crate::notice::{IconKind, Notice, NoticeBatch, SessionInfo};

/// Why a payload produced no batch.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("agent replied with status {0}")]
    NonSuccessStatus(String),

    #[error("reply carries no notice body")]
    MissingBody,
}

#[derive(Debug, Deserialize)]
struct PollReply {
    #[serde(default)]
    module: Option<PollModule>,
}

#[derive(Debug, Deserialize)]
struct PollModule {
    #[serde(default)]
    task: Option<PollTask>,
}

#[derive(Debug, Deserialize)]
struct PollTask {
    #[serde(default)]
    out: Option<PollOut>,
}

#[derive(Debug, Deserialize)]
struct PollOut {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    noti_info: Option<NoticeInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct NoticeInfo {
    #[serde(default)]
    enabled_title_view_notis: Option<Vec<Value>>,
    #[serde(default)]
    disabled_title_view_cnt: Option<Value>,
    #[serde(default)]
    signing: Option<Value>,
    #[serde(default)]
    client_id: Option<Value>,
    #[serde(default)]
    session_id: Option<Value>,
    #[serde(default)]
    default_noti_domain: Option<Value>,
}

/// Decodes one payload into a [`NoticeBatch`].
///
/// `is_push` selects the payload shape and the icon kind of every decoded
/// notice. Pure: the caller decides what to do with errors.
pub fn parse(payload: &[u8], is_push: bool) -> Result<NoticeBatch, ParseError> {
    let info = if is_push {
        serde_json::from_slice::<NoticeInfo>(payload)?
    } else {
        let reply: PollReply = serde_json::from_slice(payload)?;
        let out = reply
            .module
            .and_then(|m| m.task)
            .and_then(|t| t.out)
            .ok_or(ParseError::MissingBody)?;

        if let Some(status) = out.status.as_ref().filter(|s| !s.is_null()) {
            let status = scalar_text(status);
            if status != SUCCESS_STATUS {
                return Err(ParseError::NonSuccessStatus(status));
            }
        }

        out.noti_info.ok_or(ParseError::MissingBody)?
    };

    Ok(info.into_batch(IconKind::for_channel(is_push)))
}

impl NoticeInfo {
    fn into_batch(self, icon_kind: IconKind) -> NoticeBatch {
        let notices = self
            .enabled_title_view_notis
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_object)
            .map(|item| Notice {
                url: item.get("url").map(scalar_text).unwrap_or_default(),
                title: item.get("title").map(scalar_text).unwrap_or_default(),
                icon_kind,
            })
            .collect();

        NoticeBatch {
            notices,
            disabled_count: self
                .disabled_title_view_cnt
                .as_ref()
                .map(count_value)
                .unwrap_or(0),
            session: SessionInfo {
                signing: present_text(self.signing),
                client_id: present_text(self.client_id),
                session_id: present_text(self.session_id),
                default_domain: present_text(self.default_noti_domain),
            },
        }
    }
}

/// Text of a scalar the way the agent's other clients read it: strings
/// verbatim, `null` as empty, anything else as its JSON text.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn present_text(value: Option<Value>) -> Option<String> {
    value.filter(|v| !v.is_null()).map(|v| scalar_text(&v))
}

/// Reads a count that may arrive as a number or a numeric string.
/// Negative and unreadable values count as zero.
fn count_value(value: &Value) -> u32 {
    let n = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    };
    n.clamp(0, i64::from(u32::MAX)) as u32
}
