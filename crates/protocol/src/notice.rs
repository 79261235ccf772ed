//! Decoded notice types.

/// Which icon a displayed notice uses.
///
/// Decided by the channel a notice arrived on, never by payload content:
/// pushed notices are urgent, polled ones are normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconKind {
    #[default]
    Normal,
    Urgent,
}

impl IconKind {
    /// Icon kind for a payload received on the given channel.
    pub fn for_channel(is_push: bool) -> Self {
        if is_push {
            IconKind::Urgent
        } else {
            IconKind::Normal
        }
    }
}

/// One itemized pending notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub url: String,
    pub title: String,
    pub icon_kind: IconKind,
}

/// Session values used to authenticate the detail view.
///
/// `None` means the payload did not carry the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    pub signing: Option<String>,
    pub client_id: Option<String>,
    pub session_id: Option<String>,
    pub default_domain: Option<String>,
}

impl SessionInfo {
    /// Overwrites every field the update carries; fields it lacks keep
    /// their previous value.
    pub fn merge(&mut self, update: SessionInfo) {
        let SessionInfo {
            signing,
            client_id,
            session_id,
            default_domain,
        } = update;

        if signing.is_some() {
            self.signing = signing;
        }
        if client_id.is_some() {
            self.client_id = client_id;
        }
        if session_id.is_some() {
            self.session_id = session_id;
        }
        if default_domain.is_some() {
            self.default_domain = default_domain;
        }
    }
}

/// The result of decoding one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeBatch {
    /// Itemized notices in source order.
    pub notices: Vec<Notice>,
    /// Notices the agent chose not to itemize.
    pub disabled_count: u32,
    pub session: SessionInfo,
}

impl NoticeBatch {
    /// Whether the batch carries anything to display.
    pub fn has_work(&self) -> bool {
        !self.notices.is_empty() || self.disabled_count > 0
    }
}
