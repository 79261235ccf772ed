//! Engine state: queue, displayed notifications, session, and tray flags.

use std::collections::BTreeMap;

use notice_protocol::{Notice, NoticeBatch, SessionInfo};
use notice_tray::TrayStatus;

use crate::dispatch::DisplayId;
use crate::queue::NoticeQueue;
use crate::status::derive_status;
use crate::text::Messages;
use crate::{DISPLAY_LIMIT, TITLE_LIMIT};

/// Limits applied by the dispatch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum notifications on screen at once.
    pub display_limit: usize,
    /// Character budget of a displayed title.
    pub title_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display_limit: DISPLAY_LIMIT,
            title_limit: TITLE_LIMIT,
        }
    }
}

/// What the detail view should show after the user acted on a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailOpen {
    /// Notice URL, or the session's default domain when the notice has none.
    pub url: Option<String>,
    /// Session values for the detail view's cookies.
    pub session: SessionInfo,
    /// Notifications dropped from the displayed set; the display sink
    /// should close them.
    pub closed: Vec<DisplayId>,
}

/// The applet's whole mutable state.
///
/// Owned by one task; every method is one atomic step.
#[derive(Debug)]
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) messages: Messages,
    pub(crate) queue: NoticeQueue,
    pub(crate) displayed: BTreeMap<DisplayId, Notice>,
    pub(crate) next_id: u64,
    pub(crate) session: SessionInfo,
    pub(crate) dispatch_running: bool,
    connectivity: bool,
    service_available: bool,
    has_pending_work: bool,
}

impl Engine {
    pub fn new(config: EngineConfig, messages: Messages) -> Self {
        Self {
            config,
            messages,
            queue: NoticeQueue::new(),
            displayed: BTreeMap::new(),
            next_id: 0,
            session: SessionInfo::default(),
            dispatch_running: false,
            connectivity: false,
            service_available: false,
            has_pending_work: false,
        }
    }

    /// Absorbs a decoded batch: notices are appended, the overflow count and
    /// the session fields the batch carries are overwritten.
    pub fn ingest(&mut self, batch: NoticeBatch) {
        let NoticeBatch {
            notices,
            disabled_count,
            session,
        } = batch;

        tracing::debug!(
            notices = notices.len(),
            disabled_count,
            "ingesting notice batch"
        );

        self.queue.ingest(notices, disabled_count);
        self.session.merge(session);
        if self.queue.has_work() {
            self.has_pending_work = true;
        }
    }

    /// Whether the queue or the overflow count has anything to show.
    pub fn has_work(&self) -> bool {
        self.queue.has_work()
    }

    /// Marks the dispatch loop as running. Returns `false` when a loop is
    /// already armed, in which case the caller must not arm another.
    pub fn start_dispatch(&mut self) -> bool {
        if self.dispatch_running {
            return false;
        }
        self.dispatch_running = true;
        true
    }

    pub fn dispatch_running(&self) -> bool {
        self.dispatch_running
    }

    /// Removes a closed notification. Returns `false` for ids that are no
    /// longer displayed.
    pub fn close(&mut self, id: DisplayId) -> bool {
        self.displayed.remove(&id).is_some()
    }

    /// Opens the detail view, either for a displayed notification or, with
    /// `None`, for the default notice page.
    ///
    /// Clears the pending queue and the displayed set in one step and drops
    /// the pending-work flag. Returns `None` for an id that is not displayed.
    pub fn open_detail(&mut self, origin: Option<DisplayId>) -> Option<DetailOpen> {
        let url = match origin {
            Some(id) => {
                let notice = self.displayed.get(&id)?;
                Some(notice.url.clone()).filter(|u| !u.is_empty())
            }
            None => None,
        }
        .or_else(|| self.session.default_domain.clone());

        let closed: Vec<DisplayId> = self.displayed.keys().copied().collect();
        self.displayed.clear();
        self.queue.clear_pending();
        self.has_pending_work = false;

        Some(DetailOpen {
            url,
            session: self.session.clone(),
            closed,
        })
    }

    /// Records a network reachability transition. Returns whether it changed.
    pub fn set_connectivity(&mut self, connectivity: bool) -> bool {
        let changed = self.connectivity != connectivity;
        self.connectivity = connectivity;
        changed
    }

    /// Records a service availability transition. Returns whether it changed.
    pub fn set_service_available(&mut self, available: bool) -> bool {
        let changed = self.service_available != available;
        self.service_available = available;
        changed
    }

    pub fn connectivity(&self) -> bool {
        self.connectivity
    }

    pub fn service_available(&self) -> bool {
        self.service_available
    }

    pub fn has_pending_work(&self) -> bool {
        self.has_pending_work
    }

    /// Tray status derived from the current flags.
    pub fn tray_status(&self) -> TrayStatus {
        derive_status(
            self.connectivity,
            self.service_available,
            self.has_pending_work,
        )
    }

    pub fn pending(&self) -> &NoticeQueue {
        &self.queue
    }

    pub fn displayed_count(&self) -> usize {
        self.displayed.len()
    }

    /// Notice behind a displayed notification.
    pub fn displayed(&self, id: DisplayId) -> Option<&Notice> {
        self.displayed.get(&id)
    }

    pub fn disabled_count(&self) -> u32 {
        self.queue.disabled_count()
    }

    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default(), Messages::default())
    }
}
