//! Detail viewer that hands the notice page to the desktop's URL opener.

use notice_engine::{DetailRequest, DetailViewer};

/// Opens notice pages with the default browser.
///
/// An external browser cannot receive injected cookies; only their names are
/// logged.
#[derive(Debug, Default)]
pub struct BrowserViewer;

impl DetailViewer for BrowserViewer {
    fn open(&mut self, request: DetailRequest) {
        let cookies: Vec<&str> = request.cookies.iter().map(|c| c.name).collect();
        tracing::info!(url = %request.url, ?cookies, "opening notice page");

        if let Err(e) = open::that_detached(&request.url) {
            tracing::warn!(url = %request.url, error = %e, "could not open notice page");
        }
    }
}
