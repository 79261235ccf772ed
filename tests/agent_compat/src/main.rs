fn main() {
    println!("Run `cargo test -p agent-compat` to execute agent reply compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use notice_engine::{Engine, EngineConfig, Locale, Messages, TickOutcome};
    use notice_protocol::{IconKind, ParseError, parse};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture file as raw bytes, the way the agent delivers it.
    fn load_fixture(name: &str) -> Vec<u8> {
        let path = fixtures_dir().join(name);
        fs::read(&path).unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    fn title_of(outcome: &TickOutcome) -> &str {
        outcome
            .rendered()
            .map(|r| r.title.as_str())
            .unwrap_or_else(|| panic!("tick rendered nothing: {outcome:?}"))
    }

    #[test]
    fn poll_ok_decodes_in_order() {
        let batch = parse(&load_fixture("poll_ok.json"), false).unwrap();

        let urls: Vec<&str> = batch.notices.iter().map(|n| n.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://notice.example/view/101",
                "https://notice.example/view/102",
                "https://notice.example/view/103",
            ]
        );
        assert!(batch.notices.iter().all(|n| n.icon_kind == IconKind::Normal));
        assert_eq!(batch.disabled_count, 2);
        assert_eq!(batch.session.client_id.as_deref(), Some("CLIENT-0042"));
        assert_eq!(
            batch.session.default_domain.as_deref(),
            Some("https://notice.example")
        );
    }

    #[test]
    fn poll_error_is_discarded_whole() {
        let err = parse(&load_fixture("poll_error.json"), false).unwrap_err();
        assert!(matches!(err, ParseError::NonSuccessStatus(ref s) if s == "500"));
    }

    #[test]
    fn push_payload_is_urgent() {
        let batch = parse(&load_fixture("push.json"), true).unwrap();
        assert_eq!(batch.notices.len(), 1);
        assert_eq!(batch.notices[0].icon_kind, IconKind::Urgent);
        assert_eq!(batch.session.session_id.as_deref(), Some("beef"));
    }

    #[test]
    fn push_shape_is_not_a_poll_reply() {
        let err = parse(&load_fixture("push.json"), false).unwrap_err();
        assert!(matches!(err, ParseError::MissingBody));
    }

    #[test]
    fn poll_ok_dispatches_three_notices_then_overflow() {
        let mut engine = Engine::new(EngineConfig::default(), Messages::new(Locale::En));
        engine.ingest(parse(&load_fixture("poll_ok.json"), false).unwrap());
        assert!(engine.start_dispatch());

        let ticks: Vec<TickOutcome> = (0..4).map(|_| engine.tick()).collect();
        assert!(matches!(ticks[0], TickOutcome::Promoted(_)));
        assert_eq!(title_of(&ticks[0]), "Security patc... other 2 cases");
        assert_eq!(title_of(&ticks[1]), "Holiday hours");
        assert_eq!(title_of(&ticks[2]), "VPN certificate r...");
        assert!(matches!(ticks[3], TickOutcome::Overflow(_)));
        assert_eq!(title_of(&ticks[3]), "Notice other 2 cases");

        assert_eq!(engine.tick(), TickOutcome::Stopped);
        assert!(!engine.dispatch_running());
        assert_eq!(engine.displayed_count(), 4);
    }

    #[test]
    fn korean_overflow_title() {
        let mut engine = Engine::new(EngineConfig::default(), Messages::new(Locale::Ko));
        engine.ingest(parse(&load_fixture("poll_ok.json"), false).unwrap());

        for _ in 0..3 {
            engine.tick();
        }
        assert_eq!(title_of(&engine.tick()), "공지 외 2건");
    }

    #[test]
    fn detail_open_then_empty_tick_renders_nothing() {
        let mut engine = Engine::default();
        engine.ingest(parse(&load_fixture("poll_empty.json"), false).unwrap());
        engine.ingest(parse(&load_fixture("push.json"), true).unwrap());

        let shown = engine.tick();
        let id = shown.rendered().unwrap().id;

        let open = engine.open_detail(Some(id)).unwrap();
        assert_eq!(open.url.as_deref(), Some("https://notice.example/view/201"));
        assert_eq!(open.closed, vec![id]);
        assert_eq!(open.session.session_id.as_deref(), Some("beef"));

        assert!(engine.pending().is_empty());
        assert_eq!(engine.displayed_count(), 0);
        assert_eq!(engine.tick(), TickOutcome::Stopped);
    }
}
