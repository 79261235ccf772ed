//! User-facing strings and title formatting.
//!
//! Two catalogs are built in: English and Korean. The locale is picked from
//! the usual POSIX environment variables.

/// Display language of the applet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl Locale {
    /// Picks the locale from `LC_ALL`, `LC_MESSAGES`, then `LANG`.
    pub fn from_env() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.is_empty())
            .map(|tag| Self::from_tag(&tag))
            .unwrap_or_default()
    }

    /// Maps a locale tag such as `ko_KR.UTF-8` or `ko-kr`.
    pub fn from_tag(tag: &str) -> Self {
        if tag.to_ascii_lowercase().starts_with("ko") {
            Locale::Ko
        } else {
            Locale::En
        }
    }

    /// Value of the `LANG_CODE` cookie sent to the notice page.
    pub fn lang_code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ko => "ko",
        }
    }
}

/// Message catalog for one locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn notice(&self) -> &'static str {
        match self.locale {
            Locale::En => "Notice",
            Locale::Ko => "공지",
        }
    }

    pub fn detail_view(&self) -> &'static str {
        match self.locale {
            Locale::En => "detail view",
            Locale::Ko => "자세히 보기",
        }
    }

    pub fn close(&self) -> &'static str {
        match self.locale {
            Locale::En => "Close",
            Locale::Ko => "닫기",
        }
    }

    pub fn quit(&self) -> &'static str {
        match self.locale {
            Locale::En => "Quit",
            Locale::Ko => "종료",
        }
    }

    pub fn other_cases(&self, count: usize) -> String {
        match self.locale {
            Locale::En => format!("other {count} cases"),
            Locale::Ko => format!("외 {count}건"),
        }
    }

    /// Formats a notice title for display.
    ///
    /// The title is trimmed and cut to `limit` characters with a trailing
    /// ellipsis. When `others` notices of the same batch are still waiting,
    /// four characters of the budget are reserved and a cut title also gets
    /// the "other N cases" suffix.
    pub fn notice_title(&self, title: &str, others: usize, limit: usize) -> String {
        let title = title.trim();
        let budget = if others > 0 {
            limit.saturating_sub(4)
        } else {
            limit
        };

        let Some(head) = truncate_chars(title, budget) else {
            return title.to_string();
        };

        if others > 0 {
            format!("{head}... {}", self.other_cases(others))
        } else {
            format!("{head}...")
        }
    }

    /// Title of the synthetic item standing for `count` unitemized notices.
    pub fn overflow_title(&self, count: u32) -> String {
        format!("{} {}", self.notice(), self.other_cases(count as usize))
    }
}

/// Returns the first `limit` characters of `text`, or `None` when the text
/// already fits.
fn truncate_chars(text: &str, limit: usize) -> Option<&str> {
    let (cut, _) = text.char_indices().nth(limit)?;
    Some(&text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_from_tag() {
        assert_eq!(Locale::from_tag("ko_KR.UTF-8"), Locale::Ko);
        assert_eq!(Locale::from_tag("ko-kr"), Locale::Ko);
        assert_eq!(Locale::from_tag("en_US.UTF-8"), Locale::En);
        assert_eq!(Locale::from_tag("C"), Locale::En);
    }

    #[test]
    fn lang_codes() {
        assert_eq!(Locale::Ko.lang_code(), "ko");
        assert_eq!(Locale::En.lang_code(), "en");
    }

    #[test]
    fn short_title_is_kept() {
        let m = Messages::default();
        assert_eq!(m.notice_title("  Server check  ", 0, 17), "Server check");
        assert_eq!(m.notice_title("exactly17chars!!!", 0, 17), "exactly17chars!!!");
    }

    #[test]
    fn long_title_is_cut_with_ellipsis() {
        let m = Messages::default();
        assert_eq!(
            m.notice_title("Scheduled maintenance tonight", 0, 17),
            "Scheduled mainten..."
        );
    }

    #[test]
    fn cut_counts_characters_not_bytes() {
        let m = Messages::new(Locale::Ko);
        let title = "가나다라마바사아자차카타파하가나다라마";
        let shown = m.notice_title(title, 0, 17);
        assert_eq!(shown.chars().count(), 20);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn others_shrink_budget_and_add_suffix() {
        let m = Messages::default();
        assert_eq!(
            m.notice_title("Scheduled maintenance tonight", 2, 17),
            "Scheduled mai... other 2 cases"
        );
    }

    #[test]
    fn fitting_title_with_others_has_no_suffix() {
        let m = Messages::default();
        assert_eq!(m.notice_title("Short", 3, 17), "Short");
    }

    #[test]
    fn overflow_title() {
        assert_eq!(Messages::default().overflow_title(2), "Notice other 2 cases");
        assert_eq!(Messages::new(Locale::Ko).overflow_title(5), "공지 외 5건");
    }
}
