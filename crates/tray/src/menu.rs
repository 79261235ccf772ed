//! Context menu model for the system tray.

/// Actions that can be triggered from the tray context menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Open the detail view at the default notice page.
    OpenNotices,
    /// User requested to quit the applet.
    Quit,
}

/// A single menu item.
#[derive(Debug, Clone)]
pub struct MenuItem {
    /// Display text.
    pub label: String,
    /// Whether the item is enabled (clickable).
    pub enabled: bool,
    /// Optional action triggered on click.
    pub action: Option<MenuAction>,
}

impl MenuItem {
    fn separator() -> Self {
        Self {
            label: String::new(),
            enabled: false,
            action: None,
        }
    }

    /// Whether this item is a separator placeholder.
    pub fn is_separator(&self) -> bool {
        self.label.is_empty() && self.action.is_none()
    }
}

/// Labels used to build the context menu.
#[derive(Debug, Clone)]
pub struct MenuState {
    /// Applet title shown as a disabled header.
    pub title: String,
    /// Label of the item opening the notice page.
    pub notice_label: String,
    /// Label of the quit item.
    pub quit_label: String,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            title: "Notice".into(),
            notice_label: "Notice".into(),
            quit_label: "Quit".into(),
        }
    }
}

impl MenuState {
    /// Builds the menu items.
    pub fn build_menu(&self) -> Vec<MenuItem> {
        vec![
            MenuItem {
                label: self.title.clone(),
                enabled: false,
                action: None,
            },
            MenuItem::separator(),
            MenuItem {
                label: self.notice_label.clone(),
                enabled: true,
                action: Some(MenuAction::OpenNotices),
            },
            MenuItem::separator(),
            MenuItem {
                label: self.quit_label.clone(),
                enabled: true,
                action: Some(MenuAction::Quit),
            },
        ]
    }
}
