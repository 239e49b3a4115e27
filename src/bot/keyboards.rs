//! Reply keyboards and the menu label index.
//!
//! Menu labels are the router's only dispatch key for keyboard taps, matched
//! across all three languages. Every label must therefore be distinct from
//! every other screen's labels; `MenuIndex` records any collision so tests
//! can assert the invariant holds after copy changes.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use teloxide::types::{KeyboardButton, KeyboardMarkup};
use tracing::warn;

use crate::localization::{t_lang, Lang, LocalizationManager, DEFAULT_LANG};

/// What a tapped menu label means
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MenuAction {
    SelectLanguage(Lang),
    CheckTrack,
    MyTracks,
    OpenCalculator,
    Settings,
    ForbiddenGoods,
    InfoMenu,
    Tariffs,
    ChinaAddress,
    PickupPoint,
    Operator,
    BackToMain,
    CalcByWeight,
    CalcByVolume,
    AdminStats,
    AdminBroadcast,
    AdminAddTrack,
    AdminDeleteTrack,
}

impl MenuAction {
    /// Whether the action belongs to the admin console
    pub fn requires_admin(self) -> bool {
        matches!(
            self,
            MenuAction::AdminStats
                | MenuAction::AdminBroadcast
                | MenuAction::AdminAddTrack
                | MenuAction::AdminDeleteTrack
        )
    }
}

/// Every menu label key paired with its action
const LABEL_KEYS: &[(&str, MenuAction)] = &[
    ("lang-ru", MenuAction::SelectLanguage(Lang::Ru)),
    ("lang-tj", MenuAction::SelectLanguage(Lang::Tj)),
    ("lang-uz", MenuAction::SelectLanguage(Lang::Uz)),
    ("menu-check-track", MenuAction::CheckTrack),
    ("menu-my-tracks", MenuAction::MyTracks),
    ("menu-calculator", MenuAction::OpenCalculator),
    ("menu-settings", MenuAction::Settings),
    ("menu-forbidden", MenuAction::ForbiddenGoods),
    ("menu-info", MenuAction::InfoMenu),
    ("menu-tariffs", MenuAction::Tariffs),
    ("menu-china-address", MenuAction::ChinaAddress),
    ("menu-pickup", MenuAction::PickupPoint),
    ("menu-operator", MenuAction::Operator),
    ("menu-back", MenuAction::BackToMain),
    ("menu-by-weight", MenuAction::CalcByWeight),
    ("menu-by-volume", MenuAction::CalcByVolume),
    ("menu-admin-stats", MenuAction::AdminStats),
    ("menu-admin-broadcast", MenuAction::AdminBroadcast),
    ("menu-admin-add-track", MenuAction::AdminAddTrack),
    ("menu-admin-delete-track", MenuAction::AdminDeleteTrack),
];

/// Lookup from localized menu label to its action, across all languages
pub struct MenuIndex {
    actions: HashMap<String, MenuAction>,
    conflicts: Vec<String>,
}

impl MenuIndex {
    /// Build the index from the loaded translations
    pub fn build(loc: &LocalizationManager) -> Self {
        let mut actions: HashMap<String, MenuAction> = HashMap::new();
        let mut conflicts = Vec::new();

        for lang in Lang::ALL {
            for (key, action) in LABEL_KEYS {
                let label = t_lang(loc, key, lang.code());
                match actions.entry(label) {
                    // The same label may repeat across languages (e.g. the
                    // operator button) as long as it keeps the same meaning.
                    Entry::Occupied(entry) => {
                        if *entry.get() != *action {
                            warn!(label = %entry.key(), "Menu label maps to two different actions");
                            conflicts.push(entry.key().clone());
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(*action);
                    }
                }
            }
        }

        Self { actions, conflicts }
    }

    /// Resolve an incoming message text to a menu action, if it is a label
    pub fn resolve(&self, text: &str) -> Option<MenuAction> {
        self.actions.get(text).copied()
    }

    /// Labels that ambiguously map to more than one action
    pub fn conflicts(&self) -> &[String] {
        &self.conflicts
    }
}

fn button(loc: &LocalizationManager, key: &str, lang: &str) -> KeyboardButton {
    KeyboardButton::new(t_lang(loc, key, lang))
}

/// One-row language picker shown on /start and in settings
pub fn language_keyboard(loc: &LocalizationManager) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        button(loc, "lang-ru", DEFAULT_LANG),
        button(loc, "lang-tj", DEFAULT_LANG),
        button(loc, "lang-uz", DEFAULT_LANG),
    ]])
    .resize_keyboard()
}

/// Main menu shown after language selection and on "back"
pub fn main_menu_keyboard(loc: &LocalizationManager, lang: &str) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![button(loc, "menu-check-track", lang)],
        vec![button(loc, "menu-my-tracks", lang)],
        vec![button(loc, "menu-calculator", lang)],
        vec![button(loc, "menu-settings", lang)],
        vec![button(loc, "menu-forbidden", lang)],
        vec![button(loc, "menu-info", lang)],
    ])
    .resize_keyboard()
}

/// Information submenu
pub fn info_keyboard(loc: &LocalizationManager, lang: &str) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![button(loc, "menu-tariffs", lang)],
        vec![button(loc, "menu-china-address", lang)],
        vec![button(loc, "menu-pickup", lang)],
        vec![button(loc, "menu-operator", lang)],
        vec![button(loc, "menu-back", lang)],
    ])
    .resize_keyboard()
}

/// Calculator submenu
pub fn calculator_keyboard(loc: &LocalizationManager, lang: &str) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![button(loc, "menu-by-weight", lang)],
        vec![button(loc, "menu-by-volume", lang)],
        vec![button(loc, "menu-back", lang)],
    ])
    .resize_keyboard()
}

/// Admin console keyboard (Russian only)
pub fn admin_keyboard(loc: &LocalizationManager) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            button(loc, "menu-admin-stats", DEFAULT_LANG),
            button(loc, "menu-admin-broadcast", DEFAULT_LANG),
        ],
        vec![
            button(loc, "menu-admin-add-track", DEFAULT_LANG),
            button(loc, "menu-admin-delete-track", DEFAULT_LANG),
        ],
        vec![button(loc, "menu-back", DEFAULT_LANG)],
    ])
    .resize_keyboard()
}
