//! # Localization Tests
//!
//! Unit tests for message retrieval across the three supported languages,
//! the Russian fallback, and the menu label invariant the router depends on.

use zfd_cargo_bot::localization::{
    create_localization_manager, t_args_lang, t_lang, Lang, LocalizationManager,
};
use std::sync::Arc;

fn setup_localization() -> Arc<LocalizationManager> {
    create_localization_manager().expect("Failed to create localization manager")
}

#[test]
fn test_get_message_existing_key() {
    let manager = setup_localization();

    let message = manager.get_message_in_language("ask-tracks", "ru", None);
    assert!(message.contains("трек-номера"));
}

#[test]
fn test_get_message_nonexistent_key() {
    let manager = setup_localization();

    let message = manager.get_message_in_language("nonexistent-key", "ru", None);
    assert!(message.starts_with("Missing translation:"));
}

#[test]
fn test_unsupported_language_falls_back_to_russian() {
    let manager = setup_localization();

    // "en" is not a supported language; t_lang resolves it as Russian
    let message = t_lang(&manager, "no-tracks", "en");
    let russian = t_lang(&manager, "no-tracks", "ru");
    assert_eq!(message, russian);
}

#[test]
fn test_admin_keys_fall_back_to_russian_in_other_languages() {
    let manager = setup_localization();

    // The admin console is Russian-only; Tajik users still get a usable text
    let message = manager.get_message_in_language("admin-broadcast-prompt", "tj", None);
    assert!(message.contains("рассылки"));
}

#[test]
fn test_tajik_localization_differs_from_russian() {
    let manager = setup_localization();

    let tajik = t_lang(&manager, "menu-check-track", "tj");
    let russian = t_lang(&manager, "menu-check-track", "ru");
    assert!(!tajik.is_empty());
    assert_ne!(tajik, russian);
}

#[test]
fn test_every_language_has_all_menu_labels() {
    let manager = setup_localization();

    let keys = [
        "menu-check-track",
        "menu-my-tracks",
        "menu-calculator",
        "menu-settings",
        "menu-forbidden",
        "menu-info",
        "menu-tariffs",
        "menu-china-address",
        "menu-pickup",
        "menu-operator",
        "menu-back",
        "menu-by-weight",
        "menu-by-volume",
    ];
    for lang in Lang::ALL {
        for key in keys {
            let label = t_lang(&manager, key, lang.code());
            assert!(
                !label.starts_with("Missing"),
                "label {} missing for {}",
                key,
                lang.code()
            );
        }
    }
}

#[test]
fn test_get_message_with_args() {
    let manager = setup_localization();

    let message = t_args_lang(
        &manager,
        "status-update-push",
        &[("code", "AB-12345"), ("status", "Выдан")],
        "ru",
    );
    assert!(message.contains("AB-12345"));
    assert!(message.contains("Выдан"));
}

#[test]
fn test_calc_result_interpolation() {
    let manager = setup_localization();

    let message = t_args_lang(
        &manager,
        "calc-weight-result",
        &[("weight", "30"), ("price", "30"), ("total", "900.00")],
        "uz",
    );
    assert!(message.contains("30 kg"));
    assert!(message.contains("900.00"));
}

#[test]
fn test_language_codes_roundtrip() {
    for lang in Lang::ALL {
        assert_eq!(Lang::from_code(lang.code()), Some(lang));
    }
    assert_eq!(Lang::from_code("en"), None);
}
