//! Localization for the cargo bot's three user-facing languages.
//!
//! All display text lives in `locales/{lang}/main.ftl`; this module only
//! resolves keys. Russian is the fallback for unknown language codes and for
//! keys that exist only in the Russian resource (the admin console is
//! Russian-only by design of the original service).

use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use unic_langid::LanguageIdentifier;

/// Language the bot falls back to when a user's stored code is unknown
pub const DEFAULT_LANG: &str = "ru";

/// Supported interface languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    Ru,
    Tj,
    Uz,
}

impl Lang {
    pub const ALL: [Lang; 3] = [Lang::Ru, Lang::Tj, Lang::Uz];

    /// Language code as stored in the users table
    pub fn code(self) -> &'static str {
        match self {
            Lang::Ru => "ru",
            Lang::Tj => "tj",
            Lang::Uz => "uz",
        }
    }

    pub fn from_code(code: &str) -> Option<Lang> {
        match code {
            "ru" => Some(Lang::Ru),
            "tj" => Some(Lang::Tj),
            "uz" => Some(Lang::Uz),
            _ => None,
        }
    }
}

/// Localization manager holding one Fluent bundle per supported language
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for lang in Lang::ALL {
            // "tj"/"uz" are stored codes, not BCP-47 region tags; they parse
            // fine as bare language identifiers.
            let locale: LanguageIdentifier = lang.code().parse()?;
            let bundle = Self::create_bundle(&locale)?;
            bundles.insert(lang.code().to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: &LanguageIdentifier) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Telegram renders the isolate marks as visible garbage in some
        // clients, so interpolate without them.
        bundle.set_use_isolating(false);

        // Path relative to Cargo.toml
        let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
        let resource_path = format!("{}/locales/{}/main.ftl", manifest_dir, locale);
        if let Ok(content) = fs::read_to_string(&resource_path) {
            if let Ok(resource) = FluentResource::try_new(content) {
                let _ = bundle.add_resource(resource);
            }
        }

        Ok(bundle)
    }

    /// Get a localized message in a specific language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&[(&str, &str)]>,
    ) -> String {
        let bundle = match self.bundles.get(language) {
            Some(bundle) => bundle,
            None => match self.bundles.get(DEFAULT_LANG) {
                Some(bundle) => bundle,
                None => return format!("Missing translation: {}", key),
            },
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => {
                // Key absent in this language: fall back to the default bundle
                // (covers the Russian-only admin strings).
                if language != DEFAULT_LANG {
                    return self.get_message_in_language(key, DEFAULT_LANG, args);
                }
                return format!("Missing translation: {}", key);
            }
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let mut value = String::new();

        if let Some(args) = args {
            let fluent_args = FluentArgs::from_iter(
                args.iter().map(|(k, v)| (*k, FluentValue::from(*v))),
            );
            let _ = bundle.write_pattern(&mut value, pattern, Some(&fluent_args), &mut vec![]);
        } else {
            let _ = bundle.write_pattern(&mut value, pattern, None, &mut vec![]);
        }

        value
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }
}

/// Create a shared localization manager for use across async tasks
pub fn create_localization_manager() -> Result<Arc<LocalizationManager>> {
    Ok(Arc::new(LocalizationManager::new()?))
}

/// Convenience function to get a localized message in the user's language
pub fn t_lang(loc: &LocalizationManager, key: &str, language: &str) -> String {
    loc.get_message_in_language(key, resolve_language(loc, language), None)
}

/// Convenience function to get a localized message with arguments
pub fn t_args_lang(
    loc: &LocalizationManager,
    key: &str,
    args: &[(&str, &str)],
    language: &str,
) -> String {
    loc.get_message_in_language(key, resolve_language(loc, language), Some(args))
}

/// Map a stored language code to a supported one, defaulting to Russian
fn resolve_language<'a>(loc: &LocalizationManager, language: &'a str) -> &'a str {
    if loc.is_language_supported(language) {
        language
    } else {
        DEFAULT_LANG
    }
}
