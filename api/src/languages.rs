use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Execution service language codes known without any configuration
const DEFAULT_LANGUAGES: &[(&str, u32)] = &[
    ("c", 110),
    ("csharp", 51),
    ("cpp", 54),
    ("python", 92),
    ("javascript", 93),
    ("java", 91),
    ("sql", 82),
    ("go", 107),
    ("php", 68),
    ("lua", 64),
    ("rust", 108),
    ("ruby", 72),
    ("swift", 83),
];

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct LanguageConfig {
    /// The identifier sent by the editor (e.g. `python`)
    pub name: String,
    /// The numeric language code of the execution service
    pub id: u32,
}

pub fn default_languages() -> Vec<LanguageConfig> {
    DEFAULT_LANGUAGES
        .iter()
        .map(|(name, id)| LanguageConfig {
            name: name.to_string(),
            id: *id,
        })
        .collect()
}

/// Static mapping from a language identifier to the execution service code.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    codes: HashMap<String, u32>,
}

impl LanguageRegistry {
    pub fn new(languages: &[LanguageConfig]) -> Self {
        let codes = languages
            .iter()
            .map(|language| (language.name.clone(), language.id))
            .collect();
        LanguageRegistry { codes }
    }

    /// Identifiers are matched exactly, `Python` is not `python`.
    pub fn lookup(&self, language: &str) -> Option<u32> {
        self.codes.get(language).copied()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.codes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        LanguageRegistry::new(&default_languages())
    }
}
