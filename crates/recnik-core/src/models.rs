//! Data models for recnik
//!
//! Defines the dictionary entry, its three script variants, and the
//! part-of-speech vocabulary shared by all variants.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the three script/language variants every entry carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    /// Serbian, Cyrillic script
    Cyrillic,
    /// Serbian, Latin script
    Latin,
    /// English
    English,
}

impl Script {
    /// All scripts, in column order
    pub const ALL: [Script; 3] = [Script::Cyrillic, Script::Latin, Script::English];

    /// Column prefix used by the `words` table and the changeset document
    pub fn column_prefix(self) -> &'static str {
        match self {
            Script::Cyrillic => "cyrillic",
            Script::Latin => "latin",
            Script::English => "english",
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_prefix())
    }
}

impl FromStr for Script {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cyrillic" | "cyr" | "sr" => Ok(Script::Cyrillic),
            "latin" | "lat" | "sr-latn" => Ok(Script::Latin),
            "english" | "eng" | "en" => Ok(Script::English),
            other => Err(format!(
                "Unknown script '{}'. Expected cyrillic, latin or english.",
                other
            )),
        }
    }
}

/// The fields of one script variant of an entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// The headword
    pub word: String,
    /// Part-of-speech tag, written in this variant's script
    pub part_of_speech: String,
    /// Free-text definition
    pub definition: String,
    /// Example sentence, may be empty
    pub example: String,
}

impl Variant {
    pub fn new(
        word: impl Into<String>,
        part_of_speech: impl Into<String>,
        definition: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        Self {
            word: word.into(),
            part_of_speech: part_of_speech.into(),
            definition: definition.into(),
            example: example.into(),
        }
    }

    /// Classified part of speech
    pub fn category(&self) -> PartOfSpeech {
        PartOfSpeech::classify(&self.part_of_speech)
    }
}

/// A dictionary entry
///
/// Entries are immutable once loaded. All three variants are always
/// present; missing columns are materialized as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Store-assigned identifier, never renumbered
    pub id: i64,
    pub cyrillic: Variant,
    pub latin: Variant,
    pub english: Variant,
}

impl Entry {
    pub fn new(id: i64, cyrillic: Variant, latin: Variant, english: Variant) -> Self {
        Self {
            id,
            cyrillic,
            latin,
            english,
        }
    }

    /// Get the variant for a script
    pub fn variant(&self, script: Script) -> &Variant {
        match script {
            Script::Cyrillic => &self.cyrillic,
            Script::Latin => &self.latin,
            Script::English => &self.english,
        }
    }

    /// Headword in the given script
    pub fn word(&self, script: Script) -> &str {
        &self.variant(script).word
    }

    /// Whether the headword in `script` starts with `prefix`, ignoring case
    pub fn word_starts_with(&self, script: Script, prefix: &str) -> bool {
        self.word(script)
            .to_lowercase()
            .starts_with(&prefix.to_lowercase())
    }

    /// Whether any of the three headwords contains `query`, ignoring case
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        Script::ALL
            .iter()
            .any(|&script| self.word(script).to_lowercase().contains(&query))
    }

    /// Entry shown when no real data is available
    pub fn placeholder() -> Self {
        Self {
            id: 1,
            cyrillic: Variant::new("здраво", "узвик", "поздрав", "Здраво, како си?"),
            latin: Variant::new("zdravo", "uzvik", "pozdrav", "Zdravo, kako si?"),
            english: Variant::new("hello", "exclamation", "greeting", "Hello, how are you?"),
        }
    }
}

/// Sort entries by their headword in `script`, ignoring case
///
/// Ties are broken by id so the order is stable across loads.
pub fn sort_by_word(entries: &mut [Entry], script: Script) {
    entries.sort_by(|a, b| compare_words(a.word(script), b.word(script)).then(a.id.cmp(&b.id)));
}

fn compare_words(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Display category for a part-of-speech tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Preposition,
    Conjunction,
    Interjection,
    Number,
    Particle,
    /// Unrecognized tag; a legal value, shown neutrally
    Other,
}

impl PartOfSpeech {
    /// Classify a tag written in any of the three scripts
    pub fn classify(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "именица" | "imenica" | "noun" => PartOfSpeech::Noun,
            "глагол" | "glagol" | "verb" => PartOfSpeech::Verb,
            "придев" | "pridev" | "adjective" => PartOfSpeech::Adjective,
            "прилог" | "prilog" | "adverb" => PartOfSpeech::Adverb,
            "заменица" | "zamenica" | "pronoun" => PartOfSpeech::Pronoun,
            "предлог" | "predlog" | "preposition" => PartOfSpeech::Preposition,
            "везник" | "veznik" | "conjunction" => PartOfSpeech::Conjunction,
            "узвик" | "uzvik" | "interjection" | "exclamation" => PartOfSpeech::Interjection,
            "број" | "broj" | "number" | "numeral" => PartOfSpeech::Number,
            "речца" | "rečca" | "recca" | "particle" => PartOfSpeech::Particle,
            _ => PartOfSpeech::Other,
        }
    }

    /// English label for the category
    pub fn label(self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Conjunction => "conjunction",
            PartOfSpeech::Interjection => "interjection",
            PartOfSpeech::Number => "number",
            PartOfSpeech::Particle => "particle",
            PartOfSpeech::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, cyrillic: &str, latin: &str, english: &str) -> Entry {
        Entry::new(
            id,
            Variant::new(cyrillic, "", "", ""),
            Variant::new(latin, "", "", ""),
            Variant::new(english, "", "", ""),
        )
    }

    #[test]
    fn test_variant_lookup() {
        let e = entry(7, "кућа", "kuća", "house");
        assert_eq!(e.word(Script::Cyrillic), "кућа");
        assert_eq!(e.word(Script::Latin), "kuća");
        assert_eq!(e.word(Script::English), "house");
    }

    #[test]
    fn test_prefix_is_case_insensitive_for_cyrillic() {
        let e = entry(1, "Кућа", "Kuća", "House");
        assert!(e.word_starts_with(Script::Cyrillic, "к"));
        assert!(e.word_starts_with(Script::Cyrillic, "КУ"));
        assert!(e.word_starts_with(Script::Latin, "kuć"));
        assert!(e.word_starts_with(Script::English, "h"));
        assert!(!e.word_starts_with(Script::English, "k"));
    }

    #[test]
    fn test_matches_any_headword() {
        let e = entry(1, "вода", "voda", "water");
        assert!(e.matches("ОД"));
        assert!(e.matches("vod"));
        assert!(e.matches("ATE"));
        assert!(!e.matches("fire"));
    }

    #[test]
    fn test_sort_by_word() {
        let mut entries = vec![
            entry(1, "б", "b", "zebra"),
            entry(2, "а", "a", "Apple"),
            entry(3, "в", "v", "banana"),
        ];

        sort_by_word(&mut entries, Script::English);
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        sort_by_word(&mut entries, Script::Cyrillic);
        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_classify_across_scripts() {
        assert_eq!(PartOfSpeech::classify("именица"), PartOfSpeech::Noun);
        assert_eq!(PartOfSpeech::classify("Imenica"), PartOfSpeech::Noun);
        assert_eq!(PartOfSpeech::classify("noun"), PartOfSpeech::Noun);
        assert_eq!(PartOfSpeech::classify("УЗВИК"), PartOfSpeech::Interjection);
        assert_eq!(PartOfSpeech::classify("exclamation"), PartOfSpeech::Interjection);
        assert_eq!(PartOfSpeech::classify("број"), PartOfSpeech::Number);
    }

    #[test]
    fn test_unknown_tag_is_other() {
        assert_eq!(PartOfSpeech::classify("idiom"), PartOfSpeech::Other);
        assert_eq!(PartOfSpeech::classify(""), PartOfSpeech::Other);
        assert_eq!(PartOfSpeech::Other.label(), "other");
    }

    #[test]
    fn test_script_parse() {
        assert_eq!("Cyrillic".parse::<Script>().unwrap(), Script::Cyrillic);
        assert_eq!("en".parse::<Script>().unwrap(), Script::English);
        assert!("greek".parse::<Script>().is_err());
    }

    #[test]
    fn test_placeholder_is_complete() {
        let p = Entry::placeholder();
        for script in Script::ALL {
            assert!(!p.word(script).is_empty());
        }
        assert_eq!(p.latin.category(), PartOfSpeech::Interjection);
    }
}
