//! Per-language settings: patterns, break sets, replacement/abbreviation regexes, currency
//! tables, and the callbacks into external collaborators (phonemizer, POS tagger). Settings are
//! immutable after construction; the only mutation anywhere near this type is the lazy,
//! warn-once language cache in [`crate::Processor`].
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// `lookup(text, role) -> phonemes`, used before falling back to `guess`.
pub type PhonemeLookupFn = Arc<dyn Fn(&str, &str) -> Option<Vec<String>> + Send + Sync>;
/// `guess(text, role) -> phonemes`, the grapheme-to-phoneme fallback.
pub type PhonemeGuessFn = Arc<dyn Fn(&str, &str) -> Option<Vec<String>> + Send + Sync>;
/// `tag(word texts) -> tags`, called once per sentence.
pub type PosTaggerFn = Arc<dyn Fn(&[String]) -> Vec<String> + Send + Sync>;
/// Runs once per emitted sentence's word list, last chance for a language to post-process.
pub type SentencePostProcessFn = Arc<dyn Fn(&mut Vec<crate::flatten::Word>) + Send + Sync>;
/// `is_initialism(text) -> bool`.
pub type InitialismPredicateFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;
/// `split_initialism(text) -> parts`.
pub type InitialismSplitFn = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;
/// `is_non_word(text) -> bool`.
pub type NonWordPredicateFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

fn compile_alternation(mut literals: Vec<String>) -> Option<Regex> {
    if literals.is_empty() {
        return None;
    }
    // Longer literals must be tried first so greedy alternation doesn't let a short prefix win
    // over a longer one that shares it (see DESIGN NOTES: currency tie-breaking applies the same
    // logic to punctuation/break glyphs).
    literals.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
    let pattern = literals.iter().map(|l| regex::escape(l)).collect::<Vec<_>>().join("|");
    Some(Regex::new(&pattern).expect("break/punctuation alternation is built from escaped literals"))
}

/// The on-disk, serializable subset of [`Settings`] — every field a language pack loaded via
/// `serde_yaml`/`serde_json` can supply. Collaborator callbacks (`phoneme_lookup`, `pos_tagger`,
/// `sentence_post_process`, ...) aren't data, so they have no place here; wire them onto the
/// loaded [`Settings`] afterward with plain field assignment if a caller needs them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsSchema {
    pub lang: String,
    pub split_pattern: Option<String>,
    pub join_str: Option<String>,
    pub keep_whitespace: Option<bool>,
    #[serde(default)]
    pub begin_punctuations: Vec<String>,
    #[serde(default)]
    pub end_punctuations: Vec<String>,
    /// `(pattern, template)` pairs, same `$1`/named-group template syntax as [`Settings::replacements`].
    #[serde(default)]
    pub replacements: Vec<(String, String)>,
    #[serde(default)]
    pub spell_out_words: HashMap<char, String>,
    #[serde(default)]
    pub major_breaks: Vec<String>,
    #[serde(default)]
    pub minor_breaks: Vec<String>,
    #[serde(default)]
    pub word_breaks: Vec<char>,
    pub default_currency: Option<String>,
    #[serde(default)]
    pub currency_symbols: Vec<(String, String)>,
    pub default_date_format: Option<String>,
}

/// Per-language configuration. Construct via [`Settings::builder`] or [`Settings::default_for`].
#[derive(Clone)]
pub struct Settings {
    pub lang: String,
    /// Regex used to re-tokenize text on whitespace after a split/verbalize pass produces new
    /// text. Defaults to one-or-more whitespace characters, captured so the separator survives.
    pub split_pattern: Regex,
    /// Separator verbalizers join multi-word expansions with before re-tokenizing.
    pub join_str: String,
    pub keep_whitespace: bool,
    pub begin_punctuations: Vec<String>,
    pub end_punctuations: Vec<String>,
    /// Ordered `(pattern, template)` pairs; `$1`-style capture references in `template` are
    /// substituted by `regex::Regex::replace`.
    pub replacements: Vec<(Regex, String)>,
    /// Ordered `(pattern, template)` pairs tried in insertion order against the *whole* word.
    pub abbreviations: Vec<(Regex, String)>,
    pub spell_out_words: HashMap<char, String>,
    pub major_breaks: Vec<String>,
    pub major_break_pattern: Option<Regex>,
    pub minor_breaks: Vec<String>,
    pub minor_break_pattern: Option<Regex>,
    pub word_breaks: Vec<char>,
    pub default_currency: String,
    /// `(symbol, name)` pairs, kept sorted by decreasing symbol length so e.g. `US$` wins over
    /// `$` when both are configured.
    pub currency_symbols: Vec<(String, String)>,
    pub is_initialism: Option<InitialismPredicateFn>,
    pub split_initialism: Option<InitialismSplitFn>,
    pub is_non_word: Option<NonWordPredicateFn>,
    pub default_date_format: String,
    pub phoneme_lookup: Option<PhonemeLookupFn>,
    pub phoneme_guess: Option<PhonemeGuessFn>,
    pub pos_tagger: Option<PosTaggerFn>,
    pub sentence_post_process: Option<SentencePostProcessFn>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("lang", &self.lang)
            .field("major_breaks", &self.major_breaks)
            .field("minor_breaks", &self.minor_breaks)
            .field("default_currency", &self.default_currency)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Construct a reasonable default settings object for an English-like locale: standard
    /// sentence/phrase punctuation, `"`/`«`/`»` quoting, `-` as a word-break character, the
    /// `Mr.`/`Mrs.`/`Dr.`/`St.` abbreviation set, and USD as the default currency. Other
    /// languages should start from this and override the fields that differ, the way the
    /// original's per-language YAML packs layer onto shared defaults.
    pub fn default_for(lang: &str) -> Self {
        let major_breaks = vec![".".to_string(), "?".to_string(), "!".to_string()];
        let minor_breaks = vec![",".to_string(), ";".to_string(), ":".to_string()];
        let begin_punctuations = vec!["\"".to_string(), "«".to_string(), "'".to_string()];
        let end_punctuations = vec!["\"".to_string(), "»".to_string(), "'".to_string()];

        let abbreviations = build_abbreviations(lang, &major_breaks);

        Self {
            lang: lang.to_string(),
            split_pattern: Regex::new(r"(\s+)").unwrap(),
            join_str: " ".to_string(),
            keep_whitespace: true,
            major_break_pattern: compile_alternation(major_breaks.clone()),
            major_breaks,
            minor_break_pattern: compile_alternation(minor_breaks.clone()),
            minor_breaks,
            begin_punctuations,
            end_punctuations,
            replacements: Vec::new(),
            abbreviations,
            spell_out_words: default_spell_out_words(),
            word_breaks: vec!['-'],
            default_currency: default_currency_for(lang),
            currency_symbols: default_currency_symbols(lang),
            is_initialism: Some(Arc::new(|text: &str| {
                text.len() >= 2 && text.chars().all(|c| c.is_ascii_uppercase())
            })),
            split_initialism: Some(Arc::new(|text: &str| text.chars().map(|c| c.to_string()).collect())),
            is_non_word: Some(Arc::new(|text: &str| !text.chars().any(|c| c.is_alphanumeric()))),
            default_date_format: "mOy".to_string(),
            phoneme_lookup: None,
            phoneme_guess: None,
            pos_tagger: None,
            sentence_post_process: None,
        }
    }

    /// Build a full [`Settings`] from a loaded [`SettingsSchema`], layering its fields over
    /// [`Settings::default_for`] for `schema.lang`. Non-word callback slots (phoneme lookup, POS
    /// tagger, ...) come out `None` the same as the programmatic default; a caller that needs them
    /// sets them on the returned value directly.
    pub fn from_schema(schema: SettingsSchema) -> anyhow::Result<Self> {
        let mut settings = Settings::default_for(&schema.lang);

        if let Some(pattern) = &schema.split_pattern {
            settings.split_pattern = Regex::new(pattern).with_context(|| format!("invalid split_pattern {pattern:?}"))?;
        }
        if let Some(join_str) = schema.join_str {
            settings.join_str = join_str;
        }
        if let Some(keep_whitespace) = schema.keep_whitespace {
            settings.keep_whitespace = keep_whitespace;
        }
        if !schema.begin_punctuations.is_empty() {
            settings.begin_punctuations = schema.begin_punctuations;
        }
        if !schema.end_punctuations.is_empty() {
            settings.end_punctuations = schema.end_punctuations;
        }
        if !schema.replacements.is_empty() {
            settings.replacements = schema
                .replacements
                .into_iter()
                .map(|(pattern, template)| {
                    let re = Regex::new(&pattern).with_context(|| format!("invalid replacement pattern {pattern:?}"))?;
                    Ok((re, template))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
        }
        if !schema.spell_out_words.is_empty() {
            settings.spell_out_words = schema.spell_out_words;
        }
        if !schema.major_breaks.is_empty() {
            settings.major_break_pattern = compile_alternation(schema.major_breaks.clone());
            settings.major_breaks = schema.major_breaks;
        }
        if !schema.minor_breaks.is_empty() {
            settings.minor_break_pattern = compile_alternation(schema.minor_breaks.clone());
            settings.minor_breaks = schema.minor_breaks;
        }
        if !schema.word_breaks.is_empty() {
            settings.word_breaks = schema.word_breaks;
        }
        if let Some(default_currency) = schema.default_currency {
            settings.default_currency = default_currency;
        }
        if !schema.currency_symbols.is_empty() {
            let mut syms = schema.currency_symbols;
            syms.sort_by_key(|(sym, _)| std::cmp::Reverse(sym.chars().count()));
            settings.currency_symbols = syms;
        }
        if let Some(default_date_format) = schema.default_date_format {
            settings.default_date_format = default_date_format;
        }

        Ok(settings)
    }
}

fn build_abbreviations(lang: &str, major_breaks: &[String]) -> Vec<(Regex, String)> {
    let raw: &[(&str, &str)] = match lang {
        l if l.starts_with("en") => &[
            (r"(?i)\bmr\.", "Mister"),
            (r"(?i)\bmrs\.", "Misess"),
            (r"(?i)\bdr\.", "doctor"),
            (r"(?i)\bst\.", "Street"),
        ],
        _ => &[],
    };
    // A raw abbreviation pattern is auto-suffixed with an optional trailing major-break group
    // plus whitespace so `Mr.?` still matches and keeps the `?` in the expansion (DESIGN NOTES).
    let major_break_group = if major_breaks.is_empty() {
        String::new()
    } else {
        format!("(?P<brk>[{}]?\\s*)?", major_breaks.iter().map(|b| regex::escape(b)).collect::<String>())
    };
    raw.iter()
        .map(|(pattern, expansion)| {
            let full_pattern = format!("^{}{}$", pattern, major_break_group);
            let template = format!("{}${{brk}}", expansion);
            (Regex::new(&full_pattern).expect("abbreviation pattern must compile"), template)
        })
        .collect()
}

fn default_spell_out_words() -> HashMap<char, String> {
    let mut map = HashMap::new();
    map.insert('.', "point".to_string());
    map.insert('-', "dash".to_string());
    map.insert('@', "at".to_string());
    map
}

fn default_currency_for(lang: &str) -> String {
    match lang {
        l if l.starts_with("en_GB") => "pounds".to_string(),
        l if l.starts_with("de") => "euro".to_string(),
        l if l.starts_with("es") => "euro".to_string(),
        _ => "dollars".to_string(),
    }
}

fn default_currency_symbols(lang: &str) -> Vec<(String, String)> {
    let mut syms = match lang {
        l if l.starts_with("en_GB") => vec![("£".to_string(), "pounds".to_string())],
        l if l.starts_with("de") || l.starts_with("es") => vec![("€".to_string(), "euro".to_string())],
        _ => vec![("$".to_string(), "dollars".to_string())],
    };
    syms.sort_by_key(|(sym, _)| std::cmp::Reverse(sym.chars().count()));
    syms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_break_alternation_longest_first() {
        let re = compile_alternation(vec![".".to_string(), "...".to_string()]).unwrap();
        let m = re.find("...").unwrap();
        assert_eq!(m.as_str(), "...");
    }

    #[test]
    fn default_abbreviations_expand_with_trailing_break() {
        let settings = Settings::default_for("en_US");
        let (re, template) = &settings.abbreviations[0];
        let caps = re.captures("Mr.?").unwrap();
        let mut dst = String::new();
        caps.expand(template, &mut dst);
        assert_eq!(dst, "Mister?");
    }

    #[test]
    fn settings_schema_loads_from_yaml_and_overrides_defaults() {
        let yaml = r#"
lang: de_DE
default_currency: euro
currency_symbols:
  - ["€", "euro"]
word_breaks: ["-", "/"]
"#;
        let schema: SettingsSchema = serde_yaml::from_str(yaml).unwrap();
        let settings = Settings::from_schema(schema).unwrap();
        assert_eq!(settings.lang, "de_DE");
        assert_eq!(settings.default_currency, "euro");
        assert_eq!(settings.word_breaks, vec!['-', '/']);
        // Fields absent from the YAML fall back to the language's programmatic default.
        assert_eq!(settings.major_breaks, vec![".".to_string(), "?".to_string(), "!".to_string()]);
    }

    #[test]
    fn settings_schema_round_trips_through_json() {
        let schema = SettingsSchema {
            lang: "en_US".to_string(),
            default_currency: Some("dollars".to_string()),
            ..SettingsSchema::default()
        };
        let json = serde_json::to_string(&schema).unwrap();
        let back: SettingsSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lang, "en_US");
        assert_eq!(back.default_currency.as_deref(), Some("dollars"));
    }
}
