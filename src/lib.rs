#![doc = include_str!("../README.md")]
use crate::parser::Span;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

pub use crate::error::ProcessError;
pub use crate::node::{Graph, NodeId};
pub use crate::parser::parse_ssml;
use elements::ParsedElement;
use settings::Settings;

pub mod elements;
pub mod enrich;
pub mod error;
pub mod flatten;
pub mod locale;
pub mod node;
pub mod parser;
pub mod sentence_break;
pub mod settings;
pub mod splits;
pub mod textutil;
pub mod transforms;
pub mod tree;

/// Holds a parsed SSML document: the tag-stripped text plus a depth-first event log the tree
/// builder replays to reconstruct document structure and scope.
#[derive(Clone, Debug)]
pub struct Ssml {
    text: String,
    pub(crate) tags: Vec<Span>,
    pub(crate) event_log: ParserLog,
}

type ParserLog = Vec<ParserLogEvent>;

#[derive(Clone, Debug)]
pub(crate) enum ParserLogEvent {
    /// Text within tags, stored as character offsets into `Ssml::text`.
    Text((usize, usize)),
    Open(ParsedElement),
    Close(ParsedElement),
    Empty(ParsedElement),
}

/// An owned version of a parser log event, built on demand by [`Ssml::event_iter`] so consumers
/// don't need to hold a borrow of the source `Ssml`.
#[derive(Clone, Debug)]
pub enum ParserEvent {
    Text(String),
    Open(ParsedElement),
    Close(ParsedElement),
    Empty(ParsedElement),
}

impl Ssml {
    /// The SSML document with all tags stripped.
    pub fn get_text(&self) -> &str {
        &self.text
    }

    /// # Panics
    /// Panics if `span` exceeds the bounds of the text.
    pub fn get_text_from_span(&self, span: &Span) -> &str {
        assert!(span.end <= self.text.len() && span.end >= span.start);
        &self.text[span.start..span.end]
    }

    /// Depth-first iterator over the SSML tags.
    pub fn tags(&self) -> impl Iterator<Item = &Span> {
        self.tags.iter()
    }

    /// Replays the event log as owned [`ParserEvent`]s, the form [`tree::build_tree`] consumes.
    pub fn event_iter(&self) -> impl Iterator<Item = ParserEvent> + '_ {
        self.event_log.iter().cloned().map(|x| match x {
            ParserLogEvent::Text((start, end)) => ParserEvent::Text(self.text[start..end].to_string()),
            ParserLogEvent::Open(elem) => ParserEvent::Open(elem),
            ParserLogEvent::Close(elem) => ParserEvent::Close(elem),
            ParserLogEvent::Empty(elem) => ParserEvent::Empty(elem),
        })
    }
}

/// Options accepted by [`Processor::process`].
#[derive(Debug, Clone, Copy)]
pub struct ProcessOptions {
    /// Parse `text` as SSML rather than auto-wrapping it as plain text in `<speak>`.
    pub ssml: bool,
    /// Run part-of-speech tagging during enrichment.
    pub pos: bool,
    /// Run phoneme lookup/guessing during enrichment.
    pub phonemize: bool,
    /// Master switch for the enrichment stage; when false, `pos`/`phonemize` are both skipped
    /// regardless of their own value.
    pub post_process: bool,
    /// When `ssml` is false, wrap the escaped input in `<speak>...</speak>` before parsing.
    pub add_speak_tag: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self { ssml: false, pos: true, phonemize: true, post_process: true, add_speak_tag: true }
    }
}

/// Owns the lazily-populated per-language [`Settings`] cache and the default language a bare
/// `process()` call falls back to. Settings are built once per distinct language code and reused;
/// an unrecognized language is logged once via `tracing::warn!`, then treated like any other.
pub struct Processor {
    default_lang: String,
    builder: Box<dyn Fn(&str) -> Settings>,
    known_languages: HashSet<String>,
    cache: RefCell<HashMap<String, Settings>>,
    warned: RefCell<HashSet<String>>,
}

impl Processor {
    /// A processor whose settings come from [`Settings::default_for`].
    pub fn new(default_lang: impl Into<String>) -> Self {
        Self::with_settings_builder(default_lang, Settings::default_for)
    }

    /// A processor backed by a custom settings source, e.g. one that loads a language pack from
    /// disk via `serde_yaml`/`serde_json` and falls back to [`Settings::default_for`] for
    /// anything not on disk.
    pub fn with_settings_builder(default_lang: impl Into<String>, builder: impl Fn(&str) -> Settings + 'static) -> Self {
        let default_lang = default_lang.into();
        let mut known_languages = HashSet::new();
        known_languages.insert(default_lang.clone());
        Self { default_lang, builder: Box::new(builder), known_languages, cache: RefCell::new(HashMap::new()), warned: RefCell::new(HashSet::new()) }
    }

    /// Marks `lang` as recognized, suppressing the unknown-language warning for it.
    pub fn recognize_language(&mut self, lang: impl Into<String>) {
        self.known_languages.insert(lang.into());
    }

    /// Returns the cached [`Settings`] for `lang`, building and caching it on first use. Warns
    /// exactly once per unrecognized language.
    pub fn get_settings(&self, lang: &str) -> Settings {
        if let Some(settings) = self.cache.borrow().get(lang) {
            return settings.clone();
        }
        if !self.known_languages.contains(lang) && self.warned.borrow_mut().insert(lang.to_string()) {
            tracing::warn!(lang, "unrecognized language, falling back to default settings");
        }
        let settings = (self.builder)(lang);
        self.cache.borrow_mut().insert(lang.to_string(), settings.clone());
        settings
    }

    /// Parses `text`, builds the initial node graph, and runs the full split/transform/verbalize
    /// pipeline plus enrichment over it.
    pub fn process(&self, text: &str, options: ProcessOptions) -> Result<(Graph, NodeId), ProcessError> {
        let ssml = if options.ssml {
            parse_ssml(text).map_err(ProcessError::InputFormat)?
        } else {
            let escaped = quick_xml::escape::escape(text);
            let wrapped = if options.add_speak_tag { format!("<speak>{}</speak>", escaped) } else { escaped.into_owned() };
            parse_ssml(&wrapped).map_err(ProcessError::InputFormat)?
        };
        let (mut graph, root) = tree::build_tree(&ssml, &self.default_lang)?;

        let settings_for = |lang: &str| self.get_settings(lang);
        splits::run_pipeline(&mut graph, root, &settings_for);
        if options.post_process {
            enrich::enrich_selective(&mut graph, root, &settings_for, options.pos, options.phonemize);
        }
        Ok((graph, root))
    }

    /// Flattens the processed graph into [`flatten::Sentence`] records, then runs each
    /// language's `sentence_post_process` callback (if any) over the resulting word list.
    pub fn sentences(&self, graph: &Graph, root: NodeId, options: flatten::SentenceOptions) -> Vec<flatten::Sentence> {
        let mut sentences = flatten::flatten(graph, root, options);
        for sentence in &mut sentences {
            let settings = self.get_settings(&sentence.lang);
            if let Some(post_process) = &settings.sentence_post_process {
                post_process(&mut sentence.words);
            }
        }
        sentences
    }
}

/// Runs [`Processor::process`] against a throwaway, default-settings `Processor` for `default_lang`
/// - the free-function form of the pipeline entry point for callers with no per-language
/// customization to inject.
pub fn process(text: &str, default_lang: &str, options: ProcessOptions) -> Result<(Graph, NodeId), ProcessError> {
    Processor::new(default_lang).process(text, options)
}

/// The free-function form of [`Processor::sentences`], for callers that already have a `Graph`
/// and don't need cross-call settings caching.
pub fn sentences(graph: &Graph, root: NodeId, options: flatten::SentenceOptions) -> Vec<flatten::Sentence> {
    flatten::flatten(graph, root, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_plain_text_end_to_end() {
        let (graph, root) = process("This is a test", "en_US", ProcessOptions::default()).unwrap();
        let sentences = sentences(&graph, root, flatten::SentenceOptions::default());
        assert_eq!(sentences.len(), 1);
        let texts: Vec<&str> = sentences[0].words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["This", "is", "a", "test"]);
    }

    #[test]
    fn process_verbalizes_currency() {
        let (graph, root) = process("$10", "en_US", ProcessOptions::default()).unwrap();
        let sentences = sentences(&graph, root, flatten::SentenceOptions::default());
        let texts: Vec<&str> = sentences[0].words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["ten", "dollars"]);
    }

    #[test]
    fn processor_warns_once_per_unknown_language() {
        let processor = Processor::new("en_US");
        let _ = processor.get_settings("xx_XX");
        let _ = processor.get_settings("xx_XX");
        assert_eq!(processor.warned.borrow().len(), 1);
    }
}
