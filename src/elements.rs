//! Documentation comments are taken in part from the SSML specification which
//! can be found [here](https://www.w3.org/TR/speech-synthesis11). All copied
//! sections will be marked with:
//!
//! "Speech Synthesis Markup Language (SSML) Version 1.1" _Copyright © 2010 W3C® (MIT, ERCIM, Keio),
//! All Rights Reserved._
//!
//! This module only models the subset of SSML 1.1 the normalization pipeline actually
//! interprets: `speak`, `p`, `s`, `w`/`token`, `voice`, `say-as`, `break`, `sub`, `metadata`.
//! Anything else well-formed is accepted by the reader as [`SsmlElement::Custom`] and its
//! contained text still flows through - it just carries none of the scope/attribute effects
//! the recognized elements do.
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SsmlElement {
    Speak,
    Metadata,
    Paragraph,
    Sentence,
    Token,
    Word,
    SayAs,
    Sub,
    Voice,
    Break,
    Custom(String),
}

impl SsmlElement {
    /// Returns whether a tag can contain other tags - will always be true for custom tags as we
    /// want to check just in case.
    #[inline(always)]
    pub fn can_contain_tags(&self) -> bool {
        // Metadata subtrees are ignored entirely by the builder; say-as/sub/break only ever
        // wrap text.
        matches!(
            self,
            Self::Speak | Self::Paragraph | Self::Sentence | Self::Voice | Self::Token | Self::Word | Self::Custom(_)
        )
    }

    /// Check whether the provided element can contain another specified tag. For custom elements
    /// if an element can contain tags it will be assumed it can contain the custom one as these
    /// are outside of what we recognize.
    pub fn can_contain(&self, other: &Self) -> bool {
        match (self, other) {
            (a, Self::Custom(_)) if a.can_contain_tags() => true,
            (a, _) if !a.can_contain_tags() => false,
            (_, Self::Speak) => false,
            (Self::Speak, _) => true,
            (Self::Paragraph, a) => a.allowed_in_paragraph(),
            (Self::Sentence, a) => a.allowed_in_sentence(),
            (Self::Voice, a) => a.allowed_in_speak(),
            (Self::Token | Self::Word, a) => a.allowed_in_token(),
            (Self::Custom(_), _) => true,
            _ => false,
        }
    }

    #[inline(always)]
    fn allowed_in_paragraph(&self) -> bool {
        matches!(self, Self::Sentence) || self.allowed_in_sentence()
    }

    #[inline(always)]
    fn allowed_in_sentence(&self) -> bool {
        matches!(
            self,
            Self::Custom(_) | Self::Break | Self::SayAs | Self::Sub | Self::Token | Self::Voice | Self::Word
        )
    }

    #[inline(always)]
    fn allowed_in_speak(&self) -> bool {
        self != &Self::Speak
    }

    #[inline(always)]
    fn allowed_in_token(&self) -> bool {
        matches!(self, Self::Break | Self::SayAs | Self::Sub | Self::Custom(_))
    }

    /// True if text directly inside this element should be synthesised. `metadata` swallows its
    /// subtree entirely.
    pub fn contains_synthesisable_text(&self) -> bool {
        !matches!(self, Self::Metadata)
    }
}

impl FromStr for SsmlElement {
    type Err = std::convert::Infallible;

    /// Namespaces are stripped before this is called - `mstts:express-as` arrives as
    /// `express-as`. Tag comparison is otherwise case sensitive, matching the SSML spec.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let local = s.rsplit(':').next().unwrap_or(s);
        Ok(match local {
            "speak" => Self::Speak,
            "metadata" => Self::Metadata,
            "p" => Self::Paragraph,
            "s" => Self::Sentence,
            "token" => Self::Token,
            "w" => Self::Word,
            "say-as" => Self::SayAs,
            "sub" => Self::Sub,
            "voice" => Self::Voice,
            "break" => Self::Break,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl std::fmt::Display for SsmlElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Speak => write!(f, "speak"),
            Self::Metadata => write!(f, "metadata"),
            Self::Paragraph => write!(f, "p"),
            Self::Sentence => write!(f, "s"),
            Self::Token => write!(f, "token"),
            Self::Word => write!(f, "w"),
            Self::SayAs => write!(f, "say-as"),
            Self::Sub => write!(f, "sub"),
            Self::Voice => write!(f, "voice"),
            Self::Break => write!(f, "break"),
            Self::Custom(s) => write!(f, "{}", s),
        }
    }
}

/// A parsed element carries whatever attributes the tag recognizes; unrecognized elements keep
/// their raw attribute bag so callers can still see them in the event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedElement {
    Speak(SpeakAttributes),
    Metadata,
    Paragraph(ScopeAttributes),
    Sentence(ScopeAttributes),
    Token(WordAttributes),
    Word(WordAttributes),
    SayAs(SayAsAttributes),
    Sub(SubAttributes),
    Voice(VoiceAttributes),
    Break(BreakAttributes),
    Custom((String, BTreeMap<String, String>)),
}

impl ParsedElement {
    pub fn can_contain_tags(&self) -> bool {
        SsmlElement::from(self).can_contain_tags()
    }

    pub fn can_contain(&self, other: &Self) -> bool {
        SsmlElement::from(self).can_contain(&SsmlElement::from(other))
    }

    /// True if text directly inside this element should be synthesised. `metadata` swallows its
    /// subtree entirely.
    pub fn contains_synthesisable_text(&self) -> bool {
        !matches!(self, Self::Metadata)
    }
}

impl From<&ParsedElement> for SsmlElement {
    fn from(elem: &ParsedElement) -> Self {
        match elem {
            ParsedElement::Speak(_) => Self::Speak,
            ParsedElement::Metadata => Self::Metadata,
            ParsedElement::Paragraph(_) => Self::Paragraph,
            ParsedElement::Sentence(_) => Self::Sentence,
            ParsedElement::Token(_) => Self::Token,
            ParsedElement::Word(_) => Self::Word,
            ParsedElement::SayAs(_) => Self::SayAs,
            ParsedElement::Sub(_) => Self::Sub,
            ParsedElement::Voice(_) => Self::Voice,
            ParsedElement::Break(_) => Self::Break,
            ParsedElement::Custom((s, _)) => Self::Custom(s.to_string()),
        }
    }
}

/// `xml:lang` is the only attribute `speak` pushes onto the language scope stack.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SpeakAttributes {
    pub lang: Option<String>,
}

/// Shared by `p` and `s`: both only push a language scope.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct ScopeAttributes {
    pub lang: Option<String>,
}

/// `w` and `token` are treated identically: the contained text becomes a single word (not
/// whitespace-tokenized), `role` overrides the eventually-assigned `gruut:<pos>` role.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct WordAttributes {
    pub lang: Option<String>,
    pub role: Option<String>,
}

/// `interpret-as` is required; `format` is a free subtag whose legal values depend on
/// `interpret-as` (e.g. `cardinal`/`ordinal`/`year`/`digits` for `number`, the `dmy`/`mdy`/...
/// letter codes for `date`).
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SayAsAttributes {
    pub interpret_as: String,
    pub format: Option<String>,
}

/// The `sub` element replaces its contained text with `alias` when rendering for synthesis.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubAttributes {
    pub alias: String,
}

/// `voice` pushes a voice name onto the voice scope stack for its duration.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct VoiceAttributes {
    pub name: Option<String>,
}

/// An explicit pause. `time` is kept as the raw attribute string (e.g. `"500ms"`, `"2s"`); the
/// pipeline does not need to parse it into a `Duration` itself, it is surfaced to callers as-is.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct BreakAttributes {
    pub time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_namespace_prefix() {
        assert_eq!(SsmlElement::from_str("mstts:express-as").unwrap(), SsmlElement::Custom("express-as".to_string()));
        assert_eq!(SsmlElement::from_str("say-as").unwrap(), SsmlElement::SayAs);
    }

    #[test]
    fn containment_rules() {
        assert!(SsmlElement::Speak.can_contain(&SsmlElement::Paragraph));
        assert!(SsmlElement::Paragraph.can_contain(&SsmlElement::Sentence));
        assert!(SsmlElement::Sentence.can_contain(&SsmlElement::Word));
        assert!(!SsmlElement::Word.can_contain(&SsmlElement::Sentence));
        assert!(!SsmlElement::Sentence.can_contain(&SsmlElement::Speak));
    }

    #[test]
    fn metadata_swallows_text() {
        assert!(!ParsedElement::Metadata.contains_synthesisable_text());
        assert!(ParsedElement::Sub(SubAttributes { alias: "x".into() }).contains_synthesisable_text());
    }
}
