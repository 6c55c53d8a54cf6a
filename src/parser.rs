//! Handles parsing SSML input and returning our `Ssml` structure, contains a simple parse function
//! that sets up the parser with the default options and hides it as well as a parser type a user
//! can construct themselves to have more control over parsing.
use crate::elements::*;
use crate::*;
use anyhow::{bail, Context, Result};
use derive_builder::Builder;
use std::cmp::{Ord, Ordering};
use std::str::from_utf8;
use std::str::FromStr;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;

/// Shows a region of the cleaned transcript which an SSML element applies to.
#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    /// This is the index of span's start (inclusive) in terms of unicode scalar values - not bytes
    /// or graphemes
    pub start: usize,
    /// This is the of span's end (exclusive) in terms of unicode scalar values - not bytes
    /// or graphemes
    pub end: usize,
    /// The element contained within this span
    pub element: ParsedElement,
}

impl Span {
    /// Returns true if a span is contained within another span, using the containment rules of
    /// the elements plus the start/end bounds.
    pub fn maybe_contains(&self, other: &Self) -> bool {
        self.element.can_contain(&other.element) && (self.start <= other.start && self.end >= other.end)
    }
}

impl Eq for Span {}

impl Ord for Span {
    fn cmp(&self, other: &Self) -> Ordering {
        // We want spans that start earlier to be ordered sooner, but if both spans start in the
        // same location then the one with the further ahead end is the later one.
        match self.start.cmp(&other.start) {
            Ordering::Equal => other.end.cmp(&self.end),
            ord => ord,
        }
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// SSML parser, contains options used during parsing to determine how to handle certain elements.
#[derive(Clone, Debug, Builder)]
pub struct SsmlParser {
    /// If true expand substitution elements replacing them with the text to substitute in the
    /// attribute. The pipeline's tree builder always wants this on so `<sub>` text arrives
    /// pre-resolved in the text stream.
    #[builder(default = "false")]
    expand_sub: bool,
}

/// We're attaching no meaning to repeated whitespace, but things like space at end
/// of text and line-breaks are word delimiters and we want to keep at least one in
/// if there are repeated. But don't want half our transcript to be formatting
/// induced whitespace.
fn push_text(e: BytesText, text_buffer: &mut String) -> Result<()> {
    let ends_in_whitespace = text_buffer.ends_with(char::is_whitespace);
    let text = e.unescape()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        if !(text_buffer.is_empty() || ends_in_whitespace) {
            text_buffer.push(' ');
        }
    } else {
        if !ends_in_whitespace && text.starts_with(char::is_whitespace) {
            text_buffer.push(' ');
        }
        let mut first = true;
        for line in trimmed.lines() {
            if !first {
                text_buffer.push(' ');
            }
            text_buffer.push_str(line.trim());
            first = false;
        }
        if text.ends_with(char::is_whitespace) {
            text_buffer.push(' ');
        }
    }
    Ok(())
}

/// Parses SSML with a default `SsmlParser` (substitution expansion enabled).
pub fn parse_ssml(ssml: &str) -> Result<Ssml> {
    SsmlParserBuilder::default()
        .expand_sub(true)
        .build()
        .unwrap()
        .parse(ssml)
}

impl SsmlParser {
    /// Returns true if the text should be added to the text buffer. If text isn't synthesisable
    /// then it won't be entered.
    fn text_should_enter_buffer(&self, element: Option<&SsmlElement>) -> bool {
        match element {
            None => true,
            Some(elem) => !(self.expand_sub && elem == &SsmlElement::Sub) && elem.contains_synthesisable_text(),
        }
    }

    /// Parse the given SSML string. If it doesn't begin with `<` it is auto-wrapped in a bare
    /// `<speak>...</speak>` so plain text can flow through the same reader.
    pub fn parse(&self, ssml: &str) -> Result<Ssml> {
        let wrapped;
        let ssml = if ssml.trim_start().starts_with('<') {
            ssml
        } else {
            wrapped = format!("<speak>{}</speak>", quick_xml::escape::escape(ssml));
            &wrapped
        };

        let mut reader = Reader::from_str(ssml);
        reader.check_end_names(true);
        let mut has_started = false;
        let mut text_buffer = String::new();
        let mut open_tags = vec![];
        let mut tags = vec![];
        let mut event_log = vec![];

        loop {
            match reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"speak" => {
                    if !has_started {
                        text_buffer.clear();
                    } else {
                        bail!("Speak element cannot be placed inside a Speak");
                    }
                    has_started = true;

                    let element = parse_speak(e, &reader)?;
                    event_log.push(ParserLogEvent::Open(element.clone()));

                    let span = Span {
                        start: text_buffer.chars().count(),
                        end: text_buffer.chars().count(),
                        element,
                    };

                    open_tags.push((SsmlElement::Speak, tags.len(), span));
                }
                Event::Start(e) => {
                    if !has_started {
                        bail!("SSML document must have a root <speak> element");
                    }
                    if !(text_buffer.is_empty() || text_buffer.ends_with(char::is_whitespace))
                        && matches!(e.local_name().as_ref(), b"s" | b"p")
                    {
                        text_buffer.push(' ');
                    }
                    let (ty, element) = parse_element(e, &mut reader)?;
                    if ty == SsmlElement::Sub && self.expand_sub {
                        if let ParsedElement::Sub(attrs) = &element {
                            let text_start = text_buffer.len();
                            text_buffer.push_str(&attrs.alias);
                            let text_end = text_buffer.len();
                            event_log.push(ParserLogEvent::Text((text_start, text_end)));
                        } else {
                            unreachable!("Sub element wasn't returned for sub type");
                        }
                    } else {
                        event_log.push(ParserLogEvent::Open(element.clone()));
                        match open_tags.last().map(|x| &x.0) {
                            Some(open_type) if !open_type.can_contain(&ty) => {
                                bail!("{:?} cannot be placed inside {:?}", ty, open_type)
                            }
                            _ => {}
                        }
                    }
                    let new_span = Span {
                        start: text_buffer.chars().count(),
                        end: text_buffer.chars().count(),
                        element,
                    };

                    open_tags.push((ty, tags.len(), new_span));
                }
                Event::Comment(_) | Event::CData(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => continue,
                Event::Eof => break,
                Event::Text(e) => {
                    let elem = open_tags.last().map(|x| &x.0);
                    if self.text_should_enter_buffer(elem) {
                        let text_start = text_buffer.len();
                        push_text(e, &mut text_buffer)?;
                        let text_end = text_buffer.len();
                        event_log.push(ParserLogEvent::Text((text_start, text_end)));
                    }
                }
                Event::End(e) => {
                    let name = e.name();
                    let name = from_utf8(name.as_ref())?;
                    if open_tags.is_empty() {
                        bail!("Invalid SSML close tag '{}' presented without open tag.", name);
                    }
                    let ssml_elem = SsmlElement::from_str(name).unwrap();
                    if ssml_elem != open_tags[open_tags.len() - 1].0 {
                        // Close tag without a matching open - ignore, mirrors lenient HTML-ish
                        // handling rather than failing the whole document.
                    } else {
                        let (_, pos, mut span) = open_tags.remove(open_tags.len() - 1);
                        if !(ssml_elem == SsmlElement::Sub && self.expand_sub) {
                            event_log.push(ParserLogEvent::Close(span.element.clone()));
                            span.end = text_buffer.chars().count();
                            tags.insert(pos, span);
                        }
                        if ssml_elem == SsmlElement::Speak && open_tags.is_empty() {
                            break;
                        }
                    }
                }
                Event::Empty(e) => {
                    let (_, element) = parse_element(e, &mut reader)?;
                    let span = Span {
                        start: text_buffer.chars().count(),
                        end: text_buffer.chars().count(),
                        element,
                    };
                    event_log.push(ParserLogEvent::Empty(span.element.clone()));
                    tags.push(span);
                }
            }
        }
        if !has_started {
            bail!("SSML document is missing a root <speak> element");
        }
        tags.sort();
        Ok(Ssml {
            text: text_buffer,
            tags,
            event_log,
        })
    }
}

/// Parse an SSML element, this returns an `SsmlElement` as a tag to represent the SSML and the
/// `ParsedElement` with the attributes to make conditions on the ssml type easier to write.
pub(crate) fn parse_element(
    elem: BytesStart,
    reader: &mut Reader<&[u8]>,
) -> Result<(SsmlElement, ParsedElement)> {
    let name = elem.name();
    let name = from_utf8(name.as_ref())?;
    let elem_type = SsmlElement::from_str(name).unwrap();

    let res = match elem_type.clone() {
        SsmlElement::Speak => parse_speak(elem, reader)?,
        SsmlElement::Metadata => ParsedElement::Metadata,
        SsmlElement::Paragraph => ParsedElement::Paragraph(parse_scope(elem, reader)?),
        SsmlElement::Sentence => ParsedElement::Sentence(parse_scope(elem, reader)?),
        SsmlElement::Token => ParsedElement::Token(parse_word_attrs(elem, reader)?),
        SsmlElement::Word => ParsedElement::Word(parse_word_attrs(elem, reader)?),
        SsmlElement::SayAs => parse_say_as(elem, reader)?,
        SsmlElement::Sub => parse_sub(elem, reader)?,
        SsmlElement::Voice => parse_voice(elem, reader)?,
        SsmlElement::Break => parse_break(elem, reader)?,
        SsmlElement::Custom(ref s) => {
            let mut attributes = std::collections::BTreeMap::new();
            for attr in elem.attributes() {
                let attr = attr?;
                attributes.insert(String::from_utf8(attr.key.0.to_vec())?, String::from_utf8(attr.value.to_vec())?);
            }
            ParsedElement::Custom((s.to_string(), attributes))
        }
    };

    Ok((elem_type, res))
}

fn get_attr<R: std::io::BufRead>(elem: &BytesStart, reader: &Reader<R>, name: &str) -> Result<Option<String>> {
    Ok(match elem.try_get_attribute(name)? {
        Some(attr) => Some(attr.decode_and_unescape_value(reader)?.to_string()),
        None => None,
    })
}

fn parse_speak<R: std::io::BufRead>(elem: BytesStart, reader: &Reader<R>) -> Result<ParsedElement> {
    let lang = get_attr(&elem, reader, "xml:lang")?;
    Ok(ParsedElement::Speak(SpeakAttributes { lang }))
}

fn parse_scope<R: std::io::BufRead>(elem: BytesStart, reader: &Reader<R>) -> Result<ScopeAttributes> {
    let lang = get_attr(&elem, reader, "xml:lang")?;
    Ok(ScopeAttributes { lang })
}

fn parse_word_attrs<R: std::io::BufRead>(elem: BytesStart, reader: &Reader<R>) -> Result<WordAttributes> {
    let lang = get_attr(&elem, reader, "xml:lang")?;
    let role = get_attr(&elem, reader, "role")?;
    Ok(WordAttributes { lang, role })
}

fn parse_say_as<R: std::io::BufRead>(elem: BytesStart, reader: &Reader<R>) -> Result<ParsedElement> {
    let interpret_as = get_attr(&elem, reader, "interpret-as")?
        .context("interpret-as attribute is required with a say-as element")?;
    let format = get_attr(&elem, reader, "format")?;
    Ok(ParsedElement::SayAs(SayAsAttributes { interpret_as, format }))
}

fn parse_sub<R: std::io::BufRead>(elem: BytesStart, reader: &Reader<R>) -> Result<ParsedElement> {
    let alias = get_attr(&elem, reader, "alias")?.context("alias attribute required for sub element")?;
    Ok(ParsedElement::Sub(SubAttributes { alias }))
}

fn parse_voice<R: std::io::BufRead>(elem: BytesStart, reader: &Reader<R>) -> Result<ParsedElement> {
    let name = get_attr(&elem, reader, "name")?;
    Ok(ParsedElement::Voice(VoiceAttributes { name }))
}

fn parse_break<R: std::io::BufRead>(elem: BytesStart, reader: &Reader<R>) -> Result<ParsedElement> {
    let time = get_attr(&elem, reader, "time")?;
    Ok(ParsedElement::Break(BreakAttributes { time }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_ordering() {
        let a = Span { start: 0, end: 10, element: ParsedElement::Speak(Default::default()) };
        let b = Span { start: 0, end: 5, element: ParsedElement::Speak(Default::default()) };
        let c = Span { start: 4, end: 5, element: ParsedElement::Speak(Default::default()) };
        let d = Span { start: 11, end: 15, element: ParsedElement::Speak(Default::default()) };

        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
        assert!(a < d);
        assert!(a == a);
    }

    #[test]
    fn char_position_not_byte() {
        let unicode = parse_ssml(r#"<speak>Let’s review a complex structure.</speak>"#).unwrap();
        let ascii = parse_ssml(r#"<speak>Let's review a complex structure.</speak>"#).unwrap();

        let master_span_unicode = unicode.tags().next().unwrap();
        let master_span_ascii = ascii.tags().next().unwrap();

        assert_eq!(master_span_ascii.end, master_span_unicode.end);
        assert_eq!(master_span_ascii.end, ascii.get_text().chars().count());
    }

    #[test]
    fn reject_invalid_combos() {
        assert!(parse_ssml("<speak><speak>hello</speak></speak>").is_err());
        assert!(parse_ssml("<speak><p>hello<p>world</p></p></speak>").is_err());
    }

    #[test]
    fn auto_wraps_plain_text() {
        let res = parse_ssml("Hello & welcome").unwrap();
        assert_eq!(res.get_text().trim(), "Hello & welcome");
    }

    #[test]
    fn metadata_is_skipped() {
        let res = parse_ssml("<speak>before <metadata>ignored text</metadata> after</speak>").unwrap();
        assert_eq!(res.get_text().trim(), "before  after".trim());
    }

    #[test]
    fn expand_sub() {
        let parser = SsmlParserBuilder::default().expand_sub(true).build().unwrap();
        let sub = r#"<speak><sub alias="World wide web consortium">W3C</sub></speak>"#;

        let res = parser.parse(sub).unwrap();
        assert_eq!(res.get_text().trim(), "World wide web consortium");

        let parser = SsmlParserBuilder::default().build().unwrap();
        let res = parser.parse(sub).unwrap();
        assert_eq!(res.get_text().trim(), "W3C");
    }
}
