//! Consumes the SSML reader's event stream and builds the initial node graph: `Speak ->
//! Paragraph -> Sentence -> Word`, pushing/popping the `voice`, `say-as`, and `xml:lang` scope
//! stacks as described in the SSML reader and tree builder component design.
use crate::elements::{ParsedElement, SsmlElement};
use crate::error::ProcessError;
use crate::node::{Graph, InterpretAs, NodeId, NodeKind, WordData};
use crate::textutil::tokenize_preserving_ws;
use crate::{ParserEvent, Ssml};

fn interpret_as_from_str(s: &str) -> InterpretAs {
    match s {
        "spell-out" => InterpretAs::SpellOut,
        "number" => InterpretAs::Number,
        "currency" => InterpretAs::Currency,
        "date" => InterpretAs::Date,
        _ => InterpretAs::Unset,
    }
}

/// All of the mutable scope state the builder threads through the event stream.
struct BuilderState {
    lang_stack: Vec<String>,
    voice_stack: Vec<Option<String>>,
    sayas_stack: Vec<Option<(String, Option<String>)>>,
    /// Mirrors genuine XML nesting for Speak/Paragraph/Sentence only - implicit nodes are never
    /// pushed here.
    xml_stack: Vec<NodeId>,
    /// Current lazily-created implicit paragraph directly under the top-of-stack Speak, if any.
    implicit_paragraph: Option<NodeId>,
    /// Current lazily-created implicit sentence directly under the current paragraph, if any.
    implicit_sentence: Option<NodeId>,
    /// Role(s) pushed by nested `<w>`/`<token>`; while non-empty, text is not whitespace-split.
    word_scope: Vec<(Option<String>, String)>,
    word_scope_depth: usize,
    /// Aliases pushed by nested `<sub>`; while non-empty, contained text is discarded entirely
    /// rather than buffered, since it's replaced wholesale by the alias on close.
    sub_stack: Vec<String>,
    root: Option<NodeId>,
}

impl BuilderState {
    fn lang(&self) -> String {
        self.lang_stack.last().cloned().unwrap()
    }

    fn voice(&self) -> Option<String> {
        self.voice_stack.last().cloned().flatten()
    }

    fn say_as(&self) -> (InterpretAs, Option<String>) {
        match self.sayas_stack.last() {
            Some(Some((interp, fmt))) => (interpret_as_from_str(interp), fmt.clone()),
            _ => (InterpretAs::Unset, None),
        }
    }
}

/// Build the initial node graph from a parsed `Ssml` document. `default_lang` seeds the
/// language scope stack before any `xml:lang` is seen.
pub fn build_tree(ssml: &Ssml, default_lang: &str) -> Result<(Graph, NodeId), ProcessError> {
    let mut graph = Graph::new();
    let mut state = BuilderState {
        lang_stack: vec![default_lang.to_string()],
        voice_stack: vec![None],
        sayas_stack: vec![None],
        xml_stack: Vec::new(),
        implicit_paragraph: None,
        implicit_sentence: None,
        word_scope: Vec::new(),
        word_scope_depth: 0,
        sub_stack: Vec::new(),
        root: None,
    };

    for event in ssml.event_iter() {
        match event {
            ParserEvent::Open(elem) => handle_open(&mut graph, &mut state, elem),
            ParserEvent::Empty(elem) => handle_empty(&mut graph, &mut state, elem),
            ParserEvent::Close(elem) => handle_close(&mut graph, &mut state, elem),
            ParserEvent::Text(text) => handle_text(&mut graph, &mut state, &text),
        }
    }

    state.root.ok_or(ProcessError::MissingRoot)
        .map(|root| (graph, root))
}

fn handle_open(graph: &mut Graph, state: &mut BuilderState, elem: ParsedElement) {
    match elem {
        ParsedElement::Speak(attrs) => {
            state.lang_stack.push(attrs.lang.unwrap_or_else(|| state.lang()));
            let id = graph.push(state.lang(), state.voice(), false, NodeKind::Speak, None);
            state.root = Some(id);
            state.xml_stack.push(id);
        }
        ParsedElement::Paragraph(attrs) => {
            state.lang_stack.push(attrs.lang.unwrap_or_else(|| state.lang()));
            let parent = speak_ancestor(graph, state);
            let id = graph.push(state.lang(), state.voice(), false, NodeKind::Paragraph, Some(parent));
            state.xml_stack.push(id);
            state.implicit_sentence = None;
        }
        ParsedElement::Sentence(attrs) => {
            state.lang_stack.push(attrs.lang.unwrap_or_else(|| state.lang()));
            let parent = paragraph_for(graph, state);
            let id = graph.push(state.lang(), state.voice(), false, NodeKind::Sentence { explicit: true }, Some(parent));
            state.xml_stack.push(id);
            state.implicit_sentence = None;
        }
        ParsedElement::Token(attrs) | ParsedElement::Word(attrs) => {
            state.lang_stack.push(attrs.lang.unwrap_or_else(|| state.lang()));
            state.word_scope.push((attrs.role, String::new()));
            state.word_scope_depth += 1;
        }
        ParsedElement::Voice(attrs) => {
            state.voice_stack.push(attrs.name);
        }
        ParsedElement::SayAs(attrs) => {
            state.sayas_stack.push(Some((attrs.interpret_as, attrs.format)));
        }
        ParsedElement::Break(attrs) => {
            let parent = sentence_for(graph, state);
            graph.push(state.lang(), state.voice(), false, NodeKind::Break { time: attrs.time }, Some(parent));
        }
        ParsedElement::Sub(attrs) => {
            state.sub_stack.push(attrs.alias);
        }
        ParsedElement::Metadata | ParsedElement::Custom(_) => {}
    }
}

fn handle_empty(graph: &mut Graph, state: &mut BuilderState, elem: ParsedElement) {
    if let ParsedElement::Break(attrs) = elem {
        let parent = sentence_for(graph, state);
        graph.push(state.lang(), state.voice(), false, NodeKind::Break { time: attrs.time }, Some(parent));
    }
}

fn handle_close(graph: &mut Graph, state: &mut BuilderState, elem: ParsedElement) {
    match SsmlElement::from(&elem) {
        SsmlElement::Speak => {
            state.lang_stack.pop();
            state.xml_stack.pop();
        }
        SsmlElement::Paragraph => {
            state.lang_stack.pop();
            state.xml_stack.pop();
            state.implicit_sentence = None;
        }
        SsmlElement::Sentence => {
            state.lang_stack.pop();
            state.xml_stack.pop();
            state.implicit_sentence = None;
        }
        SsmlElement::Token | SsmlElement::Word => {
            // Pop the word's own language scope only after pushing its buffered text, so the
            // word is created under the `lang`/`role` it was opened with, not its parent's.
            if let Some((role, buffer)) = state.word_scope.pop() {
                state.word_scope_depth -= 1;
                if !buffer.is_empty() {
                    let parent = sentence_for(graph, state);
                    push_word(graph, state, parent, &buffer, role);
                }
            }
            state.lang_stack.pop();
        }
        SsmlElement::Voice => {
            state.voice_stack.pop();
        }
        SsmlElement::SayAs => {
            state.sayas_stack.pop();
        }
        SsmlElement::Sub => {
            if let Some(alias) = state.sub_stack.pop() {
                let parent = sentence_for(graph, state);
                for (_, word_with_ws) in tokenize_preserving_ws(&alias) {
                    push_word(graph, state, parent, &word_with_ws, None);
                }
            }
        }
        _ => {}
    }
}

fn handle_text(graph: &mut Graph, state: &mut BuilderState, text: &str) {
    if !state.sub_stack.is_empty() {
        return;
    }
    if state.word_scope_depth > 0 {
        if let Some((_, buffer)) = state.word_scope.last_mut() {
            buffer.push_str(text);
        }
        return;
    }
    if text.trim().is_empty() {
        if !text.is_empty() {
            append_trailing_ws(graph, state);
        }
        return;
    }
    let starts_with_ws = text.starts_with(char::is_whitespace);
    if starts_with_ws {
        append_trailing_ws(graph, state);
    }
    let parent = sentence_for(graph, state);
    for (_, word_with_ws) in tokenize_preserving_ws(text.trim_start()) {
        push_word(graph, state, parent, &word_with_ws, None);
    }
}

fn push_word(graph: &mut Graph, state: &mut BuilderState, parent: NodeId, text_with_ws: &str, role: Option<String>) -> NodeId {
    let (interpret_as, format) = state.say_as();
    let text = text_with_ws.trim_end().to_string();
    let id = graph.push(
        state.lang(),
        state.voice(),
        true,
        NodeKind::Word(WordData {
            text,
            text_with_ws: text_with_ws.to_string(),
            interpret_as,
            format,
            role,
            ..Default::default()
        }),
        Some(parent),
    );
    id
}

/// Appends a single space to the trailing whitespace of the last leaf word under the current
/// sentence, used when a text event begins with whitespace that separates it from the previous
/// token rather than belonging to the token that follows.
fn append_trailing_ws(graph: &mut Graph, state: &mut BuilderState) {
    let Some(sentence) = current_sentence_if_any(state) else { return };
    if let Some(&last) = graph.children(sentence).last() {
        if let NodeKind::Word(w) = &mut graph.node_mut(last).kind {
            if !w.text_with_ws.ends_with(char::is_whitespace) {
                w.text_with_ws.push(' ');
            }
        }
    }
}

/// Best-effort: used only for whitespace bookkeeping, so falling back to the tracked implicit
/// sentence even when an explicit `<s>` is open is acceptable here.
fn current_sentence_if_any(state: &BuilderState) -> Option<NodeId> {
    state.implicit_sentence
}

/// Nearest enclosing Speak, used as the parent for an implicit Paragraph.
fn speak_ancestor(graph: &Graph, state: &BuilderState) -> NodeId {
    for &id in state.xml_stack.iter().rev() {
        if matches!(graph.node(id).kind, NodeKind::Speak) {
            return id;
        }
    }
    *state.xml_stack.first().expect("speak must be open before any paragraph")
}

/// Resolves the paragraph new sentences/words should attach under, creating an implicit one if
/// the innermost explicit container is the Speak root itself.
fn paragraph_for(graph: &mut Graph, state: &mut BuilderState) -> NodeId {
    match state.xml_stack.last().map(|&id| (id, graph.node(id).kind.clone())) {
        Some((id, NodeKind::Paragraph)) => id,
        Some((id, NodeKind::Sentence { .. })) => graph.parent_of(id).expect("sentence always has a parent"),
        Some((speak_id, NodeKind::Speak)) => {
            if let Some(p) = state.implicit_paragraph {
                if graph.parent_of(p) == Some(speak_id) {
                    return p;
                }
            }
            let id = graph.push(state.lang(), state.voice(), true, NodeKind::Paragraph, Some(speak_id));
            state.implicit_paragraph = Some(id);
            state.implicit_sentence = None;
            id
        }
        _ => unreachable!("xml_stack must always have an open Speak"),
    }
}

/// Resolves the sentence new words/breaks should attach under: the explicit `<s>` if one is
/// open, otherwise the current implicit sentence (created lazily under the resolved paragraph).
fn sentence_for(graph: &mut Graph, state: &mut BuilderState) -> NodeId {
    if let Some(&top) = state.xml_stack.last() {
        if matches!(graph.node(top).kind, NodeKind::Sentence { .. }) {
            return top;
        }
    }
    let paragraph = paragraph_for(graph, state);
    if let Some(s) = state.implicit_sentence {
        if graph.parent_of(s) == Some(paragraph) {
            return s;
        }
    }
    let id = graph.push(state.lang(), state.voice(), true, NodeKind::Sentence { explicit: false }, Some(paragraph));
    state.implicit_sentence = Some(id);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_ssml;

    fn words_of(graph: &Graph, sentence: NodeId) -> Vec<String> {
        graph
            .children(sentence)
            .iter()
            .filter_map(|&id| graph.node(id).kind.text().map(|t| t.to_string()))
            .collect()
    }

    #[test]
    fn plain_text_builds_implicit_structure() {
        let ssml = parse_ssml("This is a test").unwrap();
        let (graph, root) = build_tree(&ssml, "en_US").unwrap();
        assert!(matches!(graph.node(root).kind, NodeKind::Speak));
        let para = graph.children(root)[0];
        assert!(matches!(graph.node(para).kind, NodeKind::Paragraph));
        let sentence = graph.children(para)[0];
        assert_eq!(words_of(&graph, sentence), vec!["This", "is", "a", "test"]);
    }

    #[test]
    fn explicit_sentences_are_not_merged() {
        let ssml = parse_ssml("<speak><s>One</s><s>Two</s></speak>").unwrap();
        let (graph, root) = build_tree(&ssml, "en_US").unwrap();
        let para = graph.children(root)[0];
        assert_eq!(graph.children(para).len(), 2);
    }

    #[test]
    fn word_tag_is_not_tokenized() {
        let ssml = parse_ssml(r#"<speak><w role="custom">two words</w></speak>"#).unwrap();
        let (graph, root) = build_tree(&ssml, "en_US").unwrap();
        let para = graph.children(root)[0];
        let sentence = graph.children(para)[0];
        let word_id = graph.children(sentence)[0];
        match &graph.node(word_id).kind {
            NodeKind::Word(w) => {
                assert_eq!(w.text, "two words");
                assert_eq!(w.role.as_deref(), Some("custom"));
            }
            other => panic!("expected word, got {:?}", other),
        }
    }

    #[test]
    fn say_as_sets_interpret_as() {
        let ssml = parse_ssml(r#"<speak><say-as interpret-as="spell-out">ab</say-as></speak>"#).unwrap();
        let (graph, root) = build_tree(&ssml, "en_US").unwrap();
        let para = graph.children(root)[0];
        let sentence = graph.children(para)[0];
        let word_id = graph.children(sentence)[0];
        match &graph.node(word_id).kind {
            NodeKind::Word(w) => assert_eq!(w.interpret_as, InterpretAs::SpellOut),
            other => panic!("expected word, got {:?}", other),
        }
    }
}
