//! The fixed-order split passes (§4.2) plus the pipeline driver that threads them together with
//! the sentence breaker and the transform/verbalize passes. Every pass here enumerates a fresh
//! leaf snapshot and either mutates a leaf in place or attaches children to it; it never reorders
//! existing edges (that's the sentence breaker's job alone).
use crate::node::{BreakType, Graph, InterpretAs, NodeId, NodeKind, WordData};
use crate::sentence_break::break_sentences;
use crate::settings::Settings;
use crate::textutil::tokenize_preserving_ws;
use crate::transforms::{transform_currency, transform_date, transform_number, verbalize_currency, verbalize_date, verbalize_number};

fn push_plain_word(graph: &mut Graph, parent: NodeId, text_with_ws: &str) -> NodeId {
    let lang = graph.node(parent).lang.clone();
    let voice = graph.node(parent).voice.clone();
    let text = text_with_ws.trim_end().to_string();
    graph.push(lang, voice, true, NodeKind::Word(WordData::plain(text, text_with_ws.to_string())), Some(parent))
}

/// Returns `(text_with_ws, lang, voice)` if `leaf` is an unlocked Word, else `None`.
fn unlocked_word(graph: &Graph, leaf: NodeId) -> Option<(String, String, Option<String>)> {
    match &graph.node(leaf).kind {
        NodeKind::Word(w) if !w.is_locked() => Some((w.text_with_ws.clone(), graph.node(leaf).lang.clone(), graph.node(leaf).voice.clone())),
        _ => None,
    }
}

fn split_trailing_ws(text: &str) -> (&str, &str) {
    let ws_len: usize = text.chars().rev().take_while(|c| c.is_whitespace()).map(|c| c.len_utf8()).sum();
    text.split_at(text.len() - ws_len)
}

/// Pass 1: replacements.
fn pass_replacements(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    let Some((text_with_ws, ..)) = unlocked_word(graph, leaf) else { return false };
    let mut result = text_with_ws.clone();
    let mut changed = false;
    for (re, template) in &settings.replacements {
        if re.is_match(&result) {
            result = re.replace_all(&result, template.as_str()).into_owned();
            changed = true;
        }
    }
    if !changed {
        return false;
    }
    for (_, piece) in tokenize_preserving_ws(&result) {
        push_plain_word(graph, leaf, &piece);
    }
    true
}

/// Passes 2 and 7: peel begin/end punctuation from the word's edges.
fn pass_punctuation(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    let Some((text_with_ws, lang, voice)) = unlocked_word(graph, leaf) else { return false };
    let (core_with_trailing, trailing_ws) = split_trailing_ws(&text_with_ws);
    let mut core = core_with_trailing.to_string();

    let mut pieces: Vec<(String, bool)> = Vec::new();
    loop {
        let found = settings.begin_punctuations.iter().filter(|p| core.starts_with(p.as_str())).max_by_key(|p| p.chars().count()).cloned();
        match found {
            Some(p) => {
                core = core[p.len()..].to_string();
                pieces.push((p, true));
            }
            None => break,
        }
    }
    let mut end_pieces = Vec::new();
    loop {
        let found = settings.end_punctuations.iter().filter(|p| core.ends_with(p.as_str())).max_by_key(|p| p.chars().count()).cloned();
        match found {
            Some(p) => {
                core = core[..core.len() - p.len()].to_string();
                end_pieces.push(p);
            }
            None => break,
        }
    }
    if pieces.is_empty() && end_pieces.is_empty() {
        return false;
    }
    if !core.is_empty() {
        pieces.push((core, false));
    }
    pieces.extend(end_pieces.into_iter().rev().map(|p| (p, true)));

    let n = pieces.len();
    for (i, (text, is_punct)) in pieces.into_iter().enumerate() {
        let ws = if i + 1 == n { trailing_ws } else { "" };
        let text_with_ws = format!("{}{}", text, ws);
        if is_punct {
            graph.push(lang.clone(), voice.clone(), true, NodeKind::PunctuationWord { text, text_with_ws }, Some(leaf));
        } else {
            push_plain_word(graph, leaf, &text_with_ws);
        }
    }
    true
}

fn pass_break(graph: &mut Graph, leaf: NodeId, pattern: Option<&regex::Regex>, break_type: BreakType) -> bool {
    let Some(re) = pattern else { return false };
    let Some((text_with_ws, lang, voice)) = unlocked_word(graph, leaf) else { return false };
    let Some(m) = re.find(&text_with_ws) else { return false };
    let residue = &text_with_ws[..m.start()];
    let rest = &text_with_ws[m.end()..];
    let trailing_ws_len: usize = rest.chars().take_while(|c| c.is_whitespace()).map(|c| c.len_utf8()).sum();
    let (trailing_ws, tail) = rest.split_at(trailing_ws_len);
    if !residue.is_empty() {
        push_plain_word(graph, leaf, residue);
    }
    graph.push(
        lang.clone(),
        voice.clone(),
        true,
        NodeKind::BreakWord { break_type, text: m.as_str().to_string(), text_with_ws: format!("{}{}", m.as_str(), trailing_ws) },
        Some(leaf),
    );
    if !tail.is_empty() {
        push_plain_word(graph, leaf, tail);
    }
    true
}

/// Pass 3: minor breaks.
fn pass_minor_break(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    pass_break(graph, leaf, settings.minor_break_pattern.as_ref(), BreakType::Minor)
}

/// Pass 6: major breaks.
fn pass_major_break(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    pass_break(graph, leaf, settings.major_break_pattern.as_ref(), BreakType::Major)
}

/// Pass 4: abbreviations.
fn pass_abbreviation(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    let Some((text_with_ws, ..)) = unlocked_word(graph, leaf) else { return false };
    for (re, template) in &settings.abbreviations {
        if let Some(caps) = re.captures(&text_with_ws) {
            let mut expanded = String::new();
            caps.expand(template, &mut expanded);
            for (_, piece) in tokenize_preserving_ws(&expanded) {
                push_plain_word(graph, leaf, &piece);
            }
            return true;
        }
    }
    false
}

/// Passes 5 and 8: initialisms.
fn pass_initialism(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    let Some((text_with_ws, lang, voice)) = unlocked_word(graph, leaf) else { return false };
    let Some(pred) = &settings.is_initialism else { return false };
    let (core, trailing_ws) = split_trailing_ws(&text_with_ws);
    if core.is_empty() || !pred(core) {
        return false;
    }
    let Some(splitter) = &settings.split_initialism else { return false };
    let parts = splitter(core);
    if parts.len() < 2 {
        return false;
    }
    let n = parts.len();
    for (i, part) in parts.into_iter().enumerate() {
        let ws = if i + 1 == n { trailing_ws } else { "" };
        let text_with_ws = format!("{}{}", part, ws);
        graph.push(lang.clone(), voice.clone(), true, NodeKind::Word(WordData { role: Some("LETTER".to_string()), ..WordData::plain(part, text_with_ws) }), Some(leaf));
    }
    true
}

/// Pass 9: spell-out expansion. Unlike the passes above this one targets *locked* Words whose
/// `interpret_as` is explicitly `spell-out`.
fn pass_spell_out(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    let w = match &graph.node(leaf).kind {
        NodeKind::Word(w) if w.interpret_as == InterpretAs::SpellOut => w.clone(),
        _ => return false,
    };
    let lang = graph.node(leaf).lang.clone();
    let voice = graph.node(leaf).voice.clone();
    let trailing_ws = w.text_with_ws[w.text.len()..].to_string();
    let chars: Vec<char> = w.text.chars().collect();
    let n = chars.len();
    if n == 0 {
        return false;
    }
    for (i, ch) in chars.into_iter().enumerate() {
        let ws = if i + 1 == n { trailing_ws.clone() } else { settings.join_str.clone() };
        let (spoken, role) = match settings.spell_out_words.get(&ch) {
            Some(word) => (word.clone(), None),
            None if ch.is_alphabetic() => (ch.to_string(), Some("LETTER".to_string())),
            None => (ch.to_string(), None),
        };
        let text_with_ws = format!("{}{}", spoken, ws);
        graph.push(lang.clone(), voice.clone(), true, NodeKind::Word(WordData { role, ..WordData::plain(spoken, text_with_ws) }), Some(leaf));
    }
    true
}

/// Pass 10: inner-word break characters (e.g. `-`), only for implicit, unlocked Words.
fn pass_word_break(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    if settings.word_breaks.is_empty() || !graph.node(leaf).implicit {
        return false;
    }
    let Some((text_with_ws, lang, voice)) = unlocked_word(graph, leaf) else { return false };
    if !text_with_ws.chars().any(|c| settings.word_breaks.contains(&c)) {
        return false;
    }
    let (core, trailing_ws) = split_trailing_ws(&text_with_ws);
    let parts: Vec<&str> = core.split(|c: char| settings.word_breaks.contains(&c)).filter(|s| !s.is_empty()).collect();
    if parts.len() < 2 {
        return false;
    }
    let n = parts.len();
    for (i, part) in parts.iter().enumerate() {
        let ws = if i + 1 == n { trailing_ws } else { "" };
        push_plain_word(graph, leaf, &format!("{}{}", part, ws));
    }
    let _ = (lang, voice);
    true
}

/// Pass 11: marks non-words (pure punctuation/symbol tokens with no alphanumeric content) as
/// `Ignore`, excluding them from the flattened output.
fn pass_ignore_non_word(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    let Some(pred) = &settings.is_non_word else { return false };
    let text = match &graph.node(leaf).kind {
        NodeKind::Word(w) if !w.is_locked() => w.text.clone(),
        _ => return false,
    };
    if text.is_empty() || !pred(&text) {
        return false;
    }
    graph.node_mut(leaf).kind = NodeKind::Ignore;
    true
}

fn run_pass(graph: &mut Graph, root: NodeId, settings_for: &dyn Fn(&str) -> Settings, pass: impl Fn(&mut Graph, NodeId, &Settings) -> bool) {
    for leaf in graph.leaves_from(root) {
        let lang = graph.node(leaf).lang.clone();
        let settings = settings_for(&lang);
        pass(graph, leaf, &settings);
    }
}

/// Runs the whole fixed-order pipeline over a freshly built tree: splits 1-8, the sentence
/// breaker, splits 9-11, then the number/currency/date transform and verbalize passes.
pub fn run_pipeline(graph: &mut Graph, root: NodeId, settings_for: &dyn Fn(&str) -> Settings) {
    run_pass(graph, root, settings_for, pass_replacements);
    run_pass(graph, root, settings_for, pass_punctuation);
    run_pass(graph, root, settings_for, pass_minor_break);
    run_pass(graph, root, settings_for, pass_abbreviation);
    run_pass(graph, root, settings_for, pass_initialism);
    run_pass(graph, root, settings_for, pass_major_break);
    run_pass(graph, root, settings_for, pass_punctuation);
    run_pass(graph, root, settings_for, pass_initialism);

    break_sentences(graph, root);

    run_pass(graph, root, settings_for, pass_spell_out);
    run_pass(graph, root, settings_for, pass_word_break);
    run_pass(graph, root, settings_for, pass_ignore_non_word);

    run_pass(graph, root, settings_for, transform_number);
    run_pass(graph, root, settings_for, transform_currency);
    run_pass(graph, root, settings_for, transform_date);

    run_pass(graph, root, settings_for, verbalize_number);
    run_pass(graph, root, settings_for, verbalize_currency);
    run_pass(graph, root, settings_for, verbalize_date);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Graph;

    fn leaves_text(graph: &Graph, root: NodeId) -> Vec<String> {
        graph.leaves_from(root).into_iter().filter_map(|id| graph.node(id).kind.text().map(|t| t.to_string())).collect()
    }

    fn sentence_with(text: &str) -> (Graph, NodeId) {
        let mut graph = Graph::new();
        let speak = graph.push("en_US".into(), None, false, NodeKind::Speak, None);
        let para = graph.push("en_US".into(), None, true, NodeKind::Paragraph, Some(speak));
        let sentence = graph.push("en_US".into(), None, true, NodeKind::Sentence { explicit: false }, Some(para));
        for (_, piece) in tokenize_preserving_ws(text) {
            push_plain_word(&mut graph, sentence, &piece);
        }
        (graph, speak)
    }

    #[test]
    fn quoted_sentence_splits_punctuation_and_break() {
        let (mut graph, root) = sentence_with("\"one.\" ");
        let settings = Settings::default_for("en_US");
        run_pipeline(&mut graph, root, &|_| settings.clone());
        assert_eq!(leaves_text(&graph, root), vec!["\"", "one", ".", "\""]);
    }

    #[test]
    fn abbreviation_expands_with_trailing_break() {
        let (mut graph, root) = sentence_with("Mr.? ");
        let settings = Settings::default_for("en_US");
        run_pipeline(&mut graph, root, &|_| settings.clone());
        assert_eq!(leaves_text(&graph, root), vec!["Mister", "?"]);
    }

    #[test]
    fn plain_dollar_amount_verbalizes() {
        let (mut graph, root) = sentence_with("$10");
        let settings = Settings::default_for("en_US");
        run_pipeline(&mut graph, root, &|_| settings.clone());
        assert_eq!(leaves_text(&graph, root), vec!["ten", "dollars"]);
    }
}
