//! Depth-first flattening of the final graph into a linear `Vec<Sentence>`, each carrying the
//! `Vec<Word>` a synthesis front-end actually consumes. This is the last stage of the pipeline and
//! the only one that produces owned, serializable output rather than mutating the graph.
use crate::node::{BreakType, Graph, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub text_with_ws: String,
    pub idx: usize,
    pub sent_idx: usize,
    pub lang: String,
    pub voice: Option<String>,
    pub role: Option<String>,
    pub pos: Option<String>,
    pub phonemes: Option<Vec<String>>,
    pub is_break: bool,
    pub is_punctuation: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sentence {
    pub idx: usize,
    pub text: String,
    pub text_with_ws: String,
    pub lang: String,
    pub voice: Option<String>,
    pub words: Vec<Word>,
}

/// Controls which leaf kinds make it into the flattened output; a caller synthesising raw text
/// typically wants everything, one feeding a phonemizer that doesn't model pauses would turn
/// `major_breaks`/`minor_breaks` off.
#[derive(Debug, Clone, Copy)]
pub struct SentenceOptions {
    pub major_breaks: bool,
    pub minor_breaks: bool,
    pub punctuations: bool,
    pub explicit_lang: bool,
    pub break_phonemes: bool,
}

impl Default for SentenceOptions {
    fn default() -> Self {
        Self { major_breaks: true, minor_breaks: true, punctuations: true, explicit_lang: true, break_phonemes: false }
    }
}

pub fn flatten(graph: &Graph, root: NodeId, options: SentenceOptions) -> Vec<Sentence> {
    let sentence_nodes: Vec<NodeId> = graph.dfs_preorder(root).into_iter().filter(|&id| matches!(&graph.node(id).kind, NodeKind::Sentence { .. })).collect();

    let mut sentences = Vec::with_capacity(sentence_nodes.len());
    for (sent_idx, &sentence_id) in sentence_nodes.iter().enumerate() {
        let lang = graph.node(sentence_id).lang.clone();
        let voice = graph.node(sentence_id).voice.clone();
        let mut words = Vec::new();
        collect_words(graph, sentence_id, sent_idx, &options, &mut words);

        let text_with_ws: String = words.iter().map(|w: &Word| w.text_with_ws.as_str()).collect();
        let text: String = text_with_ws.trim_end().to_string();
        sentences.push(Sentence { idx: sent_idx, text, text_with_ws, lang, voice, words });
    }
    sentences
}

fn collect_words(graph: &Graph, node: NodeId, sent_idx: usize, options: &SentenceOptions, out: &mut Vec<Word>) {
    for &child in graph.children(node) {
        if !graph.is_leaf(child) {
            collect_words(graph, child, sent_idx, options, out);
            continue;
        }
        let n = graph.node(child);
        let (keep, text, text_with_ws, is_break, is_punctuation, role, pos, phonemes) = match &n.kind {
            NodeKind::Word(w) => (true, w.text.clone(), w.text_with_ws.clone(), false, false, w.role.clone(), w.pos.clone(), w.phonemes.clone()),
            NodeKind::PunctuationWord { text, text_with_ws } => (options.punctuations, text.clone(), text_with_ws.clone(), false, true, None, None, None),
            NodeKind::BreakWord { break_type, text, text_with_ws } => {
                let keep = match break_type {
                    BreakType::Major => options.major_breaks,
                    BreakType::Minor => options.minor_breaks,
                };
                let phonemes = if options.break_phonemes { Some(vec!["<break>".to_string()]) } else { None };
                (keep, text.clone(), text_with_ws.clone(), true, false, None, None, phonemes)
            }
            NodeKind::Break { time } => {
                let phonemes = if options.break_phonemes { Some(vec!["<break>".to_string()]) } else { None };
                (options.major_breaks, String::new(), String::new(), true, false, time.clone().map(|t| format!("time:{}", t)), None, phonemes)
            }
            NodeKind::Ignore | NodeKind::Speak | NodeKind::Paragraph | NodeKind::Sentence { .. } => (false, String::new(), String::new(), false, false, None, None, None),
        };
        if !keep {
            continue;
        }
        let idx = out.len();
        let lang = if options.explicit_lang { n.lang.clone() } else { String::new() };
        out.push(Word { text, text_with_ws, idx, sent_idx, lang, voice: n.voice.clone(), role, pos, phonemes, is_break, is_punctuation });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::WordData;

    fn build_simple() -> (Graph, NodeId) {
        let mut graph = Graph::new();
        let speak = graph.push("en_US".into(), None, false, NodeKind::Speak, None);
        let para = graph.push("en_US".into(), None, true, NodeKind::Paragraph, Some(speak));
        let sentence = graph.push("en_US".into(), None, true, NodeKind::Sentence { explicit: false }, Some(para));
        graph.push("en_US".into(), None, true, NodeKind::Word(WordData::plain("Hi", "Hi ")), Some(sentence));
        graph.push(
            "en_US".into(),
            None,
            true,
            NodeKind::BreakWord { break_type: BreakType::Major, text: ".".into(), text_with_ws: ". ".into() },
            Some(sentence),
        );
        (graph, speak)
    }

    #[test]
    fn flattens_sentence_with_break() {
        let (graph, root) = build_simple();
        let sentences = flatten(&graph, root, SentenceOptions::default());
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].text, "Hi .");
        assert_eq!(sentences[0].words.len(), 2);
        assert!(sentences[0].words[1].is_break);
    }

    #[test]
    fn omits_major_breaks_when_disabled() {
        let (graph, root) = build_simple();
        let options = SentenceOptions { major_breaks: false, ..SentenceOptions::default() };
        let sentences = flatten(&graph, root, options);
        assert_eq!(sentences[0].words.len(), 1);
    }
}
