//! Part-of-speech tagging and phoneme lookup, run once the tree has its final shape (every split
//! pass has already run, so every leaf is a terminal token). Tagging operates per sentence because
//! that's the unit a tagger needs context for; phoneme lookup is per word.
use crate::node::{Graph, NodeId, NodeKind};
use crate::settings::Settings;

/// Runs POS tagging and phoneme lookup/guessing over every sentence reachable from `root`.
/// `settings_for(lang)` is consulted per-sentence so a multi-language document enriches each
/// sentence with its own language's collaborators.
pub fn enrich(graph: &mut Graph, root: NodeId, settings_for: &dyn Fn(&str) -> Settings) {
    enrich_selective(graph, root, settings_for, true, true)
}

/// Like [`enrich`] but lets a caller run POS tagging and phoneme lookup independently, matching
/// [`crate::ProcessOptions`]'s separate `pos`/`phonemize` flags.
pub fn enrich_selective(graph: &mut Graph, root: NodeId, settings_for: &dyn Fn(&str) -> Settings, pos: bool, phonemize: bool) {
    let sentences: Vec<NodeId> = graph.dfs_preorder(root).into_iter().filter(|&id| matches!(&graph.node(id).kind, NodeKind::Sentence { .. })).collect();
    for sentence in sentences {
        enrich_sentence(graph, sentence, settings_for, pos, phonemize);
    }
}

fn enrich_sentence(graph: &mut Graph, sentence: NodeId, settings_for: &dyn Fn(&str) -> Settings, pos: bool, phonemize: bool) {
    let word_leaves: Vec<NodeId> = graph
        .dfs_preorder(sentence)
        .into_iter()
        .filter(|&id| graph.is_leaf(id) && matches!(&graph.node(id).kind, NodeKind::Word(_)))
        .collect();
    if word_leaves.is_empty() {
        return;
    }
    let lang = graph.node(sentence).lang.clone();
    let settings = settings_for(&lang);

    if pos {
        if let Some(tagger) = &settings.pos_tagger {
            let texts: Vec<String> = word_leaves
                .iter()
                .map(|&id| match &graph.node(id).kind {
                    NodeKind::Word(w) => w.text.clone(),
                    _ => unreachable!(),
                })
                .collect();
            let tags = tagger(&texts);
            for (&id, tag) in word_leaves.iter().zip(tags.into_iter()) {
                if let NodeKind::Word(w) = &mut graph.node_mut(id).kind {
                    if w.role.is_none() {
                        w.role = Some(format!("gruut:{}", tag));
                    }
                    w.pos = Some(tag);
                }
            }
        }
    }

    if phonemize {
        for &id in &word_leaves {
            let (text, role) = match &graph.node(id).kind {
                NodeKind::Word(w) => (w.text.clone(), w.role.clone().unwrap_or_default()),
                _ => continue,
            };
            if text.is_empty() {
                continue;
            }
            let phonemes = settings
                .phoneme_lookup
                .as_ref()
                .and_then(|lookup| lookup(&text, &role))
                .or_else(|| settings.phoneme_guess.as_ref().and_then(|guess| guess(&text, &role)));
            if let Some(phonemes) = phonemes {
                if let NodeKind::Word(w) = &mut graph.node_mut(id).kind {
                    w.phonemes = Some(phonemes);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::WordData;
    use std::sync::Arc;

    #[test]
    fn tags_and_looks_up_phonemes_per_sentence() {
        let mut graph = Graph::new();
        let speak = graph.push("en_US".into(), None, false, NodeKind::Speak, None);
        let para = graph.push("en_US".into(), None, true, NodeKind::Paragraph, Some(speak));
        let sentence = graph.push("en_US".into(), None, true, NodeKind::Sentence { explicit: false }, Some(para));
        graph.push("en_US".into(), None, true, NodeKind::Word(WordData::plain("run", "run ")), Some(sentence));

        let mut settings = Settings::default_for("en_US");
        settings.pos_tagger = Some(Arc::new(|texts: &[String]| texts.iter().map(|_| "VERB".to_string()).collect()));
        settings.phoneme_lookup = Some(Arc::new(|text: &str, _role: &str| if text == "run" { Some(vec!["R".into(), "AH1".into(), "N".into()]) } else { None }));

        enrich(&mut graph, speak, &|_| settings.clone());

        let word_id = graph.children(graph.children(para)[0])[0];
        match &graph.node(word_id).kind {
            NodeKind::Word(w) => {
                assert_eq!(w.pos.as_deref(), Some("VERB"));
                assert_eq!(w.role.as_deref(), Some("gruut:VERB"));
                assert_eq!(w.phonemes.as_deref(), Some(&["R".to_string(), "AH1".to_string(), "N".to_string()][..]));
            }
            other => panic!("expected word, got {:?}", other),
        }
    }
}
