//! Implicit sentence breaking (§4.4): once a major-break glyph has been split out of a Word, the
//! text that follows it inside the same *implicit* Sentence actually belongs to a new sentence.
//! Explicit `<s>` sentences are left untouched - an author who wrote their own sentence boundaries
//! has already said what they mean by one.
use crate::node::{BreakType, Graph, NodeId, NodeKind};

/// Walks every major BreakWord leaf currently in the tree and, for each one sitting inside an
/// implicit Sentence, splits the trailing content into a new sibling Sentence.
pub fn break_sentences(graph: &mut Graph, root: NodeId) {
    let breaks: Vec<NodeId> = graph
        .leaves_from(root)
        .into_iter()
        .filter(|&id| matches!(&graph.node(id).kind, NodeKind::BreakWord { break_type: BreakType::Major, .. }))
        .collect();
    for break_leaf in breaks {
        split_after_break(graph, break_leaf);
    }
}

fn split_after_break(graph: &mut Graph, break_leaf: NodeId) {
    let Some(sentence) = graph.find_ancestor(break_leaf, |k| matches!(k, NodeKind::Sentence { .. })) else {
        return;
    };
    if matches!(&graph.node(sentence).kind, NodeKind::Sentence { explicit: true }) {
        return;
    }
    let Some(paragraph) = graph.find_ancestor(sentence, |k| matches!(k, NodeKind::Paragraph)) else {
        return;
    };

    // Ascend from the break leaf to the direct child of `sentence` that owns it; that child's
    // position is where the sentence boundary falls.
    let mut anchor = break_leaf;
    loop {
        match graph.parent_of(anchor) {
            Some(p) if p == sentence => break,
            Some(p) => anchor = p,
            None => return,
        }
    }
    let children = graph.children(sentence).to_vec();
    let Some(pos) = children.iter().position(|&c| c == anchor) else { return };
    let tail: Vec<NodeId> = children[pos + 1..].to_vec();
    if tail.is_empty() {
        return;
    }

    let lang = graph.node(sentence).lang.clone();
    let voice = graph.node(sentence).voice.clone();
    let new_sentence = graph.push(lang, voice, true, NodeKind::Sentence { explicit: false }, Some(paragraph));

    let para_children = graph.children_mut(paragraph);
    para_children.pop();
    match para_children.iter().position(|&c| c == sentence) {
        Some(spos) => para_children.insert(spos + 1, new_sentence),
        None => para_children.push(new_sentence),
    }

    graph.children_mut(sentence).truncate(pos + 1);
    for child in tail {
        graph.add_child(new_sentence, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::WordData;

    fn word(graph: &mut Graph, parent: NodeId, text: &str) -> NodeId {
        graph.push("en_US".into(), None, true, NodeKind::Word(WordData::plain(text, format!("{} ", text))), Some(parent))
    }

    #[test]
    fn implicit_sentence_splits_on_major_break() {
        let mut graph = Graph::new();
        let speak = graph.push("en_US".into(), None, false, NodeKind::Speak, None);
        let para = graph.push("en_US".into(), None, true, NodeKind::Paragraph, Some(speak));
        let sentence = graph.push("en_US".into(), None, true, NodeKind::Sentence { explicit: false }, Some(para));
        word(&mut graph, sentence, "One");
        graph.push("en_US".into(), None, true, NodeKind::BreakWord { break_type: BreakType::Major, text: ".".into(), text_with_ws: ". ".into() }, Some(sentence));
        word(&mut graph, sentence, "Two");

        break_sentences(&mut graph, speak);

        let sentences = graph.children(para);
        assert_eq!(sentences.len(), 2);
        assert_eq!(graph.children(sentences[0]).len(), 2);
        assert_eq!(graph.children(sentences[1]).len(), 1);
    }

    #[test]
    fn explicit_sentence_is_not_split() {
        let mut graph = Graph::new();
        let speak = graph.push("en_US".into(), None, false, NodeKind::Speak, None);
        let para = graph.push("en_US".into(), None, true, NodeKind::Paragraph, Some(speak));
        let sentence = graph.push("en_US".into(), None, true, NodeKind::Sentence { explicit: true }, Some(para));
        word(&mut graph, sentence, "One");
        graph.push("en_US".into(), None, true, NodeKind::BreakWord { break_type: BreakType::Major, text: ".".into(), text_with_ws: ". ".into() }, Some(sentence));
        word(&mut graph, sentence, "Two");

        break_sentences(&mut graph, speak);

        assert_eq!(graph.children(para).len(), 1);
        assert_eq!(graph.children(sentence).len(), 3);
    }
}
