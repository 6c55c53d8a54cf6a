//! The typed node model and graph arena described by the pipeline's data model: a DAG of
//! `Speak -> Paragraph -> Sentence -> (Word | BreakWord | PunctuationWord | Break)` nodes, plus
//! deeper descendants attached by split/verbalize passes under a Word.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakType {
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpretAs {
    #[default]
    Unset,
    SpellOut,
    Number,
    Currency,
    Date,
}

/// Everything a `Word` node carries. Split passes attach children instead of mutating this, with
/// the exception of the four explicit mutations the data model allows (set by transform/enrich
/// passes).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordData {
    pub text: String,
    pub text_with_ws: String,
    pub interpret_as: InterpretAs,
    pub format: Option<String>,
    pub role: Option<String>,
    #[serde(with = "decimal_opt")]
    pub number: Option<Decimal>,
    pub date: Option<chrono::NaiveDate>,
    pub currency_symbol: Option<String>,
    pub currency_name: Option<String>,
    pub phonemes: Option<Vec<String>>,
    pub pos: Option<String>,
}

mod decimal_opt {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
        v.map(|d| d.to_string()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(match raw {
            Some(s) => Some(s.parse().map_err(serde::de::Error::custom)?),
            None => None,
        })
    }
}

impl WordData {
    pub fn plain(text: impl Into<String>, text_with_ws: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            text_with_ws: text_with_ws.into(),
            ..Default::default()
        }
    }

    /// A Word is "locked" once a split pass has assigned it an interpretation; most split passes
    /// skip locked words (spell-out expansion and the verbalizers are the exceptions).
    pub fn is_locked(&self) -> bool {
        self.interpret_as != InterpretAs::Unset
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    Speak,
    Paragraph,
    Sentence { explicit: bool },
    Word(WordData),
    BreakWord { break_type: BreakType, text: String, text_with_ws: String },
    Break { time: Option<String> },
    PunctuationWord { text: String, text_with_ws: String },
    Ignore,
}

impl NodeKind {
    pub fn text_with_ws(&self) -> Option<&str> {
        match self {
            Self::Word(w) => Some(&w.text_with_ws),
            Self::BreakWord { text_with_ws, .. } => Some(text_with_ws),
            Self::PunctuationWord { text_with_ws, .. } => Some(text_with_ws),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Word(w) => Some(&w.text),
            Self::BreakWord { text, .. } => Some(text),
            Self::PunctuationWord { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// The outer envelope every node carries regardless of variant: identity, inherited scope, and
/// whether the pipeline synthesized it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub lang: String,
    pub voice: Option<String>,
    pub implicit: bool,
    pub kind: NodeKind,
}

/// An arena of nodes plus an adjacency list keyed by id. Edge order within a parent is the
/// authoritative textual order and must never be reordered except by the sentence breaker, which
/// moves whole edge ranges rather than individual edges.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    children: Vec<Vec<NodeId>>,
    parent: Vec<Option<NodeId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, lang: String, voice: Option<String>, implicit: bool, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node { id, lang, voice, implicit, kind });
        self.children.push(Vec::new());
        self.parent.push(parent);
        if let Some(p) = parent {
            self.children[p].push(id);
        }
        id
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.children[parent].push(child);
        self.parent[child] = Some(parent);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id]
    }

    pub fn children_mut(&mut self, id: NodeId) -> &mut Vec<NodeId> {
        &mut self.children[id]
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parent[id]
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children[id].is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node with out-degree zero, in id order. Only document order for a tree that has
    /// never had a split pass expand some leaves while leaving siblings untouched - once that
    /// happens, newly appended children get ids past every untouched sibling regardless of their
    /// textual position. Prefer [`Self::leaves_from`] whenever document order matters, which is
    /// almost always.
    pub fn leaves(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).filter(|&id| self.is_leaf(id)).collect()
    }

    /// Every node with out-degree zero reachable from `root`, in document order (a pre-order
    /// walk respecting each parent's edge order, not creation id order).
    pub fn leaves_from(&self, root: NodeId) -> Vec<NodeId> {
        self.dfs_preorder(root).into_iter().filter(|&id| self.is_leaf(id)).collect()
    }

    /// Ascend from `id` until a node matching `pred` is found.
    pub fn find_ancestor(&self, id: NodeId, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        let mut cur = self.parent[id];
        while let Some(c) = cur {
            if pred(&self.nodes[c].kind) {
                return Some(c);
            }
            cur = self.parent[c];
        }
        None
    }

    /// Depth-first pre-order traversal starting at `root`.
    pub fn dfs_preorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        // Use an explicit stack but push children in reverse so we pop in forward order.
        let mut visit = |out: &mut Vec<NodeId>, id: NodeId| out.push(id);
        while let Some(id) = stack.pop() {
            visit(&mut out, id);
            for &child in self.children[id].iter().rev() {
                stack.push(child);
            }
        }
        out
    }
}
