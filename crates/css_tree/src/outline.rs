//! Document summaries: a structural outline and size-bounded chunks of
//! serialized top-level nodes.

use crate::node::{CssNode, NodeId};
use crate::serialize::serialize;
use crate::traverse::{PreOrder, walk};
use css_syntax::NodeType;
use serde::{Deserialize, Serialize};
use tools::text::{char_count, truncate_chars};

const PREVIEW_CHARS: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineEntry {
    pub node_id: NodeId,
    pub depth: usize,
    #[serde(rename = "type")]
    pub kind: NodeType,
    /// Serialized node, cut to 200 characters.
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Outline {
    pub entries: Vec<OutlineEntry>,
}

/// Rules, at-rules, declarations and selectors in document order.
pub fn outline<T>(tree: &T) -> Outline
where
    T: AsRef<CssNode> + ?Sized,
{
    let mut entries = Vec::new();
    walk(tree, |node, depth| {
        if matches!(
            node.kind,
            NodeType::Rule | NodeType::Atrule | NodeType::Declaration | NodeType::Selector
        ) {
            entries.push(OutlineEntry {
                node_id: node.id,
                depth,
                kind: node.kind,
                text: truncate_chars(&serialize(node), PREVIEW_CHARS).to_string(),
            });
        }
    });
    Outline { entries }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChunkOptions {
    pub max_chars: usize,
    pub max_nodes: usize,
    pub max_bytes: Option<usize>,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            max_chars: 8192,
            max_nodes: 256,
            max_bytes: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub index: usize,
    /// First top-level node in the chunk.
    pub node_id: NodeId,
    pub content: String,
    /// Total nodes (all descendants included) in the chunk.
    pub nodes: usize,
}

#[derive(Default)]
struct PendingChunk {
    node_id: Option<NodeId>,
    content: String,
    chars: usize,
    nodes: usize,
}

impl PendingChunk {
    fn fits(&self, options: &ChunkOptions, chars: usize, nodes: usize, bytes: usize) -> bool {
        self.chars + chars <= options.max_chars
            && self.nodes + nodes <= options.max_nodes
            && options
                .max_bytes
                .is_none_or(|max| self.content.len() + bytes <= max)
    }

    fn flush(&mut self, chunks: &mut Vec<Chunk>) {
        let pending = std::mem::take(self);
        if let Some(node_id) = pending.node_id {
            chunks.push(Chunk {
                index: chunks.len(),
                node_id,
                content: pending.content,
                nodes: pending.nodes,
            });
        }
    }
}

/// Group serialized top-level nodes (or the root, for a childless tree) into
/// chunks. A single node larger than the limits gets a chunk of its own.
pub fn chunk<T>(tree: &T, options: &ChunkOptions) -> Vec<Chunk>
where
    T: AsRef<CssNode> + ?Sized,
{
    let root = tree.as_ref();
    let units = if root.children.is_empty() {
        std::slice::from_ref(root)
    } else {
        root.children.as_slice()
    };

    let mut chunks = Vec::new();
    let mut pending = PendingChunk::default();
    for node in units {
        let content = serialize(node);
        let chars = char_count(content.as_bytes());
        let nodes = PreOrder::new(node).count();
        if pending.node_id.is_some() && !pending.fits(options, chars, nodes, content.len()) {
            pending.flush(&mut chunks);
        }
        pending.node_id.get_or_insert(node.id);
        pending.content.push_str(&content);
        pending.chars += chars;
        pending.nodes += nodes;
    }
    pending.flush(&mut chunks);
    chunks
}
