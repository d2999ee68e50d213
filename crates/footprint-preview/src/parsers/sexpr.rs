/// S-expression tokenizer for KiCad footprint files.
///
/// Every `(` opens a child of the current node and every `)` returns to its
/// parent. All other characters accumulate into the current node's content;
/// once the scan is done each node's content is split on whitespace runs:
///   content = type field*
///
/// There is no quoting support. Quotes are kept as part of the token, and a
/// `(` or `)` inside a quoted value corrupts the nesting.
use crate::error::ParseError;
use log::{debug, warn};
use std::collections::VecDeque;
use std::fmt;

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

#[derive(Debug, Clone, Default)]
struct NodeData {
    kind: String,
    fields: Vec<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Arena holding every parsed node. Slot 0 is the synthetic root that owns
/// the top-level forms; it is never handed out.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    module: NodeId,
}

impl Tree {
    /// The first top-level form, i.e. the footprint itself.
    pub fn module(&self) -> Node<'_> {
        self.node(self.module)
    }

    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { tree: self, id }
    }
}

/// Borrowed view of one node.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl<'a> Node<'a> {
    fn data(&self) -> &'a NodeData {
        &self.tree.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// First token of the node's content (`fp_line`, `start`, ...).
    pub fn kind(&self) -> &'a str {
        &self.data().kind
    }

    /// Remaining tokens after the type.
    pub fn fields(&self) -> &'a [String] {
        &self.data().fields
    }

    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.fields().get(index).map(String::as_str)
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    /// Enclosing node. The top-level form has no parent: the synthetic root
    /// is not exposed.
    pub fn parent(&self) -> Option<Node<'a>> {
        self.data()
            .parent
            .filter(|&id| id != ROOT)
            .map(|id| self.tree.node(id))
    }

    /// First child with the given type.
    pub fn find(&self, kind: &str) -> Option<Node<'a>> {
        self.children().find(|c| c.kind() == kind)
    }

    /// First child whose type is any of `kinds`.
    pub fn find_any(&self, kinds: &[&str]) -> Option<Node<'a>> {
        self.children().find(|c| kinds.contains(&c.kind()))
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("fields", &self.fields())
            .field("children", &self.children().collect::<Vec<_>>())
            .finish()
    }
}

/// Parse footprint text into a node tree.
pub fn parse(text: &str) -> Result<Tree, ParseError> {
    let mut nodes = vec![NodeData::default()];
    let mut content = vec![String::new()];
    let mut current = ROOT;

    for (offset, ch) in text.char_indices() {
        match ch {
            '(' => {
                let id = NodeId(nodes.len());
                nodes.push(NodeData {
                    parent: Some(current),
                    ..NodeData::default()
                });
                content.push(String::new());
                nodes[current.0].children.push(id);
                current = id;
            }
            ')' => {
                current = nodes[current.0]
                    .parent
                    .ok_or(ParseError::UnbalancedParens { offset })?;
            }
            _ => content[current.0].push(ch),
        }
    }

    if current != ROOT {
        return Err(ParseError::UnbalancedParens { offset: text.len() });
    }

    // Breadth-first so diagnostics come out shallowest first.
    let mut queue = VecDeque::from([ROOT]);
    while let Some(id) = queue.pop_front() {
        let mut tokens = content[id.0].split_whitespace().map(str::to_owned);
        let node = &mut nodes[id.0];
        node.kind = tokens.next().unwrap_or_default();
        node.fields = tokens.collect();
        queue.extend(node.children.iter().copied());
    }

    if !nodes[ROOT.0].kind.is_empty() {
        debug!("ignoring text outside of any form: {:?}", nodes[ROOT.0].kind);
    }

    let module = match nodes[ROOT.0].children.as_slice() {
        [] => return Err(ParseError::EmptyDocument),
        [first] => *first,
        [first, rest @ ..] => {
            warn!(
                "document has {} top-level forms, previewing only the first",
                rest.len() + 1
            );
            *first
        }
    };

    Ok(Tree { nodes, module })
}

/// Strip one pair of surrounding double quotes, if present.
pub fn unquote(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
}
