//! MXML AST
//!
//! The already-parsed, already-resolved document tree the binding engine reads.
//! Only the node kinds that matter to data binding are modeled; everything else
//! in a document shows up as `Instance` or `PropertySpecifier` nodes.

use crate::expression::Expr;
use crate::parse_util::ParseSourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn new(id: usize) -> Self {
        NodeId(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum MxmlNodeKind {
    /// Root of the document; the class being compiled.
    Document { class_name: String },
    /// A child tag that creates an object, e.g. `<s:TextInput id="t1"/>`.
    Instance {
        id: Option<String>,
        class_name: String,
    },
    /// A property set on the parent instance, as an attribute or child tag.
    PropertySpecifier { name: String },
    /// `<fx:Model>`.
    Model { id: Option<String> },
    /// The single root tag inside `<fx:Model>`.
    ModelRoot,
    /// A property tag in a model tree. `index` is set for repeated tags that
    /// become array elements.
    ModelProperty { name: String, index: Option<usize> },
    /// A `{...}` or `@{...}` expression whose destination follows from its position.
    DataBinding { expression: Expr, two_way: bool },
    /// `<fx:Binding source="..." destination="..." twoWay="..."/>`.
    Binding {
        source: Option<Expr>,
        destination: Option<Expr>,
        two_way: bool,
    },
}

#[derive(Debug, Clone)]
pub struct MxmlNode {
    pub kind: MxmlNodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub source_span: ParseSourceSpan,
    /// Id given to an `Instance` or `Model` the author left unnamed.
    pub generated_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MxmlDocument {
    nodes: Vec<MxmlNode>,
    generated_ids: usize,
}

fn local_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

impl MxmlDocument {
    pub fn new(class_name: &str) -> Self {
        MxmlDocument {
            nodes: vec![MxmlNode {
                kind: MxmlNodeKind::Document {
                    class_name: class_name.to_string(),
                },
                parent: None,
                children: Vec::new(),
                source_span: ParseSourceSpan::default(),
                generated_id: None,
            }],
            generated_ids: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    pub fn add_child(&mut self, parent: NodeId, kind: MxmlNodeKind) -> NodeId {
        self.add_child_with_span(parent, kind, ParseSourceSpan::default())
    }

    pub fn add_child_with_span(
        &mut self,
        parent: NodeId,
        kind: MxmlNodeKind,
        source_span: ParseSourceSpan,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let generated_id = match &kind {
            MxmlNodeKind::Instance { id: None, class_name } => Some(self.generate_id(class_name)),
            MxmlNodeKind::Model { id: None } => Some(self.generate_id("Model")),
            _ => None,
        };
        self.nodes.push(MxmlNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            source_span,
            generated_id,
        });
        if let Some(parent_node) = self.nodes.get_mut(parent.as_usize()) {
            parent_node.children.push(id);
        }
        id
    }

    /// `_Main_Label1`: document class, instance class, then a counter shared by
    /// every generated id in the document.
    fn generate_id(&mut self, class_name: &str) -> String {
        self.generated_ids += 1;
        format!(
            "_{}_{}{}",
            local_name(self.class_name()),
            local_name(class_name),
            self.generated_ids
        )
    }

    /// The author's `id`, or the generated one for an unnamed `Instance` or
    /// `Model`. `None` for every other kind of node.
    pub fn effective_id(&self, node_id: NodeId) -> Option<&str> {
        let node = self.node(node_id)?;
        match &node.kind {
            MxmlNodeKind::Instance { id: Some(id), .. } | MxmlNodeKind::Model { id: Some(id) } => Some(id.as_str()),
            MxmlNodeKind::Instance { id: None, .. } | MxmlNodeKind::Model { id: None } => {
                node.generated_id.as_deref()
            }
            _ => None,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&MxmlNode> {
        self.nodes.get(id.as_usize())
    }

    pub fn kind(&self, id: NodeId) -> Option<&MxmlNodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn source_span(&self, id: NodeId) -> ParseSourceSpan {
        self.node(id)
            .map(|n| n.source_span.clone())
            .unwrap_or_default()
    }

    /// Ancestors from the parent of `id` up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// All nodes in document (preorder) order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            for child in self.children(id).iter().rev() {
                stack.push(*child);
            }
        }
        order
    }

    pub fn class_name(&self) -> &str {
        match self.kind(self.root()) {
            Some(MxmlNodeKind::Document { class_name }) => class_name,
            _ => "",
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub struct Ancestors<'a> {
    doc: &'a MxmlDocument,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}
