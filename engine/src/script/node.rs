/// The kind of a syntax tree node.
///
/// Layouts (children in order):
/// - `File`: declarations.
/// - `ComponentDeclaration` (value: name): one `Type`, or `Property` nodes.
/// - `Property` (value: name): one `Type`.
/// - `SystemDeclaration` (value: name): `EntityParameter`, optional `EventDeclaration`, `Block`.
/// - `EntityParameter` (value: name): `Identifier` nodes naming components.
/// - `EventDeclaration` (value: name): an optional `Payload` and `EntityParameter` groups.
/// - `Payload` (value: name): one `Type`.
/// - `If`: `Expression`, `Block`, optional `Else`. `Else`: one `Block`.
/// - `While`: `Expression`, `Block`.
/// - `Assignment`: `Path`, `Expression`.
/// - `Call` (value: builtin name): one `Expression` per argument.
/// - `Path`: `Identifier` segments.
/// - `Expression`: operands and `Operator` nodes, in postfix order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    ComponentDeclaration,
    Property,
    Type,
    SystemDeclaration,
    EntityParameter,
    EventDeclaration,
    Payload,
    Block,
    Pass,
    If,
    Else,
    While,
    Assignment,
    Call,
    Path,
    Identifier,
    Expression,
    Number,
    Integer,
    String,
    Boolean,
    Operator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub value: String,
    pub line: usize,
    pub column: usize,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, value: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
            column,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// The first child of the given kind.
    pub fn child(&self, kind: NodeKind) -> Option<&Node> {
        self.children.iter().find(|child| child.kind == kind)
    }

    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
        self.children.iter().filter(move |child| child.kind == kind)
    }

    /// The segments of a `Path` node.
    pub fn segments(&self) -> Vec<&str> {
        self.children
            .iter()
            .map(|segment| segment.value.as_str())
            .collect()
    }
}
