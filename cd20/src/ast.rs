//! Abstract syntax tree.
//!
//! Every node has up to three ordered child slots. Which slot holds what is
//! fixed per [`NodeKind`]; absent optional parts leave their slot empty.
//! Variadic productions are chains of a list kind node leaning right:
//! `LIST(a, LIST(b, c))`. A list of one item is the item itself.
use smol_str::SmolStr;
use std::fmt;

use crate::symbols::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum NodeKind {
    // Program structure
    Program,        // value: name; left: Globals, centre: Functions?, right: Main
    Globals,        // left: constants?, centre: types?, right: arrays?
    Functions,      // list of FunctionDef
    Main,           // value: scope; left: declarations?, right: statements?
    InitList,       // list of Init
    Init,           // symbol: constant; left: initialiser expression
    TypeList,       // list of ArrayDef | StructDef
    ArrayDef,       // value: type name; left: length expression, right: element type
    StructDef,      // value: type name; left: fields
    StructFields,   // list of Decl
    ArrayDecls,     // list of ArrayDecl
    ArrayDecl,      // value: name; symbol: variable
    FunctionDef,    // value: name; symbol: function; left: params?, centre: locals?, right: statements?
    ParamList,      // list of Decl
    DeclList,       // list of Decl
    Decl,           // value: name; symbol: variable
    TypeId,         // value: user type name

    // Statements
    Statements,     // list of statements
    For,            // value: scope; left: assignments?, centre: condition, right: body?
    If,             // value: scope; left: condition, centre: body?
    IfElse,         // value: scope; left: condition, centre: body?, right: else body?
    Repeat,         // value: scope; left: assignments?, centre: body?, right: condition
    AssignList,     // list of assignments
    Assign,         // symbol: target; left: variable, right: value
    AddAssign,      // +=
    SubAssign,      // -=
    MulAssign,      // *=
    DivAssign,      // /=
    Input,          // left: variables
    VariableList,   // list of Variable
    Print,          // left: entries
    Println,        // left: entries
    PrintList,      // list of String | expression
    Return,         // left: value?
    CallStatement,  // value: name; symbol: function; left: arguments?

    // Expressions
    ExpressionList, // list of expressions
    Call,           // value: name; symbol: function; left: arguments?
    Variable,       // value: name; symbol: variable
    IntLiteral,     // value: literal; symbol: pooled constant
    RealLiteral,    // value: literal; symbol: pooled constant
    String,         // value: text; symbol: pooled constant
    True,
    False,
    Not,            // left: operand
    And,            // left, right
    Or,
    Xor,
    Equal,
    NotEqual,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl NodeKind {
    /// Kinds whose nodes form right leaning list chains.
    pub fn is_list(&self) -> bool {
        use NodeKind as N;
        matches!(
            self,
            N::Functions
                | N::InitList
                | N::TypeList
                | N::StructFields
                | N::ArrayDecls
                | N::ParamList
                | N::DeclList
                | N::Statements
                | N::AssignList
                | N::VariableList
                | N::PrintList
                | N::ExpressionList
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub value: Option<SmolStr>,
    /// Symbol bound while parsing, if any.
    pub symbol: Option<SymbolId>,
    left: Option<Box<Node>>,
    centre: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    /// Node without children.
    pub fn leaf(kind: NodeKind) -> Self {
        Self {
            kind,
            value: None,
            symbol: None,
            left: None,
            centre: None,
            right: None,
        }
    }

    /// Node with a single child in the left slot.
    pub fn unary(kind: NodeKind, child: Node) -> Self {
        Self::branch(kind, Some(child), None, None)
    }

    pub fn binary(kind: NodeKind, left: Node, right: Node) -> Self {
        Self::branch(kind, Some(left), None, Some(right))
    }

    /// Node with all three slots given explicitly.
    pub fn branch(kind: NodeKind, left: Option<Node>, centre: Option<Node>, right: Option<Node>) -> Self {
        Self {
            kind,
            value: None,
            symbol: None,
            left: left.map(Box::new),
            centre: centre.map(Box::new),
            right: right.map(Box::new),
        }
    }

    /// Build a right leaning chain of `kind` nodes.
    ///
    /// Returns `None` for no items, and the item itself for one.
    pub fn list(kind: NodeKind, items: Vec<Node>) -> Option<Node> {
        debug_assert!(kind.is_list(), "{:?} is not a list kind", kind);

        let mut items = items.into_iter().rev();
        let mut chain = items.next()?;
        for item in items {
            chain = Node::binary(kind, item, chain);
        }
        Some(chain)
    }

    #[inline]
    pub fn with_value(mut self, value: impl Into<SmolStr>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[inline]
    pub fn with_symbol(mut self, symbol: SymbolId) -> Self {
        self.symbol = Some(symbol);
        self
    }

    #[inline]
    pub fn left(&self) -> Option<&Node> {
        self.left.as_deref()
    }

    #[inline]
    pub fn centre(&self) -> Option<&Node> {
        self.centre.as_deref()
    }

    #[inline]
    pub fn right(&self) -> Option<&Node> {
        self.right.as_deref()
    }

    #[inline]
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// Present children in slot order.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.left().into_iter().chain(self.centre()).chain(self.right())
    }

    /// Flatten a list chain of the given kind into its items.
    ///
    /// A node of any other kind is a list of one.
    pub fn items(&self, kind: NodeKind) -> Vec<&Node> {
        let mut items = Vec::new();
        let mut cursor = Some(self);

        while let Some(node) = cursor {
            if node.kind == kind {
                items.extend(node.left());
                cursor = node.right();
            } else {
                items.push(node);
                cursor = None;
            }
        }

        items
    }

    fn write_tree(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{:?}", "", self.kind, indent = depth * 2)?;
        if let Some(value) = &self.value {
            write!(f, " {:?}", value.as_str())?;
        }
        if let Some(symbol) = self.symbol {
            write!(f, " {}", symbol)?;
        }
        writeln!(f)?;

        for child in self.children() {
            child.write_tree(f, depth + 1)?;
        }

        Ok(())
    }
}

/// Indented tree dump, one node per line.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_tree(f, 0)
    }
}
