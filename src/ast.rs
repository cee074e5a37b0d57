//! The AST: one uniform node shape (spec §3), so the parser's tree surgery
//! (operator fusion, parenthesization, precedence lowering) and the cache
//! codec can both operate on shape alone, irrespective of node kind.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Program,
    Expression,
    FunctionDeclaration,
    FunctionCall,
    VariableDeclaration,
    VariableAssignment,
    MemberAssignment,
    MemberAccess,
    If,
    While,
    Return,
    Import,
    Operator,
    BinaryOperation,
    UnaryOperation,
    Identifier,
    Number,
    String,
    Boolean,
    None,
    FunctionArgument,
    Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    pub kind: NodeKind,
    pub value: String,
    pub children: Vec<AstNode>,
    pub line: usize,
}

impl AstNode {
    pub fn new(kind: NodeKind, line: usize) -> Self {
        Self { kind, value: String::new(), children: Vec::new(), line }
    }

    pub fn with_value(kind: NodeKind, value: impl Into<String>, line: usize) -> Self {
        Self { kind, value: value.into(), children: Vec::new(), line }
    }

    pub fn push(&mut self, child: AstNode) {
        self.children.push(child);
    }
}
