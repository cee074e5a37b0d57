//! The three-pass expression fixup (spec §4.2): operator fusion,
//! parenthesization into `block` subtrees, then precedence lowering by
//! repeated leftmost binary split. Operates in place on a node's flat
//! `children` buffer, whatever kind that node is (`expression` or `block`).

use crate::ast::{AstNode, NodeKind};
use crate::error::{GalError, GalResult};

const TIERS: [&[&str]; 5] = [
    &["&&"],
    &["||"],
    &["==", "!=", "===", "!==", "<", ">", "<=", ">="],
    &["+", "-"],
    &["*", "/", "%", "**", "^", "&", "|"],
];

/// Runs all three passes on `node.children`, leaving exactly one child: the
/// fully reduced expression tree.
pub fn reduce(node: &mut AstNode) -> GalResult<()> {
    fuse_operators(&mut node.children)?;
    make_blocks(&mut node.children)?;
    order_operations(node)?;

    if node.children.len() != 1 {
        return Err(GalError::parse(
            "expression did not reduce to a single value",
            node.children.first().map(|c| c.line),
        ));
    }
    Ok(())
}

fn fuse_operators(children: &mut Vec<AstNode>) -> GalResult<()> {
    let mut i = 0;
    while i < children.len() {
        if children[i].kind == NodeKind::Operator {
            let is_leading_bang = i == 0 && children[i].value == "!";
            if (i == 0 && !is_leading_bang) || i == children.len() - 1 {
                return Err(GalError::parse(
                    "operator at start or end of expression",
                    Some(children[i].line),
                ));
            }
            if children[i + 1].kind == NodeKind::Operator {
                let merged = format!("{}{}", children[i].value, children[i + 1].value);
                children[i].value = merged;
                children.remove(i + 1);
                i = 0;
                continue;
            }
        }
        i += 1;
    }
    Ok(())
}

/// Splices matched `(`/`)` marker pairs (pushed by the parser as `Block`
/// nodes with value `"("`/`")"`) into nested `block` subtrees.
fn make_blocks(children: &mut Vec<AstNode>) -> GalResult<()> {
    loop {
        let open = children
            .iter()
            .position(|c| c.kind == NodeKind::Block && c.value == "(");
        let Some(open) = open else { break };

        let mut depth = 0usize;
        let mut close = None;
        for (offset, child) in children[open..].iter().enumerate() {
            if child.kind == NodeKind::Block && child.value == "(" {
                depth += 1;
            } else if child.kind == NodeKind::Block && child.value == ")" {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + offset);
                    break;
                }
            }
        }
        let Some(close) = close else {
            return Err(GalError::parse("unmatched '(' in expression", children[open].line));
        };

        let line = children[open].line;
        let mut inner: Vec<AstNode> = children.drain(open..=close).skip(1).collect();
        inner.pop(); // drop the trailing ")" marker we just drained along with "("
        let mut block = AstNode::new(NodeKind::Block, line);
        block.children = inner;
        make_blocks(&mut block.children)?;
        children.insert(open, block);
    }
    Ok(())
}

fn order_operations(node: &mut AstNode) -> GalResult<()> {
    for child in node.children.iter_mut() {
        if child.kind == NodeKind::Block {
            order_operations(child)?;
        }
    }

    for ops in TIERS {
        while let Some(i) = find_operator(&node.children, ops) {
            binary_split(node, i)?;
        }
    }

    if matches!(node.children.first(), Some(c) if c.kind == NodeKind::Operator && c.value == "!") {
        unary_split(node)?;
    }

    Ok(())
}

fn find_operator(children: &[AstNode], ops: &[&str]) -> Option<usize> {
    children
        .iter()
        .position(|c| c.kind == NodeKind::Operator && ops.contains(&c.value.as_str()))
}

fn binary_split(node: &mut AstNode, i: usize) -> GalResult<()> {
    if i == 0 || i == node.children.len() - 1 {
        return Err(GalError::parse(
            "operator at start or end of expression",
            Some(node.children[i].line),
        ));
    }

    let line = node.children[i].line;
    let op = node.children[i].value.clone();

    let right_side: Vec<AstNode> = node.children.split_off(i + 1);
    node.children.pop(); // remove the operator itself
    let left_side: Vec<AstNode> = std::mem::take(&mut node.children);

    let mut left_block = AstNode::new(NodeKind::Block, line);
    left_block.children = left_side;
    let mut right_block = AstNode::new(NodeKind::Block, line);
    right_block.children = right_side;

    order_operations(&mut left_block)?;
    order_operations(&mut right_block)?;

    let mut binary = AstNode::with_value(NodeKind::BinaryOperation, op, line);
    binary.children = vec![left_block, right_block];

    node.children = vec![binary];
    Ok(())
}

fn unary_split(node: &mut AstNode) -> GalResult<()> {
    let line = node.children[0].line;
    let rest: Vec<AstNode> = node.children.split_off(1);

    let mut operand = AstNode::new(NodeKind::Block, line);
    operand.children = rest;
    order_operations(&mut operand)?;

    let unary = AstNode {
        kind: NodeKind::UnaryOperation,
        value: "!".to_string(),
        children: vec![operand],
        line,
    };
    node.children = vec![unary];
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNode;

    fn atom(kind: NodeKind, value: &str) -> AstNode {
        AstNode::with_value(kind, value, 1)
    }

    fn op(value: &str) -> AstNode {
        atom(NodeKind::Operator, value)
    }

    #[test]
    fn single_atom_reduces_to_itself() {
        let mut expr = AstNode::new(NodeKind::Expression, 1);
        expr.push(atom(NodeKind::Number, "5"));
        reduce(&mut expr).unwrap();
        assert_eq!(expr.children.len(), 1);
        assert_eq!(expr.children[0].kind, NodeKind::Number);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        // 1 + 2 * 3
        let mut expr = AstNode::new(NodeKind::Expression, 1);
        expr.push(atom(NodeKind::Number, "1"));
        expr.push(op("+"));
        expr.push(atom(NodeKind::Number, "2"));
        expr.push(op("*"));
        expr.push(atom(NodeKind::Number, "3"));
        reduce(&mut expr).unwrap();

        let root = &expr.children[0];
        assert_eq!(root.kind, NodeKind::BinaryOperation);
        assert_eq!(root.value, "+");
        let right = &root.children[1].children[0];
        assert_eq!(right.kind, NodeKind::BinaryOperation);
        assert_eq!(right.value, "*");
    }

    #[test]
    fn fuses_double_equals() {
        let mut expr = AstNode::new(NodeKind::Expression, 1);
        expr.push(atom(NodeKind::Boolean, "yay"));
        expr.push(op("="));
        expr.push(op("="));
        expr.push(atom(NodeKind::Boolean, "yay"));
        reduce(&mut expr).unwrap();
        assert_eq!(expr.children[0].value, "==");
    }

    #[test]
    fn rejects_trailing_operator() {
        let mut expr = AstNode::new(NodeKind::Expression, 1);
        expr.push(atom(NodeKind::Number, "1"));
        expr.push(op("+"));
        let err = reduce(&mut expr).unwrap_err();
        assert!(matches!(err, GalError::Parse { .. }));
    }

    #[test]
    fn leading_bang_is_unary_not_an_error() {
        let mut expr = AstNode::new(NodeKind::Expression, 1);
        expr.push(op("!"));
        expr.push(atom(NodeKind::Boolean, "yay"));
        reduce(&mut expr).unwrap();
        assert_eq!(expr.children[0].kind, NodeKind::UnaryOperation);
    }

    #[test]
    fn parenthesization_overrides_precedence() {
        // (1 + 2) * 3
        let mut expr = AstNode::new(NodeKind::Expression, 1);
        expr.push(AstNode::with_value(NodeKind::Block, "(", 1));
        expr.push(atom(NodeKind::Number, "1"));
        expr.push(op("+"));
        expr.push(atom(NodeKind::Number, "2"));
        expr.push(AstNode::with_value(NodeKind::Block, ")", 1));
        expr.push(op("*"));
        expr.push(atom(NodeKind::Number, "3"));
        reduce(&mut expr).unwrap();

        let root = &expr.children[0];
        assert_eq!(root.kind, NodeKind::BinaryOperation);
        assert_eq!(root.value, "*");
    }
}
