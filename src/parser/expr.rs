//! Expression accumulation within a single statement's RHS (or a `fire`
//! call's argument, or an `if`/`while` condition).
//!
//! A plain run of atoms and operators is simply appended to the top frame's
//! buffer. A `fire NAME ( … )` or a postfix `NAME[INDEX]` nested inside the
//! expression pushes a new frame so token-feeding continues where it left
//! off once the nested construct closes — this is the `previous_state`
//! mechanism from the original parser (SPEC_FULL.md §10), reshaped into an
//! explicit stack instead of a single saved-state field.

use crate::ast::{AstNode, NodeKind};
use crate::error::{GalError, GalResult};
use crate::parser::precedence;
use crate::token::{Token, TokenKind};

enum FrameKind {
    Top,
    Call { name: Option<String>, in_parens: bool, args: Vec<AstNode>, line: usize },
    Index { line: usize },
}

struct Frame {
    buffer: Vec<AstNode>,
    kind: FrameKind,
}

pub struct ExprAcc {
    frames: Vec<Frame>,
}

impl ExprAcc {
    pub fn new() -> Self {
        Self { frames: vec![Frame { buffer: Vec::new(), kind: FrameKind::Top }] }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.len() == 1 && self.frames[0].buffer.is_empty()
    }

    fn top(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("ExprAcc always has a top frame")
    }

    /// Feeds one token. Whitespace and comments are no-ops; everything else
    /// either extends the current buffer or opens/closes a nested frame.
    pub fn feed(&mut self, token: &Token) -> GalResult<()> {
        match token.kind {
            TokenKind::Whitespace | TokenKind::Comment => return Ok(()),
            _ => {}
        }

        if token.kind == TokenKind::Keyword && token.value == crate::token::KEYWORD_CALL {
            self.frames.push(Frame {
                buffer: Vec::new(),
                kind: FrameKind::Call { name: None, in_parens: false, args: Vec::new(), line: token.line },
            });
            return Ok(());
        }

        if token.kind == TokenKind::Punctuation && token.value == "[" {
            let opens_index = matches!(
                self.top().buffer.last(),
                Some(node) if node.kind == NodeKind::Identifier
            );
            if !opens_index {
                return Err(GalError::parse(
                    "member access must follow an identifier",
                    Some(token.line),
                ));
            }
            self.frames.push(Frame { buffer: Vec::new(), kind: FrameKind::Index { line: token.line } });
            return Ok(());
        }

        if token.kind == TokenKind::Punctuation && token.value == "]" {
            return self.close_index(token.line);
        }

        // Inside a Call frame: name, then "(" / "," / ")" are structural.
        if let FrameKind::Call { .. } = self.top().kind {
            if self.step_call(token)? {
                return Ok(());
            }
        }

        self.push_atom(token)
    }

    fn push_atom(&mut self, token: &Token) -> GalResult<()> {
        let node = match token.kind {
            TokenKind::Identifier => AstNode::with_value(NodeKind::Identifier, &token.value, token.line),
            TokenKind::Number => AstNode::with_value(NodeKind::Number, &token.value, token.line),
            TokenKind::String => AstNode::with_value(NodeKind::String, &token.value, token.line),
            TokenKind::Keyword if token.value == crate::token::KEYWORD_TRUE || token.value == crate::token::KEYWORD_FALSE => {
                AstNode::with_value(NodeKind::Boolean, &token.value, token.line)
            }
            TokenKind::Keyword if token.value == crate::token::KEYWORD_NONE => {
                AstNode::with_value(NodeKind::None, &token.value, token.line)
            }
            TokenKind::Operator => AstNode::with_value(NodeKind::Operator, &token.value, token.line),
            TokenKind::Punctuation if token.value == "(" || token.value == ")" => {
                AstNode::with_value(NodeKind::Block, &token.value, token.line)
            }
            _ => {
                return Err(GalError::parse(
                    format!("unexpected token '{}' in expression", token.value),
                    Some(token.line),
                ))
            }
        };
        self.top().buffer.push(node);
        Ok(())
    }

    /// Handles one token while the top frame is a `Call`. Returns `true` if
    /// the token was structural (consumed here), `false` if it should fall
    /// through to ordinary atom handling (i.e. it's part of an argument).
    fn step_call(&mut self, token: &Token) -> GalResult<bool> {
        let (name_set, in_parens) = match &self.top().kind {
            FrameKind::Call { name, in_parens, .. } => (name.is_some(), *in_parens),
            _ => unreachable!(),
        };

        if !name_set {
            if token.kind == TokenKind::Identifier {
                if let FrameKind::Call { name, .. } = &mut self.top().kind {
                    *name = Some(token.value.clone());
                }
                return Ok(true);
            }
            return Err(GalError::parse("expected a function name after 'fire'", Some(token.line)));
        }

        if !in_parens {
            if token.kind == TokenKind::Punctuation && token.value == "(" {
                if let FrameKind::Call { in_parens, .. } = &mut self.top().kind {
                    *in_parens = true;
                }
                return Ok(true);
            }
            return Err(GalError::parse("expected '(' after function name", Some(token.line)));
        }

        if token.kind == TokenKind::Punctuation && token.value == "," {
            self.finish_call_argument(token.line)?;
            return Ok(true);
        }

        if token.kind == TokenKind::Punctuation && token.value == ")" {
            let had_content = !self.top().buffer.is_empty();
            let has_prior_args =
                matches!(&self.top().kind, FrameKind::Call { args, .. } if !args.is_empty());
            if had_content || has_prior_args {
                self.finish_call_argument(token.line)?;
            }
            self.close_call(token.line)?;
            return Ok(true);
        }

        Ok(false)
    }

    fn finish_call_argument(&mut self, line: usize) -> GalResult<()> {
        let frame = self.frames.pop().expect("call frame present");
        let mut wrapper = AstNode::new(NodeKind::Expression, line);
        wrapper.children = frame.buffer;
        if wrapper.children.is_empty() {
            return Err(GalError::parse("expected an expression", Some(line)));
        }
        precedence::reduce(&mut wrapper)?;
        let arg = wrapper.children.remove(0);

        let (name, in_parens, mut args) = match frame.kind {
            FrameKind::Call { name, in_parens, args, .. } => (name, in_parens, args),
            _ => unreachable!(),
        };
        args.push(arg);
        self.frames.push(Frame {
            buffer: Vec::new(),
            kind: FrameKind::Call { name, in_parens, args, line },
        });
        Ok(())
    }

    fn close_call(&mut self, line: usize) -> GalResult<()> {
        let frame = self.frames.pop().expect("call frame present");
        let (name, args) = match frame.kind {
            FrameKind::Call { name, args, .. } => (name, args),
            _ => unreachable!(),
        };
        let name = name.ok_or_else(|| GalError::parse("expected a function name after 'fire'", Some(line)))?;
        let mut call = AstNode::with_value(NodeKind::FunctionCall, name, line);
        call.children = args;
        self.top().buffer.push(call);
        Ok(())
    }

    fn close_index(&mut self, line: usize) -> GalResult<()> {
        let frame = self.frames.pop().ok_or_else(|| GalError::parse("unmatched ']'", Some(line)))?;
        if !matches!(frame.kind, FrameKind::Index { .. }) {
            return Err(GalError::parse("unmatched ']'", Some(line)));
        }
        let mut wrapper = AstNode::new(NodeKind::Expression, line);
        wrapper.children = frame.buffer;
        if wrapper.children.is_empty() {
            return Err(GalError::parse("expected an index expression", Some(line)));
        }
        precedence::reduce(&mut wrapper)?;
        let index = wrapper.children.remove(0);

        let target = self
            .top()
            .buffer
            .pop()
            .filter(|n| n.kind == NodeKind::Identifier)
            .ok_or_else(|| GalError::parse("member access must follow an identifier", Some(line)))?;

        let mut access = AstNode::with_value(NodeKind::MemberAccess, target.value, line);
        access.children = vec![index];
        self.top().buffer.push(access);
        Ok(())
    }

    /// Finishes the expression and returns a single `expression` node whose
    /// one child is the fully reduced tree.
    pub fn finish(mut self, line: usize) -> GalResult<AstNode> {
        if self.frames.len() != 1 {
            return Err(GalError::parse("unterminated 'fire(' or '[' in expression", Some(line)));
        }
        let buffer = self.frames.pop().unwrap().buffer;
        let mut node = AstNode::new(NodeKind::Expression, line);
        node.children = buffer;
        precedence::reduce(&mut node)?;
        Ok(node)
    }
}
