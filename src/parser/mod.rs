//! Token stream to AST (spec §4.2).
//!
//! This is a redesign of the original state machine (SPEC_FULL.md §9's
//! "mutable node buffers" flag): instead of one parser struct with twenty
//! scratch fields and a live pointer to the "current parent", nesting is an
//! explicit `Vec<Frame>` stack. A token dispatches on `self.mode`; finishing
//! a statement pops back to whatever the stack's top frame is (or the
//! program root, if the stack is empty) and appends there.

mod expr;
mod precedence;

use crate::ast::{AstNode, NodeKind};
use crate::error::{GalError, GalResult};
use crate::token::{
    is_if_keyword, is_while_keyword, Token, TokenKind, KEYWORD_CALL, KEYWORD_END, KEYWORD_FUNC,
    KEYWORD_IMPORT, KEYWORD_RETURN, KEYWORD_VAR,
};
use expr::ExprAcc;

pub fn parse(tokens: &[Token]) -> GalResult<AstNode> {
    let mut parser = Parser { tokens, mode: Mode::Normal, stack: Vec::new(), root: Vec::new() };
    parser.run()?;

    if !parser.stack.is_empty() {
        return Err(GalError::parse("missing 'end' to close an open block", None));
    }

    let mut program = AstNode::new(NodeKind::Program, 0);
    program.children = parser.root;
    Ok(program)
}

fn skippable(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Whitespace | TokenKind::Comment)
}

enum Frame {
    If { line: usize, cond: Option<AstNode>, body: Vec<AstNode> },
    While { line: usize, cond: Option<AstNode>, body: Vec<AstNode> },
    FuncBody { line: usize, name: String, params: Vec<AstNode>, body: Vec<AstNode> },
}

enum Mode {
    Normal,
    FuncHeader { name: Option<String>, params: Vec<AstNode>, line: usize },
    VarDecl { name: Option<String>, collecting: bool, expr: ExprAcc, line: usize },
    VarAssign { name: String, collecting: bool, expr: ExprAcc, line: usize },
    MemberAssignName { line: usize },
    MemberAssignIndex { name: String, expr: ExprAcc, line: usize },
    MemberAssignAwaitingEq { name: String, index: AstNode, line: usize },
    MemberAssignValue { name: String, index: AstNode, expr: ExprAcc, line: usize },
    FuncCallStmt { name: Option<String>, in_parens: bool, args: Vec<AstNode>, current: ExprAcc, line: usize },
    Return { expr: ExprAcc, line: usize },
    Import { line: usize },
    CondBuilding { expr: ExprAcc, line: usize },
}

struct Parser<'t> {
    tokens: &'t [Token],
    mode: Mode,
    stack: Vec<Frame>,
    root: Vec<AstNode>,
}

impl<'t> Parser<'t> {
    fn run(&mut self) -> GalResult<()> {
        for token in self.tokens {
            self.step(token)?;
        }
        Ok(())
    }

    fn step(&mut self, token: &Token) -> GalResult<()> {
        match &self.mode {
            Mode::Normal => self.step_normal(token),
            Mode::FuncHeader { .. } => self.step_func_header(token),
            Mode::VarDecl { .. } => self.step_var_decl(token),
            Mode::VarAssign { .. } => self.step_var_assign(token),
            Mode::MemberAssignName { .. } => self.step_member_assign_name(token),
            Mode::MemberAssignIndex { .. } => self.step_member_assign_index(token),
            Mode::MemberAssignAwaitingEq { .. } => self.step_member_assign_awaiting_eq(token),
            Mode::MemberAssignValue { .. } => self.step_member_assign_value(token),
            Mode::FuncCallStmt { .. } => self.step_call_stmt(token),
            Mode::Return { .. } => self.step_return(token),
            Mode::Import { .. } => self.step_import(token),
            Mode::CondBuilding { .. } => self.step_cond(token),
        }
    }

    fn emit(&mut self, node: AstNode) {
        match self.stack.last_mut() {
            Some(Frame::If { body, .. }) | Some(Frame::While { body, .. }) | Some(Frame::FuncBody { body, .. }) => {
                body.push(node);
            }
            None => self.root.push(node),
        }
    }

    fn close_block(&mut self, line: usize) -> GalResult<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| GalError::parse("unexpected 'end'", Some(line)))?;

        let node = match frame {
            Frame::If { line, cond, body } => {
                let cond = cond.ok_or_else(|| GalError::parse("'foreal' has no condition", Some(line)))?;
                let mut node = AstNode::new(NodeKind::If, line);
                node.push(cond);
                node.children.extend(body);
                node
            }
            Frame::While { line, cond, body } => {
                let cond = cond.ok_or_else(|| GalError::parse("'durin' has no condition", Some(line)))?;
                let mut node = AstNode::new(NodeKind::While, line);
                node.push(cond);
                node.children.extend(body);
                node
            }
            Frame::FuncBody { line, name, params, body } => {
                let mut node = AstNode::with_value(NodeKind::FunctionDeclaration, name, line);
                node.children = params;
                node.children.extend(body);
                node
            }
        };

        self.emit(node);
        Ok(())
    }

    fn step_normal(&mut self, token: &Token) -> GalResult<()> {
        if skippable(token.kind) || token.kind == TokenKind::Newline {
            return Ok(());
        }

        match token.kind {
            TokenKind::Keyword if token.value == KEYWORD_FUNC => {
                if !self.stack.is_empty() {
                    return Err(GalError::parse(
                        "function declarations must appear at the top level",
                        Some(token.line),
                    ));
                }
                self.mode = Mode::FuncHeader { name: None, params: Vec::new(), line: token.line };
                Ok(())
            }
            TokenKind::Keyword if token.value == KEYWORD_VAR => {
                self.mode = Mode::VarDecl { name: None, collecting: false, expr: ExprAcc::new(), line: token.line };
                Ok(())
            }
            TokenKind::Keyword if is_if_keyword(&token.value) => {
                self.stack.push(Frame::If { line: token.line, cond: None, body: Vec::new() });
                self.mode = Mode::CondBuilding { expr: ExprAcc::new(), line: token.line };
                Ok(())
            }
            TokenKind::Keyword if is_while_keyword(&token.value) => {
                self.stack.push(Frame::While { line: token.line, cond: None, body: Vec::new() });
                self.mode = Mode::CondBuilding { expr: ExprAcc::new(), line: token.line };
                Ok(())
            }
            TokenKind::Keyword if token.value == KEYWORD_RETURN => {
                self.mode = Mode::Return { expr: ExprAcc::new(), line: token.line };
                Ok(())
            }
            TokenKind::Keyword if token.value == KEYWORD_IMPORT => {
                self.mode = Mode::Import { line: token.line };
                Ok(())
            }
            TokenKind::Keyword if token.value == KEYWORD_CALL => {
                self.mode = Mode::FuncCallStmt {
                    name: None,
                    in_parens: false,
                    args: Vec::new(),
                    current: ExprAcc::new(),
                    line: token.line,
                };
                Ok(())
            }
            TokenKind::Keyword if token.value == KEYWORD_END => self.close_block(token.line),
            TokenKind::Punctuation if token.value == "}" => {
                if !matches!(self.stack.last(), Some(Frame::FuncBody { .. })) {
                    return Err(GalError::parse("unexpected '}'", Some(token.line)));
                }
                Ok(())
            }
            TokenKind::Punctuation if token.value == "[" => {
                self.mode = Mode::MemberAssignName { line: token.line };
                Ok(())
            }
            TokenKind::Identifier => {
                self.mode = Mode::VarAssign {
                    name: token.value.clone(),
                    collecting: false,
                    expr: ExprAcc::new(),
                    line: token.line,
                };
                Ok(())
            }
            _ => Err(GalError::parse(
                format!("unexpected token '{}' at start of statement", token.value),
                Some(token.line),
            )),
        }
    }

    /// Header runs from `lowkey` up to and including its opening `{`; the
    /// `{` itself starts the body (collected in `Mode::Normal`, below the
    /// newly pushed `FuncBody` frame), not just a header terminator — the
    /// matching `}` is a no-op marker and the frame closes on `end`, same as
    /// `if`/`while`.
    fn step_func_header(&mut self, token: &Token) -> GalResult<()> {
        let opens_body = match &mut self.mode {
            Mode::FuncHeader { name, params, .. } => {
                if skippable(token.kind) || token.kind == TokenKind::Newline {
                    return Ok(());
                }
                match token.kind {
                    TokenKind::Identifier => {
                        if name.is_none() {
                            *name = Some(token.value.clone());
                        } else {
                            params.push(AstNode::with_value(NodeKind::FunctionArgument, &token.value, token.line));
                        }
                        return Ok(());
                    }
                    TokenKind::Punctuation if token.value == "{" => {
                        if name.is_none() {
                            return Err(GalError::parse("expected a function name after 'lowkey'", Some(token.line)));
                        }
                        true
                    }
                    _ => {
                        return Err(GalError::parse(
                            format!("unexpected token '{}' in function header", token.value),
                            Some(token.line),
                        ))
                    }
                }
            }
            _ => unreachable!("step_func_header called outside Mode::FuncHeader"),
        };

        debug_assert!(opens_body);
        let (name, params, line) = match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::FuncHeader { name, params, line } => {
                (name.ok_or_else(|| GalError::parse("expected a function name", Some(line)))?, params, line)
            }
            _ => unreachable!(),
        };
        self.stack.push(Frame::FuncBody { line, name, params, body: Vec::new() });
        Ok(())
    }

    fn step_var_decl(&mut self, token: &Token) -> GalResult<()> {
        let finished = {
            let (name, collecting, expr) = match &mut self.mode {
                Mode::VarDecl { name, collecting, expr, .. } => (name, collecting, expr),
                _ => unreachable!(),
            };

            if name.is_none() {
                if skippable(token.kind) {
                    return Ok(());
                }
                if token.kind == TokenKind::Identifier {
                    *name = Some(token.value.clone());
                    return Ok(());
                }
                return Err(GalError::parse("expected a variable name after 'fax'", Some(token.line)));
            }

            if !*collecting {
                if skippable(token.kind) {
                    return Ok(());
                }
                if token.kind == TokenKind::Operator && token.value == "=" {
                    *collecting = true;
                    return Ok(());
                }
                return Err(GalError::parse("expected '=' in variable declaration", Some(token.line)));
            }

            if token.kind == TokenKind::Newline {
                true
            } else {
                expr.feed(token)?;
                false
            }
        };

        if finished {
            let (name, expr, line) = match std::mem::replace(&mut self.mode, Mode::Normal) {
                Mode::VarDecl { name, expr, line, .. } => (name.unwrap(), expr, line),
                _ => unreachable!(),
            };
            let value = expr.finish(line)?;
            let mut node = AstNode::with_value(NodeKind::VariableDeclaration, name, line);
            node.push(value);
            self.emit(node);
        }
        Ok(())
    }

    fn step_var_assign(&mut self, token: &Token) -> GalResult<()> {
        let finished = {
            let (collecting, expr) = match &mut self.mode {
                Mode::VarAssign { collecting, expr, .. } => (collecting, expr),
                _ => unreachable!(),
            };

            if !*collecting {
                if skippable(token.kind) {
                    return Ok(());
                }
                if token.kind == TokenKind::Operator && token.value == "=" {
                    *collecting = true;
                    return Ok(());
                }
                return Err(GalError::parse("expected '=' in assignment", Some(token.line)));
            }

            if token.kind == TokenKind::Newline {
                true
            } else {
                expr.feed(token)?;
                false
            }
        };

        if finished {
            let (name, expr, line) = match std::mem::replace(&mut self.mode, Mode::Normal) {
                Mode::VarAssign { name, expr, line, .. } => (name, expr, line),
                _ => unreachable!(),
            };
            let value = expr.finish(line)?;
            let mut node = AstNode::with_value(NodeKind::VariableAssignment, name, line);
            node.push(value);
            self.emit(node);
        }
        Ok(())
    }

    fn step_member_assign_name(&mut self, token: &Token) -> GalResult<()> {
        if skippable(token.kind) {
            return Ok(());
        }
        if token.kind == TokenKind::Identifier {
            let line = match &self.mode {
                Mode::MemberAssignName { line } => *line,
                _ => unreachable!(),
            };
            self.mode = Mode::MemberAssignIndex { name: token.value.clone(), expr: ExprAcc::new(), line };
            return Ok(());
        }
        Err(GalError::parse("expected an identifier after '['", Some(token.line)))
    }

    fn step_member_assign_index(&mut self, token: &Token) -> GalResult<()> {
        if token.kind == TokenKind::Punctuation && token.value == "]" {
            let (name, expr, line) = match std::mem::replace(&mut self.mode, Mode::Normal) {
                Mode::MemberAssignIndex { name, expr, line } => (name, expr, line),
                _ => unreachable!(),
            };
            let index = expr.finish(line)?;
            self.mode = Mode::MemberAssignAwaitingEq { name, index, line };
            return Ok(());
        }
        match &mut self.mode {
            Mode::MemberAssignIndex { expr, .. } => expr.feed(token),
            _ => unreachable!(),
        }
    }

    fn step_member_assign_awaiting_eq(&mut self, token: &Token) -> GalResult<()> {
        if skippable(token.kind) {
            return Ok(());
        }
        if token.kind == TokenKind::Operator && token.value == "=" {
            let (name, index, line) = match std::mem::replace(&mut self.mode, Mode::Normal) {
                Mode::MemberAssignAwaitingEq { name, index, line } => (name, index, line),
                _ => unreachable!(),
            };
            self.mode = Mode::MemberAssignValue { name, index, expr: ExprAcc::new(), line };
            return Ok(());
        }
        Err(GalError::parse("expected '=' after ']' in member assignment", Some(token.line)))
    }

    fn step_member_assign_value(&mut self, token: &Token) -> GalResult<()> {
        let finished = match &mut self.mode {
            Mode::MemberAssignValue { expr, .. } => {
                if token.kind == TokenKind::Newline {
                    true
                } else {
                    expr.feed(token)?;
                    false
                }
            }
            _ => unreachable!(),
        };

        if finished {
            let (name, index, expr, line) = match std::mem::replace(&mut self.mode, Mode::Normal) {
                Mode::MemberAssignValue { name, index, expr, line } => (name, index, expr, line),
                _ => unreachable!(),
            };
            let value = expr.finish(line)?;
            let mut node = AstNode::with_value(NodeKind::MemberAssignment, name, line);
            node.children = vec![index, value];
            self.emit(node);
        }
        Ok(())
    }

    fn step_call_stmt(&mut self, token: &Token) -> GalResult<()> {
        let needs_name = matches!(&self.mode, Mode::FuncCallStmt { name: None, .. });
        if needs_name {
            if skippable(token.kind) {
                return Ok(());
            }
            if token.kind == TokenKind::Identifier {
                if let Mode::FuncCallStmt { name, .. } = &mut self.mode {
                    *name = Some(token.value.clone());
                }
                return Ok(());
            }
            return Err(GalError::parse("expected a function name after 'fire'", Some(token.line)));
        }

        let needs_paren = matches!(&self.mode, Mode::FuncCallStmt { in_parens: false, .. });
        if needs_paren {
            if skippable(token.kind) {
                return Ok(());
            }
            if token.kind == TokenKind::Punctuation && token.value == "(" {
                if let Mode::FuncCallStmt { in_parens, .. } = &mut self.mode {
                    *in_parens = true;
                }
                return Ok(());
            }
            return Err(GalError::parse("expected '(' after function name", Some(token.line)));
        }

        if token.kind == TokenKind::Punctuation && token.value == "," {
            return self.finish_call_stmt_argument(token.line);
        }

        if token.kind == TokenKind::Punctuation && token.value == ")" {
            let (had_content, has_prior_args) = match &self.mode {
                Mode::FuncCallStmt { current, args, .. } => (!current.is_empty(), !args.is_empty()),
                _ => unreachable!(),
            };
            if had_content || has_prior_args {
                self.finish_call_stmt_argument(token.line)?;
            }
            let (name, args, line) = match std::mem::replace(&mut self.mode, Mode::Normal) {
                Mode::FuncCallStmt { name, args, line, .. } => (name.unwrap(), args, line),
                _ => unreachable!(),
            };
            let mut node = AstNode::with_value(NodeKind::FunctionCall, name, line);
            node.children = args;
            self.emit(node);
            return Ok(());
        }

        if token.kind == TokenKind::Newline {
            return Err(GalError::parse("expected ')' to close function call", Some(token.line)));
        }

        match &mut self.mode {
            Mode::FuncCallStmt { current, .. } => current.feed(token),
            _ => unreachable!(),
        }
    }

    fn finish_call_stmt_argument(&mut self, line: usize) -> GalResult<()> {
        let (name, in_parens, mut args, current) = match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::FuncCallStmt { name, in_parens, args, current, .. } => (name, in_parens, args, current),
            _ => unreachable!(),
        };
        let arg = current.finish(line)?.children.remove(0);
        args.push(arg);
        self.mode = Mode::FuncCallStmt { name, in_parens, args, current: ExprAcc::new(), line };
        Ok(())
    }

    fn step_return(&mut self, token: &Token) -> GalResult<()> {
        let finished = match &mut self.mode {
            Mode::Return { expr, .. } => {
                if token.kind == TokenKind::Newline {
                    true
                } else {
                    expr.feed(token)?;
                    false
                }
            }
            _ => unreachable!(),
        };

        if finished {
            let (expr, line) = match std::mem::replace(&mut self.mode, Mode::Normal) {
                Mode::Return { expr, line } => (expr, line),
                _ => unreachable!(),
            };
            let value = expr.finish(line)?;
            let mut node = AstNode::new(NodeKind::Return, line);
            node.push(value);
            self.emit(node);
        }
        Ok(())
    }

    fn step_import(&mut self, token: &Token) -> GalResult<()> {
        if skippable(token.kind) {
            return Ok(());
        }
        if token.kind == TokenKind::String {
            let line = match &self.mode {
                Mode::Import { line } => *line,
                _ => unreachable!(),
            };
            let node = AstNode::with_value(NodeKind::Import, token.value.clone(), line);
            self.mode = Mode::Normal;
            self.emit(node);
            return Ok(());
        }
        Err(GalError::parse("expected a string path after 'gyat'", Some(token.line)))
    }

    fn step_cond(&mut self, token: &Token) -> GalResult<()> {
        if token.kind == TokenKind::Newline {
            let (expr, line) = match std::mem::replace(&mut self.mode, Mode::Normal) {
                Mode::CondBuilding { expr, line } => (expr, line),
                _ => unreachable!(),
            };
            let cond = expr.finish(line)?;
            match self.stack.last_mut() {
                Some(Frame::If { cond: c, .. }) | Some(Frame::While { cond: c, .. }) => *c = Some(cond),
                _ => unreachable!("condition frame must be the one just pushed"),
            }
            return Ok(());
        }
        match &mut self.mode {
            Mode::CondBuilding { expr, .. } => expr.feed(token),
            _ => unreachable!(),
        }
    }
}
