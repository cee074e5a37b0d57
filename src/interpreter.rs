//! Tree-walking interpreter (spec §4.3). Statement dispatch mutates scopes
//! and returns `Option<Value>` (a pending `return`); expression evaluation
//! returns a plain `Value`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::ast::{AstNode, NodeKind};
use crate::error::{GalError, GalResult};
use crate::value::{Value, ValueKind, Variable};
use crate::{cache, lexer, loader, parser, stdlib};

const GLOBAL_PREFIX: &str = "GLOBAL_";

/// Everything that varies between runs of the interpreter.
pub struct RunConfig {
    pub entry_path: PathBuf,
    pub args: Vec<String>,
    pub package_root: PathBuf,
    pub use_cache: bool,
}

struct FunctionDef {
    params: Vec<String>,
    body: Vec<AstNode>,
}

pub struct Interpreter {
    config: RunConfig,
    functions: HashMap<String, FunctionDef>,
    global: HashMap<String, Variable>,
    local: HashMap<String, Variable>,
    local_stack: Vec<HashMap<String, Variable>>,
    imported: HashSet<PathBuf>,
}

pub fn run(config: RunConfig) -> GalResult<Value> {
    let entry_path = std::fs::canonicalize(&config.entry_path)
        .map_err(|e| GalError::io(e.to_string(), Some(config.entry_path.clone())))?;

    let mut interpreter = Interpreter {
        config,
        functions: HashMap::new(),
        global: HashMap::new(),
        local: HashMap::new(),
        local_stack: Vec::new(),
        imported: HashSet::new(),
    };

    interpreter.load_file(&entry_path)?;
    interpreter.call_main()
}

impl Interpreter {
    fn load_file(&mut self, path: &Path) -> GalResult<()> {
        if !self.imported.insert(path.to_path_buf()) {
            debug!("'{}' already imported, skipping", path.display());
            return Ok(());
        }

        info!("loading '{}'", path.display());
        let source = std::fs::read_to_string(path)
            .map_err(|e| GalError::io(e.to_string(), Some(path.to_path_buf())))?;

        let ast = self.parse_with_cache(path, &source)?;
        self.exec_top_level(&ast, path)
    }

    fn parse_with_cache(&self, path: &Path, source: &str) -> GalResult<AstNode> {
        if self.config.use_cache {
            if let Some(ast) = cache::try_load(path, source) {
                debug!("cache hit for '{}'", path.display());
                return Ok(ast);
            }
        }

        let tokens = lexer::lex(source)?;
        let ast = parser::parse(&tokens)?;
        if self.config.use_cache {
            cache::save(path, source, &ast);
        }
        Ok(ast)
    }

    fn exec_top_level(&mut self, program: &AstNode, current_file: &Path) -> GalResult<()> {
        for statement in &program.children {
            match statement.kind {
                NodeKind::FunctionDeclaration => self.register_function(statement)?,
                NodeKind::Import => self.handle_import(statement, current_file)?,
                other => {
                    return Err(GalError::parse(
                        format!("unexpected top-level node '{other:?}'"),
                        Some(statement.line),
                    ))
                }
            }
        }
        Ok(())
    }

    fn register_function(&mut self, decl: &AstNode) -> GalResult<()> {
        if self.functions.contains_key(&decl.value) {
            return Err(GalError::name(
                format!("function '{}' is already declared", decl.value),
                Some(decl.line),
            ));
        }

        let split = decl
            .children
            .iter()
            .position(|c| c.kind != NodeKind::FunctionArgument)
            .unwrap_or(decl.children.len());
        let params = decl.children[..split].iter().map(|p| p.value.clone()).collect();
        let body = decl.children[split..].to_vec();

        self.functions.insert(decl.value.clone(), FunctionDef { params, body });
        Ok(())
    }

    fn handle_import(&mut self, import: &AstNode, current_file: &Path) -> GalResult<()> {
        let importer_dir = current_file.parent().unwrap_or_else(|| Path::new("."));
        let resolved = loader::resolve(&import.value, importer_dir, &self.config.package_root)?;
        info!("resolved import '{}' -> '{}'", import.value, resolved.display());
        self.load_file(&resolved)
    }

    fn call_main(&mut self) -> GalResult<Value> {
        let main = self
            .functions
            .get("main")
            .ok_or(GalError::NoMain)?;
        let body = main.body.clone();

        let mut args_var = Value::number(self.config.args.len() as f64);
        for (i, arg) in self.config.args.iter().enumerate() {
            args_var.indexed.insert(i.to_string(), Value::string(arg.clone()));
        }
        self.local.insert("args".to_string(), args_var);

        Ok(self.exec_block(&body)?.unwrap_or_else(Value::none))
    }

    /// Runs a block's statements in order; returns the first non-`none`
    /// statement result (a pending `return` propagating upward).
    fn exec_block(&mut self, statements: &[AstNode]) -> GalResult<Option<Value>> {
        for statement in statements {
            if let Some(value) = self.exec_statement(statement)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn exec_statement(&mut self, node: &AstNode) -> GalResult<Option<Value>> {
        match node.kind {
            NodeKind::VariableDeclaration => {
                let value = self.eval(&node.children[0])?;
                self.bind_variable(&node.value, value);
                Ok(None)
            }
            NodeKind::VariableAssignment => {
                let value = self.eval(&node.children[0])?;
                self.assign_variable(&node.value, value, node.line)?;
                Ok(None)
            }
            NodeKind::MemberAssignment => {
                let index = self.eval(&node.children[0])?;
                let value = self.eval(&node.children[1])?;
                self.member_assign(&node.value, index, value, node.line)?;
                Ok(None)
            }
            NodeKind::If => {
                let cond = self.eval(&node.children[0])?.is_truthy_boolean(node.line)?;
                if cond {
                    self.exec_block(&node.children[1..])
                } else {
                    Ok(None)
                }
            }
            NodeKind::While => {
                loop {
                    let cond = self.eval(&node.children[0])?.is_truthy_boolean(node.line)?;
                    if !cond {
                        return Ok(None);
                    }
                    if let Some(value) = self.exec_block(&node.children[1..])? {
                        return Ok(Some(value));
                    }
                }
            }
            NodeKind::Return => Ok(Some(self.eval(&node.children[0])?)),
            NodeKind::Import => {
                warn!("nested import at line {} ignored: imports must be top level", node.line);
                Ok(None)
            }
            NodeKind::FunctionCall => {
                self.eval_function_call(node)?;
                Ok(None)
            }
            other => Err(GalError::parse(format!("'{other:?}' is not a statement"), Some(node.line))),
        }
    }

    fn eval(&mut self, node: &AstNode) -> GalResult<Value> {
        match node.kind {
            NodeKind::Expression | NodeKind::Block => self.eval(&node.children[0]),
            NodeKind::Number => node.value.parse().map(Value::number).map_err(|_| {
                GalError::ty(format!("'{}' is not a valid number", node.value), Some(node.line))
            }),
            NodeKind::String => Ok(Value::string(node.value.clone())),
            NodeKind::Boolean => Ok(Value::boolean(node.value == crate::token::KEYWORD_TRUE)),
            NodeKind::None => Ok(Value::none()),
            NodeKind::Identifier => self.lookup(&node.value, node.line),
            NodeKind::BinaryOperation => {
                let left = self.eval(&node.children[0])?;
                let right = self.eval(&node.children[1])?;
                self.apply_binary(&node.value, left, right, node.line)
            }
            NodeKind::UnaryOperation => {
                let operand = self.eval(&node.children[0])?.is_truthy_boolean(node.line)?;
                Ok(Value::boolean(!operand))
            }
            NodeKind::MemberAccess => {
                let base = self.lookup(&node.value, node.line)?;
                let index = self.eval(&node.children[0])?;
                Ok(member_read(&base, &index))
            }
            NodeKind::FunctionCall => self.eval_function_call(node),
            other => Err(GalError::parse(format!("'{other:?}' is not an expression"), Some(node.line))),
        }
    }

    fn eval_function_call(&mut self, call: &AstNode) -> GalResult<Value> {
        let Some(def) = self.functions.get(&call.value) else {
            let args = call
                .children
                .iter()
                .map(|a| self.eval(a))
                .collect::<GalResult<Vec<_>>>()?;
            return stdlib::call(&call.value, &args, call.line);
        };

        let params = def.params.clone();
        let body = def.body.clone();

        if call.children.len() < params.len() {
            return Err(GalError::arity(
                format!(
                    "'{}' expects {} argument(s), got {}",
                    call.value,
                    params.len(),
                    call.children.len()
                ),
                Some(call.line),
            ));
        }

        let mut scope = HashMap::new();
        for (param, arg) in params.iter().zip(&call.children) {
            scope.insert(param.clone(), self.eval(arg)?);
        }

        let previous = std::mem::replace(&mut self.local, scope);
        self.local_stack.push(previous);
        let result = self.exec_block(&body);
        self.local = self.local_stack.pop().expect("scope pushed above");

        Ok(result?.unwrap_or_else(Value::none))
    }

    fn apply_binary(&self, op: &str, left: Value, right: Value, line: usize) -> GalResult<Value> {
        match op {
            "+" if left.kind == ValueKind::String => {
                Ok(Value::string(format!("{}{}", left.scalar, right.scalar)))
            }
            "+" | "-" | "*" | "/" | "**" => {
                let l = left.as_number(line)?;
                let r = right.as_number(line)?;
                let result = match op {
                    "+" => l + r,
                    "-" => l - r,
                    "*" => l * r,
                    "/" => l / r,
                    "**" => l.powf(r),
                    _ => unreachable!(),
                };
                Ok(Value::number(result))
            }
            "%" => {
                let l = left.as_number(line)? as i64;
                let r = right.as_number(line)? as i64;
                Ok(Value::number((l % r) as f64))
            }
            "^" | "&" | "|" => {
                let l = left.as_number(line)? as i64;
                let r = right.as_number(line)? as i64;
                let result = match op {
                    "^" => l ^ r,
                    "&" => l & r,
                    "|" => l | r,
                    _ => unreachable!(),
                };
                Ok(Value::number(result as f64))
            }
            "==" => Ok(Value::boolean(left.scalar == right.scalar)),
            "!=" => Ok(Value::boolean(left.scalar != right.scalar)),
            "===" => Ok(Value::boolean(left.kind == right.kind && left.scalar == right.scalar)),
            "!==" => Ok(Value::boolean(!(left.kind == right.kind && left.scalar == right.scalar))),
            "<" | ">" | "<=" | ">=" => {
                let l = left.as_number(line)?;
                let r = right.as_number(line)?;
                let result = match op {
                    "<" => l < r,
                    ">" => l > r,
                    "<=" => l <= r,
                    ">=" => l >= r,
                    _ => unreachable!(),
                };
                Ok(Value::boolean(result))
            }
            "&&" | "||" => {
                let l = left.is_truthy_boolean(line)?;
                let r = right.is_truthy_boolean(line)?;
                Ok(Value::boolean(if op == "&&" { l && r } else { l || r }))
            }
            _ => Err(GalError::parse(format!("unknown operator '{op}'"), Some(line))),
        }
    }

    fn bind_variable(&mut self, name: &str, value: Value) {
        if let Some(key) = name.strip_prefix(GLOBAL_PREFIX) {
            self.global.insert(format!("{GLOBAL_PREFIX}{key}"), value);
        } else {
            self.local.insert(name.to_string(), value);
        }
    }

    fn lookup(&self, name: &str, line: usize) -> GalResult<Value> {
        if name.starts_with(GLOBAL_PREFIX) {
            return self
                .global
                .get(name)
                .cloned()
                .ok_or_else(|| GalError::name(format!("'{name}' is not defined"), Some(line)));
        }
        self.local
            .get(name)
            .or_else(|| self.global.get(name))
            .cloned()
            .ok_or_else(|| GalError::name(format!("'{name}' is not defined"), Some(line)))
    }

    fn assign_variable(&mut self, name: &str, value: Value, line: usize) -> GalResult<()> {
        let existing = self
            .binding_mut(name)
            .ok_or_else(|| GalError::name(format!("'{name}' is not defined"), Some(line)))?;

        existing.kind = value.kind;
        existing.scalar = value.scalar;
        existing.indexed.extend(value.indexed);
        Ok(())
    }

    fn member_assign(&mut self, name: &str, index: Value, value: Value, line: usize) -> GalResult<()> {
        let existing = self
            .binding_mut(name)
            .ok_or_else(|| GalError::name(format!("'{name}' is not defined"), Some(line)))?;
        existing.indexed.insert(index.scalar, value);
        Ok(())
    }

    /// Local first, then global, per the GLOBAL_-prefix routing rule — the
    /// mutable counterpart of `lookup`.
    fn binding_mut(&mut self, name: &str) -> Option<&mut Variable> {
        if name.starts_with(GLOBAL_PREFIX) {
            return self.global.get_mut(name);
        }
        if self.local.contains_key(name) {
            self.local.get_mut(name)
        } else {
            self.global.get_mut(name)
        }
    }
}

/// `member_access`'s lookup-or-reparse-as-number fallback (spec §4.3), so
/// `v[1]` and `v[1.0]` address the same slot.
fn member_read(base: &Value, index: &Value) -> Value {
    if let Some(found) = base.indexed.get(&index.scalar) {
        return found.clone();
    }
    if let Ok(n) = index.scalar.parse::<f64>() {
        let restringified = crate::value::format_number(n);
        if let Some(found) = base.indexed.get(&restringified) {
            return found.clone();
        }
    }
    Value::none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_source(source: &str) -> GalResult<Value> {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("main.gal");
        std::fs::write(&entry, source).unwrap();
        run(RunConfig {
            entry_path: entry,
            args: Vec::new(),
            package_root: dir.path().join("packages"),
            use_cache: false,
        })
    }

    #[test]
    fn arithmetic_precedence_evaluates_correctly() {
        let result = run_source("lowkey main { rizzult 1 + 2 * 3 } end").unwrap();
        assert_eq!(result.scalar, "7");
    }

    #[test]
    fn while_loop_accumulates() {
        let result = run_source(
            "lowkey main { fax i = 0\nfax sum = 0\ndurin i < 5\nsum = sum + i\ni = i + 1\nend\nrizzult sum } end",
        )
        .unwrap();
        assert_eq!(result.scalar, "10");
    }

    #[test]
    fn array_round_trips_through_member_access() {
        let result = run_source(
            "lowkey main { fax v = nuthin\n[v 0] = \"a\"\nrizzult v[0] } end",
        )
        .unwrap();
        assert_eq!(result.scalar, "a");
    }

    #[test]
    fn function_call_returns_value() {
        let result = run_source(
            "lowkey add a b {\nrizzult a + b\n} end\nlowkey main { rizzult fire add(2, 3) } end",
        )
        .unwrap();
        assert_eq!(result.scalar, "5");
    }

    #[test]
    fn global_survives_function_call() {
        let result = run_source(
            "lowkey bump {\nGLOBAL_c = GLOBAL_c + 1\n} end\nlowkey main { fax GLOBAL_c = 1\nfire bump()\nrizzult GLOBAL_c } end",
        )
        .unwrap();
        assert_eq!(result.scalar, "2");
    }

    #[test]
    fn arity_undersupply_is_an_error() {
        let err = run_source(
            "lowkey add a b {\nrizzult a + b\n} end\nlowkey main { rizzult fire add(2) } end",
        )
        .unwrap_err();
        assert!(matches!(err, GalError::Arity { .. }));
    }

    #[test]
    fn arity_oversupply_discards_extra_arguments() {
        let result = run_source(
            "lowkey add a b {\nrizzult a + b\n} end\nlowkey main { rizzult fire add(2, 3, 4) } end",
        )
        .unwrap();
        assert_eq!(result.scalar, "5");
    }

    #[test]
    fn missing_main_is_no_main_error() {
        let err = run_source("lowkey notmain {\n} end").unwrap_err();
        assert!(matches!(err, GalError::NoMain));
    }

    #[test]
    fn scope_stack_is_symmetric_after_nested_calls() {
        let result = run_source(
            "lowkey inner {\nrizzult 1\n} end\nlowkey outer {\nrizzult fire inner()\n} end\nlowkey main { fire outer()\nrizzult fire outer() } end",
        )
        .unwrap();
        assert_eq!(result.scalar, "1");
    }
}
