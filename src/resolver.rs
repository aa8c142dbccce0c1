//! Static resolution pass for the Lox interpreter.
//!
//! A single AST walk that:
//! 1. **Builds lexical scopes**: maintains a stack of `HashMap<String, bool>`
//!    tracking declared (false) and fully defined (true) names in each nested
//!    block or function.  The global scope is not on the stack.
//! 2. **Enforces static rules**: redeclaration in the same scope, reading a
//!    variable in its own initializer, `return` outside functions, `this` and
//!    `super` outside their classes, self-inheritance.
//! 3. **Records binding distances**: for every `Variable`, `Assign`, `This`,
//!    and `Super` occurrence, notes its depth into the interpreter's side
//!    table so the runtime climbs exactly the right number of frames.
//!
//! Diagnostics accumulate: the walk keeps going after an error so several
//! problems surface in one run.

use std::collections::HashMap;
use std::io::Write;

use log::{debug, info};

use crate::error::LoxError;
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class
    None,

    /// Inside a class declaration _without_ a superclass
    Class,

    /// Inside a class declaration _with_ a superclass
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'interp, W: Write> {
    interpreter: &'interp mut Interpreter<W>,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<LoxError>,
}

impl<'interp, W: Write> Resolver<'interp, W> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter<W>) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top-level statements, returning every diagnostic found.
    /// An empty vector means the program may execute.
    pub fn resolve(mut self, statements: &[Stmt]) -> Vec<LoxError> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        self.errors
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Declared and defined eagerly so the function can recurse.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Cannot return from top-level code.");
                }

                if let Some(expr) = value {
                    // A bare `return;` in an initializer is permitted; the
                    // call machinery substitutes `this`.
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Cannot return a value from an initializer.");
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let enclosing_class: ClassType = self.current_class;

                self.declare(name);
                self.define(name);

                if let Some(superclass_expr) = superclass {
                    if let Expr::Variable {
                        name: super_name, ..
                    } = superclass_expr
                    {
                        if super_name.lexeme == name.lexeme {
                            self.error(super_name, "A class cannot inherit from itself.");
                        }
                    }

                    self.current_class = ClassType::Subclass;

                    self.resolve_expr(superclass_expr);

                    // `super` lives in its own scope wrapping the `this`
                    // scope.
                    self.begin_scope();
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.insert("super".to_string(), true);
                    }
                } else {
                    self.current_class = ClassType::Class;
                }

                self.begin_scope();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert("this".to_string(), true);
                }

                for method in methods {
                    let kind = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(method, kind);
                }

                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing_class;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        debug!("Resolving expr: {:?}", expr);

        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                // Reading a name while declared-but-undefined means the
                // initializer mentions the variable it is initializing.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "Cannot read local variable in its own initializer.");
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Cannot use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Cannot use 'super' outside of a class.");
                        return;
                    }

                    ClassType::Class => {
                        self.error(keyword, "Cannot use 'super' in a class with no superclass.");
                        return;
                    }

                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, declaration: &FunctionDecl, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();

        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }

        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            return;
        }

        let already_declared: bool = self
            .scopes
            .last()
            .is_some_and(|scope| scope.contains_key(&name.lexeme));

        if already_declared {
            self.error(
                name,
                "Variable with this name already declared in this scope.",
            );
            return;
        }

        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at its lexical depth, or as a
    /// global when no scope on the stack knows the name.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    fn error<S: Into<String>>(&mut self, token: &Token, message: S) {
        self.errors.push(LoxError::resolve(token, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        let tokens: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();
        let (statements, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        statements
    }

    fn resolve(source: &str) -> (Interpreter<Vec<u8>>, Vec<LoxError>) {
        let statements = parse(source);
        let mut interpreter = Interpreter::new(Vec::new());
        let errors = Resolver::new(&mut interpreter).resolve(&statements);
        (interpreter, errors)
    }

    fn messages(errors: &[LoxError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn global_references_record_no_depth() {
        let statements = parse("var a = 1; print a;");
        let mut interpreter = Interpreter::new(Vec::new());
        let errors = Resolver::new(&mut interpreter).resolve(&statements);

        assert!(errors.is_empty());

        let id = match &statements[1] {
            Stmt::Print(Expr::Variable { id, .. }) => *id,
            other => panic!("expected print of variable, got {:?}", other),
        };

        assert_eq!(interpreter.local_depth(id), None);
    }

    #[test]
    fn block_local_resolves_at_depth_zero() {
        let statements = parse("{ var a = 1; print a; }");
        let mut interpreter = Interpreter::new(Vec::new());
        let errors = Resolver::new(&mut interpreter).resolve(&statements);

        assert!(errors.is_empty());

        let id = match &statements[0] {
            Stmt::Block(stmts) => match &stmts[1] {
                Stmt::Print(Expr::Variable { id, .. }) => *id,
                other => panic!("expected print of variable, got {:?}", other),
            },
            other => panic!("expected block, got {:?}", other),
        };

        assert_eq!(interpreter.local_depth(id), Some(0));
    }

    #[test]
    fn closure_reference_counts_intervening_scopes() {
        let statements = parse("{ var a = 1; fun f() { print a; } }");
        let mut interpreter = Interpreter::new(Vec::new());
        let errors = Resolver::new(&mut interpreter).resolve(&statements);

        assert!(errors.is_empty());

        let id = match &statements[0] {
            Stmt::Block(stmts) => match &stmts[1] {
                Stmt::Function(decl) => match &decl.body[0] {
                    Stmt::Print(Expr::Variable { id, .. }) => *id,
                    other => panic!("expected print of variable, got {:?}", other),
                },
                other => panic!("expected function, got {:?}", other),
            },
            other => panic!("expected block, got {:?}", other),
        };

        // One function-parameter scope between the use and the block that
        // declares `a`.
        assert_eq!(interpreter.local_depth(id), Some(1));
    }

    #[test]
    fn self_read_in_initializer_is_an_error() {
        let (_, errors) = resolve("{ var a = a; }");

        assert!(messages(&errors)
            .iter()
            .any(|m| m.contains("Cannot read local variable in its own initializer.")));
    }

    #[test]
    fn redeclaration_in_same_scope_is_an_error() {
        let (_, errors) = resolve("{ var a = 1; var a = 2; }");

        assert!(messages(&errors)
            .iter()
            .any(|m| m.contains("Variable with this name already declared in this scope.")));
    }

    #[test]
    fn globals_may_shadow_freely() {
        let (_, errors) = resolve("var a = 1; var a = 2;");

        assert!(errors.is_empty());
    }

    #[test]
    fn top_level_return_is_an_error() {
        let (_, errors) = resolve("return 1;");

        assert!(messages(&errors)
            .iter()
            .any(|m| m.contains("Cannot return from top-level code.")));
    }

    #[test]
    fn returning_a_value_from_init_is_an_error() {
        let (_, errors) = resolve("class A { init() { return 1; } }");

        assert!(messages(&errors)
            .iter()
            .any(|m| m.contains("Cannot return a value from an initializer.")));
    }

    #[test]
    fn bare_return_from_init_is_allowed() {
        let (_, errors) = resolve("class A { init() { return; } }");

        assert!(errors.is_empty());
    }

    #[test]
    fn this_outside_a_class_is_an_error() {
        let (_, errors) = resolve("print this;");

        assert!(messages(&errors)
            .iter()
            .any(|m| m.contains("Cannot use 'this' outside of a class.")));
    }

    #[test]
    fn super_without_a_superclass_is_an_error() {
        let (_, errors) = resolve("class A { f() { super.f(); } }");

        assert!(messages(&errors)
            .iter()
            .any(|m| m.contains("Cannot use 'super' in a class with no superclass.")));
    }

    #[test]
    fn self_inheritance_is_an_error() {
        let (_, errors) = resolve("class Oops < Oops {}");

        assert!(messages(&errors)
            .iter()
            .any(|m| m.contains("A class cannot inherit from itself.")));
    }

    #[test]
    fn several_errors_surface_in_one_pass() {
        let (_, errors) = resolve("return 1; print this; { var a = 1; var a = 2; }");

        assert_eq!(errors.len(), 3);
    }
}
