//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, forward‑read in initializer, invalid
//!    `return`, `this` or `super`, self‑inheritance) to the [`ErrorReporter`].
//!    None of them stop the walk.
//! 3. Tell the interpreter, for *each* variable occurrence, how many scopes
//!    separate it from its declaration.  Occurrences found in no scope are
//!    left unrecorded and looked up as globals at run time.
//!
//! Scopes are pushed exactly where the interpreter creates environments:
//! one per block, one per function call (parameters and body share it),
//! one holding `super` around the methods of a subclass and one holding
//! `this` for every bound method.

use std::collections::HashMap;

use crate::ast::{Expr, ExprId, FunctionDecl, Ident, Stmt};
use crate::error::{ErrorReporter, LoxError};
use crate::interpreter::Interpreter;
use crate::stack::ensure_sufficient_stack;
use crate::token::Span;
use crate::value::INITIALIZER;
use log::{debug, info};

/// What kind of function body we are in.  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// What kind of class body we are in.  Used to validate `this` / `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances by calling back into the interpreter.
pub struct Resolver<'i, 'r> {
    interpreter: &'i mut Interpreter,
    reporter: &'r mut ErrorReporter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'i, 'r> Resolver<'i, 'r> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'i mut Interpreter, reporter: &'r mut ErrorReporter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    /// Resolve a standalone expression at global scope.
    pub fn resolve_expression(&mut self, expr: &Expr) {
        self.resolve_expr(expr);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.resolve_stmt_kind(stmt));
    }

    fn resolve_stmt_kind(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(&name.name);
            }

            Stmt::Function(decl) => {
                // the name is visible *inside* its own body, for recursion
                if let Some(name) = &decl.name {
                    self.declare(name);
                    self.define(&name.name);
                }
                self.resolve_function(decl, FunctionType::Function);
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

            // Placement already checked by the parser.
            Stmt::Break(_) => {}

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(*keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(*keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Ident,
        superclass: Option<&Expr>,
        methods: &[std::rc::Rc<FunctionDecl>],
    ) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(&name.name);

        if let Some(superclass) = superclass {
            if let Expr::Variable { name: super_name, .. } = superclass {
                if super_name.name == name.name {
                    self.error(super_name.span, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.define("super");
        }

        self.begin_scope();
        self.define("this");

        for method in methods {
            let kind = match &method.name {
                Some(n) if n.name == INITIALIZER => FunctionType::Initializer,
                _ => FunctionType::Method,
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.resolve_expr_kind(expr));
    }

    fn resolve_expr_kind(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}

            Expr::Grouping { expr: inner, .. } => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                // Cannot read in own initializer
                let declared_only = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&name.name) == Some(&false));

                if declared_only {
                    self.error(
                        name.span,
                        "Can't read local variable in its own initializer.",
                    );
                }

                self.resolve_local(*id, &name.name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(*id, &name.name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, span } => {
                if self.current_class == ClassType::None {
                    self.error(*span, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, "this");
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(*keyword, "Can't use 'super' outside of a class.");
                    }
                    ClassType::Class => {
                        self.error(
                            *keyword,
                            "Can't use 'super' in a class with no superclass.",
                        );
                    }
                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, "super");
            }

            Expr::Lambda(decl) => self.resolve_function(decl, FunctionType::Function),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(&param.name);
        }
        for stmt in &decl.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Ident) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.name) {
            self.error(
                name.span,
                "Already a variable with this name in this scope.",
            );
            return;
        }

        scope.insert(name.name.clone(), false);
    }

    fn define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    fn error(&mut self, span: Span, message: &str) {
        self.reporter.error(LoxError::resolve(span, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it
    /// unrecorded (global) if no scope declares it.
    fn resolve_local(&mut self, id: ExprId, name: &str) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name) {
                debug!("Resolved '{}' at depth {}", name, depth);
                self.interpreter.resolve(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name);
    }
}
