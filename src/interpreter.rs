use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{BinaryOp, Expr, ExprId, FunctionDecl, Ident, LiteralValue, LogicalOp, Stmt, UnaryOp};
use crate::environment::{self, EnvRef, Environment};
use crate::error::{ErrorReporter, LoxError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::token::Span;
use crate::value::{Callable, Class, Function, Instance, NativeFn, NativeFunction, Value, INITIALIZER};

/// Deepest chain of active Lox calls before `Stack overflow.` is raised.
pub const MAX_CALL_DEPTH: usize = 1024;

/// How a statement finished.  `Break` and `Return` travel up through
/// `execute` until a loop or a function call consumes them; they are never
/// errors.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Break,
    Return(Value),
}

/// Tree‑walking evaluator.
///
/// One instance may run many programs in turn (the interactive prompt does
/// this); globals and recorded resolutions persist across runs.
pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    call_depth: usize,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter that prints to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter whose `print` output goes to `output`.
    /// The global scope is seeded with the native functions (`clock`).
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new().shared();

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            call_depth: 0,
            output,
        };

        interpreter.define_native("clock", 0, |_args: &[Value]| {
            let micros = chrono::Utc::now().timestamp_micros();
            Ok(Value::Number(micros as f64 / 1_000_000.0))
        });

        interpreter
    }

    /// Register a host function in the global scope.
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        debug!("Defining native function '{}'", name);

        let native = NativeFunction {
            name: name.to_string(),
            arity,
            func,
        };

        self.globals
            .borrow_mut()
            .define(name, Value::Callable(Callable::Native(Rc::new(native))));
    }

    /// Record that the variable expression `id` lives `depth` scopes above
    /// the scope active when it is evaluated.  Called by the resolver.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Drop every resolution recorded for nodes created at or after
    /// `first`.  Used when an input is rejected before it runs.
    pub fn forget_resolutions_from(&mut self, first: ExprId) {
        let before = self.locals.len();
        self.locals.retain(|id, _| *id < first);
        debug!("Forgot {} resolutions", before - self.locals.len());
    }

    /// Number of recorded local resolutions.
    pub fn resolution_count(&self) -> usize {
        self.locals.len()
    }

    /// Executes a program.  The first runtime error stops execution and is
    /// recorded in `reporter`; earlier side effects remain.
    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut ErrorReporter) {
        info!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                debug!("Runtime error: {}", e);
                reporter.error(e);
                return;
            }
        }

        info!("Interpretation completed successfully");
    }

    /// Write one line to the output sink.
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);
                self.write_line(&value.to_string())?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.name, value);
                self.environment.borrow_mut().define(&name.name, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let env = Environment::with_enclosing(Rc::clone(&self.environment)).shared();
                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Function(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                if let Some(name) = &decl.name {
                    debug!("Defining function '{}'", name.name);
                    self.environment.borrow_mut().define(
                        &name.name,
                        Value::Callable(Callable::Function(Rc::new(function))),
                    );
                }
                Ok(Flow::Normal)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.execute_class(name, superclass.as_ref(), methods)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` with `env` as the current scope, restoring the
    /// previous scope on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> Result<Flow> {
        let previous = std::mem::replace(&mut self.environment, env);

        let mut result = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Ident,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Defining class '{}'", name.name);

        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Callable(Callable::Class(class)) => Some(class),
                _ => return Err(LoxError::runtime(expr.span(), "Superclass must be a class.")),
            },
            None => None,
        };

        self.environment.borrow_mut().define(&name.name, Value::Nil);

        let method_env: EnvRef = match &superclass {
            Some(class) => {
                let mut env = Environment::with_enclosing(Rc::clone(&self.environment));
                env.define("super", Value::Callable(Callable::Class(Rc::clone(class))));
                env.shared()
            }
            None => Rc::clone(&self.environment),
        };

        let mut table: HashMap<String, Rc<Function>> = HashMap::new();
        for method in methods {
            let Some(method_name) = &method.name else {
                continue;
            };

            let function = Function::new(
                Rc::clone(method),
                Rc::clone(&method_env),
                method_name.name == INITIALIZER,
            );
            table.insert(method_name.name.clone(), Rc::new(function));
        }

        let class = Class {
            name: name.name.clone(),
            superclass,
            methods: table,
        };

        self.environment
            .borrow_mut()
            .define(&name.name, Value::Callable(Callable::Class(Rc::new(class))));

        info!("Class '{}' defined with {} methods", name.name, methods.len());
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping { expr, .. } => self.evaluate(expr),

            Expr::Unary { op, op_span, right } => {
                let right = self.evaluate(right)?;

                match op {
                    UnaryOp::Not => Ok(Value::Bool(!right.is_truthy())),
                    UnaryOp::Negate => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(*op_span, "Operand must be a number.")),
                    },
                }
            }

            Expr::Binary {
                left,
                op,
                op_span,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(*op, *op_span, left, right)
            }

            Expr::Logical {
                left, op, right, ..
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = match op {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, &name.name, name.span),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                let assigned = match self.locals.get(id) {
                    Some(&distance) => {
                        environment::assign_at(&self.environment, distance, &name.name, value.clone())
                    }
                    None => self.globals.borrow_mut().assign(&name.name, value.clone()),
                };

                if !assigned {
                    return Err(undefined_variable(name));
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                let Value::Callable(callable) = callee else {
                    return Err(LoxError::runtime(
                        *paren,
                        "Can only call functions and classes.",
                    ));
                };

                if args.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        *paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            args.len()
                        ),
                    ));
                }

                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(LoxError::runtime(*paren, "Stack overflow."));
                }

                self.call_depth += 1;
                let result = self.call(&callable, args, *paren);
                self.call_depth -= 1;

                result
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;

                let Value::Instance(instance) = object else {
                    return Err(LoxError::runtime(name.span, "Only instances have properties."));
                };

                let field = instance.borrow().fields.get(&name.name).cloned();
                if let Some(value) = field {
                    return Ok(value);
                }

                let class = Rc::clone(&instance.borrow().class);
                match class.find_method(&name.name) {
                    Some(method) => Ok(Value::Callable(Callable::Function(Rc::new(
                        method.bind(instance),
                    )))),
                    None => Err(undefined_property(name)),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;

                let Value::Instance(instance) = object else {
                    return Err(LoxError::runtime(name.span, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance
                    .borrow_mut()
                    .fields
                    .insert(name.name.clone(), value.clone());

                Ok(value)
            }

            Expr::This { id, span } => self.look_up_variable(*id, "this", *span),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, *keyword, method),

            Expr::Lambda(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                Ok(Value::Callable(Callable::Function(Rc::new(function))))
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &str, span: Span) -> Result<Value> {
        let value = match self.locals.get(&id) {
            Some(&distance) => environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        };

        value.ok_or_else(|| LoxError::runtime(span, format!("Undefined variable '{}'.", name)))
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: Span, method: &Ident) -> Result<Value> {
        let unresolved = || LoxError::runtime(keyword, "Can't use 'super' here.");

        let distance = *self.locals.get(&id).ok_or_else(unresolved)?;

        let superclass = match environment::get_at(&self.environment, distance, "super") {
            Some(Value::Callable(Callable::Class(class))) => class,
            _ => return Err(LoxError::runtime(keyword, "'super' is not a class.")),
        };

        // `this` lives in the frame just inside the one holding `super`.
        let this = distance
            .checked_sub(1)
            .and_then(|d| environment::get_at(&self.environment, d, "this"));

        let Some(Value::Instance(instance)) = this else {
            return Err(LoxError::runtime(keyword, "'this' is not an instance."));
        };

        match superclass.find_method(&method.name) {
            Some(found) => Ok(Value::Callable(Callable::Function(Rc::new(
                found.bind(instance),
            )))),
            None => Err(undefined_property(method)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    /// Invoke `callable`.  Arity has already been checked.
    fn call(&mut self, callable: &Callable, args: Vec<Value>, paren: Span) -> Result<Value> {
        match callable {
            Callable::Native(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(&args).map_err(|msg| LoxError::runtime(paren, msg))
            }

            Callable::Function(function) => self.call_function(function, args),

            Callable::Class(class) => {
                debug!("Instantiating class '{}'", class.name);

                let instance = Rc::new(std::cell::RefCell::new(Instance::new(Rc::clone(class))));

                if let Some(init) = class.find_method(INITIALIZER) {
                    self.call_function(&init.bind(Rc::clone(&instance)), args)?;
                }

                Ok(Value::Instance(instance))
            }
        }
    }

    fn call_function(&mut self, function: &Function, args: Vec<Value>) -> Result<Value> {
        debug!("Calling function {:?}", function.name());

        let mut env = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, arg) in function.declaration.params.iter().zip(args) {
            env.define(&param.name, arg);
        }

        let flow = self.execute_block(&function.declaration.body, env.shared())?;

        if function.is_initializer {
            return environment::get_at(&function.closure, 0, "this").ok_or_else(|| {
                LoxError::runtime(function.declaration.span, "Initializer is not bound to an instance.")
            });
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break => Ok(Value::Nil),
        }
    }
}

fn binary(op: BinaryOp, span: Span, left: Value, right: Value) -> Result<Value> {
    use Value::{Bool, Number};

    let numbers = |l: &Value, r: &Value| match (l, r) {
        (Number(a), Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(span, "Operands must be numbers.")),
    };

    match op {
        BinaryOp::Add => match (left, right) {
            (Number(a), Number(b)) => Ok(Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            _ => Err(LoxError::runtime(
                span,
                "Operands must be two numbers or two strings.",
            )),
        },

        BinaryOp::Subtract => numbers(&left, &right).map(|(a, b)| Number(a - b)),
        BinaryOp::Multiply => numbers(&left, &right).map(|(a, b)| Number(a * b)),
        BinaryOp::Divide => numbers(&left, &right).map(|(a, b)| Number(a / b)),

        BinaryOp::Less => numbers(&left, &right).map(|(a, b)| Bool(a < b)),
        BinaryOp::LessEqual => numbers(&left, &right).map(|(a, b)| Bool(a <= b)),
        BinaryOp::Greater => numbers(&left, &right).map(|(a, b)| Bool(a > b)),
        BinaryOp::GreaterEqual => numbers(&left, &right).map(|(a, b)| Bool(a >= b)),

        BinaryOp::Equal => Ok(Bool(left == right)),
        BinaryOp::NotEqual => Ok(Bool(left != right)),
    }
}

fn undefined_variable(name: &Ident) -> LoxError {
    LoxError::runtime(name.span, format!("Undefined variable '{}'.", name.name))
}

fn undefined_property(name: &Ident) -> LoxError {
    LoxError::runtime(name.span, format!("Undefined property '{}'.", name.name))
}
