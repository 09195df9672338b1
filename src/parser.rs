/*!
Recursive‑descent parser: token slice → [`Stmt`] list.

Grammar (EBNF — condensed)
--------------------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT ( "<" IDENT )? "{" function* "}" ;
funDecl        → "fun" function ;
function       → IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | printStmt | ifStmt | whileStmt | forStmt
               | breakStmt | returnStmt | block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" statement ;
breakStmt      → "break" ";" ;
returnStmt     → "return" expression? ";" ;
block          → "{" declaration* "}" ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality  ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
               | IDENT | "(" expression ")" | "super" "." IDENT
               | "fun" "(" parameters? ")" block ;
```

### Error handling

Syntax errors are written to the [`ErrorReporter`] at the point of
detection.  Errors that leave the parser unable to continue the current
production additionally return the internal [`ParseError`] signal, which
is caught in `declaration`; the parser then synchronizes to the next
statement boundary so independent errors later in the file are still
reported.  Limit violations (more than 255 arguments), invalid assignment
targets and `break` outside a loop are reported without unwinding.
Nesting deeper than [`MAX_NESTING`] levels is a syntax error.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| Error paths (`error`)        | `debug`| Context before reporting.                 |
*/

use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, ExprId, FunctionDecl, Ident, LiteralValue, LogicalOp, Stmt, UnaryOp};
use crate::error::ErrorReporter;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Span, Token, TokenType};

use log::{debug, info};

/// Maximum number of parameters / call arguments.
pub const MAX_ARITY: usize = 255;

/// Deepest nesting of expressions, statements and blocks accepted.
pub const MAX_NESTING: usize = 512;

/// Internal unwind signal: the error has already been reported.
#[derive(Debug)]
pub struct ParseError;

type PResult<T> = std::result::Result<T, ParseError>;

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a, 'r> {
    tokens: &'a [Token<'a>],
    current: usize,
    loop_depth: usize,
    nesting: usize,
    reporter: &'r mut ErrorReporter,
}

impl<'a, 'r> Parser<'a, 'r> {
    /// Construct a new parser.  `tokens` must end with an `EOF` token, as
    /// produced by [`crate::scanner::scan_tokens`].
    pub fn new(tokens: &'a [Token<'a>], reporter: &'r mut ErrorReporter) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            loop_depth: 0,
            nesting: 0,
            reporter,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program.  Statements that failed to parse are
    /// omitted; check the reporter before using the result.
    pub fn parse(&mut self) -> Vec<Stmt> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!("Parsed {} statements", statements.len());

        statements
    }

    /// Parse the whole input as exactly one expression.
    pub fn parse_expression(&mut self) -> Option<Expr> {
        info!("Parsing single expression");

        let result = self.expression().ok();

        if !self.is_at_end() {
            let span = self.peek().span;
            self.reporter
                .report(span, "Unknown tokens at the end of the input.");
        }

        result
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration");

        let result = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.check(TokenType::FUN) && self.check_next(TokenType::IDENTIFIER) {
            self.advance();
            self.function("function").map(Stmt::Function)
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),

            Err(ParseError) => {
                debug!("Synchronizing after parse error");
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> PResult<Stmt> {
        let name = Self::ident(self.consume(TokenType::IDENTIFIER, "Expected class name.")?);

        let superclass = if self.matches(TokenType::LESS) {
            let super_name =
                Self::ident(self.consume(TokenType::IDENTIFIER, "Expected superclass name.")?);

            Some(Expr::Variable {
                id: ExprId::fresh(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body.")?;

        debug!("Parsed class '{}' with {} methods", name.name, methods.len());

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    /// `IDENT "(" parameters? ")" block` — the leading `fun` (if any) has
    /// already been consumed.
    fn function(&mut self, kind: &str) -> PResult<Rc<FunctionDecl>> {
        let name_token = self.consume(TokenType::IDENTIFIER, &format!("Expected {} name.", kind))?;
        let name = Self::ident(name_token);

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after {} name.", kind),
        )?;

        self.function_tail(Some(name), name_token.span, kind)
    }

    /// Parameters and body.  `(` has already been consumed.
    fn function_tail(
        &mut self,
        name: Option<Ident>,
        start: Span,
        kind: &str,
    ) -> PResult<Rc<FunctionDecl>> {
        let mut params: Vec<Ident> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    let span = self.peek().span;
                    self.reporter.report(
                        span,
                        format!("Can't have more than {} parameters.", MAX_ARITY),
                    );
                }

                params.push(Self::ident(
                    self.consume(TokenType::IDENTIFIER, "Expected parameter name.")?,
                ));

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters.")?;
        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expected '{{' before {} body.", kind),
        )?;

        // `break` never crosses a function boundary.
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.block();
        self.loop_depth = enclosing_loops;

        let body = body?;

        Ok(Rc::new(FunctionDecl {
            name,
            params,
            body,
            span: start.to(self.previous().span),
        }))
    }

    fn var_declaration(&mut self) -> PResult<Stmt> {
        let name = Self::ident(self.consume(TokenType::IDENTIFIER, "Expected variable name.")?);

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> PResult<Stmt> {
        self.nested(Self::statement_kind)
    }

    fn statement_kind(&mut self) -> PResult<Stmt> {
        debug!("Entering statement at {:?}", self.peek().token_type);

        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::BREAK) {
            self.break_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    /// Desugars into `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> PResult<Stmt> {
        let keyword = self.previous().span;

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'for'.")?;

        let initializer = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition.")?;

        let increment = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for clauses.")?;

        let mut body = self.loop_body()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or(Expr::Literal {
            value: LiteralValue::Bool(true),
            span: keyword,
        });

        let mut desugared = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            desugared = Stmt::Block(vec![initializer, desugared]);
        }

        Ok(desugared)
    }

    fn print_statement(&mut self) -> PResult<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> PResult<Stmt> {
        let expr: Expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expected ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn if_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition.")?;
        let body: Box<Stmt> = Box::new(self.loop_body()?);

        Ok(Stmt::While { condition, body })
    }

    fn loop_body(&mut self) -> PResult<Stmt> {
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        body
    }

    fn break_statement(&mut self) -> PResult<Stmt> {
        let keyword = self.previous().span;

        if self.loop_depth == 0 {
            self.reporter
                .report(keyword, "Can't use 'break' outside of a loop.");
        }

        self.consume(TokenType::SEMICOLON, "Expected ';' after 'break'.")?;

        Ok(Stmt::Break(keyword))
    }

    fn return_statement(&mut self) -> PResult<Stmt> {
        let keyword = self.previous().span;
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    /// Statements up to the closing `}`.  The opening `{` is already consumed.
    fn block(&mut self) -> PResult<Vec<Stmt>> {
        self.nested(Self::block_body)
    }

    fn block_body(&mut self) -> PResult<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block.")?;
        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> PResult<Expr> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> PResult<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals: Span = self.previous().span;
            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: ExprId::fresh(),
                    name,
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                other => {
                    self.reporter.report(equals, "Invalid assignment target.");
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> PResult<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let op_span = self.previous().span;
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                op: LogicalOp::Or,
                op_span,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> PResult<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let op_span = self.previous().span;
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                op: LogicalOp::And,
                op_span,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> PResult<Expr> {
        self.binary_level(Self::comparison, &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL])
    }

    fn comparison(&mut self) -> PResult<Expr> {
        self.binary_level(
            Self::term,
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
        )
    }

    fn term(&mut self) -> PResult<Expr> {
        self.binary_level(Self::factor, &[TokenType::MINUS, TokenType::PLUS])
    }

    fn factor(&mut self) -> PResult<Expr> {
        self.binary_level(Self::unary, &[TokenType::STAR, TokenType::SLASH])
    }

    /// One left‑associative precedence level: `higher ( op higher )*`.
    fn binary_level(
        &mut self,
        higher: fn(&mut Self) -> PResult<Expr>,
        operators: &[TokenType],
    ) -> PResult<Expr> {
        let mut expr: Expr = higher(self)?;

        while let Some(op) = self.match_binary(operators) {
            let op_span = self.previous().span;
            let right: Expr = higher(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                op_span,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn match_binary(&mut self, operators: &[TokenType]) -> Option<BinaryOp> {
        if !operators.iter().any(|tt| self.check(tt.clone())) {
            return None;
        }

        let op = match self.advance().token_type {
            TokenType::PLUS => BinaryOp::Add,
            TokenType::MINUS => BinaryOp::Subtract,
            TokenType::STAR => BinaryOp::Multiply,
            TokenType::SLASH => BinaryOp::Divide,
            TokenType::EQUAL_EQUAL => BinaryOp::Equal,
            TokenType::BANG_EQUAL => BinaryOp::NotEqual,
            TokenType::LESS => BinaryOp::Less,
            TokenType::LESS_EQUAL => BinaryOp::LessEqual,
            TokenType::GREATER => BinaryOp::Greater,
            TokenType::GREATER_EQUAL => BinaryOp::GreaterEqual,
            _ => return None,
        };

        Some(op)
    }

    fn unary(&mut self) -> PResult<Expr> {
        let op = if self.matches(TokenType::BANG) {
            Some(UnaryOp::Not)
        } else if self.matches(TokenType::MINUS) {
            Some(UnaryOp::Negate)
        } else {
            None
        };

        if let Some(op) = op {
            let op_span = self.previous().span;
            let right: Expr = self.nested(Self::unary)?;

            return Ok(Expr::Unary {
                op,
                op_span,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> PResult<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name =
                    Self::ident(self.consume(TokenType::IDENTIFIER, "Expected property name after '.'.")?);

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> PResult<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    let span = self.peek().span;
                    self.reporter.report(
                        span,
                        format!("Can't have more than {} arguments.", MAX_ARITY),
                    );
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Span = self
            .consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments.")?
            .span;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> PResult<Expr> {
        let token: &'a Token<'a> = self.peek();

        let literal = match &token.token_type {
            TokenType::FALSE => Some(LiteralValue::Bool(false)),
            TokenType::TRUE => Some(LiteralValue::Bool(true)),
            TokenType::NIL => Some(LiteralValue::Nil),
            TokenType::NUMBER(n) => Some(LiteralValue::Number(*n)),
            TokenType::STRING(s) => Some(LiteralValue::Str(s.clone())),
            _ => None,
        };

        if let Some(value) = literal {
            self.advance();

            return Ok(Expr::Literal {
                value,
                span: token.span,
            });
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: ExprId::fresh(),
                name: Self::ident(token),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            let close = self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression.")?;

            return Ok(Expr::Grouping {
                expr: Box::new(expr),
                span: token.span.to(close.span),
            });
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This {
                id: ExprId::fresh(),
                span: token.span,
            });
        }

        if self.matches(TokenType::SUPER) {
            self.consume(TokenType::DOT, "Expected '.' after 'super'.")?;
            let method =
                Self::ident(self.consume(TokenType::IDENTIFIER, "Expected superclass method name.")?);

            return Ok(Expr::Super {
                id: ExprId::fresh(),
                keyword: token.span,
                method,
            });
        }

        if self.matches(TokenType::FUN) {
            self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'fun'.")?;

            return Ok(Expr::Lambda(self.function_tail(None, token.span, "function")?));
        }

        Err(self.error(token.span, "Expected expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    /// Run one recursive grammar rule one level deeper.
    fn nested<T>(&mut self, rule: fn(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.nesting >= MAX_NESTING {
            let span = self.peek().span;
            return Err(self.error(span, "Nesting is too deep."));
        }

        self.nesting += 1;
        let result = ensure_sufficient_stack(|| rule(self));
        self.nesting -= 1;

        result
    }

    fn ident(token: &Token<'_>) -> Ident {
        Ident::new(token.lexeme, token.span)
    }

    /// Report `message` at `span` and produce the unwind signal.
    fn error(&mut self, span: Span, message: &str) -> ParseError {
        debug!("Parse error at {:?}: {}", span, message);

        self.reporter.report(span, message);

        ParseError
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> PResult<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        let span = self.peek().span;

        Err(self.error(span, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn check_next(&self, ttype: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| t.token_type == ttype)
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        let tokens: &'a [Token<'a>] = self.tokens;
        &tokens[self.current.min(tokens.len().saturating_sub(1))]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        let tokens: &'a [Token<'a>] = self.tokens;
        &tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}
