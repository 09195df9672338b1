use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt};

/// Renders the AST as parenthesised S‑expressions, e.g. `(+ 1.0 (group 2.0))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal { value, .. } => match value {
                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }

                LiteralValue::Str(s) => s.to_string(),

                LiteralValue::Bool(b) => b.to_string(),

                LiteralValue::Nil => "nil".to_string(),
            },

            Expr::Grouping { expr, .. } => format!("(group {})", self.print(expr)),

            Expr::Unary { op, right, .. } => format!("({} {})", op, self.print(right)),

            Expr::Binary {
                left, op, right, ..
            } => format!("({} {} {})", op, self.print(left), self.print(right)),

            Expr::Logical {
                left, op, right, ..
            } => format!("({} {} {})", op, self.print(left), self.print(right)),

            Expr::Variable { name, .. } => name.name.clone(),

            Expr::Assign { name, value, .. } => format!("(= {} {})", name.name, self.print(value)),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out = format!("(call {}", self.print(callee));
                for arg in arguments {
                    out.push(' ');
                    out.push_str(&self.print(arg));
                }
                out.push(')');
                out
            }

            Expr::Get { object, name } => format!("(. {} {})", self.print(object), name.name),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                self.print(object),
                name.name,
                self.print(value)
            ),

            Expr::This { .. } => "this".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.name),

            Expr::Lambda(decl) => self.function("fun", decl),
        }
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", self.print(expr)),

            Stmt::Print(expr) => format!("(print {})", self.print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.name, self.print(init)),
                None => format!("(var {})", name.name),
            },

            Stmt::Block(statements) => format!("(block{})", self.list(statements)),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => {
                format!("(while {} {})", self.print(condition), self.print_stmt(body))
            }

            Stmt::Break(_) => "(break)".to_string(),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", self.print(value)),
                None => "(return)".to_string(),
            },

            Stmt::Function(decl) => self.function("fun", decl),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut out = format!("(class {}", name.name);

                if let Some(superclass) = superclass {
                    out.push_str(&format!(" < {}", self.print(superclass)));
                }

                for method in methods {
                    out.push(' ');
                    out.push_str(&self.function("method", method));
                }

                out.push(')');
                out
            }
        }
    }

    fn function(&self, label: &str, decl: &FunctionDecl) -> String {
        let params: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();

        let head = match &decl.name {
            Some(name) => format!("({} {} ({})", label, name.name, params.join(" ")),
            None => format!("({} ({})", label, params.join(" ")),
        };

        format!("{}{})", head, self.list(&decl.body))
    }

    fn list(&self, statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(|s| format!(" {}", self.print_stmt(s)))
            .collect()
    }
}
