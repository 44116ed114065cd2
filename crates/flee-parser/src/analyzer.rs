//! Identifier discovery.
//!
//! [`IdentifierAnalyzer`] lists the identifiers an expression reads from its
//! environment: the head of every member chain that is not a function call.
//! Member names after `.` and function names are skipped, so `a.b + f(c)`
//! yields `a` and `c`. The calculation engine uses this to find references to
//! other named expressions.

use crate::ast::{Expr, InTarget};

/// Collects the leading identifiers of an expression.
#[derive(Debug, Default)]
pub struct IdentifierAnalyzer<'ast> {
    identifiers: Vec<&'ast str>,
}

impl<'ast> IdentifierAnalyzer<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers in order of first appearance, without exact duplicates.
    pub fn analyze(expr: &Expr<'ast>) -> Vec<&'ast str> {
        let mut analyzer = Self::new();
        analyzer.visit(expr);
        analyzer.identifiers
    }

    fn push(&mut self, name: &'ast str) {
        if !self.identifiers.contains(&name) {
            self.identifiers.push(name);
        }
    }

    fn visit(&mut self, expr: &Expr<'ast>) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Ident(ident) => self.push(ident.name),
            Expr::Binary(b) => {
                self.visit(b.left);
                self.visit(b.right);
            }
            Expr::Unary(u) => self.visit(u.operand),
            Expr::Call(call) => {
                if let Some(target) = call.target {
                    self.visit(target);
                }
                for arg in call.args {
                    self.visit(arg);
                }
            }
            Expr::Member(member) => self.visit(member.object),
            Expr::Index(index) => {
                self.visit(index.object);
                for i in index.indices {
                    self.visit(i);
                }
            }
            Expr::Paren(paren) => self.visit(paren.expr),
            Expr::Conditional(c) => {
                self.visit(c.condition);
                self.visit(c.when_true);
                self.visit(c.when_false);
            }
            Expr::Cast(cast) => self.visit(cast.expr),
            Expr::In(e) => {
                self.visit(e.operand);
                match e.target {
                    InTarget::List(items) => {
                        for item in items {
                            self.visit(item);
                        }
                    }
                    InTarget::Collection(collection) => self.visit(collection),
                }
            }
        }
    }
}
