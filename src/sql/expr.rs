//! Expression AST for the statements the transfer pipeline emits.
//!
//! Expressions are deliberately narrow: qualified column references, literal
//! values and validated join predicates. Every variant is handled in
//! `to_tokens()` - the compiler enforces this.

use super::dialect::Dialect;
use super::predicate::JoinPredicate;
use super::token::{Token, TokenStream};

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column {
        table: Option<String>,
        column: String,
    },

    /// Literal values
    Literal(Literal),

    /// Boolean predicate that has already been parsed and checked.
    Predicate(JoinPredicate),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Finite number in its source spelling.
    Numeric(String),
    String(String),
    Bool(bool),
}

impl Expr {
    /// Convert this expression to a token stream (dialect-agnostic).
    pub fn to_tokens(&self) -> TokenStream {
        self.to_tokens_for_dialect(Dialect::default())
    }

    /// Convert this expression to a token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, _dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(match lit {
                    Literal::Numeric(n) => Token::LitNumeric(n.clone()),
                    Literal::String(s) => Token::LitString(s.clone()),
                    Literal::Bool(b) => Token::LitBool(*b),
                });
            }

            Expr::Predicate(pred) => {
                ts.push(Token::Raw(pred.as_str().to_string()));
            }
        }

        ts
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create a column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Create a qualified column reference (table.column).
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

/// Create a numeric literal from its text form.
///
/// Text that does not parse as a finite number falls back to a quoted
/// string literal, so nothing unchecked is ever emitted bare.
pub fn lit_numeric(s: &str) -> Expr {
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && !s.is_empty() => Expr::Literal(Literal::Numeric(s.into())),
        _ => lit_str(s),
    }
}

/// Create a boolean literal from `"true"`/`"false"`.
///
/// Anything else becomes a quoted string literal.
pub fn lit_bool_text(s: &str) -> Expr {
    match s {
        "true" => lit_bool(true),
        "false" => lit_bool(false),
        _ => lit_str(s),
    }
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// Create a boolean literal.
pub fn lit_bool(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

impl From<JoinPredicate> for Expr {
    fn from(p: JoinPredicate) -> Self {
        Expr::Predicate(p)
    }
}
