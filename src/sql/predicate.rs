//! Join predicates supplied as free text.
//!
//! A predicate is accepted only if the ClickHouse parser reads it as exactly
//! one boolean-shaped expression with nothing trailing. The parsed expression
//! is re-rendered by the parser, so the emitted text is the text that was
//! checked.

use sqlparser::ast::Expr as AstExpr;
use sqlparser::dialect::ClickHouseDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token as SqlToken;
use thiserror::Error;

/// A predicate that failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid join predicate {predicate:?}: {message}")]
pub struct InvalidPredicate {
    pub predicate: String,
    pub message: String,
}

/// A validated join predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPredicate(String);

impl JoinPredicate {
    /// Parse and validate a predicate.
    pub fn parse(text: &str) -> Result<Self, InvalidPredicate> {
        let fail = |message: String| InvalidPredicate {
            predicate: text.to_string(),
            message,
        };

        if text.trim().is_empty() {
            return Err(fail("predicate is empty".into()));
        }

        let dialect = ClickHouseDialect {};
        let mut parser = Parser::new(&dialect)
            .try_with_sql(text)
            .map_err(|e| fail(e.to_string()))?;
        let expr = parser.parse_expr().map_err(|e| fail(e.to_string()))?;

        let next = parser.peek_token();
        if next.token != SqlToken::EOF {
            return Err(fail(format!("unexpected trailing input at {}", next.token)));
        }

        if matches!(
            expr,
            AstExpr::Identifier(_) | AstExpr::CompoundIdentifier(_) | AstExpr::Value(_)
        ) {
            return Err(fail("expected a condition, found a bare value".into()));
        }

        Ok(JoinPredicate(expr.to_string()))
    }

    /// Canonical predicate text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
