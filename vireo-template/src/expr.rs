//! Expression AST and its pest-backed parser.
//!
//! The grammar covers literals, identifiers, `this`, member/index access,
//! calls, unary `!`/`-`, arithmetic, comparison, logical operators, the
//! ternary, assignment and `;`-separated statement lists.

use std::sync::LazyLock;

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};

use crate::error::ParseError;

#[derive(pest_derive::Parser)]
#[grammar = "expr.pest"]
struct ExprParser;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    StrictEq,
    StrictNe,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Array(Vec<Expr>),
    This,
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Assign(Box<Expr>, Box<Expr>),
}

/// A parsed expression: one or more statements, the last one's value wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub source: String,
    pub statements: Vec<Expr>,
}

/// `<name> in <iterable>` from a repetition directive.
#[derive(Debug, Clone, PartialEq)]
pub struct ForClause {
    pub var: String,
    pub iterable: Program,
}

static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::or, Assoc::Left))
        .op(Op::infix(Rule::and, Assoc::Left))
        .op(Op::infix(Rule::strict_eq, Assoc::Left)
            | Op::infix(Rule::strict_ne, Assoc::Left)
            | Op::infix(Rule::eq, Assoc::Left)
            | Op::infix(Rule::ne, Assoc::Left))
        .op(Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::le, Assoc::Left)
            | Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::ge, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::not) | Op::prefix(Rule::neg))
});

pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let mut pairs = ExprParser::parse(Rule::program, source).map_err(|e| syntax(source, e))?;
    let Some(program) = pairs.next() else {
        return Err(error(source, "empty input"));
    };
    let statements = program
        .into_inner()
        .filter(|p| p.as_rule() == Rule::statement)
        .map(|p| build_statement(source, p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Program {
        source: source.to_string(),
        statements,
    })
}

pub fn parse_for_clause(source: &str) -> Result<ForClause, ParseError> {
    let mut pairs = ExprParser::parse(Rule::for_clause, source).map_err(|e| syntax(source, e))?;
    let Some(clause) = pairs.next() else {
        return Err(error(source, "empty input"));
    };
    let mut var = None;
    let mut iterable = None;
    for p in clause.into_inner() {
        match p.as_rule() {
            Rule::ident => var = Some(p.as_str().to_string()),
            Rule::statement => {
                let text = p.as_str().trim().to_string();
                iterable = Some(Program {
                    statements: vec![build_statement(source, p)?],
                    source: text,
                });
            }
            _ => {}
        }
    }
    match (var, iterable) {
        (Some(var), Some(iterable)) => Ok(ForClause { var, iterable }),
        _ => Err(error(source, "expected `<name> in <iterable>`")),
    }
}

fn syntax(source: &str, e: pest::error::Error<Rule>) -> ParseError {
    error(source, &e.to_string())
}

fn error(source: &str, message: &str) -> ParseError {
    ParseError {
        expression: source.to_string(),
        message: message.to_string(),
    }
}

fn build_statement(src: &str, pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let Some(inner) = pair.into_inner().next() else {
        return Err(error(src, "empty statement"));
    };
    match inner.as_rule() {
        Rule::assign => {
            let mut parts = inner.into_inner();
            let (Some(target), Some(value)) = (parts.next(), parts.next()) else {
                return Err(error(src, "incomplete assignment"));
            };
            Ok(Expr::Assign(
                Box::new(build_postfix(src, target)?),
                Box::new(build_statement(src, value)?),
            ))
        }
        Rule::conditional => build_conditional(src, inner),
        other => Err(error(src, &format!("unexpected {other:?}"))),
    }
}

fn build_conditional(src: &str, pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let mut parts = pair.into_inner();
    let Some(test) = parts.next() else {
        return Err(error(src, "empty expression"));
    };
    let test = build_binary(src, test.into_inner())?;
    match (parts.next(), parts.next()) {
        (Some(yes), Some(no)) => Ok(Expr::Conditional(
            Box::new(test),
            Box::new(build_statement(src, yes)?),
            Box::new(build_statement(src, no)?),
        )),
        _ => Ok(test),
    }
}

fn build_binary(src: &str, pairs: Pairs<Rule>) -> Result<Expr, ParseError> {
    PRATT
        .map_primary(|p| build_postfix(src, p))
        .map_prefix(|op, rhs| {
            let op = match op.as_rule() {
                Rule::not => UnaryOp::Not,
                _ => UnaryOp::Neg,
            };
            Ok(Expr::Unary(op, Box::new(rhs?)))
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::or => BinaryOp::Or,
                Rule::and => BinaryOp::And,
                Rule::strict_eq => BinaryOp::StrictEq,
                Rule::strict_ne => BinaryOp::StrictNe,
                Rule::eq => BinaryOp::Eq,
                Rule::ne => BinaryOp::Ne,
                Rule::lt => BinaryOp::Lt,
                Rule::le => BinaryOp::Le,
                Rule::gt => BinaryOp::Gt,
                Rule::ge => BinaryOp::Ge,
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                _ => BinaryOp::Rem,
            };
            Ok(Expr::Binary(op, Box::new(lhs?), Box::new(rhs?)))
        })
        .parse(pairs)
}

fn build_postfix(src: &str, pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let mut parts = pair.into_inner();
    let Some(head) = parts.next() else {
        return Err(error(src, "missing operand"));
    };
    let mut expr = build_primary(src, head)?;
    for suffix in parts {
        expr = match suffix.as_rule() {
            Rule::member => {
                let name = suffix.into_inner().as_str().to_string();
                Expr::Member(Box::new(expr), name)
            }
            Rule::index => {
                let Some(key) = suffix.into_inner().next() else {
                    return Err(error(src, "empty index"));
                };
                Expr::Index(Box::new(expr), Box::new(build_statement(src, key)?))
            }
            Rule::call => {
                let args = suffix
                    .into_inner()
                    .map(|a| build_statement(src, a))
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::Call(Box::new(expr), args)
            }
            other => return Err(error(src, &format!("unexpected {other:?}"))),
        };
    }
    Ok(expr)
}

fn build_primary(src: &str, pair: Pair<Rule>) -> Result<Expr, ParseError> {
    Ok(match pair.as_rule() {
        Rule::number => {
            let n = pair
                .as_str()
                .parse::<f64>()
                .map_err(|e| error(src, &e.to_string()))?;
            Expr::Literal(Literal::Number(n))
        }
        Rule::string => {
            let raw = pair.into_inner().as_str();
            Expr::Literal(Literal::Str(unescape(raw)))
        }
        Rule::true_lit => Expr::Literal(Literal::Bool(true)),
        Rule::false_lit => Expr::Literal(Literal::Bool(false)),
        Rule::null_lit => Expr::Literal(Literal::Null),
        Rule::undefined_lit => Expr::Literal(Literal::Undefined),
        Rule::this => Expr::This,
        Rule::ident => Expr::Ident(pair.as_str().to_string()),
        Rule::array => Expr::Array(
            pair.into_inner()
                .map(|p| build_statement(src, p))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Rule::statement => build_statement(src, pair)?,
        other => return Err(error(src, &format!("unexpected {other:?}"))),
    })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(src: &str) -> Expr {
        let mut p = parse_program(src).unwrap();
        assert_eq!(p.statements.len(), 1);
        p.statements.remove(0)
    }

    fn ident(n: &str) -> Box<Expr> {
        Box::new(Expr::Ident(n.into()))
    }

    #[test]
    fn precedence_follows_arithmetic() {
        let e = one("a + b * 2");
        assert_eq!(
            e,
            Expr::Binary(
                BinaryOp::Add,
                ident("a"),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    ident("b"),
                    Box::new(Expr::Literal(Literal::Number(2.0)))
                ))
            )
        );
    }

    #[test]
    fn member_index_and_call_chain() {
        let e = one("this.items[0].toggle(x)");
        let Expr::Call(callee, args) = e else {
            panic!("expected call");
        };
        assert_eq!(args, vec![Expr::Ident("x".into())]);
        assert!(matches!(*callee, Expr::Member(_, ref m) if m == "toggle"));
    }

    #[test]
    fn equality_is_not_assignment() {
        assert!(matches!(one("a == b"), Expr::Binary(BinaryOp::Eq, _, _)));
        assert!(matches!(one("a === b"), Expr::Binary(BinaryOp::StrictEq, _, _)));
        assert!(matches!(one("a = b"), Expr::Assign(_, _)));
        assert!(matches!(one("a <= b"), Expr::Binary(BinaryOp::Le, _, _)));
    }

    #[test]
    fn keywords_need_a_word_boundary() {
        assert_eq!(one("thisValue"), Expr::Ident("thisValue".into()));
        assert_eq!(one("trueish"), Expr::Ident("trueish".into()));
        assert_eq!(one("null"), Expr::Literal(Literal::Null));
    }

    #[test]
    fn strings_unescape() {
        assert_eq!(
            one(r#"'it\'s' + "a\"b""#),
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Literal(Literal::Str("it's".into()))),
                Box::new(Expr::Literal(Literal::Str("a\"b".into())))
            )
        );
    }

    #[test]
    fn statements_split_on_semicolons() {
        let p = parse_program("this.a = 1; this.b = 2;").unwrap();
        assert_eq!(p.statements.len(), 2);
    }

    #[test]
    fn ternary_and_prefix() {
        assert!(matches!(one("!a ? -1 : 1"), Expr::Conditional(_, _, _)));
    }

    #[test]
    fn for_clause_splits_var_and_iterable() {
        let c = parse_for_clause("item in this.items").unwrap();
        assert_eq!(c.var, "item");
        assert_eq!(c.iterable.source, "this.items");
        assert!(parse_for_clause("in this.items").is_err());
        assert!(parse_for_clause("item in").is_err());
        assert!(parse_for_clause("item").is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_program("a +").is_err());
        assert!(parse_program("").is_err());
        assert!(parse_program("a b").is_err());
    }
}
