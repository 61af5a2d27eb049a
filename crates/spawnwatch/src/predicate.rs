//! Alert rule expressions.
//!
//! A rule is a small boolean expression over four numeric variables:
//! `now`, `min`, `max` (absolute minutes) and `prob` (0..1).
//!
//! Grammar:
//! ```text
//! expr       := or
//! or         := and ('or' and)*
//! and        := not ('and' not)*
//! not        := 'not' not | comparison
//! comparison := sum (cmp_op sum)*          chained: a < b < c
//! sum        := product (('+' | '-') product)*
//! product    := unary (('*' | '/' | '//' | '%') unary)*
//! unary      := ('-' | '+') unary | power
//! power      := atom ('**' unary)?
//! atom       := number | 'true' | 'false' | variable | '(' expr ')'
//! cmp_op     := '<' | '<=' | '>' | '>=' | '==' | '!='
//! ```
//!
//! Expressions are type-checked at compile time and must produce a boolean.
//! Sources are limited to [`MAX_SOURCE_LEN`] characters and [`MAX_DEPTH`]
//! levels of nesting.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{all_consuming, cut, map, not, opt, recognize, value},
    error::{ErrorKind, ParseError},
    multi::{fold_many0, many0},
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use crate::types::SpawnSignal;

/// Longest accepted rule source, in characters.
pub const MAX_SOURCE_LEN: usize = 256;

/// Deepest accepted nesting of parentheses, `not`, signs and powers.
pub const MAX_DEPTH: usize = 64;

/// Errors from compiling or evaluating a rule.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PredicateError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("evaluation error: {0}")]
    Evaluation(String),
}

pub type PredicateResult<T> = Result<T, PredicateError>;

/// Variable values a rule is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bindings {
    pub now: f64,
    pub min: f64,
    pub max: f64,
    pub prob: f64,
}

impl Bindings {
    /// Representative values every new rule must evaluate cleanly against.
    pub const SAMPLE: Bindings = Bindings {
        now: 15.0,
        min: 10.0,
        max: 20.0,
        prob: 0.0,
    };

    pub fn from_signal(now: f64, signal: &SpawnSignal) -> Self {
        Self {
            now,
            min: signal.min_time,
            max: signal.max_time,
            prob: signal.probability,
        }
    }
}

/// A compiled, type-checked rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    source: String,
    expr: Expr,
}

impl Predicate {
    /// Parse, type-check and trial-evaluate a rule.
    pub fn compile(source: &str) -> PredicateResult<Self> {
        let source = source.trim();
        if source.chars().count() > MAX_SOURCE_LEN {
            return Err(PredicateError::Syntax(format!(
                "expression is longer than {MAX_SOURCE_LEN} characters"
            )));
        }
        let expr = parse(source)?;
        if check(&expr)? != Kind::Bool {
            return Err(PredicateError::Type(
                "expression should evaluate to true or false".to_string(),
            ));
        }
        let predicate = Self {
            source: source.to_string(),
            expr,
        };
        predicate.evaluate(&Bindings::SAMPLE)?;
        Ok(predicate)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, bindings: &Bindings) -> PredicateResult<bool> {
        match eval(&self.expr, bindings)? {
            Value::Bool(b) => Ok(b),
            Value::Num(_) => Err(PredicateError::Type(
                "expression produced a number".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Variable {
    Now,
    Min,
    Max,
    Prob,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Bool(bool),
    Var(Variable),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, Vec<(CompareOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Num,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Num(f64),
    Bool(bool),
}

// ── Parser ──

/// Parse error carrying the unparsed remainder and, for errors the grammar
/// raises itself, a message.
#[derive(Debug, PartialEq)]
struct ParseFailure<'a> {
    input: &'a str,
    message: Option<String>,
}

impl<'a> ParseFailure<'a> {
    fn fatal(input: &'a str, message: impl Into<String>) -> nom::Err<Self> {
        nom::Err::Failure(Self {
            input,
            message: Some(message.into()),
        })
    }

    fn into_predicate_error(self, source: &str) -> PredicateError {
        if let Some(message) = self.message {
            return PredicateError::Syntax(message);
        }
        let rest = self.input.trim_start();
        match rest.chars().next() {
            Some(c) => PredicateError::Syntax(format!(
                "unexpected '{c}' at position {}",
                source.len() - rest.len()
            )),
            None => PredicateError::Syntax("unexpected end of expression".to_string()),
        }
    }
}

impl<'a> ParseError<&'a str> for ParseFailure<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Self {
            input,
            message: None,
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, O> = IResult<&'a str, O, ParseFailure<'a>>;

fn parse(source: &str) -> PredicateResult<Expr> {
    match all_consuming(terminated(|i| or_expr(i, 0), multispace0))(source) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e.into_predicate_error(source)),
        Err(nom::Err::Incomplete(_)) => {
            Err(PredicateError::Syntax("incomplete expression".to_string()))
        }
    }
}

/// One level deeper, or a failure once [`MAX_DEPTH`] is reached.
fn descend(input: &str, depth: usize) -> Result<usize, nom::Err<ParseFailure<'_>>> {
    if depth >= MAX_DEPTH {
        return Err(ParseFailure::fatal(input, "expression nested too deeply"));
    }
    Ok(depth + 1)
}

fn ws<'a, O>(
    inner: impl FnMut(&'a str) -> PResult<'a, O>,
) -> impl FnMut(&'a str) -> PResult<'a, O> {
    preceded(multispace0, inner)
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

/// A case-insensitive keyword, matched as a whole word.
fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input| {
        let (rest, word) = ws(identifier)(input)?;
        if word.eq_ignore_ascii_case(kw) {
            Ok((rest, word))
        } else {
            Err(nom::Err::Error(ParseFailure::from_error_kind(
                input,
                ErrorKind::Tag,
            )))
        }
    }
}

fn or_expr(input: &str, depth: usize) -> PResult<'_, Expr> {
    let (input, first) = and_expr(input, depth)?;
    fold_many0(
        preceded(keyword("or"), cut(move |i| and_expr(i, depth))),
        move || first.clone(),
        |lhs, rhs| Expr::Or(Box::new(lhs), Box::new(rhs)),
    )(input)
}

fn and_expr(input: &str, depth: usize) -> PResult<'_, Expr> {
    let (input, first) = not_expr(input, depth)?;
    fold_many0(
        preceded(keyword("and"), cut(move |i| not_expr(i, depth))),
        move || first.clone(),
        |lhs, rhs| Expr::And(Box::new(lhs), Box::new(rhs)),
    )(input)
}

fn not_expr(input: &str, depth: usize) -> PResult<'_, Expr> {
    let Ok((rest, _)) = keyword("not")(input) else {
        return comparison(input, depth);
    };
    let depth = descend(input, depth)?;
    let (rest, inner) = cut(move |i| not_expr(i, depth))(rest)?;
    Ok((rest, Expr::Not(Box::new(inner))))
}

fn compare_op(input: &str) -> PResult<'_, CompareOp> {
    alt((
        value(CompareOp::Le, tag("<=")),
        value(CompareOp::Ge, tag(">=")),
        value(CompareOp::Eq, tag("==")),
        value(CompareOp::Ne, tag("!=")),
        value(CompareOp::Lt, tag("<")),
        value(CompareOp::Gt, tag(">")),
    ))(input)
}

fn comparison(input: &str, depth: usize) -> PResult<'_, Expr> {
    let (input, first) = sum(input, depth)?;
    let (input, rest) = many0(pair(ws(compare_op), cut(move |i| sum(i, depth))))(input)?;
    if rest.is_empty() {
        Ok((input, first))
    } else {
        Ok((input, Expr::Compare(Box::new(first), rest)))
    }
}

fn sum(input: &str, depth: usize) -> PResult<'_, Expr> {
    let (input, first) = product(input, depth)?;
    fold_many0(
        pair(
            ws(alt((
                value(ArithOp::Add, char('+')),
                value(ArithOp::Sub, char('-')),
            ))),
            cut(move |i| product(i, depth)),
        ),
        move || first.clone(),
        |lhs, (op, rhs)| Expr::Arith(op, Box::new(lhs), Box::new(rhs)),
    )(input)
}

fn product(input: &str, depth: usize) -> PResult<'_, Expr> {
    let (input, first) = unary(input, depth)?;
    fold_many0(
        pair(
            ws(alt((
                value(ArithOp::FloorDiv, tag("//")),
                value(ArithOp::Div, char('/')),
                value(ArithOp::Rem, char('%')),
                value(ArithOp::Mul, terminated(char('*'), not(char('*')))),
            ))),
            cut(move |i| unary(i, depth)),
        ),
        move || first.clone(),
        |lhs, (op, rhs)| Expr::Arith(op, Box::new(lhs), Box::new(rhs)),
    )(input)
}

fn unary(input: &str, depth: usize) -> PResult<'_, Expr> {
    let (rest, sign) = opt(ws(one_of("+-")))(input)?;
    let Some(sign) = sign else {
        return power(input, depth);
    };
    let depth = descend(input, depth)?;
    let (rest, operand) = cut(move |i| unary(i, depth))(rest)?;
    let expr = if sign == '-' {
        Expr::Neg(Box::new(operand))
    } else {
        // Unary plus only asserts numeric-ness; `x + 0` keeps the type check.
        Expr::Arith(ArithOp::Add, Box::new(operand), Box::new(Expr::Number(0.0)))
    };
    Ok((rest, expr))
}

fn power(input: &str, depth: usize) -> PResult<'_, Expr> {
    let (input, base) = atom(input, depth)?;
    let (rest, op) = opt(ws(tag("**")))(input)?;
    if op.is_none() {
        return Ok((input, base));
    }
    let depth = descend(input, depth)?;
    let (rest, exponent) = cut(move |i| unary(i, depth))(rest)?;
    Ok((rest, Expr::Arith(ArithOp::Pow, Box::new(base), Box::new(exponent))))
}

fn atom(input: &str, depth: usize) -> PResult<'_, Expr> {
    let (input, _) = multispace0(input)?;
    if let Ok((rest, _)) = char::<_, ParseFailure<'_>>('(')(input) {
        let depth = descend(input, depth)?;
        let (rest, inner) = cut(move |i| or_expr(i, depth))(rest)?;
        let (rest, _) = ws(char(')'))(rest)
            .map_err(|_| ParseFailure::fatal(rest, "expected ')'"))?;
        return Ok((rest, inner));
    }
    alt((map(number, Expr::Number), name))(input)
}

/// Decimal number with optional fraction and exponent; signs are unary
/// operators.
fn number(input: &str) -> PResult<'_, f64> {
    let (rest, text) = recognize(tuple((
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;
    let number = text
        .parse::<f64>()
        .map_err(|_| ParseFailure::fatal(input, format!("invalid number: {text}")))?;
    Ok((rest, number))
}

fn name(input: &str) -> PResult<'_, Expr> {
    let (rest, word) = identifier(input)?;
    let expr = match word.to_ascii_lowercase().as_str() {
        "now" => Expr::Var(Variable::Now),
        "min" => Expr::Var(Variable::Min),
        "max" => Expr::Var(Variable::Max),
        "prob" => Expr::Var(Variable::Prob),
        "true" => Expr::Bool(true),
        "false" => Expr::Bool(false),
        _ => {
            return Err(ParseFailure::fatal(
                input,
                format!("unknown name '{word}' (expected now, min, max or prob)"),
            ))
        }
    };
    Ok((rest, expr))
}

// ── Type checking ──

fn check(expr: &Expr) -> PredicateResult<Kind> {
    match expr {
        Expr::Number(_) | Expr::Var(_) => Ok(Kind::Num),
        Expr::Bool(_) => Ok(Kind::Bool),
        Expr::Neg(inner) => expect_kind(inner, Kind::Num, "'-'"),
        Expr::Not(inner) => expect_kind(inner, Kind::Bool, "'not'"),
        Expr::Arith(_, lhs, rhs) => {
            expect_kind(lhs, Kind::Num, "arithmetic")?;
            expect_kind(rhs, Kind::Num, "arithmetic")
        }
        Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
            expect_kind(lhs, Kind::Bool, "'and'/'or'")?;
            expect_kind(rhs, Kind::Bool, "'and'/'or'")
        }
        Expr::Compare(first, rest) => {
            let mut left = check(first)?;
            for (op, operand) in rest {
                let right = check(operand)?;
                let ordering = !matches!(op, CompareOp::Eq | CompareOp::Ne);
                if ordering && (left != Kind::Num || right != Kind::Num) {
                    return Err(PredicateError::Type(
                        "ordering comparisons need numbers on both sides".to_string(),
                    ));
                }
                if left != right {
                    return Err(PredicateError::Type(
                        "cannot compare a number with true/false".to_string(),
                    ));
                }
                left = right;
            }
            Ok(Kind::Bool)
        }
    }
}

fn expect_kind(expr: &Expr, expected: Kind, context: &str) -> PredicateResult<Kind> {
    let kind = check(expr)?;
    if kind != expected {
        let wanted = match expected {
            Kind::Num => "a number",
            Kind::Bool => "true/false",
        };
        return Err(PredicateError::Type(format!("{context} expects {wanted}")));
    }
    Ok(kind)
}

// ── Evaluation ──

fn eval(expr: &Expr, env: &Bindings) -> PredicateResult<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Num(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Var(var) => Ok(Value::Num(match var {
            Variable::Now => env.now,
            Variable::Min => env.min,
            Variable::Max => env.max,
            Variable::Prob => env.prob,
        })),
        Expr::Neg(inner) => Ok(Value::Num(-eval_num(inner, env)?)),
        Expr::Not(inner) => Ok(Value::Bool(!eval_bool(inner, env)?)),
        Expr::Arith(op, lhs, rhs) => {
            let a = eval_num(lhs, env)?;
            let b = eval_num(rhs, env)?;
            let result = match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div => nonzero(b).map(|b| a / b)?,
                ArithOp::FloorDiv => nonzero(b).map(|b| (a / b).floor())?,
                ArithOp::Rem => nonzero(b).map(|b| a - b * (a / b).floor())?,
                ArithOp::Pow => a.powf(b),
            };
            if result.is_finite() {
                Ok(Value::Num(result))
            } else {
                Err(PredicateError::Evaluation("result is not a finite number".to_string()))
            }
        }
        Expr::And(lhs, rhs) => Ok(Value::Bool(eval_bool(lhs, env)? && eval_bool(rhs, env)?)),
        Expr::Or(lhs, rhs) => Ok(Value::Bool(eval_bool(lhs, env)? || eval_bool(rhs, env)?)),
        Expr::Compare(first, rest) => {
            let mut left = eval(first, env)?;
            for (op, operand) in rest {
                let right = eval(operand, env)?;
                if !compare(*op, left, right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
    }
}

fn nonzero(value: f64) -> PredicateResult<f64> {
    if value == 0.0 {
        Err(PredicateError::Evaluation("division by zero".to_string()))
    } else {
        Ok(value)
    }
}

fn compare(op: CompareOp, left: Value, right: Value) -> PredicateResult<bool> {
    match (left, right) {
        (Value::Num(a), Value::Num(b)) => Ok(match op {
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
        }),
        (Value::Bool(a), Value::Bool(b)) => match op {
            CompareOp::Eq => Ok(a == b),
            CompareOp::Ne => Ok(a != b),
            _ => Err(PredicateError::Type("cannot order true/false".to_string())),
        },
        _ => Err(PredicateError::Type(
            "cannot compare a number with true/false".to_string(),
        )),
    }
}

fn eval_num(expr: &Expr, env: &Bindings) -> PredicateResult<f64> {
    match eval(expr, env)? {
        Value::Num(n) => Ok(n),
        Value::Bool(_) => Err(PredicateError::Type("expected a number".to_string())),
    }
}

fn eval_bool(expr: &Expr, env: &Bindings) -> PredicateResult<bool> {
    match eval(expr, env)? {
        Value::Bool(b) => Ok(b),
        Value::Num(_) => Err(PredicateError::Type("expected true/false".to_string())),
    }
}
