//! Binding Expression AST
//!
//! Already-parsed ActionScript expressions found inside `{...}` data binding
//! markup and in the `source`/`destination` attributes of `<Binding>` tags.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parse_util::ParseSourceSpan;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    String(String),
    Int(i32),
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Plus | BinaryOperator::Minus => 1,
            BinaryOperator::Multiply | BinaryOperator::Divide => 2,
        }
    }
}

/// Binding strength of an expression when printed; operands are atoms.
const ATOM_PRECEDENCE: u8 = u8::MAX;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    This {
        span: ParseSourceSpan,
    },
    Identifier {
        name: String,
        span: ParseSourceSpan,
    },
    Member {
        object: Box<Expr>,
        name: String,
        span: ParseSourceSpan,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: ParseSourceSpan,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: ParseSourceSpan,
    },
    Literal {
        value: Literal,
        span: ParseSourceSpan,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
        span: ParseSourceSpan,
    },
    /// Text with embedded bindings, e.g. `Hello {user.name}!`.
    Concat {
        parts: Vec<Expr>,
        span: ParseSourceSpan,
    },
}

impl Expr {
    pub fn this() -> Self {
        Expr::This {
            span: ParseSourceSpan::default(),
        }
    }

    pub fn ident(name: &str) -> Self {
        Expr::Identifier {
            name: name.to_string(),
            span: ParseSourceSpan::default(),
        }
    }

    pub fn member(object: Expr, name: &str) -> Self {
        Expr::Member {
            object: Box::new(object),
            name: name.to_string(),
            span: ParseSourceSpan::default(),
        }
    }

    pub fn index(object: Expr, index: Expr) -> Self {
        Expr::Index {
            object: Box::new(object),
            index: Box::new(index),
            span: ParseSourceSpan::default(),
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
            span: ParseSourceSpan::default(),
        }
    }

    pub fn literal(value: Literal) -> Self {
        Expr::Literal {
            value,
            span: ParseSourceSpan::default(),
        }
    }

    pub fn string(value: &str) -> Self {
        Expr::literal(Literal::String(value.to_string()))
    }

    pub fn int(value: i32) -> Self {
        Expr::literal(Literal::Int(value))
    }

    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span: ParseSourceSpan::default(),
        }
    }

    pub fn concat(parts: Vec<Expr>) -> Self {
        Expr::Concat {
            parts,
            span: ParseSourceSpan::default(),
        }
    }

    /// Parse a dotted path such as `a.b.c` into nested member reads.
    pub fn path(dotted: &str) -> Self {
        let mut segments = dotted.split('.');
        let first = segments.next().unwrap_or_default();
        let root = if first == "this" { Expr::this() } else { Expr::ident(first) };
        segments.fold(root, |object, name| Expr::member(object, name))
    }

    pub fn with_span(mut self, new_span: ParseSourceSpan) -> Self {
        match &mut self {
            Expr::This { span }
            | Expr::Identifier { span, .. }
            | Expr::Member { span, .. }
            | Expr::Index { span, .. }
            | Expr::Call { span, .. }
            | Expr::Literal { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Concat { span, .. } => *span = new_span,
        }
        self
    }

    pub fn span(&self) -> &ParseSourceSpan {
        match self {
            Expr::This { span }
            | Expr::Identifier { span, .. }
            | Expr::Member { span, .. }
            | Expr::Index { span, .. }
            | Expr::Call { span, .. }
            | Expr::Literal { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Concat { span, .. } => span,
        }
    }

    pub fn is_concat(&self) -> bool {
        matches!(self, Expr::Concat { .. })
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Concat { .. } => BinaryOperator::Plus.precedence(),
            _ => ATOM_PRECEDENCE,
        }
    }
}

/// Writes `expr`, in parentheses when it binds looser than `min_precedence`.
fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, min_precedence: u8) -> fmt::Result {
    if expr.precedence() < min_precedence {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

/// Canonical binding text. An explicit `this.` receiver is dropped so that
/// `this.a` and `a` name the same binding endpoint. Operators are
/// left-associative, so a right operand of equal precedence keeps its
/// parentheses.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::This { .. } => write!(f, "this"),
            Expr::Identifier { name, .. } => write!(f, "{}", name),
            Expr::Member { object, name, .. } => match **object {
                Expr::This { .. } => write!(f, "{}", name),
                _ => {
                    write_operand(f, object, ATOM_PRECEDENCE)?;
                    write!(f, ".{}", name)
                }
            },
            Expr::Index { object, index, .. } => {
                write_operand(f, object, ATOM_PRECEDENCE)?;
                write!(f, "[{}]", index)
            }
            Expr::Call { callee, args, .. } => {
                write_operand(f, callee, ATOM_PRECEDENCE)?;
                write!(f, "(")?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::Literal { value, .. } => match value {
                Literal::Null => write!(f, "null"),
                Literal::Bool(b) => write!(f, "{}", b),
                Literal::String(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
                Literal::Int(i) => write!(f, "{}", i),
                Literal::Number(n) => write!(f, "{}", n),
            },
            Expr::Binary { op, left, right, .. } => {
                write_operand(f, left, op.precedence())?;
                write!(f, " {} ", op.as_str())?;
                write_operand(f, right, op.precedence() + 1)
            }
            Expr::Concat { parts, .. } => {
                let plus = BinaryOperator::Plus.precedence();
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                        write_operand(f, part, plus + 1)?;
                    } else {
                        write_operand(f, part, plus)?;
                    }
                }
                Ok(())
            }
        }
    }
}
