//! Terms: variables, constants and functional terms.
//!
//! Terms are immutable and compared structurally. Functional terms cover
//! IRI templates (`uri("http://ex.org/person/{}", pk)`) and similar
//! constructors appearing in mapping rule heads.

use crate::iri::Iri;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named variable. Equality is by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable {
    name: String,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// What a constant denotes. Needed when assembling triple heads: an IRI
/// constant and a literal with the same lexical value are distinct terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConstantType {
    Iri,
    Literal,
}

/// A ground value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Constant {
    pub value: String,
    pub datatype: ConstantType,
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.datatype {
            ConstantType::Iri => write!(f, "<{}>", self.value),
            ConstantType::Literal => write!(f, "\"{}\"", self.value),
        }
    }
}

/// A term of the algebra. Immutable; equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    Variable(Variable),
    Constant(Constant),
    Functional { symbol: String, args: Vec<Term> },
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(Variable::new(name))
    }

    pub fn iri(value: impl Into<String>) -> Self {
        Term::Constant(Constant {
            value: value.into(),
            datatype: ConstantType::Iri,
        })
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Constant(Constant {
            value: value.into(),
            datatype: ConstantType::Literal,
        })
    }

    pub fn functional(symbol: impl Into<String>, args: Vec<Term>) -> Self {
        Term::Functional {
            symbol: symbol.into(),
            args,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// All variables occurring in the term, in depth-first order, with
    /// duplicates.
    pub fn collect_variables<'a>(&'a self, out: &mut Vec<&'a Variable>) {
        match self {
            Term::Variable(v) => out.push(v),
            Term::Constant(_) => {}
            Term::Functional { args, .. } => {
                for a in args {
                    a.collect_variables(out);
                }
            }
        }
    }

    pub fn variables(&self) -> Vec<&Variable> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }
}

impl From<Variable> for Term {
    fn from(v: Variable) -> Self {
        Term::Variable(v)
    }
}

impl From<&Iri> for Term {
    fn from(iri: &Iri) -> Self {
        Term::iri(iri.as_str())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(v) => write!(f, "{v}"),
            Term::Constant(c) => write!(f, "{c}"),
            Term::Functional { symbol, args } => {
                write!(f, "{symbol}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
        }
    }
}
