//! Typed query-plan values.
//!
//! A plan is a declarative composition of relational operators, evaluated
//! in the standard SQL order when present: join, filter, derive, group,
//! aggregate, having, order, limit. Plans are plain serde-serialisable
//! values, testable independent of any query-text syntax.

use serde::{Deserialize, Serialize};

/// A scalar literal in predicates and derivations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Literal {
    pub fn str(s: impl Into<String>) -> Self {
        Literal::Str(s.into())
    }

    /// True for integer and float literals.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Literal::Int(_) | Literal::Float(_))
    }
}

/// Ordered comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Gt,
    Lt,
    Ge,
    Le,
}

/// A single filter or having predicate. Multiple predicates combine as a
/// conjunction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// `column IS NULL`
    IsNull(String),
    /// `column IS NOT NULL`
    IsNotNull(String),
    /// `column = literal`
    Eq { column: String, value: Literal },
    /// `column IN (literal-set)`
    In { column: String, values: Vec<Literal> },
    /// `column <op> literal` for numeric columns
    Cmp {
        column: String,
        op: CmpOp,
        value: f64,
    },
}

impl Predicate {
    pub fn is_null(column: impl Into<String>) -> Self {
        Predicate::IsNull(column.into())
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Predicate::IsNotNull(column.into())
    }

    pub fn eq(column: impl Into<String>, value: Literal) -> Self {
        Predicate::Eq {
            column: column.into(),
            value,
        }
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Literal>) -> Self {
        Predicate::In {
            column: column.into(),
            values,
        }
    }

    pub fn cmp(column: impl Into<String>, op: CmpOp, value: f64) -> Self {
        Predicate::Cmp {
            column: column.into(),
            op,
            value,
        }
    }

    /// The column this predicate references.
    pub fn column(&self) -> &str {
        match self {
            Predicate::IsNull(c) | Predicate::IsNotNull(c) => c,
            Predicate::Eq { column, .. }
            | Predicate::In { column, .. }
            | Predicate::Cmp { column, .. } => column,
        }
    }
}

/// Row-wise expression for derived columns.
///
/// Division guards its denominator: a null or zero denominator yields a
/// null result for that row instead of an error or infinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeriveExpr {
    Column(String),
    Value(Literal),
    Add(Box<DeriveExpr>, Box<DeriveExpr>),
    Sub(Box<DeriveExpr>, Box<DeriveExpr>),
    Mul(Box<DeriveExpr>, Box<DeriveExpr>),
    Div(Box<DeriveExpr>, Box<DeriveExpr>),
    Case {
        when: Box<Predicate>,
        then: Box<DeriveExpr>,
        otherwise: Box<DeriveExpr>,
    },
}

impl DeriveExpr {
    pub fn col(name: impl Into<String>) -> Self {
        DeriveExpr::Column(name.into())
    }

    pub fn value(v: Literal) -> Self {
        DeriveExpr::Value(v)
    }

    pub fn add(a: DeriveExpr, b: DeriveExpr) -> Self {
        DeriveExpr::Add(Box::new(a), Box::new(b))
    }

    pub fn sub(a: DeriveExpr, b: DeriveExpr) -> Self {
        DeriveExpr::Sub(Box::new(a), Box::new(b))
    }

    pub fn mul(a: DeriveExpr, b: DeriveExpr) -> Self {
        DeriveExpr::Mul(Box::new(a), Box::new(b))
    }

    pub fn div(a: DeriveExpr, b: DeriveExpr) -> Self {
        DeriveExpr::Div(Box::new(a), Box::new(b))
    }

    pub fn case(when: Predicate, then: DeriveExpr, otherwise: DeriveExpr) -> Self {
        DeriveExpr::Case {
            when: Box::new(when),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Short rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            DeriveExpr::Column(c) => c.clone(),
            DeriveExpr::Value(v) => format!("{v:?}"),
            DeriveExpr::Add(a, b) => format!("({} + {})", a.describe(), b.describe()),
            DeriveExpr::Sub(a, b) => format!("({} - {})", a.describe(), b.describe()),
            DeriveExpr::Mul(a, b) => format!("({} * {})", a.describe(), b.describe()),
            DeriveExpr::Div(a, b) => format!("({} / {})", a.describe(), b.describe()),
            DeriveExpr::Case { .. } => "case".to_string(),
        }
    }
}

/// A named derived column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derivation {
    pub name: String,
    pub expr: DeriveExpr,
}

impl Derivation {
    pub fn new(name: impl Into<String>, expr: DeriveExpr) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }
}

/// Aggregation function over a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggFunc {
    /// Row count. With a column, counts non-null values only.
    Count,
    Sum,
    /// Arithmetic mean, excluding nulls.
    Mean,
    Min,
    Max,
}

/// One aggregate output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub func: AggFunc,
    /// Input column; None only for `Count` (row count).
    pub column: Option<String>,
    /// Output column name.
    pub alias: String,
}

impl Aggregate {
    pub fn count(alias: impl Into<String>) -> Self {
        Self {
            func: AggFunc::Count,
            column: None,
            alias: alias.into(),
        }
    }

    pub fn sum(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            func: AggFunc::Sum,
            column: Some(column.into()),
            alias: alias.into(),
        }
    }

    pub fn mean(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            func: AggFunc::Mean,
            column: Some(column.into()),
            alias: alias.into(),
        }
    }

    pub fn min(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            func: AggFunc::Min,
            column: Some(column.into()),
            alias: alias.into(),
        }
    }

    pub fn max(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            func: AggFunc::Max,
            column: Some(column.into()),
            alias: alias.into(),
        }
    }
}

/// One sort key. Ties keep original row order (stable sort).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// Inner equi-join of a named table into the working row set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub table: String,
    /// Equality predicates as (left column, right column) pairs.
    pub on: Vec<(String, String)>,
}

impl Join {
    pub fn on(table: impl Into<String>, on: &[(&str, &str)]) -> Self {
        Self {
            table: table.into(),
            on: on
                .iter()
                .map(|(l, r)| (l.to_string(), r.to_string()))
                .collect(),
        }
    }
}

/// A full declarative query plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Result name, also the sink artifact name.
    pub name: String,
    /// Base table.
    pub from: String,
    pub joins: Vec<Join>,
    pub filters: Vec<Predicate>,
    pub derives: Vec<Derivation>,
    pub group_by: Vec<String>,
    pub aggregates: Vec<Aggregate>,
    pub having: Vec<Predicate>,
    pub order_by: Vec<SortKey>,
    pub limit: Option<usize>,
}
