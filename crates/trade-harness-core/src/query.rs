//! Structured search queries.
//!
//! A query mixes free text with `<field><op><value>` clauses, e.g.
//! `stone ql>90 price<50 seller=jota`. Clauses are pulled out wherever they
//! appear; what remains is the free text handed to the inverted index.
//!
//! | Alias | Field |
//! |-------|-------|
//! | `ql`, `quality`, `q` | quality |
//! | `price`, `p` | price |
//! | `qty`, `quantity` | quantity |
//! | `seller`, `s` | seller |
//! | `rarity`, `r` | rarity |
//! | `material`, `m` | material |
//! | `type`, `t` | order type |
//!
//! Failures are permissive: an unknown alias or a non-numeric value for a
//! numeric field compiles to a predicate that accepts everything.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

use crate::models::QueryableItem;

/// Numeric equality tolerance.
pub const NUMERIC_EPSILON: f64 = 1e-3;

fn clause_regex() -> &'static Regex {
    static CLAUSE: OnceLock<Regex> = OnceLock::new();
    // Two-character operators come first so `>=` never parses as `>`.
    CLAUSE.get_or_init(|| {
        Regex::new(r"([A-Za-z]+)\s*(>=|<=|>|<|=)\s*([\w.]+)").expect("clause regex is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Gte,
    Lte,
    Gt,
    Lt,
    Eq,
}

impl Operator {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">=" => Some(Operator::Gte),
            "<=" => Some(Operator::Lte),
            ">" => Some(Operator::Gt),
            "<" => Some(Operator::Lt),
            "=" => Some(Operator::Eq),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Eq => "=",
        }
    }

    fn compare(&self, actual: f64, target: f64) -> bool {
        match self {
            Operator::Gt => actual > target,
            Operator::Lt => actual < target,
            Operator::Gte => actual >= target,
            Operator::Lte => actual <= target,
            Operator::Eq => (actual - target).abs() < NUMERIC_EPSILON,
        }
    }
}

/// Item fields a clause can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    Quality,
    Price,
    Quantity,
    Seller,
    Rarity,
    Material,
    OrderType,
}

impl Field {
    /// Resolve a case-insensitive alias.
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias.to_ascii_lowercase().as_str() {
            "ql" | "quality" | "q" => Some(Field::Quality),
            "price" | "p" => Some(Field::Price),
            "qty" | "quantity" => Some(Field::Quantity),
            "seller" | "s" => Some(Field::Seller),
            "rarity" | "r" => Some(Field::Rarity),
            "material" | "m" => Some(Field::Material),
            "type" | "t" => Some(Field::OrderType),
            _ => None,
        }
    }

    fn numeric(&self, item: &QueryableItem) -> Option<f64> {
        match self {
            Field::Quality => Some(item.quality),
            Field::Price => Some(item.price as f64),
            Field::Quantity => Some(item.quantity as f64),
            _ => None,
        }
    }

    fn text<'a>(&self, item: &'a QueryableItem) -> Option<&'a str> {
        match self {
            Field::Seller => Some(&item.seller),
            Field::Rarity => Some(&item.rarity),
            Field::Material => Some(&item.material),
            Field::OrderType => Some(&item.order_type),
            _ => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Field::Quality | Field::Price | Field::Quantity)
    }
}

/// One `<field><op><value>` clause, as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterClause {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.operator.symbol(), self.value)
    }
}

/// A query split into its free text and its filter clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    pub text_query: String,
    pub filters: Vec<FilterClause>,
}

/// Split `input` into free text and filter clauses.
pub fn parse_query(input: &str) -> ParsedQuery {
    let mut filters = Vec::new();
    for caps in clause_regex().captures_iter(input) {
        if let Some(operator) = Operator::from_symbol(&caps[2]) {
            filters.push(FilterClause {
                field: caps[1].to_string(),
                operator,
                value: caps[3].to_string(),
            });
        }
    }

    let stripped = clause_regex().replace_all(input, " ");
    let text_query = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    ParsedQuery {
        text_query,
        filters,
    }
}

/// A compiled clause, ready to test items.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Accepts every item (unknown field, bad number, unsupported operator).
    Always,
    Numeric {
        field: Field,
        operator: Operator,
        target: f64,
    },
    /// Case-insensitive exact-or-substring match; `needle` is lowercased.
    Contains { field: Field, needle: String },
}

impl Predicate {
    pub fn test(&self, item: &QueryableItem) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Numeric {
                field,
                operator,
                target,
            } => field
                .numeric(item)
                .map(|actual| operator.compare(actual, *target))
                .unwrap_or(true),
            Predicate::Contains { field, needle } => field
                .text(item)
                .map(|value| value.to_lowercase().contains(needle.as_str()))
                .unwrap_or(true),
        }
    }
}

impl FilterClause {
    pub fn compile(&self) -> Predicate {
        let Some(field) = Field::from_alias(&self.field) else {
            return Predicate::Always;
        };

        if field.is_numeric() {
            return match self.value.parse::<f64>() {
                Ok(target) if target.is_finite() => Predicate::Numeric {
                    field,
                    operator: self.operator,
                    target,
                },
                _ => Predicate::Always,
            };
        }

        match self.operator {
            Operator::Eq => Predicate::Contains {
                field,
                needle: self.value.to_lowercase(),
            },
            _ => Predicate::Always,
        }
    }
}

impl ParsedQuery {
    /// Compile every clause; an item must pass all of them.
    pub fn predicates(&self) -> Vec<Predicate> {
        self.filters.iter().map(FilterClause::compile).collect()
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }
}

/// True when `item` passes every predicate.
pub fn matches_all(predicates: &[Predicate], item: &QueryableItem) -> bool {
    predicates.iter().all(|p| p.test(item))
}
