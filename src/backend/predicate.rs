//! In-memory predicate backend
//!
//! Compiles an AST once into a tree of closures. Leaves test a [`Subject`]: the set of
//! values attached to a variant (roles of the carriers, effect types, ...), a single
//! scalar, or a number for the comparison leaves.

use std::fmt;

use crate::ast::QueryNode;
use crate::attributes::Category;
use crate::error::QueryError;

/// What a compiled query is evaluated against
#[derive(Clone, Copy, Debug)]
pub enum Subject<'a, V> {
    Set(&'a [V]),
    /// A scalar behaves as the one-element set
    Item(&'a V),
    Number(f64),
}

type Predicate<V> = Box<dyn Fn(&Subject<'_, V>) -> bool + Send + Sync>;

/// Pins the closure signature so it is generic over the subject's lifetime
fn predicate<V, F>(f: F) -> Predicate<V>
where
    F: for<'r, 's> Fn(&'r Subject<'s, V>) -> bool + Send + Sync + 'static,
{
    Box::new(f)
}

fn number<V>(subject: &Subject<'_, V>, test: impl Fn(f64) -> bool) -> bool {
    match subject {
        Subject::Number(n) => test(*n),
        _ => false,
    }
}

fn members<'a, V>(subject: &Subject<'a, V>) -> Option<&'a [V]> {
    match subject {
        Subject::Set(set) => Some(*set),
        Subject::Item(item) => Some(std::slice::from_ref(*item)),
        Subject::Number(_) => None,
    }
}

fn compile<V>(node: &QueryNode<V>) -> Predicate<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    match node {
        QueryNode::And(children) => {
            let preds: Vec<Predicate<V>> = children.iter().map(compile).collect();
            predicate(move |s| preds.iter().all(|p| p(s)))
        }
        QueryNode::Or(children) => {
            let preds: Vec<Predicate<V>> = children.iter().map(compile).collect();
            predicate(move |s| preds.iter().any(|p| p(s)))
        }
        QueryNode::Not(child) => {
            let p = compile(child);
            predicate(move |s| !p(s))
        }
        QueryNode::Contains(value) => {
            let value = value.clone();
            predicate(move |s| members(s).is_some_and(|set| set.contains(&value)))
        }
        QueryNode::ElementOf(values) => {
            let values = values.clone();
            predicate(move |s| {
                members(s).is_some_and(|set| !set.is_empty() && set.iter().all(|x| values.contains(x)))
            })
        }
        QueryNode::Equals(values) => {
            let values = values.clone();
            predicate(move |s| {
                members(s).is_some_and(|set| {
                    set.iter().all(|x| values.contains(x)) && values.iter().all(|v| set.contains(v))
                })
            })
        }
        QueryNode::LessThan(bound) => {
            let bound = *bound;
            predicate(move |s| number(s, |x| x > bound))
        }
        QueryNode::GreaterThan(bound) => {
            let bound = *bound;
            predicate(move |s| number(s, |x| x < bound))
        }
        QueryNode::LessThanEq(bound) => {
            let bound = *bound;
            predicate(move |s| number(s, |x| x >= bound))
        }
        QueryNode::GreaterThanEq(bound) => {
            let bound = *bound;
            predicate(move |s| number(s, |x| x <= bound))
        }
    }
}

/// A compiled attribute query over arbitrary values
pub struct Matcher<V> {
    tree: QueryNode<V>,
    predicate: Predicate<V>,
}

impl<V> Matcher<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(tree: QueryNode<V>) -> Self {
        let predicate = compile(&tree);
        Matcher { tree, predicate }
    }

    pub fn tree(&self) -> &QueryNode<V> {
        &self.tree
    }

    pub fn matches(&self, subject: &Subject<'_, V>) -> bool {
        (self.predicate)(subject)
    }

    pub fn matches_values(&self, values: &[V]) -> bool {
        self.matches(&Subject::Set(values))
    }

    pub fn matches_value(&self, value: &V) -> bool {
        self.matches(&Subject::Item(value))
    }

    pub fn matches_number(&self, n: f64) -> bool {
        self.matches(&Subject::Number(n))
    }
}

impl<V: fmt::Debug> fmt::Debug for Matcher<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher").field("tree", &self.tree).finish_non_exhaustive()
    }
}

type MaskPredicate = Box<dyn Fn(u64) -> bool + Send + Sync>;

/// A compiled query over an integer bitmask, mirroring the bitwise SQL backend
pub struct BitmaskMatcher {
    tree: QueryNode<u64>,
    predicate: MaskPredicate,
}

fn compile_mask(node: &QueryNode<u64>) -> Result<MaskPredicate, QueryError> {
    let pred: MaskPredicate = match node {
        QueryNode::And(children) => {
            let preds = children.iter().map(compile_mask).collect::<Result<Vec<_>, _>>()?;
            Box::new(move |m: u64| preds.iter().all(|p| p(m)))
        }
        QueryNode::Or(children) => {
            let preds = children.iter().map(compile_mask).collect::<Result<Vec<_>, _>>()?;
            Box::new(move |m: u64| preds.iter().any(|p| p(m)))
        }
        QueryNode::Not(child) => {
            let p = compile_mask(child)?;
            Box::new(move |m: u64| !p(m))
        }
        QueryNode::Contains(bits) => {
            let bits = *bits;
            Box::new(move |m: u64| m & bits != 0)
        }
        QueryNode::ElementOf(values) => {
            let bits = values.iter().fold(0u64, |acc, v| acc | *v);
            Box::new(move |m: u64| m & bits != 0)
        }
        QueryNode::Equals(values) => {
            let bits = values.iter().fold(0u64, |acc, v| acc | *v);
            Box::new(move |m: u64| m == bits)
        }
        cmp => {
            return Err(QueryError::unsupported(
                "bitmask",
                format!("comparison {}", comparison_name(cmp)),
            ))
        }
    };
    Ok(pred)
}

pub(crate) fn comparison_name<V>(node: &QueryNode<V>) -> &'static str {
    match node {
        QueryNode::LessThan(_) => "'>'",
        QueryNode::GreaterThan(_) => "'<'",
        QueryNode::LessThanEq(_) => "'>='",
        QueryNode::GreaterThanEq(_) => "'<='",
        _ => "non-comparison",
    }
}

impl BitmaskMatcher {
    /// Fails when the tree contains a numeric comparison
    pub fn new(tree: QueryNode<u64>) -> Result<Self, QueryError> {
        let predicate = compile_mask(&tree)?;
        Ok(BitmaskMatcher { tree, predicate })
    }

    pub fn from_categories<C: Category>(tree: &QueryNode<C>) -> Result<Self, QueryError> {
        Self::new(tree.clone().map_values(&mut |c: C| c.bits()))
    }

    pub fn tree(&self) -> &QueryNode<u64> {
        &self.tree
    }

    pub fn matches(&self, mask: u64) -> bool {
        (self.predicate)(mask)
    }
}

impl fmt::Debug for BitmaskMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitmaskMatcher").field("tree", &self.tree).finish_non_exhaustive()
    }
}
