//! Abstract Syntax Tree for attribute queries
//!
//! The tree every backend consumes. Leaves carry values that already went through a
//! token converter, so the same tree shape serves raw strings, categories and bitmasks.

/// A compiled attribute query
#[derive(Clone, Debug, PartialEq)]
pub enum QueryNode<V> {
    /// n-ary conjunction, at least one child
    And(Vec<QueryNode<V>>),

    /// n-ary disjunction, at least one child
    Or(Vec<QueryNode<V>>),

    Not(Box<QueryNode<V>>),

    /// The subject (a set of values) contains this value
    Contains(V),

    /// The subject is one of these values
    ElementOf(Vec<V>),

    /// The subject, as a set, is exactly these values
    Equals(Vec<V>),

    /// Produced by `> n`: holds when the subject is greater than `n`
    LessThan(f64),

    /// Produced by `< n`: holds when the subject is less than `n`
    GreaterThan(f64),

    /// Produced by `>= n`
    LessThanEq(f64),

    /// Produced by `<= n`
    GreaterThanEq(f64),
}

impl<V> QueryNode<V> {
    pub fn not(node: QueryNode<V>) -> Self {
        QueryNode::Not(Box::new(node))
    }

    /// `any(a, b, ...)`: an `Or` of `Contains` leaves
    pub fn any_of(values: impl IntoIterator<Item = V>) -> Self {
        QueryNode::Or(values.into_iter().map(QueryNode::Contains).collect())
    }

    /// `all(a, b, ...)`: an `And` of `Contains` leaves
    pub fn all_of(values: impl IntoIterator<Item = V>) -> Self {
        QueryNode::And(values.into_iter().map(QueryNode::Contains).collect())
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            QueryNode::LessThan(_)
                | QueryNode::GreaterThan(_)
                | QueryNode::LessThanEq(_)
                | QueryNode::GreaterThanEq(_)
        )
    }

    /// Rewrite every leaf value, keeping the tree shape
    pub fn map_values<W>(self, f: &mut impl FnMut(V) -> W) -> QueryNode<W> {
        match self {
            QueryNode::And(children) => {
                QueryNode::And(children.into_iter().map(|c| c.map_values(f)).collect())
            }
            QueryNode::Or(children) => {
                QueryNode::Or(children.into_iter().map(|c| c.map_values(f)).collect())
            }
            QueryNode::Not(child) => QueryNode::Not(Box::new(child.map_values(f))),
            QueryNode::Contains(v) => QueryNode::Contains(f(v)),
            QueryNode::ElementOf(vs) => QueryNode::ElementOf(vs.into_iter().map(&mut *f).collect()),
            QueryNode::Equals(vs) => QueryNode::Equals(vs.into_iter().map(&mut *f).collect()),
            QueryNode::LessThan(n) => QueryNode::LessThan(n),
            QueryNode::GreaterThan(n) => QueryNode::GreaterThan(n),
            QueryNode::LessThanEq(n) => QueryNode::LessThanEq(n),
            QueryNode::GreaterThanEq(n) => QueryNode::GreaterThanEq(n),
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        match self {
            QueryNode::And(children) | QueryNode::Or(children) => {
                1 + children.iter().map(QueryNode::size).sum::<usize>()
            }
            QueryNode::Not(child) => 1 + child.size(),
            _ => 1,
        }
    }
}
