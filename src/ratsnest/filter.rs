//! Node predicates for closest-node queries

use super::node::Node;

/// Selects which nodes a closest-node query may return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeFilter {
    Any,
    /// Nodes a ratsnest line may end on (neither no-line nor blocked)
    LineTarget,
    SameTag(u32),
    DifferentTag(u32),
    /// Line targets inside one connected component
    LineTargetSameTag(u32),
    And(Box<NodeFilter>, Box<NodeFilter>),
    Or(Box<NodeFilter>, Box<NodeFilter>),
    Not(Box<NodeFilter>),
}

impl NodeFilter {
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            NodeFilter::Any => true,
            NodeFilter::LineTarget => node.is_line_target(),
            NodeFilter::SameTag(tag) => node.tag() == Some(*tag),
            NodeFilter::DifferentTag(tag) => node.tag() != Some(*tag),
            NodeFilter::LineTargetSameTag(tag) => {
                node.is_line_target() && node.tag() == Some(*tag)
            }
            NodeFilter::And(a, b) => a.matches(node) && b.matches(node),
            NodeFilter::Or(a, b) => a.matches(node) || b.matches(node),
            NodeFilter::Not(a) => !a.matches(node),
        }
    }

    pub fn and(self, other: NodeFilter) -> NodeFilter {
        NodeFilter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: NodeFilter) -> NodeFilter {
        NodeFilter::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> NodeFilter {
        NodeFilter::Not(Box::new(self))
    }
}
