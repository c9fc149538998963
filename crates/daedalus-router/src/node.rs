//! Radix tree node implementation.
//!
//! Each node represents one path segment. Children are split by kind so that
//! matching can try them in priority order: static, then parameters (regex
//! constrained before unconstrained, each group in registration order), then
//! the catch-all wildcard.

use http::Method;

use crate::error::RouteError;
use crate::method::{MethodRouter, MethodSet};
use crate::params::Params;
use crate::template::{Constraint, Segment};

#[derive(Debug, Clone)]
struct ParamChild<T> {
    name: String,
    constraint: Option<Constraint>,
    node: Node<T>,
}

#[derive(Debug, Clone)]
struct WildcardChild<T> {
    name: String,
    methods: MethodRouter<T>,
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    segment: String,
    methods: Option<MethodRouter<T>>,
    /// Sorted by segment for binary search.
    static_children: Vec<Node<T>>,
    param_children: Vec<ParamChild<T>>,
    wildcard_child: Option<WildcardChild<T>>,
}

impl<T: Clone> Node<T> {
    pub(crate) fn root() -> Self {
        Self::new_static(String::new())
    }

    fn new_static(segment: String) -> Self {
        Self {
            segment,
            methods: None,
            static_children: Vec::new(),
            param_children: Vec::new(),
            wildcard_child: None,
        }
    }

    /// Inserts one concrete (already expanded) template variant.
    pub(crate) fn insert(
        &mut self,
        segments: &[Segment],
        methods: &MethodSet,
        value: T,
        template: &str,
    ) -> Result<(), RouteError> {
        let Some((first, rest)) = segments.split_first() else {
            return self
                .methods
                .get_or_insert_with(MethodRouter::new)
                .insert(methods, value)
                .map_err(|m| RouteError::conflict(m.as_ref(), template));
        };

        match first {
            Segment::Static(text) => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(text))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children
                            .insert(index, Node::new_static(text.clone()));
                        index
                    }
                };
                self.static_children[index].insert(rest, methods, value, template)
            }
            Segment::Param { name, constraint } => {
                let existing = self
                    .param_children
                    .iter()
                    .position(|c| c.name == *name && c.constraint == *constraint);
                let index = match existing {
                    Some(index) => index,
                    None => {
                        let child = ParamChild {
                            name: name.clone(),
                            constraint: constraint.clone(),
                            node: Node::new_static(format!(":{name}")),
                        };
                        let index = if constraint.is_some() {
                            self.param_children
                                .iter()
                                .take_while(|c| c.constraint.is_some())
                                .count()
                        } else {
                            self.param_children.len()
                        };
                        self.param_children.insert(index, child);
                        index
                    }
                };
                self.param_children[index]
                    .node
                    .insert(rest, methods, value, template)
            }
            Segment::Wildcard(name) => {
                let child = self.wildcard_child.get_or_insert_with(|| WildcardChild {
                    name: name.clone(),
                    methods: MethodRouter::new(),
                });
                if child.name != *name {
                    return Err(RouteError::invalid(
                        template,
                        format!(
                            "wildcard '*{name}' clashes with existing wildcard '*{}'",
                            child.name
                        ),
                    ));
                }
                child
                    .methods
                    .insert(methods, value)
                    .map_err(|m: Option<Method>| RouteError::conflict(m.as_ref(), template))
            }
        }
    }

    /// Matches a request path, returning the method table and captures.
    pub(crate) fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, rest)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Ok(index) = self
            .static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
        {
            if let Some(found) = self.static_children[index].match_segments(rest, params) {
                return Some(found);
            }
        }

        for child in &self.param_children {
            if child
                .constraint
                .as_ref()
                .is_some_and(|c| !c.is_match(segment))
            {
                continue;
            }
            let mark = params.len();
            params.push(child.name.clone(), *segment);
            if let Some(found) = child.node.match_segments(rest, params) {
                return Some(found);
            }
            params.truncate(mark);
        }

        if let Some(child) = &self.wildcard_child {
            params.push(child.name.clone(), segments.join("/"));
            return Some(&child.methods);
        }

        None
    }
}
