//! Secure/insecure split of a parameter tree.
//!
//! Both outputs are structural subsets of the input: no key or list position is
//! invented, and a container with nothing qualifying on one side is left out of
//! that side entirely.
//!
//! Anything that is not wrapped in a [`Parameter`] carries no classification
//! and always lands on the insecure side.

use crate::parameter::{Node, Parameter, ParameterMap, Tree};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Split `input` into `secure_out` and `insecure_out`.
///
/// Entries are appended to the outputs in input order. Existing entries in the
/// outputs are kept; a key present in both the output and the input is
/// overwritten.
pub fn split_by_secure(
    input: &ParameterMap,
    secure_out: &mut ParameterMap,
    insecure_out: &mut ParameterMap,
) {
    for (key, param) in input {
        let (secure, insecure) = split_parameter(param);
        if let Some(p) = secure {
            secure_out.insert(key.clone(), p);
        }
        if let Some(p) = insecure {
            insecure_out.insert(key.clone(), p);
        }
    }
}

/// Split `input` into a fresh [`Partition`].
#[must_use]
pub fn partition(input: &ParameterMap) -> Partition {
    let mut secure = ParameterMap::new();
    let mut insecure = ParameterMap::new();
    split_by_secure(input, &mut secure, &mut insecure);
    Partition {
        secure: SecureParameters::new(secure),
        insecure,
    }
}

type Sides<T> = (Option<T>, Option<T>);

fn split_parameter(param: &Parameter) -> Sides<Parameter> {
    match param.value() {
        Node::Mapping(children) => split_nested_mapping(param, children),
        Node::Sequence(items) => {
            let (secure, insecure) = split_items(items);
            (
                (!secure.is_empty()).then(|| param.with_value(Node::Sequence(secure))),
                (!insecure.is_empty()).then(|| param.with_value(Node::Sequence(insecure))),
            )
        }
        _ => route_whole(param),
    }
}

fn split_nested_mapping(param: &Parameter, children: &Tree) -> Sides<Parameter> {
    let (secure, insecure) = split_tree(children);
    (
        (!secure.is_empty()).then(|| param.with_value(Node::Mapping(secure))),
        (!insecure.is_empty()).then(|| param.with_value(Node::Mapping(insecure))),
    )
}

fn route_whole(param: &Parameter) -> Sides<Parameter> {
    if param.is_secured() {
        (Some(param.clone()), None)
    } else {
        (None, Some(param.clone()))
    }
}

fn split_tree(tree: &Tree) -> (Tree, Tree) {
    let mut secure = Tree::new();
    let mut insecure = Tree::new();
    for (key, node) in tree {
        match node {
            Node::Parameter(param) => {
                let (s, i) = split_parameter(param);
                if let Some(p) = s {
                    secure.insert(key.clone(), Node::from(p));
                }
                if let Some(p) = i {
                    insecure.insert(key.clone(), Node::from(p));
                }
            }
            raw => {
                insecure.insert(key.clone(), raw.clone());
            }
        }
    }
    (secure, insecure)
}

fn split_items(items: &[Node]) -> (Vec<Node>, Vec<Node>) {
    let mut secure = Vec::new();
    let mut insecure = Vec::new();
    for item in items {
        let Node::Parameter(param) = item else {
            insecure.push(item.clone());
            continue;
        };
        let (s, i) = match param.value() {
            Node::Mapping(children) => split_nested_mapping(param, children),
            _ => route_whole(param),
        };
        if let Some(p) = s {
            secure.push(Node::from(p));
        }
        if let Some(p) = i {
            insecure.push(Node::from(p));
        }
    }
    (secure, insecure)
}

/// Result of [`partition`].
#[derive(Debug)]
pub struct Partition {
    /// Values flagged secured.
    pub secure: SecureParameters,
    /// Everything else.
    pub insecure: ParameterMap,
}

/// Secure side of a partition, wiped from memory on drop.
#[derive(Default)]
pub struct SecureParameters {
    inner: ParameterMap,
}

impl SecureParameters {
    /// Take ownership of a secure map.
    #[inline]
    #[must_use]
    pub fn new(inner: ParameterMap) -> Self {
        Self { inner }
    }

    /// Access the map by reference.
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &ParameterMap {
        &self.inner
    }

    /// Consume and return the map. The caller becomes responsible for it.
    #[inline]
    #[must_use]
    pub fn into_inner(mut self) -> ParameterMap {
        std::mem::take(&mut self.inner)
    }

    /// Number of top-level entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True when nothing was classified secure.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Zeroize for SecureParameters {
    fn zeroize(&mut self) {
        for (mut key, mut param) in self.inner.drain(..) {
            key.zeroize();
            param.zeroize();
        }
    }
}

impl Drop for SecureParameters {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for SecureParameters {}

impl fmt::Debug for SecureParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureParameters([REDACTED; {} entries])", self.inner.len())
    }
}
