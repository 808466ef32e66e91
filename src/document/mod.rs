//! Namespace-aware, read-only document tree.
//!
//! A [`DocumentNode`] is built once from a parsed XML element and never
//! mutated afterwards. Attributes and leaf child elements (children without
//! attributes or elements of their own) are unified into a single value map,
//! so a property such as `<Version>1.0.0</Version>` is looked up exactly like
//! an attribute `Version="1.0.0"`. Every other child becomes a nested node.
//!
//! Lookups take a local name and resolve the namespace against the node's own
//! namespace, falling back to [`DEFAULT_NAMESPACE`] for unqualified
//! documents. The `_ns` variants take an explicit namespace instead.

mod loader;

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

pub use loader::{LoadError, decode, parse_bytes, parse_str};

/// Namespace marker used for elements and attributes without a namespace.
pub const DEFAULT_NAMESPACE: &str = "<default>";

/// A local name qualified by its (resolved) namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub name: String,
    pub namespace: String,
}

/// Line and column (both 1-based) of an element's start tag in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Raw element as produced by the markup reader, before grouping.
#[derive(Debug, Default)]
pub(crate) struct Element {
    pub name: String,
    pub namespace: Option<String>,
    pub position: SourcePosition,
    /// (local name, namespace, value)
    pub attributes: Vec<(String, Option<String>, String)>,
    pub children: Vec<Element>,
    /// Concatenated text of the element and all of its descendants.
    pub text: String,
}

/// One element of a parsed document.
#[derive(Debug, Clone)]
pub struct DocumentNode {
    identifier: String,
    namespace: String,
    position: SourcePosition,
    values: HashMap<QualifiedName, Vec<String>>,
    children: Vec<DocumentNode>,
    child_index: HashMap<QualifiedName, Vec<usize>>,
    text: Option<String>,
}

impl DocumentNode {
    pub(crate) fn from_element(element: Element) -> Self {
        let namespace = element
            .namespace
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let qualify = |name: String, explicit: Option<String>| QualifiedName {
            name,
            namespace: explicit.unwrap_or_else(|| namespace.clone()),
        };

        let mut values = Vec::with_capacity(element.attributes.len());
        for (name, explicit, value) in element.attributes {
            values.push((qualify(name, explicit), value));
        }

        let mut nested = Vec::new();
        for child in element.children {
            let key = qualify(child.name.clone(), child.namespace.clone());
            if child.attributes.is_empty() && child.children.is_empty() {
                values.push((key, child.text.trim().to_string()));
            } else {
                nested.push((key, DocumentNode::from_element(child)));
            }
        }

        let (keys, children): (Vec<_>, Vec<_>) = nested.into_iter().unzip();
        let child_index = group(keys.into_iter().enumerate().map(|(i, key)| (key, i)));
        let text = Some(element.text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        Self {
            identifier: element.name,
            namespace,
            position: element.position,
            values: group(values),
            children,
            child_index,
            text,
        }
    }

    /// Local name of the element.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Namespace of the element, or [`DEFAULT_NAMESPACE`].
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn position(&self) -> SourcePosition {
        self.position
    }

    /// Concatenated text content of this element and its descendants.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn has_value(&self, name: &str) -> bool {
        self.has_value_ns(name, None)
    }

    pub fn has_value_ns(&self, name: &str, namespace: Option<&str>) -> bool {
        self.values.contains_key(&self.key(name, namespace))
    }

    /// First value stored under `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.value_ns(name, None)
    }

    pub fn value_ns(&self, name: &str, namespace: Option<&str>) -> Option<&str> {
        self.values_ns(name, namespace).first().map(String::as_str)
    }

    /// All values stored under `name` in document order; empty when absent.
    pub fn values(&self, name: &str) -> &[String] {
        self.values_ns(name, None)
    }

    pub fn values_ns(&self, name: &str, namespace: Option<&str>) -> &[String] {
        self.values
            .get(&self.key(name, namespace))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.has_child_ns(name, None)
    }

    pub fn has_child_ns(&self, name: &str, namespace: Option<&str>) -> bool {
        self.child_index.contains_key(&self.key(name, namespace))
    }

    /// First child node named `name`, if any.
    pub fn child(&self, name: &str) -> Option<&DocumentNode> {
        self.child_ns(name, None)
    }

    pub fn child_ns(&self, name: &str, namespace: Option<&str>) -> Option<&DocumentNode> {
        self.children_named_ns(name, namespace).into_iter().next()
    }

    /// All child nodes in document order. Leaf elements are values, not children.
    pub fn children(&self) -> &[DocumentNode] {
        &self.children
    }

    pub fn children_named(&self, name: &str) -> Vec<&DocumentNode> {
        self.children_named_ns(name, None)
    }

    pub fn children_named_ns(&self, name: &str, namespace: Option<&str>) -> Vec<&DocumentNode> {
        self.child_index
            .get(&self.key(name, namespace))
            .map(|indices| indices.iter().map(|&i| &self.children[i]).collect())
            .unwrap_or_default()
    }

    /// Nodes named `name` anywhere below this node (pre-order), in this
    /// node's namespace.
    pub fn descendants_named(&self, name: &str) -> Vec<&DocumentNode> {
        let mut found = Vec::new();
        self.collect_descendants(name, &self.namespace, &mut found);
        found
    }

    /// First value named `name` on this node or any node below it.
    pub fn descendant_value(&self, name: &str) -> Option<&str> {
        self.descendant_values(name).into_iter().next()
    }

    /// Values named `name` on this node or any node below it (pre-order), in
    /// this node's namespace.
    pub fn descendant_values(&self, name: &str) -> Vec<&str> {
        let mut found = Vec::new();
        self.collect_values(name, &self.namespace, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, namespace: &str, found: &mut Vec<&'a DocumentNode>) {
        for child in &self.children {
            if child.identifier == name && child.namespace == namespace {
                found.push(child);
            }
            child.collect_descendants(name, namespace, found);
        }
    }

    fn collect_values<'a>(&'a self, name: &str, namespace: &str, found: &mut Vec<&'a str>) {
        found.extend(
            self.values_ns(name, Some(namespace))
                .iter()
                .map(String::as_str),
        );
        for child in &self.children {
            child.collect_values(name, namespace, found);
        }
    }

    fn key(&self, name: &str, namespace: Option<&str>) -> QualifiedName {
        QualifiedName {
            name: name.to_string(),
            namespace: namespace.unwrap_or(&self.namespace).to_string(),
        }
    }
}

fn group<K: Hash + Eq, V>(entries: impl IntoIterator<Item = (K, V)>) -> HashMap<K, Vec<V>> {
    let mut grouped: HashMap<K, Vec<V>> = HashMap::new();
    for (key, value) in entries {
        grouped.entry(key).or_default().push(value);
    }
    grouped
}
