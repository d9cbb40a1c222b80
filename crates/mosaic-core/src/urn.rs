//! Resource identifier parsing and human-readable labels.
//!
//! Identifiers follow the deployment engine's URN shape:
//!
//! ```text
//! urn:pulumi:<stack>::<project>::<qualified type>::<name>
//! urn:pulumi:dev::app::sst:aws:Function$aws:lambda/function:Function::ApiHandler
//! ```

use std::collections::{HashMap, HashSet};

/// Type of the session root. Parent walks stop before reaching it.
pub const ROOT_TYPE: &str = "pulumi:pulumi:Stack";

/// Borrowed view over a resource identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Urn<'a> {
    raw: &'a str,
    type_name: &'a str,
    name: &'a str,
}

impl<'a> Urn<'a> {
    /// Split an identifier into its type and name components.
    ///
    /// Anything that is not a four-part URN is treated as a bare name with an
    /// empty type, so arbitrary identifiers still get a label.
    pub fn parse(raw: &'a str) -> Self {
        let parts: Vec<&str> = raw.splitn(4, "::").collect();
        match *parts.as_slice() {
            [_, _, qualified, name] => Self {
                raw,
                type_name: qualified.rsplit('$').next().unwrap_or(qualified),
                name,
            },
            _ => Self {
                raw,
                type_name: "",
                name: raw,
            },
        }
    }

    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn type_name(&self) -> &'a str {
        self.type_name
    }

    pub fn is_root(&self) -> bool {
        self.type_name == ROOT_TYPE
    }

    /// `"<name> <type>"`, with component names like `Api.aws.Function`
    /// rewritten to `Api aws:Function`.
    pub fn local_label(&self) -> String {
        match self.name.split_once('.') {
            Some((name, rest)) => join_label(name, &rest.replace('.', ":")),
            None => join_label(self.name, self.type_name),
        }
    }

    fn plain_label(&self) -> String {
        join_label(self.name, self.type_name)
    }
}

fn join_label(name: &str, type_name: &str) -> String {
    if type_name.is_empty() {
        name.to_string()
    } else {
        format!("{name} {type_name}")
    }
}

/// Label a resource for display, prefixed by its top-level ancestor.
///
/// The walk follows `parents` until a parent is missing, is the session root,
/// or repeats (the table comes from the engine and may contain cycles).
pub fn resolve_label(id: &str, parents: &HashMap<String, String>) -> String {
    if id.is_empty() {
        return String::new();
    }
    let label = Urn::parse(id).local_label();

    let mut current = id;
    let mut visited: HashSet<&str> = HashSet::from([id]);
    while let Some(parent) = parents.get(current) {
        if parent.is_empty() || Urn::parse(parent).is_root() || !visited.insert(parent.as_str()) {
            break;
        }
        current = parent.as_str();
    }

    if current == id {
        label
    } else {
        format!("{} → {label}", Urn::parse(current).plain_label())
    }
}
