use serde::Serialize;
use std::fmt;

use crate::path::PathNode;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClassReference {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MemberReference {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reference {
    Class(ClassReference),
    Member(MemberReference),
}

impl Reference {
    pub fn class(name: &str) -> Self {
        Reference::Class(ClassReference {
            name: name.to_string(),
        })
    }

    pub fn member(owner: &str, name: &str, descriptor: &str) -> Self {
        Reference::Member(MemberReference {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        })
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Reference::Class(_))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Class(c) => f.write_str(&c.name),
            Reference::Member(m) if m.descriptor.starts_with('(') => {
                write!(f, "{}.{}{}", m.owner, m.name, m.descriptor)
            }
            Reference::Member(m) => write!(f, "{}.{} {}", m.owner, m.name, m.descriptor),
        }
    }
}

/// One reference occurrence and where it was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub path: PathNode,
    pub reference: Reference,
}

/// Receives every match the walk produces, in traversal order.
pub trait ResultSink {
    fn accept(&mut self, path: PathNode, reference: Reference);
}

impl ResultSink for Vec<SearchResult> {
    fn accept(&mut self, path: PathNode, reference: Reference) {
        self.push(SearchResult { path, reference });
    }
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn accept(&mut self, path: PathNode, reference: Reference) {
        (**self).accept(path, reference);
    }
}

/// Counts matches without keeping them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountingSink {
    pub classes: usize,
    pub members: usize,
}

impl CountingSink {
    pub fn total(&self) -> usize {
        self.classes + self.members
    }
}

impl ResultSink for CountingSink {
    fn accept(&mut self, _path: PathNode, reference: Reference) {
        if reference.is_class() {
            self.classes += 1;
        } else {
            self.members += 1;
        }
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F: FnMut(PathNode, Reference)> ResultSink for FnSink<F> {
    fn accept(&mut self, path: PathNode, reference: Reference) {
        (self.0)(path, reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinks_collect_count_and_forward() {
        let path = PathNode::class("com/Foo");

        let mut results: Vec<SearchResult> = Vec::new();
        results.accept(path.clone(), Reference::class("com/Bar"));
        assert_eq!(results[0].reference, Reference::class("com/Bar"));

        let mut counter = CountingSink::default();
        counter.accept(path.clone(), Reference::class("com/Bar"));
        counter.accept(path.clone(), Reference::member("com/Bar", "x", "I"));
        assert_eq!(counter.total(), 2);
        assert_eq!(counter.members, 1);

        let mut seen = Vec::new();
        let mut sink = FnSink(|p: PathNode, r: Reference| seen.push((p.to_string(), r.to_string())));
        sink.accept(path, Reference::member("com/Util", "helper", "(I)Z"));
        drop(sink);
        assert_eq!(seen, vec![("com/Foo".to_string(), "com/Util.helper(I)Z".to_string())]);
    }

    #[test]
    fn reference_serializes_with_kind_tag() {
        let json = serde_json::to_value(Reference::member("com/A", "f", "I")).unwrap();
        assert_eq!(json["kind"], "member");
        assert_eq!(json["owner"], "com/A");
        assert_eq!(Reference::member("com/A", "f", "I").to_string(), "com/A.f I");
    }
}
