//! Reference queries.
//!
//! Each target (owner, name, descriptor) is optional. An absent target matches
//! anything, so one query type covers:
//! - class search;
//! - member search;
//! - partial member search, e.g. "every member of `com/Foo`" or "every member
//!   shaped `(I)Z`".

use serde::Serialize;

use crate::error::SearchError;
use crate::matcher::{SlotMatcher, TextMatchMode};
use crate::path::PathNode;
use crate::result::ResultSink;
use crate::walk::{ClassSource, ReferenceVisitor};

#[derive(Debug, Clone)]
enum QueryKind {
    Class {
        owner: SlotMatcher,
    },
    Member {
        owner: SlotMatcher,
        name: SlotMatcher,
        descriptor: SlotMatcher,
    },
}

/// Immutable, shareable reference query.
#[derive(Debug, Clone)]
pub struct ReferenceQuery {
    kind: QueryKind,
}

impl ReferenceQuery {
    /// Class reference query.
    pub fn class(mode: TextMatchMode, owner: Option<&str>) -> Self {
        Self {
            kind: QueryKind::Class {
                owner: SlotMatcher::new(mode, owner),
            },
        }
    }

    /// Member reference query using one match mode for all three targets.
    pub fn member(
        mode: TextMatchMode,
        owner: Option<&str>,
        name: Option<&str>,
        descriptor: Option<&str>,
    ) -> Self {
        Self::member_with_modes(mode, mode, mode, owner, name, descriptor)
    }

    /// Member reference query with an independent match mode per target.
    pub fn member_with_modes(
        owner_mode: TextMatchMode,
        name_mode: TextMatchMode,
        descriptor_mode: TextMatchMode,
        owner: Option<&str>,
        name: Option<&str>,
        descriptor: Option<&str>,
    ) -> Self {
        Self {
            kind: QueryKind::Member {
                owner: SlotMatcher::new(owner_mode, owner),
                name: SlotMatcher::new(name_mode, name),
                descriptor: SlotMatcher::new(descriptor_mode, descriptor),
            },
        }
    }

    pub fn is_class_ref_only(&self) -> bool {
        matches!(self.kind, QueryKind::Class { .. })
    }

    pub fn target_owner(&self) -> Option<&str> {
        match &self.kind {
            QueryKind::Class { owner } | QueryKind::Member { owner, .. } => owner.target(),
        }
    }

    pub fn target_name(&self) -> Option<&str> {
        match &self.kind {
            QueryKind::Class { .. } => None,
            QueryKind::Member { name, .. } => name.target(),
        }
    }

    pub fn target_descriptor(&self) -> Option<&str> {
        match &self.kind {
            QueryKind::Class { .. } => None,
            QueryKind::Member { descriptor, .. } => descriptor.target(),
        }
    }

    pub fn is_class_ref_match(&self, class_name: Option<&str>) -> bool {
        let QueryKind::Class { owner } = &self.kind else {
            return false;
        };
        if class_name.is_none() && self.target_name().is_some() {
            return false;
        }
        owner.is_satisfied(class_name)
    }

    pub fn is_member_ref_match(
        &self,
        owner: Option<&str>,
        name: Option<&str>,
        descriptor: Option<&str>,
    ) -> bool {
        let QueryKind::Member {
            owner: owner_slot,
            name: name_slot,
            descriptor: descriptor_slot,
        } = &self.kind
        else {
            return false;
        };

        // A bare type site cannot satisfy a query that names a member.
        if name.is_none() && name_slot.target().is_some() {
            return false;
        }
        if descriptor.is_none() && descriptor_slot.target().is_some() {
            return false;
        }

        owner_slot.is_satisfied(owner)
            && name_slot.is_satisfied(name)
            && descriptor_slot.is_satisfied(descriptor)
    }

    /// Binds a visitor pipeline to `sink`, rooted at `class_path`.
    pub fn visitor<'a, S: ResultSink + ?Sized>(
        &'a self,
        sink: &'a mut S,
        class_path: PathNode,
    ) -> ReferenceVisitor<'a, S> {
        ReferenceVisitor::new(self, sink, class_path)
    }

    /// Walks one class, rooting locations at the class's own name.
    pub fn search<C, S>(&self, class: &C, sink: &mut S) -> Result<(), SearchError>
    where
        C: ClassSource + ?Sized,
        S: ResultSink + ?Sized,
    {
        let class_path = PathNode::class(class.class_file().name.as_str());
        self.visitor(sink, class_path).visit(class)
    }

    pub fn describe(&self) -> QueryDescription {
        match &self.kind {
            QueryKind::Class { owner } => QueryDescription {
                kind: "class",
                owner: owner.target().map(str::to_string),
                owner_mode: owner.mode(),
                name: None,
                name_mode: None,
                descriptor: None,
                descriptor_mode: None,
            },
            QueryKind::Member {
                owner,
                name,
                descriptor,
            } => QueryDescription {
                kind: "member",
                owner: owner.target().map(str::to_string),
                owner_mode: owner.mode(),
                name: name.target().map(str::to_string),
                name_mode: Some(name.mode()),
                descriptor: descriptor.target().map(str::to_string),
                descriptor_mode: Some(descriptor.mode()),
            },
        }
    }
}

/// Serializable summary of a query, echoed in CLI output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescription {
    pub kind: &'static str,
    pub owner: Option<String>,
    pub owner_mode: TextMatchMode,
    pub name: Option<String>,
    pub name_mode: Option<TextMatchMode>,
    pub descriptor: Option<String>,
    pub descriptor_mode: Option<TextMatchMode>,
}

/// Runs a query over one class. This is the seam the fan-out driver uses.
pub trait ClassQuery: Sync {
    fn visit(
        &self,
        sink: &mut dyn ResultSink,
        class_path: PathNode,
        class: &dyn ClassSource,
    ) -> Result<(), SearchError>;
}

impl ClassQuery for ReferenceQuery {
    fn visit(
        &self,
        sink: &mut dyn ResultSink,
        class_path: PathNode,
        class: &dyn ClassSource,
    ) -> Result<(), SearchError> {
        self.visitor(sink, class_path).visit(class)
    }
}

/// Compact member target, `owner.name` optionally followed by a descriptor.
///
/// `com/Util.helper(I)Z`, `com.Util.helper`, and `com/Foo.bar Lcom/Bar;` are
/// all accepted. The owner is kept as written; the name is whatever follows
/// its last dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberTarget {
    pub owner: String,
    pub name: String,
    pub descriptor: Option<String>,
}

impl MemberTarget {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (head, descriptor) = match raw.find(['(', ' ']) {
            Some(pos) => (&raw[..pos], Some(raw[pos..].trim().to_string())),
            None => (raw, None),
        };
        let (owner, name) = head.rsplit_once('.')?;
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.filter(|d| !d.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TextMatchMode::*;

    #[test]
    fn class_query_matches_only_class_sites() {
        let q = ReferenceQuery::class(Equal, Some("com/Bar"));
        assert!(q.is_class_ref_only());
        assert!(q.is_class_ref_match(Some("com/Bar")));
        assert!(!q.is_class_ref_match(Some("com/Baz")));
        assert!(!q.is_member_ref_match(Some("com/Bar"), Some("x"), Some("I")));

        let any = ReferenceQuery::class(Equal, None);
        assert!(any.is_class_ref_match(Some("whatever")));
        let empty = ReferenceQuery::class(Equal, Some(""));
        assert!(empty.is_class_ref_match(Some("whatever")));
    }

    #[test]
    fn member_query_never_matches_class_sites() {
        let q = ReferenceQuery::member(Equal, Some("com/Bar"), None, None);
        assert!(!q.is_class_ref_match(Some("com/Bar")));
    }

    #[test]
    fn owner_only_matches_any_member_of_owner() {
        let q = ReferenceQuery::member(Equal, Some("com/Util"), None, None);
        assert!(q.is_member_ref_match(Some("com/Util"), Some("helper"), Some("(I)Z")));
        assert!(q.is_member_ref_match(Some("com/Util"), Some("count"), Some("I")));
        assert!(!q.is_member_ref_match(Some("com/Other"), Some("helper"), Some("(I)Z")));
    }

    #[test]
    fn descriptor_only_matches_every_owner_and_name() {
        let q = ReferenceQuery::member(Equal, None, None, Some("(I)Z"));
        assert!(q.is_member_ref_match(Some("com/A"), Some("a"), Some("(I)Z")));
        assert!(q.is_member_ref_match(Some("com/B"), Some("b"), Some("(I)Z")));
        assert!(!q.is_member_ref_match(Some("com/B"), Some("b"), Some("(J)Z")));
    }

    #[test]
    fn named_query_rejects_bare_type_sites() {
        let q = ReferenceQuery::member(Equal, Some("com/A"), Some("a"), None);
        assert!(!q.is_member_ref_match(Some("com/A"), None, Some("I")));

        let q = ReferenceQuery::member(Equal, None, None, Some("I"));
        assert!(!q.is_member_ref_match(Some("com/A"), Some("a"), None));
    }

    #[test]
    fn independent_modes_apply_per_slot() {
        let q = ReferenceQuery::member_with_modes(
            Contains,
            StartsWith,
            Equal,
            Some("Util"),
            Some("help"),
            Some("(I)Z"),
        );
        assert!(q.is_member_ref_match(Some("com/Util"), Some("helper"), Some("(I)Z")));
        assert!(!q.is_member_ref_match(Some("com/Util"), Some("unhelpful"), Some("(I)Z")));
        assert_eq!(q.target_name(), Some("help"));
        assert_eq!(q.describe().descriptor_mode, Some(Equal));
    }

    #[test]
    fn query_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReferenceQuery>();
    }

    #[test]
    fn parses_member_targets() {
        assert_eq!(
            MemberTarget::parse("com/Util.helper(I)Z"),
            Some(MemberTarget {
                owner: "com/Util".to_string(),
                name: "helper".to_string(),
                descriptor: Some("(I)Z".to_string()),
            })
        );
        assert_eq!(
            MemberTarget::parse("com.example.Util.helper"),
            Some(MemberTarget {
                owner: "com.example.Util".to_string(),
                name: "helper".to_string(),
                descriptor: None,
            })
        );
        assert_eq!(
            MemberTarget::parse("com/Foo.bar Lcom/Bar;").and_then(|t| t.descriptor),
            Some("Lcom/Bar;".to_string())
        );
        assert_eq!(MemberTarget::parse("helper"), None);
        assert_eq!(MemberTarget::parse(".helper"), None);
    }
}
