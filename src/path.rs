//! Location paths: immutable chains addressing where inside a class a
//! reference was found.
//!
//! Every node wraps exactly one [`PathElement`] plus its parent. Which element
//! may sit under which is fixed by [`PathElement::accepts_parent`]; extending a
//! node any other way is a [`PathError`].

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::classfile::{Annotation, FieldInfo, Instruction, LocalVariable, MethodInfo};
use crate::error::PathError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Method,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDeclaration {
    pub kind: MemberKind,
    pub name: String,
    pub descriptor: String,
}

impl MemberDeclaration {
    pub fn field(field: &FieldInfo) -> Self {
        Self {
            kind: MemberKind::Field,
            name: field.name.clone(),
            descriptor: field.descriptor.clone(),
        }
    }

    pub fn method(method: &MethodInfo) -> Self {
        Self {
            kind: MemberKind::Method,
            name: method.name.clone(),
            descriptor: method.descriptor.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationInfo {
    pub descriptor: String,
    pub visible: bool,
}

impl From<&Annotation> for AnnotationInfo {
    fn from(annotation: &Annotation) -> Self {
        Self {
            descriptor: annotation.descriptor.clone(),
            visible: annotation.visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum PathElement {
    Class { name: String },
    Member(MemberDeclaration),
    Instruction { index: usize, instruction: Instruction },
    Handler { catch_type: String },
    Thrown { exception: String },
    LocalVariable(LocalVariable),
    Annotation(AnnotationInfo),
}

impl PathElement {
    pub fn kind_name(&self) -> &'static str {
        match self {
            PathElement::Class { .. } => "class",
            PathElement::Member(_) => "member",
            PathElement::Instruction { .. } => "instruction",
            PathElement::Handler { .. } => "handler",
            PathElement::Thrown { .. } => "thrown",
            PathElement::LocalVariable(_) => "local variable",
            PathElement::Annotation(_) => "annotation",
        }
    }

    /// Legal parent kinds for this element. Classes are only ever roots.
    pub fn accepts_parent(&self, parent: &PathElement) -> bool {
        match self {
            PathElement::Class { .. } => false,
            PathElement::Member(_) => matches!(parent, PathElement::Class { .. }),
            PathElement::Instruction { .. }
            | PathElement::Handler { .. }
            | PathElement::Thrown { .. }
            | PathElement::LocalVariable(_) => matches!(
                parent,
                PathElement::Member(MemberDeclaration {
                    kind: MemberKind::Method,
                    ..
                })
            ),
            PathElement::Annotation(_) => matches!(
                parent,
                PathElement::Class { .. } | PathElement::Member(_) | PathElement::Annotation(_)
            ),
        }
    }
}

#[derive(Debug, PartialEq)]
struct Node {
    parent: Option<PathNode>,
    element: PathElement,
}

/// Cheap-to-clone handle on one node of a location path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathNode(Arc<Node>);

impl PathNode {
    pub fn class(name: impl Into<String>) -> Self {
        Self(Arc::new(Node {
            parent: None,
            element: PathElement::Class { name: name.into() },
        }))
    }

    pub fn parent(&self) -> Option<&PathNode> {
        self.0.parent.as_ref()
    }

    pub fn element(&self) -> &PathElement {
        &self.0.element
    }

    /// This node, then each parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &PathNode> {
        std::iter::successors(Some(self), |node| node.parent())
    }

    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    pub fn root(&self) -> &PathNode {
        self.ancestors().last().unwrap_or(self)
    }

    pub fn class_name(&self) -> Option<&str> {
        match self.root().element() {
            PathElement::Class { name } => Some(name),
            _ => None,
        }
    }

    pub fn child(&self, element: PathElement) -> Result<PathNode, PathError> {
        if !element.accepts_parent(self.element()) {
            return Err(PathError::IllegalParent {
                parent: self.element().kind_name(),
                child: element.kind_name(),
            });
        }
        Ok(Self(Arc::new(Node {
            parent: Some(self.clone()),
            element,
        })))
    }

    pub fn child_member(&self, member: MemberDeclaration) -> Result<PathNode, PathError> {
        self.child(PathElement::Member(member))
    }

    pub fn child_instruction(
        &self,
        index: usize,
        instruction: Instruction,
    ) -> Result<PathNode, PathError> {
        self.child(PathElement::Instruction { index, instruction })
    }

    pub fn child_handler(&self, catch_type: &str) -> Result<PathNode, PathError> {
        self.child(PathElement::Handler {
            catch_type: catch_type.to_string(),
        })
    }

    pub fn child_thrown(&self, exception: &str) -> Result<PathNode, PathError> {
        self.child(PathElement::Thrown {
            exception: exception.to_string(),
        })
    }

    pub fn child_variable(&self, variable: LocalVariable) -> Result<PathNode, PathError> {
        self.child(PathElement::LocalVariable(variable))
    }

    pub fn child_annotation(&self, annotation: AnnotationInfo) -> Result<PathNode, PathError> {
        self.child(PathElement::Annotation(annotation))
    }

    /// Elements from the root class down to this node.
    pub fn elements(&self) -> Vec<&PathElement> {
        let mut elements: Vec<&PathElement> = self.ancestors().map(PathNode::element).collect();
        elements.reverse();
        elements
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Class { name } => f.write_str(name),
            PathElement::Member(member) => match member.kind {
                MemberKind::Method => write!(f, "{}{}", member.name, member.descriptor),
                MemberKind::Field => write!(f, "{} {}", member.name, member.descriptor),
            },
            PathElement::Instruction { index, instruction } => {
                write!(f, "[{index}] {instruction}")
            }
            PathElement::Handler { catch_type } => write!(f, "catch {catch_type}"),
            PathElement::Thrown { exception } => write!(f, "throws {exception}"),
            PathElement::LocalVariable(var) => {
                write!(f, "local {} {} {}", var.index, var.name, var.descriptor)
            }
            PathElement::Annotation(annotation) => {
                write!(f, "@{}", annotation.descriptor)?;
                if !annotation.visible {
                    f.write_str(" (invisible)")?;
                }
                Ok(())
            }
        }
    }
}

/// Breadcrumb form: `com/Foo > baz()V > [3] invokestatic com/Util.helper(I)Z`.
impl fmt::Display for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements().into_iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{element}")?;
        }
        Ok(())
    }
}

impl Serialize for PathNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let elements = self.elements();
        let mut seq = serializer.serialize_seq(Some(elements.len()))?;
        for element in elements {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::{MemberRef, Operand};

    fn method(name: &str, descriptor: &str) -> MemberDeclaration {
        MemberDeclaration {
            kind: MemberKind::Method,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    fn annotation(descriptor: &str) -> AnnotationInfo {
        AnnotationInfo {
            descriptor: descriptor.to_string(),
            visible: true,
        }
    }

    #[test]
    fn builds_chain_and_breadcrumb() {
        let class = PathNode::class("com/Foo");
        let member = class.child_member(method("baz", "()V")).unwrap();
        let insn = member
            .child_instruction(
                3,
                Instruction {
                    offset: 7,
                    opcode: crate::classfile::code::INVOKESTATIC,
                    operand: Operand::Method {
                        member: MemberRef {
                            owner: "com/Util".to_string(),
                            name: "helper".to_string(),
                            descriptor: "(I)Z".to_string(),
                        },
                        interface: false,
                    },
                },
            )
            .unwrap();

        assert_eq!(insn.depth(), 3);
        assert_eq!(insn.parent(), Some(&member));
        assert_eq!(insn.class_name(), Some("com/Foo"));
        assert_eq!(
            insn.to_string(),
            "com/Foo > baz()V > [3] invokestatic com/Util.helper(I)Z"
        );
    }

    #[test]
    fn annotations_nest_under_class_member_and_annotation_only() {
        let class = PathNode::class("com/Foo");
        let on_class = class.child_annotation(annotation("Lcom/Ann;")).unwrap();
        let nested = on_class.child_annotation(annotation("Lcom/Nested;")).unwrap();
        assert_eq!(nested.parent(), Some(&on_class));

        let member = class.child_member(method("baz", "()V")).unwrap();
        let handler = member.child_handler("java/io/IOException").unwrap();
        assert_eq!(
            handler.child_annotation(annotation("Lcom/Ann;")),
            Err(PathError::IllegalParent {
                parent: "handler",
                child: "annotation",
            })
        );
    }

    #[test]
    fn body_elements_require_a_method_parent() {
        let class = PathNode::class("com/Foo");
        assert!(class.child_handler("java/lang/Exception").is_err());

        let field = class
            .child_member(MemberDeclaration {
                kind: MemberKind::Field,
                name: "bar".to_string(),
                descriptor: "Lcom/Bar;".to_string(),
            })
            .unwrap();
        assert!(field.child_thrown("java/lang/Exception").is_err());
        assert!(field.child_member(method("x", "()V")).is_err());
        assert_eq!(field.to_string(), "com/Foo > bar Lcom/Bar;");
    }

    #[test]
    fn serializes_root_to_leaf() {
        let path = PathNode::class("com/Foo")
            .child_member(method("baz", "()V"))
            .unwrap()
            .child_thrown("java/io/IOException")
            .unwrap();
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json[0]["element"], "class");
        assert_eq!(json[0]["name"], "com/Foo");
        assert_eq!(json[1]["element"], "member");
        assert_eq!(json[1]["kind"], "method");
        assert_eq!(json[1]["name"], "baz");
        assert_eq!(json[2]["exception"], "java/io/IOException");
    }
}
