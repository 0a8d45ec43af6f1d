use super::Emitter;
use crate::classfile::{Annotation, ElementValue};
use crate::descriptor;
use crate::error::SearchError;
use crate::path::{AnnotationInfo, PathNode};
use crate::result::{Reference, ResultSink};

impl<S: ResultSink + ?Sized> Emitter<'_, S> {
    /// Walks one annotation application under `parent`, depth-first.
    ///
    /// The annotation gets its own path node even when nothing matches,
    /// since nested values hang off it. Only class, member, and annotation
    /// nodes may parent it.
    pub(super) fn annotation(
        &mut self,
        parent: &PathNode,
        annotation: &Annotation,
    ) -> Result<(), SearchError> {
        let node = parent.child_annotation(AnnotationInfo::from(annotation))?;

        let mut hits = self.hits();
        if let Some(name) = descriptor::class_name(&annotation.descriptor) {
            hits.class(name);
        }
        let refs = hits.finish();
        self.emit(&node, refs);

        for pair in &annotation.elements {
            self.element_value(&node, &pair.value)?;
        }
        Ok(())
    }

    pub(super) fn element_value(
        &mut self,
        node: &PathNode,
        value: &ElementValue,
    ) -> Result<(), SearchError> {
        match value {
            ElementValue::Const { .. } => {}
            ElementValue::Enum {
                descriptor: desc,
                constant,
            } => {
                // Enum type sits in the name slot and the constant in the
                // descriptor slot.
                let Some(owner) = descriptor::class_name(desc) else {
                    return Ok(());
                };
                if self
                    .query
                    .is_member_ref_match(Some(owner), Some(desc), Some(constant))
                {
                    let reference = Reference::member(owner, constant, desc);
                    self.sink.accept(node.clone(), reference);
                }
            }
            ElementValue::Class(desc) => {
                let mut hits = self.hits();
                if let Some(name) = descriptor::class_name(desc) {
                    hits.class(name);
                }
                let refs = hits.finish();
                self.emit(node, refs);
            }
            ElementValue::Annotation(nested) => self.annotation(node, nested)?,
            ElementValue::Array(values) => {
                for value in values {
                    self.element_value(node, value)?;
                }
            }
        }
        Ok(())
    }
}
