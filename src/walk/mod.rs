//! The visitor pipeline: one structural pass over a class, evaluating the
//! query at every site that can name a class or member.
//!
//! Matches at a site are gathered first and the site's path node is only
//! built when something matched, so a walk over a class with no hits
//! allocates no instruction or handler nodes.

mod annotation;
mod method;

use crate::classfile::{ClassFile, Constant, ConstantDynamic, FieldInfo, Handle, MethodInfo};
use crate::descriptor;
use crate::error::SearchError;
use crate::path::{MemberDeclaration, PathNode};
use crate::query::ReferenceQuery;
use crate::result::{Reference, ResultSink};

use method::MethodWalker;

/// A parsed class the pipeline can walk.
///
/// Member lookups default to the class's own member tables. Wrappers that
/// resolve members differently (or not at all) override them.
pub trait ClassSource {
    fn class_file(&self) -> &ClassFile;

    fn declared_field(&self, name: &str, descriptor: &str) -> Option<&FieldInfo> {
        self.class_file().field(name, descriptor)
    }

    fn declared_method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.class_file().method(name, descriptor)
    }
}

impl ClassSource for ClassFile {
    fn class_file(&self) -> &ClassFile {
        self
    }
}

/// Query bound to a sink and a class root path. Walks exactly one class.
pub struct ReferenceVisitor<'a, S: ResultSink + ?Sized> {
    emitter: Emitter<'a, S>,
    class_path: PathNode,
}

impl<'a, S: ResultSink + ?Sized> ReferenceVisitor<'a, S> {
    pub fn new(query: &'a ReferenceQuery, sink: &'a mut S, class_path: PathNode) -> Self {
        Self {
            emitter: Emitter { query, sink },
            class_path,
        }
    }

    pub fn visit<C: ClassSource + ?Sized>(mut self, source: &C) -> Result<(), SearchError> {
        let class = source.class_file();
        let root = self.class_path.clone();

        for annotation in &class.annotations {
            self.emitter.annotation(&root, annotation)?;
        }
        for typed in &class.type_annotations {
            self.emitter.annotation(&root, &typed.annotation)?;
        }

        for field in &class.fields {
            self.visit_field(source, field)?;
        }
        for method in &class.methods {
            self.visit_method(source, method)?;
        }
        Ok(())
    }

    fn visit_field<C: ClassSource + ?Sized>(
        &mut self,
        source: &C,
        field: &FieldInfo,
    ) -> Result<(), SearchError> {
        let node = self
            .class_path
            .child_member(MemberDeclaration::field(field))?;

        match source.declared_field(&field.name, &field.descriptor) {
            Some(resolved) => {
                let mut hits = self.emitter.hits();
                if descriptor::is_valid_field_desc(&resolved.descriptor) {
                    if let Some(name) = descriptor::class_name(&resolved.descriptor) {
                        hits.class(name);
                    }
                }
                let refs = hits.finish();
                self.emitter.emit(&node, refs);
            }
            None => tracing::error!(
                "Failed to lookup field for query: {}.{} {}",
                source.class_file().name,
                field.name,
                field.descriptor
            ),
        }

        for annotation in &field.annotations {
            self.emitter.annotation(&node, annotation)?;
        }
        for typed in &field.type_annotations {
            self.emitter.annotation(&node, &typed.annotation)?;
        }
        Ok(())
    }

    fn visit_method<C: ClassSource + ?Sized>(
        &mut self,
        source: &C,
        method: &MethodInfo,
    ) -> Result<(), SearchError> {
        let node = self
            .class_path
            .child_member(MemberDeclaration::method(method))?;

        match source.declared_method(&method.name, &method.descriptor) {
            Some(resolved) => {
                for exception in &resolved.exceptions {
                    let mut hits = self.emitter.hits();
                    if let Some(name) = descriptor::class_of_internal(exception) {
                        hits.class(name);
                    }
                    let refs = hits.finish();
                    if !refs.is_empty() {
                        let thrown = node.child_thrown(exception)?;
                        self.emitter.emit(&thrown, refs);
                    }
                }

                let mut hits = self.emitter.hits();
                hits.first_descriptor_type(&resolved.descriptor);
                let refs = hits.finish();
                self.emitter.emit(&node, refs);
            }
            None => tracing::error!(
                "Failed to lookup method for query: {}.{}{}",
                source.class_file().name,
                method.name,
                method.descriptor
            ),
        }

        MethodWalker::new(&mut self.emitter, node).walk(method)
    }
}

/// The query plus the sink it reports into.
pub(crate) struct Emitter<'a, S: ResultSink + ?Sized> {
    query: &'a ReferenceQuery,
    sink: &'a mut S,
}

impl<'a, S: ResultSink + ?Sized> Emitter<'a, S> {
    fn hits(&self) -> Hits<'a> {
        Hits {
            query: self.query,
            refs: Vec::new(),
        }
    }

    fn emit(&mut self, node: &PathNode, refs: Vec<Reference>) {
        for reference in refs {
            self.sink.accept(node.clone(), reference);
        }
    }
}

/// Matches found at one site, in evaluation order.
pub(crate) struct Hits<'q> {
    query: &'q ReferenceQuery,
    refs: Vec<Reference>,
}

impl Hits<'_> {
    fn finish(self) -> Vec<Reference> {
        self.refs
    }

    fn class(&mut self, name: &str) -> bool {
        let matched = self.query.is_class_ref_match(Some(name));
        if matched {
            self.refs.push(Reference::class(name));
        }
        matched
    }

    fn member(&mut self, owner: &str, name: &str, descriptor: &str) {
        if self
            .query
            .is_member_ref_match(Some(owner), Some(name), Some(descriptor))
        {
            self.refs.push(Reference::member(owner, name, descriptor));
        }
    }

    /// Every class a descriptor names: return type, then each parameter.
    fn descriptor_types(&mut self, desc: &str) {
        for name in descriptor::referenced_classes(desc) {
            self.class(name);
        }
    }

    /// Like [`Hits::descriptor_types`], but stops after the first match.
    fn first_descriptor_type(&mut self, desc: &str) {
        for name in descriptor::referenced_classes(desc) {
            if self.class(name) {
                break;
            }
        }
    }

    fn handle(&mut self, handle: &Handle) {
        self.member(&handle.owner, &handle.name, &handle.descriptor);
        self.descriptor_types(&handle.descriptor);
    }

    fn constant(&mut self, constant: &Constant) {
        match constant {
            Constant::Class(name) => {
                if let Some(name) = descriptor::class_of_internal(name) {
                    self.class(name);
                }
            }
            Constant::MethodType(desc) => self.descriptor_types(desc),
            Constant::MethodHandle(handle) => self.handle(handle),
            Constant::Dynamic(dynamic) => self.dynamic(dynamic),
            Constant::Integer(_)
            | Constant::Float(_)
            | Constant::Long(_)
            | Constant::Double(_)
            | Constant::String(_) => {}
        }
    }

    /// Bootstrap handle, then each static argument.
    fn dynamic(&mut self, dynamic: &ConstantDynamic) {
        self.handle(&dynamic.bootstrap);
        for argument in &dynamic.arguments {
            self.constant(argument);
        }
    }
}
