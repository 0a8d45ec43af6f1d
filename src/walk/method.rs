use super::Emitter;
use crate::classfile::{Code, Instruction, MethodInfo, Operand, TypeTarget};
use crate::descriptor;
use crate::error::SearchError;
use crate::path::PathNode;
use crate::result::ResultSink;

/// Walks one method body. Owns the running instruction index, which starts
/// at zero and advances once per decoded instruction.
pub(super) struct MethodWalker<'e, 'a, S: ResultSink + ?Sized> {
    emitter: &'e mut Emitter<'a, S>,
    member: PathNode,
    index: usize,
}

impl<'e, 'a, S: ResultSink + ?Sized> MethodWalker<'e, 'a, S> {
    pub(super) fn new(emitter: &'e mut Emitter<'a, S>, member: PathNode) -> Self {
        Self {
            emitter,
            member,
            index: 0,
        }
    }

    pub(super) fn walk(mut self, method: &MethodInfo) -> Result<(), SearchError> {
        if let Some(value) = &method.annotation_default {
            self.emitter.element_value(&self.member, value)?;
        }
        for annotation in &method.annotations {
            self.emitter.annotation(&self.member, annotation)?;
        }
        for typed in &method.type_annotations {
            self.emitter.annotation(&self.member, &typed.annotation)?;
        }
        for param in &method.parameter_annotations {
            self.emitter.annotation(&self.member, &param.annotation)?;
        }

        if let Some(code) = &method.code {
            self.walk_code(code)?;
        }
        Ok(())
    }

    fn walk_code(&mut self, code: &Code) -> Result<(), SearchError> {
        for (i, handler) in code.exception_table.iter().enumerate() {
            if let Some(catch_type) = &handler.catch_type {
                let mut hits = self.emitter.hits();
                if let Some(name) = descriptor::class_of_internal(catch_type) {
                    hits.class(name);
                }
                let refs = hits.finish();
                if !refs.is_empty() {
                    let node = self.member.child_handler(catch_type)?;
                    self.emitter.emit(&node, refs);
                }
            }
            for typed in &code.type_annotations {
                if typed.target == TypeTarget::Catch(i as u16) {
                    self.emitter.annotation(&self.member, &typed.annotation)?;
                }
            }
        }

        for insn in &code.instructions {
            self.instruction(insn)?;
            for typed in &code.type_annotations {
                if matches!(typed.target, TypeTarget::Offset { offset, .. } if u32::from(offset) == insn.offset)
                {
                    self.emitter.annotation(&self.member, &typed.annotation)?;
                }
            }
        }

        for var in &code.local_variables {
            if !descriptor::is_valid_field_desc(&var.descriptor) {
                continue;
            }
            let Some(name) = descriptor::class_name(&var.descriptor) else {
                continue;
            };
            let mut hits = self.emitter.hits();
            hits.class(name);
            let refs = hits.finish();
            if !refs.is_empty() {
                let node = self.member.child_variable(var.clone())?;
                self.emitter.emit(&node, refs);
            }
        }
        for typed in &code.type_annotations {
            if matches!(typed.target, TypeTarget::LocalVariable { .. }) {
                self.emitter.annotation(&self.member, &typed.annotation)?;
            }
        }
        Ok(())
    }

    fn instruction(&mut self, insn: &Instruction) -> Result<(), SearchError> {
        let index = self.index;
        self.index += 1;

        let mut hits = self.emitter.hits();
        match &insn.operand {
            Operand::Type(name) => {
                if let Some(name) = descriptor::class_of_internal(name) {
                    hits.class(name);
                }
            }
            Operand::MultiANewArray { descriptor: desc, .. } => {
                if descriptor::is_valid_field_desc(desc) {
                    if let Some(name) = descriptor::class_name(desc) {
                        hits.class(name);
                    }
                }
            }
            Operand::Field(field) => {
                hits.member(&field.owner, &field.name, &field.descriptor);
                hits.descriptor_types(&field.descriptor);
            }
            Operand::Method { member, .. } => {
                hits.member(&member.owner, &member.name, &member.descriptor);
                hits.descriptor_types(&member.descriptor);
            }
            Operand::InvokeDynamic(site) => {
                hits.handle(&site.bootstrap);
                hits.descriptor_types(&site.descriptor);
                for argument in &site.arguments {
                    hits.constant(argument);
                }
            }
            Operand::Constant(constant) => hits.constant(constant),
            Operand::None
            | Operand::Int(_)
            | Operand::Local(_)
            | Operand::Iinc { .. }
            | Operand::Branch(_)
            | Operand::TableSwitch { .. }
            | Operand::LookupSwitch { .. }
            | Operand::NewArray(_) => {}
        }

        let refs = hits.finish();
        if !refs.is_empty() {
            let node = self.member.child_instruction(index, insn.clone())?;
            self.emitter.emit(&node, refs);
        }
        Ok(())
    }
}
