//! In-memory class model and the reader that builds it from `.class` bytes.
//!
//! The model keeps what the reference walk needs in declaration order:
//! members, their annotations, decoded bytecode, exception tables, and local
//! variable tables. Visible annotations precede invisible ones, matching how
//! the JVM's own readers report them.

pub mod annotation;
pub mod code;
pub mod constant_pool;
pub(crate) mod reader;

use serde::Serialize;

pub use annotation::{
    Annotation, ElementPair, ElementValue, ParameterAnnotation, TypeAnnotation, TypeTarget,
};
pub use code::{Instruction, Operand};
pub use constant_pool::{Constant, ConstantDynamic, ConstantPool, Handle, MemberRef};

use crate::error::ClassFileError;
use annotation::{
    read_annotations, read_element_value, read_parameter_annotations, read_type_annotations,
};
use reader::Cursor;

type Result<T> = std::result::Result<T, ClassFileError>;

const MAGIC: u32 = 0xcafe_babe;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub annotations: Vec<Annotation>,
    pub type_annotations: Vec<TypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
    pub type_annotations: Vec<TypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub annotation_default: Option<ElementValue>,
    pub annotations: Vec<Annotation>,
    pub type_annotations: Vec<TypeAnnotation>,
    pub parameter_annotations: Vec<ParameterAnnotation>,
    pub code: Option<Code>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub instructions: Vec<Instruction>,
    pub exception_table: Vec<ExceptionHandler>,
    pub local_variables: Vec<LocalVariable>,
    pub type_annotations: Vec<TypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// `None` for catch-all (`finally`) handlers.
    pub catch_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalVariable {
    pub index: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub start_pc: u16,
    pub length: u16,
}

impl ClassFile {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let magic = cursor.u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::BadMagic(magic));
        }
        let minor_version = cursor.u16()?;
        let major_version = cursor.u16()?;
        let mut pool = ConstantPool::parse(&mut cursor)?;

        let access_flags = cursor.u16()?;
        let name = pool.class_name(cursor.u16()?)?.to_string();
        let super_name = pool.optional_class_name(cursor.u16()?)?.map(str::to_string);
        let interface_count = cursor.u16()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(pool.class_name(cursor.u16()?)?.to_string());
        }

        // Class attributes follow the members, but bootstrap methods must be
        // known before any code is decoded.
        let members_start = cursor.pos();
        skip_members(&mut cursor)?;
        skip_members(&mut cursor)?;

        let mut annotations = Annotations::default();
        let attribute_count = cursor.u16()?;
        for _ in 0..attribute_count {
            let (attr_name, mut body) = read_attribute(&mut cursor, &pool)?;
            let attr_name = attr_name.to_string();
            match attr_name.as_str() {
                "BootstrapMethods" => pool.read_bootstrap_methods(&mut body)?,
                other => annotations.read(other, &mut body, &pool)?,
            }
        }

        let mut cursor = Cursor::at(data, members_start);
        let field_count = cursor.u16()?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            fields.push(read_field(&mut cursor, &pool)?);
        }
        let method_count = cursor.u16()?;
        let mut methods = Vec::with_capacity(method_count as usize);
        for _ in 0..method_count {
            methods.push(read_method(&mut cursor, &pool)?);
        }

        let (annotations, type_annotations, _) = annotations.finish();
        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            name,
            super_name,
            interfaces,
            fields,
            methods,
            annotations,
            type_annotations,
        })
    }

    pub fn field(&self, name: &str, descriptor: &str) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| f.name == name && f.descriptor == descriptor)
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }
}

fn skip_members(cursor: &mut Cursor<'_>) -> Result<()> {
    let count = cursor.u16()?;
    for _ in 0..count {
        cursor.skip(6)?;
        let attributes = cursor.u16()?;
        for _ in 0..attributes {
            cursor.skip(2)?;
            let len = cursor.u32()? as usize;
            cursor.skip(len)?;
        }
    }
    Ok(())
}

fn read_attribute<'a, 'p>(
    cursor: &mut Cursor<'a>,
    pool: &'p ConstantPool,
) -> Result<(&'p str, Cursor<'a>)> {
    let name = pool.utf8(cursor.u16()?)?;
    let len = cursor.u32()? as usize;
    let body = cursor.bytes(len)?;
    Ok((name, Cursor::new(body)))
}

/// Visible and invisible annotation attributes, merged visible-first.
#[derive(Default)]
struct Annotations {
    visible: Vec<Annotation>,
    invisible: Vec<Annotation>,
    visible_type: Vec<TypeAnnotation>,
    invisible_type: Vec<TypeAnnotation>,
    visible_parameter: Vec<ParameterAnnotation>,
    invisible_parameter: Vec<ParameterAnnotation>,
}

impl Annotations {
    /// Reads the attribute if it is an annotation attribute; ignores it otherwise.
    fn read(&mut self, name: &str, body: &mut Cursor<'_>, pool: &ConstantPool) -> Result<()> {
        match name {
            "RuntimeVisibleAnnotations" => self.visible = read_annotations(body, pool, true)?,
            "RuntimeInvisibleAnnotations" => {
                self.invisible = read_annotations(body, pool, false)?
            }
            "RuntimeVisibleTypeAnnotations" => {
                self.visible_type = read_type_annotations(body, pool, true)?
            }
            "RuntimeInvisibleTypeAnnotations" => {
                self.invisible_type = read_type_annotations(body, pool, false)?
            }
            "RuntimeVisibleParameterAnnotations" => {
                self.visible_parameter = read_parameter_annotations(body, pool, true)?
            }
            "RuntimeInvisibleParameterAnnotations" => {
                self.invisible_parameter = read_parameter_annotations(body, pool, false)?
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(
        mut self,
    ) -> (
        Vec<Annotation>,
        Vec<TypeAnnotation>,
        Vec<ParameterAnnotation>,
    ) {
        self.visible.append(&mut self.invisible);
        self.visible_type.append(&mut self.invisible_type);
        self.visible_parameter.append(&mut self.invisible_parameter);
        (self.visible, self.visible_type, self.visible_parameter)
    }
}

fn read_field(cursor: &mut Cursor<'_>, pool: &ConstantPool) -> Result<FieldInfo> {
    let access_flags = cursor.u16()?;
    let name = pool.utf8(cursor.u16()?)?.to_string();
    let descriptor = pool.utf8(cursor.u16()?)?.to_string();
    let mut signature = None;
    let mut annotations = Annotations::default();

    let attribute_count = cursor.u16()?;
    for _ in 0..attribute_count {
        let (attr_name, mut body) = read_attribute(cursor, pool)?;
        match attr_name {
            "Signature" => signature = Some(pool.utf8(body.u16()?)?.to_string()),
            _ => annotations.read(attr_name, &mut body, pool)?,
        }
    }

    let (annotations, type_annotations, _) = annotations.finish();
    Ok(FieldInfo {
        access_flags,
        name,
        descriptor,
        signature,
        annotations,
        type_annotations,
    })
}

fn read_method(cursor: &mut Cursor<'_>, pool: &ConstantPool) -> Result<MethodInfo> {
    let access_flags = cursor.u16()?;
    let name = pool.utf8(cursor.u16()?)?.to_string();
    let descriptor = pool.utf8(cursor.u16()?)?.to_string();
    let mut signature = None;
    let mut exceptions = Vec::new();
    let mut annotation_default = None;
    let mut code = None;
    let mut annotations = Annotations::default();

    let attribute_count = cursor.u16()?;
    for _ in 0..attribute_count {
        let (attr_name, mut body) = read_attribute(cursor, pool)?;
        match attr_name {
            "Code" => code = Some(read_code(&mut body, pool)?),
            "Exceptions" => {
                let count = body.u16()?;
                for _ in 0..count {
                    exceptions.push(pool.class_name(body.u16()?)?.to_string());
                }
            }
            "Signature" => signature = Some(pool.utf8(body.u16()?)?.to_string()),
            "AnnotationDefault" => {
                annotation_default = Some(read_element_value(&mut body, pool, true)?)
            }
            _ => annotations.read(attr_name, &mut body, pool)?,
        }
    }

    let (annotations, type_annotations, parameter_annotations) = annotations.finish();
    Ok(MethodInfo {
        access_flags,
        name,
        descriptor,
        signature,
        exceptions,
        annotation_default,
        annotations,
        type_annotations,
        parameter_annotations,
        code,
    })
}

fn read_code(cursor: &mut Cursor<'_>, pool: &ConstantPool) -> Result<Code> {
    let max_stack = cursor.u16()?;
    let max_locals = cursor.u16()?;
    let code_len = cursor.u32()? as usize;
    let instructions = code::decode(cursor.bytes(code_len)?, pool)?;

    let handler_count = cursor.u16()?;
    let mut exception_table = Vec::with_capacity(handler_count as usize);
    for _ in 0..handler_count {
        exception_table.push(ExceptionHandler {
            start_pc: cursor.u16()?,
            end_pc: cursor.u16()?,
            handler_pc: cursor.u16()?,
            catch_type: pool.optional_class_name(cursor.u16()?)?.map(str::to_string),
        });
    }

    let mut local_variables = Vec::new();
    let mut signatures = Vec::new();
    let mut annotations = Annotations::default();
    let attribute_count = cursor.u16()?;
    for _ in 0..attribute_count {
        let (attr_name, mut body) = read_attribute(cursor, pool)?;
        match attr_name {
            "LocalVariableTable" => local_variables.extend(read_local_variables(&mut body, pool)?),
            "LocalVariableTypeTable" => signatures.extend(read_local_variables(&mut body, pool)?),
            _ => annotations.read(attr_name, &mut body, pool)?,
        }
    }

    for typed in signatures {
        if let Some(var) = local_variables
            .iter_mut()
            .find(|v| v.index == typed.index && v.start_pc == typed.start_pc)
        {
            var.signature = Some(typed.descriptor);
        }
    }

    let (_, type_annotations, _) = annotations.finish();
    Ok(Code {
        max_stack,
        max_locals,
        instructions,
        exception_table,
        local_variables,
        type_annotations,
    })
}

/// Reads either local variable table shape; for the type table the
/// descriptor slot holds the generic signature.
fn read_local_variables(cursor: &mut Cursor<'_>, pool: &ConstantPool) -> Result<Vec<LocalVariable>> {
    let count = cursor.u16()?;
    let mut vars = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let start_pc = cursor.u16()?;
        let length = cursor.u16()?;
        let name = pool.utf8(cursor.u16()?)?.to_string();
        let descriptor = pool.utf8(cursor.u16()?)?.to_string();
        let index = cursor.u16()?;
        vars.push(LocalVariable {
            index,
            name,
            descriptor,
            signature: None,
            start_pc,
            length,
        });
    }
    Ok(vars)
}
