use serde::Serialize;

use super::constant_pool::{Constant, ConstantPool};
use super::reader::Cursor;
use crate::error::ClassFileError;

type Result<T> = std::result::Result<T, ClassFileError>;

/// Deepest chain of nested annotation and array values accepted.
pub const MAX_ANNOTATION_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub descriptor: String,
    pub visible: bool,
    pub elements: Vec<ElementPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementPair {
    pub name: String,
    pub value: ElementValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementValue {
    Const { tag: char, value: Constant },
    Enum { descriptor: String, constant: String },
    /// Return descriptor of a class literal, e.g. `Lcom/Foo;` or `V`.
    Class(String),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

/// Where a type annotation applies, as far as the reference walk cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTarget {
    /// Declaration-level targets (supertypes, parameters, returns, throws, bounds).
    Declaration(u8),
    /// Local variable or resource variable, by local slot.
    LocalVariable { kind: u8, slots: Vec<u16> },
    /// Exception-table entry index.
    Catch(u16),
    /// Bytecode offset of the annotated instruction.
    Offset { kind: u8, offset: u16 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAnnotation {
    pub target: TypeTarget,
    pub annotation: Annotation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterAnnotation {
    pub parameter: u8,
    pub annotation: Annotation,
}

pub(crate) fn read_annotations(
    cursor: &mut Cursor<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<Vec<Annotation>> {
    let count = cursor.u16()?;
    (0..count)
        .map(|_| read_annotation(cursor, pool, visible, 0))
        .collect()
}

pub(crate) fn read_parameter_annotations(
    cursor: &mut Cursor<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<Vec<ParameterAnnotation>> {
    let params = cursor.u8()?;
    let mut out = Vec::new();
    for parameter in 0..params {
        for annotation in read_annotations(cursor, pool, visible)? {
            out.push(ParameterAnnotation {
                parameter,
                annotation,
            });
        }
    }
    Ok(out)
}

pub(crate) fn read_type_annotations(
    cursor: &mut Cursor<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<Vec<TypeAnnotation>> {
    let count = cursor.u16()?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let target = read_type_target(cursor)?;
        let path_len = cursor.u8()? as usize;
        cursor.skip(path_len * 2)?;
        let annotation = read_annotation(cursor, pool, visible, 0)?;
        out.push(TypeAnnotation { target, annotation });
    }
    Ok(out)
}

fn read_type_target(cursor: &mut Cursor<'_>) -> Result<TypeTarget> {
    let kind = cursor.u8()?;
    Ok(match kind {
        0x00 | 0x01 | 0x16 => {
            cursor.skip(1)?;
            TypeTarget::Declaration(kind)
        }
        0x10..=0x12 | 0x17 => {
            cursor.skip(2)?;
            TypeTarget::Declaration(kind)
        }
        0x13..=0x15 => TypeTarget::Declaration(kind),
        0x40 | 0x41 => {
            let len = cursor.u16()?;
            let mut slots = Vec::with_capacity(len as usize);
            for _ in 0..len {
                cursor.skip(4)?;
                slots.push(cursor.u16()?);
            }
            TypeTarget::LocalVariable { kind, slots }
        }
        0x42 => TypeTarget::Catch(cursor.u16()?),
        0x43..=0x46 => TypeTarget::Offset {
            kind,
            offset: cursor.u16()?,
        },
        0x47..=0x4b => {
            let offset = cursor.u16()?;
            cursor.skip(1)?;
            TypeTarget::Offset { kind, offset }
        }
        _ => return Err(ClassFileError::BadTypeTarget(kind)),
    })
}

fn read_annotation(
    cursor: &mut Cursor<'_>,
    pool: &ConstantPool,
    visible: bool,
    depth: usize,
) -> Result<Annotation> {
    let descriptor = pool.utf8(cursor.u16()?)?.to_string();
    let count = cursor.u16()?;
    let mut elements = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = pool.utf8(cursor.u16()?)?.to_string();
        let value = read_value(cursor, pool, visible, depth)?;
        elements.push(ElementPair { name, value });
    }
    Ok(Annotation {
        descriptor,
        visible,
        elements,
    })
}

pub(crate) fn read_element_value(
    cursor: &mut Cursor<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<ElementValue> {
    read_value(cursor, pool, visible, 0)
}

fn read_value(
    cursor: &mut Cursor<'_>,
    pool: &ConstantPool,
    visible: bool,
    depth: usize,
) -> Result<ElementValue> {
    let tag = cursor.u8()? as char;
    Ok(match tag {
        'B' | 'C' | 'I' | 'S' | 'Z' => ElementValue::Const {
            tag,
            value: Constant::Integer(pool.integer(cursor.u16()?)?),
        },
        'J' => ElementValue::Const {
            tag,
            value: Constant::Long(pool.long(cursor.u16()?)?),
        },
        'F' => ElementValue::Const {
            tag,
            value: Constant::Float(pool.float(cursor.u16()?)?),
        },
        'D' => ElementValue::Const {
            tag,
            value: Constant::Double(pool.double(cursor.u16()?)?),
        },
        's' => ElementValue::Const {
            tag,
            value: Constant::String(pool.utf8(cursor.u16()?)?.to_string()),
        },
        'e' => ElementValue::Enum {
            descriptor: pool.utf8(cursor.u16()?)?.to_string(),
            constant: pool.utf8(cursor.u16()?)?.to_string(),
        },
        'c' => ElementValue::Class(pool.utf8(cursor.u16()?)?.to_string()),
        '@' => ElementValue::Annotation(read_annotation(cursor, pool, visible, nested(depth)?)?),
        '[' => {
            let depth = nested(depth)?;
            let count = cursor.u16()?;
            let values = (0..count)
                .map(|_| read_value(cursor, pool, visible, depth))
                .collect::<Result<Vec<_>>>()?;
            ElementValue::Array(values)
        }
        other => return Err(ClassFileError::BadElementTag(other)),
    })
}

fn nested(depth: usize) -> Result<usize> {
    if depth >= MAX_ANNOTATION_DEPTH {
        return Err(ClassFileError::AnnotationTooDeep(MAX_ANNOTATION_DEPTH));
    }
    Ok(depth + 1)
}
