use serde::Serialize;
use std::fmt;

use super::reader::{Cursor, decode_modified_utf8};
use crate::error::ClassFileError;

type Result<T> = std::result::Result<T, ClassFileError>;

const MAX_DYNAMIC_DEPTH: usize = 16;

/// A symbolic field or method reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

/// `CONSTANT_MethodHandle` resolved to its target member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handle {
    pub kind: u8,
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub interface: bool,
}

/// A call site or dynamic constant bound through a bootstrap method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantDynamic {
    pub name: String,
    pub descriptor: String,
    pub bootstrap: Handle,
    pub arguments: Vec<Constant>,
}

/// A loadable constant (`ldc` operand or bootstrap argument).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constant {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    /// Internal name, or an array descriptor for array classes.
    Class(String),
    MethodType(String),
    MethodHandle(Handle),
    Dynamic(Box<ConstantDynamic>),
}

#[derive(Debug, Clone)]
enum Entry {
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef { class: u16, nat: u16 },
    MethodRef { class: u16, nat: u16 },
    InterfaceMethodRef { class: u16, nat: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType(u16),
    Dynamic { bootstrap: u16, nat: u16 },
    InvokeDynamic { bootstrap: u16, nat: u16 },
    ModuleOrPackage,
}

#[derive(Debug, Clone)]
struct BootstrapMethod {
    handle: u16,
    arguments: Vec<u16>,
}

#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Entry>,
    bootstrap_methods: Vec<BootstrapMethod>,
}

impl ConstantPool {
    pub(crate) fn parse(cursor: &mut Cursor<'_>) -> Result<Self> {
        let count = cursor.u16()? as u32;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Entry::Unusable);

        let mut index = 1u32;
        while index < count {
            let tag = cursor.u8()?;
            let entry = match tag {
                1 => {
                    let len = cursor.u16()? as usize;
                    Entry::Utf8(decode_modified_utf8(cursor.bytes(len)?))
                }
                3 => Entry::Integer(cursor.i32()?),
                4 => Entry::Float(f32::from_bits(cursor.u32()?)),
                5 => Entry::Long(cursor.u64()? as i64),
                6 => Entry::Double(f64::from_bits(cursor.u64()?)),
                7 => Entry::Class(cursor.u16()?),
                8 => Entry::String(cursor.u16()?),
                9 => Entry::FieldRef {
                    class: cursor.u16()?,
                    nat: cursor.u16()?,
                },
                10 => Entry::MethodRef {
                    class: cursor.u16()?,
                    nat: cursor.u16()?,
                },
                11 => Entry::InterfaceMethodRef {
                    class: cursor.u16()?,
                    nat: cursor.u16()?,
                },
                12 => Entry::NameAndType {
                    name: cursor.u16()?,
                    descriptor: cursor.u16()?,
                },
                15 => Entry::MethodHandle {
                    kind: cursor.u8()?,
                    reference: cursor.u16()?,
                },
                16 => Entry::MethodType(cursor.u16()?),
                17 => Entry::Dynamic {
                    bootstrap: cursor.u16()?,
                    nat: cursor.u16()?,
                },
                18 => Entry::InvokeDynamic {
                    bootstrap: cursor.u16()?,
                    nat: cursor.u16()?,
                },
                19 | 20 => {
                    cursor.skip(2)?;
                    Entry::ModuleOrPackage
                }
                _ => {
                    return Err(ClassFileError::UnknownConstantTag {
                        tag,
                        index: index as u16,
                    });
                }
            };
            let wide = matches!(entry, Entry::Long(_) | Entry::Double(_));
            entries.push(entry);
            index += 1;
            if wide {
                entries.push(Entry::Unusable);
                index += 1;
            }
        }

        Ok(Self {
            entries,
            bootstrap_methods: Vec::new(),
        })
    }

    /// Reads a `BootstrapMethods` attribute body.
    pub(crate) fn read_bootstrap_methods(&mut self, cursor: &mut Cursor<'_>) -> Result<()> {
        let count = cursor.u16()?;
        let mut methods = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let handle = cursor.u16()?;
            let argc = cursor.u16()?;
            let mut arguments = Vec::with_capacity(argc as usize);
            for _ in 0..argc {
                arguments.push(cursor.u16()?);
            }
            methods.push(BootstrapMethod { handle, arguments });
        }
        self.bootstrap_methods = methods;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    fn entry(&self, index: u16) -> Result<&Entry> {
        match self.entries.get(index as usize) {
            Some(Entry::Unusable) | None => Err(ClassFileError::BadConstantIndex(index)),
            Some(entry) => Ok(entry),
        }
    }

    fn wrong(index: u16, expected: &'static str) -> ClassFileError {
        ClassFileError::WrongConstantType { index, expected }
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.entry(index)? {
            Entry::Utf8(s) => Ok(s),
            _ => Err(Self::wrong(index, "Utf8")),
        }
    }

    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.entry(index)? {
            Entry::Class(name) => self.utf8(*name),
            _ => Err(Self::wrong(index, "Class")),
        }
    }

    /// Like [`Self::class_name`] but treats index 0 as "no class".
    pub fn optional_class_name(&self, index: u16) -> Result<Option<&str>> {
        if index == 0 {
            return Ok(None);
        }
        self.class_name(index).map(Some)
    }

    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        match self.entry(index)? {
            Entry::NameAndType { name, descriptor } => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => Err(Self::wrong(index, "NameAndType")),
        }
    }

    /// Resolves a field/method/interface-method ref; the flag is set for interface methods.
    pub fn member_ref(&self, index: u16) -> Result<(MemberRef, bool)> {
        let (class, nat, interface) = match self.entry(index)? {
            Entry::FieldRef { class, nat } | Entry::MethodRef { class, nat } => {
                (*class, *nat, false)
            }
            Entry::InterfaceMethodRef { class, nat } => (*class, *nat, true),
            _ => return Err(Self::wrong(index, "member reference")),
        };
        let owner = self.class_name(class)?.to_string();
        let (name, descriptor) = self.name_and_type(nat)?;
        Ok((
            MemberRef {
                owner,
                name: name.to_string(),
                descriptor: descriptor.to_string(),
            },
            interface,
        ))
    }

    pub fn handle(&self, index: u16) -> Result<Handle> {
        match self.entry(index)? {
            Entry::MethodHandle { kind, reference } => {
                let (member, interface) = self.member_ref(*reference)?;
                Ok(Handle {
                    kind: *kind,
                    owner: member.owner,
                    name: member.name,
                    descriptor: member.descriptor,
                    interface,
                })
            }
            _ => Err(Self::wrong(index, "MethodHandle")),
        }
    }

    /// Resolves a loadable constant.
    pub fn constant(&self, index: u16) -> Result<Constant> {
        self.constant_at_depth(index, 0)
    }

    fn constant_at_depth(&self, index: u16, depth: usize) -> Result<Constant> {
        Ok(match self.entry(index)? {
            Entry::Integer(v) => Constant::Integer(*v),
            Entry::Float(v) => Constant::Float(*v),
            Entry::Long(v) => Constant::Long(*v),
            Entry::Double(v) => Constant::Double(*v),
            Entry::String(s) => Constant::String(self.utf8(*s)?.to_string()),
            Entry::Class(name) => Constant::Class(self.utf8(*name)?.to_string()),
            Entry::MethodType(desc) => Constant::MethodType(self.utf8(*desc)?.to_string()),
            Entry::MethodHandle { .. } => Constant::MethodHandle(self.handle(index)?),
            Entry::Dynamic { bootstrap, nat } => {
                Constant::Dynamic(Box::new(self.dynamic(*bootstrap, *nat, depth)?))
            }
            _ => return Err(Self::wrong(index, "loadable constant")),
        })
    }

    /// Resolves an `invokedynamic` operand.
    pub fn invoke_dynamic(&self, index: u16) -> Result<ConstantDynamic> {
        match self.entry(index)? {
            Entry::InvokeDynamic { bootstrap, nat } => self.dynamic(*bootstrap, *nat, 0),
            _ => Err(Self::wrong(index, "InvokeDynamic")),
        }
    }

    fn dynamic(&self, bootstrap: u16, nat: u16, depth: usize) -> Result<ConstantDynamic> {
        if depth >= MAX_DYNAMIC_DEPTH {
            return Err(ClassFileError::DynamicTooDeep(MAX_DYNAMIC_DEPTH));
        }
        let method = self
            .bootstrap_methods
            .get(bootstrap as usize)
            .ok_or(ClassFileError::BadBootstrapIndex(bootstrap))?;
        let (name, descriptor) = self.name_and_type(nat)?;
        let arguments = method
            .arguments
            .iter()
            .map(|arg| self.constant_at_depth(*arg, depth + 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(ConstantDynamic {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            bootstrap: self.handle(method.handle)?,
            arguments,
        })
    }

    pub fn integer(&self, index: u16) -> Result<i32> {
        match self.entry(index)? {
            Entry::Integer(v) => Ok(*v),
            _ => Err(Self::wrong(index, "Integer")),
        }
    }

    pub fn long(&self, index: u16) -> Result<i64> {
        match self.entry(index)? {
            Entry::Long(v) => Ok(*v),
            _ => Err(Self::wrong(index, "Long")),
        }
    }

    pub fn float(&self, index: u16) -> Result<f32> {
        match self.entry(index)? {
            Entry::Float(v) => Ok(*v),
            _ => Err(Self::wrong(index, "Float")),
        }
    }

    pub fn double(&self, index: u16) -> Result<f64> {
        match self.entry(index)? {
            Entry::Double(v) => Ok(*v),
            _ => Err(Self::wrong(index, "Double")),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Integer(v) => write!(f, "{v}"),
            Constant::Float(v) => write!(f, "{v}F"),
            Constant::Long(v) => write!(f, "{v}L"),
            Constant::Double(v) => write!(f, "{v}D"),
            Constant::String(s) => write!(f, "{s:?}"),
            Constant::Class(name) => write!(f, "{name}.class"),
            Constant::MethodType(desc) => write!(f, "{desc}"),
            Constant::MethodHandle(h) => write!(f, "{h}"),
            Constant::Dynamic(d) => write!(f, "{} {} [{}]", d.name, d.descriptor, d.bootstrap),
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descriptor.starts_with('(') {
            write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
        } else {
            write!(f, "{}.{} {}", self.owner, self.name, self.descriptor)
        }
    }
}
