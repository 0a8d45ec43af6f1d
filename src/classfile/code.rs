use serde::Serialize;
use std::fmt;

use super::constant_pool::{Constant, ConstantDynamic, ConstantPool, MemberRef};
use super::reader::Cursor;
use crate::error::ClassFileError;

type Result<T> = std::result::Result<T, ClassFileError>;

pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const LDC2_W: u8 = 0x14;
pub const IINC: u8 = 0x84;
pub const TABLESWITCH: u8 = 0xaa;
pub const LOOKUPSWITCH: u8 = 0xab;
pub const GETSTATIC: u8 = 0xb2;
pub const PUTFIELD: u8 = 0xb5;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const INVOKEDYNAMIC: u8 = 0xba;
pub const NEW: u8 = 0xbb;
pub const NEWARRAY: u8 = 0xbc;
pub const ANEWARRAY: u8 = 0xbd;
pub const CHECKCAST: u8 = 0xc0;
pub const INSTANCEOF: u8 = 0xc1;
pub const WIDE: u8 = 0xc4;
pub const MULTIANEWARRAY: u8 = 0xc5;

const OPCODE_NAMES: [&str; 0xca] = [
    "nop", "aconst_null", "iconst_m1", "iconst_0", "iconst_1", "iconst_2", "iconst_3",
    "iconst_4", "iconst_5", "lconst_0", "lconst_1", "fconst_0", "fconst_1", "fconst_2",
    "dconst_0", "dconst_1", "bipush", "sipush", "ldc", "ldc_w", "ldc2_w", "iload", "lload",
    "fload", "dload", "aload", "iload_0", "iload_1", "iload_2", "iload_3", "lload_0", "lload_1",
    "lload_2", "lload_3", "fload_0", "fload_1", "fload_2", "fload_3", "dload_0", "dload_1",
    "dload_2", "dload_3", "aload_0", "aload_1", "aload_2", "aload_3", "iaload", "laload",
    "faload", "daload", "aaload", "baload", "caload", "saload", "istore", "lstore", "fstore",
    "dstore", "astore", "istore_0", "istore_1", "istore_2", "istore_3", "lstore_0", "lstore_1",
    "lstore_2", "lstore_3", "fstore_0", "fstore_1", "fstore_2", "fstore_3", "dstore_0",
    "dstore_1", "dstore_2", "dstore_3", "astore_0", "astore_1", "astore_2", "astore_3",
    "iastore", "lastore", "fastore", "dastore", "aastore", "bastore", "castore", "sastore",
    "pop", "pop2", "dup", "dup_x1", "dup_x2", "dup2", "dup2_x1", "dup2_x2", "swap", "iadd",
    "ladd", "fadd", "dadd", "isub", "lsub", "fsub", "dsub", "imul", "lmul", "fmul", "dmul",
    "idiv", "ldiv", "fdiv", "ddiv", "irem", "lrem", "frem", "drem", "ineg", "lneg", "fneg",
    "dneg", "ishl", "lshl", "ishr", "lshr", "iushr", "lushr", "iand", "land", "ior", "lor",
    "ixor", "lxor", "iinc", "i2l", "i2f", "i2d", "l2i", "l2f", "l2d", "f2i", "f2l", "f2d",
    "d2i", "d2l", "d2f", "i2b", "i2c", "i2s", "lcmp", "fcmpl", "fcmpg", "dcmpl", "dcmpg",
    "ifeq", "ifne", "iflt", "ifge", "ifgt", "ifle", "if_icmpeq", "if_icmpne", "if_icmplt",
    "if_icmpge", "if_icmpgt", "if_icmple", "if_acmpeq", "if_acmpne", "goto", "jsr", "ret",
    "tableswitch", "lookupswitch", "ireturn", "lreturn", "freturn", "dreturn", "areturn",
    "return", "getstatic", "putstatic", "getfield", "putfield", "invokevirtual",
    "invokespecial", "invokestatic", "invokeinterface", "invokedynamic", "new", "newarray",
    "anewarray", "arraylength", "athrow", "checkcast", "instanceof", "monitorenter",
    "monitorexit", "wide", "multianewarray", "ifnull", "ifnonnull", "goto_w", "jsr_w",
];

pub fn opcode_name(opcode: u8) -> &'static str {
    OPCODE_NAMES.get(opcode as usize).copied().unwrap_or("unknown")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    None,
    Int(i32),
    Local(u16),
    Iinc { index: u16, delta: i16 },
    /// Absolute bytecode offset of the branch target.
    Branch(i32),
    TableSwitch { default: i32, low: i32, targets: Vec<i32> },
    LookupSwitch { default: i32, pairs: Vec<(i32, i32)> },
    Type(String),
    Field(MemberRef),
    Method { member: MemberRef, interface: bool },
    InvokeDynamic(Box<ConstantDynamic>),
    Constant(Constant),
    NewArray(u8),
    MultiANewArray { descriptor: String, dimensions: u8 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    pub offset: u32,
    pub opcode: u8,
    pub operand: Operand,
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        opcode_name(self.opcode)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Int(v) => write!(f, " {v}"),
            Operand::Local(i) => write!(f, " {i}"),
            Operand::Iinc { index, delta } => write!(f, " {index} {delta}"),
            Operand::Branch(target) => write!(f, " @{target}"),
            Operand::TableSwitch { targets, .. } => write!(f, " ({} cases)", targets.len()),
            Operand::LookupSwitch { pairs, .. } => write!(f, " ({} cases)", pairs.len()),
            Operand::Type(name) => write!(f, " {name}"),
            Operand::Field(member) => write!(f, " {member}"),
            Operand::Method { member, .. } => write!(f, " {member}"),
            Operand::InvokeDynamic(site) => {
                write!(f, " {}{} [{}]", site.name, site.descriptor, site.bootstrap)
            }
            Operand::Constant(c) => write!(f, " {c}"),
            Operand::NewArray(atype) => write!(f, " {atype}"),
            Operand::MultiANewArray {
                descriptor,
                dimensions,
            } => write!(f, " {descriptor} {dimensions}"),
        }
    }
}

/// Decodes a method's bytecode into instructions, in body order.
pub(crate) fn decode(code: &[u8], pool: &ConstantPool) -> Result<Vec<Instruction>> {
    let mut cursor = Cursor::new(code);
    let mut instructions = Vec::new();
    while !cursor.is_empty() {
        let offset = cursor.pos() as u32;
        let opcode = cursor.u8()?;
        let operand = decode_operand(&mut cursor, pool, opcode, offset)?;
        instructions.push(Instruction {
            offset,
            opcode,
            operand,
        });
    }
    Ok(instructions)
}

fn decode_operand(
    cursor: &mut Cursor<'_>,
    pool: &ConstantPool,
    opcode: u8,
    offset: u32,
) -> Result<Operand> {
    let target = |delta: i32| {
        (offset as i32)
            .checked_add(delta)
            .ok_or(ClassFileError::BranchOutOfRange(offset))
    };
    Ok(match opcode {
        0x00..=0x0f | 0x1a..=0x35 | 0x3b..=0x83 | 0x85..=0x98 | 0xac..=0xb1 => Operand::None,
        0xbe | 0xbf | 0xc2 | 0xc3 => Operand::None,
        0x10 => Operand::Int(cursor.i8()? as i32),
        0x11 => Operand::Int(cursor.i16()? as i32),
        LDC => Operand::Constant(pool.constant(cursor.u8()? as u16)?),
        LDC_W | LDC2_W => Operand::Constant(pool.constant(cursor.u16()?)?),
        0x15..=0x19 | 0x36..=0x3a | 0xa9 => Operand::Local(cursor.u8()? as u16),
        IINC => Operand::Iinc {
            index: cursor.u8()? as u16,
            delta: cursor.i8()? as i16,
        },
        0x99..=0xa8 | 0xc6 | 0xc7 => Operand::Branch(target(cursor.i16()? as i32)?),
        0xc8 | 0xc9 => Operand::Branch(target(cursor.i32()?)?),
        TABLESWITCH => {
            align(cursor)?;
            let default = target(cursor.i32()?)?;
            let low = cursor.i32()?;
            let high = cursor.i32()?;
            let count = high.checked_sub(low).filter(|n| *n >= 0).map(|n| n as usize + 1);
            let count = count.ok_or(ClassFileError::UnexpectedEof(cursor.pos()))?;
            let mut targets = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                targets.push(target(cursor.i32()?)?);
            }
            Operand::TableSwitch {
                default,
                low,
                targets,
            }
        }
        LOOKUPSWITCH => {
            align(cursor)?;
            let default = target(cursor.i32()?)?;
            let count = cursor.i32()?.max(0) as usize;
            let mut pairs = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                let key = cursor.i32()?;
                pairs.push((key, target(cursor.i32()?)?));
            }
            Operand::LookupSwitch { default, pairs }
        }
        GETSTATIC..=PUTFIELD => Operand::Field(pool.member_ref(cursor.u16()?)?.0),
        INVOKEVIRTUAL..=INVOKESTATIC => {
            let (member, interface) = pool.member_ref(cursor.u16()?)?;
            Operand::Method { member, interface }
        }
        INVOKEINTERFACE => {
            let (member, _) = pool.member_ref(cursor.u16()?)?;
            cursor.skip(2)?;
            Operand::Method {
                member,
                interface: true,
            }
        }
        INVOKEDYNAMIC => {
            let site = pool.invoke_dynamic(cursor.u16()?)?;
            cursor.skip(2)?;
            Operand::InvokeDynamic(Box::new(site))
        }
        NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => {
            Operand::Type(pool.class_name(cursor.u16()?)?.to_string())
        }
        NEWARRAY => Operand::NewArray(cursor.u8()?),
        WIDE => {
            let inner = cursor.u8()?;
            let index = cursor.u16()?;
            if inner == IINC {
                Operand::Iinc {
                    index,
                    delta: cursor.i16()?,
                }
            } else {
                Operand::Local(index)
            }
        }
        MULTIANEWARRAY => Operand::MultiANewArray {
            descriptor: pool.class_name(cursor.u16()?)?.to_string(),
            dimensions: cursor.u8()?,
        },
        _ => return Err(ClassFileError::UnknownOpcode { opcode, offset }),
    })
}

/// Skips switch padding up to the next 4-byte boundary of the code array.
fn align(cursor: &mut Cursor<'_>) -> Result<()> {
    let pad = (4 - cursor.pos() % 4) % 4;
    cursor.skip(pad)
}
