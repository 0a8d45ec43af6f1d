//! Helpers over the class-file type descriptor grammar.
//!
//! Field types are `B C D F I J S Z`, `L<internal name>;`, or `[` followed by a
//! field type. Method types are `(<field type>*)<field type or V>`.

const PRIMITIVES: &[u8] = b"BCDFIJSZ";

pub fn is_primitive(desc: &str) -> bool {
    desc.len() == 1 && (desc == "V" || PRIMITIVES.contains(&desc.as_bytes()[0]))
}

pub fn is_valid_field_desc(desc: &str) -> bool {
    field_type_len(desc) == Some(desc.len())
}

/// Length of the field type at the start of `s`, or `None` if malformed.
fn field_type_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let dims = bytes.iter().take_while(|b| **b == b'[').count();
    match bytes.get(dims)? {
        b'L' => {
            let end = s[dims..].find(';')? + dims;
            let name = &s[dims + 1..end];
            if name.is_empty() || name.contains(['.', '[']) {
                return None;
            }
            Some(end + 1)
        }
        b if PRIMITIVES.contains(b) => Some(dims + 1),
        _ => None,
    }
}

/// Class named by a field descriptor. Arrays resolve to their element class;
/// primitives and primitive arrays name no class.
pub fn class_name(desc: &str) -> Option<&str> {
    let element = desc.trim_start_matches('[');
    element.strip_prefix('L')?.strip_suffix(';').filter(|n| !n.is_empty())
}

/// Class named by an internal name as found in `CONSTANT_Class` entries,
/// which hold array descriptors for array types.
pub fn class_of_internal(name: &str) -> Option<&str> {
    if name.starts_with('[') {
        return class_name(name);
    }
    (!name.is_empty()).then_some(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor<'a> {
    pub params: Vec<&'a str>,
    pub ret: &'a str,
}

impl<'a> MethodDescriptor<'a> {
    pub fn parse(desc: &'a str) -> Option<Self> {
        let mut rest = desc.strip_prefix('(')?;
        let mut params = Vec::new();
        while !rest.starts_with(')') {
            let len = field_type_len(rest)?;
            params.push(&rest[..len]);
            rest = &rest[len..];
        }
        let ret = &rest[1..];
        if ret != "V" && !is_valid_field_desc(ret) {
            return None;
        }
        Some(Self { params, ret })
    }

    pub fn return_class(&self) -> Option<&'a str> {
        class_name(self.ret)
    }

    pub fn param_classes(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.params.iter().filter_map(|p| class_name(p))
    }
}

/// Every class named by a method or field descriptor: return type first, then
/// each parameter in order. Malformed descriptors name nothing.
pub fn referenced_classes(desc: &str) -> Vec<&str> {
    if desc.starts_with('(') {
        let Some(method) = MethodDescriptor::parse(desc) else {
            return Vec::new();
        };
        method
            .return_class()
            .into_iter()
            .chain(method.param_classes())
            .collect()
    } else if is_valid_field_desc(desc) {
        class_name(desc).into_iter().collect()
    } else {
        Vec::new()
    }
}
