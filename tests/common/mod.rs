//! Tiny class-file assembler for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const REF_INVOKE_STATIC: u8 = 6;

pub fn be16(v: u16) -> [u8; 2] {
    v.to_be_bytes()
}

pub fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "class_refs_it_{}_{}_{}",
        std::process::id(),
        nanos,
        name
    ))
}

pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) -> anyhow::Result<()> {
    use zip::write::FileOptions;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in entries {
        zip.start_file(*name, options)?;
        zip.write_all(content)?;
    }
    zip.finish()?;
    Ok(())
}

#[derive(Default)]
pub struct Pool {
    bytes: Vec<u8>,
    next: u16,
    utf8: HashMap<String, u16>,
}

impl Pool {
    fn push(&mut self, entry: &[u8], slots: u16) -> u16 {
        if self.next == 0 {
            self.next = 1;
        }
        let index = self.next;
        self.bytes.extend_from_slice(entry);
        self.next += slots;
        index
    }

    fn tagged(&mut self, tag: u8, a: u16, b: Option<u16>) -> u16 {
        let mut entry = vec![tag];
        entry.extend(be16(a));
        if let Some(b) = b {
            entry.extend(be16(b));
        }
        self.push(&entry, 1)
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        if let Some(index) = self.utf8.get(s) {
            return *index;
        }
        let mut entry = vec![1];
        entry.extend(be16(s.len() as u16));
        entry.extend(s.as_bytes());
        let index = self.push(&entry, 1);
        self.utf8.insert(s.to_string(), index);
        index
    }

    pub fn integer(&mut self, v: i32) -> u16 {
        let mut entry = vec![3];
        entry.extend(v.to_be_bytes());
        self.push(&entry, 1)
    }

    pub fn long(&mut self, v: i64) -> u16 {
        let mut entry = vec![5];
        entry.extend(v.to_be_bytes());
        self.push(&entry, 2)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.tagged(7, name, None)
    }

    pub fn string(&mut self, s: &str) -> u16 {
        let s = self.utf8(s);
        self.tagged(8, s, None)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.tagged(12, name, Some(descriptor))
    }

    fn member(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(owner);
        let nat = self.name_and_type(name, descriptor);
        self.tagged(tag, class, Some(nat))
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member(9, owner, name, descriptor)
    }

    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member(10, owner, name, descriptor)
    }

    pub fn interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        self.member(11, owner, name, descriptor)
    }

    pub fn method_handle(&mut self, kind: u8, reference: u16) -> u16 {
        let mut entry = vec![15, kind];
        entry.extend(be16(reference));
        self.push(&entry, 1)
    }

    pub fn method_type(&mut self, descriptor: &str) -> u16 {
        let descriptor = self.utf8(descriptor);
        self.tagged(16, descriptor, None)
    }

    pub fn invoke_dynamic(&mut self, bootstrap: u16, name: &str, descriptor: &str) -> u16 {
        let nat = self.name_and_type(name, descriptor);
        self.tagged(18, bootstrap, Some(nat))
    }

    fn count(&self) -> u16 {
        self.next.max(1)
    }
}

/// One `element_value` as raw bytes.
pub enum Value {
    Int(i32),
    Str(&'static str),
    Enum(&'static str, &'static str),
    Class(&'static str),
    Nested(Vec<u8>),
    Array(Vec<Value>),
}

pub struct ClassBuilder {
    pub pool: Pool,
    name: String,
    super_name: String,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
    bootstrap: Vec<(u16, Vec<u16>)>,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            pool: Pool::default(),
            name: name.to_string(),
            super_name: "java/lang/Object".to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            bootstrap: Vec::new(),
        }
    }

    pub fn attribute(&mut self, name: &str, body: &[u8]) -> Vec<u8> {
        let mut out = be16(self.pool.utf8(name)).to_vec();
        out.extend((body.len() as u32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    fn member(&mut self, access: u16, name: &str, descriptor: &str, attrs: Vec<Vec<u8>>) -> Vec<u8> {
        let mut out = be16(access).to_vec();
        out.extend(be16(self.pool.utf8(name)));
        out.extend(be16(self.pool.utf8(descriptor)));
        out.extend(be16(attrs.len() as u16));
        for attr in attrs {
            out.extend(attr);
        }
        out
    }

    pub fn field(&mut self, name: &str, descriptor: &str, attrs: Vec<Vec<u8>>) {
        let field = self.member(0x0002, name, descriptor, attrs);
        self.fields.push(field);
    }

    pub fn method(&mut self, name: &str, descriptor: &str, attrs: Vec<Vec<u8>>) {
        let method = self.member(0x0001, name, descriptor, attrs);
        self.methods.push(method);
    }

    pub fn class_attribute(&mut self, attr: Vec<u8>) {
        self.attributes.push(attr);
    }

    /// Registers a bootstrap method and returns its index.
    pub fn bootstrap_method(&mut self, handle: u16, arguments: Vec<u16>) -> u16 {
        self.bootstrap.push((handle, arguments));
        (self.bootstrap.len() - 1) as u16
    }

    pub fn code(
        &mut self,
        code: &[u8],
        handlers: &[(u16, u16, u16, Option<&str>)],
        attrs: Vec<Vec<u8>>,
    ) -> Vec<u8> {
        let mut body = be16(4).to_vec();
        body.extend(be16(4));
        body.extend((code.len() as u32).to_be_bytes());
        body.extend_from_slice(code);
        body.extend(be16(handlers.len() as u16));
        for (start, end, handler, catch_type) in handlers {
            body.extend(be16(*start));
            body.extend(be16(*end));
            body.extend(be16(*handler));
            let catch = catch_type.map(|c| self.pool.class(c)).unwrap_or(0);
            body.extend(be16(catch));
        }
        body.extend(be16(attrs.len() as u16));
        for attr in attrs {
            body.extend(attr);
        }
        self.attribute("Code", &body)
    }

    pub fn exceptions(&mut self, classes: &[&str]) -> Vec<u8> {
        let mut body = be16(classes.len() as u16).to_vec();
        for class in classes {
            body.extend(be16(self.pool.class(class)));
        }
        self.attribute("Exceptions", &body)
    }

    /// `(start_pc, length, name, descriptor, slot)` entries.
    pub fn local_variables(&mut self, vars: &[(u16, u16, &str, &str, u16)]) -> Vec<u8> {
        let mut body = be16(vars.len() as u16).to_vec();
        for (start, length, name, descriptor, slot) in vars {
            body.extend(be16(*start));
            body.extend(be16(*length));
            body.extend(be16(self.pool.utf8(name)));
            body.extend(be16(self.pool.utf8(descriptor)));
            body.extend(be16(*slot));
        }
        self.attribute("LocalVariableTable", &body)
    }

    /// An annotation structure (not yet wrapped in an attribute).
    pub fn annotation(&mut self, descriptor: &str, elements: Vec<(&str, Value)>) -> Vec<u8> {
        let mut out = be16(self.pool.utf8(descriptor)).to_vec();
        out.extend(be16(elements.len() as u16));
        for (name, value) in elements {
            out.extend(be16(self.pool.utf8(name)));
            out.extend(self.element_value(value));
        }
        out
    }

    fn element_value(&mut self, value: Value) -> Vec<u8> {
        match value {
            Value::Int(v) => {
                let mut out = vec![b'I'];
                out.extend(be16(self.pool.integer(v)));
                out
            }
            Value::Str(s) => {
                let mut out = vec![b's'];
                out.extend(be16(self.pool.utf8(s)));
                out
            }
            Value::Enum(descriptor, constant) => {
                let mut out = vec![b'e'];
                out.extend(be16(self.pool.utf8(descriptor)));
                out.extend(be16(self.pool.utf8(constant)));
                out
            }
            Value::Class(descriptor) => {
                let mut out = vec![b'c'];
                out.extend(be16(self.pool.utf8(descriptor)));
                out
            }
            Value::Nested(annotation) => {
                let mut out = vec![b'@'];
                out.extend(annotation);
                out
            }
            Value::Array(values) => {
                let mut out = vec![b'['];
                out.extend(be16(values.len() as u16));
                for value in values {
                    out.extend(self.element_value(value));
                }
                out
            }
        }
    }

    pub fn annotations(&mut self, visible: bool, annotations: Vec<Vec<u8>>) -> Vec<u8> {
        let mut body = be16(annotations.len() as u16).to_vec();
        for annotation in annotations {
            body.extend(annotation);
        }
        let name = if visible {
            "RuntimeVisibleAnnotations"
        } else {
            "RuntimeInvisibleAnnotations"
        };
        self.attribute(name, &body)
    }

    pub fn build(mut self) -> Vec<u8> {
        let this_class = self.pool.class(&self.name);
        let super_class = self.pool.class(&self.super_name);
        if !self.bootstrap.is_empty() {
            let mut body = be16(self.bootstrap.len() as u16).to_vec();
            for (handle, arguments) in std::mem::take(&mut self.bootstrap) {
                body.extend(be16(handle));
                body.extend(be16(arguments.len() as u16));
                for argument in arguments {
                    body.extend(be16(argument));
                }
            }
            let attr = self.attribute("BootstrapMethods", &body);
            self.attributes.push(attr);
        }

        let mut out = 0xcafe_babe_u32.to_be_bytes().to_vec();
        out.extend(be16(0));
        out.extend(be16(52));
        out.extend(be16(self.pool.count()));
        out.extend(&self.pool.bytes);
        out.extend(be16(0x0021));
        out.extend(be16(this_class));
        out.extend(be16(super_class));
        out.extend(be16(0));
        for members in [&self.fields, &self.methods] {
            out.extend(be16(members.len() as u16));
            for member in members {
                out.extend(member);
            }
        }
        out.extend(be16(self.attributes.len() as u16));
        for attr in &self.attributes {
            out.extend(attr);
        }
        out
    }
}

/// `com/Foo` with field `bar: Lcom/Bar;` and `baz()V` calling
/// `com/Util.helper(I)Z` inside a try/catch of `java/io/IOException`.
///
/// Instructions of `baz`:
/// `0 iconst_1`, `1 invokestatic`, `2 pop`, `3 goto`, `4 astore_1`, `5 return`.
pub fn sample_class() -> Vec<u8> {
    let mut cb = ClassBuilder::new("com/Foo");
    cb.field("bar", "Lcom/Bar;", Vec::new());

    let helper = cb.pool.method_ref("com/Util", "helper", "(I)Z");
    let mut code = vec![0x04, 0xb8];
    code.extend(be16(helper));
    code.extend([0x57, 0xa7, 0x00, 0x04, 0x4c, 0xb1]);
    let locals = cb.local_variables(&[
        (0, 10, "this", "Lcom/Foo;", 0),
        (9, 1, "e", "Ljava/io/IOException;", 1),
    ]);
    let code = cb.code(&code, &[(0, 5, 8, Some("java/io/IOException"))], vec![locals]);
    cb.method("baz", "()V", vec![code]);
    cb.build()
}
