//! Hand-assembled class-file bytes for parser and loader tests.

use std::collections::HashMap;

/// Builds a minimal but structurally valid class file: constant pool,
/// supertypes, fields, and methods whose Code attribute contains the given
/// field access instructions followed by `return`.
#[derive(Clone)]
pub struct ClassBytes {
    this_class: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<(u16, String, String)>,
    methods: Vec<MethodSpec>,
}

#[derive(Clone)]
struct MethodSpec {
    flags: u16,
    name: String,
    descriptor: String,
    /// (opcode, owner internal name, field name, field descriptor)
    field_accesses: Vec<(u8, String, String, String)>,
}

impl ClassBytes {
    pub fn new(this_class: &str) -> Self {
        Self {
            this_class: this_class.to_string(),
            super_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn super_class(mut self, name: &str) -> Self {
        self.super_class = Some(name.to_string());
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn field(mut self, flags: u16, name: &str, descriptor: &str) -> Self {
        self.fields.push((flags, name.to_string(), descriptor.to_string()));
        self
    }

    pub fn method_with_field_access(
        mut self,
        flags: u16,
        name: &str,
        descriptor: &str,
        accesses: &[(u8, &str, &str, &str)],
    ) -> Self {
        self.methods.push(MethodSpec {
            flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            field_accesses: accesses
                .iter()
                .map(|(op, owner, name, desc)| {
                    (*op, owner.to_string(), name.to_string(), desc.to_string())
                })
                .collect(),
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = PoolBuilder::new();

        let this_idx = pool.class(&self.this_class);
        let super_idx = self.super_class.as_deref().map(|s| pool.class(s)).unwrap_or(0);
        let interface_idxs: Vec<u16> = self.interfaces.iter().map(|i| pool.class(i)).collect();

        let field_idxs: Vec<(u16, u16, u16)> = self
            .fields
            .iter()
            .map(|(flags, name, desc)| (*flags, pool.utf8(name), pool.utf8(desc)))
            .collect();

        let has_code = self.methods.iter().any(|m| !m.field_accesses.is_empty());
        let code_idx = if has_code { pool.utf8("Code") } else { 0 };

        struct MethodBytes {
            flags: u16,
            name_idx: u16,
            desc_idx: u16,
            code: Vec<u8>,
        }
        let methods: Vec<MethodBytes> = self
            .methods
            .iter()
            .map(|m| {
                let mut code = Vec::new();
                for (opcode, owner, name, desc) in &m.field_accesses {
                    let ref_idx = pool.field_ref(owner, name, desc);
                    code.push(*opcode);
                    code.extend_from_slice(&ref_idx.to_be_bytes());
                }
                if !code.is_empty() {
                    code.push(0xb1); // return
                }
                MethodBytes {
                    flags: m.flags,
                    name_idx: pool.utf8(&m.name),
                    desc_idx: pool.utf8(&m.descriptor),
                    code,
                }
            })
            .collect();

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // minor
        out.extend_from_slice(&52u16.to_be_bytes()); // major (Java 8)
        out.extend_from_slice(&pool.count.to_be_bytes());
        out.extend_from_slice(&pool.bytes);

        out.extend_from_slice(&0x0021u16.to_be_bytes()); // public super
        out.extend_from_slice(&this_idx.to_be_bytes());
        out.extend_from_slice(&super_idx.to_be_bytes());

        out.extend_from_slice(&(interface_idxs.len() as u16).to_be_bytes());
        for idx in interface_idxs {
            out.extend_from_slice(&idx.to_be_bytes());
        }

        out.extend_from_slice(&(field_idxs.len() as u16).to_be_bytes());
        for (flags, name_idx, desc_idx) in field_idxs {
            out.extend_from_slice(&flags.to_be_bytes());
            out.extend_from_slice(&name_idx.to_be_bytes());
            out.extend_from_slice(&desc_idx.to_be_bytes());
            out.extend_from_slice(&0u16.to_be_bytes()); // no attributes
        }

        out.extend_from_slice(&(methods.len() as u16).to_be_bytes());
        for method in methods {
            out.extend_from_slice(&method.flags.to_be_bytes());
            out.extend_from_slice(&method.name_idx.to_be_bytes());
            out.extend_from_slice(&method.desc_idx.to_be_bytes());
            if method.code.is_empty() {
                out.extend_from_slice(&0u16.to_be_bytes());
            } else {
                out.extend_from_slice(&1u16.to_be_bytes());
                out.extend_from_slice(&code_idx.to_be_bytes());
                // max_stack + max_locals + code_length + code + exception
                // table length + attribute count
                let attr_len = 2 + 2 + 4 + method.code.len() + 2 + 2;
                out.extend_from_slice(&(attr_len as u32).to_be_bytes());
                out.extend_from_slice(&4u16.to_be_bytes()); // max_stack
                out.extend_from_slice(&1u16.to_be_bytes()); // max_locals
                out.extend_from_slice(&(method.code.len() as u32).to_be_bytes());
                out.extend_from_slice(&method.code);
                out.extend_from_slice(&0u16.to_be_bytes()); // exception table
                out.extend_from_slice(&0u16.to_be_bytes()); // code attributes
            }
        }

        out.extend_from_slice(&0u16.to_be_bytes()); // class attributes
        out
    }
}

struct PoolBuilder {
    bytes: Vec<u8>,
    /// constant_pool_count as written to the file: highest index + 1.
    count: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
    name_and_types: HashMap<(String, String), u16>,
    field_refs: HashMap<(String, String, String), u16>,
}

impl PoolBuilder {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            count: 1,
            utf8: HashMap::new(),
            classes: HashMap::new(),
            name_and_types: HashMap::new(),
            field_refs: HashMap::new(),
        }
    }

    fn next_index(&mut self) -> u16 {
        let idx = self.count;
        self.count += 1;
        idx
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(idx) = self.utf8.get(value) {
            return *idx;
        }
        let idx = self.next_index();
        self.bytes.push(1);
        self.bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.bytes.extend_from_slice(value.as_bytes());
        self.utf8.insert(value.to_string(), idx);
        idx
    }

    fn class(&mut self, name: &str) -> u16 {
        if let Some(idx) = self.classes.get(name) {
            return *idx;
        }
        let name_idx = self.utf8(name);
        let idx = self.next_index();
        self.bytes.push(7);
        self.bytes.extend_from_slice(&name_idx.to_be_bytes());
        self.classes.insert(name.to_string(), idx);
        idx
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let key = (name.to_string(), descriptor.to_string());
        if let Some(idx) = self.name_and_types.get(&key) {
            return *idx;
        }
        let name_idx = self.utf8(name);
        let desc_idx = self.utf8(descriptor);
        let idx = self.next_index();
        self.bytes.push(12);
        self.bytes.extend_from_slice(&name_idx.to_be_bytes());
        self.bytes.extend_from_slice(&desc_idx.to_be_bytes());
        self.name_and_types.insert(key, idx);
        idx
    }

    fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let key = (owner.to_string(), name.to_string(), descriptor.to_string());
        if let Some(idx) = self.field_refs.get(&key) {
            return *idx;
        }
        let class_idx = self.class(owner);
        let nat_idx = self.name_and_type(name, descriptor);
        let idx = self.next_index();
        self.bytes.push(9);
        self.bytes.extend_from_slice(&class_idx.to_be_bytes());
        self.bytes.extend_from_slice(&nat_idx.to_be_bytes());
        self.field_refs.insert(key, idx);
        idx
    }
}
