//! In-memory model of an analyzed classpath.
//!
//! Everything here is built once by the loader (or by hand in tests) and is
//! read-only afterwards. Analyzers share `&Classpath` across threads without
//! locking.

use std::collections::HashMap;
use std::fmt;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_VOLATILE: u16 = 0x0040;
pub const ACC_TRANSIENT: u16 = 0x0080;

/// Renders JVM access flags the way they appear in Java source.
pub fn modifiers(flags: u16) -> String {
    let mut parts = Vec::new();
    if flags & ACC_PUBLIC != 0 {
        parts.push("public");
    }
    if flags & ACC_PROTECTED != 0 {
        parts.push("protected");
    }
    if flags & ACC_PRIVATE != 0 {
        parts.push("private");
    }
    if flags & ACC_STATIC != 0 {
        parts.push("static");
    }
    if flags & ACC_FINAL != 0 {
        parts.push("final");
    }
    if flags & ACC_VOLATILE != 0 {
        parts.push("volatile");
    }
    if flags & ACC_TRANSIENT != 0 {
        parts.push("transient");
    }
    parts.join(" ")
}

/// A field declared by a class. `field_type` is the Java source form of the
/// descriptor (`int`, `java.lang.String`, `byte[]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: String,
    pub flags: u16,
}

impl FieldDef {
    pub fn new(name: &str, field_type: &str, flags: u16) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            flags,
        }
    }

    pub fn is_static(&self) -> bool {
        self.flags & ACC_STATIC != 0
    }

    pub fn is_final(&self) -> bool {
        self.flags & ACC_FINAL != 0
    }

    pub fn is_public(&self) -> bool {
        self.flags & ACC_PUBLIC != 0
    }

    pub fn is_protected(&self) -> bool {
        self.flags & ACC_PROTECTED != 0
    }

    /// Declaration as it would read in source: `public static int counter`.
    pub fn display(&self) -> String {
        let mods = modifiers(self.flags);
        if mods.is_empty() {
            format!("{} {}", self.field_type, self.name)
        } else {
            format!("{} {} {}", mods, self.field_type, self.name)
        }
    }
}

/// A method declared by a class. Only the signature is modeled; bodies are
/// irrelevant to both analyzers and to the API checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
    pub descriptor: String,
    pub flags: u16,
}

impl MethodDef {
    pub fn new(name: &str, descriptor: &str, flags: u16) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            flags,
        }
    }

    pub fn is_public(&self) -> bool {
        self.flags & ACC_PUBLIC != 0
    }

    pub fn is_protected(&self) -> bool {
        self.flags & ACC_PROTECTED != 0
    }
}

/// A field access recorded in the bytecode of a referencing class.
///
/// Identity is the reference itself, not the field it points at: two classes
/// reading the same field produce equal `FieldRef`s. Field declaration order
/// drives `Ord`: owner, name, type, static flag, write flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRef {
    pub field_owner: String,
    pub field_name: String,
    pub field_type: String,
    pub static_access: bool,
    pub write_access: bool,
}

impl FieldRef {
    pub fn new(
        field_owner: &str,
        field_type: &str,
        field_name: &str,
        static_access: bool,
        write_access: bool,
    ) -> Self {
        Self {
            field_owner: field_owner.to_string(),
            field_name: field_name.to_string(),
            field_type: field_type.to_string(),
            static_access,
            write_access,
        }
    }

    pub fn is_read_access(&self) -> bool {
        !self.write_access
    }

    /// Reference as it would read in source: `static int b.B.counter`.
    pub fn display(&self) -> String {
        if self.static_access {
            format!("static {} {}.{}", self.field_type, self.field_owner, self.field_name)
        } else {
            format!("{} {}.{}", self.field_type, self.field_owner, self.field_name)
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldRef[{}]", self.display())
    }
}

/// One compiled class: identity plus everything the analyzers look at.
///
/// `class_loader` is empty for classes loaded from the analyzed classpath and
/// carries the loader label (e.g. "Bootstrap") for runtime classes.
#[derive(Debug, Clone, Default)]
pub struct ClassDef {
    pub class_name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub class_loader: String,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
    pub field_refs: Vec<FieldRef>,
    pub class_file_checksum: String,
    pub api_checksum: String,
}

impl ClassDef {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: crate::java::to_external_name(class_name),
            ..Self::default()
        }
    }

    pub fn with_super(mut self, super_name: &str) -> Self {
        self.super_name = Some(crate::java::to_external_name(super_name));
        self
    }

    pub fn with_class_loader(mut self, class_loader: &str) -> Self {
        self.class_loader = class_loader.to_string();
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldDef>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_methods(mut self, methods: Vec<MethodDef>) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_field_refs(mut self, field_refs: Vec<FieldRef>) -> Self {
        self.field_refs = field_refs;
        self
    }

    pub fn with_checksums(mut self, class_file_checksum: &str, api_checksum: &str) -> Self {
        self.class_file_checksum = class_file_checksum.to_string();
        self.api_checksum = api_checksum.to_string();
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One analyzed archive. Class order is the order of entries in the archive.
#[derive(Debug, Clone)]
pub struct JarFile {
    pub file_name: String,
    pub class_defs: Vec<ClassDef>,
}

impl JarFile {
    pub fn new(file_name: &str, class_defs: Vec<ClassDef>) -> Self {
        Self {
            file_name: file_name.to_string(),
            class_defs,
        }
    }
}

/// The ordered set of archives under analysis. Archive order is resolution
/// priority: when two archives define the same class name, the first one on
/// the classpath wins.
#[derive(Debug)]
pub struct Classpath {
    jar_files: Vec<JarFile>,
    index: HashMap<String, (usize, usize)>,
}

impl Classpath {
    pub fn new(jar_files: Vec<JarFile>) -> Self {
        let mut index = HashMap::new();
        for (jar_idx, jar) in jar_files.iter().enumerate() {
            for (class_idx, class_def) in jar.class_defs.iter().enumerate() {
                index
                    .entry(class_def.class_name.clone())
                    .or_insert((jar_idx, class_idx));
            }
        }
        Self { jar_files, index }
    }

    pub fn jar_files(&self) -> &[JarFile] {
        &self.jar_files
    }

    /// First-wins lookup of a class definition by external (dot-separated)
    /// name.
    pub fn class_def(&self, class_name: &str) -> Option<&ClassDef> {
        let (jar_idx, class_idx) = *self.index.get(class_name)?;
        Some(&self.jar_files[jar_idx].class_defs[class_idx])
    }
}
