//! Class-file parsing.
//!
//! Turns the raw bytes of one `.class` entry into a [`ClassDef`]: constant
//! pool, declared fields and methods, superclass and interfaces, plus every
//! field access instruction found in method bodies. Two checksums are
//! computed on the way out: SHA-256 over the exact bytes, and SHA-256 over a
//! sorted description of the public API surface (names, descriptors,
//! modifiers only), which detects "same contract, different implementation".

use anyhow::{Result, bail};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

use crate::java::descriptor_to_java_type;
use crate::model::{ClassDef, FieldDef, FieldRef, MethodDef};

const MAGIC: u32 = 0xCAFE_BABE;

// Field access opcodes.
const GETSTATIC: u8 = 0xb2;
const PUTSTATIC: u8 = 0xb3;
const GETFIELD: u8 = 0xb4;
const PUTFIELD: u8 = 0xb5;

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Parses one class file. The returned definition carries an empty
/// class-loader label; the runtime index overrides it for JDK classes.
pub fn parse(data: &[u8]) -> Result<ClassDef> {
    let mut r = Reader::new(data);

    let magic = r.u32()?;
    if magic != MAGIC {
        bail!("not a class file (bad magic: {magic:#010x})");
    }
    r.u16()?; // minor version
    r.u16()?; // major version

    let pool = ConstantPool::parse(&mut r)?;

    let _access_flags = r.u16()?;
    let this_class = r.u16()?;
    let super_class = r.u16()?;
    let class_name = pool.class_name(this_class)?;

    let mut class_def = ClassDef::new(&class_name);
    if super_class != 0 {
        class_def.super_name = Some(crate::java::to_external_name(&pool.class_name(super_class)?));
    }

    let interface_count = r.u16()?;
    for _ in 0..interface_count {
        let idx = r.u16()?;
        class_def
            .interfaces
            .push(crate::java::to_external_name(&pool.class_name(idx)?));
    }

    let field_count = r.u16()?;
    for _ in 0..field_count {
        let flags = r.u16()?;
        let name = pool.utf8(r.u16()?)?;
        let descriptor = pool.utf8(r.u16()?)?;
        skip_attributes(&mut r)?;
        class_def
            .fields
            .push(FieldDef::new(&name, &descriptor_to_java_type(&descriptor), flags));
    }

    let mut field_refs = BTreeSet::new();
    let method_count = r.u16()?;
    for _ in 0..method_count {
        let flags = r.u16()?;
        let name = pool.utf8(r.u16()?)?;
        let descriptor = pool.utf8(r.u16()?)?;
        read_method_attributes(&mut r, &pool, &mut field_refs)?;
        class_def.methods.push(MethodDef::new(&name, &descriptor, flags));
    }
    class_def.field_refs = field_refs.into_iter().collect();

    class_def.class_file_checksum = sha256_hex(data);
    class_def.api_checksum = api_checksum(&class_def);
    Ok(class_def)
}

/// Checksum over the public surface only. Lines are sorted so the result is
/// independent of declaration order.
fn api_checksum(class_def: &ClassDef) -> String {
    let mut lines = Vec::new();
    lines.push(format!("class {}", class_def.class_name));
    if let Some(super_name) = &class_def.super_name {
        lines.push(format!("extends {super_name}"));
    }
    for interface in &class_def.interfaces {
        lines.push(format!("implements {interface}"));
    }
    for field in &class_def.fields {
        if field.is_public() || field.is_protected() {
            lines.push(format!("field {} {} {:#06x}", field.name, field.field_type, field.flags));
        }
    }
    for method in &class_def.methods {
        if method.is_public() || method.is_protected() {
            lines.push(format!("method {} {} {:#06x}", method.name, method.descriptor, method.flags));
        }
    }
    lines.sort();
    sha256_hex(lines.join("\n").as_bytes())
}

fn skip_attributes(r: &mut Reader) -> Result<()> {
    let count = r.u16()?;
    for _ in 0..count {
        r.u16()?; // attribute name
        let length = r.u32()? as usize;
        r.skip(length)?;
    }
    Ok(())
}

fn read_method_attributes(
    r: &mut Reader,
    pool: &ConstantPool,
    field_refs: &mut BTreeSet<FieldRef>,
) -> Result<()> {
    let count = r.u16()?;
    for _ in 0..count {
        let name = pool.utf8(r.u16()?)?;
        let length = r.u32()? as usize;
        if name == "Code" {
            let body = r.bytes(length)?;
            scan_code(body, pool, field_refs)?;
        } else {
            r.skip(length)?;
        }
    }
    Ok(())
}

/// Walks the bytecode of one Code attribute and records every field access.
/// The walk must track instruction boundaries: a constant-pool index byte is
/// indistinguishable from an opcode without them.
fn scan_code(body: &[u8], pool: &ConstantPool, field_refs: &mut BTreeSet<FieldRef>) -> Result<()> {
    let mut r = Reader::new(body);
    r.u16()?; // max_stack
    r.u16()?; // max_locals
    let code_length = r.u32()? as usize;
    let code = r.bytes(code_length)?;

    let mut pc = 0usize;
    while pc < code.len() {
        let opcode = code[pc];
        if (GETSTATIC..=PUTFIELD).contains(&opcode) {
            if pc + 2 >= code.len() {
                bail!("truncated field instruction at pc {pc}");
            }
            let cp_index = u16::from_be_bytes([code[pc + 1], code[pc + 2]]);
            let (owner, name, descriptor) = pool.field_ref(cp_index)?;
            field_refs.insert(FieldRef::new(
                &crate::java::to_external_name(&owner),
                &descriptor_to_java_type(&descriptor),
                &name,
                opcode == GETSTATIC || opcode == PUTSTATIC,
                opcode == PUTSTATIC || opcode == PUTFIELD,
            ));
        }
        pc += instruction_length(code, pc)?;
    }

    // Exception table and nested attributes carry no field accesses.
    Ok(())
}

/// Total length (opcode included) of the instruction at `pc`.
fn instruction_length(code: &[u8], pc: usize) -> Result<usize> {
    let opcode = code[pc];
    let operands = match opcode {
        // bipush, ldc, newarray, single-byte local variable index
        0x10 | 0x12 | 0xbc | 0x15..=0x19 | 0x36..=0x3a | 0xa9 => 1,
        // sipush, ldc_w, ldc2_w, iinc, branches, field/method/type operands
        0x11 | 0x13 | 0x14 | 0x84 | 0x99..=0xa8 | 0xb2..=0xb8 | 0xbb | 0xbd | 0xc0 | 0xc1
        | 0xc6 | 0xc7 => 2,
        // multianewarray
        0xc5 => 3,
        // invokeinterface, invokedynamic, goto_w, jsr_w
        0xb9 | 0xba | 0xc8 | 0xc9 => 4,
        // wide: extended iinc has a 16-bit index and a 16-bit constant
        0xc4 => {
            let modified = *code
                .get(pc + 1)
                .ok_or_else(|| anyhow::anyhow!("truncated wide instruction at pc {pc}"))?;
            if modified == 0x84 { 5 } else { 3 }
        }
        // tableswitch: 0-3 pad bytes to a 4-byte boundary, then default/low/high + jump table
        0xaa => {
            let pad = (4 - (pc + 1) % 4) % 4;
            let base = pc + 1 + pad;
            let low = read_i32(code, base + 4)?;
            let high = read_i32(code, base + 8)?;
            if high < low {
                bail!("malformed tableswitch at pc {pc}");
            }
            let entries = (high - low + 1) as usize;
            pad + 12 + entries * 4
        }
        // lookupswitch: pad, then default/npairs + match-offset pairs
        0xab => {
            let pad = (4 - (pc + 1) % 4) % 4;
            let base = pc + 1 + pad;
            let npairs = read_i32(code, base + 4)?;
            if npairs < 0 {
                bail!("malformed lookupswitch at pc {pc}");
            }
            pad + 8 + npairs as usize * 8
        }
        _ => 0,
    };
    Ok(1 + operands)
}

fn read_i32(code: &[u8], at: usize) -> Result<i32> {
    let b = code
        .get(at..at + 4)
        .ok_or_else(|| anyhow::anyhow!("truncated switch instruction"))?;
    Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

enum CpEntry {
    Utf8(String),
    Class(u16),
    FieldRef { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    Other,
}

struct ConstantPool {
    entries: Vec<CpEntry>,
}

impl ConstantPool {
    fn parse(r: &mut Reader) -> Result<Self> {
        let count = r.u16()? as usize;
        // Slot 0 is unused; Long/Double take two slots.
        let mut entries = Vec::with_capacity(count);
        entries.push(CpEntry::Other);
        while entries.len() < count {
            let tag = r.u8()?;
            let entry = match tag {
                1 => {
                    let length = r.u16()? as usize;
                    let bytes = r.bytes(length)?;
                    // Real modified-UTF-8 only diverges from UTF-8 for
                    // supplementary characters and embedded NUL; lossy
                    // decoding is enough for identifiers.
                    CpEntry::Utf8(String::from_utf8_lossy(bytes).into_owned())
                }
                7 => CpEntry::Class(r.u16()?),
                9 => CpEntry::FieldRef {
                    class: r.u16()?,
                    name_and_type: r.u16()?,
                },
                12 => CpEntry::NameAndType {
                    name: r.u16()?,
                    descriptor: r.u16()?,
                },
                3 | 4 => {
                    r.skip(4)?;
                    CpEntry::Other
                }
                5 | 6 => {
                    r.skip(8)?;
                    entries.push(CpEntry::Other);
                    CpEntry::Other
                }
                8 | 16 | 19 | 20 => {
                    r.skip(2)?;
                    CpEntry::Other
                }
                15 => {
                    r.skip(3)?;
                    CpEntry::Other
                }
                10 | 11 | 17 | 18 => {
                    r.skip(4)?;
                    CpEntry::Other
                }
                _ => bail!("unknown constant pool tag: {tag}"),
            };
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&CpEntry> {
        self.entries
            .get(index as usize)
            .ok_or_else(|| anyhow::anyhow!("constant pool index out of range: {index}"))
    }

    fn utf8(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            CpEntry::Utf8(s) => Ok(s.clone()),
            _ => bail!("constant pool entry {index} is not Utf8"),
        }
    }

    fn class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            CpEntry::Class(name_idx) => self.utf8(*name_idx),
            _ => bail!("constant pool entry {index} is not a Class"),
        }
    }

    /// Resolves a Fieldref entry to (owner internal name, field name, descriptor).
    fn field_ref(&self, index: u16) -> Result<(String, String, String)> {
        let (class, name_and_type) = match self.get(index)? {
            CpEntry::FieldRef { class, name_and_type } => (*class, *name_and_type),
            _ => bail!("constant pool entry {index} is not a Fieldref"),
        };
        let owner = self.class_name(class)?;
        let (name, descriptor) = match self.get(name_and_type)? {
            CpEntry::NameAndType { name, descriptor } => {
                (self.utf8(*name)?, self.utf8(*descriptor)?)
            }
            _ => bail!("constant pool entry {name_and_type} is not a NameAndType"),
        };
        Ok((owner, name, descriptor))
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn u8(&mut self) -> Result<u8> {
        let b = self.bytes(1)?;
        Ok(b[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(length)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                anyhow::anyhow!("truncated class file at offset {} (+{length})", self.pos)
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, length: usize) -> Result<()> {
        self.bytes(length)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ClassBytes;

    #[test]
    fn rejects_non_class_data() {
        let err = parse(b"not a class file").unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn parses_names_fields_and_supertypes() {
        let bytes = ClassBytes::new("a/A")
            .super_class("java/lang/Object")
            .interface("java/io/Serializable")
            .field(0x0009, "counter", "I")
            .field(0x0002, "hidden", "Ljava/lang/String;")
            .build();

        let class_def = parse(&bytes).unwrap();
        assert_eq!(class_def.class_name, "a.A");
        assert_eq!(class_def.super_name.as_deref(), Some("java.lang.Object"));
        assert_eq!(class_def.interfaces, vec!["java.io.Serializable".to_string()]);
        assert_eq!(class_def.fields.len(), 2);
        assert_eq!(class_def.fields[0].name, "counter");
        assert_eq!(class_def.fields[0].field_type, "int");
        assert!(class_def.fields[0].is_static());
        assert_eq!(class_def.fields[1].field_type, "java.lang.String");
    }

    #[test]
    fn records_field_accesses_from_bytecode() {
        // getstatic B.x:I, putfield B.y:Z, return
        let bytes = ClassBytes::new("a/A")
            .super_class("java/lang/Object")
            .method_with_field_access(0x0001, "run", "()V", &[
                (0xb2, "b/B", "x", "I"),
                (0xb5, "b/B", "y", "Z"),
            ])
            .build();

        let class_def = parse(&bytes).unwrap();
        assert_eq!(class_def.field_refs.len(), 2);

        let read = &class_def.field_refs[0];
        assert_eq!(read.field_owner, "b.B");
        assert_eq!(read.field_name, "x");
        assert_eq!(read.field_type, "int");
        assert!(read.static_access);
        assert!(read.is_read_access());

        let write = &class_def.field_refs[1];
        assert_eq!(write.field_name, "y");
        assert_eq!(write.field_type, "boolean");
        assert!(!write.static_access);
        assert!(write.write_access);
    }

    #[test]
    fn duplicate_field_accesses_collapse_to_one_ref() {
        let bytes = ClassBytes::new("a/A")
            .super_class("java/lang/Object")
            .method_with_field_access(0x0001, "run", "()V", &[
                (0xb2, "b/B", "x", "I"),
                (0xb2, "b/B", "x", "I"),
            ])
            .build();

        let class_def = parse(&bytes).unwrap();
        assert_eq!(class_def.field_refs.len(), 1);
    }

    #[test]
    fn exact_checksum_tracks_bytes_api_checksum_tracks_surface() {
        let base = ClassBytes::new("a/A")
            .super_class("java/lang/Object")
            .field(0x0001, "x", "I");

        let one = parse(&base.clone().build()).unwrap();
        // Private members are invisible to the API checksum.
        let two = parse(&base.clone().field(0x0002, "secret", "J").build()).unwrap();
        // Public members change it.
        let three = parse(&base.field(0x0001, "y", "I").build()).unwrap();

        assert_ne!(one.class_file_checksum, two.class_file_checksum);
        assert_eq!(one.api_checksum, two.api_checksum);
        assert_ne!(one.api_checksum, three.api_checksum);
    }

    #[test]
    fn identical_bytes_give_identical_checksums() {
        let bytes = ClassBytes::new("a/A").super_class("java/lang/Object").build();
        let one = parse(&bytes).unwrap();
        let two = parse(&bytes).unwrap();
        assert_eq!(one.class_file_checksum, two.class_file_checksum);
        assert_eq!(one.api_checksum, two.api_checksum);
    }
}
