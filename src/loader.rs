//! Archive loading: turns `.jar`/`.jmod` files into the classpath model.

use anyhow::{Context, Result};
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

use crate::classfile;
use crate::model::{ClassDef, Classpath, JarFile};

/// Loads a set of archives in the given order into a `Classpath`. The order
/// is resolution priority and is preserved even though archives parse in
/// parallel.
pub fn load_classpath(paths: &[std::path::PathBuf]) -> Result<Classpath> {
    let jar_files: Vec<JarFile> = paths
        .par_iter()
        .map(|path| load_archive(path))
        .collect::<Result<Vec<_>>>()?;
    Ok(Classpath::new(jar_files))
}

/// Loads one archive. JMOD files keep their classes under a `classes/`
/// prefix; plain JARs do not. Entry order in the archive is preserved.
pub fn load_archive(path: &Path) -> Result<JarFile> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let class_defs = load_class_defs(path)?;
    Ok(JarFile::new(&file_name, class_defs))
}

pub fn load_class_defs(path: &Path) -> Result<Vec<ClassDef>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open archive: {}", path.display()))?;
    // SAFETY: The file is opened read-only and remains valid for the lifetime
    // of the mmap. The mmap is dropped before the file, ensuring memory safety.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to mmap archive: {}", path.display()))?;
    let mut archive = ZipArchive::new(Cursor::new(&mmap[..]))
        .with_context(|| format!("Failed to read zip structure: {}", path.display()))?;

    let mut class_defs = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        if !is_class_entry(&name) {
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut data)
            .with_context(|| format!("Failed to read entry {name} in {}", path.display()))?;
        let class_def = classfile::parse(&data)
            .with_context(|| format!("Failed to parse class {name} in {}", path.display()))?;
        class_defs.push(class_def);
    }
    Ok(class_defs)
}

fn is_class_entry(name: &str) -> bool {
    // JMOD layout: classes/, lib/, conf/, ... Only classes/ holds bytecode.
    let name = name.strip_prefix("classes/").unwrap_or(name);
    if !name.ends_with(".class") {
        return false;
    }
    if name.ends_with("module-info.class") || name.starts_with("META-INF/") {
        return false;
    }
    true
}
