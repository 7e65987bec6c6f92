//! Runtime class lookup.
//!
//! Shadow detection needs to know, for any fully qualified name, whether the
//! Java runtime itself supplies a class of that name. Instead of asking a
//! live bootstrap classloader, the runtime's own archives are parsed once
//! into an indexed snapshot. That keeps lookups side-effect-free, safe from
//! worker threads, and trivially mockable in tests.

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::path::Path;

use crate::loader;
use crate::model::ClassDef;
use crate::scan;

pub const BOOTSTRAP_CLASS_LOADER: &str = "Bootstrap";

/// Lookup of runtime-supplied class definitions by external class name.
///
/// Implementations must be side-effect-free and callable concurrently. A
/// lookup error means the provider itself is broken (not "class absent") and
/// aborts the running analyzer.
pub trait RuntimeClassProvider: Send + Sync {
    /// Human-readable lines describing the runtime, one fact per line.
    fn description(&self) -> String;

    fn lookup(&self, class_name: &str) -> Result<Option<&ClassDef>>;
}

/// Snapshot of a runtime built by parsing its archives up front. The index
/// doubles as the lookup cache: every query is one hash map probe.
#[derive(Debug)]
pub struct IndexedRuntime {
    description: String,
    classes: HashMap<String, ClassDef>,
}

impl IndexedRuntime {
    pub fn new(description: &str, classes: Vec<ClassDef>) -> Self {
        let mut index = HashMap::with_capacity(classes.len());
        for class_def in classes {
            index.entry(class_def.class_name.clone()).or_insert(class_def);
        }
        Self {
            description: description.to_string(),
            classes: index,
        }
    }

    /// Indexes the runtime under a Java home directory: `jmods/*.jmod` on
    /// modern JDKs, with `jre/lib/rt.jar` / `lib/rt.jar` as legacy fallback.
    pub fn from_java_home(java_home: &Path) -> Result<Self> {
        let archives = runtime_archives(java_home)?;
        if archives.is_empty() {
            bail!(
                "no runtime archives (jmods or rt.jar) found under {}",
                java_home.display()
            );
        }

        let mut classes = Vec::new();
        for archive in &archives {
            let mut defs = loader::load_class_defs(archive)
                .with_context(|| format!("Failed to index runtime archive: {}", archive.display()))?;
            for def in &mut defs {
                def.class_loader = BOOTSTRAP_CLASS_LOADER.to_string();
            }
            classes.append(&mut defs);
        }

        let description = describe_java_home(java_home);
        Ok(Self::new(&description, classes))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

impl RuntimeClassProvider for IndexedRuntime {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn lookup(&self, class_name: &str) -> Result<Option<&ClassDef>> {
        Ok(self.classes.get(class_name))
    }
}

fn runtime_archives(java_home: &Path) -> Result<Vec<std::path::PathBuf>> {
    let jmods = java_home.join("jmods");
    if jmods.is_dir() {
        return scan::scan_archives(&jmods, &["jmod"]);
    }

    for candidate in ["jre/lib/rt.jar", "lib/rt.jar"] {
        let rt = java_home.join(candidate);
        if rt.is_file() {
            return Ok(vec![rt]);
        }
    }
    Ok(Vec::new())
}

/// Reads name and vendor from the `release` properties file JDKs ship with.
fn describe_java_home(java_home: &Path) -> String {
    let mut version = String::from("unknown");
    let mut vendor = String::from("unknown");
    if let Ok(release) = std::fs::read_to_string(java_home.join("release")) {
        for line in release.lines() {
            if let Some(value) = release_value(line, "JAVA_VERSION") {
                version = value;
            } else if let Some(value) = release_value(line, "IMPLEMENTOR") {
                vendor = value;
            }
        }
    }
    format!(
        "Java home   : {}\nJava version: {version}\nJava vendor : {vendor}",
        java_home.display()
    )
}

fn release_value(line: &str, key: &str) -> Option<String> {
    let rest = line.strip_prefix(key)?.trim_start().strip_prefix('=')?;
    Some(rest.trim().trim_matches('"').to_string())
}
