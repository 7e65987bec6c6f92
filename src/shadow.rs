//! Detection of classes shadowing runtime classes.

use anyhow::Result;
use rayon::prelude::*;
use std::sync::Arc;

use crate::analyzer::Analyzer;
use crate::model::{ClassDef, Classpath};
use crate::report::{ReportSection, ReportTable};
use crate::runtime::RuntimeClassProvider;

pub const SIMILARITY_EXACT_COPY: &str = "Exact copy";
pub const SIMILARITY_SAME_API: &str = "Same API";
pub const SIMILARITY_DIFFERENT_API: &str = "Different API";

/// Reports every class on the classpath whose fully qualified name is also
/// supplied by the Java runtime, with a similarity verdict per class.
pub struct ShadowedClassesAnalyzer {
    runtime: Arc<dyn RuntimeClassProvider>,
}

impl ShadowedClassesAnalyzer {
    pub fn new(runtime: Arc<dyn RuntimeClassProvider>) -> Self {
        Self { runtime }
    }

    fn build_table(&self, classpath: &Classpath) -> Result<ReportTable> {
        let mut table = ReportTable::new(&["Class name", "JAR file", "Class loader", "Similarity"]);

        for jar_file in classpath.jar_files() {
            // Parallel lookup first, deterministic order second: results are
            // collected as computed, then sorted by class name.
            let mut shadowed: Vec<(String, String, &'static str)> = jar_file
                .class_defs
                .par_iter()
                .map(|class_def| {
                    let runtime_class = self.runtime.lookup(&class_def.class_name)?;
                    Ok(runtime_class.map(|jvm_class| {
                        (
                            class_def.class_name.clone(),
                            jvm_class.class_loader.clone(),
                            similarity(class_def, jvm_class),
                        )
                    }))
                })
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .flatten()
                .collect();
            shadowed.sort();

            for (class_name, class_loader, verdict) in shadowed {
                table.add_row(vec![
                    class_name,
                    jar_file.file_name.clone(),
                    class_loader,
                    verdict.to_string(),
                ]);
            }
        }

        Ok(table)
    }
}

impl Analyzer for ShadowedClassesAnalyzer {
    fn name(&self) -> &'static str {
        "shadowed classes"
    }

    fn analyze(&self, classpath: &Classpath) -> Result<ReportSection> {
        let table = self.build_table(classpath)?;

        let description = format!(
            "Classes shadowing JRE/JDK classes.\n{}",
            self.runtime.description()
        );
        let mut section = ReportSection::new("Shadowed Classes", &description);
        section.add_table(table);
        Ok(section)
    }
}

/// Checksum comparison in strict precedence order: identical bytes beat an
/// identical API surface; anything else differs.
fn similarity(class_def: &ClassDef, jvm_class: &ClassDef) -> &'static str {
    if class_def.class_file_checksum == jvm_class.class_file_checksum {
        SIMILARITY_EXACT_COPY
    } else if class_def.api_checksum == jvm_class.api_checksum {
        SIMILARITY_SAME_API
    } else {
        SIMILARITY_DIFFERENT_API
    }
}
