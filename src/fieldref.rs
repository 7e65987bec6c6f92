//! Field reference resolution checks.
//!
//! Every field access recorded in the bytecode of every class is resolved
//! against the class that is supposed to declare the field, reproducing the
//! JVM's field linkage rules. The checks form a priority-ordered decision
//! list; evaluation order matters and only the first failing check is
//! reported per reference:
//!
//! 1. the field exists (searching the superclass chain),
//! 2. the declared type matches the referenced type,
//! 3. static/instance access matches the declaration,
//! 4. a write access does not target a final field (off by default, see
//!    [`FieldRefAnalyzer::check_final_writes`]).
//!
//! References whose owner class is not on the classpath are skipped: they are
//! unverifiable, not necessarily wrong.

use anyhow::Result;
use rayon::prelude::*;

use crate::analyzer::Analyzer;
use crate::model::{ClassDef, Classpath, FieldDef, FieldRef};
use crate::report::{ReportSection, ReportTable};

#[derive(Default)]
pub struct FieldRefAnalyzer {
    check_final_writes: bool,
}

impl FieldRefAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the historically suppressed "write access to final field"
    /// check as the last rule of the decision list.
    pub fn check_final_writes(mut self, enabled: bool) -> Self {
        self.check_final_writes = enabled;
        self
    }

    fn build_table(&self, classpath: &Classpath) -> ReportTable {
        let mut table = ReportTable::new(&["JAR file", "Errors"]);

        for jar_file in classpath.jar_files() {
            // Classes resolve in parallel; collect keeps declaration order,
            // so the joined message block is deterministic.
            let violations: Vec<String> = jar_file
                .class_defs
                .par_iter()
                .map(|class_def| self.check_class(classpath, class_def))
                .collect::<Vec<Vec<String>>>()
                .into_iter()
                .flatten()
                .collect();

            if !violations.is_empty() {
                table.add_row(vec![jar_file.file_name.clone(), violations.join("\n")]);
            }
        }

        table
    }

    fn check_class(&self, classpath: &Classpath, class_def: &ClassDef) -> Vec<String> {
        class_def
            .field_refs
            .iter()
            .filter_map(|field_ref| self.check_ref(classpath, field_ref))
            .collect()
    }

    fn check_ref(&self, classpath: &Classpath, field_ref: &FieldRef) -> Option<String> {
        // Owner not on the classpath: unverifiable, never a violation.
        let owner = classpath.class_def(&field_ref.field_owner)?;

        let Some(field) = find_field(classpath, owner, &field_ref.field_name) else {
            return Some(format!("Field not found: {}", field_ref.display()));
        };

        if field.field_type != field_ref.field_type {
            return Some(format!(
                "Incompatible field type: {} -> {}",
                field_ref.display(),
                field.display()
            ));
        }

        if field_ref.static_access && !field.is_static() {
            return Some(format!(
                "Static access to instance field: {} -> {}",
                field_ref.display(),
                field.display()
            ));
        }

        if !field_ref.static_access && field.is_static() {
            return Some(format!(
                "Instance access to static field: {} -> {}",
                field_ref.display(),
                field.display()
            ));
        }

        if self.check_final_writes && field_ref.write_access && field.is_final() {
            return Some(format!(
                "Write access to final field: {} -> {}",
                field_ref.display(),
                field.display()
            ));
        }

        None
    }
}

/// Looks up a field by name in `class_def`, then up the superclass chain as
/// far as it resolves on the classpath.
fn find_field<'a>(
    classpath: &'a Classpath,
    class_def: &'a ClassDef,
    name: &str,
) -> Option<&'a FieldDef> {
    let mut visited: Vec<&str> = Vec::new();
    let mut current = Some(class_def);
    while let Some(c) = current {
        if let Some(field) = c.field(name) {
            return Some(field);
        }
        // Malformed input can contain superclass cycles.
        if visited.contains(&c.class_name.as_str()) {
            return None;
        }
        visited.push(&c.class_name);
        current = c
            .super_name
            .as_deref()
            .and_then(|super_name| classpath.class_def(super_name));
    }
    None
}

impl Analyzer for FieldRefAnalyzer {
    fn name(&self) -> &'static str {
        "field references"
    }

    fn analyze(&self, classpath: &Classpath) -> Result<ReportSection> {
        let table = self.build_table(classpath);

        let mut section = ReportSection::new(
            "Field References",
            "Problems with field access instructions, resolved against the classpath.",
        );
        section.add_table(table);
        Ok(section)
    }
}
