//! # jarlint
//!
//! Inspects JAR files and reports binary compatibility problems: classes
//! shadowing JRE/JDK classes and field references that do not resolve against
//! the classpath.
//!
//! ## Architecture
//!
//! - **model**: Immutable classpath model (classes, fields, references, archives)
//! - **classfile**: Class-file byte parser with field-access extraction and checksums
//! - **loader**: JAR/JMOD reading and classpath assembly
//! - **java**: Descriptor and class-name helpers
//! - **runtime**: Indexed snapshot of the Java runtime's own classes
//! - **analyzer**: Analyzer contract and report-assembling runner
//! - **shadow**: Shadowed-class detection with checksum-based similarity
//! - **fieldref**: Field resolution and linkage checks
//! - **report**: Report/section/table structures and rendering
//! - **scan**: Archive discovery on the filesystem
//! - **cli**: Command line definition

pub mod analyzer;
pub mod classfile;
pub mod cli;
pub mod fieldref;
pub mod java;
pub mod loader;
pub mod model;
pub mod report;
pub mod runtime;
pub mod scan;
pub mod shadow;

#[cfg(test)]
mod testutil;
