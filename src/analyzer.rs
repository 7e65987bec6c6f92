//! The analyzer contract and the runner that assembles a report.

use anyhow::{Context, Result};

use crate::model::Classpath;
use crate::report::{Report, ReportSection};

/// One analysis pass over a classpath. Implementations must not mutate the
/// classpath and must be safe to call from the thread driving the run; any
/// internal parallelism is the analyzer's own business.
pub trait Analyzer: Send + Sync {
    /// Short identifier used in error context ("shadowed classes").
    fn name(&self) -> &'static str;

    fn analyze(&self, classpath: &Classpath) -> Result<ReportSection>;
}

/// Runs a fixed sequence of analyzers and collects their sections in
/// registration order. A section is appended only after its analyzer returns
/// successfully; the first failure aborts the whole run, so a report never
/// contains a partial section.
pub struct Analysis {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Analysis {
    pub fn new(analyzers: Vec<Box<dyn Analyzer>>) -> Self {
        Self { analyzers }
    }

    pub fn run(&self, classpath: &Classpath) -> Result<Report> {
        let mut report = Report::new();
        for analyzer in &self.analyzers {
            let section = analyzer
                .analyze(classpath)
                .with_context(|| format!("Analyzer failed: {}", analyzer.name()))?;
            report.add_section(section);
        }
        Ok(report)
    }
}
