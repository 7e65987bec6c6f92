use anyhow::{Context, Result};
use clap::Parser;
use jarlint::analyzer::Analysis;
use jarlint::cli::{Cli, OutputFormat};
use jarlint::fieldref::FieldRefAnalyzer;
use jarlint::loader::load_classpath;
use jarlint::report::Report;
use jarlint::runtime::IndexedRuntime;
use jarlint::scan::scan_jars;
use jarlint::shadow::ShadowedClassesAnalyzer;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let jar_paths = expand_jar_args(&cli.jars)?;
    let classpath = load_classpath(&jar_paths)?;

    let java_home = resolve_java_home(&cli)?;
    let runtime = IndexedRuntime::from_java_home(&java_home)
        .with_context(|| format!("Failed to index Java runtime: {}", java_home.display()))?;

    let analysis = Analysis::new(vec![
        Box::new(ShadowedClassesAnalyzer::new(Arc::new(runtime))),
        Box::new(FieldRefAnalyzer::new().check_final_writes(cli.check_final_writes)),
    ]);
    let report = analysis.run(&classpath)?;

    write_report(&report, cli.format, cli.output.as_deref())
}

/// Expands directory arguments into the JAR files they contain; plain file
/// arguments pass through. Classpath order follows argument order.
fn expand_jar_args(args: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for arg in args {
        if arg.is_dir() {
            let mut jars = scan_jars(arg)?;
            if jars.is_empty() {
                anyhow::bail!("no JAR files found under {}", arg.display());
            }
            paths.append(&mut jars);
        } else {
            paths.push(arg.clone());
        }
    }
    Ok(paths)
}

fn resolve_java_home(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.java_home.clone() {
        return Ok(p);
    }
    if let Ok(p) = env::var("JAVA_HOME") {
        return Ok(PathBuf::from(p));
    }
    anyhow::bail!("no Java runtime configured (use --java-home or set JAVA_HOME)")
}

fn write_report(report: &Report, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let content = match format {
        OutputFormat::Text => report.to_text(),
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
    };

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
    } else {
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}
