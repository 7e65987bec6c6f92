use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "jarlint")]
#[command(about = "Inspect JAR files for classes shadowing the JDK and for broken field references")]
pub struct Cli {
    /// JAR files to analyze, in classpath order. Directories are scanned for
    /// *.jar files.
    #[arg(value_name = "JAR", required = true)]
    pub jars: Vec<PathBuf>,

    /// Java runtime to check shadowing against (defaults to $JAVA_HOME).
    #[arg(long, value_name = "DIR")]
    pub java_home: Option<PathBuf>,

    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also report write accesses to final fields.
    #[arg(long)]
    pub check_final_writes: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
