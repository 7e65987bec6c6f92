use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Finds all archives with one of the given extensions under `base_path`,
/// sorted for deterministic classpath assembly.
pub fn scan_archives(base_path: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        let extensions: Vec<String> = extensions.iter().map(|e| e.to_string()).collect();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                let path = entry.path();
                if path
                    .extension()
                    .is_some_and(|e| extensions.iter().any(|wanted| e == wanted.as_str()))
                {
                    let _ = tx.send(path.to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut paths: Vec<PathBuf> = rx.iter().collect();
    paths.sort();
    Ok(paths)
}

pub fn scan_jars(base_path: &Path) -> Result<Vec<PathBuf>> {
    scan_archives(base_path, &["jar"])
}
