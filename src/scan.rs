use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

pub fn default_m2_repository() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to resolve home directory")?;
    Ok(home.join(".m2").join("repository"))
}

/// What a single input path holds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Input {
    Jar(PathBuf),
    Class(PathBuf),
}

impl Input {
    pub fn path(&self) -> &Path {
        match self {
            Input::Jar(p) | Input::Class(p) => p,
        }
    }

    fn classify(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jar") => Some(Input::Jar(path.to_path_buf())),
            Some("class") => Some(Input::Class(path.to_path_buf())),
            _ => None,
        }
    }
}

/// Expands user-supplied paths into jar and class inputs.
///
/// Files are taken as-is when they carry a `.jar` or `.class` extension;
/// directories are walked recursively. Directory results are sorted so
/// repeated runs report in the same order.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<Input>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = scan_dir(path)?;
            found.sort();
            inputs.extend(found);
        } else if path.is_file() {
            match Input::classify(path) {
                Some(input) => inputs.push(input),
                None => tracing::warn!("Skipping unsupported input: {}", path.display()),
            }
        } else {
            anyhow::bail!("Input not found: {}", path.display());
        }
    }
    Ok(inputs)
}

pub fn scan_dir(base_path: &Path) -> Result<Vec<Input>> {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|t| t.is_file()) {
                        if let Some(input) = Input::classify(entry.path()) {
                            let _ = tx.send(input);
                        }
                    }
                }
                Err(e) => tracing::debug!("Skipping unreadable entry: {e}"),
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    Ok(rx.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(prefix: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "{prefix}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn collects_jars_and_classes_recursively() {
        let base = temp_dir("class-refs-scan");
        fs::create_dir_all(base.join("org/example/1.0")).unwrap();
        fs::create_dir_all(base.join("classes/com")).unwrap();
        fs::write(base.join("org/example/1.0/example-1.0.jar"), b"").unwrap();
        fs::write(base.join("org/example/1.0/example-1.0.pom"), b"").unwrap();
        fs::write(base.join("classes/com/Foo.class"), b"").unwrap();

        let inputs = collect_inputs(&[base.clone()]).unwrap();
        assert_eq!(
            inputs,
            vec![
                Input::Jar(base.join("org/example/1.0/example-1.0.jar")),
                Input::Class(base.join("classes/com/Foo.class")),
            ]
        );
        fs::remove_dir_all(base).unwrap();
    }

    #[test]
    fn missing_input_is_an_error() {
        let missing = temp_dir("class-refs-missing");
        assert!(collect_inputs(&[missing]).is_err());
    }
}
