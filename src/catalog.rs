use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

use crate::classfile::ClassFile;
use crate::scan::Input;
use crate::search::LoadedClass;

/// Raw `.class` entry bytes, keyed by entry name, in archive order.
pub fn read_class_entries(artifact_path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let file = File::open(artifact_path)
        .with_context(|| format!("Failed to open jar: {}", artifact_path.display()))?;
    // SAFETY: The file is opened read-only and remains valid for the lifetime of the mmap.
    // The mmap is dropped before the file, ensuring memory safety.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to mmap jar: {}", artifact_path.display()))?;
    let mut archive = ZipArchive::new(Cursor::new(&mmap[..]))
        .with_context(|| format!("Failed to read zip (jar): {}", artifact_path.display()))?;

    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if !entry.is_file() || !entry.name().ends_with(".class") {
            continue;
        }
        let name = entry.name().to_string();
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to inflate {name} in {}", artifact_path.display()))?;
        entries.push((name, bytes));
    }
    Ok(entries)
}

/// Loads and parses every class an input holds.
///
/// Entries that fail to parse are logged and skipped; an unreadable jar or
/// file is an error.
pub fn load_classes(input: &Input) -> Result<Vec<LoadedClass>> {
    match input {
        Input::Class(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read class file: {}", path.display()))?;
            let origin = path.display().to_string();
            Ok(parse_entry(&origin, &bytes).into_iter().collect())
        }
        Input::Jar(path) => {
            let jar = path.display().to_string();
            let classes = read_class_entries(path)?
                .into_iter()
                .filter_map(|(name, bytes)| parse_entry(&format!("{jar}!/{name}"), &bytes))
                .collect();
            Ok(classes)
        }
    }
}

fn parse_entry(origin: &str, bytes: &[u8]) -> Option<LoadedClass> {
    match ClassFile::parse(bytes) {
        Ok(class) => Some(LoadedClass {
            origin: origin.to_string(),
            class,
        }),
        Err(e) => {
            tracing::warn!("Skipping unparseable class {origin}: {e}");
            None
        }
    }
}
