//! Fan-out driver: one walk per class, run in parallel, results merged back
//! in input order.

use rayon::prelude::*;
use serde::Serialize;

use crate::classfile::ClassFile;
use crate::path::PathNode;
use crate::query::ClassQuery;
use crate::result::{Reference, SearchResult};
use crate::walk::ClassSource;

/// A parsed class plus where it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedClass {
    /// Class file path, or `jar!/entry` for jar members.
    pub origin: String,
    pub class: ClassFile,
}

impl ClassSource for LoadedClass {
    fn class_file(&self) -> &ClassFile {
        &self.class
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub origin: String,
    pub class_name: String,
    pub location: String,
    pub path: PathNode,
    pub reference: Reference,
}

impl SearchHit {
    fn new(loaded: &LoadedClass, result: SearchResult) -> Self {
        Self {
            origin: loaded.origin.clone(),
            class_name: loaded.class.name.clone(),
            location: result.path.to_string(),
            path: result.path,
            reference: result.reference,
        }
    }
}

/// Runs `query` over every class on the current rayon pool.
///
/// A class whose walk aborts is logged and contributes nothing; the others
/// still report.
pub fn search_classes<Q: ClassQuery + ?Sized>(query: &Q, classes: &[LoadedClass]) -> Vec<SearchHit> {
    classes
        .par_iter()
        .map(|loaded| search_class(query, loaded))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

pub fn search_class<Q: ClassQuery + ?Sized>(query: &Q, loaded: &LoadedClass) -> Vec<SearchHit> {
    let mut results: Vec<SearchResult> = Vec::new();
    let class_path = PathNode::class(loaded.class.name.as_str());
    if let Err(e) = query.visit(&mut results, class_path, loaded) {
        tracing::error!("Search aborted in {} ({}): {e}", loaded.class.name, loaded.origin);
        return Vec::new();
    }
    results
        .into_iter()
        .map(|result| SearchHit::new(loaded, result))
        .collect()
}
