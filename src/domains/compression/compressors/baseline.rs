use async_trait::async_trait;
use lopdf::{Dictionary, Document, Object, ObjectId};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domains::compression::types::{BackendError, BackendErrorKind, BackendResult, PdfMethod};
use super::structural::{compress_page_contents, library_error};
use super::{persist_output, run_blocking, staging_file, PdfBackend};

/// Last-resort method: compress page contents, merge duplicate streams and
/// write the document back with a plain cross-reference table.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaselineBackend;

impl BaselineBackend {
    pub fn new() -> Self {
        Self
    }
}

fn stream_digest(dict: &Dictionary, content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{:?}", dict).as_bytes());
    hasher.update(content);
    hex::encode(hasher.finalize())
}

fn remap_references(object: &mut Object, replacements: &BTreeMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            if let Some(kept) = replacements.get(&*id) {
                *id = *kept;
            }
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                remap_references(item, replacements);
            }
        }
        Object::Dictionary(dict) => remap_dictionary(dict, replacements),
        Object::Stream(stream) => remap_dictionary(&mut stream.dict, replacements),
        _ => {}
    }
}

fn remap_dictionary(dict: &mut Dictionary, replacements: &BTreeMap<ObjectId, ObjectId>) {
    for (_, value) in dict.iter_mut() {
        remap_references(value, replacements);
    }
}

/// Merge byte-identical stream objects, pointing every reference at the
/// first copy. Returns the number of objects removed.
pub(crate) fn deduplicate_streams(doc: &mut Document) -> usize {
    let mut first_seen: HashMap<String, ObjectId> = HashMap::new();
    let mut replacements: BTreeMap<ObjectId, ObjectId> = BTreeMap::new();

    for (id, object) in &doc.objects {
        if let Object::Stream(stream) = object {
            let digest = stream_digest(&stream.dict, &stream.content);
            match first_seen.get(&digest) {
                Some(kept) => {
                    replacements.insert(*id, *kept);
                }
                None => {
                    first_seen.insert(digest, *id);
                }
            }
        }
    }

    if replacements.is_empty() {
        return 0;
    }

    for object in doc.objects.values_mut() {
        remap_references(object, &replacements);
    }
    remap_dictionary(&mut doc.trailer, &replacements);
    for duplicate in replacements.keys() {
        doc.objects.remove(duplicate);
    }

    replacements.len()
}

fn rewrite(method: PdfMethod, input: &Path, output: &Path) -> BackendResult {
    let mut doc = Document::load(input).map_err(|e| library_error(method, e))?;

    compress_page_contents(&mut doc);
    let merged = deduplicate_streams(&mut doc);
    doc.prune_objects();
    doc.renumber_objects();
    if merged > 0 {
        log::debug!("{}: merged {} duplicate streams", input.display(), merged);
    }

    let mut staged = staging_file(method, output)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        doc.save_to(&mut writer).map_err(|e| library_error(method, e))?;
        writer
            .flush()
            .map_err(|e| BackendError::new(method, BackendErrorKind::Io, e.to_string()))?;
    }

    persist_output(method, staged, output)
}

#[async_trait]
impl PdfBackend for BaselineBackend {
    fn method(&self) -> PdfMethod {
        PdfMethod::Baseline
    }

    async fn apply(&self, input: &Path, output: &Path) -> BackendResult {
        let method = self.method();
        let input = input.to_path_buf();
        let output = output.to_path_buf();
        run_blocking(method, move || rewrite(method, &input, &output)).await
    }
}
