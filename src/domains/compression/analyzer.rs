//! Best-effort structural inspection of a PDF.
//!
//! Two parsers are tried in order: lopdf, then pdf_oxide, whose xref
//! reconstruction copes with files lopdf rejects. The first one that produces
//! an answer wins; when both give up the analysis is defaulted. Only failing
//! to stat the file is reported as an error.

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdf_oxide::object::{Object as OxideObject, ObjectRef};
use pdf_oxide::PdfDocument;
use std::collections::HashSet;
use std::path::Path;

use crate::errors::{DomainError, DomainResult};
use super::types::PdfAnalysis;

/// Pages inspected for images by the primary parser
const PRIMARY_IMAGE_PAGES: usize = 5;
/// Pages inspected for images by the secondary parser
const FALLBACK_IMAGE_PAGES: usize = 3;
/// Bound on page tree depth when looking for inherited resources
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Analyze the PDF at `path`.
pub fn analyze(path: &Path) -> DomainResult<PdfAnalysis> {
    let file_size = std::fs::metadata(path)
        .map_err(|e| DomainError::Io(format!("Failed to stat {}: {}", path.display(), e)))?
        .len();

    let analysis = primary_pass(path, file_size)
        .or_else(|| fallback_pass(path, file_size))
        .unwrap_or_else(|| {
            log::debug!("Neither parser could read {}, using defaults", path.display());
            PdfAnalysis::unreadable(file_size)
        });

    log::debug!("Analysis of {}: {:?}", path.display(), analysis);
    Ok(analysis)
}

fn primary_pass(path: &Path, file_size: u64) -> Option<PdfAnalysis> {
    let doc = match Document::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            log::debug!("lopdf could not open {}: {}", path.display(), e);
            return None;
        }
    };

    let pages = doc.get_pages();
    let has_images = pages
        .values()
        .take(PRIMARY_IMAGE_PAGES)
        .any(|page_id| page_has_images(&doc, *page_id));
    let has_annotations = pages
        .values()
        .any(|page_id| page_has_annotations(&doc, *page_id));
    let has_forms = doc
        .catalog()
        .map(|catalog| catalog.has(b"AcroForm"))
        .unwrap_or(false);

    Some(PdfAnalysis {
        page_count: pages.len() as u32,
        has_images,
        has_forms,
        has_annotations,
        // Files that open with an empty password are decrypted on load and lose /Encrypt
        encrypted: doc.encryption_state.is_some() || doc.trailer.has(b"Encrypt"),
        file_size,
    })
}

fn fallback_pass(path: &Path, file_size: u64) -> Option<PdfAnalysis> {
    let mut doc = match PdfDocument::open(path) {
        Ok(doc) => doc,
        Err(e) => {
            log::debug!("pdf_oxide could not open {}: {}", path.display(), e);
            return None;
        }
    };
    let page_count = match doc.page_count() {
        Ok(count) => count as u32,
        Err(e) => {
            log::debug!("pdf_oxide could not count pages of {}: {}", path.display(), e);
            return None;
        }
    };

    let page_resources = oxide_page_resources(&mut doc, FALLBACK_IMAGE_PAGES);
    let has_images = page_resources
        .iter()
        .flatten()
        .any(|resources| oxide_resources_have_images(&mut doc, resources));
    let encrypted = doc
        .trailer()
        .as_dict()
        .map(|trailer| trailer.contains_key("Encrypt"))
        .unwrap_or(false);

    Some(PdfAnalysis {
        page_count,
        has_images,
        encrypted,
        file_size,
        ..Default::default()
    })
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    doc.dereference(object).ok().map(|(_, resolved)| resolved)
}

fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, object)?.as_dict().ok()
}

/// Resources of a page, following inheritance through the page tree
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(doc, resources);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn page_has_images(doc: &Document, page_id: ObjectId) -> bool {
    let xobjects = match page_resources(doc, page_id)
        .and_then(|resources| resources.get(b"XObject").ok())
        .and_then(|xobjects| resolve_dict(doc, xobjects))
    {
        Some(xobjects) => xobjects,
        None => return false,
    };

    xobjects.iter().any(|(_, value)| {
        resolve(doc, value)
            .and_then(|object| object.as_stream().ok())
            .and_then(|stream| stream.dict.get(b"Subtype").ok())
            .and_then(|subtype| subtype.as_name().ok())
            .map(|name| name == b"Image")
            .unwrap_or(false)
    })
}

fn page_has_annotations(doc: &Document, page_id: ObjectId) -> bool {
    doc.get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Annots").ok())
        .and_then(|annots| resolve(doc, annots))
        .and_then(|annots| annots.as_array().ok())
        .map(|annots| !annots.is_empty())
        .unwrap_or(false)
}

fn oxide_resolve(doc: &mut PdfDocument, object: &OxideObject) -> Option<OxideObject> {
    match object.as_reference() {
        Some(reference) => doc.load_object(reference).ok(),
        None => Some(object.clone()),
    }
}

/// Effective resources of the first `limit` pages in document order.
/// A page without resources yields `None`.
fn oxide_page_resources(doc: &mut PdfDocument, limit: usize) -> Vec<Option<OxideObject>> {
    let root = match doc
        .catalog()
        .ok()
        .and_then(|catalog| catalog.as_dict()?.get("Pages").cloned())
    {
        Some(root) => root,
        None => return Vec::new(),
    };

    let mut visited: HashSet<ObjectRef> = HashSet::new();
    let mut pending: Vec<(OxideObject, Option<OxideObject>, usize)> = vec![(root, None, 0)];
    let mut pages = Vec::new();

    while let Some((node, inherited, depth)) = pending.pop() {
        if pages.len() >= limit {
            break;
        }
        if depth > MAX_INHERITANCE_DEPTH {
            continue;
        }
        if let Some(reference) = node.as_reference() {
            if !visited.insert(reference) {
                continue;
            }
        }

        let node = match oxide_resolve(doc, &node) {
            Some(node) => node,
            None => continue,
        };
        let dict = match node.as_dict() {
            Some(dict) => dict,
            None => continue,
        };
        let resources = dict.get("Resources").cloned().or(inherited);

        match dict.get("Kids").and_then(|kids| oxide_resolve(doc, kids)) {
            Some(OxideObject::Array(kids)) => {
                // Reversed so the first kid is popped first
                for kid in kids.into_iter().rev() {
                    pending.push((kid, resources.clone(), depth + 1));
                }
            }
            _ => pages.push(resources),
        }
    }

    pages
}

fn oxide_resources_have_images(doc: &mut PdfDocument, resources: &OxideObject) -> bool {
    let resources = match oxide_resolve(doc, resources) {
        Some(resources) => resources,
        None => return false,
    };
    let xobjects = match resources
        .as_dict()
        .and_then(|dict| dict.get("XObject"))
        .and_then(|xobjects| oxide_resolve(doc, xobjects))
    {
        Some(xobjects) => xobjects,
        None => return false,
    };
    let entries: Vec<OxideObject> = match xobjects.as_dict() {
        Some(dict) => dict.values().cloned().collect(),
        None => return false,
    };

    entries.iter().any(|entry| {
        oxide_resolve(doc, entry)
            .map(|object| oxide_is_image(&object))
            .unwrap_or(false)
    })
}

fn oxide_is_image(object: &OxideObject) -> bool {
    object
        .as_dict()
        .and_then(|dict| dict.get("Subtype"))
        .and_then(|subtype| subtype.as_name())
        == Some("Image")
}

/// Check that a written PDF opens cleanly with both parsers.
pub fn check_integrity(path: &Path) -> DomainResult<()> {
    let doc = Document::load(path)
        .map_err(|e| DomainError::Integrity(format!("{} does not parse: {}", path.display(), e)))?;
    if doc.get_pages().is_empty() {
        return Err(DomainError::Integrity(format!("{} has no pages", path.display())));
    }

    let mut secondary = PdfDocument::open(path).map_err(|e| {
        DomainError::Integrity(format!("{} does not parse with pdf_oxide: {}", path.display(), e))
    })?;
    match secondary.page_count() {
        Ok(count) if count > 0 => Ok(()),
        Ok(_) => Err(DomainError::Integrity(format!("{} has no pages for pdf_oxide", path.display()))),
        Err(e) => Err(DomainError::Integrity(format!(
            "{} page tree is unreadable with pdf_oxide: {}",
            path.display(),
            e
        ))),
    }
}
