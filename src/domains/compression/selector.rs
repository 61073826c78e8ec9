//! Method selection and the fallback attempt order.

use super::types::{PdfAnalysis, PdfMethod, ToolAvailability};

/// Files above this size with images go to the rasterizer first
pub const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// The method used when analysis is unavailable; never needs an external tool
pub const SAFE_METHOD: PdfMethod = PdfMethod::Structural;

/// Pick the preferred method for a file. Pure and total.
pub fn choose(file_size: u64, analysis: &PdfAnalysis, availability: &ToolAvailability) -> PdfMethod {
    let ghostscript = availability.is_available(PdfMethod::Ghostscript);

    if file_size > LARGE_FILE_THRESHOLD && analysis.has_images && ghostscript {
        return PdfMethod::Ghostscript;
    }
    // Interactive content is fragile under aggressive rewriting
    if analysis.has_forms || analysis.has_annotations {
        return SAFE_METHOD;
    }
    if availability.is_available(PdfMethod::Qpdf) {
        return PdfMethod::Qpdf;
    }
    if ghostscript {
        return PdfMethod::Ghostscript;
    }
    SAFE_METHOD
}

/// Attempt sequence: the chosen method, then every other available method
/// by priority. Unavailable methods never appear.
pub fn attempt_order(chosen: PdfMethod, availability: &ToolAvailability) -> Vec<PdfMethod> {
    let mut order = Vec::with_capacity(PdfMethod::ALL.len());
    if availability.is_available(chosen) {
        order.push(chosen);
    }
    for method in PdfMethod::by_priority() {
        if method != chosen && availability.is_available(method) {
            order.push(method);
        }
    }
    order
}
