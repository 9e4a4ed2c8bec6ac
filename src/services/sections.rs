//! Section locator.
//!
//! Finds the subtrees a [`SectionSpec`] anchors in a parsed document and
//! hands them over as line sequences. Whether a missing anchor is an error
//! is the caller's decision; repeated sections legitimately match zero times.

use scraper::Html;

use crate::models::SectionSpec;
use crate::services::LineSequence;

/// First subtree matching the anchor, as a line sequence.
///
/// `None` is a structural miss for fixed-cardinality sections.
pub fn locate_lines(document: &Html, spec: &SectionSpec) -> Option<LineSequence> {
    document
        .select(&spec.selector)
        .next()
        .map(LineSequence::from_element)
}

/// All subtrees matching the anchor, in document order.
pub fn locate_all_lines(document: &Html, spec: &SectionSpec) -> Vec<LineSequence> {
    document
        .select(&spec.selector)
        .map(LineSequence::from_element)
        .collect()
}
