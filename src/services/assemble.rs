//! Record assembler.
//!
//! Composes the fixed sections, the remapped price table, and the repeated
//! address sections of one job document into a [`RawJobRecord`]. A missing
//! mandatory anchor aborts assembly for the document; field misses do not.

use scraper::Html;

use crate::models::{Diagnostic, ExtractionProfile, FieldMap, RawJobRecord};
use crate::services::{extract, locate_all_lines, locate_lines, remap_table};

/// Result of assembling one document.
///
/// `record` is `None` when a mandatory anchor was missing (a structural
/// miss); the diagnostics then explain which one.
#[derive(Debug)]
pub struct Assembly {
    pub record: Option<RawJobRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Assembles raw job records from parsed documents using one profile.
pub struct RecordAssembler {
    profile: ExtractionProfile,
}

impl RecordAssembler {
    pub fn new(profile: ExtractionProfile) -> Self {
        Self { profile }
    }

    /// Assemble one document into a record plus its diagnostic trail.
    pub fn assemble(&self, document: &Html) -> Assembly {
        let mut diagnostics = Vec::new();

        // Fixed sections, merged into one field map.
        let mut fixed_fields = FieldMap::new();
        for (spec, blueprint) in &self.profile.fixed {
            let Some(lines) = locate_lines(document, spec) else {
                diagnostics.push(Diagnostic::structural(
                    &spec.name,
                    format!("mandatory anchor for section '{}' not found", spec.name),
                ));
                return Assembly {
                    record: None,
                    diagnostics,
                };
            };
            let (fields, misses) = extract(blueprint, &lines);
            fixed_fields.extend(fields);
            diagnostics.extend(misses);
        }

        // Price table.
        let Some(price_lines) = locate_lines(document, &self.profile.prices) else {
            diagnostics.push(Diagnostic::structural(
                &self.profile.prices.name,
                "mandatory price table anchor not found",
            ));
            return Assembly {
                record: None,
                diagnostics,
            };
        };
        let price_fields = remap_table(
            price_lines.lines(),
            &self.profile.price_renames,
            self.profile.waiting_time_offset,
        );

        // Repeated address sections, in document order. Zero is valid.
        let (address_spec, address_blueprint) = &self.profile.addresses;
        let mut addresses = Vec::new();
        for lines in locate_all_lines(document, address_spec) {
            let (fields, misses) = extract(address_blueprint, &lines);
            addresses.push(fields);
            diagnostics.extend(misses);
        }

        Assembly {
            record: Some(RawJobRecord {
                fixed_fields,
                price_fields,
                addresses,
            }),
            diagnostics,
        }
    }
}
