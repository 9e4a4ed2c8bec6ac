//! Field extractor.
//!
//! Applies a blueprint to a line sequence one field at a time. The vendor's
//! documents are unreliable (line counts and per-line fields both vary), so
//! extraction is conservative: a miss on one field never affects the others,
//! and a miss on a required field is recorded, not raised.

use crate::models::{Blueprint, Diagnostic, FieldMap};
use crate::services::LineSequence;

/// Extract all blueprint fields from a line sequence.
///
/// A field that resolves and matches yields the content of its pattern's
/// single capture group, verbatim. A miss yields `None`; required fields
/// additionally emit a [`Diagnostic`] carrying the full line sequence.
pub fn extract(blueprint: &Blueprint, lines: &LineSequence) -> (FieldMap, Vec<Diagnostic>) {
    let mut fields = FieldMap::new();
    let mut diagnostics = Vec::new();

    for (name, rule) in blueprint.fields() {
        let resolved = lines.resolve(rule.line_index);
        let value = resolved.and_then(|(_, line)| {
            rule.pattern
                .captures(line)
                .and_then(|captures| captures.get(1))
                .map(|group| group.as_str().to_string())
        });

        if value.is_none() && rule.required {
            diagnostics.push(Diagnostic::field_miss(
                blueprint.section(),
                name,
                rule.line_index,
                resolved.map(|(index, _)| index),
                rule.pattern.as_str(),
                lines.snapshot(),
            ));
        }

        fields.insert(name.to_string(), value);
    }

    (fields, diagnostics)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::FieldSpecConfig;

    fn blueprint(section: &str, entries: &[(&str, i32, &str, bool)]) -> Blueprint {
        let specs: BTreeMap<String, FieldSpecConfig> = entries
            .iter()
            .map(|(name, line, pattern, required)| {
                (
                    name.to_string(),
                    FieldSpecConfig {
                        line: *line,
                        pattern: pattern.to_string(),
                        required: *required,
                    },
                )
            })
            .collect();
        Blueprint::compile(section, &specs).unwrap()
    }

    fn seq(lines: &[&str]) -> LineSequence {
        LineSequence::from_lines(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn extracts_client_name_and_number_from_one_line() {
        let blueprint = blueprint(
            "client",
            &[
                ("client_name", 0, r"Kunde:\s(.*)\s\|", true),
                ("client_number", 0, r".*(\d{5})$", true),
            ],
        );
        let lines = seq(&["Kunde: Max Mustermann | 12345"]);

        let (fields, diagnostics) = extract(&blueprint, &lines);

        assert_eq!(
            fields.get("client_name"),
            Some(&Some("Max Mustermann".to_string()))
        );
        assert_eq!(fields.get("client_number"), Some(&Some("12345".to_string())));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn out_of_range_required_field_misses_without_stopping_others() {
        let blueprint = blueprint(
            "client",
            &[
                ("present", 0, r"(.*)", true),
                ("beyond", 2, r"(.*)", true),
            ],
        );
        let lines = seq(&["the only line"]);

        let (fields, diagnostics) = extract(&blueprint, &lines);

        assert_eq!(fields.get("beyond"), Some(&None));
        assert_eq!(fields.get("present"), Some(&Some("the only line".to_string())));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].field.as_deref(), Some("beyond"));
        assert_eq!(diagnostics[0].resolved_index, None);
        assert_eq!(diagnostics[0].snapshot, vec!["the only line".to_string()]);
    }

    #[test]
    fn tail_anchored_field_survives_variable_leading_lines() {
        let blueprint = blueprint("address", &[("timestamp", -2, r"ST:\s(\d{2}:\d{2})", true)]);

        let short = seq(&["Abholung", "ACME", "Musterstr. 12", "10115 Berlin", "ST: 08:45", "Fertig"]);
        let long = seq(&[
            "Zustellung",
            "Beispiel AG",
            "Wegweg 3",
            "20095 Hamburg",
            "Hinweis",
            "extra",
            "ST: 11:20",
            "Fertig",
        ]);

        assert_eq!(short.resolve(-2).unwrap().0, 4);
        assert_eq!(long.resolve(-2).unwrap().0, 6);

        let (short_fields, short_diags) = extract(&blueprint, &short);
        let (long_fields, long_diags) = extract(&blueprint, &long);

        assert_eq!(short_fields.get("timestamp"), Some(&Some("08:45".to_string())));
        assert_eq!(long_fields.get("timestamp"), Some(&Some("11:20".to_string())));
        assert!(short_diags.is_empty());
        assert!(long_diags.is_empty());
    }

    #[test]
    fn optional_miss_is_silent() {
        let blueprint = blueprint("header", &[("is_payed_cash", 0, r"(BAR)", false)]);
        let lines = seq(&["Auftrag Nr. 1234567890"]);

        let (fields, diagnostics) = extract(&blueprint, &lines);

        assert_eq!(fields.get("is_payed_cash"), Some(&None));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn pattern_mismatch_on_required_field_emits_one_diagnostic() {
        let blueprint = blueprint("client", &[("client_id", 0, r".*(\d{5})$", true)]);
        let lines = seq(&["Kunde: no number here"]);

        let (fields, diagnostics) = extract(&blueprint, &lines);

        assert_eq!(fields.get("client_id"), Some(&None));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].resolved_index, Some(0));
        assert_eq!(diagnostics[0].pattern.as_deref(), Some(r".*(\d{5})$"));
    }

    #[test]
    fn extraction_is_idempotent() {
        let blueprint = blueprint(
            "address",
            &[
                ("purpose", 0, r"(Abholung|Zustellung)", true),
                ("missing", 5, r"(.*)", true),
            ],
        );
        let lines = seq(&["Abholung", "ACME"]);

        let first = extract(&blueprint, &lines);
        let second = extract(&blueprint, &lines);

        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn capture_group_content_is_taken_verbatim() {
        // No trimming beyond what the line builder already performed.
        let blueprint = blueprint("client", &[("name", 0, r"Kunde:((?:.*))", true)]);
        let lines = seq(&["Kunde: Max "]);

        let (fields, _) = extract(&blueprint, &lines);
        assert_eq!(fields.get("name"), Some(&Some(" Max ".to_string())));
    }
}
