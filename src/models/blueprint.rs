// src/models/blueprint.rs

//! Compiled extraction rules.
//!
//! The declarative config structures ([`SectionConfig`], [`FieldSpecConfig`])
//! are compiled into immutable [`Blueprint`]s and [`SectionSpec`]s before any
//! document is processed. A malformed pattern or anchor fails here, at load
//! time, not mid-extraction.

use regex::Regex;
use scraper::Selector;

use crate::error::{AppError, Result};
use crate::models::config::{FieldSpecConfig, ProfileConfig, SectionConfig};

/// How many subtrees a section anchor is expected to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// Exactly one subtree; a missing anchor is a structural miss.
    #[default]
    One,
    /// Zero or more subtrees in document order; zero matches is valid.
    Many,
}

/// Compiled anchor for one section kind.
#[derive(Debug, Clone)]
pub struct SectionSpec {
    /// Section kind (header, client, itinerary, address, prices)
    pub name: String,

    /// CSS selector compiled from the tag name and attribute filter
    pub selector: Selector,

    /// Expected match cardinality
    pub cardinality: Cardinality,
}

impl SectionSpec {
    /// Compile a tag + attribute filter into a selector.
    pub fn compile(
        name: &str,
        tag: &str,
        attrs: &std::collections::BTreeMap<String, String>,
        cardinality: Cardinality,
    ) -> Result<Self> {
        let mut css = tag.to_string();
        for (key, value) in attrs {
            css.push_str(&format!("[{key}=\"{value}\"]"));
        }
        let selector = Selector::parse(&css)
            .map_err(|e| AppError::selector(css.as_str(), format!("{e:?}")))?;
        Ok(Self {
            name: name.to_string(),
            selector,
            cardinality,
        })
    }
}

/// One compiled field-extraction rule.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Signed line index; negative counts from the end of the sequence
    pub line_index: i32,

    /// Pattern with exactly one capture group
    pub pattern: Regex,

    /// Whether a miss produces a diagnostic
    pub required: bool,
}

/// Compiled set of field rules for one section kind.
#[derive(Debug, Clone)]
pub struct Blueprint {
    section: String,
    fields: Vec<(String, FieldRule)>,
}

impl Blueprint {
    /// Compile the raw field specs for a section, validating each pattern.
    ///
    /// Every pattern must compile and carry exactly one capture group: the
    /// group's content becomes the field value on a match.
    pub fn compile(
        section: &str,
        specs: &std::collections::BTreeMap<String, FieldSpecConfig>,
    ) -> Result<Self> {
        let mut fields = Vec::with_capacity(specs.len());
        for (name, spec) in specs {
            let pattern = Regex::new(&spec.pattern)?;
            // captures_len() counts the implicit whole-match group.
            if pattern.captures_len() != 2 {
                return Err(AppError::validation(format!(
                    "field '{name}' in section '{section}': pattern '{}' must have \
                     exactly one capture group, found {}",
                    spec.pattern,
                    pattern.captures_len() - 1
                )));
            }
            fields.push((
                name.clone(),
                FieldRule {
                    line_index: spec.line,
                    pattern,
                    required: spec.required,
                },
            ));
        }
        Ok(Self {
            section: section.to_string(),
            fields,
        })
    }

    /// Section kind this blueprint is scoped to.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Field rules in stable (name-sorted) order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }
}

/// Fully compiled extraction profile for one document kind.
pub struct ExtractionProfile {
    /// Fixed-cardinality sections with their blueprints, in merge order
    pub fixed: Vec<(SectionSpec, Blueprint)>,

    /// Price table anchor
    pub prices: SectionSpec,

    /// Repeated address anchor with the shared address blueprint
    pub addresses: (SectionSpec, Blueprint),

    /// Vendor label to canonical name renames for the price table
    pub price_renames: Vec<(String, String)>,

    /// Characters to skip off the raw waiting-time cell to keep the price
    pub waiting_time_offset: usize,
}

impl ExtractionProfile {
    /// Compile a profile from its declarative configuration.
    pub fn compile(config: &ProfileConfig) -> Result<Self> {
        let mut fixed = Vec::with_capacity(config.sections.len());
        for section in &config.sections {
            if section.cardinality != Cardinality::One {
                return Err(AppError::validation(format!(
                    "fixed section '{}' must have cardinality 'one'",
                    section.name
                )));
            }
            fixed.push(Self::compile_section(section)?);
        }

        let prices = SectionSpec::compile(
            "prices",
            &config.prices.tag,
            &config.prices.attrs,
            Cardinality::One,
        )?;

        if config.addresses.cardinality != Cardinality::Many {
            return Err(AppError::validation(format!(
                "address section '{}' must have cardinality 'many'",
                config.addresses.name
            )));
        }
        let addresses = Self::compile_section(&config.addresses)?;

        let price_renames = config
            .prices
            .renames
            .iter()
            .map(|r| (r.from.clone(), r.to.clone()))
            .collect();

        Ok(Self {
            fixed,
            prices,
            addresses,
            price_renames,
            waiting_time_offset: config.prices.waiting_time_offset,
        })
    }

    fn compile_section(config: &SectionConfig) -> Result<(SectionSpec, Blueprint)> {
        let spec = SectionSpec::compile(
            &config.name,
            &config.tag,
            &config.attrs,
            config.cardinality,
        )?;
        let blueprint = Blueprint::compile(&config.name, &config.fields)?;
        Ok((spec, blueprint))
    }
}
