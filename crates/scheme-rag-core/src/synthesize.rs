//! Deterministic Markdown synthesis from a flattened scheme record.
//!
//! The output layout is fixed:
//!
//! ```text
//! # <title>
//! _<ministry> • <department>_
//!
//! ## <section>            one block per non-empty rule in SECTION_RULES
//! <value>
//!
//! ## Benefits             composite blocks, in this order
//! ## Application Process
//! ## Documents Required
//! ```
//!
//! Every section resolves through [`pick_first`]: candidate paths are tried
//! in order and the first non-empty value wins. Candidates are never merged.
//! Rule order is part of the output contract.

use crate::flatten::FlatMap;
use crate::models::DocumentMetadata;

/// A single-field section: a heading and the paths that may fill it.
#[derive(Debug, Clone, Copy)]
pub struct SectionRule {
    pub label: &'static str,
    pub candidates: &'static [&'static str],
}

pub const SECTION_RULES: &[SectionRule] = &[
    SectionRule {
        label: "Level",
        candidates: &["basicDetails.level.label"],
    },
    SectionRule {
        label: "Category",
        candidates: &[
            "basicDetails.schemeSubCategory",
            "basicDetails.schemeCategory",
        ],
    },
    SectionRule {
        label: "Target Beneficiaries",
        candidates: &["basicDetails.targetBeneficiaries"],
    },
    SectionRule {
        label: "DBT Scheme",
        candidates: &["basicDetails.dbtScheme"],
    },
    SectionRule {
        label: "Implementing Agency",
        candidates: &["basicDetails.implementingAgency"],
    },
    SectionRule {
        label: "Tags",
        candidates: &["basicDetails.tags"],
    },
    SectionRule {
        label: "Open Date",
        candidates: &["basicDetails.schemeOpenDate"],
    },
    SectionRule {
        label: "Close Date",
        candidates: &["basicDetails.schemeCloseDate"],
    },
    SectionRule {
        label: "Brief Description",
        candidates: &["schemeContent.briefDescription"],
    },
    SectionRule {
        label: "Detailed Description",
        candidates: &["schemeContent.detailedDescription_md"],
    },
    SectionRule {
        label: "Eligibility",
        candidates: &["eligibilityCriteria.eligibilityDescription_md"],
    },
    SectionRule {
        label: "Official Links",
        candidates: &["schemeContent.references"],
    },
];

pub const TITLE_PATHS: &[&str] = &["basicDetails.schemeName", "schemeShortTitle", "title"];
pub const MINISTRY_PATHS: &[&str] = &["basicDetails.nodalMinistryName.label"];
pub const DEPARTMENT_PATHS: &[&str] = &["basicDetails.nodalDepartmentName.label"];

const BENEFIT_TYPE_PATHS: &[&str] = &["schemeContent.benefitTypes.label"];
const BENEFITS_PREFIX: &str = "schemeContent.benefits[";
const APPLICATION_STEPS_PREFIX: &str = "applicationProcess[0].process[";
const APPLICATION_URL_PATHS: &[&str] = &["applicationProcess[0].url", "applicationProcess.url"];
const DOCUMENT_PREFIXES: &[&str] = &[
    "application.documents[",
    "applicationProcess[0].documents[",
    "schemeContent.documentsRequired[",
];

/// Harvested list entries end in this path segment.
const TEXT_SUFFIX: &str = ".text";

/// Byline separator between ministry and department.
const BYLINE_SEPARATOR: &str = " • ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    /// `- item`
    Bulleted,
    /// `1. item`
    Numbered,
}

/// Return the first candidate whose trimmed value is non-empty, or `""`.
pub fn pick_first(flat: &FlatMap, candidates: &[&str]) -> String {
    candidates
        .iter()
        .filter_map(|path| flat.get(path))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}

/// Gather every `<prefix>….text` value, in document order, as a list.
pub fn collect_texts(flat: &FlatMap, prefix: &str, style: ListStyle) -> String {
    let items: Vec<&str> = flat
        .iter()
        .filter(|(path, _)| path.starts_with(prefix) && path.ends_with(TEXT_SUFFIX))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match style {
            ListStyle::Bulleted => format!("- {}", item),
            ListStyle::Numbered => format!("{}. {}", i + 1, item),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Title, ministry and department, resolved independently of section rendering.
pub fn extract_metadata(flat: &FlatMap) -> DocumentMetadata {
    DocumentMetadata {
        title: pick_first(flat, TITLE_PATHS),
        ministry: pick_first(flat, MINISTRY_PATHS),
        department: pick_first(flat, DEPARTMENT_PATHS),
    }
}

/// Project a flat map into the scheme's Markdown document.
pub fn synthesize(flat: &FlatMap) -> SynthesizedDocument {
    let metadata = extract_metadata(flat);
    let mut blocks: Vec<String> = Vec::new();

    if !metadata.title.is_empty() {
        blocks.push(format!("# {}", metadata.title));
    }
    let byline: Vec<&str> = [metadata.ministry.as_str(), metadata.department.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
    if !byline.is_empty() {
        blocks.push(format!("_{}_", byline.join(BYLINE_SEPARATOR)));
    }
    // Spacer between the header and the first section.
    blocks.push(String::new());

    for rule in SECTION_RULES {
        let value = pick_first(flat, rule.candidates);
        if !value.is_empty() {
            blocks.push(format!("## {}\n{}", rule.label, value));
        }
    }

    if let Some(block) = benefits_block(flat) {
        blocks.push(block);
    }
    if let Some(block) = application_block(flat) {
        blocks.push(block);
    }
    if let Some(block) = documents_block(flat) {
        blocks.push(block);
    }

    SynthesizedDocument {
        text: blocks.join("\n\n").trim().to_string(),
        metadata,
    }
}

fn benefits_block(flat: &FlatMap) -> Option<String> {
    let parts = non_empty(vec![
        pick_first(flat, BENEFIT_TYPE_PATHS),
        collect_texts(flat, BENEFITS_PREFIX, ListStyle::Bulleted),
    ]);
    (!parts.is_empty()).then(|| format!("## Benefits\n{}", parts.join("\n\n")))
}

fn application_block(flat: &FlatMap) -> Option<String> {
    let parts = non_empty(vec![
        collect_texts(flat, APPLICATION_STEPS_PREFIX, ListStyle::Numbered),
        pick_first(flat, APPLICATION_URL_PATHS),
    ]);
    (!parts.is_empty()).then(|| format!("## Application Process\n{}", parts.join("\n\n")))
}

fn documents_block(flat: &FlatMap) -> Option<String> {
    DOCUMENT_PREFIXES
        .iter()
        .map(|prefix| collect_texts(flat, prefix, ListStyle::Bulleted))
        .find(|list| !list.is_empty())
        .map(|list| format!("## Documents Required\n{}", list))
}

fn non_empty(parts: Vec<String>) -> Vec<String> {
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use serde_json::json;

    fn synth(record: serde_json::Value) -> SynthesizedDocument {
        synthesize(&flatten(&record).unwrap())
    }

    #[test]
    fn test_title_and_brief_description_preserve_numbers() {
        let doc = synth(json!({
            "basicDetails": {"schemeName": "PM Kisan"},
            "schemeContent": {"briefDescription": "Income support of ₹6,000/year."}
        }));
        assert!(doc.text.starts_with("# PM Kisan"));
        assert!(doc
            .text
            .contains("## Brief Description\nIncome support of ₹6,000/year."));
        assert_eq!(doc.metadata.title, "PM Kisan");
    }

    #[test]
    fn test_boolean_section_renders_capitalized() {
        let doc = synth(json!({
            "basicDetails": {"schemeName": "PM Kisan", "dbtScheme": true}
        }));
        assert!(doc.text.contains("## DBT Scheme\nTrue"));
    }

    #[test]
    fn test_full_header_layout() {
        let doc = synth(json!({
            "basicDetails": {
                "schemeName": "PM Kisan",
                "nodalMinistryName": {"label": "Ministry of Agriculture"},
                "nodalDepartmentName": {"label": "Department of Agriculture"},
                "level": {"label": "Central"}
            }
        }));
        assert_eq!(
            doc.text,
            "# PM Kisan\n\n_Ministry of Agriculture • Department of Agriculture_\n\n\n\n## Level\nCentral"
        );
        assert_eq!(doc.metadata.ministry, "Ministry of Agriculture");
        assert_eq!(doc.metadata.department, "Department of Agriculture");
    }

    #[test]
    fn test_absent_sections_are_omitted() {
        let doc = synth(json!({
            "basicDetails": {"schemeName": "X", "tags": "", "schemeOpenDate": "   "}
        }));
        assert_eq!(doc.text, "# X");
        assert!(!doc.text.contains("## Tags"));
        assert!(!doc.text.contains("## Open Date"));
    }

    #[test]
    fn test_pick_first_respects_candidate_order() {
        let flat = flatten(&json!({
            "basicDetails": {"schemeCategory": "Education", "schemeSubCategory": "Scholarship"}
        }))
        .unwrap();
        assert_eq!(
            pick_first(&flat, SECTION_RULES[1].candidates),
            "Scholarship"
        );

        let fallback = flatten(&json!({
            "basicDetails": {"schemeCategory": "Education", "schemeSubCategory": " "}
        }))
        .unwrap();
        assert_eq!(
            pick_first(&fallback, SECTION_RULES[1].candidates),
            "Education"
        );
        assert_eq!(pick_first(&fallback, &["missing.path"]), "");
    }

    #[test]
    fn test_title_falls_back_to_short_title() {
        let doc = synth(json!({"schemeShortTitle": "NSP", "title": "ignored"}));
        assert_eq!(doc.metadata.title, "NSP");
    }

    #[test]
    fn test_sections_follow_rule_order() {
        let doc = synth(json!({
            "eligibilityCriteria": {"eligibilityDescription_md": "Must be a farmer."},
            "basicDetails": {"schemeName": "S", "tags": "Farmer, Income", "level": {"label": "Central"}},
            "schemeContent": {"briefDescription": "Brief."}
        }));
        let level = doc.text.find("## Level").unwrap();
        let tags = doc.text.find("## Tags").unwrap();
        let brief = doc.text.find("## Brief Description").unwrap();
        let eligibility = doc.text.find("## Eligibility").unwrap();
        assert!(level < tags && tags < brief && brief < eligibility);
    }

    #[test]
    fn test_benefits_block_combines_type_and_bullets() {
        let doc = synth(json!({
            "schemeContent": {
                "benefitTypes": {"label": "Cash"},
                "benefits": [
                    {"type": "paragraph", "children": [{"text": "₹2,000 per instalment"}]},
                    {"type": "paragraph", "children": [{"text": "  "}]},
                    {"type": "paragraph", "children": [{"text": "Three instalments a year"}]}
                ]
            }
        }));
        assert!(doc.text.contains(
            "## Benefits\nCash\n\n- ₹2,000 per instalment\n- Three instalments a year"
        ));
    }

    #[test]
    fn test_benefits_block_without_type() {
        let doc = synth(json!({"schemeContent": {"benefits": [{"text": "Only bullet"}]}}));
        assert_eq!(doc.text, "## Benefits\n- Only bullet");
    }

    #[test]
    fn test_application_process_numbered_with_url() {
        let doc = synth(json!({
            "applicationProcess": [{
                "mode": "Online",
                "url": "https://pmkisan.gov.in",
                "process": [
                    {"children": [{"text": "Visit the portal."}]},
                    {"children": [{"text": "Register with Aadhaar."}]}
                ]
            }]
        }));
        assert!(doc.text.contains(
            "## Application Process\n1. Visit the portal.\n2. Register with Aadhaar.\n\nhttps://pmkisan.gov.in"
        ));
    }

    #[test]
    fn test_documents_first_non_empty_prefix_wins() {
        let doc = synth(json!({
            "applicationProcess": [{"documents": [{"text": "Aadhaar card"}]}],
            "schemeContent": {"documentsRequired": [{"text": "Should not appear"}]}
        }));
        assert!(doc.text.contains("## Documents Required\n- Aadhaar card"));
        assert!(!doc.text.contains("Should not appear"));

        let fallback = synth(json!({
            "schemeContent": {"documentsRequired": [{"text": "Land records"}]}
        }));
        assert!(fallback
            .text
            .contains("## Documents Required\n- Land records"));
    }

    #[test]
    fn test_empty_record_yields_empty_text() {
        let doc = synth(json!({}));
        assert_eq!(doc.text, "");
        assert_eq!(doc.metadata, DocumentMetadata::default());
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let record = json!({
            "basicDetails": {"schemeName": "A", "tags": ["x", "y"]},
            "schemeContent": {"benefits": [{"text": "b1"}, {"text": "b2"}]}
        });
        let first = synth(record.clone());
        let second = synth(record);
        assert_eq!(first, second);
    }
}
