//! Glossary store: terms, their definitions, and outgoing references.
//!
//! The dataset is JSON in one of three shapes, all keyed or ordered the way
//! the file lists them:
//!
//! ```text
//! { "llm": { "name": "Large Language Model", "definition": "...", "references": ["transformer"] } }
//! { "AI": "Artificial Intelligence" }
//! [ { "term": "AI", "definition": "Artificial Intelligence", "related_terms": ["ML"] } ]
//! ```
//!
//! File order is the canonical term order used to align partitions.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::errors::{GlossaError, Result};

/// Fields holding outgoing references, in merge order
const REFERENCE_FIELDS: [&str; 2] = ["references", "related_terms"];

/// A glossary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Definition text; empty when the dataset omits it
    pub definition: String,
    /// Outgoing references to other term identifiers, as listed in the dataset
    pub references: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl Term {
    /// Create a term without references
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            definition: definition.into(),
            references: Vec::new(),
            tags: Vec::new(),
            examples: Vec::new(),
            last_updated: None,
        }
    }

    /// Builder-style reference list
    pub fn with_references<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the definition carries any non-whitespace text
    pub fn has_definition(&self) -> bool {
        !self.definition.trim().is_empty()
    }
}

/// A reference that names no term in the glossary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    pub from: String,
    pub target: String,
}

/// Outgoing references split by whether they resolve
#[derive(Debug, Clone, Default)]
pub struct ReferenceResolution {
    /// Resolved, de-duplicated, non-self references per term, in glossary order
    pub resolved: IndexMap<String, Vec<String>>,
    /// References to identifiers absent from the glossary
    pub unresolved: Vec<UnresolvedReference>,
    /// Number of references from a term to itself
    pub self_references: usize,
    /// Number of repeated references within one term
    pub duplicate_references: usize,
}

impl ReferenceResolution {
    /// Terms with at least one resolved outgoing reference
    pub fn terms_with_references(&self) -> usize {
        self.resolved.values().filter(|refs| !refs.is_empty()).count()
    }
}

/// Outcome of validating a glossary file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub terms: usize,
    pub empty_definitions: usize,
    pub unresolved_references: usize,
    pub self_references: usize,
    pub duplicate_references: usize,
    pub terms_with_references: usize,
}

/// Ordered collection of terms keyed by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    terms: IndexMap<String, Term>,
}

impl Glossary {
    /// Create an empty glossary
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a glossary from terms, rejecting duplicate identifiers
    pub fn from_terms<I>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = Term>,
    {
        let mut glossary = Self::new();
        for term in terms {
            glossary.insert(term)?;
        }
        Ok(glossary)
    }

    /// Add a term; identifiers must be unique and non-blank
    pub fn insert(&mut self, term: Term) -> Result<()> {
        if term.id.trim().is_empty() {
            return Err(GlossaError::input_field(
                "term identifier must not be empty",
                term.id,
                "id",
            ));
        }
        if self.terms.contains_key(&term.id) {
            return Err(GlossaError::input_term(
                format!("duplicate term identifier '{}'", term.id),
                term.id,
            ));
        }
        self.terms.insert(term.id.clone(), term);
        Ok(())
    }

    /// Load and validate a glossary file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GlossaError::input(format!("Glossary file not found: {}", path.display()))
            } else {
                GlossaError::io(format!("Failed to read glossary {}", path.display()), e)
            }
        })?;

        let glossary = Self::from_json_str(&content)?;
        tracing::info!(
            "Loaded glossary with {} terms from {}",
            glossary.len(),
            path.display()
        );
        Ok(glossary)
    }

    /// Parse and validate glossary JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| GlossaError::input(format!("Glossary is not valid JSON: {e}")))?;
        Self::from_json_value(value)
    }

    /// Validate a parsed JSON document and build the glossary
    pub fn from_json_value(value: Value) -> Result<Self> {
        let glossary = match value {
            Value::Object(entries) => Self::from_keyed_entries(entries)?,
            Value::Array(entries) => Self::from_listed_entries(entries)?,
            other => {
                return Err(GlossaError::input(format!(
                    "Glossary JSON must be an object or an array, found {}",
                    json_type_name(&other)
                )))
            }
        };

        if glossary.is_empty() {
            return Err(GlossaError::input("Glossary contains no terms"));
        }
        Ok(glossary)
    }

    fn from_keyed_entries(entries: Map<String, Value>) -> Result<Self> {
        let mut glossary = Self::new();
        let mut metadata_ids: HashMap<String, String> = HashMap::new();

        for (key, entry) in entries {
            let term = match entry {
                Value::String(definition) => Term::new(key.clone(), key.clone(), definition),
                Value::Object(fields) => {
                    if let Some(id) = optional_string(&fields, &key, "id")? {
                        if let Some(previous) = metadata_ids.insert(id.clone(), key.clone()) {
                            return Err(GlossaError::input_field(
                                format!("id '{id}' is also used by '{previous}'"),
                                key,
                                "id",
                            ));
                        }
                    }
                    parse_term_fields(key.clone(), &fields)?
                }
                other => {
                    return Err(GlossaError::input_term(
                        format!(
                            "entry must be an object or a definition string, found {}",
                            json_type_name(&other)
                        ),
                        key,
                    ))
                }
            };
            glossary.insert(term)?;
        }

        Ok(glossary)
    }

    fn from_listed_entries(entries: Vec<Value>) -> Result<Self> {
        let mut glossary = Self::new();

        for (position, entry) in entries.into_iter().enumerate() {
            let label = format!("entry {}", position + 1);
            let fields = match entry {
                Value::Object(fields) => fields,
                other => {
                    return Err(GlossaError::input_term(
                        format!("entry must be an object, found {}", json_type_name(&other)),
                        label,
                    ))
                }
            };

            let id = match optional_string(&fields, &label, "id")? {
                Some(id) => id,
                None => match optional_string(&fields, &label, "term")? {
                    Some(term) => term.trim().to_string(),
                    None => optional_string(&fields, &label, "name")?.ok_or_else(|| {
                        GlossaError::input_field("entry is missing 'term'", &label, "term")
                    })?,
                },
            };

            glossary.insert(parse_term_fields(id, &fields)?)?;
        }

        Ok(glossary)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Term> {
        self.terms.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.terms.contains_key(id)
    }

    /// Term identifiers in canonical order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// Terms in canonical order
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.values()
    }

    /// Number of terms whose definition is missing or blank
    pub fn empty_definition_count(&self) -> usize {
        self.terms().filter(|term| !term.has_definition()).count()
    }

    /// Load a glossary file and check it without clustering anything
    pub fn validate_file(path: impl AsRef<Path>, strict: bool) -> Result<ValidationSummary> {
        let glossary = Self::load(path)?;
        glossary.summarize(strict)
    }

    /// Structural summary used by the `validate` stage
    pub fn summarize(&self, strict: bool) -> Result<ValidationSummary> {
        let resolution = self.resolve_references(strict)?;
        Ok(ValidationSummary {
            terms: self.len(),
            empty_definitions: self.empty_definition_count(),
            unresolved_references: resolution.unresolved.len(),
            self_references: resolution.self_references,
            duplicate_references: resolution.duplicate_references,
            terms_with_references: resolution.terms_with_references(),
        })
    }

    /// Split every term's references into resolved and unresolved.
    ///
    /// Self-references and repeats are dropped and counted. In strict mode the
    /// first unresolved reference is an input error naming both terms.
    pub fn resolve_references(&self, strict: bool) -> Result<ReferenceResolution> {
        let mut resolution = ReferenceResolution::default();

        for term in self.terms() {
            let mut seen = HashSet::new();
            let mut resolved = Vec::new();
            for target in &term.references {
                if target == &term.id {
                    resolution.self_references += 1;
                    continue;
                }
                if !seen.insert(target.as_str()) {
                    resolution.duplicate_references += 1;
                    continue;
                }
                if self.contains(target) {
                    resolved.push(target.clone());
                } else if strict {
                    return Err(GlossaError::input_field(
                        format!("reference to unknown term '{target}'"),
                        &term.id,
                        "references",
                    ));
                } else {
                    resolution.unresolved.push(UnresolvedReference {
                        from: term.id.clone(),
                        target: target.clone(),
                    });
                }
            }
            resolution.resolved.insert(term.id.clone(), resolved);
        }

        Ok(resolution)
    }
}

fn parse_term_fields(id: String, fields: &Map<String, Value>) -> Result<Term> {
    let name = match optional_string(fields, &id, "name")? {
        Some(name) => name,
        None => optional_string(fields, &id, "term")?.unwrap_or_else(|| id.clone()),
    };
    let definition = optional_string(fields, &id, "definition")?.unwrap_or_default();

    let mut references = Vec::new();
    for field in REFERENCE_FIELDS {
        references.extend(string_list(fields, &id, field)?);
    }

    Ok(Term {
        name: name.trim().to_string(),
        definition,
        references,
        tags: string_list(fields, &id, "tags")?,
        examples: string_list(fields, &id, "examples")?,
        last_updated: optional_string(fields, &id, "last_updated")?,
        id,
    })
}

fn optional_string(fields: &Map<String, Value>, term_id: &str, field: &str) -> Result<Option<String>> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(GlossaError::input_field(
            format!("'{field}' must be a string, found {}", json_type_name(other)),
            term_id,
            field,
        )),
    }
}

fn string_list(fields: &Map<String, Value>, term_id: &str, field: &str) -> Result<Vec<String>> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                Value::String(_) => Err(GlossaError::input_field(
                    format!("'{field}' must not contain empty strings"),
                    term_id,
                    field,
                )),
                other => Err(GlossaError::input_field(
                    format!(
                        "'{field}' must be a list of strings, found {}",
                        json_type_name(other)
                    ),
                    term_id,
                    field,
                )),
            })
            .collect(),
        Some(other) => Err(GlossaError::input_field(
            format!("'{field}' must be a list, found {}", json_type_name(other)),
            term_id,
            field,
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_field_of(err: &GlossaError) -> (Option<&str>, Option<&str>) {
        match err {
            GlossaError::Input { term_id, field, .. } => (term_id.as_deref(), field.as_deref()),
            other => panic!("Expected Input error, got {other:?}"),
        }
    }

    #[test]
    fn keyed_entries_keep_file_order() {
        let json = r#"{
            "zeta": {"name": "Zeta", "definition": "last letter", "references": ["alpha"]},
            "alpha": {"definition": "first letter"},
            "mid": "plain definition"
        }"#;
        let glossary = Glossary::from_json_str(json).unwrap();

        let ids: Vec<_> = glossary.ids().collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
        assert_eq!(glossary.get("alpha").unwrap().name, "alpha");
        assert_eq!(glossary.get("mid").unwrap().definition, "plain definition");
        assert_eq!(glossary.get("zeta").unwrap().references, vec!["alpha"]);
    }

    #[test]
    fn listed_entries_use_term_as_id() {
        let json = r#"[
            {"term": "AI", "definition": "Artificial Intelligence", "related_terms": ["ML"]},
            {"term": "ML", "definition": "Machine Learning"}
        ]"#;
        let glossary = Glossary::from_json_str(json).unwrap();

        assert_eq!(glossary.len(), 2);
        assert_eq!(glossary.get("AI").unwrap().references, vec!["ML"]);
        assert_eq!(glossary.ids().collect::<Vec<_>>(), vec!["AI", "ML"]);
    }

    #[test]
    fn listed_entry_without_term_is_rejected() {
        let json = r#"[{"definition": "orphan"}]"#;
        let err = Glossary::from_json_str(json).unwrap_err();
        assert_eq!(input_field_of(&err), (Some("entry 1"), Some("term")));
    }

    #[test]
    fn duplicate_listed_terms_are_rejected() {
        let json = r#"[{"term": "AI"}, {"term": "AI"}]"#;
        let err = Glossary::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("duplicate term identifier 'AI'"));
    }

    #[test]
    fn duplicate_metadata_ids_are_rejected() {
        let json = r#"{
            "a": {"id": "T-1", "definition": "x"},
            "b": {"id": "T-1", "definition": "y"}
        }"#;
        let err = Glossary::from_json_str(json).unwrap_err();
        assert_eq!(input_field_of(&err), (Some("b"), Some("id")));
    }

    #[test]
    fn non_string_definition_is_rejected() {
        let json = r#"{"llm": {"definition": 42}}"#;
        let err = Glossary::from_json_str(json).unwrap_err();
        assert_eq!(input_field_of(&err), (Some("llm"), Some("definition")));
    }

    #[test]
    fn non_list_tags_are_rejected() {
        let json = r#"{"llm": {"definition": "model", "tags": "nlp"}}"#;
        let err = Glossary::from_json_str(json).unwrap_err();
        assert_eq!(input_field_of(&err), (Some("llm"), Some("tags")));
    }

    #[test]
    fn non_string_reference_is_rejected() {
        let json = r#"{"llm": {"definition": "model", "references": [1]}}"#;
        let err = Glossary::from_json_str(json).unwrap_err();
        assert_eq!(input_field_of(&err), (Some("llm"), Some("references")));
    }

    #[test]
    fn missing_definition_is_accepted_as_empty() {
        let json = r#"{"llm": {"name": "LLM"}, "ml": {"definition": "   "}}"#;
        let glossary = Glossary::from_json_str(json).unwrap();
        assert_eq!(glossary.get("llm").unwrap().definition, "");
        assert_eq!(glossary.empty_definition_count(), 2);
    }

    #[test]
    fn scalar_and_empty_documents_are_rejected() {
        assert!(Glossary::from_json_str("42").unwrap_err().is_input_error());
        assert!(Glossary::from_json_str("{}").unwrap_err().is_input_error());
        assert!(Glossary::from_json_str("not json").unwrap_err().is_input_error());
    }

    #[test]
    fn resolution_drops_and_counts_degenerate_references() {
        let glossary = Glossary::from_terms(vec![
            Term::new("A", "A", "a").with_references(["B", "B", "A", "ghost"]),
            Term::new("B", "B", "b"),
        ])
        .unwrap();

        let resolution = glossary.resolve_references(false).unwrap();
        assert_eq!(resolution.resolved["A"], vec!["B".to_string()]);
        assert!(resolution.resolved["B"].is_empty());
        assert_eq!(resolution.self_references, 1);
        assert_eq!(resolution.duplicate_references, 1);
        assert_eq!(
            resolution.unresolved,
            vec![UnresolvedReference {
                from: "A".to_string(),
                target: "ghost".to_string()
            }]
        );
        assert_eq!(resolution.terms_with_references(), 1);
    }

    #[test]
    fn strict_resolution_fails_on_unknown_reference() {
        let glossary =
            Glossary::from_terms(vec![Term::new("A", "A", "a").with_references(["ghost"])])
                .unwrap();

        let err = glossary.resolve_references(true).unwrap_err();
        assert_eq!(input_field_of(&err), (Some("A"), Some("references")));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn load_reports_missing_file_as_input_error() {
        let err = Glossary::load("/definitely/not/here.json").unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn validate_file_summarizes_without_clustering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glossary.json");
        std::fs::write(
            &path,
            r#"{"A": {"definition": "a", "references": ["B", "ghost", "A"]},
                "B": {"definition": ""}}"#,
        )
        .unwrap();

        let summary = Glossary::validate_file(&path, false).unwrap();
        assert_eq!(summary.terms, 2);
        assert_eq!(summary.empty_definitions, 1);
        assert_eq!(summary.unresolved_references, 1);
        assert_eq!(summary.self_references, 1);
        assert_eq!(summary.terms_with_references, 1);

        assert!(Glossary::validate_file(&path, true).unwrap_err().is_input_error());
    }
}
