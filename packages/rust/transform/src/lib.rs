//! Confluence page → metadata records.
//!
//! Turns the storage-format body of a Confluence page into two records:
//! [`GeneralMetadata`] (fixed page fields plus every header-table row) and
//! [`FilterMetadata`] (the fixed attribute set used for search filtering).
//! No I/O happens here; the same input always yields the same output.

mod header;
mod text;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, instrument};

use docflow_shared::{ContentMap, FilterAttributes, FilterMetadata, GeneralMetadata};

use crate::header::FieldRule;
use crate::text::stripped_text;

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static HEADER_CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("valid selector"));
static DATA_CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector"));

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A page body split into its header table and narrative content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitContent {
    /// Serialized first `<table>` of the body, or empty when there is none.
    pub header_html: String,
    /// The body with that table removed.
    pub content_html: String,
}

// ---------------------------------------------------------------------------
// Transformer
// ---------------------------------------------------------------------------

/// Extract both metadata records from a fetched page.
///
/// The markup is read from `body.storage.value`; a missing body behaves like
/// an empty one.
pub fn extract_content(document: &ContentMap) -> (GeneralMetadata, FilterMetadata) {
    let markup = lookup(document, &["body", "storage", "value"])
        .and_then(Value::as_str)
        .unwrap_or_default();
    transform(markup, document)
}

/// Build both metadata records from `markup` and the page it belongs to.
///
/// 1. Reads the four fixed page fields into the general record
/// 2. Reads the filter attributes
/// 3. Splits off the header table and extracts one entry per labelled row
/// 4. Merges header entries over the fixed fields (a colliding label wins)
#[instrument(skip_all, fields(page_id = %string_field(document, &["id"])))]
pub fn transform(markup: &str, document: &ContentMap) -> (GeneralMetadata, FilterMetadata) {
    let mut general = fixed_general_metadata(document);
    let filter = filter_metadata(document);

    let split = split_html_content(markup);
    let header = extract_header_metadata(&split.header_html);
    let header_fields = header.len();

    for (label, value) in header {
        general.insert(label, value);
    }

    debug!(
        header_fields,
        content_len = split.content_html.len(),
        "page metadata extracted"
    );

    (general, filter)
}

/// Detach the first `<table>` from `html`.
pub fn split_html_content(html: &str) -> SplitContent {
    let mut doc = Html::parse_fragment(html);

    let first_table = doc
        .select(&TABLE_SELECTOR)
        .next()
        .map(|table| (table.id(), table.html()));

    let header_html = match first_table {
        Some((id, table_html)) => {
            if let Some(mut node) = doc.tree.get_mut(id) {
                node.detach();
            }
            table_html
        }
        None => String::new(),
    };

    SplitContent {
        header_html,
        content_html: doc.root_element().inner_html(),
    }
}

/// Extract `label → value` pairs from a serialized header table.
///
/// Only rows with both a `<th>` and a `<td>` count; the first of each is used.
/// Later rows overwrite earlier rows with the same label.
pub fn extract_header_metadata(header_html: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    if header_html.is_empty() {
        return metadata;
    }

    let doc = Html::parse_fragment(header_html);
    for row in doc.select(&ROW_SELECTOR) {
        let Some(header_cell) = row.select(&HEADER_CELL_SELECTOR).next() else {
            continue;
        };
        let Some(data_cell) = row.select(&DATA_CELL_SELECTOR).next() else {
            continue;
        };

        let label = stripped_text(&header_cell);
        let value = FieldRule::for_label(&label).extract(&data_cell);
        metadata.insert(label, value);
    }

    metadata
}

// ---------------------------------------------------------------------------
// Fixed fields
// ---------------------------------------------------------------------------

fn fixed_general_metadata(document: &ContentMap) -> GeneralMetadata {
    let mut general = GeneralMetadata::default();
    general.insert("page_id", value_field(document, &["id"]));
    general.insert(
        "page_version_number",
        value_field(document, &["version", "number"]),
    );
    general.insert("page_status", value_field(document, &["status"]));
    general.insert("page_title", value_field(document, &["title"]));
    general
}

fn filter_metadata(document: &ContentMap) -> FilterMetadata {
    FilterMetadata {
        metadata_attributes: FilterAttributes {
            id: string_field(document, &["id"]),
            title: string_field(document, &["title"]),
            space: string_field(document, &["space", "key"]),
            spacename: string_field(document, &["space", "name"]),
            spacetype: string_field(document, &["space", "type"]),
            spacestatus: string_field(document, &["space", "status"]),
            base64_encoded_ari: string_field(document, &["base64EncodedAri"]),
            ari: string_field(document, &["ari"]),
            kind: string_field(document, &["type"]),
            status: string_field(document, &["status"]),
        },
    }
}

fn lookup<'a>(document: &'a ContentMap, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(document.get(*first)?, |value, key| value.get(*key))
}

/// The value at `path` as-is, explicit `null` included, or `""` when absent.
fn value_field(document: &ContentMap, path: &[&str]) -> Value {
    lookup(document, path)
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}

/// The value at `path` as a string, or `""` when absent or null.
fn string_field(document: &ContentMap, path: &[&str]) -> String {
    match lookup(document, path) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn load_page_fixture() -> ContentMap {
        let raw = fs::read_to_string(fixture_path("json/confluence-page.fixture.json"))
            .unwrap_or_else(|e| panic!("failed to read fixture: {e}"));
        serde_json::from_str(&raw).expect("fixture is a JSON object")
    }

    fn page_with_body(body: &str) -> ContentMap {
        let value = serde_json::json!({
            "id": "42",
            "title": "Page",
            "body": { "storage": { "value": body } }
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    // --- Split ---

    #[test]
    fn split_detaches_first_table_only() {
        let html = "<p>Intro</p><table><tr><th>A</th><td>1</td></tr></table>\
                    <p>Body</p><table><tr><th>B</th><td>2</td></tr></table>";
        let split = split_html_content(html);

        assert!(split.header_html.starts_with("<table>"));
        assert!(split.header_html.contains("<th>A</th>"));
        assert!(!split.header_html.contains("<th>B</th>"));

        assert!(split.content_html.contains("<p>Intro</p>"));
        assert!(split.content_html.contains("<p>Body</p>"));
        assert!(split.content_html.contains("<th>B</th>"));
        assert!(!split.content_html.contains("<th>A</th>"));
    }

    #[test]
    fn split_without_table_has_empty_header() {
        let split = split_html_content("<h1>Title</h1><p>Text</p>");
        assert_eq!(split.header_html, "");
        assert_eq!(split.content_html, "<h1>Title</h1><p>Text</p>");
    }

    // --- Header extraction ---

    #[test]
    fn header_rows_need_label_and_value() {
        let header = "<table>\
            <tr><th>Dominio</th><td> Finanzas </td></tr>\
            <tr><th>Solo etiqueta</th></tr>\
            <tr><td>solo valor</td></tr>\
            <tr><th>Notas</th><td><em>libre</em></td><td>ignorada</td></tr>\
            </table>";
        let metadata = extract_header_metadata(header);

        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata["Dominio"], "Finanzas");
        assert_eq!(metadata["Notas"], "<td><em>libre</em></td>");
    }

    #[test]
    fn empty_header_yields_no_entries() {
        assert!(extract_header_metadata("").is_empty());
    }

    #[test]
    fn authors_are_stringified_in_order() {
        let body = r#"<table><tr><th>Autores</th><td>
            <ac:link><ri:user ri:account-id="acc-1" /></ac:link>
            <ac:link><ri:user ri:account-id="acc-2" /></ac:link>
            </td></tr></table>"#;
        let (general, _) = extract_content(&page_with_body(body));
        assert_eq!(general.get("Autores"), Some(&Value::from("['acc-1', 'acc-2']")));
    }

    #[test]
    fn date_cell_strips_no_break_space() {
        let body = "<table><tr><th>Fecha inicio</th><td>01/01/2024\u{00a0}</td></tr></table>";
        let (general, _) = extract_content(&page_with_body(body));
        assert_eq!(general.get("Fecha inicio"), Some(&Value::from("01/01/2024")));
    }

    // --- Fixed fields ---

    #[test]
    fn missing_fields_default_to_empty_strings() {
        let (general, filter) = extract_content(&ContentMap::new());

        assert_eq!(general.len(), 4);
        assert_eq!(general.get("page_id"), Some(&Value::from("")));
        assert_eq!(general.get("page_version_number"), Some(&Value::from("")));
        assert_eq!(filter, FilterMetadata::default());
    }

    #[test]
    fn explicit_null_fixed_fields_stay_null() {
        let page = match serde_json::json!({"id": "42", "title": null, "status": null}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let (general, filter) = extract_content(&page);

        assert_eq!(general.get("page_id"), Some(&Value::from("42")));
        assert_eq!(general.get("page_title"), Some(&Value::Null));
        assert_eq!(general.get("page_status"), Some(&Value::Null));
        assert_eq!(general.get("page_version_number"), Some(&Value::from("")));
        assert_eq!(filter.metadata_attributes.title, "");
    }

    #[test]
    fn colliding_header_label_overwrites_fixed_field() {
        let body = "<table><tr><th>page_title</th><td>Overridden</td></tr></table>";
        let (general, _) = extract_content(&page_with_body(body));
        assert_eq!(
            general.get("page_title"),
            Some(&Value::from("<td>Overridden</td>"))
        );
    }

    // --- Fixture-based tests ---

    #[test]
    fn confluence_fixture_general_metadata() {
        let page = load_page_fixture();
        let (general, _) = extract_content(&page);

        assert_eq!(general.get("page_id"), Some(&Value::from("1732083713")));
        assert_eq!(general.get("page_version_number"), Some(&Value::from(7)));
        assert_eq!(general.get("page_status"), Some(&Value::from("current")));
        assert_eq!(
            general.get("page_title"),
            Some(&Value::from("Procedimiento de conciliación"))
        );

        assert_eq!(general.get("Autores"), Some(&Value::from("['acc-1', 'acc-2']")));
        assert_eq!(general.get("Revisado por"), Some(&Value::from("['acc-9']")));
        assert_eq!(general.get("Dominio"), Some(&Value::from("Riesgos")));
        assert_eq!(general.get("Estado"), Some(&Value::from("['Vigente']")));
        assert_eq!(
            general.get("Fecha inicio vigencia"),
            Some(&Value::from("01/01/2024"))
        );
        assert_eq!(
            general.get("Fecha fin vigencia"),
            Some(&Value::from("31/12/2024"))
        );
        assert_eq!(general.get("Versión"), Some(&Value::from("<td><p>1.2</p></td>")));

        // The second table belongs to the narrative content.
        assert!(general.get("Paso").is_none());
        assert_eq!(general.len(), 11);
    }

    #[test]
    fn confluence_fixture_filter_metadata() {
        let page = load_page_fixture();
        let (_, filter) = extract_content(&page);
        let attrs = filter.metadata_attributes;

        assert_eq!(attrs.id, "1732083713");
        assert_eq!(attrs.title, "Procedimiento de conciliación");
        assert_eq!(attrs.space, "FIN");
        assert_eq!(attrs.spacename, "Finanzas");
        assert_eq!(attrs.spacetype, "global");
        assert_eq!(attrs.spacestatus, "current");
        assert_eq!(attrs.ari, "ari:cloud:confluence::page/1732083713");
        assert!(attrs.base64_encoded_ari.starts_with("YXJp"));
        assert_eq!(attrs.kind, "page");
        assert_eq!(attrs.status, "current");
    }

    #[test]
    fn transform_is_deterministic() {
        let page = load_page_fixture();
        let first = extract_content(&page);
        let second = extract_content(&page);

        let first_json = (
            serde_json::to_string(&first.0).unwrap(),
            serde_json::to_string(&first.1).unwrap(),
        );
        let second_json = (
            serde_json::to_string(&second.0).unwrap(),
            serde_json::to_string(&second.1).unwrap(),
        );
        assert_eq!(first_json, second_json);
    }
}
