//! Label-keyed extraction rules for header-table cells.
//!
//! Confluence storage format embeds people as `<ri:user ri:account-id="…">`
//! and status lozenges as `<ac:structured-macro>` with an
//! `<ac:parameter ac:name="title">` child. The HTML parser keeps those
//! prefixed names verbatim as local names, so they are matched by name
//! rather than through CSS selectors.

use scraper::ElementRef;

use crate::text::{clean_date_text, quoted_list, stripped_text};

const USER_TAG: &str = "ri:user";
const ACCOUNT_ID_ATTR: &str = "ri:account-id";
const PARAMETER_TAG: &str = "ac:parameter";
const PARAMETER_NAME_ATTR: &str = "ac:name";

const ACCOUNT_LABELS: &[&str] = &[
    "autores",
    "autor",
    "revisado por",
    "revisado",
    "authors",
    "author",
    "reviewed by",
    "reviewed-by",
    "reviewed",
];

const TEXT_LABELS: &[&str] = &["dominio", "domain"];

const STATUS_LABELS: &[&str] = &["estado", "status", "state"];

const DATE_LABELS: &[&str] = &[
    "fecha inicio vigencia",
    "fecha inicio",
    "fecha fin vigencia",
    "fecha fin",
    "start of validity date",
    "start-of-validity date",
    "start date",
    "end of validity date",
    "end-of-validity date",
    "end date",
];

/// How a header row's value cell is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldRule {
    /// Account ids of every embedded user reference.
    Accounts,
    /// Trimmed visible text.
    Text,
    /// Titles of every embedded status macro.
    StatusTitles,
    /// Visible text cleaned of invisible spaces.
    Date,
    /// Serialized cell markup.
    Raw,
}

impl FieldRule {
    /// Pick the rule for a header label (case-insensitive, surrounding
    /// whitespace ignored).
    pub(crate) fn for_label(label: &str) -> Self {
        let key = label.trim().to_lowercase();
        let key = key.as_str();

        if ACCOUNT_LABELS.contains(&key) {
            Self::Accounts
        } else if TEXT_LABELS.contains(&key) {
            Self::Text
        } else if STATUS_LABELS.contains(&key) {
            Self::StatusTitles
        } else if DATE_LABELS.contains(&key) {
            Self::Date
        } else {
            Self::Raw
        }
    }

    /// Extract the stringified value of `cell` under this rule.
    pub(crate) fn extract(self, cell: &ElementRef) -> String {
        match self {
            Self::Accounts => quoted_list(&account_ids(cell)),
            Self::Text => stripped_text(cell),
            Self::StatusTitles => quoted_list(&status_titles(cell)),
            Self::Date => clean_date_text(&stripped_text(cell)),
            Self::Raw => cell.html(),
        }
    }
}

fn descendant_elements<'a>(cell: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    cell.descendants().filter_map(ElementRef::wrap)
}

fn account_ids(cell: &ElementRef) -> Vec<String> {
    descendant_elements(*cell)
        .filter(|el| el.value().name() == USER_TAG)
        .filter_map(|el| el.value().attr(ACCOUNT_ID_ATTR).map(str::to_string))
        .collect()
}

fn status_titles(cell: &ElementRef) -> Vec<String> {
    descendant_elements(*cell)
        .filter(|el| {
            el.value().name() == PARAMETER_TAG
                && el.value().attr(PARAMETER_NAME_ATTR) == Some("title")
        })
        .map(|el| stripped_text(&el))
        .collect()
}
