//! Repeating sections and row renderers.

use serde::{Deserialize, Serialize};

use super::engine::{strip_placeholders, substitute, AssemblyOptions};
use super::record::RowRecord;

/// Renders one row-record into a markup fragment.
pub trait RowRenderer {
    fn render_row(&self, row: &RowRecord) -> String;
}

impl<F> RowRenderer for F
where
    F: Fn(&RowRecord) -> String,
{
    fn render_row(&self, row: &RowRecord) -> String {
        self(row)
    }
}

/// Row renderer backed by a fragment with per-row placeholders.
///
/// Substitution is scoped to the row: top-level scalar fields are not visible
/// here, and the produced text is never scanned again.
#[derive(Debug, Clone)]
pub struct RowTemplate {
    fragment: String,
    options: AssemblyOptions,
}

impl RowTemplate {
    pub fn new(fragment: impl Into<String>, options: AssemblyOptions) -> Self {
        Self {
            fragment: fragment.into(),
            options,
        }
    }
}

impl RowRenderer for RowTemplate {
    fn render_row(&self, row: &RowRecord) -> String {
        let rendered = substitute(
            &self.fragment,
            |name| row.get(name).map(|value| value.render(&self.options.missing_value)),
            self.options.cleanup,
        )
        .into_owned();
        if self.options.cleanup {
            strip_placeholders(rendered)
        } else {
            rendered
        }
    }
}

/// Where a list field is expanded inside a template and how each row looks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatingSection {
    /// Name of the list field driving the expansion.
    pub list_key: String,
    /// Literal substring replaced by the rendered rows.
    pub marker: String,
    /// Fragment rendered once per row.
    pub row_template: String,
    /// Fragment used when the list is empty or absent.
    pub empty_fragment: String,
}

impl RepeatingSection {
    pub fn new(
        list_key: impl Into<String>,
        marker: impl Into<String>,
        row_template: impl Into<String>,
        empty_fragment: impl Into<String>,
    ) -> Self {
        Self {
            list_key: list_key.into(),
            marker: marker.into(),
            row_template: row_template.into(),
            empty_fragment: empty_fragment.into(),
        }
    }

    pub fn renderer(&self, options: &AssemblyOptions) -> RowTemplate {
        RowTemplate::new(self.row_template.clone(), options.clone())
    }
}
