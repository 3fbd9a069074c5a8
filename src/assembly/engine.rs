//! Template assembly engine.
//!
//! Fills `{{field}}` placeholders in an HTML template from a [`DataRecord`] and
//! expands one repeating section for the record's list field. Every call is a
//! pure transformation of its inputs.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::borrow::Cow;

use super::record::{DataRecord, RowRecord};
use super::section::{RepeatingSection, RowRenderer};

pub const DEFAULT_MISSING_VALUE: &str = "-";

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder pattern is valid");
    static ref FIELD_NAME: Regex =
        Regex::new(r"^[A-Za-z0-9_]+$").expect("field name pattern is valid");
}

/// Whether `name` may appear inside a `{{...}}` placeholder.
pub fn is_field_name(name: &str) -> bool {
    FIELD_NAME.is_match(name)
}

/// Field names of all well-formed placeholders in `template`, in order of
/// first appearance.
pub fn placeholder_names(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = &caps[1];
        if is_field_name(name) && !names.iter().any(|known| known == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Single left-to-right placeholder pass.
///
/// Resolved tokens are replaced by `lookup`'s value, which is never scanned
/// again. Unresolved tokens stay literal unless `cleanup` is set.
pub(crate) fn substitute<'t, F>(text: &'t str, lookup: F, cleanup: bool) -> Cow<'t, str>
where
    F: Fn(&str) -> Option<String>,
{
    PLACEHOLDER.replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        if is_field_name(name) {
            if let Some(value) = lookup(name) {
                return value;
            }
        }
        if cleanup {
            String::new()
        } else {
            caps[0].to_string()
        }
    })
}

/// Remove every remaining `{{...}}` token, including ones carried in by
/// substituted values.
pub(crate) fn strip_placeholders(text: String) -> String {
    if PLACEHOLDER.is_match(&text) {
        PLACEHOLDER.replace_all(&text, "").into_owned()
    } else {
        text
    }
}

/// Knobs for how missing data is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyOptions {
    /// Text used for null or empty field values.
    pub missing_value: String,
    /// Remove unresolved `{{...}}` tokens from the output.
    pub cleanup: bool,
}

impl AssemblyOptions {
    pub fn new(missing_value: impl Into<String>) -> Self {
        Self {
            missing_value: missing_value.into(),
            cleanup: false,
        }
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self::new(DEFAULT_MISSING_VALUE)
    }
}

/// Stateless engine configured with [`AssemblyOptions`].
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    options: AssemblyOptions,
}

impl TemplateEngine {
    pub fn new(options: AssemblyOptions) -> Self {
        Self { options }
    }

    /// Replace every `{{key}}` for each scalar key of `data`.
    ///
    /// The list field is never substituted. Placeholders without a matching
    /// key are left as-is unless cleanup is enabled, in which case no token
    /// survives in the output.
    pub fn fill_scalars(&self, template: &str, data: &DataRecord) -> String {
        if template.is_empty() {
            return String::new();
        }

        let filled = substitute(
            template,
            |name| {
                if data.is_list_key(name) {
                    return None;
                }
                data.get(name)
                    .map(|value| value.render(&self.options.missing_value))
            },
            self.options.cleanup,
        )
        .into_owned();
        self.finish(filled)
    }

    /// Replace `marker` with the rendered rows, in input order, or with
    /// `empty_fragment` when there are no rows.
    ///
    /// A template without the marker is returned unchanged. When the marker
    /// occurs more than once only the first occurrence is expanded.
    pub fn expand_repeating_section<R>(
        template: &str,
        marker: &str,
        rows: &[RowRecord],
        renderer: &R,
        empty_fragment: &str,
    ) -> String
    where
        R: RowRenderer + ?Sized,
    {
        match locate_marker(template, marker) {
            Some(position) => {
                let body = render_rows(rows, renderer, empty_fragment);
                let mut output = String::with_capacity(template.len() + body.len());
                output.push_str(&template[..position]);
                output.push_str(&body);
                output.push_str(&template[position + marker.len()..]);
                output
            }
            None => template.to_string(),
        }
    }

    /// Expand the repeating section (when given) and fill scalar fields.
    ///
    /// Template text around the marker gets the scalar pass; row fragments
    /// are rendered against their own row only. Data-derived text is never
    /// resolved twice, so row and scalar values cannot interfere. Cleanup
    /// runs last over the assembled document.
    pub fn assemble(
        &self,
        template: &str,
        data: &DataRecord,
        section: Option<&RepeatingSection>,
    ) -> String {
        if template.is_empty() {
            return String::new();
        }

        let Some(section) = section else {
            return self.fill_scalars(template, data);
        };

        let Some(position) = locate_marker(template, &section.marker) else {
            return self.fill_scalars(template, data);
        };

        let rows = data.rows(&section.list_key);
        let body = if rows.is_empty() {
            self.fill_scalars(&section.empty_fragment, data)
        } else {
            render_rows(rows, &section.renderer(&self.options), "")
        };

        let head = self.fill_scalars(&template[..position], data);
        let tail = self.fill_scalars(&template[position + section.marker.len()..], data);

        let mut output = String::with_capacity(head.len() + body.len() + tail.len());
        output.push_str(&head);
        output.push_str(&body);
        output.push_str(&tail);
        self.finish(output)
    }

    fn finish(&self, output: String) -> String {
        if self.options.cleanup {
            strip_placeholders(output)
        } else {
            output
        }
    }
}

fn locate_marker(template: &str, marker: &str) -> Option<usize> {
    if marker.is_empty() {
        return None;
    }
    let position = template.find(marker)?;
    let occurrences = template.matches(marker).count();
    if occurrences > 1 {
        log::warn!(
            "Repeating-section marker occurs {} times; expanding the first occurrence only",
            occurrences
        );
    }
    Some(position)
}

fn render_rows<R>(rows: &[RowRecord], renderer: &R, empty_fragment: &str) -> String
where
    R: RowRenderer + ?Sized,
{
    if rows.is_empty() {
        return empty_fragment.to_string();
    }
    rows.iter().map(|row| renderer.render_row(row)).collect()
}
