use std::fmt::Write;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// SkeletonSpec
///
/// Every option a loading placeholder understands. Missing members fall back to
/// `SkeletonSpec::default()` when deserialized from the registry document.
///
/// Defaults: 10 rows, 4 columns, 4 fields, 3 sections, header shown, card shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(default)]
#[ts(export)]
pub struct SkeletonSpec {
    /// Table body rows.
    pub row_count: u16,
    /// Table columns. Must equal the real table's column count.
    pub column_count: u16,
    /// Form inputs. Must equal the real form's field count.
    pub field_count: u16,
    /// Detail blocks.
    pub section_count: u16,
    /// Table header row / detail title bar.
    pub show_header: bool,
    /// Card chrome around forms.
    pub show_card: bool,
}

impl Default for SkeletonSpec {
    fn default() -> Self {
        Self {
            row_count: 10,
            column_count: 4,
            field_count: 4,
            section_count: 3,
            show_header: true,
            show_card: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SkeletonKind {
    Table,
    Detail,
    Form,
}

/// Skeleton
///
/// A placeholder shape ready to render. Pure data: it never fetches and never
/// looks at the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Skeleton {
    pub kind: SkeletonKind,
    pub spec: SkeletonSpec,
}

impl Skeleton {
    pub fn table(spec: SkeletonSpec) -> Self {
        Self { kind: SkeletonKind::Table, spec }
    }

    pub fn detail(spec: SkeletonSpec) -> Self {
        Self { kind: SkeletonKind::Detail, spec }
    }

    pub fn form(spec: SkeletonSpec) -> Self {
        Self { kind: SkeletonKind::Form, spec }
    }

    /// render_html
    ///
    /// Emits the placeholder markup. The outer element always carries
    /// `role="status" aria-busy="true" aria-label="loading"` plus `data-*` attributes
    /// echoing the counts, so the loading state is observable without reading text.
    pub fn render_html(&self) -> String {
        let mut out = String::new();
        match self.kind {
            SkeletonKind::Table => render_table(&mut out, &self.spec),
            SkeletonKind::Detail => render_detail(&mut out, &self.spec),
            SkeletonKind::Form => render_form(&mut out, &self.spec),
        }
        out
    }
}

// Writing into a String cannot fail, so the fmt::Result values below are discarded.

fn render_table(out: &mut String, spec: &SkeletonSpec) {
    let _ = write!(
        out,
        r#"<div class="skeleton skeleton-table" role="status" aria-busy="true" aria-label="loading" data-rows="{}" data-columns="{}">"#,
        spec.row_count, spec.column_count
    );
    if spec.show_header {
        out.push_str(r#"<div class="skeleton-row skeleton-header">"#);
        push_repeated(out, r#"<span class="skeleton-cell"></span>"#, spec.column_count);
        out.push_str("</div>");
    }
    for _ in 0..spec.row_count {
        out.push_str(r#"<div class="skeleton-row">"#);
        push_repeated(out, r#"<span class="skeleton-cell"></span>"#, spec.column_count);
        out.push_str("</div>");
    }
    out.push_str("</div>");
}

fn render_detail(out: &mut String, spec: &SkeletonSpec) {
    let _ = write!(
        out,
        r#"<div class="skeleton skeleton-detail" role="status" aria-busy="true" aria-label="loading" data-sections="{}">"#,
        spec.section_count
    );
    if spec.show_header {
        out.push_str(r#"<div class="skeleton-title"></div>"#);
    }
    push_repeated(
        out,
        r#"<div class="skeleton-section"><span class="skeleton-line"></span><span class="skeleton-line"></span></div>"#,
        spec.section_count,
    );
    out.push_str("</div>");
}

fn render_form(out: &mut String, spec: &SkeletonSpec) {
    let _ = write!(
        out,
        r#"<div class="skeleton skeleton-form" role="status" aria-busy="true" aria-label="loading" data-fields="{}">"#,
        spec.field_count
    );
    if spec.show_card {
        out.push_str(r#"<div class="skeleton-card">"#);
    }
    push_repeated(
        out,
        r#"<div class="skeleton-field"><span class="skeleton-label"></span><span class="skeleton-input"></span></div>"#,
        spec.field_count,
    );
    out.push_str(r#"<span class="skeleton-button"></span>"#);
    if spec.show_card {
        out.push_str("</div>");
    }
    out.push_str("</div>");
}

fn push_repeated(out: &mut String, fragment: &str, times: u16) {
    for _ in 0..times {
        out.push_str(fragment);
    }
}
