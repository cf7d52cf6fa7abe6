use handlebars::Handlebars;
use serde_json::json;

use crate::{
    access::Notice,
    composer::{BodySlot, RenderPlan},
    error::ViewError,
    models::NavItem,
    skeleton::Skeleton,
    views::ViewContent,
};

const LAYOUT_CLOSE: &str = "</main>\n</body>\n</html>\n";

/// Swaps the streamed `<template>` in for the placeholder with a single DOM operation.
const SWAP_SCRIPT: &str = r#"<script>(function(){var t=document.getElementById("page-body-ready");var s=document.getElementById("page-body");if(t&&s){s.replaceWith(t.content.cloneNode(true));t.remove();}})();</script>"#;

/// Body used when even the notice template fails, so a swapped-in page is never blank.
pub const LOAD_FAILED_FALLBACK: &str = r#"<section role="alert" aria-label="load-failed" data-notice="load-failed"><p>Không thể tải dữ liệu. Vui lòng thử lại sau.</p></section>"#;

/// Which auth form to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthForm {
    SignIn,
    SignUp,
}

/// PageRenderer
///
/// Owns the compiled handlebars templates. Values are HTML-escaped by handlebars; the
/// only raw fragments spliced in are ones this module produced itself.
pub struct PageRenderer {
    hbs: Handlebars<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, ViewError> {
        let mut hbs = Handlebars::new();
        hbs.register_template_string("layout_open", include_str!("templates/layout_open.hbs"))?;
        hbs.register_template_string("notice", include_str!("templates/notice.hbs"))?;
        hbs.register_template_string("table", include_str!("templates/table.hbs"))?;
        hbs.register_template_string("detail", include_str!("templates/detail.hbs"))?;
        hbs.register_template_string("form", include_str!("templates/form.hbs"))?;
        hbs.register_template_string("dashboard", include_str!("templates/dashboard.hbs"))?;
        hbs.register_template_string("auth_form", include_str!("templates/auth_form.hbs"))?;
        Ok(Self { hbs })
    }

    /// Doctype through the opening `<main>`: navigation, breadcrumbs, header.
    pub fn open_page(&self, plan: &RenderPlan) -> Result<String, ViewError> {
        let data = json!({
            "title": plan.header.title,
            "navigation": plan.navigation,
            "breadcrumbs": plan.breadcrumbs,
            "actions": plan.header.actions,
        });
        Ok(self.hbs.render("layout_open", &data)?)
    }

    /// full_page
    ///
    /// A complete page for every body that is not deferred. A deferred body rendered
    /// this way shows its skeleton only.
    pub fn full_page(&self, plan: &RenderPlan) -> Result<String, ViewError> {
        let body = match &plan.body {
            BodySlot::Notice { notice } => self.notice(notice)?,
            BodySlot::Loading { skeleton } | BodySlot::Deferred { skeleton, .. } => {
                skeleton.render_html()
            }
            BodySlot::Navigation { items } => self.dashboard(items)?,
        };
        let mut page = self.open_page(plan)?;
        page.push_str(&body);
        page.push_str(LAYOUT_CLOSE);
        Ok(page)
    }

    /// First chunk of a streamed page: the shell with the skeleton in `#page-body`.
    pub fn deferred_open(&self, plan: &RenderPlan, skeleton: &Skeleton) -> Result<String, ViewError> {
        let mut chunk = self.open_page(plan)?;
        chunk.push_str(r#"<div id="page-body" data-state="loading">"#);
        chunk.push_str(&skeleton.render_html());
        chunk.push_str("</div>\n");
        Ok(chunk)
    }

    /// Last chunk of a streamed page: the finished body plus the swap script.
    pub fn deferred_ready(&self, body_html: &str) -> String {
        format!(
            "<template id=\"page-body-ready\"><div id=\"page-body\" data-state=\"ready\">{}</div></template>\n{}\n{}",
            body_html, SWAP_SCRIPT, LAYOUT_CLOSE
        )
    }

    /// deferred_body
    ///
    /// The markup swapped in for the skeleton once a feature view has finished:
    /// its content, the not-found notice, or the load-failed notice. A render
    /// failure falls back to `LOAD_FAILED_FALLBACK`.
    pub fn deferred_body(&self, loaded: &Result<ViewContent, ViewError>) -> String {
        let rendered = match loaded {
            Ok(content) => self.content(content),
            Err(ViewError::NotFound) => self.notice(&Notice::NotFound),
            Err(_) => self.notice(&Notice::LoadFailed),
        };
        rendered.unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to render page body");
            LOAD_FAILED_FALLBACK.to_string()
        })
    }

    pub fn notice(&self, notice: &Notice) -> Result<String, ViewError> {
        let data = match notice {
            Notice::NotFound => json!({
                "label": notice.label(),
                "message": "Không tìm thấy trang bạn yêu cầu.",
            }),
            Notice::Unauthenticated {
                session_error,
                sign_in_href,
            } => {
                let (reason, message) = if *session_error {
                    (
                        Some("session-error"),
                        "Không thể xác minh phiên đăng nhập. Vui lòng thử lại hoặc đăng nhập lại.",
                    )
                } else {
                    (None, "Bạn cần đăng nhập để truy cập trang này.")
                };
                json!({
                    "label": notice.label(),
                    "reason": reason,
                    "message": message,
                    "link_href": sign_in_href,
                    "link_label": "Đăng nhập",
                })
            }
            Notice::Forbidden { required } => json!({
                "label": notice.label(),
                "message": "Bạn không có quyền truy cập trang này.",
                "detail": format!("Yêu cầu quyền: {}", required),
            }),
            Notice::AlreadyAuthenticated { redirect_to } => json!({
                "label": notice.label(),
                "message": "Bạn đã đăng nhập.",
                "link_href": redirect_to,
                "link_label": "Tiếp tục",
            }),
            Notice::LoadFailed => json!({
                "label": notice.label(),
                "message": "Không thể tải dữ liệu. Vui lòng thử lại sau.",
            }),
        };
        Ok(self.hbs.render("notice", &data)?)
    }

    pub fn content(&self, content: &ViewContent) -> Result<String, ViewError> {
        let rendered = match content {
            ViewContent::Table { columns, rows } => self.hbs.render(
                "table",
                &json!({ "columns": columns, "rows": rows, "column_count": columns.len() }),
            ),
            ViewContent::Detail { rows } => self.hbs.render("detail", &json!({ "rows": rows })),
            ViewContent::Form {
                action,
                submit_label,
                fields,
            } => self.hbs.render(
                "form",
                &json!({
                    "action": action,
                    "submit_label": submit_label,
                    "fields": fields,
                    "field_count": fields.len(),
                }),
            ),
        };
        Ok(rendered?)
    }

    pub fn dashboard(&self, items: &[NavItem]) -> Result<String, ViewError> {
        Ok(self.hbs.render("dashboard", &json!({ "items": items }))?)
    }

    /// auth_form
    ///
    /// Standalone sign-in / sign-up page posting to the external auth provider.
    pub fn auth_form(
        &self,
        form: AuthForm,
        provider_url: &str,
        callback_url: &str,
    ) -> Result<String, ViewError> {
        let provider_url = provider_url.trim_end_matches('/');
        let data = match form {
            AuthForm::SignIn => json!({
                "title": "Đăng nhập",
                "form_label": "sign-in",
                "action": format!("{}/sign-in", provider_url),
                "callback_url": callback_url,
                "with_name": false,
                "submit_label": "Đăng nhập",
                "alternate_href": "/auth/sign-up",
                "alternate_label": "Chưa có tài khoản? Đăng ký",
            }),
            AuthForm::SignUp => json!({
                "title": "Đăng ký",
                "form_label": "sign-up",
                "action": format!("{}/sign-up", provider_url),
                "callback_url": callback_url,
                "with_name": true,
                "submit_label": "Đăng ký",
                "alternate_href": "/auth/sign-in",
                "alternate_label": "Đã có tài khoản? Đăng nhập",
            }),
        };
        Ok(self.hbs.render("auth_form", &data)?)
    }
}
