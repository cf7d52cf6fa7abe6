use cms_portal::skeleton::{Skeleton, SkeletonKind, SkeletonSpec};

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn test_defaults() {
    let spec = SkeletonSpec::default();
    assert_eq!(spec.row_count, 10);
    assert_eq!(spec.column_count, 4);
    assert_eq!(spec.field_count, 4);
    assert_eq!(spec.section_count, 3);
    assert!(spec.show_header);
    assert!(spec.show_card);
}

#[test]
fn test_table_skeleton_shape() {
    let spec = SkeletonSpec {
        row_count: 3,
        column_count: 5,
        ..SkeletonSpec::default()
    };
    let html = Skeleton::table(spec).render_html();

    assert!(html.contains(r#"role="status""#));
    assert!(html.contains(r#"aria-busy="true""#));
    assert!(html.contains(r#"aria-label="loading""#));
    assert!(html.contains(r#"data-rows="3""#));
    assert!(html.contains(r#"data-columns="5""#));
    // Header row plus three body rows, five cells each.
    assert_eq!(count(&html, "skeleton-row"), 4);
    assert_eq!(count(&html, "skeleton-cell"), 20);
}

#[test]
fn test_table_skeleton_without_header() {
    let spec = SkeletonSpec {
        row_count: 2,
        column_count: 2,
        show_header: false,
        ..SkeletonSpec::default()
    };
    let html = Skeleton::table(spec).render_html();
    assert!(!html.contains("skeleton-header"));
    assert_eq!(count(&html, "skeleton-cell"), 4);
}

#[test]
fn test_form_skeleton_matches_field_count() {
    let spec = SkeletonSpec {
        field_count: 6,
        ..SkeletonSpec::default()
    };
    let html = Skeleton::form(spec).render_html();
    assert!(html.contains(r#"data-fields="6""#));
    assert_eq!(count(&html, r#"class="skeleton-field""#), 6);
    assert!(html.contains("skeleton-card"));

    let bare = Skeleton::form(SkeletonSpec {
        show_card: false,
        ..spec
    })
    .render_html();
    assert!(!bare.contains("skeleton-card"));
    assert_eq!(count(&bare, r#"class="skeleton-field""#), 6);
}

#[test]
fn test_detail_skeleton_sections() {
    let spec = SkeletonSpec {
        section_count: 2,
        ..SkeletonSpec::default()
    };
    let html = Skeleton::detail(spec).render_html();
    assert!(html.contains(r#"data-sections="2""#));
    assert_eq!(count(&html, r#"class="skeleton-section""#), 2);
    assert!(html.contains("skeleton-title"));
}

#[test]
fn test_constructors_set_kind() {
    let spec = SkeletonSpec::default();
    assert_eq!(Skeleton::table(spec).kind, SkeletonKind::Table);
    assert_eq!(Skeleton::detail(spec).kind, SkeletonKind::Detail);
    assert_eq!(Skeleton::form(spec).kind, SkeletonKind::Form);
}

#[test]
fn test_spec_deserializes_partially() {
    let spec: SkeletonSpec = serde_json::from_str(r#"{ "column_count": 7 }"#).unwrap();
    assert_eq!(spec.column_count, 7);
    assert_eq!(spec.row_count, 10);
}
