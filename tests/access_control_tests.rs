use cms_portal::{
    access::{self, Capability, Decision, Notice, SIGN_IN_HREF, UnauthenticatedReason},
    error::SessionError,
    models::{Permission, PermissionAction, Session, SessionState},
};
use axum::http::StatusCode;
use uuid::Uuid;

fn signed_in(permissions: &[&str], roles: &[&str]) -> SessionState {
    Some(
        Session::new(Uuid::new_v4())
            .with_permissions(permissions.iter().copied())
            .with_roles(roles.iter().copied()),
    )
    .into()
}

fn users_read() -> Capability {
    Capability::Permission(Permission::for_resource("users", PermissionAction::Read))
}

#[test]
fn test_public_is_allowed_in_every_state() {
    let states = [
        SessionState::Loading,
        SessionState::Unauthenticated,
        SessionState::Failed(SessionError::Transport("refused".into())),
        signed_in(&[], &[]),
    ];
    for state in &states {
        assert_eq!(access::evaluate(state, &Capability::Public), Decision::Allowed);
    }
}

#[test]
fn test_loading_is_pending_not_denied() {
    assert_eq!(
        access::evaluate(&SessionState::Loading, &users_read()),
        Decision::Pending
    );
    assert_eq!(
        access::evaluate(&SessionState::Loading, &Capability::Authenticated),
        Decision::Pending
    );
    assert_eq!(
        access::evaluate(&SessionState::Loading, &Capability::GuestOnly),
        Decision::Pending
    );
}

#[test]
fn test_missing_session_is_unauthenticated() {
    assert_eq!(
        access::evaluate(&SessionState::Unauthenticated, &users_read()),
        Decision::Unauthenticated(UnauthenticatedReason::NoSession)
    );
    assert_eq!(
        access::evaluate(&SessionState::Unauthenticated, &Capability::Authenticated),
        Decision::Unauthenticated(UnauthenticatedReason::NoSession)
    );
}

#[test]
fn test_provider_failure_is_unauthenticated_with_distinct_reason() {
    let failed = SessionState::Failed(SessionError::UpstreamStatus(500));
    let decision = access::evaluate(&failed, &users_read());
    assert_eq!(
        decision,
        Decision::Unauthenticated(UnauthenticatedReason::SessionError)
    );

    let notice = Notice::from_decision(decision, &users_read(), "/admin").unwrap();
    assert_eq!(
        notice,
        Notice::Unauthenticated {
            session_error: true,
            sign_in_href: SIGN_IN_HREF.to_string()
        }
    );
}

#[test]
fn test_permission_match_is_exact() {
    let session = signed_in(&["users:read"], &[]);
    assert_eq!(access::evaluate(&session, &users_read()), Decision::Allowed);

    let write = Capability::Permission(Permission::for_resource("users", PermissionAction::Write));
    assert_eq!(access::evaluate(&session, &write), Decision::Forbidden);

    // No prefix or wildcard expansion.
    let wildcard = signed_in(&["users:*", "users"], &[]);
    assert_eq!(access::evaluate(&wildcard, &users_read()), Decision::Forbidden);
}

#[test]
fn test_role_capability() {
    let editor = signed_in(&[], &["editor"]);
    assert_eq!(
        access::evaluate(&editor, &Capability::Role("editor".into())),
        Decision::Allowed
    );
    assert_eq!(
        access::evaluate(&editor, &Capability::Role("admin".into())),
        Decision::Forbidden
    );
}

#[test]
fn test_guest_only_capability() {
    assert_eq!(
        access::evaluate(&signed_in(&[], &[]), &Capability::GuestOnly),
        Decision::AlreadyAuthenticated
    );
    assert_eq!(
        access::evaluate(&SessionState::Unauthenticated, &Capability::GuestOnly),
        Decision::Allowed
    );
    // A broken provider must not lock viewers out of the sign-in form.
    assert_eq!(
        access::evaluate(
            &SessionState::Failed(SessionError::Payload("bad".into())),
            &Capability::GuestOnly
        ),
        Decision::Allowed
    );
}

#[test]
fn test_any_session_satisfies_authenticated() {
    assert_eq!(
        access::evaluate(&signed_in(&[], &[]), &Capability::Authenticated),
        Decision::Allowed
    );
}

#[test]
fn test_evaluation_is_deterministic() {
    let session = signed_in(&["posts:read"], &["editor"]);
    let required = Capability::Permission(Permission::new("posts:read"));
    let first = access::evaluate(&session, &required);
    for _ in 0..5 {
        assert_eq!(access::evaluate(&session, &required), first);
    }
}

#[test]
fn test_notice_mapping_and_labels() {
    let required = users_read();

    assert_eq!(Notice::from_decision(Decision::Allowed, &required, "/admin"), None);
    assert_eq!(Notice::from_decision(Decision::Pending, &required, "/admin"), None);

    let forbidden = Notice::from_decision(Decision::Forbidden, &required, "/admin").unwrap();
    assert_eq!(
        forbidden,
        Notice::Forbidden {
            required: "users:read".to_string()
        }
    );
    assert_eq!(forbidden.label(), "forbidden");
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let guest = Notice::from_decision(
        Decision::AlreadyAuthenticated,
        &Capability::GuestOnly,
        "/admin",
    )
    .unwrap();
    assert_eq!(
        guest,
        Notice::AlreadyAuthenticated {
            redirect_to: "/admin".to_string()
        }
    );
    assert_eq!(guest.status(), StatusCode::SEE_OTHER);

    let anonymous = Notice::from_decision(
        Decision::Unauthenticated(UnauthenticatedReason::NoSession),
        &required,
        "/admin",
    )
    .unwrap();
    assert_eq!(anonymous.label(), "unauthenticated");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(Notice::NotFound.status(), StatusCode::NOT_FOUND);
    assert_eq!(Notice::LoadFailed.label(), "load-failed");
}

#[test]
fn test_notice_serializes_with_tag() {
    let json = serde_json::to_value(Notice::Unauthenticated {
        session_error: false,
        sign_in_href: SIGN_IN_HREF.to_string(),
    })
    .unwrap();
    assert_eq!(json["notice"], "unauthenticated");
    assert_eq!(json["session_error"], false);
    assert_eq!(json["sign_in_href"], "/auth/sign-in");
}
