use axum::http::StatusCode;
use schoolhub::middleware::auth::AuthUser;
use schoolhub::middleware::role::{check_owner_or_admin, check_roles};
use schoolhub::schoolhub_auth::{Claims, REQUIRE_ADMIN, REQUIRE_TEACHER, UserRole, is_allowed};
use uuid::Uuid;

fn create_test_auth_user(role: UserRole, id: Uuid) -> AuthUser {
    AuthUser(Claims {
        sub: id.to_string(),
        email: "test@school.test".to_string(),
        role,
        exp: 9999999999,
        iat: 1234567890,
    })
}

#[test]
fn test_admin_passes_every_policy() {
    let admin = create_test_auth_user(UserRole::Admin, Uuid::new_v4());
    assert!(check_roles(&admin, REQUIRE_ADMIN).is_ok());
    assert!(check_roles(&admin, REQUIRE_TEACHER).is_ok());
    assert!(check_roles(&admin, &[UserRole::Parent]).is_ok());
}

#[test]
fn test_teacher_policy() {
    let teacher = create_test_auth_user(UserRole::Teacher, Uuid::new_v4());
    let student = create_test_auth_user(UserRole::Student, Uuid::new_v4());
    let parent = create_test_auth_user(UserRole::Parent, Uuid::new_v4());

    assert!(check_roles(&teacher, REQUIRE_TEACHER).is_ok());
    assert!(check_roles(&student, REQUIRE_TEACHER).is_err());
    assert!(check_roles(&parent, REQUIRE_TEACHER).is_err());
}

#[test]
fn test_denial_is_forbidden_with_required_roles() {
    let teacher = create_test_auth_user(UserRole::Teacher, Uuid::new_v4());
    let err = check_roles(&teacher, REQUIRE_ADMIN).unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
    assert_eq!(err.error.to_string(), "Access denied. Required role: ADMIN");
}

#[test]
fn test_is_allowed_matches_check_roles() {
    for role in [
        UserRole::Admin,
        UserRole::Teacher,
        UserRole::Student,
        UserRole::Parent,
    ] {
        let user = create_test_auth_user(role, Uuid::new_v4());
        assert_eq!(
            is_allowed(role, REQUIRE_TEACHER),
            check_roles(&user, REQUIRE_TEACHER).is_ok()
        );
    }
}

#[test]
fn test_owner_or_admin() {
    let owner_id = Uuid::new_v4();
    let owner = create_test_auth_user(UserRole::Teacher, owner_id);
    let stranger = create_test_auth_user(UserRole::Teacher, Uuid::new_v4());
    let admin = create_test_auth_user(UserRole::Admin, Uuid::new_v4());

    assert!(check_owner_or_admin(&owner, owner_id, "not yours").is_ok());
    assert!(check_owner_or_admin(&admin, owner_id, "not yours").is_ok());

    let err = check_owner_or_admin(&stranger, owner_id, "not yours").unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
    assert_eq!(err.error.to_string(), "not yours");
}
