use schoolhub::schoolhub_auth::{
    UserRole, create_access_token, issue_token_pair, verify_refresh_token, verify_token,
};
use schoolhub::schoolhub_config::JwtConfig;
use schoolhub::schoolhub_core::DomainError;
use uuid::Uuid;

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        access_secret: "test-access-secret-at-least-32-characters".to_string(),
        refresh_secret: "test-refresh-secret-at-least-32-characters".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
    }
}

#[test]
fn test_create_access_token_all_roles() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    for role in [
        UserRole::Admin,
        UserRole::Teacher,
        UserRole::Student,
        UserRole::Parent,
    ] {
        let token = create_access_token(user_id, "test@school.test", role, &jwt_config).unwrap();
        let claims = verify_token(&token, &jwt_config).unwrap();
        assert_eq!(claims.role, role);
        assert_eq!(claims.user_id().unwrap(), user_id);
    }
}

#[test]
fn test_access_token_expiry_window() {
    let jwt_config = get_test_jwt_config();
    let token =
        create_access_token(Uuid::new_v4(), "test@school.test", UserRole::Student, &jwt_config)
            .unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();
    assert_eq!(claims.exp - claims.iat, 900);
}

#[test]
fn test_verify_token_wrong_secret() {
    let jwt_config = get_test_jwt_config();
    let token =
        create_access_token(Uuid::new_v4(), "test@school.test", UserRole::Teacher, &jwt_config)
            .unwrap();

    let other = JwtConfig {
        access_secret: "a-completely-different-secret-value".to_string(),
        ..get_test_jwt_config()
    };
    let err = verify_token(&token, &other).unwrap_err();
    assert_eq!(err.domain(), Some(&DomainError::TokenInvalid));
}

#[test]
fn test_verify_token_garbage() {
    let jwt_config = get_test_jwt_config();
    assert!(verify_token("not.a.jwt", &jwt_config).is_err());
    assert!(verify_token("", &jwt_config).is_err());
}

#[test]
fn test_refresh_and_access_tokens_are_not_interchangeable() {
    let jwt_config = get_test_jwt_config();
    let pair =
        issue_token_pair(Uuid::new_v4(), "test@school.test", UserRole::Parent, &jwt_config)
            .unwrap();

    assert!(verify_token(&pair.access_token, &jwt_config).is_ok());
    assert!(verify_refresh_token(&pair.refresh_token, &jwt_config).is_ok());
    assert!(verify_token(&pair.refresh_token, &jwt_config).is_err());
    assert!(verify_refresh_token(&pair.access_token, &jwt_config).is_err());
}
