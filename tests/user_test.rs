//! Integration tests for users and their post / role / department links.

mod common;

use orgadmin::service::user::{self, NewUser, UserPatch};
use orgadmin::service::{post, role};
use orgadmin::AppError;

#[tokio::test]
async fn created_user_carries_reference_summaries() {
    let db = common::setup().await;
    let d = common::dept(&db, "Engineering", None).await;
    let r = common::role(&db, "Developer", "dev").await;
    let p = common::post(&db, "Engineer").await;

    let new = NewUser {
        dept_id: Some(d.id),
        role_id: Some(r.id),
        post_id: Some(p.id),
        ..common::new_user("alice", 1)
    };
    let alice = user::create_user(&db, new).await.unwrap();

    assert_eq!(alice.dept_info.as_ref().map(|i| i.name.as_str()), Some("Engineering"));
    assert_eq!(alice.role_info.as_ref().map(|i| i.id), Some(r.id));
    assert_eq!(alice.post_info.as_ref().map(|i| i.name.as_str()), Some("Engineer"));

    let fetched = user::get_user(&db, alice.id).await.unwrap();
    assert_eq!(fetched.dept_info, alice.dept_info);
}

#[tokio::test]
async fn identity_fields_are_unique() {
    let db = common::setup().await;
    common::user_in(&db, "alice", 1, None).await;

    let same_name = common::new_user("alice", 2);
    let err = user::create_user(&db, same_name).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists { field: "username", .. }));

    let same_phone = common::new_user("bob", 1);
    let err = user::create_user(&db, same_phone).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists { field: "phone", .. }));
}

#[tokio::test]
async fn dangling_references_are_rejected() {
    let db = common::setup().await;
    let new = NewUser {
        role_id: Some(uuid::Uuid::new_v4()),
        ..common::new_user("carol", 3)
    };
    let err = user::create_user(&db, new).await.unwrap_err();
    assert!(matches!(err, AppError::ReferenceNotFound { field: "role_id", .. }));

    let u = common::user_in(&db, "dave", 4, None).await;
    let patch = UserPatch {
        post_id: Some(Some(uuid::Uuid::new_v4())),
        ..Default::default()
    };
    let err = user::update_user(&db, u.id, patch).await.unwrap_err();
    assert!(matches!(err, AppError::ReferenceNotFound { field: "post_id", .. }));
}

#[tokio::test]
async fn update_keeps_own_identity_and_clears_links() {
    let db = common::setup().await;
    let d = common::dept(&db, "Engineering", None).await;
    let u = common::user_in(&db, "erin", 5, Some(d.id)).await;
    common::user_in(&db, "frank", 6, None).await;

    let patch = UserPatch {
        username: Some("erin".to_string()),
        dept_id: Some(None),
        nickname: Some(Some("E".to_string())),
        ..Default::default()
    };
    let updated = user::update_user(&db, u.id, patch).await.unwrap();
    assert_eq!(updated.dept_id, None);
    assert!(updated.dept_info.is_none());
    assert_eq!(updated.nickname.as_deref(), Some("E"));

    let clash = UserPatch {
        email: Some("frank@example.com".to_string()),
        ..Default::default()
    };
    let err = user::update_user(&db, u.id, clash).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists { field: "email", .. }));
}

#[tokio::test]
async fn listing_by_department_covers_the_subtree() {
    let db = common::setup().await;
    let a = common::dept(&db, "A", None).await;
    let b = common::dept(&db, "B", Some(a.id)).await;
    let c = common::dept(&db, "C", Some(b.id)).await;
    let other = common::dept(&db, "Other", None).await;

    common::user_in(&db, "ua", 1, Some(a.id)).await;
    common::user_in(&db, "ub", 2, Some(b.id)).await;
    common::user_in(&db, "uc", 3, Some(c.id)).await;
    common::user_in(&db, "uo", 4, Some(other.id)).await;
    common::user_in(&db, "unassigned", 5, None).await;

    let names = |users: Vec<orgadmin::entity::user::UserResponse>| {
        users.into_iter().map(|u| u.username).collect::<Vec<_>>()
    };

    assert_eq!(
        names(user::list_users(&db, Some(a.id)).await.unwrap()),
        ["ua", "ub", "uc"]
    );
    assert_eq!(
        names(user::list_users(&db, Some(b.id)).await.unwrap()),
        ["ub", "uc"]
    );
    assert_eq!(user::list_users(&db, None).await.unwrap().len(), 5);

    let err = user::list_users(&db, Some(uuid::Uuid::new_v4())).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn superusers_cannot_be_deleted() {
    let db = common::setup().await;
    let admin = NewUser {
        is_superuser: true,
        ..common::new_user("admin", 9)
    };
    let admin = user::create_user(&db, admin).await.unwrap();

    let err = user::delete_user(&db, admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(user::get_user(&db, admin.id).await.is_ok());

    let plain = common::user_in(&db, "grace", 7, None).await;
    let removed = user::delete_user(&db, plain.id).await.unwrap();
    assert_eq!(removed.username, "grace");
    assert!(matches!(
        user::get_user(&db, plain.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn set_password_requires_existing_user() {
    let db = common::setup().await;
    let u = common::user_in(&db, "heidi", 8, None).await;
    user::set_password(&db, u.id, "new-hash".to_string()).await.unwrap();

    let err = user::set_password(&db, uuid::Uuid::new_v4(), "x".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn posts_and_roles_in_use_cannot_be_deleted() {
    let db = common::setup().await;
    let p = common::post(&db, "Engineer").await;
    let r = common::role(&db, "Developer", "dev").await;
    let new = NewUser {
        post_id: Some(p.id),
        role_id: Some(r.id),
        ..common::new_user("ivan", 10)
    };
    let u = user::create_user(&db, new).await.unwrap();

    assert!(matches!(post::delete(&db, p.id).await.unwrap_err(), AppError::InUse { .. }));
    assert!(matches!(role::delete(&db, r.id).await.unwrap_err(), AppError::InUse { .. }));

    user::delete_user(&db, u.id).await.unwrap();
    assert_eq!(post::delete(&db, p.id).await.unwrap().id, p.id);
    assert_eq!(role::delete(&db, r.id).await.unwrap().id, r.id);
}

#[tokio::test]
async fn role_permission_key_is_unique() {
    let db = common::setup().await;
    common::role(&db, "Developer", "dev").await;

    let req = serde_json::from_value(serde_json::json!({
        "name": "Contractor",
        "permission_key": "dev",
    }))
    .unwrap();
    let err = role::create(&db, req).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists { field: "permission_key", .. }));
}

#[tokio::test]
async fn deleted_user_view_keeps_reference_summaries() {
    let db = common::setup().await;
    let d = common::dept(&db, "Engineering", None).await;
    let r = common::role(&db, "Developer", "dev").await;
    let new = NewUser {
        dept_id: Some(d.id),
        role_id: Some(r.id),
        ..common::new_user("judy", 11)
    };
    let judy = user::create_user(&db, new).await.unwrap();

    let removed = user::delete_user(&db, judy.id).await.unwrap();
    assert_eq!(removed.dept_info, judy.dept_info);
    assert_eq!(removed.role_info.as_ref().map(|i| i.name.as_str()), Some("Developer"));
    assert!(removed.post_info.is_none());
}
