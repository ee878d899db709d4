//! Integration tests for the department hierarchy using in-memory SQLite.

mod common;

use orgadmin::service::dept::{self, DeptPatch};
use orgadmin::service::user as user_svc;
use orgadmin::AppError;
use sea_orm::ConnectionTrait;
use serde_json::json;

#[tokio::test]
async fn create_rejects_duplicate_name_and_missing_parent() {
    let db = common::setup().await;
    common::dept(&db, "Engineering", None).await;

    let dup = serde_json::from_value(json!({ "name": "Engineering" })).unwrap();
    let err = dept::create(&db, dup).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists { field: "name", .. }));

    let orphan = serde_json::from_value(json!({
        "name": "Ghost",
        "parent_id": uuid::Uuid::new_v4(),
    }))
    .unwrap();
    let err = dept::create(&db, orphan).await.unwrap_err();
    assert!(matches!(err, AppError::ReferenceNotFound { field: "parent_id", .. }));
}

#[tokio::test]
async fn blank_codes_do_not_collide() {
    let db = common::setup().await;
    for name in ["Sales", "Support"] {
        let req = serde_json::from_value(json!({ "name": name, "code": "  " })).unwrap();
        let created = dept::create(&db, req).await.unwrap();
        assert_eq!(created.code, None);
    }

    let coded = serde_json::from_value(json!({ "name": "Finance", "code": "FIN" })).unwrap();
    dept::create(&db, coded).await.unwrap();
    let clash = serde_json::from_value(json!({ "name": "Audit", "code": "FIN" })).unwrap();
    let err = dept::create(&db, clash).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists { field: "code", .. }));
}

#[tokio::test]
async fn update_excludes_self_from_uniqueness() {
    let db = common::setup().await;
    let eng = common::dept(&db, "Engineering", None).await;
    common::dept(&db, "Marketing", None).await;

    let same = DeptPatch {
        name: Some("Engineering".to_string()),
        ..Default::default()
    };
    let updated = dept::update(&db, eng.id, same).await.unwrap();
    assert_eq!(updated.name, "Engineering");

    let taken = DeptPatch {
        name: Some("Marketing".to_string()),
        ..Default::default()
    };
    let err = dept::update(&db, eng.id, taken).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists { field: "name", .. }));
}

#[tokio::test]
async fn reparenting_cannot_close_a_cycle() {
    let db = common::setup().await;
    let a = common::dept(&db, "A", None).await;
    let b = common::dept(&db, "B", Some(a.id)).await;
    let c = common::dept(&db, "C", Some(b.id)).await;

    let onto_self = DeptPatch {
        parent_id: Some(Some(a.id)),
        ..Default::default()
    };
    let err = dept::update(&db, a.id, onto_self).await.unwrap_err();
    assert!(matches!(err, AppError::DirectCycle(_)));

    let onto_grandchild = DeptPatch {
        parent_id: Some(Some(c.id)),
        ..Default::default()
    };
    let err = dept::update(&db, a.id, onto_grandchild).await.unwrap_err();
    assert!(matches!(err, AppError::IndirectCycle(_)));

    // Detaching to the root level is always allowed
    let detach = DeptPatch {
        parent_id: Some(None),
        ..Default::default()
    };
    let moved = dept::update(&db, c.id, detach).await.unwrap();
    assert_eq!(moved.parent_id, None);
}

#[tokio::test]
async fn tree_nests_every_level() {
    let db = common::setup().await;
    let root = common::dept(&db, "Head Office", None).await;
    let mid = common::dept(&db, "Operations", Some(root.id)).await;
    common::dept(&db, "Logistics", Some(mid.id)).await;
    common::dept(&db, "Branch", None).await;

    let forest = dept::list_subtree(&db, None).await.unwrap();
    assert_eq!(forest.len(), 2);

    let sub = dept::list_subtree(&db, Some(root.id)).await.unwrap();
    assert_eq!(sub.len(), 1);
    assert_eq!(sub[0].children.len(), 1);
    assert_eq!(sub[0].children[0].children[0].name, "Logistics");

    let err = dept::list_subtree(&db, Some(uuid::Uuid::new_v4())).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn delete_removes_subtree_children_first() {
    let db = common::setup().await;
    let a = common::dept(&db, "A", None).await;
    let b = common::dept(&db, "B", Some(a.id)).await;
    let c = common::dept(&db, "C", Some(b.id)).await;
    let other = common::dept(&db, "Other", None).await;

    let removed = dept::delete(&db, a.id).await.unwrap();
    assert_eq!(removed, vec![c.id, b.id, a.id]);

    let left = dept::list(&db).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, other.id);

    let err = dept::delete(&db, a.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn delete_is_blocked_while_members_remain() {
    let db = common::setup().await;
    let a = common::dept(&db, "A", None).await;
    let b = common::dept(&db, "B", Some(a.id)).await;
    let u = common::user_in(&db, "alice", 1, Some(b.id)).await;

    let err = dept::delete(&db, a.id).await.unwrap_err();
    assert!(matches!(err, AppError::InUse { .. }));
    assert_eq!(dept::list(&db).await.unwrap().len(), 2);

    // Once the member leaves, the subtree goes
    user_svc::delete_user(&db, u.id).await.unwrap();
    let removed = dept::delete(&db, a.id).await.unwrap();
    assert_eq!(removed, vec![b.id, a.id]);
}

#[tokio::test]
async fn failed_cascade_leaves_subtree_intact() {
    let db = common::setup().await;
    let a = common::dept(&db, "A", None).await;
    let b = common::dept(&db, "B", Some(a.id)).await;
    common::dept(&db, "C", Some(b.id)).await;

    // Children go first, so the abort hits after B and C are already deleted
    db.execute_unprepared(
        "CREATE TRIGGER keep_a BEFORE DELETE ON sys_dept WHEN old.name = 'A' \
         BEGIN SELECT RAISE(ABORT, 'department A is pinned'); END",
    )
    .await
    .unwrap();

    let err = dept::delete(&db, a.id).await.unwrap_err();
    assert!(matches!(err, AppError::StorageConflict(ref msg) if msg.contains("pinned")));
    assert_eq!(dept::list(&db).await.unwrap().len(), 3);
}

#[tokio::test]
async fn unique_constraint_backstops_concurrent_insert() {
    let db = common::setup().await;
    common::dept(&db, "Existing", None).await;

    // Simulates a competing writer committing the same name after the pre-check
    db.execute_unprepared(
        "CREATE TRIGGER racing_writer AFTER INSERT ON sys_dept WHEN new.name = 'Racing' \
         BEGIN INSERT INTO sys_dept (id, name, is_active) VALUES (randomblob(16), new.name, 1); END",
    )
    .await
    .unwrap();

    let req = serde_json::from_value(json!({ "name": "Racing" })).unwrap();
    let err = dept::create(&db, req).await.unwrap_err();
    assert!(matches!(err, AppError::StorageConflict(ref msg) if msg.contains("UNIQUE")));

    let left = dept::list(&db).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].name, "Existing");
}

#[tokio::test]
async fn uncoded_departments_sort_last() {
    let db = common::setup().await;
    let root = common::dept(&db, "Root", None).await;
    for (name, code) in [("Zeta", Some("B")), ("Alpha", None), ("Omega", Some("A"))] {
        let req = serde_json::from_value(json!({
            "name": name,
            "code": code,
            "parent_id": root.id,
        }))
        .unwrap();
        dept::create(&db, req).await.unwrap();
    }

    let tree = dept::list_subtree(&db, Some(root.id)).await.unwrap();
    let siblings: Vec<&str> = tree[0].children.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(siblings, ["Omega", "Zeta", "Alpha"]);

    let flat: Vec<String> = dept::list(&db).await.unwrap().into_iter().map(|d| d.name).collect();
    assert_eq!(flat, ["Omega", "Zeta", "Alpha", "Root"]);
}
