use chrono::{Duration, Utc};
use qwery_store::repository::slug_for;
use qwery_store::{
    Conversation, FindOptions, Message, MessageRole, Notebook, Organization, Project,
    ProviderSchemas, Repository, Store, StoreConfig, StoreError, Usage, User, UserRole,
};
use serde_json::json;
use tempfile::TempDir;

fn open() -> (TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir should be available");
    let store =
        Store::open(&StoreConfig::new(dir.path()), ProviderSchemas::new()).expect("store should open");
    (dir, store)
}

#[tokio::test]
async fn test_organization_crud() {
    let (_dir, store) = open();
    let repo = store.organizations();

    let created = repo
        .create(Organization::new("Acme", "usr_1"))
        .await
        .expect("create should succeed");
    assert!(created.id.starts_with("org_"));
    assert_eq!(created.slug, slug_for(&created.id));
    assert_eq!(created.created_by, "system");
    assert_eq!(created.updated_by, "system");

    let found = repo.find_by_id(&created.id).await.unwrap();
    assert_eq!(found.as_ref(), Some(&created));
    let by_slug = repo.find_by_slug(&created.slug).await.unwrap();
    assert_eq!(by_slug.map(|org| org.id), Some(created.id.clone()));

    let mut renamed = created.clone();
    renamed.name = "Acme Corp".to_string();
    let updated = repo.update(renamed).await.expect("update should succeed");
    assert_eq!(updated.name, "Acme Corp");
    assert_eq!(updated.slug, created.slug);
    assert!(updated.updated_at >= created.updated_at);

    assert!(repo.delete(&created.id).await.unwrap());
    assert!(!repo.delete(&created.id).await.unwrap());
    assert!(repo.find_by_id(&created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_missing_is_entity_not_found() {
    let (_dir, store) = open();
    let err = store
        .organizations()
        .update(Organization::new("Ghost", "usr_1").with_id("org_missing"))
        .await
        .expect_err("update should fail");
    assert!(matches!(
        err,
        StoreError::EntityNotFound { entity: "Organization", ref id } if id == "org_missing"
    ));
    assert!(store
        .organizations()
        .find_by_id("org_missing")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_organization_search() {
    let (_dir, store) = open();
    let repo = store.organizations();
    for name in ["Acme", "Globex", "acme labs"] {
        repo.create(Organization::new(name, "usr_1")).await.unwrap();
    }

    let hits = repo.search("  ACME ", FindOptions::new()).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(repo.search("", FindOptions::new()).await.unwrap().len(), 3);
    assert_eq!(
        repo.search("", FindOptions::new().offset(1).limit(1))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_project_create_rules() {
    let (_dir, store) = open();
    let repo = store.projects();

    let created = repo
        .create(Project::new("org_1", "Analytics").with_description("sales dashboards"))
        .await
        .unwrap();
    assert!(created.id.starts_with("prj_"));
    assert_eq!(created.status, "active");

    let err = repo
        .create(Project::new("org_1", "Duplicate").with_id(created.id.clone()))
        .await
        .expect_err("duplicate id should be rejected");
    assert!(matches!(err, StoreError::AlreadyExists { entity: "Project", .. }));

    repo.create(Project::new("org_2", "Other")).await.unwrap();
    let in_org = repo.find_all_by_organization_id("org_1").await.unwrap();
    assert_eq!(in_org.len(), 1);

    let hits = repo
        .search("DASHBOARD", Some("org_1"), FindOptions::new())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!(repo
        .search("dashboard", Some("org_2"), FindOptions::new())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(repo.search("", None, FindOptions::new()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_conversations_sorted_by_recency() {
    let (_dir, store) = open();
    let repo = store.conversations();
    let now = Utc::now();

    let old = repo
        .create(
            Conversation::new("prj_1", "old")
                .with_task_id("task_1")
                .with_updated_at(now - Duration::hours(2)),
        )
        .await
        .unwrap();
    let new = repo
        .create(Conversation::new("prj_1", "new").with_updated_at(now))
        .await
        .unwrap();
    repo.create(Conversation::new("prj_2", "elsewhere").with_updated_at(now - Duration::hours(1)))
        .await
        .unwrap();

    let all = repo.find_all(FindOptions::new()).await.unwrap();
    let titles: Vec<&str> = all.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["new", "elsewhere", "old"]);

    let in_project = repo.find_by_project_id("prj_1").await.unwrap();
    assert_eq!(in_project.len(), 2);
    assert_eq!(in_project[0].id, new.id);

    let by_task = repo.find_by_task_id("task_1").await.unwrap();
    assert_eq!(by_task.len(), 1);
    assert_eq!(by_task[0].id, old.id);
    assert_eq!(by_task[0].created_by, "system");
}

#[tokio::test]
async fn test_notebook_description_and_project_filter() {
    let (_dir, store) = open();
    let repo = store.notebooks();

    let created = repo
        .create(
            Notebook::new("prj_1", "Exploration")
                .with_description("   ")
                .with_cells(vec![json!({"query": "select 1"})]),
        )
        .await
        .unwrap();
    let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(found.description, None);
    assert_eq!(found.version, 1);
    assert_eq!(found.cells.len(), 1);

    assert_eq!(repo.find_by_project_id("prj_1").await.unwrap().len(), 1);
    assert!(repo.find_by_project_id("prj_2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_usage_numeric_ids_and_conversation_slug() {
    let (_dir, store) = open();
    let conversation = store
        .conversations()
        .create(Conversation::new("prj_1", "chat"))
        .await
        .unwrap();
    let repo = store.usage();
    let now = Utc::now();

    let first = repo
        .create(
            Usage::new(conversation.id.clone(), "model-a")
                .with_tokens(10, 20)
                .with_timestamp(now - Duration::minutes(1)),
        )
        .await
        .unwrap();
    let second = repo
        .create(Usage::new(conversation.id.clone(), "model-a").with_timestamp(now))
        .await
        .unwrap();
    repo.create(Usage::new("conv_other", "model-b").with_id(7))
        .await
        .unwrap();

    assert!(first.id > 0);
    assert_ne!(first.id, second.id);
    let found = repo.find_by_id(&first.id.to_string()).await.unwrap().unwrap();
    assert_eq!(found.total_tokens, 30);

    let by_slug = repo
        .find_by_conversation_slug(&conversation.slug)
        .await
        .unwrap();
    let ids: Vec<i64> = by_slug.iter().map(|usage| usage.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(repo.find_by_conversation_slug("nope").await.unwrap().is_empty());
    assert!(repo.find_by_slug("anything").await.unwrap().is_none());
    assert!(repo.delete("7").await.unwrap());
}

#[tokio::test]
async fn test_user_lookup_by_username() {
    let (_dir, store) = open();
    let repo = store.users();

    let created = repo
        .create(User::new("ada").with_role(UserRole::Admin))
        .await
        .unwrap();
    assert!(created.id.starts_with("usr_"));

    let found = repo.find_by_slug("ada").await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.role, UserRole::Admin);
    assert!(repo.find_by_slug("grace").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_all_applies_window() {
    let (_dir, store) = open();
    let repo = store.users();
    for name in ["a", "b", "c", "d"] {
        repo.create(User::new(name)).await.unwrap();
    }
    assert_eq!(repo.find_all(FindOptions::new()).await.unwrap().len(), 4);
    assert_eq!(
        repo.find_all(FindOptions::new().offset(3)).await.unwrap().len(),
        1
    );
    assert_eq!(
        repo.find_all(FindOptions::new().limit(2)).await.unwrap().len(),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deletes_report_one_success() {
    let (_dir, store) = open();
    for _ in 0..50 {
        let org = store
            .organizations()
            .create(Organization::new("Acme", "usr_1"))
            .await
            .unwrap();
        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let repo = store.organizations();
                let id = org.id.clone();
                tokio::spawn(async move { repo.delete(&id).await })
            })
            .collect();

        let mut removed = 0;
        for task in tasks {
            if task.await.unwrap().unwrap() {
                removed += 1;
            }
        }
        assert_eq!(removed, 1, "exactly one delete should see the document");
    }
}

#[tokio::test]
async fn test_delete_ignores_document_contents() {
    let (dir, store) = open();
    let path = dir.path().join("organization").join("org_bad.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"{not json").unwrap();

    assert!(store.organizations().delete("org_bad").await.unwrap());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_delete_surfaces_removal_failure() {
    let (dir, store) = open();
    let path = dir.path().join("organization").join("org_dir.json");
    std::fs::create_dir_all(&path).unwrap();

    let err = store
        .organizations()
        .delete("org_dir")
        .await
        .expect_err("delete should not report success");
    assert!(matches!(err, StoreError::Io(_)));
    assert!(path.exists());
}

#[tokio::test]
async fn test_message_delete_reports_presence() {
    let (_dir, store) = open();
    let repo = store.messages();
    let message = repo
        .create(Message::new("conv_1", MessageRole::User, json!("hi")))
        .await
        .unwrap();

    assert!(repo.delete(&message.id).await.unwrap());
    assert!(!repo.delete(&message.id).await.unwrap());
    assert!(repo.find_by_id(&message.id).await.unwrap().is_none());
}
