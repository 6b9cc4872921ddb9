use deskstate_core::model::block::{META_KEY_FILE, META_KEY_URL, META_KEY_VIEW};
use deskstate_core::{
    Block, BlockDef, ErrorKind, ObjectKind, ObjectService, ObjectStore, RequestContext,
    ServiceError, Tab, UpdateType, ViewTargetError, ViewTargetOptions,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

fn setup() -> (Arc<ObjectStore>, ObjectService) {
    let store = Arc::new(ObjectStore::open_in_memory().unwrap());
    let service = ObjectService::new(Arc::clone(&store));
    (store, service)
}

fn ctx() -> RequestContext {
    RequestContext::with_timeout(Duration::from_secs(2))
}

#[test]
fn create_block_attaches_to_tab_and_journals_both_writes() {
    let (store, service) = setup();
    let tab = store.create(&mut ctx(), Tab::new("T1")).unwrap();

    let mut ctx = ctx().with_journal();
    let def = BlockDef::new().with_meta(META_KEY_VIEW, "term");
    let block = service.create_block(&mut ctx, &tab.oid, &def).unwrap();

    let loaded: Tab = store.must_get(&ctx, &tab.oid).unwrap();
    assert_eq!(loaded.block_ids, vec![block.oid.clone()]);

    let batch = ctx.drain_journal();
    assert_eq!(batch.len(), 2);
    assert_eq!(
        (batch[0].update_type, batch[0].otype, batch[0].oid.as_str()),
        (UpdateType::Created, ObjectKind::Block, block.oid.as_str())
    );
    assert_eq!(
        (batch[1].update_type, batch[1].otype, batch[1].oid.as_str()),
        (UpdateType::Updated, ObjectKind::Tab, tab.oid.as_str())
    );
}

#[test]
fn create_block_for_missing_tab_creates_nothing() {
    let (store, service) = setup();

    let err = service
        .create_block(&mut ctx(), "no-such-tab", &BlockDef::new())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(store.get_all::<Block>(&ctx()).unwrap().is_empty());
}

#[test]
fn create_view_block_for_url_opens_web_view() {
    let (store, service) = setup();
    let tab = store.create(&mut ctx(), Tab::new("T1")).unwrap();

    let created = service
        .create_view_block(
            &mut ctx(),
            &tab.oid,
            "https://example.com",
            &ViewTargetOptions::default(),
        )
        .unwrap();
    assert!(!created.magnified);

    let loaded: Block = store.must_get(&ctx(), &created.block.oid).unwrap();
    assert_eq!(loaded.meta.get(META_KEY_VIEW), Some(&Value::from("web")));
    assert_eq!(
        loaded.meta.get(META_KEY_URL),
        Some(&Value::from("https://example.com"))
    );
}

#[test]
fn create_view_block_reports_magnified_request() {
    let (store, service) = setup();
    let tab = store.create(&mut ctx(), Tab::new("T1")).unwrap();
    let options = ViewTargetOptions {
        magnified: true,
        ..ViewTargetOptions::default()
    };

    let created = service
        .create_view_block(&mut ctx(), &tab.oid, "https://example.com", &options)
        .unwrap();

    assert!(created.magnified);
    let loaded: Tab = store.must_get(&ctx(), &tab.oid).unwrap();
    assert_eq!(loaded.block_ids, vec![created.block.oid]);
}

#[test]
fn create_view_block_in_missing_directory_is_invalid_and_creates_nothing() {
    let (store, service) = setup();
    let tab = store.create(&mut ctx(), Tab::new("T1")).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("no-such-dir").join("f.txt");

    let err = service
        .create_view_block(
            &mut ctx(),
            &tab.oid,
            target.to_str().unwrap(),
            &ViewTargetOptions::default(),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(matches!(
        err,
        ServiceError::InvalidTarget(ViewTargetError::ParentMissing(_))
    ));
    assert!(err.to_string().contains("parent directory does not exist"));
    assert!(store.get_all::<Block>(&ctx()).unwrap().is_empty());
}

#[test]
fn create_view_block_for_file_in_existing_directory_opens_preview() {
    let (store, service) = setup();
    let tab = store.create(&mut ctx(), Tab::new("T1")).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("notes.md");

    let created = service
        .create_view_block(
            &mut ctx(),
            &tab.oid,
            target.to_str().unwrap(),
            &ViewTargetOptions::default(),
        )
        .unwrap();

    assert_eq!(
        created.block.meta.get(META_KEY_VIEW),
        Some(&Value::from("preview"))
    );
    assert_eq!(
        created.block.meta.get(META_KEY_FILE),
        Some(&Value::from(target.to_str().unwrap()))
    );
}
