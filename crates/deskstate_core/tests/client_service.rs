use deskstate_core::{
    Client, ClientService, CoreConfig, ErrorKind, EventBus, ObjectKind, ObjectStore,
    RequestContext, Tab, UpdateType,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct Harness {
    store: Arc<ObjectStore>,
    bus: Arc<EventBus>,
    service: ClientService,
}

fn setup() -> Harness {
    let store = Arc::new(ObjectStore::open_in_memory().unwrap());
    let bus = Arc::new(EventBus::new());
    let service = ClientService::new(Arc::clone(&store), Arc::clone(&bus), CoreConfig::default());
    Harness {
        store,
        bus,
        service,
    }
}

fn ctx() -> RequestContext {
    RequestContext::with_timeout(Duration::from_secs(2))
}

fn setup_with_windows(count: usize) -> (Harness, Vec<String>) {
    let harness = setup();
    let mut ctx = ctx();
    harness
        .store
        .create(&mut ctx, Client::new())
        .unwrap();
    let ids = (0..count)
        .map(|_| harness.service.make_window(&mut ctx).unwrap().oid)
        .collect();
    (harness, ids)
}

#[test]
fn get_client_data_without_client_is_not_found() {
    let harness = setup();
    let err = harness.service.get_client_data().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().starts_with("error getting client data"));
}

#[test]
fn ensure_initial_data_creates_client_and_first_window_once() {
    let harness = setup();

    let client = harness.service.ensure_initial_data(&mut ctx()).unwrap();
    assert_eq!(client.window_ids.len(), 1);

    let again = harness.service.ensure_initial_data(&mut ctx()).unwrap();
    assert_eq!(again.oid, client.oid);
    assert_eq!(again.window_ids, client.window_ids);
}

#[test]
fn make_window_links_workspace_tab_and_client() {
    let (harness, ids) = setup_with_windows(1);

    let window = harness.service.get_window(&ids[0]).unwrap().unwrap();
    let tab = harness.service.get_tab(&window.active_tab_id).unwrap().unwrap();
    let workspace = harness
        .service
        .get_workspace(&window.workspace_id)
        .unwrap()
        .unwrap();

    assert_eq!(workspace.tab_ids, vec![tab.oid.clone()]);
    assert!(tab.block_ids.is_empty());
    assert_eq!(harness.service.get_client_data().unwrap().window_ids, ids);
}

#[test]
fn make_window_appends_to_window_list() {
    let (harness, ids) = setup_with_windows(3);
    assert_eq!(harness.service.get_client_data().unwrap().window_ids, ids);
}

#[test]
fn make_window_is_journaled_in_order() {
    let (harness, _) = setup_with_windows(0);
    let mut ctx = ctx().with_journal();

    let window = harness.service.make_window(&mut ctx).unwrap();

    let kinds: Vec<(UpdateType, ObjectKind)> = ctx
        .drain_journal()
        .iter()
        .map(|record| (record.update_type, record.otype))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (UpdateType::Created, ObjectKind::Tab),
            (UpdateType::Created, ObjectKind::Workspace),
            (UpdateType::Created, ObjectKind::Window),
            (UpdateType::Updated, ObjectKind::Client),
        ]
    );
    assert!(!window.oid.is_empty());
}

#[test]
fn accessors_return_none_for_unknown_ids() {
    let harness = setup();
    assert!(harness.service.get_window("nope").unwrap().is_none());
    assert!(harness.service.get_tab("nope").unwrap().is_none());
    assert!(harness.service.get_workspace("nope").unwrap().is_none());
}

#[test]
fn focus_moves_window_to_front() {
    let (harness, ids) = setup_with_windows(3);

    harness.service.focus_window(&mut ctx(), &ids[2]).unwrap();

    let client = harness.service.get_client_data().unwrap();
    assert_eq!(
        client.window_ids,
        vec![ids[2].clone(), ids[0].clone(), ids[1].clone()]
    );
}

#[test]
fn focus_twice_equals_focus_once() {
    let (harness, ids) = setup_with_windows(4);

    harness.service.focus_window(&mut ctx(), &ids[1]).unwrap();
    let once = harness.service.get_client_data().unwrap().window_ids;
    harness.service.focus_window(&mut ctx(), &ids[1]).unwrap();
    let twice = harness.service.get_client_data().unwrap().window_ids;

    assert_eq!(once, twice);
}

#[test]
fn focus_unknown_window_is_tolerated() {
    let (harness, ids) = setup_with_windows(2);
    let before = harness.service.get_client_data().unwrap();

    harness
        .service
        .focus_window(&mut ctx(), "not-a-window")
        .unwrap();

    let after = harness.service.get_client_data().unwrap();
    assert_eq!(after.window_ids, ids);
    assert_eq!(after.version, before.version);
}

#[test]
fn concurrent_focus_keeps_window_list_consistent() {
    let (harness, ids) = setup_with_windows(5);
    let service = Arc::new(harness.service);
    let before = service.get_client_data().unwrap().version;

    let workers: Vec<_> = ids
        .iter()
        .cloned()
        .map(|window_id| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for _ in 0..10 {
                    let mut ctx = RequestContext::with_timeout(Duration::from_secs(10));
                    service.focus_window(&mut ctx, &window_id).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let client = service.get_client_data().unwrap();
    let mut sorted = client.window_ids.clone();
    sorted.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(sorted, expected);
    assert!(client.version > before);
}

#[test]
fn agree_tos_stamps_client_and_returns_ordered_batch() {
    let (harness, ids) = setup_with_windows(1);
    let rx = harness.bus.register(ids[0].as_str());

    let batch = harness.service.agree_tos(ctx()).unwrap();

    let client = harness.service.get_client_data().unwrap();
    assert!(client.has_agreed_tos());

    // Client stamp, then one block creation plus one tab update per layout step.
    assert_eq!(batch.len(), 1 + 7 * 2);
    assert_eq!(batch[0].otype, ObjectKind::Client);
    assert_eq!(batch[0].update_type, UpdateType::Updated);
    for pair in batch[1..].chunks(2) {
        assert_eq!(
            (pair[0].update_type, pair[0].otype),
            (UpdateType::Created, ObjectKind::Block)
        );
        assert_eq!(
            (pair[1].update_type, pair[1].otype),
            (UpdateType::Updated, ObjectKind::Tab)
        );
    }

    let final_tab: Tab = batch.last().unwrap().object().unwrap();
    assert_eq!(final_tab.block_ids.len(), 7);
    assert_eq!(rx.try_iter().count(), 7);
}

#[test]
fn agree_tos_without_windows_still_accepts() {
    let (harness, _) = setup_with_windows(0);

    let batch = harness.service.agree_tos(ctx()).unwrap();

    assert_eq!(batch.len(), 1);
    assert!(harness.service.get_client_data().unwrap().has_agreed_tos());
}

#[test]
fn agree_tos_without_client_fails() {
    let harness = setup();
    let err = harness.service.agree_tos(ctx()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
