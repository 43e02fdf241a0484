use super::*;

#[tokio::test]
async fn flush_waits_for_queued_actions() {
    let (store, _task) = spawn_store(AppState::default());

    for _ in 0..100 {
        store.dispatch(Action::AddCount { number: 1 }).expect("dispatch");
    }
    store.flush().await.expect("flush");

    assert_eq!(store.state().count, 100);
}

#[tokio::test]
async fn actions_apply_in_send_order() {
    let (store, _task) = spawn_store(AppState::default());

    store
        .dispatch(Action::LoginChangeEmail { text: "first".into() })
        .expect("dispatch");
    store
        .dispatch(Action::LoginChangeEmail { text: "second".into() })
        .expect("dispatch");
    store.flush().await.expect("flush");

    assert_eq!(store.state().login.email, "second");
}

#[tokio::test]
async fn subscribers_see_new_snapshots() {
    let (store, _task) = spawn_store(AppState::default());
    let mut updates = store.subscribe();

    store.dispatch(Action::AddCount { number: 3 }).expect("dispatch");
    updates.changed().await.expect("snapshot");

    assert_eq!(updates.borrow().count, 3);
}

#[tokio::test]
async fn task_returns_final_state_after_last_handle_drops() {
    let (store, task) = spawn_store(AppState::default());
    let clone = store.clone();
    clone.dispatch(Action::AddCount { number: 2 }).expect("dispatch");
    drop(clone);
    store.dispatch(Action::AddCount { number: 5 }).expect("dispatch");
    drop(store);

    let state = task.await.expect("join");
    assert_eq!(state.count, 7);
}

#[tokio::test]
async fn tokens_increase_across_handles() {
    let (store, _task) = spawn_store(AppState::default());
    let other = store.clone();
    let first = store.next_token();
    let second = other.next_token();
    assert!(second > first);
}

#[test]
fn store_counts_applied_actions() {
    let mut store = Store::new(AppState::default());
    store.dispatch(Action::AddCount { number: 1 });
    store.dispatch(Action::DeleteAllArticleHistory);
    assert_eq!(store.applied(), 2);
    assert_eq!(store.into_state().count, 1);
}
