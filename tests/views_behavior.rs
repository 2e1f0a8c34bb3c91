//! Behavior tests for derived views: transform cost is paid once per Ready
//! transition of the source key, not once per read.

use tiergrid_tests::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use tiergrid_core::{tier_display_names, DerivedView, TierList};

fn tier_list_fetcher(
    client: &ScriptedHttpClient,
) -> impl Fn() -> futures::future::BoxFuture<'static, Result<serde_json::Value, FetchError>>
       + Send
       + Sync
       + 'static {
    let fetcher = JsonFetcher::new(Arc::new(client.clone()), FetchOptions::default());
    move || {
        let fetcher = fetcher.clone();
        async move { fetcher.fetch_value("/api/tiers").await }.boxed()
    }
}

#[tokio::test]
async fn when_the_source_is_unchanged_reads_reuse_the_memoized_value() {
    // Given: A Ready tier list and a counting name-lookup view
    let client = ScriptedHttpClient::always_ok(tier_list_body());
    let store = QueryStore::with_defaults();
    let key = Resource::TierList.cache_key();
    let snapshot = store
        .fetch(
            Some(key.clone()),
            RevalidationPolicy::default(),
            tier_list_fetcher(&client),
        )
        .await;

    let computations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&computations);
    let view = DerivedView::new(move |value: &serde_json::Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        let list: TierList = serde_json::from_value(value.clone()).expect("tier list shape");
        tier_display_names(&list)
    });

    // When: The view is read many times against the same snapshot
    for _ in 0..10 {
        let lookup = view.read(&snapshot).expect("data present");
        assert_eq!(
            lookup.get("co2").map(String::as_str),
            Some("CO2 intensity")
        );
    }

    // Then: The transform ran exactly once
    assert_eq!(computations.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn when_the_source_moves_to_a_new_ready_value_the_view_recomputes() {
    // Given: A memoized view over a Ready entry
    let client = ScriptedHttpClient::always_ok(tier_list_body());
    let store = QueryStore::with_defaults();
    let key = Resource::TierList.cache_key();
    let first = store
        .fetch(
            Some(key.clone()),
            RevalidationPolicy::default(),
            tier_list_fetcher(&client),
        )
        .await;

    let computations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&computations);
    let view = DerivedView::new(move |value: &serde_json::Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        value.clone()
    });
    view.read(&first).expect("data present");
    view.read(&first).expect("data present");

    // When: A focus revalidation past the dedup window delivers a new value
    tokio::time::advance(std::time::Duration::from_secs(120)).await;
    store.notify_focus().await;
    let second = store.get(&key).await;
    view.read(&second).expect("data present");
    view.read(&second).expect("data present");

    // Then: Recomputation count equals the number of Ready transitions
    assert_eq!(second.version, first.version + 1);
    assert_eq!(computations.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn when_the_source_has_no_data_the_view_yields_nothing() {
    // Given: A view over a key that has never loaded
    let store = QueryStore::with_defaults();
    let view = DerivedView::new(|value: &serde_json::Value| value.clone());

    // When: The view reads the uninitialized snapshot
    let snapshot = store.get(&Resource::TierList.cache_key()).await;

    // Then: There is nothing to derive
    assert!(view.read(&snapshot).is_none());
}
