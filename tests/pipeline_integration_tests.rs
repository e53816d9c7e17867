//! Integration tests for the full behavior pipeline: dispatch, validation
//! short-circuit, cache hit/miss/bypass/invalidate, single-flight population,
//! tag invalidation, and cancellation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Barrier;

use relay_core::cache::{CacheService, InMemoryDistributedTier};
use relay_core::config::{CacheConfig, PipelineConfig};
use relay_core::dispatch::Dispatcher;
use relay_core::outcome::{merge, AppError, Outcome, TypedOutcome};
use relay_core::pipeline::{
    CancelHandle, CancelSignal, FieldFailure, Handler, Severity, Validator,
};
use relay_core::request::{
    CachePolicy, CacheableRequest, Command, Query, Request, RequestKind,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Product {
    id: u32,
    name: String,
}

/// A cacheable read with a caller-supplied policy.
#[derive(Debug)]
struct CachedProductQuery {
    id: u32,
    policy: CachePolicy,
}

impl CachedProductQuery {
    fn new(id: u32) -> Self {
        Self {
            id,
            policy: CachePolicy::new(format!("product:{id}")),
        }
    }

    fn with_policy(id: u32, policy: CachePolicy) -> Self {
        Self { id, policy }
    }
}

impl Request for CachedProductQuery {
    type Response = TypedOutcome<Product>;

    fn kind() -> RequestKind {
        RequestKind::Query
    }
}

impl Query for CachedProductQuery {}

impl CacheableRequest for CachedProductQuery {
    fn cache_policy(&self) -> CachePolicy {
        self.policy.clone()
    }
}

struct ProductHandler {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler<CachedProductQuery, TypedOutcome<Product>> for ProductHandler {
    async fn handle(
        &self,
        request: Arc<CachedProductQuery>,
        _cancel: CancelSignal,
    ) -> TypedOutcome<Product> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TypedOutcome::from_value(Product {
            id: request.id,
            name: "trail boots".to_string(),
        })
    }
}

/// A validated write.
#[derive(Debug)]
struct CreateProduct {
    name: String,
}

impl Request for CreateProduct {
    type Response = Outcome;

    fn kind() -> RequestKind {
        RequestKind::Command
    }
}

impl Command for CreateProduct {}

struct CreateProductHandler {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler<CreateProduct, Outcome> for CreateProductHandler {
    async fn handle(&self, _request: Arc<CreateProduct>, _cancel: CancelSignal) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Outcome::ok()
    }
}

struct NameRequired;

#[async_trait]
impl Validator<CreateProduct> for NameRequired {
    async fn validate(&self, request: &CreateProduct) -> Vec<FieldFailure> {
        if request.name.trim().is_empty() {
            vec![FieldFailure {
                field: "name".to_string(),
                message: "name must not be empty".to_string(),
                code: "not_empty".to_string(),
                severity: Severity::Error,
                attempted_value: request.name.clone(),
            }]
        } else {
            Vec::new()
        }
    }
}

struct NameLength;

#[async_trait]
impl Validator<CreateProduct> for NameLength {
    async fn validate(&self, request: &CreateProduct) -> Vec<FieldFailure> {
        if request.name.len() > 64 {
            vec![FieldFailure {
                field: "name".to_string(),
                message: "name must be at most 64 characters".to_string(),
                code: "max_length".to_string(),
                severity: Severity::Error,
                attempted_value: request.name.clone(),
            }]
        } else {
            Vec::new()
        }
    }
}

fn dispatcher() -> Dispatcher {
    let cache = Arc::new(CacheService::new(CacheConfig::default()));
    Dispatcher::new(cache, PipelineConfig::default())
}

#[tokio::test]
async fn cache_miss_then_hit_invokes_handler_once() {
    let dispatcher = dispatcher();
    let calls = Arc::new(AtomicUsize::new(0));
    dispatcher.register_cacheable::<CachedProductQuery>(
        Arc::new(ProductHandler {
            calls: calls.clone(),
        }),
        Vec::new(),
    );

    let first = dispatcher
        .send(CachedProductQuery::new(123), CancelSignal::none())
        .await;
    assert!(first.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let second = dispatcher
        .send(CachedProductQuery::new(123), CancelSignal::none())
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1, "second dispatch must be served from cache");
    assert_eq!(second, first);
    assert_eq!(second.value().name, "trail boots");
}

#[tokio::test]
async fn bypass_always_invokes_the_handler() {
    let dispatcher = dispatcher();
    let calls = Arc::new(AtomicUsize::new(0));
    dispatcher.register_cacheable::<CachedProductQuery>(
        Arc::new(ProductHandler {
            calls: calls.clone(),
        }),
        Vec::new(),
    );

    // Populate the cache first.
    dispatcher
        .send(CachedProductQuery::new(7), CancelSignal::none())
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    for _ in 0..2 {
        let bypassing =
            CachedProductQuery::with_policy(7, CachePolicy::new("product:7").bypassing());
        let response = dispatcher.send(bypassing, CancelSignal::none()).await;
        assert!(response.is_success());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn invalidate_removes_the_entry_and_still_runs_the_chain() {
    let dispatcher = dispatcher();
    let calls = Arc::new(AtomicUsize::new(0));
    dispatcher.register_cacheable::<CachedProductQuery>(
        Arc::new(ProductHandler {
            calls: calls.clone(),
        }),
        Vec::new(),
    );

    dispatcher
        .send(CachedProductQuery::new(9), CancelSignal::none())
        .await;
    assert!(dispatcher.cache().exists("product:9").await.expect("exists"));

    // An invalidating dispatch removes the entry and still runs the chain;
    // it does not re-store, so the key stays absent afterwards.
    let invalidating =
        CachedProductQuery::with_policy(9, CachePolicy::new("product:9").invalidating());
    let response = dispatcher.send(invalidating, CancelSignal::none()).await;
    assert!(response.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!dispatcher.cache().exists("product:9").await.expect("exists"));

    // The next plain dispatch misses and repopulates.
    dispatcher
        .send(CachedProductQuery::new(9), CancelSignal::none())
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(dispatcher.cache().exists("product:9").await.expect("exists"));
}

#[tokio::test]
async fn validation_failure_short_circuits_before_the_handler() {
    let dispatcher = dispatcher();
    let calls = Arc::new(AtomicUsize::new(0));
    dispatcher.register::<CreateProduct>(
        Arc::new(CreateProductHandler {
            calls: calls.clone(),
        }),
        vec![Arc::new(NameRequired), Arc::new(NameLength)],
    );

    let response = dispatcher
        .send(
            CreateProduct {
                name: "  ".to_string(),
            },
            CancelSignal::none(),
        )
        .await;

    assert!(response.is_failure());
    assert_eq!(calls.load(Ordering::SeqCst), 0, "handler must not run");
    let messages: Vec<&str> = response
        .errors()
        .iter()
        .map(AppError::message)
        .collect();
    assert_eq!(messages, vec!["name must not be empty"]);
    assert_eq!(response.errors()[0].metadata()["field"], "name");
    assert_eq!(response.errors()[0].metadata()["code"], "not_empty");
    assert_eq!(response.errors()[0].metadata()["severity"], "error");
}

#[tokio::test]
async fn valid_request_reaches_the_handler() {
    let dispatcher = dispatcher();
    let calls = Arc::new(AtomicUsize::new(0));
    dispatcher.register::<CreateProduct>(
        Arc::new(CreateProductHandler {
            calls: calls.clone(),
        }),
        vec![Arc::new(NameRequired), Arc::new(NameLength)],
    );

    let response = dispatcher
        .send(
            CreateProduct {
                name: "trail boots".to_string(),
            },
            CancelSignal::none(),
        )
        .await;

    assert!(response.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unregistered_request_dispatches_to_a_failure() {
    let dispatcher = dispatcher();
    let response = dispatcher
        .send(
            CreateProduct {
                name: "x".to_string(),
            },
            CancelSignal::none(),
        )
        .await;
    assert!(response.is_failure());
    assert_eq!(response.errors()[0].metadata()["kind"], "dispatch");
}

#[tokio::test]
async fn cancelled_request_never_reaches_the_handler() {
    let dispatcher = dispatcher();
    let calls = Arc::new(AtomicUsize::new(0));
    dispatcher.register::<CreateProduct>(
        Arc::new(CreateProductHandler {
            calls: calls.clone(),
        }),
        Vec::new(),
    );

    let handle = CancelHandle::new();
    handle.cancel();

    let response = dispatcher
        .send(
            CreateProduct {
                name: "trail boots".to_string(),
            },
            handle.signal(),
        )
        .await;

    assert!(response.is_failure());
    assert_eq!(response.errors()[0].metadata()["kind"], "cancelled");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn single_flight_invokes_the_factory_exactly_once() {
    let cache = Arc::new(CacheService::new(CacheConfig::default()));
    let factory_calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        let factory_calls = Arc::clone(&factory_calls);
        let barrier = Arc::clone(&barrier);
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            cache
                .get_or_create(
                    "flight",
                    || async move {
                        factory_calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        777u32
                    },
                    &[],
                    None,
                    None,
                )
                .await
                .expect("get_or_create")
        }));
    }

    for task in tasks {
        assert_eq!(task.await.expect("join"), 777);
    }
    assert_eq!(factory_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn remove_by_tags_invalidates_every_tagged_entry() {
    let cache = CacheService::new(CacheConfig::default());
    let shoes = vec!["category:shoes".to_string()];
    let hats = vec!["category:hats".to_string()];

    cache
        .set("product:1", "sneaker".to_string(), &shoes, None, None)
        .await
        .expect("set");
    cache
        .set("product:2", "boot".to_string(), &shoes, None, None)
        .await
        .expect("set");
    cache
        .set("product:3", "beanie".to_string(), &hats, None, None)
        .await
        .expect("set");

    cache.remove_by_tags(&shoes).await.expect("remove_by_tags");

    assert_eq!(cache.get::<String>("product:1").await.expect("get"), None);
    assert_eq!(cache.get::<String>("product:2").await.expect("get"), None);
    assert_eq!(
        cache.get::<String>("product:3").await.expect("get"),
        Some("beanie".to_string())
    );
}

#[tokio::test]
async fn failed_responses_are_cached_verbatim() {
    struct FailingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Handler<CachedProductQuery, TypedOutcome<Product>> for FailingHandler {
        async fn handle(
            &self,
            _request: Arc<CachedProductQuery>,
            _cancel: CancelSignal,
        ) -> TypedOutcome<Product> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            TypedOutcome::fail("upstream unavailable")
        }
    }

    let dispatcher = dispatcher();
    let calls = Arc::new(AtomicUsize::new(0));
    dispatcher.register_cacheable::<CachedProductQuery>(
        Arc::new(FailingHandler {
            calls: calls.clone(),
        }),
        Vec::new(),
    );

    let first = dispatcher
        .send(CachedProductQuery::new(55), CancelSignal::none())
        .await;
    let second = dispatcher
        .send(CachedProductQuery::new(55), CancelSignal::none())
        .await;

    assert!(first.is_failure());
    assert_eq!(second, first, "the failure is cached like any other value");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn optional_payloads_survive_the_distributed_tier() {
    let tier = Arc::new(InMemoryDistributedTier::new());
    let writer = CacheService::with_tier(CacheConfig::default(), tier.clone());
    let reader = CacheService::with_tier(CacheConfig::default(), tier);

    // A successful find-by-id that found nothing: the value slot is a `None`
    // payload, not an absent one.
    let stored: TypedOutcome<Option<Product>> = TypedOutcome::from_value(None);
    writer
        .set("product:404", stored.clone(), &[], None, None)
        .await
        .expect("set");

    // The reader's local tier is empty, so this crosses the serialized
    // distributed tier.
    let back: Option<TypedOutcome<Option<Product>>> =
        reader.get("product:404").await.expect("get");
    let back = back.expect("entry present");
    assert!(back.is_success());
    assert_eq!(*back.value(), None);
    assert_eq!(back, stored);
}

#[test]
fn merge_laws_hold_for_mixed_outcomes() {
    assert!(merge([]).is_success());
    assert!(merge([Outcome::ok(), Outcome::ok()]).is_success());

    let merged = merge([Outcome::ok(), Outcome::fail("e1"), Outcome::fail("e2")]);
    let messages: Vec<&str> = merged.errors().iter().map(AppError::message).collect();
    assert_eq!(messages, vec!["e1", "e2"]);
}

mod merge_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn merge_preserves_error_order(messages in proptest::collection::vec("[a-z]{1,8}", 0..6)) {
            let outcomes: Vec<Outcome> = messages.iter().map(|m| Outcome::fail(m.clone())).collect();
            let merged = merge(outcomes);

            let observed: Vec<String> = merged
                .errors()
                .iter()
                .map(|e| e.message().to_string())
                .collect();
            prop_assert_eq!(&observed, &messages);
            prop_assert_eq!(merged.is_success(), messages.is_empty());
        }
    }
}
