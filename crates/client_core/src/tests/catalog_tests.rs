use super::*;
use crate::test_support::{numbered_products, product, FakeGateway, GatewayCall};
use shared::domain::Category;

fn ids(products: &[Product]) -> Vec<i64> {
    products.iter().map(|p| p.id.0).collect()
}

async fn mounted(products: Vec<Product>, limit: usize) -> (Arc<FakeGateway>, CatalogController) {
    let gateway = Arc::new(FakeGateway::with_products(products));
    let mut catalog = CatalogController::new(gateway.clone(), limit);
    catalog.dispatch(CatalogEvent::Mount).await;
    (gateway, catalog)
}

#[tokio::test]
async fn starts_idle_until_mounted() {
    let gateway = Arc::new(FakeGateway::with_products(numbered_products(3)));
    let catalog = CatalogController::new(gateway.clone(), 10);

    assert_eq!(catalog.phase(), CatalogPhase::Idle);
    assert!(catalog.items().is_empty());
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn full_page_enables_next_and_short_page_disables_it() {
    let (gateway, mut catalog) = mounted(numbered_products(13), 10).await;

    assert_eq!(catalog.phase(), CatalogPhase::Loaded);
    assert_eq!(catalog.items().len(), 10);
    assert!(catalog.has_next());
    assert!(!catalog.has_previous());

    catalog.dispatch(CatalogEvent::NextPage).await;
    assert_eq!(catalog.offset(), 10);
    assert_eq!(catalog.current_page(), 2);
    assert_eq!(ids(catalog.items()), vec![11, 12, 13]);
    assert!(!catalog.has_next());

    catalog.dispatch(CatalogEvent::NextPage).await;
    assert_eq!(catalog.offset(), 10);
    assert_eq!(
        gateway.calls(),
        vec![
            GatewayCall::List { limit: 10, offset: 0 },
            GatewayCall::List { limit: 10, offset: 10 },
        ]
    );
}

#[tokio::test]
async fn previous_is_floored_at_zero_and_keeps_offset_aligned() {
    let (gateway, mut catalog) = mounted(numbered_products(25), 10).await;

    catalog.dispatch(CatalogEvent::PreviousPage).await;
    assert_eq!(catalog.offset(), 0);
    assert_eq!(gateway.calls().len(), 1);

    catalog.next_page().await;
    catalog.next_page().await;
    assert_eq!(catalog.offset(), 20);
    catalog.previous_page().await;
    assert_eq!(catalog.offset(), 10);
    assert_eq!(catalog.offset() % catalog.limit(), 0);
    catalog.previous_page().await;
    assert_eq!(catalog.offset(), 0);
    assert!(!catalog.has_previous());
}

#[tokio::test]
async fn fetch_failure_keeps_items_and_retry_recovers() {
    let (gateway, mut catalog) = mounted(numbered_products(5), 10).await;
    let before = catalog.items().to_vec();

    gateway.fail_list(Some(GatewayError::Network("connection refused".into())));
    catalog.refresh().await;

    assert_eq!(catalog.phase(), CatalogPhase::Error);
    assert_eq!(catalog.error(), Some(FETCH_FAILED_MESSAGE));
    assert_eq!(catalog.items(), before.as_slice());

    gateway.fail_list(None);
    catalog.dispatch(CatalogEvent::Retry).await;
    assert_eq!(catalog.phase(), CatalogPhase::Loaded);
    assert_eq!(catalog.error(), None);
}

#[tokio::test]
async fn failed_page_turn_keeps_shown_page_and_next_does_not_skip() {
    let (gateway, mut catalog) = mounted(numbered_products(30), 10).await;

    gateway.fail_list(Some(GatewayError::Network("connection reset".into())));
    catalog.dispatch(CatalogEvent::NextPage).await;

    assert_eq!(catalog.phase(), CatalogPhase::Error);
    assert_eq!(catalog.offset(), 10);
    assert_eq!(catalog.current_page(), 1);
    assert!(!catalog.has_previous());
    assert_eq!(ids(catalog.items()), (1..=10).collect::<Vec<_>>());

    gateway.fail_list(None);
    catalog.dispatch(CatalogEvent::NextPage).await;

    assert_eq!(catalog.phase(), CatalogPhase::Loaded);
    assert_eq!(catalog.offset(), 10);
    assert_eq!(catalog.current_page(), 2);
    assert_eq!(ids(catalog.items()), (11..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn oversized_page_is_truncated_and_still_counts_as_full() {
    let gateway = Arc::new(FakeGateway::default());
    let mut catalog = CatalogController::new(gateway, 2);

    let ticket = catalog.begin_fetch();
    assert!(catalog.apply_fetch(ticket, Ok(numbered_products(5))));

    assert_eq!(ids(catalog.items()), vec![1, 2]);
    assert!(catalog.has_next());
}

#[tokio::test]
async fn late_response_for_an_abandoned_offset_is_ignored() {
    let (gateway, mut catalog) = mounted(numbered_products(25), 10).await;
    catalog.next_page().await;

    let forward = catalog.advance().expect("next page");
    assert_eq!(forward.offset(), 20);
    let back = catalog.retreat().expect("previous page");
    assert_eq!(back.offset(), 0);

    let newest = gateway.list(back.limit(), back.offset()).await;
    assert!(catalog.apply_fetch(back, newest));
    let stale = gateway.list(forward.limit(), forward.offset()).await;
    assert!(!catalog.apply_fetch(forward, stale));

    assert_eq!(catalog.offset(), 0);
    assert_eq!(catalog.current_page(), 1);
    assert_eq!(ids(catalog.items()), (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn superseded_fetch_for_same_offset_is_ignored() {
    let (_gateway, mut catalog) = mounted(numbered_products(3), 10).await;

    let older = catalog.begin_fetch();
    let newer = catalog.begin_fetch();
    assert!(catalog.apply_fetch(newer, Ok(numbered_products(2))));
    assert!(!catalog.apply_fetch(older, Err(GatewayError::server(500, "late"))));

    assert_eq!(catalog.phase(), CatalogPhase::Loaded);
    assert_eq!(catalog.items().len(), 2);
}

#[tokio::test]
async fn search_matches_title_or_category_without_refetching() {
    let products = vec![
        product(1, "Classic Red Jacket", Category::Clothes),
        product(2, "Wireless Headphones", Category::Electronics),
        product(3, "Oak Chair", Category::Furniture),
    ];
    let (gateway, mut catalog) = mounted(products, 10).await;

    catalog.dispatch(CatalogEvent::Search("JACKET".into())).await;
    assert_eq!(
        catalog.visible().iter().map(|p| p.id.0).collect::<Vec<_>>(),
        vec![1]
    );

    catalog.set_search("electro");
    assert_eq!(
        catalog.visible().iter().map(|p| p.id.0).collect::<Vec<_>>(),
        vec![2]
    );

    catalog.set_search("");
    assert_eq!(catalog.visible().len(), 3);
    assert_eq!(catalog.items().len(), 3);
    assert_eq!(gateway.calls().len(), 1);
}

#[test]
fn filtering_is_idempotent() {
    let products = vec![
        product(1, "Chair", Category::Furniture),
        product(2, "Desk chair", Category::Furniture),
        product(3, "Sneakers", Category::Shoes),
    ];

    let once = filter_products(&products, "chair");
    let twice = filter_products(once.iter().copied(), "chair");
    assert_eq!(once, twice);
    assert_eq!(once.len(), 2);
}

#[tokio::test]
async fn successful_delete_removes_only_the_target() {
    let (gateway, mut catalog) = mounted(numbered_products(8), 10).await;

    assert!(catalog.request_delete(ProductId(5)));
    assert!(catalog.pending_delete().is_confirm_open());
    assert_eq!(
        catalog.pending_delete().target().map(|p| p.id),
        Some(ProductId(5))
    );

    catalog.dispatch(CatalogEvent::ConfirmDelete).await;

    assert_eq!(ids(catalog.items()), vec![1, 2, 3, 4, 6, 7, 8]);
    assert_eq!(catalog.banner(), None);
    assert_eq!(catalog.pending_delete(), &PendingDelete::default());
    assert!(!gateway.product_ids().contains(&ProductId(5)));
}

#[tokio::test]
async fn confirmed_delete_stays_hidden_when_a_stale_copy_is_listed() {
    let (_gateway, mut catalog) = mounted(numbered_products(3), 10).await;

    catalog.request_delete(ProductId(2));
    catalog.confirm_and_delete().await;

    let ticket = catalog.begin_fetch();
    assert!(catalog.apply_fetch(ticket, Ok(numbered_products(3))));
    assert_eq!(ids(catalog.items()), vec![1, 3]);
}

#[tokio::test]
async fn repeated_deletes_keep_relative_order() {
    let (_gateway, mut catalog) = mounted(numbered_products(6), 10).await;

    for id in [2, 5, 3] {
        catalog.request_delete(ProductId(id));
        catalog.confirm_and_delete().await;
    }

    assert_eq!(ids(catalog.items()), vec![1, 4, 6]);
}

#[tokio::test]
async fn failed_delete_restores_previous_list_and_raises_banner() {
    let (gateway, mut catalog) = mounted(numbered_products(8), 10).await;
    let before = catalog.items().to_vec();
    gateway.fail_delete(Some(GatewayError::server(500, "internal")));

    catalog.request_delete(ProductId(5));
    let ticket = catalog.confirm_delete().expect("ticket");
    assert!(!catalog.items().iter().any(|p| p.id == ProductId(5)));
    assert!(!catalog.pending_delete().is_confirm_open());

    let result = gateway.delete(ticket.product_id()).await;
    catalog.finish_delete(ticket, result);

    assert_eq!(catalog.items(), before.as_slice());
    assert_eq!(catalog.banner(), Some(DELETE_FAILED_MESSAGE));
    assert_eq!(catalog.pending_delete().target(), None);

    catalog.dispatch(CatalogEvent::DismissBanner).await;
    assert_eq!(catalog.banner(), None);
}

#[tokio::test]
async fn cancel_leaves_items_untouched_and_skips_gateway() {
    let (gateway, mut catalog) = mounted(numbered_products(4), 10).await;
    let before = catalog.items().to_vec();

    catalog.dispatch(CatalogEvent::RequestDelete(ProductId(2))).await;
    catalog.dispatch(CatalogEvent::CancelDelete).await;
    catalog.dispatch(CatalogEvent::ConfirmDelete).await;

    assert_eq!(catalog.items(), before.as_slice());
    assert_eq!(catalog.pending_delete(), &PendingDelete::default());
    assert!(!gateway
        .calls()
        .iter()
        .any(|call| matches!(call, GatewayCall::Delete(_))));
}

#[tokio::test]
async fn delete_request_for_unknown_product_is_rejected() {
    let (_gateway, mut catalog) = mounted(numbered_products(2), 10).await;

    assert!(!catalog.request_delete(ProductId(99)));
    assert!(!catalog.pending_delete().is_confirm_open());
    assert!(catalog.confirm_delete().is_none());
}

#[tokio::test]
async fn failed_delete_after_page_reload_keeps_the_fresh_page() {
    let (gateway, mut catalog) = mounted(numbered_products(4), 10).await;
    gateway.fail_delete(Some(GatewayError::Network("reset".into())));

    catalog.request_delete(ProductId(3));
    let delete = catalog.confirm_delete().expect("ticket");

    let fetch = catalog.begin_fetch();
    let page = gateway.list(fetch.limit(), fetch.offset()).await;
    assert!(catalog.apply_fetch(fetch, page));
    assert_eq!(ids(catalog.items()), vec![1, 2, 4]);

    let result = gateway.delete(delete.product_id()).await;
    catalog.finish_delete(delete, result);

    assert_eq!(ids(catalog.items()), vec![1, 2, 3, 4]);
    assert_eq!(catalog.banner(), Some(DELETE_FAILED_MESSAGE));
}

#[tokio::test]
async fn rollback_does_not_resurrect_other_removed_products() {
    let (gateway, mut catalog) = mounted(numbered_products(5), 10).await;

    catalog.request_delete(ProductId(2));
    let failing = catalog.confirm_delete().expect("first ticket");
    catalog.request_delete(ProductId(4));
    let succeeding = catalog.confirm_delete().expect("second ticket");

    let ok = gateway.delete(succeeding.product_id()).await;
    catalog.finish_delete(succeeding, ok);
    catalog.finish_delete(failing, Err(GatewayError::server(503, "busy")));

    assert_eq!(ids(catalog.items()), vec![1, 2, 3, 5]);
}
