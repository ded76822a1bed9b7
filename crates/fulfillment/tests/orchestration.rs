//! Integration tests for the fulfillment orchestration.

use common::UserId;
use domain::{
    BillingCountry, BillingInfo, CardInfo, CartItem, Currency, Discount, LedgerStatus, Locale,
    OrderRequest, OrderTotals, ProductId, ShippingDestination, TaxBreakdown,
};
use fulfillment::{
    FulfillmentOrchestrator, InMemoryCrmApi, InMemoryCrmStore, InMemoryLedgerStore,
    InMemoryOrchestrator, InMemoryPaymentGateway, InMemoryProductStore, InMemoryShippingService,
    InMemoryUserStore, LedgerStore, UserStore, charge_key,
};

struct TestHarness {
    orchestrator: InMemoryOrchestrator,
    gateway: InMemoryPaymentGateway,
    users: InMemoryUserStore,
    crm_store: InMemoryCrmStore,
    shipping: InMemoryShippingService,
    products: InMemoryProductStore,
    ledgers: InMemoryLedgerStore,
}

impl TestHarness {
    fn new() -> Self {
        let gateway = InMemoryPaymentGateway::new();
        let users = InMemoryUserStore::new();
        let crm_store = InMemoryCrmStore::new();
        let crm_api = InMemoryCrmApi::new();
        let shipping = InMemoryShippingService::new();
        let products = InMemoryProductStore::new();
        let ledgers = InMemoryLedgerStore::new();

        let orchestrator = FulfillmentOrchestrator::new(
            gateway.clone(),
            users.clone(),
            crm_store.clone(),
            crm_api.clone(),
            shipping.clone(),
            products.clone(),
            ledgers.clone(),
        );

        Self {
            orchestrator,
            gateway,
            users,
            crm_store,
            shipping,
            products,
            ledgers,
        }
    }
}

fn us_order() -> OrderRequest {
    OrderRequest {
        user_id: UserId::new(),
        cart: vec![CartItem::new("P1", 2)],
        taxes: TaxBreakdown {
            city: 2,
            state: 6,
            total: 8,
        },
        totals: OrderTotals {
            sub_total: "45.00".to_string(),
            tax: "4.98".to_string(),
            grand_total: "49.98".to_string(),
            discount: Discount::default(),
        },
        billing: BillingInfo {
            country: BillingCountry::UnitedStates,
            city: "Portland".to_string(),
            prefecture: "OR".to_string(),
        },
        card: CardInfo {
            name_on_card: "Aiko Tanaka".to_string(),
            last4: 4242,
            nonce: "cnon-test-ok".to_string(),
        },
        shipping: ShippingDestination {
            given_name: "Aiko".to_string(),
            family_name: "Tanaka".to_string(),
            email: "aiko@example.com".to_string(),
            postal_code: "97201".to_string(),
            address_line1: "100 SW Main St".to_string(),
            address_line2: "Apt 4".to_string(),
            city: "Portland".to_string(),
            prefecture: "OR".to_string(),
            country: "US".to_string(),
            phone: "5035550100".to_string(),
        },
        fx_rate: None,
        locale: Locale::English,
        newsletter_opt_in: true,
        terms_accepted: true,
        comments: None,
    }
}

#[tokio::test]
async fn test_full_checkout_reaches_complete() {
    let h = TestHarness::new();
    let user_id = {
        let order = us_order();
        let id = order.user_id;
        h.users.seed_cart(id, order.cart.clone());

        let outcome = h.orchestrator.submit_final_order(order).await.unwrap();

        assert_eq!(outcome.transaction.status(), LedgerStatus::Complete);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.transaction.payment().unwrap().amount, 4998);
        assert_eq!(
            outcome.transaction.payment().unwrap().currency,
            Currency::Usd
        );
        id
    };

    // The stored cart was cleared once the charge stuck.
    let profile = h.users.get(user_id).await.unwrap().unwrap();
    assert!(profile.cart.is_empty());
    assert_eq!(profile.transactions.len(), 1);
}

#[tokio::test]
async fn test_every_step_left_its_reference() {
    let h = TestHarness::new();
    let outcome = h.orchestrator.submit_final_order(us_order()).await.unwrap();

    let ledger = outcome.transaction;
    let shipment_ref = ledger.shipment_ref().unwrap();
    assert!(h.shipping.shipment(shipment_ref).is_some());
    assert!(!h.crm_store.tags("aiko@example.com").unwrap().is_empty());
    assert!(ledger.invoice_body().unwrap().contains(shipment_ref));
    assert_eq!(
        h.ledgers.get(ledger.id()).await.unwrap().unwrap().status(),
        LedgerStatus::Complete
    );
}

#[tokio::test]
async fn test_resubmission_of_same_ledger_cannot_double_charge() {
    let h = TestHarness::new();
    let outcome = h.orchestrator.submit_final_order(us_order()).await.unwrap();
    let ledger_id = outcome.transaction.id();

    // A network-level retry reuses the derived key and is deduplicated
    // by the processor.
    assert_eq!(charge_key(ledger_id), charge_key(ledger_id));
    assert_eq!(h.gateway.captured_keys(), vec![charge_key(ledger_id)]);
    assert_eq!(h.gateway.captured_count(), 1);
}

#[tokio::test]
async fn test_missing_location_yields_hard_error_without_charge() {
    let h = TestHarness::new();
    h.gateway.set_locations(Vec::new());

    let err = h
        .orchestrator
        .submit_final_order(us_order())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Did not find requested location in processor locations."
    );
    assert_eq!(h.gateway.charge_attempts(), 0);

    // The parked ledger has no charge sub-record.
    let ids = h.ledgers.ledger_ids();
    assert_eq!(ids.len(), 1);
    let stored = h.ledgers.get(ids[0]).await.unwrap().unwrap();
    assert_eq!(stored.status(), LedgerStatus::FailedHard);
    assert!(stored.payment().is_none());
}

#[tokio::test]
async fn test_payment_failure_runs_no_downstream_calls() {
    let h = TestHarness::new();
    h.gateway.set_fail_on_charge(true);

    let err = h
        .orchestrator
        .submit_final_order(us_order())
        .await
        .unwrap_err();

    assert!(err.is_hard());
    assert_eq!(h.shipping.export_count(), 0);
    assert_eq!(h.shipping.confirmed_count(), 0);
    assert_eq!(h.products.total_calls(), 0);
}

#[tokio::test]
async fn test_shipping_failure_after_capture_reports_payment() {
    let h = TestHarness::new();
    h.shipping.set_fail_on_export(true);

    let outcome = h.orchestrator.submit_final_order(us_order()).await.unwrap();

    assert!(outcome.error.hard);
    let charge = outcome.transaction.payment().unwrap();
    assert_eq!(charge.amount, 4998);
    assert_eq!(h.gateway.captured_count(), 1);
}

#[tokio::test]
async fn test_partial_inventory_failure_spares_siblings() {
    let h = TestHarness::new();
    h.products.set_fail_for("P2");

    let mut order = us_order();
    order.cart = vec![
        CartItem::new("P1", 2),
        CartItem::new("P2", 1),
        CartItem::new("P3", 4),
    ];

    let outcome = h.orchestrator.submit_final_order(order).await.unwrap();

    assert!(outcome.error.soft);
    assert_eq!(h.products.counter(&ProductId::new("P1")).purchased, 1);
    assert_eq!(h.products.counter(&ProductId::new("P3")).purchased, 1);
    assert_eq!(h.products.counter(&ProductId::new("P2")).purchased, 0);
    // The saga still confirmed the shipment.
    assert_eq!(h.shipping.confirmed_count(), 1);
}

#[tokio::test]
async fn test_repeat_customer_updates_lead_instead_of_creating() {
    let h = TestHarness::new();
    h.crm_store.seed_lead("aiko@example.com");

    h.orchestrator.submit_final_order(us_order()).await.unwrap();

    assert_eq!(h.crm_store.create_count(), 0);
    assert_eq!(h.crm_store.update_count(), 1);
    assert_eq!(h.users.lead_ref_updates(), 0);
}
