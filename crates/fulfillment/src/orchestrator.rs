//! The fulfillment orchestrator.
//!
//! The only component aware of step ordering: every collaborator is a
//! plain request/response service. Data flows forward only; later steps
//! receive references produced by earlier steps, merged into the ledger
//! accumulator after each join.

use std::time::Instant;

use common::LedgerId;
use domain::{OrderRequest, PaymentCharge, TransactionLedger, compose_charge_amount};

use crate::error::{ErrorEnvelope, FulfillmentError};
use crate::idempotency::charge_key;
use crate::invoice::render_invoice;
use crate::location::resolve_location;
use crate::services::crm::{CrmApi, CrmStore, Lead, LeadSyncOutcome, sync_lead};
use crate::services::inventory::{ProductStore, apply_purchases};
use crate::services::ledger_store::LedgerStore;
use crate::services::payment::{ChargeRequest, PaymentGateway};
use crate::services::profile::{UserProfile, UserStore};
use crate::services::shipping::{ShipmentRecord, ShippingService};

/// Boxes a future as a `Send` trait object.
///
/// Purely a type-inference aid with no effect on behaviour or the
/// concurrency at the join points: it collapses the higher-ranked
/// lifetime that rustc otherwise cannot prove `Send` for a native
/// `async fn` that awaits an `#[async_trait]` method (rust-lang/rust
/// #102211). Awaiting the boxed future is equivalent to awaiting the
/// original.
fn send_boxed<'a, T>(
    fut: impl std::future::Future<Output = T> + Send + 'a,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>> {
    Box::pin(fut)
}

/// What the caller gets back once the saga reaches a terminal status.
///
/// A hard failure after capture still carries the accumulated ledger and
/// user snapshot, flagged through the envelope, because the money was
/// taken and is not auto-reversed.
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub transaction: TransactionLedger,
    pub user: Option<UserProfile>,
    pub error: ErrorEnvelope,
}

/// Drives a submitted order through payment, CRM, shipping, and
/// inventory.
///
/// One logical workflow per submission, fanning out to concurrent calls
/// at the defined join points. No step that depends on the charge outcome
/// begins before the charge join completes; steps within the same join
/// tolerate arbitrary completion order. No retries: failures are
/// classified, not retried.
pub struct FulfillmentOrchestrator<G, U, C, A, S, P, L>
where
    G: PaymentGateway,
    U: UserStore,
    C: CrmStore,
    A: CrmApi,
    S: ShippingService,
    P: ProductStore,
    L: LedgerStore,
{
    gateway: G,
    users: U,
    crm_store: C,
    crm_api: A,
    shipping: S,
    products: P,
    ledgers: L,
}

impl<G, U, C, A, S, P, L> FulfillmentOrchestrator<G, U, C, A, S, P, L>
where
    G: PaymentGateway,
    U: UserStore,
    C: CrmStore,
    A: CrmApi,
    S: ShippingService,
    P: ProductStore,
    L: LedgerStore,
{
    /// Creates a new orchestrator over the given collaborators.
    pub fn new(
        gateway: G,
        users: U,
        crm_store: C,
        crm_api: A,
        shipping: S,
        products: P,
        ledgers: L,
    ) -> Self {
        Self {
            gateway,
            users,
            crm_store,
            crm_api,
            shipping,
            products,
            ledgers,
        }
    }

    /// Submits a final order and drives it to a terminal status.
    ///
    /// Hard failures before capture return an error; hard failures after
    /// capture return the accumulated state with a hard envelope.
    #[tracing::instrument(skip(self, order), fields(user_id = %order.user_id))]
    pub async fn submit_final_order(
        &self,
        order: OrderRequest,
    ) -> Result<CheckoutOutcome, FulfillmentError> {
        metrics::counter!("order_submissions_total").increment(1);
        let started = Instant::now();

        // Intake: validate, open the ledger, then fan out persistence,
        // the contact-info update, and location resolution.
        order.validate()?;
        let ledger_id = LedgerId::new();
        let mut ledger = TransactionLedger::open(ledger_id, &order);
        tracing::info!(%ledger_id, "order intake");

        let (persisted, contact, location) = tokio::join!(
            self.ledgers.create(&ledger),
            self.users
                .update_contact(order.user_id, &order.shipping.email, order.newsletter_opt_in),
            send_boxed(resolve_location(&self.gateway, order.billing.country)),
        );
        if let Err(e) = persisted {
            return Err(send_boxed(self.fail_before_capture(ledger, e, started)).await);
        }
        let mut user = match contact {
            Ok(profile) => Some(profile),
            Err(e) => return Err(send_boxed(self.fail_before_capture(ledger, e, started)).await),
        };
        let location = match location {
            Ok(location) => location,
            Err(e) => return Err(send_boxed(self.fail_before_capture(ledger, e, started)).await),
        };
        ledger.mark_location_resolved()?;

        // Charge against the resolved location. Any failure here is
        // terminal; no downstream step runs.
        ledger.mark_charging()?;
        let amount = match compose_charge_amount(
            order.billing.country,
            &order.totals.grand_total,
            order.fx_rate,
        ) {
            Ok(amount) => amount,
            Err(e) => return Err(send_boxed(self.fail_before_capture(ledger, e.into(), started)).await),
        };
        tracing::info!(%ledger_id, amount = amount.amount, currency = %amount.currency, "submitting charge");

        let request = ChargeRequest {
            location_id: location.id,
            idempotency_key: charge_key(ledger_id),
            reference_id: ledger_id,
            buyer_email: order.shipping.email.clone(),
            destination: order.shipping.clone(),
            amount,
            card_nonce: order.card.nonce.clone(),
            note: format!("{}: Online order.", order.billing.country.location_name()),
        };
        let capture = match self.gateway.charge(request).await {
            Ok(capture) => capture,
            Err(e) => return Err(send_boxed(self.fail_before_capture(ledger, e, started)).await),
        };
        ledger.record_charge(PaymentCharge {
            amount: amount.amount,
            currency: amount.currency,
            provider_ref: capture.provider_ref,
            status: capture.status,
        })?;
        metrics::counter!("order_charges_captured").increment(1);

        // Post-charge fan-out: transaction history, lead existence check,
        // shipment export. All depend on the charge, none on each other.
        ledger.mark_post_charge_sync()?;
        let shipment_record = ShipmentRecord {
            ledger_id,
            user_id: order.user_id,
            destination: order.shipping.clone(),
            items: order.cart.clone(),
            totals: order.totals.clone(),
        };
        let (history, existing, export) = tokio::join!(
            self.users.append_transaction(order.user_id, ledger_id),
            self.crm_store.find_by_email(&order.shipping.email),
            self.shipping.export_shipment(shipment_record),
        );
        match history {
            Ok(profile) => user = Some(profile),
            Err(e) => return Ok(send_boxed(self.fail_after_capture(ledger, user, e, started)).await),
        }
        let existing = match existing {
            Ok(found) => found,
            Err(e) => {
                ledger.note_soft_error(format!("lead lookup failed: {e}"));
                None
            }
        };
        let shipment = match export {
            Ok(handle) => handle,
            Err(e) => return Ok(send_boxed(self.fail_after_capture(ledger, user, e, started)).await),
        };
        ledger.set_shipment_ref(shipment.reference.as_str());

        // Second half of the fan-out, now that the shipment reference and
        // lead existence are known.
        let crm_lead = Lead {
            email: order.shipping.email.clone(),
            given_name: order.shipping.given_name.clone(),
            family_name: order.shipping.family_name.clone(),
            locale: order.locale,
        };
        let (invoice, lead_report, saved) = tokio::join!(
            async {
                render_invoice(
                    &order.cart,
                    &order.totals,
                    &order.shipping,
                    &shipment.reference,
                    order.locale,
                )
            },
            send_boxed(sync_lead(
                &self.crm_store,
                &self.crm_api,
                &crm_lead,
                existing,
                &order.totals,
                &order.cart,
            )),
            self.ledgers.update(&ledger),
        );
        match invoice {
            Ok(body) => ledger.set_invoice_body(body),
            Err(e) => ledger.note_soft_error(e.to_string()),
        }
        for note in &lead_report.soft_errors {
            ledger.note_soft_error(note.clone());
        }
        if let Some(outcome) = &lead_report.outcome {
            ledger.set_lead_ref(outcome.local_id());
        }
        if let Err(e) = saved {
            return Ok(send_boxed(self.fail_after_capture(ledger, user, e, started)).await);
        }

        // Shipment handoff, plus the profile lead-reference backfill when
        // the lead was newly created.
        ledger.mark_shipping_handoff()?;
        let ack = if let Some(LeadSyncOutcome::Created { id }) = &lead_report.outcome {
            let (ack, backfill) = tokio::join!(
                self.shipping
                    .confirm_handoff(order.user_id, &shipment.reference, ledger_id),
                self.users.set_lead_ref(order.user_id, id),
            );
            match backfill {
                Ok(profile) => user = Some(profile),
                Err(e) => ledger.note_soft_error(format!("lead reference backfill failed: {e}")),
            }
            ack
        } else {
            self.shipping
                .confirm_handoff(order.user_id, &shipment.reference, ledger_id)
                .await
        };
        let ack = match ack {
            Ok(ack) => ack,
            Err(e) => return Ok(send_boxed(self.fail_after_capture(ledger, user, e, started)).await),
        };
        if !ack.accepted() {
            let err = FulfillmentError::ShippingExportFailed {
                detail: format!("handoff returned status {}: {}", ack.status, ack.body),
            };
            return Ok(send_boxed(self.fail_after_capture(ledger, user, err, started)).await);
        }

        // Best-effort inventory fan-out; never gates the result.
        ledger.mark_inventory_sync()?;
        let report = send_boxed(apply_purchases(&self.products, &order.cart, ledger_id, order.user_id)).await;
        if !report.is_clean() {
            metrics::counter!("inventory_mutation_failures")
                .increment(report.failed.len() as u64);
            for (product_id, detail) in &report.failed {
                tracing::warn!(%ledger_id, %product_id, %detail, "inventory mutation failed");
                ledger.note_soft_error(format!("inventory update failed for {product_id}"));
            }
        }

        ledger.finish()?;
        if let Err(e) = self.ledgers.update(&ledger).await {
            tracing::error!(%ledger_id, error = %e, "failed to persist final ledger state");
        }

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("order_fulfillment_duration_seconds").record(duration);
        metrics::counter!("order_completed").increment(1);
        tracing::info!(%ledger_id, duration, status = %ledger.status(), "order fulfillment finished");

        let error = ErrorEnvelope::from_soft_notes(ledger.soft_errors());
        Ok(CheckoutOutcome {
            transaction: ledger,
            user,
            error,
        })
    }

    /// Loads a ledger by id.
    pub async fn get_ledger(
        &self,
        id: LedgerId,
    ) -> Result<Option<TransactionLedger>, FulfillmentError> {
        self.ledgers.get(id).await
    }

    /// Terminal handling for hard failures while no money has been taken:
    /// the error propagates and nothing accumulated is returned.
    async fn fail_before_capture(
        &self,
        mut ledger: TransactionLedger,
        err: FulfillmentError,
        started: Instant,
    ) -> FulfillmentError {
        tracing::error!(ledger_id = %ledger.id(), error = %err, "hard failure before capture");
        ledger.fail_hard();
        if let Err(persist) = self.ledgers.update(&ledger).await {
            tracing::error!(ledger_id = %ledger.id(), error = %persist, "failed to persist hard failure");
        }
        metrics::counter!("order_failed_hard").increment(1);
        metrics::histogram!("order_fulfillment_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        err
    }

    /// Terminal handling for hard failures after the charge was captured:
    /// the accumulated ledger/user state is returned with a hard envelope
    /// since the money is not auto-reversed.
    async fn fail_after_capture(
        &self,
        mut ledger: TransactionLedger,
        user: Option<UserProfile>,
        err: FulfillmentError,
        started: Instant,
    ) -> CheckoutOutcome {
        tracing::error!(ledger_id = %ledger.id(), error = %err, "hard failure after capture");
        ledger.fail_hard();
        if let Err(persist) = self.ledgers.update(&ledger).await {
            tracing::error!(ledger_id = %ledger.id(), error = %persist, "failed to persist hard failure");
        }
        metrics::counter!("order_failed_hard").increment(1);
        metrics::histogram!("order_fulfillment_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        CheckoutOutcome {
            transaction: ledger,
            user,
            error: ErrorEnvelope::from(&err),
        }
    }
}
