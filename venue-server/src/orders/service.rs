//! Order service: create, transition, read, track

use std::sync::Arc;

use serde_json::json;
use shared::order::{CreateOrderRequest, ListOrdersQuery, Order, OrderStatus, OrderTrackingView};

use super::error::{OrderError, OrderResult};
use super::lifecycle::apply_status;
use super::money::{non_empty, order_total, validate_items};
use crate::audit::{AuditAction, AuditService, ClientOrigin};
use crate::auth::CurrentUser;
use crate::db::repository::OrderRepository;
use crate::security_log;
use crate::utils::time::{SharedClock, now_millis};
use crate::utils::validation::{
    MAX_ID_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_TABLE_LEN, validate_optional_text,
    validate_required_text,
};

pub struct OrderService {
    repo: OrderRepository,
    audit: Arc<AuditService>,
    clock: SharedClock,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService").finish_non_exhaustive()
    }
}

impl OrderService {
    pub fn new(repo: OrderRepository, audit: Arc<AuditService>, clock: SharedClock) -> Self {
        Self { repo, audit, clock }
    }

    /// Place a customer order
    ///
    /// Any client-side total is ignored. The order number is the venue's
    /// next sequence, allocated in the same transaction as the insert.
    pub fn create_order(
        &self,
        req: CreateOrderRequest,
        origin: &ClientOrigin,
    ) -> OrderResult<Order> {
        let venue_id = req.venue_id.trim().to_string();
        let table_number = req.table_number.trim().to_string();
        validate_required_text(&venue_id, "venueId", MAX_ID_LEN).map_err(OrderError::Validation)?;
        validate_required_text(&table_number, "tableNumber", MAX_TABLE_LEN)
            .map_err(OrderError::Validation)?;
        validate_optional_text(&req.customer_name, "customerName", MAX_NAME_LEN)
            .map_err(OrderError::Validation)?;
        validate_optional_text(&req.special_instructions, "specialInstructions", MAX_NOTE_LEN)
            .map_err(OrderError::Validation)?;

        let items = validate_items(&req.items)?;
        let total_amount = order_total(&items);
        let now = now_millis(&self.clock);
        let customer_name = non_empty(&req.customer_name);
        let special_instructions = non_empty(&req.special_instructions);

        let order = self.repo.insert_new(&venue_id, |seq| Order {
            id: uuid::Uuid::new_v4().to_string(),
            venue_id: venue_id.clone(),
            table_number,
            order_number: format!("{venue_id}-{seq:04}"),
            items,
            total_amount,
            customer_name,
            special_instructions,
            status: OrderStatus::New,
            payment_method: None,
            payment_status: None,
            created_at: now,
            prepared_at: None,
            ready_at: None,
            served_at: None,
            updated_at: now,
        })?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            venue_id = %order.venue_id,
            total = %order.total_amount,
            "Order created"
        );
        self.audit.log(
            AuditAction::OrderCreated,
            None,
            origin,
            json!({
                "orderId": order.id,
                "orderNumber": order.order_number,
                "venueId": order.venue_id,
                "tableNumber": order.table_number,
                "totalAmount": order.total_amount,
            }),
        );
        Ok(order)
    }

    /// Move an order through its lifecycle
    ///
    /// Venue check, transition check and write run in one transaction.
    pub fn update_status(
        &self,
        order_id: &str,
        new_status: &str,
        actor: &CurrentUser,
        origin: &ClientOrigin,
    ) -> OrderResult<Order> {
        let target: OrderStatus = new_status
            .parse()
            .map_err(|_| OrderError::UnknownStatus(new_status.to_string()))?;
        let now = now_millis(&self.clock);
        let mut previous = None;

        let result = self.repo.update(order_id, |order: &mut Order| {
            if order.venue_id != actor.venue_id {
                return Err(OrderError::Forbidden);
            }
            let from = order.status;
            let changed = apply_status(order, target, now)?;
            if changed {
                previous = Some(from);
            }
            Ok(changed)
        });

        let order = match result {
            Ok(Some(order)) => order,
            Ok(None) => return Err(OrderError::NotFound(order_id.to_string())),
            Err(OrderError::Forbidden) => {
                self.deny_cross_venue(order_id, actor, origin);
                return Err(OrderError::Forbidden);
            }
            Err(e) => return Err(e),
        };

        if let Some(from) = previous {
            tracing::info!(
                order_id = %order.id,
                from = %from,
                to = %order.status,
                user_id = %actor.id,
                "Order status changed"
            );
            self.audit.log(
                AuditAction::OrderStatusChanged,
                Some(actor.id.clone()),
                origin,
                json!({
                    "orderId": order.id,
                    "orderNumber": order.order_number,
                    "from": from,
                    "to": order.status,
                }),
            );
        }
        Ok(order)
    }

    /// Staff read of one order in the actor's venue
    pub fn get_order(
        &self,
        order_id: &str,
        actor: &CurrentUser,
        origin: &ClientOrigin,
    ) -> OrderResult<Order> {
        let order = self
            .repo
            .get(order_id)?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;
        if order.venue_id != actor.venue_id {
            self.deny_cross_venue(order_id, actor, origin);
            return Err(OrderError::Forbidden);
        }
        Ok(order)
    }

    /// Orders of the actor's venue, newest first, optionally by status
    pub fn list_orders(
        &self,
        query: &ListOrdersQuery,
        actor: &CurrentUser,
        origin: &ClientOrigin,
    ) -> OrderResult<Vec<Order>> {
        let venue_id = match non_empty(&query.venue_id) {
            Some(requested) if requested != actor.venue_id => {
                security_log!(
                    "WARN",
                    "cross_venue_list",
                    user_id = actor.id.as_str(),
                    venue_id = requested.as_str()
                );
                self.audit.log(
                    AuditAction::CrossVenueDenied,
                    Some(actor.id.clone()),
                    origin,
                    json!({ "requestedVenueId": requested, "venueId": actor.venue_id }),
                );
                return Err(OrderError::Forbidden);
            }
            _ => actor.venue_id.as_str(),
        };

        let status = match non_empty(&query.status) {
            Some(raw) => Some(
                raw.parse::<OrderStatus>()
                    .map_err(|_| OrderError::UnknownStatus(raw.clone()))?,
            ),
            None => None,
        };

        let mut orders = self.repo.list_by_venue(venue_id)?;
        if let Some(status) = status {
            orders.retain(|o| o.status == status);
        }
        // Stable: equal timestamps keep sequence order
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Public tracking by order number
    pub fn track_order(&self, order_number: &str) -> OrderResult<OrderTrackingView> {
        self.repo
            .find_by_number(order_number.trim())?
            .map(|order| order.tracking_view())
            .ok_or_else(|| OrderError::NotFound(order_number.to_string()))
    }

    fn deny_cross_venue(&self, order_id: &str, actor: &CurrentUser, origin: &ClientOrigin) {
        security_log!(
            "WARN",
            "cross_venue_denied",
            user_id = actor.id.as_str(),
            order_id = order_id
        );
        self.audit.log(
            AuditAction::CrossVenueDenied,
            Some(actor.id.clone()),
            origin,
            json!({ "orderId": order_id, "venueId": actor.venue_id }),
        );
    }
}
