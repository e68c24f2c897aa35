use serde_json::{Map, Value};

use crate::api::{Order, OrderLine};
use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::routes::{param, params, Context, HttpParams};
use crate::validation::orders::{create_chain, destroy_chain, update_chain};
use crate::validation::{Submission, Verdict};

fn find(ctx: &Context, order_id: &str) -> Result<Order> {
    ctx.db
        .find_order(order_id)?
        .ok_or_else(|| Error::NotFound(format!("Order \"{}\" does not exist.", order_id)))
}

/// Whether the write may go ahead, and the error to answer with afterwards, if any
fn admit(verdict: Verdict) -> Result<Option<Error>> {
    match verdict {
        Verdict::Pass => Ok(None),
        Verdict::Reject(err) => Err(err),
        Verdict::Proceed(err) => Ok(Some(err)),
    }
}

/// Answer a write that went through: normally with the record, but with the validation error
/// when fall-through mode let a failed request in
fn answer(
    order: &Order,
    reported: Option<Error>,
    respond: fn(&Order) -> Result<Response>,
) -> Result<Response> {
    match reported {
        Some(err) => {
            tracing::warn!(%order.id, %err, "Order written despite failed validation");
            Err(err)
        }
        None => respond(order),
    }
}

fn text(data: &Map<String, Value>, field: &str) -> Option<String> {
    data.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn line(value: &Value) -> OrderLine {
    match value {
        Value::Object(fields) => {
            let mut dish = fields.clone();
            let quantity = dish.remove("quantity").unwrap_or(Value::Null);
            OrderLine { quantity, dish }
        }
        // Only reachable in fall-through mode
        other => OrderLine {
            quantity: Value::Null,
            dish: Map::from_iter([("value".to_string(), other.clone())]),
        },
    }
}

/// Copy the submitted fields onto an order with the given id
fn build(id: String, data: &Map<String, Value>) -> Order {
    Order {
        id,
        deliver_to: text(data, "deliverTo").unwrap_or_default(),
        mobile_number: text(data, "mobileNumber").unwrap_or_default(),
        status: text(data, "status"),
        dishes: data
            .get("dishes")
            .and_then(Value::as_array)
            .map(|lines| lines.iter().map(line).collect())
            .unwrap_or_default(),
    }
}

pub fn list(_: Request, _: HttpParams, ctx: &mut Context) -> Result<Response> {
    Response::ok(&ctx.db.list_orders()?)
}

pub fn read(_: Request, params: HttpParams, ctx: &mut Context) -> Result<Response> {
    let order = find(ctx, param(&params, params::ORDER_ID)?)?;
    Response::ok(&order)
}

pub fn create(request: Request, _: HttpParams, ctx: &mut Context) -> Result<Response> {
    let data = request.data()?;
    tracing::debug!(?data, "Create order");
    let reported = admit(create_chain().run(&Submission::new(&data), ctx.mode))?;

    let id = ctx.db.fresh_id()?;
    let order = ctx.db.insert_order(build(id, &data))?;
    tracing::info!(%order.id, status = ?order.status, "Order created");
    answer(&order, reported, Response::created::<Order>)
}

pub fn update(request: Request, params: HttpParams, ctx: &mut Context) -> Result<Response> {
    let order_id = param(&params, params::ORDER_ID)?;
    let existing = find(ctx, order_id)?;
    let data = request.data()?;
    tracing::debug!(%order_id, ?data, "Update order");
    let reported = admit(
        update_chain().run(&Submission::for_record(order_id, &data, &existing), ctx.mode),
    )?;

    // A differing body id only gets here in fall-through mode. It replaces the stored one unless
    // another record already uses it.
    let id = match text(&data, "id") {
        Some(id) if id != existing.id && ctx.db.contains_id(&id)? => {
            tracing::warn!(%order_id, body_id = %id, "Body id already in use, keeping the stored one");
            existing.id
        }
        Some(id) => id,
        None => existing.id,
    };
    let order = ctx.db.update_order(order_id, build(id, &data))?;
    tracing::info!(%order.id, status = ?order.status, "Order updated");
    answer(&order, reported, Response::ok::<Order>)
}

pub fn destroy(_: Request, params: HttpParams, ctx: &mut Context) -> Result<Response> {
    let order_id = param(&params, params::ORDER_ID)?;
    let existing = find(ctx, order_id)?;
    let body = Map::new();
    admit(destroy_chain().run(&Submission::for_record(order_id, &body, &existing), ctx.mode))?;

    ctx.db.remove_order(order_id)?;
    tracing::info!(%order_id, "Order deleted");
    Ok(Response::no_content())
}
