use serde_json::{Map, Value};

use crate::api::Dish;
use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::routes::{param, params, Context, HttpParams};
use crate::validation::dishes::{create_chain, update_chain};
use crate::validation::{Submission, ValidationMode, Verdict};

/// Dishes never go through fall-through validation, whatever the configured mode
const MODE: ValidationMode = ValidationMode::Strict;

fn find(ctx: &Context, dish_id: &str) -> Result<Dish> {
    ctx.db.find_dish(dish_id)?.ok_or_else(|| {
        Error::NotFound(format!("No matching id is found for '{}'", dish_id))
    })
}

fn passes(verdict: Verdict) -> Result<()> {
    match verdict {
        Verdict::Pass => Ok(()),
        Verdict::Reject(err) | Verdict::Proceed(err) => Err(err),
    }
}

fn text(data: &Map<String, Value>, field: &str) -> String {
    data.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Copy the validated fields of `data` onto a dish with the given id
fn build(id: String, data: &Map<String, Value>) -> Dish {
    Dish {
        id,
        name: text(data, "name"),
        description: text(data, "description"),
        price: data.get("price").and_then(Value::as_u64).unwrap_or_default(),
        image_url: text(data, "image_url"),
    }
}

pub fn list(_: Request, _: HttpParams, ctx: &mut Context) -> Result<Response> {
    Response::ok(&ctx.db.list_dishes()?)
}

pub fn read(_: Request, params: HttpParams, ctx: &mut Context) -> Result<Response> {
    let dish = find(ctx, param(&params, params::DISH_ID)?)?;
    Response::ok(&dish)
}

pub fn create(request: Request, _: HttpParams, ctx: &mut Context) -> Result<Response> {
    let data = request.data()?;
    tracing::debug!(?data, "Create dish");
    passes(create_chain().run(&Submission::new(&data), MODE))?;

    let id = ctx.db.fresh_id()?;
    let dish = ctx.db.insert_dish(build(id, &data))?;
    tracing::info!(%dish.id, name = %dish.name, "Dish created");
    Response::created(&dish)
}

pub fn update(request: Request, params: HttpParams, ctx: &mut Context) -> Result<Response> {
    let dish_id = param(&params, params::DISH_ID)?;
    let existing = find(ctx, dish_id)?;
    let data = request.data()?;
    tracing::debug!(%dish_id, ?data, "Update dish");
    passes(update_chain().run(&Submission::for_record(dish_id, &data, &existing), MODE))?;

    let dish = ctx.db.update_dish(build(existing.id, &data))?;
    tracing::info!(%dish.id, "Dish updated");
    Response::ok(&dish)
}
