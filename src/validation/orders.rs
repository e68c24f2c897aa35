use serde_json::Value;

use crate::api::{Order, OrderStatus};
use crate::errors::Error;
use crate::validation::{positive_integer, truthy, Chain, Check, Submission};

pub type OrderSubmission<'a> = Submission<'a, Order>;

type CheckResult = std::result::Result<(), Error>;

pub const DELIVERED_MESSAGE: &str = "A delivered order cannot be changed";
pub const NOT_PENDING_MESSAGE: &str = "An order cannot be deleted unless it is pending.";

fn deliver_to(submission: &OrderSubmission) -> CheckResult {
    submission
        .text("deliverTo")
        .map(|_| ())
        .ok_or_else(|| Error::BadRequest("Order must include a deliverTo".to_string()))
}

fn mobile_number(submission: &OrderSubmission) -> CheckResult {
    submission
        .text("mobileNumber")
        .map(|_| ())
        .ok_or_else(|| Error::BadRequest("Order must include a mobileNumber".to_string()))
}

fn dishes(submission: &OrderSubmission) -> CheckResult {
    match submission.data.get("dishes") {
        None | Some(Value::Null) => Err(Error::BadRequest("Order must include a dish".to_string())),
        Some(Value::Array(lines)) if !lines.is_empty() => Ok(()),
        Some(_) => Err(Error::BadRequest(
            "Order must include at least one dish".to_string(),
        )),
    }
}

/// Only the first offending line is reported
fn quantities(submission: &OrderSubmission) -> CheckResult {
    let Some(Value::Array(lines)) = submission.data.get("dishes") else {
        return Ok(());
    };
    match lines
        .iter()
        .position(|line| positive_integer(line.get("quantity")).is_none())
    {
        Some(index) => Err(Error::BadRequest(format!(
            "Dish {} must have a quantity that is an integer greater than 0",
            index
        ))),
        None => Ok(()),
    }
}

fn id_matches_route(submission: &OrderSubmission) -> CheckResult {
    match (submission.mismatched_id(), submission.route_id) {
        (Some(body_id), Some(route_id)) => Err(Error::BadRequest(format!(
            "Order id does not match route id. Order: {}, Route: {}.",
            body_id, route_id
        ))),
        _ => Ok(()),
    }
}

fn not_delivered(submission: &OrderSubmission) -> CheckResult {
    match submission.existing {
        Some(order) if order.is_delivered() => {
            Err(Error::BadRequest(DELIVERED_MESSAGE.to_string()))
        }
        _ => Ok(()),
    }
}

fn status(submission: &OrderSubmission) -> CheckResult {
    let Some(status) = submission.data.get("status").filter(|status| truthy(status)) else {
        let valid: Vec<_> = OrderStatus::ALL.iter().map(OrderStatus::as_str).collect();
        return Err(Error::BadRequest(format!(
            "Order must have a status of {}",
            valid.join(", ")
        )));
    };
    match status.as_str().map(str::parse::<OrderStatus>) {
        Some(Ok(OrderStatus::Delivered)) => Err(Error::BadRequest(DELIVERED_MESSAGE.to_string())),
        Some(Ok(_)) => Ok(()),
        _ => Err(Error::BadRequest("Invalid status".to_string())),
    }
}

fn pending(submission: &OrderSubmission) -> CheckResult {
    match submission.existing {
        Some(order) if !order.is_pending() => {
            Err(Error::BadRequest(NOT_PENDING_MESSAGE.to_string()))
        }
        _ => Ok(()),
    }
}

/// Checks shared by creation and update. Only the dishes check halts on its own.
pub fn create_chain<'a>() -> Chain<OrderSubmission<'a>> {
    Chain::new(vec![
        Check::reported("deliverTo", deliver_to),
        Check::reported("mobileNumber", mobile_number),
        Check::halting("dishes", dishes),
        Check::reported("quantities", quantities),
    ])
}

pub fn update_chain<'a>() -> Chain<OrderSubmission<'a>> {
    Chain::new(vec![
        Check::reported("id_matches_route", id_matches_route),
        Check::halting("not_delivered", not_delivered),
        Check::halting("status", status),
    ])
    .then(create_chain())
}

/// Checks before removing an order. The request body plays no part.
pub fn destroy_chain<'a>() -> Chain<OrderSubmission<'a>> {
    Chain::new(vec![Check::halting("pending", pending)])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::validation::{ValidationMode, Verdict};
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "deliverTo": "123 Main",
            "mobileNumber": "555-0100",
            "status": "pending",
            "dishes": [{ "dishId": "abc", "quantity": 2 }]
        })
    }

    fn stored(status: &str) -> Order {
        let mut data = valid();
        data["id"] = json!("f6069a542257054114138301947672ba");
        let mut order: Order = serde_json::from_value(data).unwrap();
        order.status = Some(status.to_string());
        order
    }

    fn run_create(data: Value, mode: ValidationMode) -> Verdict {
        let data = data.as_object().unwrap().clone();
        create_chain().run(&Submission::new(&data), mode)
    }

    fn run_update(existing: &Order, data: Value, mode: ValidationMode) -> Verdict {
        let data = data.as_object().unwrap().clone();
        update_chain().run(&Submission::for_record(&existing.id, &data, existing), mode)
    }

    fn rejection(verdict: Verdict) -> String {
        match verdict {
            Verdict::Reject(err) => err.to_string(),
            other => panic!("Expected a rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_order_passes() {
        assert!(matches!(run_create(valid(), ValidationMode::Strict), Verdict::Pass));
        assert!(matches!(
            run_update(&stored("pending"), valid(), ValidationMode::Strict),
            Verdict::Pass
        ));
    }

    #[test]
    fn test_dishes_presence() {
        let mut data = valid();
        data["dishes"] = json!([]);
        assert_eq!(
            rejection(run_create(data.clone(), ValidationMode::Strict)),
            "Order must include at least one dish"
        );
        data["dishes"] = json!("a dish");
        assert_eq!(
            rejection(run_create(data.clone(), ValidationMode::Strict)),
            "Order must include at least one dish"
        );
        data.as_object_mut().unwrap().remove("dishes");
        assert_eq!(
            rejection(run_create(data, ValidationMode::FallThrough)),
            "Order must include a dish"
        );
    }

    #[test]
    fn test_first_bad_quantity_is_reported() {
        let mut data = valid();
        data["dishes"] = json!([
            { "dishId": "a", "quantity": 1 },
            { "dishId": "b", "quantity": 0 },
            { "dishId": "c", "quantity": "2" },
            { "dishId": "d" }
        ]);
        assert_eq!(
            rejection(run_create(data, ValidationMode::Strict)),
            "Dish 1 must have a quantity that is an integer greater than 0"
        );
    }

    #[test]
    fn test_status_rules() {
        let existing = stored("pending");
        let mut data = valid();

        data["status"] = json!("delivered");
        assert_eq!(
            rejection(run_update(&existing, data.clone(), ValidationMode::Strict)),
            DELIVERED_MESSAGE
        );

        data["status"] = json!("shipped");
        assert_eq!(
            rejection(run_update(&existing, data.clone(), ValidationMode::Strict)),
            "Invalid status"
        );

        data["status"] = json!(3);
        assert_eq!(
            rejection(run_update(&existing, data.clone(), ValidationMode::Strict)),
            "Invalid status"
        );

        data["status"] = json!([]);
        assert_eq!(
            rejection(run_update(&existing, data.clone(), ValidationMode::Strict)),
            "Invalid status"
        );

        for unset in [json!(0), json!(false), json!(""), json!(null)] {
            data["status"] = unset;
            assert_eq!(
                rejection(run_update(&existing, data.clone(), ValidationMode::Strict)),
                "Order must have a status of pending, preparing, out-for-delivery, delivered"
            );
        }
        data.as_object_mut().unwrap().remove("status");
        assert_eq!(
            rejection(run_update(&existing, data, ValidationMode::Strict)),
            "Order must have a status of pending, preparing, out-for-delivery, delivered"
        );

        for status in ["pending", "preparing", "out-for-delivery"] {
            let mut data = valid();
            data["status"] = json!(status);
            assert!(matches!(
                run_update(&existing, data, ValidationMode::Strict),
                Verdict::Pass
            ));
        }
    }

    #[test]
    fn test_delivered_order_is_frozen() {
        let existing = stored("delivered");
        assert_eq!(
            rejection(run_update(&existing, valid(), ValidationMode::Strict)),
            DELIVERED_MESSAGE
        );
    }

    #[test]
    fn test_status_is_free_on_create() {
        let mut data = valid();
        data["status"] = json!("whatever");
        assert!(matches!(run_create(data, ValidationMode::Strict), Verdict::Pass));
    }

    #[test]
    fn test_fall_through_lets_reported_failures_proceed() {
        let mut data = valid();
        data.as_object_mut().unwrap().remove("deliverTo");
        data["mobileNumber"] = json!("");
        match run_create(data, ValidationMode::FallThrough) {
            Verdict::Proceed(err) => assert_eq!(err.to_string(), "Order must include a deliverTo"),
            other => panic!("Expected the write to proceed, got {:?}", other),
        }

        let existing = stored("pending");
        let mut data = valid();
        data["id"] = json!("someone-else");
        match run_update(&existing, data.clone(), ValidationMode::FallThrough) {
            Verdict::Proceed(err) => assert_eq!(
                err.to_string(),
                "Order id does not match route id. Order: someone-else, Route: f6069a542257054114138301947672ba."
            ),
            other => panic!("Expected the write to proceed, got {:?}", other),
        }
        assert!(matches!(
            run_update(&existing, data, ValidationMode::Strict),
            Verdict::Reject(_)
        ));
    }

    #[test]
    fn test_only_pending_orders_can_be_destroyed() {
        let data = serde_json::Map::new();
        for status in ["preparing", "out-for-delivery", "delivered", "unknown"] {
            let existing = stored(status);
            let submission = Submission::for_record(&existing.id, &data, &existing);
            assert_eq!(
                rejection(destroy_chain().run(&submission, ValidationMode::FallThrough)),
                NOT_PENDING_MESSAGE
            );
        }
        let existing = stored("pending");
        let submission = Submission::for_record(&existing.id, &data, &existing);
        assert!(matches!(
            destroy_chain().run(&submission, ValidationMode::Strict),
            Verdict::Pass
        ));
    }
}
