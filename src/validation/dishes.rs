use crate::api::Dish;
use crate::errors::Error;
use crate::validation::{positive_integer, Chain, Check, Submission};

pub type DishSubmission<'a> = Submission<'a, Dish>;

type CheckResult = std::result::Result<(), Error>;

pub const PRICE_MESSAGE: &str = "Dish must have a price that is an integer greater than 0";

fn price(submission: &DishSubmission) -> CheckResult {
    positive_integer(submission.data.get("price"))
        .map(|_| ())
        .ok_or_else(|| Error::BadRequest(PRICE_MESSAGE.to_string()))
}

fn required(submission: &DishSubmission, field: &str) -> CheckResult {
    match submission.text(field) {
        Some(_) => Ok(()),
        None => Err(Error::BadRequest(format!("Dish must include a {}", field))),
    }
}

fn name(submission: &DishSubmission) -> CheckResult {
    required(submission, "name")
}

fn description(submission: &DishSubmission) -> CheckResult {
    required(submission, "description")
}

fn image_url(submission: &DishSubmission) -> CheckResult {
    required(submission, "image_url")
}

fn id_matches_route(submission: &DishSubmission) -> CheckResult {
    match (submission.mismatched_id(), submission.route_id) {
        (Some(body_id), Some(route_id)) => Err(Error::BadRequest(format!(
            "Dish id does not match route id. Dish: {}, Route: {}",
            body_id, route_id
        ))),
        _ => Ok(()),
    }
}

/// Checks for a new dish. Price always comes first.
pub fn create_chain<'a>() -> Chain<DishSubmission<'a>> {
    Chain::new(vec![
        Check::halting("price", price),
        Check::halting("name", name),
        Check::halting("description", description),
        Check::halting("image_url", image_url),
    ])
}

/// Checks for replacing an existing dish
pub fn update_chain<'a>() -> Chain<DishSubmission<'a>> {
    Chain::new(vec![Check::halting("id_matches_route", id_matches_route)]).then(create_chain())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::validation::{ValidationMode, Verdict};
    use serde_json::{json, Value};

    fn valid() -> Value {
        json!({
            "name": "Dolcelatte and chickpea spaghetti",
            "description": "Spaghetti topped with a blend of dolcelatte and fresh chickpeas",
            "price": 19,
            "image_url": "https://images.pexels.com/photos/1279330/pexels-photo-1279330.jpeg"
        })
    }

    fn create_error(data: Value) -> Option<String> {
        let data = data.as_object().unwrap().clone();
        match create_chain().run(&Submission::new(&data), ValidationMode::FallThrough) {
            Verdict::Pass => None,
            Verdict::Reject(err) | Verdict::Proceed(err) => Some(err.to_string()),
        }
    }

    fn with(field: &str, value: Value) -> Value {
        let mut data = valid();
        data[field] = value;
        data
    }

    fn without(field: &str) -> Value {
        let mut data = valid();
        data.as_object_mut().unwrap().remove(field);
        data
    }

    #[test]
    fn test_valid_dish_passes() {
        assert_eq!(create_error(valid()), None);
    }

    #[test]
    fn test_bad_prices() {
        for price in [json!(0), json!(-5), json!("10"), json!(2.5), Value::Null] {
            assert_eq!(create_error(with("price", price)).as_deref(), Some(PRICE_MESSAGE));
        }
        assert_eq!(create_error(without("price")).as_deref(), Some(PRICE_MESSAGE));
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            create_error(without("name")).as_deref(),
            Some("Dish must include a name")
        );
        assert_eq!(
            create_error(with("description", json!(""))).as_deref(),
            Some("Dish must include a description")
        );
        assert_eq!(
            create_error(without("image_url")).as_deref(),
            Some("Dish must include a image_url")
        );
    }

    #[test]
    fn test_price_is_checked_first() {
        let data = json!({ "price": 0 });
        assert_eq!(create_error(data).as_deref(), Some(PRICE_MESSAGE));
        let data = json!({ "price": 3, "image_url": "x" });
        assert_eq!(create_error(data).as_deref(), Some("Dish must include a name"));
    }

    #[test]
    fn test_update_rejects_other_id() {
        let existing = Dish {
            id: "3c637d011d844ebab1205fef8a7e36ea".into(),
            name: "Broccoli and beetroot stir fry".into(),
            description: "Crunchy stir fry".into(),
            price: 15,
            image_url: "https://example.com/stirfry.jpg".into(),
        };
        let data = with("id", json!("bogus"));
        let data = data.as_object().unwrap();
        let submission = Submission::for_record(&existing.id, data, &existing);

        match update_chain().run(&submission, ValidationMode::Strict) {
            Verdict::Reject(err) => assert_eq!(
                err.to_string(),
                "Dish id does not match route id. Dish: bogus, Route: 3c637d011d844ebab1205fef8a7e36ea"
            ),
            other => panic!("Unexpected verdict {:?}", other),
        }

        let data = with("id", json!(existing.id.clone()));
        let data = data.as_object().unwrap();
        let submission = Submission::for_record(&existing.id, data, &existing);
        assert!(matches!(
            update_chain().run(&submission, ValidationMode::Strict),
            Verdict::Pass
        ));
    }
}
