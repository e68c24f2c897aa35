use clap::Parser;
use grubdash::cli::{ClientArgs, DishAction, OrderAction, Resource};
use grubdash::errors::Result;
use grubdash::http::{code_to_string, HttpClient, Response};
use grubdash::logging::setup_tracing;
use grubdash::routes::{dish_by_id, order_by_id, paths};
use serde_json::{json, Value};

fn print_response(response: &Response) {
    match response.status {
        Some(code) => println!("Response Status: {} - {}", code, code_to_string(code)),
        None => println!("No status in response"),
    }
    if response.body.is_empty() {
        return;
    }
    match serde_json::from_str::<Value>(&response.body) {
        Ok(json) => println!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| response.body.clone())
        ),
        Err(err) => println!("Error parsing response body: {}\n{:?}", err, response.body),
    }
}

/// Method, path and body of the request matching the command
fn request_for(resource: Resource) -> (&'static str, String, String) {
    let envelope = |data: Value| json!({ "data": data }).to_string();
    match resource {
        Resource::Dishes { action } => match action {
            DishAction::List => ("GET", paths::DISHES.to_string(), String::new()),
            DishAction::Get { id } => ("GET", dish_by_id(&id), String::new()),
            DishAction::Create { data } => ("POST", paths::DISHES.to_string(), envelope(data)),
            DishAction::Update { id, data } => ("PUT", dish_by_id(&id), envelope(data)),
        },
        Resource::Orders { action } => match action {
            OrderAction::List => ("GET", paths::ORDERS.to_string(), String::new()),
            OrderAction::Get { id } => ("GET", order_by_id(&id), String::new()),
            OrderAction::Create { data } => ("POST", paths::ORDERS.to_string(), envelope(data)),
            OrderAction::Update { id, data } => ("PUT", order_by_id(&id), envelope(data)),
            OrderAction::Delete { id } => ("DELETE", order_by_id(&id), String::new()),
        },
    }
}

fn run(args: ClientArgs) -> Result<()> {
    let (method, path, body) = request_for(args.resource);
    let mut client = HttpClient::new(&args.target)?;
    let response = client.send(method, &path, &body)?;
    print_response(&response);
    Ok(())
}

fn main() {
    setup_tracing();
    let args = ClientArgs::parse();
    if let Err(err) = run(args) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
