use std::collections::HashMap;

use crate::database::Database;
use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::validation::ValidationMode;
use matchit::Router;

/// Declares each route twice: `paths::X` is the matchit pattern, `endpoints::X` the name the
/// router stores for it and handlers are registered under
macro_rules! make_paths {
    ($($name:ident: $path:expr,)*) => {
        pub mod paths {
            $(
                pub const $name: &str = $path;
            )*
        }
        pub mod endpoints {
            $(
                pub const $name: &str = stringify!($name);
            )*
        }
    }
}

make_paths! {
    DISHES: "/dishes",
    DISH_BY_ID: "/dishes/{dish_id}",
    ORDERS: "/orders",
    ORDER_BY_ID: "/orders/{order_id}",
}

/// Insert the named routes into a matchit router
macro_rules! add_path {
    ($router:ident $(, $path:ident)*) => {
        $(
            $router.insert(paths::$path, endpoints::$path)?;
        )*
    }
}

/// Placeholders of the `{...}` segments, as handlers look them up in [`HttpParams`]
pub mod params {
    /// Key of dish ids in HTTP paths
    pub const DISH_ID: &str = "dish_id";

    /// Key of order ids in HTTP paths
    pub const ORDER_ID: &str = "order_id";
}

/// Return the HTTP path for a dish based on its id
pub fn dish_by_id(dish_id: &str) -> String {
    paths::DISH_BY_ID.replace("{dish_id}", dish_id)
}

/// Return the HTTP path for an order based on its id
pub fn order_by_id(order_id: &str) -> String {
    paths::ORDER_BY_ID.replace("{order_id}", order_id)
}

/// Matchit router knowing every path of the API. Fails only on conflicting patterns.
fn new_router() -> Result<Router<&'static str>> {
    let mut router = Router::new();
    add_path!(router, DISHES, DISH_BY_ID, ORDERS, ORDER_BY_ID);
    Ok(router)
}

/// What handlers get besides the request: the store, and how strict validation is
pub struct Context<'a> {
    pub db: &'a mut dyn Database,
    pub mode: ValidationMode,
}

impl<'a> Context<'a> {
    pub fn new(db: &'a mut dyn Database, mode: ValidationMode) -> Self {
        Context { db, mode }
    }
}

/// Path parameters captured by the router, by placeholder name
pub type HttpParams = HashMap<String, String>;
/// Endpoint handler: the request, its path parameters, and the store
pub type HttpHandler = fn(Request, HttpParams, &mut Context) -> Result<Response>;

/// Dispatches requests on path first, then on method
pub struct HttpRouter {
    routes: Router<&'static str>,
    handlers: HashMap<&'static str, HashMap<&'static str, HttpHandler>>,
}

impl HttpRouter {
    /// Router with every path known but no handler yet: known paths answer 405 until
    /// [`HttpRouter::add_route`] is called for them
    pub fn new() -> Result<Self> {
        let routes = new_router()?;
        Ok(HttpRouter {
            routes,
            handlers: HashMap::new(),
        })
    }

    /// Register `handler` for `method` on the route named `route` (one of [`endpoints`])
    pub fn add_route(&mut self, method: &'static str, route: &'static str, handler: HttpHandler) {
        self.handlers.entry(route).or_default().insert(method, handler);
    }

    /// Run the handler registered for the request
    ///
    /// Unknown paths yield NotFound, known paths without a handler for the method yield
    /// MethodNotAllowed. Otherwise the result is whatever the handler returns.
    ///
    /// Checking that all parameters are presents and that the body is correct is the
    /// responsibility of the handler
    pub fn route(&self, request: Request, ctx: &mut Context) -> Result<Response> {
        let path = request.route_path().to_string();
        let route = self
            .routes
            .at(&path)
            .map_err(|_| Error::NotFound(format!("Path not found: {}", path)))?;

        let handler = self
            .handlers
            .get(route.value)
            .and_then(|method_to_handler| method_to_handler.get(request.method.as_str()))
            .ok_or_else(|| {
                Error::MethodNotAllowed(format!("{} not allowed for {}", request.method, path))
            })?;

        let params: HttpParams = route
            .params
            .iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        handler(request, params, ctx)
    }

    /// Same as `route`, with errors turned into their HTTP response
    pub fn respond(&self, request: Request, ctx: &mut Context) -> Response {
        self.route(request, ctx)
            .unwrap_or_else(|err| Response::from_error(&err))
    }
}

/// Fetch a path parameter, which the router guarantees for the endpoints that declare it
pub fn param<'a>(params: &'a HttpParams, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::BadRequest(format!("Missing {}", name)))
}
