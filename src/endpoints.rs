use crate::errors::Result;
use crate::routes::*;

pub mod dishes;
pub mod orders;

/// Router with every endpoint of the API registered
pub fn create_http_router() -> Result<HttpRouter> {
    let mut router = HttpRouter::new()?;

    router.add_route("GET", endpoints::DISHES, dishes::list);
    router.add_route("POST", endpoints::DISHES, dishes::create);
    router.add_route("GET", endpoints::DISH_BY_ID, dishes::read);
    router.add_route("PUT", endpoints::DISH_BY_ID, dishes::update);

    router.add_route("GET", endpoints::ORDERS, orders::list);
    router.add_route("POST", endpoints::ORDERS, orders::create);
    router.add_route("GET", endpoints::ORDER_BY_ID, orders::read);
    router.add_route("PUT", endpoints::ORDER_BY_ID, orders::update);
    router.add_route("DELETE", endpoints::ORDER_BY_ID, orders::destroy);

    Ok(router)
}
