use std::sync::{Arc, Mutex};

use clap::Parser;
use grubdash::cli::ServerArgs;
use grubdash::endpoints::create_http_router;
use grubdash::errors::Result;
use grubdash::http::{HttpServer, Request};
use grubdash::logging::setup_tracing;
use grubdash::routes::Context;

fn run(args: ServerArgs) -> Result<()> {
    let db = Arc::new(Mutex::new(args.open_database()?));
    let router = Arc::new(create_http_router()?);
    let mode = args.validation;
    tracing::info!(backend = ?args.backend, validation = ?mode, "Store ready");

    let server = HttpServer::new(&args.address)?;
    server.serve(args.worker_count(), move |request: Request| {
        // One request at a time touches the store
        let mut db = match db.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut ctx = Context::new(&mut **db, mode);
        router.respond(request, &mut ctx)
    })
}

fn main() {
    setup_tracing();
    let args = ServerArgs::parse();
    if let Err(err) = run(args) {
        tracing::error!(%err, "Server stopped");
        std::process::exit(1);
    }
}
