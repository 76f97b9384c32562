//! actix-web runtime for local development. Each request is converted into
//! a Spin request, routed like the component would route it, and the Spin
//! response is converted back.

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::core::db::seed_demo_data;
use crate::core::store::MemoryStore;
use crate::external::{CloudinaryHost, FirebaseIdentity, IdentityProvider, MediaHost};
use crate::router::{route, AppContext};

pub mod adapter {
    use actix_web::http::StatusCode;
    use actix_web::HttpRequest;
    use spin_sdk::http::{Method, Request, Response};

    /// Response headers carried over from the Spin response.
    const FORWARDED_HEADERS: [&str; 4] = [
        "content-type",
        "access-control-allow-origin",
        "access-control-allow-methods",
        "access-control-allow-headers",
    ];

    pub fn actix_to_spin_request(req: &HttpRequest, body: actix_web::web::Bytes) -> anyhow::Result<Request> {
        let method = match req.method().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            other => anyhow::bail!("unsupported method {}", other),
        };

        let uri = req.uri().to_string();

        let mut builder = Request::builder();
        builder.method(method).uri(&uri);
        for (name, value) in req.headers() {
            if let Ok(value) = value.to_str() {
                builder.header(name.as_str(), value);
            }
        }

        Ok(builder.body(body.to_vec()).build())
    }

    pub fn spin_to_actix_response(spin_resp: Response) -> actix_web::HttpResponse {
        let status = StatusCode::from_u16(*spin_resp.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = actix_web::HttpResponse::build(status);

        for name in FORWARDED_HEADERS {
            if let Some(value) = spin_resp.header(name).and_then(|v| v.as_str()) {
                response.insert_header((name, value.to_string()));
            }
        }

        response.body(spin_resp.body().to_vec())
    }
}

/// Fallback service: every request goes through the shared router.
pub async fn dispatch<I, M>(
    req: HttpRequest,
    body: web::Bytes,
    ctx: web::Data<AppContext<MemoryStore, I, M>>,
) -> HttpResponse
where
    I: IdentityProvider + 'static,
    M: MediaHost + 'static,
{
    let spin_req = match adapter::actix_to_spin_request(&req, body) {
        Ok(r) => r,
        Err(e) => {
            warn!("Rejected {} {}: {}", req.method(), req.path(), e);
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": "Invalid request" }));
        }
    };

    adapter::spin_to_actix_response(route(ctx.get_ref(), spin_req).await)
}

/// Seeds a fresh in-memory store and serves it on `config.port`.
pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let store = MemoryStore::new();
    match seed_demo_data(&store) {
        Ok(()) => info!("Demo data seeded"),
        Err(e) => warn!("Demo data not seeded: {}", e),
    }

    let port = config.port;
    let ctx = web::Data::new(AppContext::from_config(store, config));

    info!("Server listening on http://0.0.0.0:{}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(ctx.clone())
            .default_service(web::route().to(dispatch::<FirebaseIdentity, CloudinaryHost>))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
