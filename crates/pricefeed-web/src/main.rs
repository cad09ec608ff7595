use actix_web::{middleware::Logger, web, App, HttpServer};
use deadpool_postgres::{Config, ManagerConfig, RecyclingMethod, Runtime};
use dotenv::{dotenv, var};
use tokio_postgres::NoTls;
use utoipa::OpenApi;

use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

mod api;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    if var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "actix_web=info,pricefeed_web=debug");
    }
    env_logger::init();

    // build pool from .env POSTGRES_URL
    let db_url = var("POSTGRES_URL").expect("POSTGRES_URL must be set");
    let bind_addr = var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let mut cfg = Config::new();
    cfg.url = Some(db_url);
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    let pool = cfg
        .create_pool(Some(Runtime::Tokio1), NoTls)
        .expect("Failed to create pool");

    // create API documentation
    use api::*;
    #[derive(OpenApi)]
    #[openapi(paths(prices::tickers, prices::prices, prices::daily, prices::stats))]
    struct ApiDoc;
    let openapi = ApiDoc::openapi();

    log::info!("Serving price feed on {bind_addr}");

    // run server
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(pool.clone()))
            // api endpoints
            .service(prices::tickers)
            .service(prices::daily)
            .service(prices::stats)
            .service(prices::prices)
            // api documentation
            .service(RapiDoc::with_openapi("/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
            .service(Redoc::with_url("/redoc", ApiDoc::openapi()))
            .service(Scalar::with_url("/scalar", ApiDoc::openapi()))
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/openapi.json", openapi.clone()))
    })
    .bind(bind_addr)?
    .run()
    .await
}
