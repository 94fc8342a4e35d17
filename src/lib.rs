use std::sync::Arc;

use client::Providers;
use poem::{
    middleware::{
        AddData, AddDataEndpoint, Cors, CorsEndpoint, NormalizePath, NormalizePathEndpoint,
        TrailingSlash,
    },
    EndpointExt, Route,
};
use poem_openapi::OpenApiService;
use r2d2::Pool as r2d2Pool;
use redis::Client;
use route::{
    admin::ApiAdmin, auth::ApiAuth, chat::ApiChat, password_reset::ApiPasswordReset,
    profile::ApiProfile, vision::ApiVision,
};
use settings::Config;
use sqlx::{Pool, Postgres};

pub mod cli;
pub mod client;
pub mod core;
pub mod factory;
pub mod model;
pub mod repository;
pub mod route;
pub mod schema;
pub mod service;
pub mod settings;

pub struct AppState {
    pub db: Pool<Postgres>,
    pub redis_conn: r2d2Pool<Client>,
    pub config: Config,
    pub providers: Providers,
}

pub fn init_openapi_route(
    app_state: Arc<AppState>,
    config: &Config,
) -> NormalizePathEndpoint<CorsEndpoint<AddDataEndpoint<Route, Arc<AppState>>>> {
    let prefix = config.prefix();
    let openapi_route = OpenApiService::new(
        (
            ApiChat,
            ApiVision,
            ApiProfile,
            ApiAuth,
            ApiPasswordReset,
            ApiAdmin,
        ),
        "PSI Vision",
        env!("CARGO_PKG_VERSION"),
    )
    .server(prefix.clone());
    let openapi_json_endpoint = openapi_route.spec_endpoint();
    let ui = openapi_route.swagger_ui();
    Route::new()
        .nest(prefix, openapi_route)
        .nest("/docs", ui)
        .at("openapi.json", openapi_json_endpoint)
        .with(AddData::new(app_state))
        .with(Cors::new())
        // public paths end with a slash, operations are registered without it
        .with(NormalizePath::new(TrailingSlash::Trim))
}
