// src/app.rs

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

// CORS: orígenes exactos de la config + cualquier origen de la red local
fn cors_layer(app_state: &AppState) -> CorsLayer {
    let config = app_state.config.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin.to_str().map(|o| config.is_origin_allowed(o)).unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ACCEPT_LANGUAGE])
}

/// Router completo de la API, listo para `axum::serve` o para tests con `oneshot`.
pub fn build_router(app_state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users).post(handlers::users::create_user))
        .route(
            "/{legajo}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/{legajo}/contrasena", put(handlers::users::change_password))
        .route("/{legajo}/reset-contrasena", put(handlers::users::reset_password));

    let product_type_routes = Router::new()
        .route(
            "/",
            get(handlers::products::list_product_types).post(handlers::products::create_product_type),
        )
        .route(
            "/{tipoCodigo}",
            get(handlers::products::get_product_type)
                .put(handlers::products::update_product_type)
                .delete(handlers::products::delete_product_type),
        );

    let product_routes = Router::new()
        .route("/", get(handlers::products::list_products).post(handlers::products::create_product))
        .route(
            "/{prodCodigo}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        );

    let machine_routes = Router::new()
        .route("/", get(handlers::machines::list_machines).post(handlers::machines::create_machine))
        .route(
            "/{maqCodigo}",
            get(handlers::machines::get_machine)
                .put(handlers::machines::update_machine)
                .delete(handlers::machines::delete_machine),
        );

    let silo_routes = Router::new()
        .route("/", get(handlers::silos::list_silos).post(handlers::silos::create_silo))
        .route(
            "/{siloCodigo}",
            get(handlers::silos::get_silo)
                .put(handlers::silos::update_silo)
                .delete(handlers::silos::delete_silo),
        );

    let silo_blend_routes = Router::new()
        .route("/", get(handlers::silos::list_silo_blends).post(handlers::silos::create_silo_blend))
        .route(
            "/{relNumero}",
            get(handlers::silos::get_silo_blend)
                .put(handlers::silos::update_silo_blend)
                .delete(handlers::silos::delete_silo_blend),
        );

    let silo_blend_machine_routes = Router::new()
        .route(
            "/",
            get(handlers::silos::list_silo_blend_machines).post(handlers::silos::add_silo_blend_machine),
        )
        .route(
            "/{relNumero}/{item}",
            put(handlers::silos::update_silo_blend_machine).delete(handlers::silos::delete_silo_blend_machine),
        );

    // Las rutas fijas (serie, ultimas, abierta, cortes) tienen prioridad sobre /{entNumero}
    let entry_routes = Router::new()
        .route("/", get(handlers::entries::list_entries).post(handlers::entries::create_entry))
        .route(
            "/serie",
            get(handlers::entries::get_serial_status).post(handlers::entries::allocate_serial),
        )
        .route("/ultimas", get(handlers::entries::latest_entries))
        .route("/abierta", get(handlers::entries::get_open_entry))
        .route("/cortes", get(handlers::entries::list_cortes))
        .route("/corte/{nroCorte}", get(handlers::entries::check_corte))
        .route(
            "/{entNumero}",
            get(handlers::entries::get_entry)
                .put(handlers::entries::update_entry)
                .delete(handlers::entries::delete_entry),
        )
        .route("/{entNumero}/detalle", get(handlers::entries::get_entry_details))
        .route("/{entNumero}/detalle/{item}", delete(handlers::entries::delete_entry_detail));

    let exit_routes = Router::new()
        .route("/", get(handlers::exits::list_exits).post(handlers::exits::create_exit))
        .route("/{salNumero}", get(handlers::exits::get_exit));

    let dashboard_routes = Router::new()
        .route("/resumen", get(handlers::dashboard::get_summary))
        .route("/stock", get(handlers::dashboard::get_stock))
        .route("/movimientos", get(handlers::dashboard::get_movements));

    let cors = cors_layer(&app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/login", post(handlers::users::login))
        .nest("/api/usuario", user_routes)
        .nest("/api/tipoproducto", product_type_routes)
        .nest("/api/producto", product_routes)
        .nest("/api/maquina", machine_routes)
        .nest("/api/silo", silo_routes)
        .nest("/api/relsilo", silo_blend_routes)
        .nest("/api/relsiloblend2", silo_blend_machine_routes)
        .nest("/api/entrada", entry_routes)
        .nest("/api/salida", exit_routes)
        .nest("/api/dashboard", dashboard_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
