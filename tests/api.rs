// tests/api.rs

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use plc_backend::{
    app::build_router,
    config::{AppConfig, AppState},
    db::pool,
};

async fn setup() -> Router {
    let db_pool = pool::connect_in_memory().await.unwrap();
    pool::run_migrations(&db_pool).await.unwrap();
    build_router(AppState::new(db_pool, AppConfig::for_tests()))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

// Tipo 1, pr001 ("Blend A", 24 h de cura), pr002 ("Aditivo"), mq001 y si001
async fn seed_catalog(app: &Router) {
    let (status, _) = call(app, Method::POST, "/api/tipoproducto", Some(json!({"TipoNombre": "Blend"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        app,
        Method::POST,
        "/api/producto",
        Some(json!({"TipoCodigo": 1, "ProdNombre": "Blend A", "HorasCura": 24})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ProdCodigo"], "pr001");
    assert_eq!(body["Stock"], 0.0);

    let (status, body) = call(
        app,
        Method::POST,
        "/api/producto",
        Some(json!({"TipoCodigo": 1, "ProdNombre": "Aditivo"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ProdCodigo"], "pr002");

    let (status, body) = call(app, Method::POST, "/api/maquina", Some(json!({"MaqNombre": "Picadora"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["MaqCodigo"], "mq001");

    let (status, body) = call(
        app,
        Method::POST,
        "/api/silo",
        Some(json!({"SiloNombre": "Silo 1", "DireccionIP": "192.168.0.10"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["SiloCodigo"], "si001");
}

async fn stock_of(app: &Router, prod_codigo: &str) -> f64 {
    let (status, body) = call(app, Method::GET, &format!("/api/producto/{prod_codigo}"), None).await;
    assert_eq!(status, StatusCode::OK);
    body["Stock"].as_f64().unwrap()
}

fn closed_entry(corte: &str, cantidad: f64) -> Value {
    json!({
        "Fecha": "2024-05-01",
        "NroCorte": corte,
        "ProdCodigo": "pr001",
        "Estado": "Cerrado",
        "productosSeleccionados": [{"ProdCodigo": "pr001", "Cantidad": cantidad}]
    })
}

#[tokio::test]
async fn health_answers_ok() {
    let app = setup().await;
    let (status, body) = call(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}

#[tokio::test]
async fn catalog_codes_are_sequential_and_ip_is_validated() {
    let app = setup().await;
    seed_catalog(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/silo",
        Some(json!({"SiloNombre": "Silo 2", "DireccionIP": "no-es-ip"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["direccion_ip"].is_array());

    let (status, _) = call(&app, Method::GET, "/api/maquina/mq999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_gets_json_error() {
    let app = setup().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tipoproducto")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("El cuerpo de la solicitud es inválido"));
}

#[tokio::test]
async fn product_list_sorts_with_fallback() {
    let app = setup().await;
    seed_catalog(&app).await;

    let (_, body) = call(&app, Method::GET, "/api/producto?sortBy=ProdNombre&order=DESC", None).await;
    let names: Vec<&str> = body.as_array().unwrap().iter().map(|p| p["ProdNombre"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Blend A", "Aditivo"]);

    // Un campo desconocido cae en ProdCodigo; el sentido pedido se respeta
    let (_, body) = call(&app, Method::GET, "/api/producto?sortBy=Stock;DROP&order=DESC", None).await;
    let codes: Vec<&str> = body.as_array().unwrap().iter().map(|p| p["ProdCodigo"].as_str().unwrap()).collect();
    assert_eq!(codes, vec!["pr002", "pr001"]);
}

#[tokio::test]
async fn entry_creation_assigns_serials_and_adds_stock() {
    let app = setup().await;
    seed_catalog(&app).await;

    let (status, body) = call(&app, Method::POST, "/api/entrada", Some(closed_entry("C-100", 50.0))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["EntNumero"], 1);
    assert_eq!(body["Estado"], "Cerrado");
    assert_eq!(body["detalle"][0]["Serie"], 1);
    assert_eq!(stock_of(&app, "pr001").await, 50.0);

    let (_, body) = call(&app, Method::GET, "/api/entrada/serie", None).await;
    assert_eq!(body["ultimaSerie"], 1);
    assert_eq!(body["siguienteSerie"], 2);

    let (_, body) = call(&app, Method::GET, "/api/entrada/corte/C-100", None).await;
    assert_eq!(body["existe"], true);

    let (_, body) = call(&app, Method::GET, "/api/entrada/cortes", None).await;
    assert_eq!(body, json!(["C-100"]));
}

#[tokio::test]
async fn duplicate_corte_is_rejected_without_touching_stock() {
    let app = setup().await;
    seed_catalog(&app).await;

    let (status, _) = call(&app, Method::POST, "/api/entrada", Some(closed_entry("C-100", 50.0))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(&app, Method::POST, "/api/entrada", Some(closed_entry("C-100", 10.0))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "El NroCorte 'C-100' ya existe.");
    assert_eq!(stock_of(&app, "pr001").await, 50.0);
}

#[tokio::test]
async fn closed_entry_needs_details() {
    let app = setup().await;
    seed_catalog(&app).await;

    let payload = json!({
        "Fecha": "2024-05-01",
        "NroCorte": "C-200",
        "ProdCodigo": "pr001",
        "Estado": "Cerrado",
        "productosSeleccionados": []
    });
    let (status, _) = call(&app, Method::POST, "/api/entrada", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, Method::GET, "/api/entrada", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn only_one_entry_can_be_open() {
    let app = setup().await;
    seed_catalog(&app).await;

    let open = |corte: &str| {
        json!({
            "Fecha": "2024-05-01",
            "NroCorte": corte,
            "ProdCodigo": "pr001",
            "Estado": "Abierto",
            "productosSeleccionados": [{"ProdCodigo": "pr001", "Cantidad": 5}]
        })
    };

    let (status, _) = call(&app, Method::POST, "/api/entrada", Some(open("C-1"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(&app, Method::POST, "/api/entrada", Some(open("C-2"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = call(&app, Method::GET, "/api/entrada/abierta", None).await;
    assert_eq!(body["abierta"], true);
    assert_eq!(body["entrada"]["NroCorte"], "C-1");

    // Al cerrarla se libera el lugar
    let (status, _) = call(&app, Method::PUT, "/api/entrada/1", Some(json!({"Estado": "Cerrado"}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::POST, "/api/entrada", Some(open("C-2"))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn deleting_an_entry_reverts_its_stock() {
    let app = setup().await;
    seed_catalog(&app).await;

    call(&app, Method::POST, "/api/entrada", Some(closed_entry("C-100", 50.0))).await;
    let (status, _) = call(&app, Method::DELETE, "/api/entrada/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(stock_of(&app, "pr001").await, 0.0);

    let (status, _) = call(&app, Method::GET, "/api/entrada/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn silo_blend_keeps_its_machines() {
    let app = setup().await;
    seed_catalog(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/relsilo",
        Some(json!({"ProdCodigo": "pr001", "SiloCodigo": "si001", "NroCorte": "C-100", "maquinas": ["mq001"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["RelNumero"], 1);
    assert_eq!(body["maquinas"][0]["MaqCodigo"], "mq001");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/relsiloblend2",
        Some(json!({"RelNumero": 1, "MaqCodigo": "mq001"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["Item"], 2);

    let (_, body) = call(&app, Method::GET, "/api/relsiloblend2?relNumero=1", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = call(&app, Method::PUT, "/api/relsiloblend2/1/2", Some(json!({"Estado": "Inactivo"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Estado"], "Inactivo");

    let (status, _) = call(&app, Method::DELETE, "/api/relsiloblend2/1/2", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/relsilo",
        Some(json!({"ProdCodigo": "pr001", "SiloCodigo": "si999"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn exits_check_stock_and_decrement_it() {
    let app = setup().await;
    seed_catalog(&app).await;
    call(&app, Method::POST, "/api/entrada", Some(closed_entry("C-100", 50.0))).await;
    call(
        &app,
        Method::POST,
        "/api/relsilo",
        Some(json!({"ProdCodigo": "pr001", "SiloCodigo": "si001"})),
    )
    .await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/salida",
        Some(json!({"items": [{"RelNumero": 1, "ProdCodigo": "pr001", "Cantidad": 80}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Stock insuficiente"));
    assert_eq!(stock_of(&app, "pr001").await, 50.0);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/salida",
        Some(json!({
            "UsuarioCreacion": "operador",
            "items": [
                {"RelNumero": 1, "ProdCodigo": "pr001", "Cantidad": 15},
                {"RelNumero": 1, "ProdCodigo": "pr001", "Cantidad": "5"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["SalNumero"], 1);
    assert_eq!(body["CantidadTotal"], 20.0);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(stock_of(&app, "pr001").await, 30.0);

    let (_, body) = call(&app, Method::GET, "/api/salida", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn printed_ticket_serial_is_stored() {
    let app = setup().await;
    seed_catalog(&app).await;

    let (status, body) = call(&app, Method::POST, "/api/entrada/serie", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let reserved = body["serie"].as_i64().unwrap();

    let payload = json!({
        "Fecha": "2024-05-01",
        "NroCorte": "C-300",
        "ProdCodigo": "pr001",
        "Estado": "Cerrado",
        "productosSeleccionados": [{"ProdCodigo": "pr001", "Serie": reserved.to_string(), "Cantidad": 12}]
    });
    let (status, body) = call(&app, Method::POST, "/api/entrada", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["detalle"][0]["Serie"], reserved);

    let (_, body) = call(&app, Method::GET, "/api/entrada/serie", None).await;
    assert_eq!(body["ultimaSerie"], reserved);
}

#[tokio::test]
async fn fractional_exits_use_up_the_stock_exactly() {
    let app = setup().await;
    seed_catalog(&app).await;
    call(&app, Method::POST, "/api/entrada", Some(closed_entry("C-100", 0.3))).await;
    call(
        &app,
        Method::POST,
        "/api/relsilo",
        Some(json!({"ProdCodigo": "pr001", "SiloCodigo": "si001"})),
    )
    .await;

    for cantidad in [0.1, 0.2] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/salida",
            Some(json!({"items": [{"RelNumero": 1, "ProdCodigo": "pr001", "Cantidad": cantidad}]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(stock_of(&app, "pr001").await, 0.0);
}

#[tokio::test]
async fn voided_entry_leaves_stock() {
    let app = setup().await;
    seed_catalog(&app).await;
    call(&app, Method::POST, "/api/entrada", Some(closed_entry("C-100", 50.0))).await;

    let (status, body) = call(&app, Method::PUT, "/api/entrada/1", Some(json!({"Estado": "Anulado"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Estado"], "Anulado");
    assert_eq!(stock_of(&app, "pr001").await, 0.0);
}

#[tokio::test]
async fn login_by_legajo() {
    let app = setup().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/usuario",
        Some(json!({"Legajo": 10, "Nombre": "Ana", "Contrasena": "secreta", "Rol": "operador"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.get("Contrasena").is_none());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({"Legajo": 10, "Contrasena": "secreta"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usuario"]["Legajo"], 10);
    assert_eq!(body["capacidades"]["manageUsers"], false);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({"Legajo": 10, "Contrasena": "otra"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn dashboard_reflects_todays_movements() {
    let app = setup().await;
    seed_catalog(&app).await;
    call(&app, Method::POST, "/api/entrada", Some(closed_entry("C-100", 50.0))).await;

    let (status, body) = call(&app, Method::GET, "/api/dashboard/resumen", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalProductos"], 2);
    assert_eq!(body["entradasHoy"], 1);
    assert_eq!(body["cantidadIngresadaHoy"], 50.0);

    let (_, body) = call(&app, Method::GET, "/api/dashboard/stock?limit=1", None).await;
    assert_eq!(body[0]["ProdCodigo"], "pr001");

    let (_, body) = call(&app, Method::GET, "/api/dashboard/movimientos?dias=3", None).await;
    let days = body.as_array().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[2]["entradas"], 50.0);
}
