// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Usuarios ---
        handlers::users::login,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::change_password,
        handlers::users::reset_password,
        handlers::users::delete_user,

        // --- Productos ---
        handlers::products::list_product_types,
        handlers::products::get_product_type,
        handlers::products::create_product_type,
        handlers::products::update_product_type,
        handlers::products::delete_product_type,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,

        // --- Máquinas ---
        handlers::machines::list_machines,
        handlers::machines::get_machine,
        handlers::machines::create_machine,
        handlers::machines::update_machine,
        handlers::machines::delete_machine,

        // --- Silos ---
        handlers::silos::list_silos,
        handlers::silos::get_silo,
        handlers::silos::create_silo,
        handlers::silos::update_silo,
        handlers::silos::delete_silo,
        handlers::silos::list_silo_blends,
        handlers::silos::get_silo_blend,
        handlers::silos::create_silo_blend,
        handlers::silos::update_silo_blend,
        handlers::silos::delete_silo_blend,
        handlers::silos::list_silo_blend_machines,
        handlers::silos::add_silo_blend_machine,
        handlers::silos::update_silo_blend_machine,
        handlers::silos::delete_silo_blend_machine,

        // --- Entradas ---
        handlers::entries::list_entries,
        handlers::entries::create_entry,
        handlers::entries::get_serial_status,
        handlers::entries::allocate_serial,
        handlers::entries::latest_entries,
        handlers::entries::get_open_entry,
        handlers::entries::list_cortes,
        handlers::entries::check_corte,
        handlers::entries::get_entry,
        handlers::entries::update_entry,
        handlers::entries::delete_entry,
        handlers::entries::get_entry_details,
        handlers::entries::delete_entry_detail,

        // --- Salidas ---
        handlers::exits::list_exits,
        handlers::exits::get_exit,
        handlers::exits::create_exit,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_stock,
        handlers::dashboard::get_movements,
    ),
    components(
        schemas(
            models::RecordState,

            // --- Usuarios ---
            models::users::Role,
            models::users::User,
            models::users::Capabilities,
            models::users::CreateUserPayload,
            models::users::UpdateUserPayload,
            models::users::ChangePasswordPayload,
            models::users::ResetPasswordPayload,
            models::users::LoginPayload,
            models::users::LoginResponse,

            // --- Productos ---
            models::products::ProductType,
            models::products::Product,
            models::products::ProductTypePayload,
            models::products::CreateProductPayload,
            models::products::UpdateProductPayload,

            // --- Máquinas ---
            models::machines::Machine,
            models::machines::CreateMachinePayload,
            models::machines::UpdateMachinePayload,

            // --- Silos ---
            models::silos::Silo,
            models::silos::CreateSiloPayload,
            models::silos::UpdateSiloPayload,
            models::silos::SiloBlend,
            models::silos::SiloBlendMachine,
            models::silos::SiloBlendWithMachines,
            models::silos::CreateSiloBlendPayload,
            models::silos::UpdateSiloBlendPayload,
            models::silos::AddSiloBlendMachinePayload,
            models::silos::UpdateSiloBlendMachinePayload,

            // --- Entradas ---
            models::entries::EntryState,
            models::entries::Entry,
            models::entries::EntryDetail,
            models::entries::EntryWithDetails,
            models::entries::EntryLinePayload,
            models::entries::CreateEntryPayload,
            models::entries::UpdateEntryPayload,
            models::entries::OpenEntryStatus,
            models::entries::CorteExists,
            models::entries::SerialStatus,
            models::entries::AllocatedSerial,

            // --- Salidas ---
            models::exits::Exit,
            models::exits::ExitItem,
            models::exits::ExitItemPayload,
            models::exits::CreateExitPayload,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::StockEntry,
            models::dashboard::MovementDay,
        )
    ),
    tags(
        (name = "Usuarios", description = "Usuarios, roles y login por legajo"),
        (name = "Productos", description = "Productos, tipos de producto y stock"),
        (name = "Máquinas", description = "Máquinas de la planta"),
        (name = "Silos", description = "Silos y relaciones silo-blend con sus máquinas"),
        (name = "Entradas", description = "Ingresos de producto con series y tiempo de cura"),
        (name = "Salidas", description = "Egresos de producto desde los silos"),
        (name = "Dashboard", description = "Indicadores de planta")
    )
)]
pub struct ApiDoc;
