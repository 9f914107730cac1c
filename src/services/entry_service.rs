// src/services/entry_service.rs

use std::collections::BTreeMap;

use chrono::{Local, NaiveDateTime, TimeDelta};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    common::{
        error::{require, AppError},
        quantity::round_qty,
        sorting::SortSpec,
    },
    db::{
        entry_repo::{EntryHeaderChanges, NewEntryDetail, NewEntryHeader},
        EntryRepository, ProductRepository,
    },
    models::entries::{
        CreateEntryPayload, CorteExists, Entry, EntryDetail, EntryLinePayload, EntryState, EntryWithDetails,
        OpenEntryStatus, SerialStatus, UpdateEntryPayload,
    },
};

const DEFAULT_LINE_STATE: &str = "Activo";

/// Fecha en que termina la cura: `desde` + horas de cura del producto.
pub fn cure_timestamp(from: NaiveDateTime, horas_cura: i64) -> NaiveDateTime {
    TimeDelta::try_hours(horas_cura)
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(from)
}

// Suma (o resta, con `sign` = -1) la cantidad de cada línea por producto.
fn add_lines(deltas: &mut BTreeMap<String, f64>, lines: &[EntryDetail], sign: f64) {
    for line in lines {
        *deltas.entry(line.prod_codigo.clone()).or_insert(0.0) += sign * line.cantidad;
    }
}

#[derive(Clone)]
pub struct EntryService {
    pool: SqlitePool,
    entry_repo: EntryRepository,
    product_repo: ProductRepository,
}

impl EntryService {
    pub fn new(pool: SqlitePool, entry_repo: EntryRepository, product_repo: ProductRepository) -> Self {
        Self {
            pool,
            entry_repo,
            product_repo,
        }
    }

    // ---
    // Lecturas
    // ---

    pub async fn list(&self, sort: &SortSpec, estado: Option<&str>) -> Result<Vec<Entry>, AppError> {
        self.entry_repo.find_all(sort, estado).await
    }

    pub async fn get(&self, ent_numero: i64) -> Result<EntryWithDetails, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.load(&mut conn, ent_numero).await
    }

    pub async fn details(&self, ent_numero: i64) -> Result<Vec<EntryDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        if self.entry_repo.find_by_number(&mut *conn, ent_numero).await?.is_none() {
            return Err(AppError::not_found("Entrada", ent_numero));
        }
        self.entry_repo.find_details(&mut *conn, ent_numero).await
    }

    pub async fn latest(&self, limit: i64) -> Result<Vec<Entry>, AppError> {
        self.entry_repo.find_latest(limit).await
    }

    pub async fn open_entry(&self) -> Result<OpenEntryStatus, AppError> {
        let entrada = self.entry_repo.find_open(&self.pool).await?;
        Ok(OpenEntryStatus {
            abierta: entrada.is_some(),
            entrada,
        })
    }

    pub async fn corte_exists(&self, nro_corte: &str) -> Result<CorteExists, AppError> {
        let existe = self.entry_repo.corte_exists(nro_corte).await?;
        Ok(CorteExists { existe })
    }

    pub async fn unique_cortes(&self) -> Result<Vec<String>, AppError> {
        self.entry_repo.unique_cortes().await
    }

    // ---
    // Contador de series
    // ---

    pub async fn serial_status(&self) -> Result<SerialStatus, AppError> {
        let ultima_serie = self.entry_repo.last_serial(&self.pool).await?;
        Ok(SerialStatus {
            ultima_serie,
            siguiente_serie: ultima_serie + 1,
        })
    }

    /// Reserva una serie (p. ej. para imprimir el ticket antes de guardar).
    pub async fn allocate_serial(&self) -> Result<i64, AppError> {
        let serie = self.entry_repo.allocate_serial(&self.pool).await?;
        tracing::info!("🏷️ Serie {} reservada", serie);
        Ok(serie)
    }

    // ---
    // Alta
    // ---

    pub async fn create(&self, payload: &CreateEntryPayload) -> Result<EntryWithDetails, AppError> {
        let fecha = require(payload.fecha, "Fecha")?;
        let nro_corte = require(payload.nro_corte.as_deref(), "NroCorte")?;
        let prod_codigo = require(payload.prod_codigo.as_deref(), "ProdCodigo")?;
        let estado = payload.estado.unwrap_or(EntryState::Open);
        let now = Local::now().naive_local();

        let mut tx = self.pool.begin().await?;

        // 1. Número de entrada y reglas de estado
        let ent_numero = self.entry_repo.next_number(&mut *tx).await?;

        if estado == EntryState::Closed && payload.productos_seleccionados.is_empty() {
            tracing::warn!("Entrada {} rechazada: no se puede crear cerrada sin detalle", ent_numero);
            return Err(AppError::EntryWithoutDetails(ent_numero));
        }
        if estado == EntryState::Open {
            if let Some(open) = self.entry_repo.find_open(&mut *tx).await? {
                tracing::warn!("Entrada rechazada: la entrada {} sigue abierta", open.ent_numero);
                return Err(AppError::OpenEntryExists(Some(open.ent_numero)));
            }
        }

        // 2. Cabecera, con la cura del producto principal
        let main_product = self
            .product_repo
            .find_by_code(&mut *tx, prod_codigo)
            .await?
            .ok_or_else(|| AppError::not_found("Producto", prod_codigo))?;

        self.entry_repo
            .insert_header(
                &mut *tx,
                &NewEntryHeader {
                    ent_numero,
                    fecha,
                    nro_corte,
                    estado,
                    comentario: payload.comentario.as_deref(),
                    usuario_creacion: payload.usuario_creacion.as_deref(),
                    fecha_creacion: now,
                    prod_codigo,
                    fecha_cura: cure_timestamp(now, main_product.horas_cura),
                },
            )
            .await?;

        // 3. Detalle: series reservadas por el cliente o nuevas del contador global
        let mut deltas = BTreeMap::new();
        self.insert_lines(&mut tx, ent_numero, &payload.productos_seleccionados, now, &mut deltas)
            .await?;

        // 4. Stock (una entrada creada ya anulada no suma)
        if estado.counts_stock() {
            self.apply_stock_deltas(&mut tx, &deltas).await?;
        }

        let created = self.load(&mut tx, ent_numero).await?;
        tx.commit().await?;

        tracing::info!(
            "✅ Entrada {} creada (corte {}, {} ítems, stock {:?})",
            ent_numero,
            nro_corte,
            created.detalle.len(),
            deltas
        );
        Ok(created)
    }

    // ---
    // Modificación
    // ---

    pub async fn update(&self, ent_numero: i64, payload: &UpdateEntryPayload) -> Result<EntryWithDetails, AppError> {
        let now = Local::now().naive_local();
        let mut tx = self.pool.begin().await?;

        let current = self
            .entry_repo
            .find_by_number(&mut *tx, ent_numero)
            .await?
            .ok_or_else(|| AppError::not_found("Entrada", ent_numero))?;

        // 1. Reglas de estado sobre el estado resultante
        let target_state = payload.estado.unwrap_or(current.estado);

        if target_state == EntryState::Open && current.estado != EntryState::Open {
            if let Some(open) = self.entry_repo.find_open(&mut *tx).await? {
                if open.ent_numero != ent_numero {
                    tracing::warn!("Entrada {} no reabierta: la {} sigue abierta", ent_numero, open.ent_numero);
                    return Err(AppError::OpenEntryExists(Some(open.ent_numero)));
                }
            }
        }

        if target_state == EntryState::Closed {
            let lines = match &payload.productos_seleccionados {
                Some(lines) => lines.len() as i64,
                None => self.entry_repo.count_details(&mut *tx, ent_numero).await?,
            };
            if lines == 0 {
                tracing::warn!("Entrada {} no cerrada: no tiene detalle", ent_numero);
                return Err(AppError::EntryWithoutDetails(ent_numero));
            }
        }

        // 2. Cabecera (la cura se recalcula si cambia el producto principal)
        if payload.has_header_changes() {
            let mut fecha_cura = None;
            if let Some(prod) = payload.prod_codigo.as_deref() {
                let product = self
                    .product_repo
                    .find_by_code(&mut *tx, prod)
                    .await?
                    .ok_or_else(|| AppError::not_found("Producto", prod))?;
                fecha_cura = Some(cure_timestamp(current.fecha_creacion, product.horas_cura));
            }

            let changes = EntryHeaderChanges {
                fecha: payload.fecha,
                nro_corte: payload.nro_corte.as_deref(),
                estado: payload.estado,
                comentario: payload.comentario.as_deref(),
                prod_codigo: payload.prod_codigo.as_deref(),
                fecha_cura,
            };
            self.entry_repo.update_header(&mut *tx, ent_numero, &changes).await?;
        }

        // 3. Conciliación de stock: el detalle viejo cuenta si la entrada no estaba
        //    anulada, el nuevo si no queda anulada
        let counted_before = current.estado.counts_stock();
        let counted_after = target_state.counts_stock();
        let old = self.entry_repo.find_details(&mut *tx, ent_numero).await?;

        let mut deltas = BTreeMap::new();
        if let Some(lines) = &payload.productos_seleccionados {
            if counted_before {
                add_lines(&mut deltas, &old, -1.0);
            }

            // Las series propias quedan libres y se pueden volver a usar
            self.entry_repo.delete_details(&mut *tx, ent_numero).await?;
            let mut added = BTreeMap::new();
            self.insert_lines(&mut tx, ent_numero, lines, now, &mut added).await?;
            if counted_after {
                for (prod_codigo, cantidad) in added {
                    *deltas.entry(prod_codigo).or_insert(0.0) += cantidad;
                }
            }

            tracing::info!(
                "🔁 Detalle de la entrada {} reemplazado ({} -> {} ítems)",
                ent_numero,
                old.len(),
                lines.len()
            );
        } else if counted_before != counted_after {
            add_lines(&mut deltas, &old, if counted_after { 1.0 } else { -1.0 });
        }

        if !deltas.is_empty() {
            self.apply_stock_deltas(&mut tx, &deltas).await?;
            tracing::info!("📦 Stock conciliado para la entrada {}: {:?}", ent_numero, deltas);
        }

        let updated = self.load(&mut tx, ent_numero).await?;
        tx.commit().await?;

        tracing::info!("✅ Entrada {} modificada (estado {:?})", ent_numero, updated.entrada.estado);
        Ok(updated)
    }

    // ---
    // Bajas (revierten stock)
    // ---

    pub async fn delete(&self, ent_numero: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let entry = self
            .entry_repo
            .find_by_number(&mut *tx, ent_numero)
            .await?
            .ok_or_else(|| AppError::not_found("Entrada", ent_numero))?;

        // Una entrada anulada ya devolvió su stock
        let old = self.entry_repo.find_details(&mut *tx, ent_numero).await?;
        let mut deltas = BTreeMap::new();
        if entry.estado.counts_stock() {
            add_lines(&mut deltas, &old, -1.0);
            self.apply_stock_deltas(&mut tx, &deltas).await?;
        }

        self.entry_repo.delete_details(&mut *tx, ent_numero).await?;
        self.entry_repo.delete_header(&mut *tx, ent_numero).await?;

        tx.commit().await?;
        tracing::info!("🗑️ Entrada {} eliminada ({} ítems, stock {:?})", ent_numero, old.len(), deltas);
        Ok(())
    }

    pub async fn delete_detail(&self, ent_numero: i64, item: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let entry = self
            .entry_repo
            .find_by_number(&mut *tx, ent_numero)
            .await?
            .ok_or_else(|| AppError::not_found("Entrada", ent_numero))?;
        let line = self
            .entry_repo
            .find_detail(&mut *tx, ent_numero, item)
            .await?
            .ok_or_else(|| AppError::not_found("Detalle de entrada", format!("{ent_numero}/{item}")))?;

        // Una entrada cerrada no puede quedar sin detalle
        if entry.estado == EntryState::Closed && self.entry_repo.count_details(&mut *tx, ent_numero).await? <= 1 {
            tracing::warn!("Ítem {} no eliminado: la entrada {} está cerrada", item, ent_numero);
            return Err(AppError::EntryWithoutDetails(ent_numero));
        }

        if entry.estado.counts_stock() {
            let deltas = BTreeMap::from([(line.prod_codigo.clone(), -line.cantidad)]);
            self.apply_stock_deltas(&mut tx, &deltas).await?;
        }
        self.entry_repo.delete_detail(&mut *tx, ent_numero, item).await?;

        tx.commit().await?;
        tracing::info!("🗑️ Ítem {} de la entrada {} eliminado (serie {})", item, ent_numero, line.serie);
        Ok(())
    }

    // ---
    // Pasos internos (siempre dentro de la transacción del llamador)
    // ---

    async fn load(&self, conn: &mut SqliteConnection, ent_numero: i64) -> Result<EntryWithDetails, AppError> {
        let entrada = self
            .entry_repo
            .find_by_number(&mut *conn, ent_numero)
            .await?
            .ok_or_else(|| AppError::not_found("Entrada", ent_numero))?;
        let detalle = self.entry_repo.find_details(&mut *conn, ent_numero).await?;
        Ok(EntryWithDetails { entrada, detalle })
    }

    /// Inserta las líneas como Item 1..n y acumula su cantidad en `deltas`.
    ///
    /// Una `Serie` enviada se conserva si el contador ya la emitió y ninguna línea
    /// la usa (ticket impreso con una serie reservada); si no, se asigna una nueva.
    async fn insert_lines(
        &self,
        conn: &mut SqliteConnection,
        ent_numero: i64,
        lines: &[EntryLinePayload],
        now: NaiveDateTime,
        deltas: &mut BTreeMap<String, f64>,
    ) -> Result<(), AppError> {
        for (index, line) in lines.iter().enumerate() {
            let prod_codigo = require(line.prod_codigo.as_deref(), "ProdCodigo")?;
            let cantidad = round_qty(require(line.cantidad, "Cantidad")?);

            let product = self
                .product_repo
                .find_by_code(&mut *conn, prod_codigo)
                .await?
                .ok_or_else(|| AppError::not_found("Producto", prod_codigo))?;

            let reserved = match line.serie {
                Some(serie) => self.entry_repo.serial_is_free(&mut *conn, serie).await?.then_some(serie),
                None => None,
            };
            let serie = match reserved {
                Some(serie) => serie,
                None => self.entry_repo.allocate_serial(&mut *conn).await?,
            };

            self.entry_repo
                .insert_detail(
                    &mut *conn,
                    &NewEntryDetail {
                        ent_numero,
                        item: index as i64 + 1,
                        prod_codigo,
                        serie,
                        cantidad,
                        fecha: now,
                        fecha_cura: cure_timestamp(now, product.horas_cura),
                        estado: line.estado.as_deref().unwrap_or(DEFAULT_LINE_STATE),
                    },
                )
                .await?;

            *deltas.entry(prod_codigo.to_string()).or_insert(0.0) += cantidad;
        }
        Ok(())
    }

    /// Aplica el neto por producto. Si una reversión deja stock negativo, falla todo.
    async fn apply_stock_deltas(
        &self,
        conn: &mut SqliteConnection,
        deltas: &BTreeMap<String, f64>,
    ) -> Result<(), AppError> {
        for (prod_codigo, delta) in deltas {
            let delta = round_qty(*delta);
            if delta == 0.0 {
                continue;
            }

            let available = self
                .product_repo
                .stock_of(&mut *conn, prod_codigo)
                .await?
                .ok_or_else(|| AppError::not_found("Producto", prod_codigo))?;

            if round_qty(available + delta) < 0.0 {
                tracing::warn!(
                    "Reversión rechazada para {}: disponible {}, a revertir {}",
                    prod_codigo,
                    available,
                    -delta
                );
                return Err(AppError::StockReversalUnderflow {
                    product: prod_codigo.clone(),
                    available,
                    reverted: -delta,
                });
            }

            self.product_repo.adjust_stock(&mut *conn, prod_codigo, delta).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::{
        common::sorting::ENTRADA_SORT,
        db::pool::{connect_in_memory, run_migrations},
        models::RecordState,
    };

    struct Fixture {
        service: EntryService,
        products: ProductRepository,
        pool: SqlitePool,
    }

    async fn fixture() -> Fixture {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let products = ProductRepository::new(pool.clone());
        let tipo = products.create_type("Blend").await.unwrap();
        products
            .create(tipo.tipo_codigo, "Blend A", RecordState::Active, 48)
            .await
            .unwrap();
        products
            .create(tipo.tipo_codigo, "Blend B", RecordState::Active, 0)
            .await
            .unwrap();

        let service = EntryService::new(pool.clone(), EntryRepository::new(pool.clone()), products.clone());
        Fixture { service, products, pool }
    }

    fn line(prod: &str, cantidad: f64) -> EntryLinePayload {
        EntryLinePayload {
            prod_codigo: Some(prod.into()),
            serie: None,
            cantidad: Some(cantidad),
            estado: None,
        }
    }

    fn new_entry(corte: &str, estado: EntryState, lines: Vec<EntryLinePayload>) -> CreateEntryPayload {
        CreateEntryPayload {
            fecha: NaiveDate::from_ymd_opt(2024, 1, 1),
            nro_corte: Some(corte.into()),
            prod_codigo: Some("pr001".into()),
            estado: Some(estado),
            comentario: None,
            usuario_creacion: Some("ana".into()),
            productos_seleccionados: lines,
        }
    }

    async fn stock(f: &Fixture, prod: &str) -> f64 {
        f.products.stock_of(&f.pool, prod).await.unwrap().unwrap()
    }

    #[test]
    fn cure_adds_hours() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let cured = cure_timestamp(from, 48);
        assert_eq!(cured, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap().and_hms_opt(8, 0, 0).unwrap());
        assert_eq!(cure_timestamp(from, 0), from);
    }

    #[tokio::test]
    async fn create_increments_stock_and_assigns_sequential_serials() {
        let f = fixture().await;
        let lines = vec![line("pr001", 50.0), line("pr001", 25.0), line("pr002", 10.0)];
        let created = f.service.create(&new_entry("C-1", EntryState::Open, lines)).await.unwrap();

        assert_eq!(created.entrada.ent_numero, 1);
        let series: Vec<i64> = created.detalle.iter().map(|d| d.serie).collect();
        assert_eq!(series, vec![1, 2, 3]);
        assert_eq!(created.entrada.fecha_cura, cure_timestamp(created.entrada.fecha_creacion, 48));
        assert_eq!(stock(&f, "pr001").await, 75.0);
        assert_eq!(stock(&f, "pr002").await, 10.0);
        assert_eq!(f.service.serial_status().await.unwrap().siguiente_serie, 4);
    }

    #[tokio::test]
    async fn duplicate_corte_rolls_back_everything() {
        let f = fixture().await;
        f.service
            .create(&new_entry("C-1", EntryState::Closed, vec![line("pr001", 5.0)]))
            .await
            .unwrap();

        let err = f
            .service
            .create(&new_entry("C-1", EntryState::Closed, vec![line("pr001", 5.0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateCorte(ref c) if c == "C-1"));
        assert_eq!(stock(&f, "pr001").await, 5.0);
        let entries = f.service.list(&ENTRADA_SORT.resolve(None, None), None).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn only_one_open_entry() {
        let f = fixture().await;
        f.service.create(&new_entry("C-1", EntryState::Open, vec![])).await.unwrap();

        let err = f.service.create(&new_entry("C-2", EntryState::Open, vec![])).await.unwrap_err();
        assert!(matches!(err, AppError::OpenEntryExists(Some(1))));
    }

    #[tokio::test]
    async fn cannot_close_without_details() {
        let f = fixture().await;
        f.service.create(&new_entry("C-1", EntryState::Open, vec![])).await.unwrap();

        let close = UpdateEntryPayload {
            estado: Some(EntryState::Closed),
            ..Default::default()
        };
        let err = f.service.update(1, &close).await.unwrap_err();
        assert!(matches!(err, AppError::EntryWithoutDetails(1)));
        assert_eq!(f.service.get(1).await.unwrap().entrada.estado, EntryState::Open);

        // Con el reemplazo en el mismo pedido sí cierra
        let close_with_lines = UpdateEntryPayload {
            estado: Some(EntryState::Closed),
            productos_seleccionados: Some(vec![line("pr002", 3.0)]),
            ..Default::default()
        };
        let closed = f.service.update(1, &close_with_lines).await.unwrap();
        assert_eq!(closed.entrada.estado, EntryState::Closed);
    }

    #[tokio::test]
    async fn replacing_details_reconciles_stock_and_keeps_known_serials() {
        let f = fixture().await;
        f.service
            .create(&new_entry("C-1", EntryState::Open, vec![line("pr001", 50.0), line("pr002", 10.0)]))
            .await
            .unwrap();

        let mut keep = line("pr001", 30.0);
        keep.serie = Some(1);
        let mut foreign = line("pr001", 5.0);
        foreign.serie = Some(99);
        let update = UpdateEntryPayload {
            productos_seleccionados: Some(vec![keep, foreign]),
            ..Default::default()
        };
        let updated = f.service.update(1, &update).await.unwrap();

        let series: Vec<i64> = updated.detalle.iter().map(|d| d.serie).collect();
        assert_eq!(series, vec![1, 3]);
        assert_eq!(stock(&f, "pr001").await, 35.0);
        assert_eq!(stock(&f, "pr002").await, 0.0);
    }

    #[tokio::test]
    async fn delete_reverses_stock() {
        let f = fixture().await;
        f.service
            .create(&new_entry("C-1", EntryState::Open, vec![line("pr001", 50.0), line("pr001", 20.0)]))
            .await
            .unwrap();

        f.service.delete_detail(1, 2).await.unwrap();
        assert_eq!(stock(&f, "pr001").await, 50.0);

        f.service.delete(1).await.unwrap();
        assert_eq!(stock(&f, "pr001").await, 0.0);
        assert!(matches!(f.service.get(1).await, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn reversal_below_zero_is_rejected() {
        let f = fixture().await;
        f.service
            .create(&new_entry("C-1", EntryState::Open, vec![line("pr001", 50.0)]))
            .await
            .unwrap();
        // Stock consumido por fuera (una salida)
        f.products.adjust_stock(&f.pool, "pr001", -40.0).await.unwrap();

        let err = f.service.delete(1).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::StockReversalUnderflow { available, reverted, .. } if available == 10.0 && reverted == 50.0
        ));
        assert!(f.service.get(1).await.is_ok());
        assert_eq!(stock(&f, "pr001").await, 10.0);
    }

    #[tokio::test]
    async fn reserved_serial_is_kept_on_create() {
        let f = fixture().await;
        let reserved = f.service.allocate_serial().await.unwrap();
        assert_eq!(reserved, 1);

        let mut printed = line("pr001", 10.0);
        printed.serie = Some(reserved);
        let mut never_issued = line("pr001", 5.0);
        never_issued.serie = Some(50);
        let created = f
            .service
            .create(&new_entry("C-1", EntryState::Closed, vec![printed, never_issued]))
            .await
            .unwrap();

        let series: Vec<i64> = created.detalle.iter().map(|d| d.serie).collect();
        assert_eq!(series, vec![1, 2]);
        assert_eq!(f.service.serial_status().await.unwrap().ultima_serie, 2);

        // La serie 1 ya está en uso: otra entrada recibe una nueva
        let mut reused = line("pr002", 1.0);
        reused.serie = Some(1);
        let other = f
            .service
            .create(&new_entry("C-2", EntryState::Closed, vec![reused]))
            .await
            .unwrap();
        assert_eq!(other.detalle[0].serie, 3);
    }

    #[tokio::test]
    async fn fractional_quantities_do_not_drift() {
        let f = fixture().await;
        f.service
            .create(&new_entry("C-1", EntryState::Closed, vec![line("pr001", 0.1), line("pr001", 0.2)]))
            .await
            .unwrap();
        assert_eq!(stock(&f, "pr001").await, 0.3);

        f.service.delete_detail(1, 1).await.unwrap();
        assert_eq!(stock(&f, "pr001").await, 0.2);
        f.service.delete(1).await.unwrap();
        assert_eq!(stock(&f, "pr001").await, 0.0);
    }

    #[tokio::test]
    async fn voiding_an_entry_returns_its_stock() {
        let f = fixture().await;
        f.service
            .create(&new_entry("C-1", EntryState::Closed, vec![line("pr001", 50.0)]))
            .await
            .unwrap();

        let void = UpdateEntryPayload {
            estado: Some(EntryState::Voided),
            ..Default::default()
        };
        let voided = f.service.update(1, &void).await.unwrap();
        assert_eq!(voided.entrada.estado, EntryState::Voided);
        assert_eq!(stock(&f, "pr001").await, 0.0);

        // Volver a cerrarla suma otra vez
        let close = UpdateEntryPayload {
            estado: Some(EntryState::Closed),
            ..Default::default()
        };
        f.service.update(1, &close).await.unwrap();
        assert_eq!(stock(&f, "pr001").await, 50.0);

        // Borrar una entrada anulada no vuelve a restar
        f.service.update(1, &void).await.unwrap();
        f.service.delete(1).await.unwrap();
        assert_eq!(stock(&f, "pr001").await, 0.0);
    }

    #[tokio::test]
    async fn voided_entry_cannot_be_voided_below_zero() {
        let f = fixture().await;
        f.service
            .create(&new_entry("C-1", EntryState::Closed, vec![line("pr001", 50.0)]))
            .await
            .unwrap();
        f.products.adjust_stock(&f.pool, "pr001", -45.0).await.unwrap();

        let void = UpdateEntryPayload {
            estado: Some(EntryState::Voided),
            ..Default::default()
        };
        let err = f.service.update(1, &void).await.unwrap_err();
        assert!(matches!(err, AppError::StockReversalUnderflow { .. }));
        assert_eq!(f.service.get(1).await.unwrap().entrada.estado, EntryState::Closed);
        assert_eq!(stock(&f, "pr001").await, 5.0);
    }

    #[tokio::test]
    async fn last_line_of_a_closed_entry_cannot_be_deleted() {
        let f = fixture().await;
        f.service
            .create(&new_entry("C-1", EntryState::Closed, vec![line("pr001", 5.0)]))
            .await
            .unwrap();

        let err = f.service.delete_detail(1, 1).await.unwrap_err();
        assert!(matches!(err, AppError::EntryWithoutDetails(1)));
        assert_eq!(stock(&f, "pr001").await, 5.0);
    }
}
