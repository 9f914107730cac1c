// src/services/exit_service.rs

use std::cmp::Ordering;

use chrono::Local;
use sqlx::SqlitePool;

use crate::{
    common::{
        error::{require, AppError},
        quantity::{exceeds, round_qty},
        sorting::{SortOrder, SortSpec},
    },
    db::{exit_repo::NewExitRow, ExitRepository, ProductRepository, SiloBlendRepository},
    models::exits::{CreateExitPayload, Exit, ExitItem, ExitRow},
};

// ---
// Etapa 2: agrupado de filas planas en cabecera + ítems
// ---

/// Agrupa filas ordenadas por (SalNumero, Item). Filas consecutivas con el mismo
/// SalNumero forman una salida; la cabecera toma los datos del primer ítem.
pub fn group_exits(rows: Vec<ExitRow>) -> Vec<Exit> {
    let mut exits: Vec<Exit> = Vec::new();

    for row in rows {
        let item = ExitItem {
            item: row.item,
            rel_numero: row.rel_numero,
            prod_codigo: row.prod_codigo,
            prod_nombre: row.prod_nombre,
            nro_corte: row.nro_corte,
            serie: row.serie,
            cantidad: row.cantidad,
            estado: row.estado.clone(),
        };

        match exits.last_mut() {
            Some(current) if current.sal_numero == row.sal_numero => {
                current.cantidad_total = round_qty(current.cantidad_total + item.cantidad);
                current.items.push(item);
            }
            _ => exits.push(Exit {
                sal_numero: row.sal_numero,
                fecha_creacion: row.fecha_creacion,
                usuario_creacion: row.usuario_creacion,
                estado: row.estado,
                cantidad_total: item.cantidad,
                items: vec![item],
            }),
        }
    }

    exits
}

// ---
// Etapa 3: orden de los grupos
// ---

/// Ordena las salidas ya agrupadas por el campo lógico validado en `sort`.
/// Empates por SalNumero ascendente.
pub fn sort_exits(exits: &mut [Exit], sort: &SortSpec) {
    exits.sort_by(|a, b| {
        let primary = match sort.field {
            "FechaCreacion" => a.fecha_creacion.cmp(&b.fecha_creacion),
            "UsuarioCreacion" => a.usuario_creacion.cmp(&b.usuario_creacion),
            "CantidadTotal" => a.cantidad_total.total_cmp(&b.cantidad_total),
            _ => a.sal_numero.cmp(&b.sal_numero),
        };
        let primary = match sort.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        match primary {
            Ordering::Equal => a.sal_numero.cmp(&b.sal_numero),
            other => other,
        }
    });
}

#[derive(Clone)]
pub struct ExitService {
    pool: SqlitePool,
    exit_repo: ExitRepository,
    product_repo: ProductRepository,
    silo_blend_repo: SiloBlendRepository,
}

impl ExitService {
    pub fn new(
        pool: SqlitePool,
        exit_repo: ExitRepository,
        product_repo: ProductRepository,
        silo_blend_repo: SiloBlendRepository,
    ) -> Self {
        Self {
            pool,
            exit_repo,
            product_repo,
            silo_blend_repo,
        }
    }

    /// Etapa 1 (filas) -> 2 (agrupado) -> 3 (orden).
    pub async fn list(&self, sort: &SortSpec, estado: Option<&str>) -> Result<Vec<Exit>, AppError> {
        let rows = self.exit_repo.find_rows(estado).await?;
        let mut exits = group_exits(rows);
        sort_exits(&mut exits, sort);
        Ok(exits)
    }

    pub async fn get(&self, sal_numero: i64) -> Result<Exit, AppError> {
        let rows = self.exit_repo.find_rows_by_number(&self.pool, sal_numero).await?;
        group_exits(rows)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found("Salida", sal_numero))
    }

    /// Alta de una salida con varios ítems: todo o nada.
    pub async fn create(&self, payload: &CreateExitPayload) -> Result<Exit, AppError> {
        let now = Local::now().naive_local();
        let mut tx = self.pool.begin().await?;

        let sal_numero = self.exit_repo.next_number(&mut *tx).await?;

        for (index, item) in payload.items.iter().enumerate() {
            let rel_numero = require(item.rel_numero, "RelNumero")?;
            let prod_codigo = require(item.prod_codigo.as_deref(), "ProdCodigo")?;
            let cantidad = round_qty(require(item.cantidad, "Cantidad")?);

            // 1. La relación silo-blend debe existir
            if self.silo_blend_repo.find_by_number(&mut *tx, rel_numero).await?.is_none() {
                return Err(AppError::not_found("Relación silo-blend", rel_numero));
            }

            // 2. Stock suficiente (ya descontados los ítems anteriores de esta salida)
            let available = self
                .product_repo
                .stock_of(&mut *tx, prod_codigo)
                .await?
                .ok_or_else(|| AppError::not_found("Producto", prod_codigo))?;

            if exceeds(cantidad, available) {
                tracing::warn!(
                    "Salida {} rechazada: stock insuficiente de {} (disponible {}, solicitado {})",
                    sal_numero,
                    prod_codigo,
                    available,
                    cantidad
                );
                return Err(AppError::InsufficientStock {
                    product: prod_codigo.to_string(),
                    available,
                    requested: cantidad,
                });
            }

            // 3. Fila y descuento
            self.exit_repo
                .insert_row(
                    &mut *tx,
                    &NewExitRow {
                        sal_numero,
                        item: index as i64 + 1,
                        rel_numero,
                        prod_codigo,
                        nro_corte: item.nro_corte.as_deref(),
                        serie: item.serie,
                        cantidad,
                        usuario_creacion: payload.usuario_creacion.as_deref(),
                        fecha_creacion: now,
                    },
                )
                .await?;
            self.product_repo.adjust_stock(&mut *tx, prod_codigo, -cantidad).await?;
        }

        let rows = self.exit_repo.find_rows_by_number(&mut *tx, sal_numero).await?;
        let exit = group_exits(rows)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found("Salida", sal_numero))?;

        tx.commit().await?;
        tracing::info!(
            "✅ Salida {} registrada ({} ítems, total {})",
            sal_numero,
            exit.items.len(),
            exit.cantidad_total
        );
        Ok(exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::{
        common::sorting::SALIDA_SORT,
        db::pool::{connect_in_memory, run_migrations},
        models::{exits::ExitItemPayload, RecordState},
    };

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    fn row(sal: i64, item: i64, cantidad: f64, user: &str, hour: u32) -> ExitRow {
        ExitRow {
            sal_numero: sal,
            item,
            rel_numero: 1,
            prod_codigo: "pr001".into(),
            prod_nombre: Some("Blend A".into()),
            nro_corte: None,
            serie: None,
            cantidad,
            usuario_creacion: Some(user.into()),
            fecha_creacion: at(hour),
            estado: "Activo".into(),
        }
    }

    #[test]
    fn rows_are_grouped_by_exit_number() {
        let exits = group_exits(vec![
            row(1, 1, 10.0, "ana", 8),
            row(1, 2, 5.0, "ana", 8),
            row(2, 1, 7.0, "luis", 9),
        ]);

        assert_eq!(exits.len(), 2);
        assert_eq!(exits[0].items.len(), 2);
        assert_eq!(exits[0].cantidad_total, 15.0);
        assert_eq!(exits[1].sal_numero, 2);
        assert_eq!(exits[1].usuario_creacion.as_deref(), Some("luis"));
    }

    #[test]
    fn groups_are_sorted_after_grouping() {
        let mut exits = group_exits(vec![
            row(1, 1, 10.0, "ana", 8),
            row(1, 2, 5.0, "ana", 8),
            row(2, 1, 30.0, "luis", 9),
            row(3, 1, 1.0, "beto", 7),
        ]);

        sort_exits(&mut exits, &SALIDA_SORT.resolve(Some("CantidadTotal"), Some("DESC")));
        let order: Vec<i64> = exits.iter().map(|e| e.sal_numero).collect();
        assert_eq!(order, vec![2, 1, 3]);

        sort_exits(&mut exits, &SALIDA_SORT.resolve(Some("FechaCreacion"), None));
        let order: Vec<i64> = exits.iter().map(|e| e.sal_numero).collect();
        assert_eq!(order, vec![3, 1, 2]);

        // Campo desconocido: SalNumero
        sort_exits(&mut exits, &SALIDA_SORT.resolve(Some("Nada"), None));
        let order: Vec<i64> = exits.iter().map(|e| e.sal_numero).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    struct Fixture {
        service: ExitService,
        products: ProductRepository,
        pool: SqlitePool,
    }

    async fn fixture() -> Fixture {
        let pool = connect_in_memory().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let products = ProductRepository::new(pool.clone());
        let tipo = products.create_type("Blend").await.unwrap();
        products.create(tipo.tipo_codigo, "Blend A", RecordState::Active, 0).await.unwrap();
        products.create(tipo.tipo_codigo, "Blend B", RecordState::Active, 0).await.unwrap();
        products.adjust_stock(&pool, "pr001", 100.0).await.unwrap();
        products.adjust_stock(&pool, "pr002", 10.0).await.unwrap();

        sqlx::query("INSERT INTO Silo (SiloCodigo, SiloNombre, SiloEstado) VALUES ('si001', 'Silo 1', 'Activo')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO RelSiloBlend (RelNumero, ProdCodigo, SiloCodigo, Estado) VALUES (1, 'pr001', 'si001', 'Activo')")
            .execute(&pool)
            .await
            .unwrap();

        let service = ExitService::new(
            pool.clone(),
            ExitRepository::new(pool.clone()),
            products.clone(),
            SiloBlendRepository::new(pool.clone()),
        );
        Fixture { service, products, pool }
    }

    fn item(prod: &str, cantidad: f64) -> ExitItemPayload {
        ExitItemPayload {
            rel_numero: Some(1),
            prod_codigo: Some(prod.into()),
            nro_corte: Some("C-1".into()),
            serie: Some(1),
            cantidad: Some(cantidad),
        }
    }

    async fn stock(f: &Fixture, prod: &str) -> f64 {
        f.products.stock_of(&f.pool, prod).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn create_decrements_stock_per_item() {
        let f = fixture().await;
        let payload = CreateExitPayload {
            usuario_creacion: Some("ana".into()),
            items: vec![item("pr001", 40.0), item("pr002", 10.0)],
        };

        let exit = f.service.create(&payload).await.unwrap();
        assert_eq!(exit.sal_numero, 1);
        assert_eq!(exit.items.len(), 2);
        assert_eq!(exit.cantidad_total, 50.0);
        assert_eq!(stock(&f, "pr001").await, 60.0);
        assert_eq!(stock(&f, "pr002").await, 0.0);
    }

    #[tokio::test]
    async fn insufficient_stock_rejects_the_whole_exit() {
        let f = fixture().await;
        let payload = CreateExitPayload {
            usuario_creacion: None,
            items: vec![item("pr001", 40.0), item("pr002", 11.0)],
        };

        let err = f.service.create(&payload).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { ref product, .. } if product == "pr002"));
        assert_eq!(stock(&f, "pr001").await, 100.0);
        assert_eq!(stock(&f, "pr002").await, 10.0);
        assert!(f.service.list(&SALIDA_SORT.resolve(None, None), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_product_is_checked_cumulatively() {
        let f = fixture().await;
        let payload = CreateExitPayload {
            usuario_creacion: None,
            items: vec![item("pr002", 6.0), item("pr002", 6.0)],
        };

        let err = f.service.create(&payload).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available, .. } if available == 4.0));
        assert_eq!(stock(&f, "pr002").await, 10.0);
    }

    #[tokio::test]
    async fn fractional_exits_consume_the_exact_stock() {
        let f = fixture().await;
        let tipo = f.products.create_type("Aditivo").await.unwrap();
        f.products.create(tipo.tipo_codigo, "Saborizante", RecordState::Active, 0).await.unwrap();
        f.products.adjust_stock(&f.pool, "pr003", 0.3).await.unwrap();

        for cantidad in [0.1, 0.2] {
            let payload = CreateExitPayload {
                usuario_creacion: None,
                items: vec![item("pr003", cantidad)],
            };
            f.service.create(&payload).await.unwrap();
        }
        assert_eq!(stock(&f, "pr003").await, 0.0);

        // Ya no queda nada: 0.001 es demasiado
        let payload = CreateExitPayload {
            usuario_creacion: None,
            items: vec![item("pr003", 0.001)],
        };
        let err = f.service.create(&payload).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available, .. } if available == 0.0));
    }

    #[test]
    fn group_total_is_rounded() {
        let exits = group_exits(vec![row(1, 1, 0.1, "ana", 8), row(1, 2, 0.2, "ana", 8)]);
        assert_eq!(exits[0].cantidad_total, 0.3);
    }

    #[tokio::test]
    async fn unknown_relation_is_not_found() {
        let f = fixture().await;
        let mut bad = item("pr001", 1.0);
        bad.rel_numero = Some(42);
        let payload = CreateExitPayload {
            usuario_creacion: None,
            items: vec![bad],
        };

        assert!(matches!(f.service.create(&payload).await, Err(AppError::NotFound { .. })));
        assert!(matches!(f.service.get(1).await, Err(AppError::NotFound { .. })));
    }
}
