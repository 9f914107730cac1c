// src/services/dashboard_service.rs

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, NaiveTime, TimeDelta};

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::dashboard::{DashboardSummary, MovementDay, StockEntry},
};

/// Completa la serie de días `[from, to]` con ceros donde no hubo movimientos.
pub fn merge_movements(
    from: NaiveDate,
    to: NaiveDate,
    entradas: &[(String, f64)],
    salidas: &[(String, f64)],
) -> Vec<MovementDay> {
    let mut days: BTreeMap<String, MovementDay> = from
        .iter_days()
        .take_while(|day| *day <= to)
        .map(|day| {
            let fecha = day.format("%Y-%m-%d").to_string();
            (
                fecha.clone(),
                MovementDay {
                    fecha,
                    entradas: 0.0,
                    salidas: 0.0,
                },
            )
        })
        .collect();

    for (fecha, total) in entradas {
        if let Some(day) = days.get_mut(fecha) {
            day.entradas += total;
        }
    }
    for (fecha, total) in salidas {
        if let Some(day) = days.get_mut(fecha) {
            day.salidas += total;
        }
    }

    days.into_values().collect()
}

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_summary(&self) -> Result<DashboardSummary, AppError> {
        let now = Local::now().naive_local();
        let day_start = now.date().and_time(NaiveTime::MIN);
        let day_end = day_start + TimeDelta::days(1);
        self.repo.get_summary(day_start, day_end, now).await
    }

    pub async fn get_stock(&self, limit: i64) -> Result<Vec<StockEntry>, AppError> {
        self.repo.get_top_stock(self.repo.pool(), limit).await
    }

    /// Totales por día de los últimos `dias` días, hoy incluido.
    pub async fn get_movements(&self, dias: i64) -> Result<Vec<MovementDay>, AppError> {
        let today = Local::now().date_naive();
        let from = today - TimeDelta::days(dias - 1);
        let (entradas, salidas) = self.repo.get_daily_movements(from.and_time(NaiveTime::MIN)).await?;
        Ok(merge_movements(from, today, &entradas, &salidas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn missing_days_are_filled_with_zeros() {
        let entradas = vec![("2024-03-01".to_string(), 50.0), ("2024-03-03".to_string(), 20.0)];
        let salidas = vec![("2024-03-03".to_string(), 5.0)];

        let days = merge_movements(day(1), day(3), &entradas, &salidas);

        assert_eq!(days.len(), 3);
        assert_eq!(days[0], MovementDay { fecha: "2024-03-01".into(), entradas: 50.0, salidas: 0.0 });
        assert_eq!(days[1], MovementDay { fecha: "2024-03-02".into(), entradas: 0.0, salidas: 0.0 });
        assert_eq!(days[2], MovementDay { fecha: "2024-03-03".into(), entradas: 20.0, salidas: 5.0 });
    }

    #[test]
    fn rows_outside_the_window_are_ignored() {
        let entradas = vec![("2024-02-28".to_string(), 99.0)];
        let days = merge_movements(day(1), day(1), &entradas, &[]);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].entradas, 0.0);
    }
}
