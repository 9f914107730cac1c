// src/common/quantity.rs

// Cantidades y stock (kg) se guardan con 3 decimales. Todo cálculo de stock pasa
// por `round_qty` para que 0.3 - 0.1 sea 0.2 y no 0.19999999999999998.

pub const QTY_DECIMALS: i32 = 3;

pub fn round_qty(value: f64) -> f64 {
    let scale = 10f64.powi(QTY_DECIMALS);
    let rounded = (value * scale).round() / scale;
    // Evita devolver -0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// `true` si `requested` supera a `available` en la escala de 3 decimales.
pub fn exceeds(requested: f64, available: f64) -> bool {
    round_qty(requested - available) > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_absorbs_float_noise() {
        assert_eq!(round_qty(0.3 - 0.1), 0.2);
        assert_eq!(round_qty(0.1 + 0.2), 0.3);
        assert_eq!(round_qty(12.34567), 12.346);
        assert_eq!(round_qty(-0.0001), 0.0);
    }

    #[test]
    fn exceeds_compares_on_the_rounded_scale() {
        assert!(!exceeds(0.2, 0.3 - 0.1));
        assert!(!exceeds(10.0, 10.0));
        assert!(exceeds(10.001, 10.0));
        assert!(!exceeds(5.0, 7.5));
    }
}
