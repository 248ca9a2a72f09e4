//! Blast-hole grid layout generation.

use serde::{Deserialize, Serialize};

use crate::core::domain::{Pattern, Point};

/// Parameters for a regular (optionally rotated) blast-hole lattice.
///
/// `columns` holes per row at `point_spacing` meters apart, `rows` rows at
/// `row_spacing` (burden) meters apart, the whole lattice rotated
/// `rotation_deg` counter-clockwise about the origin. Generated holes carry a
/// zero delay; timing is assigned afterwards in the table editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSpec {
    pub columns: u32,
    pub rows: u32,
    pub point_spacing: f64,
    pub row_spacing: f64,
    pub rotation_deg: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            columns: 6,
            rows: 6,
            point_spacing: 1.0,
            row_spacing: 1.1,
            rotation_deg: 0.0,
        }
    }
}

impl GridSpec {
    /// Generate the lattice, row-major: hole index = row * columns + column.
    pub fn generate(&self) -> Pattern {
        let theta = self.rotation_deg.to_radians();
        let (sin_t, cos_t) = theta.sin_cos();

        let mut points = Vec::with_capacity((self.rows * self.columns) as usize);
        for i in 0..self.rows {
            for j in 0..self.columns {
                let x0 = f64::from(j) * self.point_spacing;
                let y0 = f64::from(i) * self.row_spacing;
                let x = x0 * cos_t - y0 * sin_t;
                let y = x0 * sin_t + y0 * cos_t;
                points.push(Point::new(x, y, 0.0));
            }
        }

        log::debug!(
            "generated {} hole grid ({} x {}, rotation {} deg)",
            points.len(),
            self.rows,
            self.columns,
            self.rotation_deg
        );
        Pattern::from_points(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrotated_grid_is_row_major() {
        let spec = GridSpec {
            columns: 3,
            rows: 2,
            point_spacing: 2.0,
            row_spacing: 1.5,
            rotation_deg: 0.0,
        };
        let pattern = spec.generate();
        assert_eq!(pattern.len(), 6);

        // Second hole of the first row.
        let p = pattern.get(1).unwrap();
        assert_eq!((p.x, p.y), (2.0, 0.0));
        // First hole of the second row.
        let p = pattern.get(3).unwrap();
        assert_eq!((p.x, p.y), (0.0, 1.5));
        assert!(pattern.iter().all(|p| p.delay == 0.0));
    }

    #[test]
    fn rotation_by_quarter_turn() {
        let spec = GridSpec {
            columns: 2,
            rows: 1,
            point_spacing: 3.0,
            row_spacing: 1.0,
            rotation_deg: 90.0,
        };
        let pattern = spec.generate();
        // (3, 0) rotates onto (0, 3).
        let p = pattern.get(1).unwrap();
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_rows_gives_empty_pattern() {
        let spec = GridSpec {
            rows: 0,
            ..GridSpec::default()
        };
        assert!(spec.generate().is_empty());
    }
}
