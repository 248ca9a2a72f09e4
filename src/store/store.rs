//! The point-table store: owner of the working pattern.

use crate::config::StoreSettings;
use crate::core::domain::{Pattern, Point};
use crate::error::{BlastError, BlastResult, RuleViolation};
use crate::store::history::History;

/// Lifecycle state of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Empty,
    Populated,
}

/// Partial update for [`PatternStore::edit_point`]; unset fields keep their
/// current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointEdit {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub delay: Option<f64>,
}

/// Sole owner of the working [`Pattern`] and its undo history.
///
/// Every mutation is atomic: it is validated first, and either fully applies
/// (including its history snapshot) or leaves pattern and history exactly as
/// they were. Rejections carry the violated rule, its threshold, and the
/// actual value.
#[derive(Debug, Clone)]
pub struct PatternStore {
    pattern: Pattern,
    history: History,
    settings: StoreSettings,
}

impl PatternStore {
    pub fn new(settings: StoreSettings) -> Self {
        let history = History::new(settings.history_capacity);
        Self {
            pattern: Pattern::new(),
            history,
            settings,
        }
    }

    pub fn state(&self) -> StoreState {
        if self.pattern.is_empty() {
            StoreState::Empty
        } else {
            StoreState::Populated
        }
    }

    /// The currently displayed pattern.
    pub fn current(&self) -> &Pattern {
        &self.pattern
    }

    /// A by-value snapshot for handing to analysis components.
    pub fn snapshot(&self) -> Pattern {
        self.pattern.clone()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Replace the working pattern (from the grid generator or an import)
    /// and re-seed history with this single snapshot.
    pub fn load(&mut self, pattern: Pattern) {
        log::info!("loaded pattern with {} holes", pattern.len());
        self.history.seed(pattern.clone());
        self.pattern = pattern;
    }

    /// Append a hole after validating it against the store rules.
    ///
    /// Returns the new hole's table index.
    pub fn add_point(&mut self, point: Point) -> BlastResult<usize> {
        if self.pattern.is_empty() {
            return Err(BlastError::EmptyPattern("add_point"));
        }
        self.validate_point(&point, None)?;

        self.pattern.push(point);
        self.history.push(self.pattern.clone());
        let index = self.pattern.len() - 1;
        log::debug!(
            "added hole {} at ({}, {}) delay {}",
            index,
            point.x,
            point.y,
            point.delay
        );
        Ok(index)
    }

    /// Apply a partial edit to the hole at `index`.
    ///
    /// The edited hole is re-validated against the store rules, with itself
    /// excluded from the neighbor set.
    pub fn edit_point(&mut self, index: usize, edit: PointEdit) -> BlastResult<()> {
        let current = *self
            .pattern
            .get(index)
            .ok_or(BlastError::OutOfRange {
                index,
                len: self.pattern.len(),
            })?;

        let edited = Point::new(
            edit.x.unwrap_or(current.x),
            edit.y.unwrap_or(current.y),
            edit.delay.unwrap_or(current.delay),
        );
        self.validate_point(&edited, Some(index))?;

        self.pattern.replace(index, edited);
        self.history.push(self.pattern.clone());
        log::debug!("edited hole {}", index);
        Ok(())
    }

    /// Delete the hole at `index`. Remaining holes are re-indexed
    /// contiguously (0..n-1); the store transitions to Empty when the last
    /// hole goes.
    pub fn delete_point(&mut self, index: usize) -> BlastResult<Point> {
        if index >= self.pattern.len() {
            return Err(BlastError::OutOfRange {
                index,
                len: self.pattern.len(),
            });
        }

        let removed = self.pattern.remove(index);
        self.history.push(self.pattern.clone());
        log::debug!("deleted hole {} ({} remain)", index, self.pattern.len());
        Ok(removed)
    }

    /// Discard the pattern and all history.
    pub fn clear(&mut self) {
        log::info!("cleared pattern and history");
        self.pattern = Pattern::new();
        self.history.reset();
    }

    /// Step back one mutation. Returns `false` (no-op) when only the seed
    /// snapshot remains.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(pattern) => {
                self.pattern = pattern;
                true
            }
            None => false,
        }
    }

    /// Re-apply the most recently undone mutation. Returns `false` (no-op)
    /// when nothing has been undone.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(pattern) => {
                self.pattern = pattern;
                true
            }
            None => false,
        }
    }

    fn validate_point(&self, point: &Point, exclude: Option<usize>) -> BlastResult<()> {
        if self.settings.reject_negative_delay && point.delay < 0.0 {
            return Err(BlastError::ValidationRejected(RuleViolation::NegativeDelay {
                delay: point.delay,
            }));
        }

        let mut nearest: Option<(usize, f64)> = None;
        for (i, q) in self.pattern.iter().enumerate() {
            if exclude == Some(i) {
                continue;
            }
            let d = point.distance_to(q);
            if nearest.map_or(true, |(_, best)| d < best) {
                nearest = Some((i, d));
            }
        }
        if let Some((i, d)) = nearest {
            if d < self.settings.min_separation {
                return Err(BlastError::ValidationRejected(RuleViolation::TooClose {
                    min_separation: self.settings.min_separation,
                    actual: d,
                    nearest: i,
                }));
            }
        }

        if self.settings.unique_delay {
            let duplicate = self
                .pattern
                .iter()
                .enumerate()
                .find(|&(i, q)| exclude != Some(i) && q.delay == point.delay);
            if let Some((i, q)) = duplicate {
                return Err(BlastError::ValidationRejected(RuleViolation::DuplicateDelay {
                    delay: q.delay,
                    existing: i,
                }));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> StoreSettings {
        StoreSettings {
            min_separation: 0.5,
            unique_delay: false,
            reject_negative_delay: true,
            history_capacity: 30,
        }
    }

    fn seeded_store() -> PatternStore {
        let mut store = PatternStore::new(settings());
        store.load(Pattern::from_points(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(10.0, 0.0, 1.0),
            Point::new(20.0, 0.0, 2.0),
            Point::new(30.0, 0.0, 3.0),
            Point::new(40.0, 0.0, 4.0),
        ]));
        store
    }

    #[test]
    fn load_populates_and_seeds_history() {
        let store = seeded_store();
        assert_eq!(store.state(), StoreState::Populated);
        assert_eq!(store.undo_depth(), 1);
        assert_eq!(store.redo_depth(), 0);
    }

    #[test]
    fn add_rejects_close_points_without_history_entry() {
        let mut store = seeded_store();
        let before = store.snapshot();

        let err = store.add_point(Point::new(10.2, 0.0, 9.0)).unwrap_err();
        match err {
            BlastError::ValidationRejected(RuleViolation::TooClose {
                min_separation,
                actual,
                nearest,
            }) => {
                assert_eq!(min_separation, 0.5);
                assert!((actual - 0.2).abs() < 1e-9);
                assert_eq!(nearest, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // Atomicity: nothing changed, no snapshot recorded.
        assert_eq!(store.current(), &before);
        assert_eq!(store.undo_depth(), 1);
    }

    #[test]
    fn add_rejects_negative_delay() {
        let mut store = seeded_store();
        let err = store.add_point(Point::new(50.0, 0.0, -1.0)).unwrap_err();
        assert!(matches!(
            err,
            BlastError::ValidationRejected(RuleViolation::NegativeDelay { .. })
        ));
    }

    #[test]
    fn unique_delay_policy_rejects_duplicates() {
        let mut store = PatternStore::new(StoreSettings {
            unique_delay: true,
            ..settings()
        });
        store.load(Pattern::from_points(vec![Point::new(0.0, 0.0, 1.0)]));

        let err = store.add_point(Point::new(5.0, 0.0, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            BlastError::ValidationRejected(RuleViolation::DuplicateDelay { existing: 0, .. })
        ));
        // A distinct delay passes.
        store.add_point(Point::new(5.0, 0.0, 2.0)).unwrap();
    }

    #[test]
    fn edit_out_of_range_fails() {
        let mut store = seeded_store();
        let err = store
            .edit_point(9, PointEdit { delay: Some(1.0), ..PointEdit::default() })
            .unwrap_err();
        assert!(matches!(err, BlastError::OutOfRange { index: 9, len: 5 }));
    }

    #[test]
    fn edit_excludes_itself_from_separation() {
        let mut store = seeded_store();
        // Nudging a hole by less than min_separation must not collide with
        // its own previous position.
        store
            .edit_point(
                2,
                PointEdit {
                    x: Some(20.1),
                    ..PointEdit::default()
                },
            )
            .unwrap();
        assert_eq!(store.current().get(2).unwrap().x, 20.1);
    }

    #[test]
    fn edit_validates_against_other_holes() {
        let mut store = seeded_store();
        let err = store
            .edit_point(
                2,
                PointEdit {
                    x: Some(10.1),
                    ..PointEdit::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            BlastError::ValidationRejected(RuleViolation::TooClose { nearest: 1, .. })
        ));
    }

    #[test]
    fn delete_reindexes_contiguously() {
        let mut store = seeded_store();
        let removed = store.delete_point(2).unwrap();
        assert_eq!(removed.delay, 2.0);

        let delays: Vec<f64> = store.current().iter().map(|p| p.delay).collect();
        assert_eq!(delays, vec![0.0, 1.0, 3.0, 4.0]);
        assert_eq!(store.current().len(), 4);
    }

    #[test]
    fn deleting_last_hole_empties_the_store() {
        let mut store = PatternStore::new(settings());
        store.load(Pattern::from_points(vec![Point::new(0.0, 0.0, 0.0)]));
        store.delete_point(0).unwrap();
        assert_eq!(store.state(), StoreState::Empty);
        // The deletion itself is still undoable.
        assert!(store.undo());
        assert_eq!(store.state(), StoreState::Populated);
    }

    #[test]
    fn n_undos_restore_pre_edit_state() {
        let mut store = seeded_store();
        let original = store.snapshot();

        for i in 0..3 {
            store
                .edit_point(
                    i,
                    PointEdit {
                        delay: Some(100.0 + i as f64),
                        ..PointEdit::default()
                    },
                )
                .unwrap();
        }

        assert!(store.undo());
        assert!(store.undo());
        assert!(store.undo());
        assert_eq!(store.current(), &original);
        // Bottomed out at the seed.
        assert!(!store.undo());
    }

    #[test]
    fn undo_redo_is_identity_on_pattern_content() {
        let mut store = seeded_store();
        store.add_point(Point::new(50.0, 0.0, 5.0)).unwrap();
        let after_add = store.snapshot();

        assert!(store.undo());
        assert!(store.redo());
        assert_eq!(store.current(), &after_add);
        // Nothing left to redo.
        assert!(!store.redo());
    }

    #[test]
    fn clear_resets_everything() {
        let mut store = seeded_store();
        store.add_point(Point::new(50.0, 0.0, 5.0)).unwrap();
        store.clear();
        assert_eq!(store.state(), StoreState::Empty);
        assert_eq!(store.undo_depth(), 0);
        assert!(!store.undo());
        assert!(!store.redo());
    }

    #[test]
    fn mutations_on_empty_store_fail() {
        let mut store = PatternStore::new(settings());
        assert!(matches!(
            store.add_point(Point::new(0.0, 0.0, 0.0)),
            Err(BlastError::EmptyPattern(_))
        ));
        assert!(matches!(
            store.edit_point(0, PointEdit::default()),
            Err(BlastError::OutOfRange { .. })
        ));
        assert!(matches!(
            store.delete_point(0),
            Err(BlastError::OutOfRange { .. })
        ));
    }
}
