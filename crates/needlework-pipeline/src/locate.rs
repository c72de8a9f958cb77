//! Best-score search over a score field.
//!
//! Difference-type methods want the global minimum, correlation-type
//! methods the global maximum. NaN and ±∞ cells never win; when every
//! cell is degenerate there is no best location at all.

use serde::{Deserialize, Serialize};

use crate::types::{Location, Polarity, ScoreField};

/// The winning cell of a score field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Best {
    /// Top-left needle placement of the best score.
    pub location: Location,
    /// The best score itself.
    pub value: f64,
}

/// Global extremes of the finite cells, in the style of a min/max-loc
/// search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremes {
    /// Smallest finite score and its first location.
    pub min: Best,
    /// Largest finite score and its first location.
    pub max: Best,
}

/// Find both extremes of the finite cells.
///
/// Ties resolve to the first occurrence in row-major order (rows top to
/// bottom, columns left to right). Returns `None` if no cell is finite.
#[must_use]
pub fn find_extremes(field: &ScoreField) -> Option<Extremes> {
    let mut extremes: Option<Extremes> = None;
    for (location, value) in field.iter().filter(|(_, v)| v.is_finite()) {
        let cell = Best { location, value };
        match extremes.as_mut() {
            None => {
                extremes = Some(Extremes {
                    min: cell,
                    max: cell,
                });
            }
            Some(e) => {
                if value < e.min.value {
                    e.min = cell;
                }
                if value > e.max.value {
                    e.max = cell;
                }
            }
        }
    }
    extremes
}

/// Pick the best cell for the given polarity.
#[must_use]
pub fn find_best(field: &ScoreField, polarity: Polarity) -> Option<Best> {
    find_extremes(field).map(|e| match polarity {
        Polarity::LowerIsBetter => e.min,
        Polarity::HigherIsBetter => e.max,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn field(width: u32, values: &[f64]) -> ScoreField {
        let height = u32::try_from(values.len()).unwrap() / width;
        ScoreField::from_values(width, height, values.to_vec()).unwrap()
    }

    #[test]
    fn lower_is_better_picks_minimum() {
        let f = field(3, &[5.0, 4.0, 3.0, 9.0, 1.0, 7.0]);
        let best = find_best(&f, Polarity::LowerIsBetter).unwrap();
        assert_eq!(best.location, Location::new(1, 1));
        assert!((best.value - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn higher_is_better_picks_maximum() {
        let f = field(3, &[5.0, 4.0, 3.0, 9.0, 1.0, 7.0]);
        let best = find_best(&f, Polarity::HigherIsBetter).unwrap();
        assert_eq!(best.location, Location::new(0, 1));
        assert!((best.value - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_resolve_to_first_row_major_occurrence() {
        let f = field(3, &[0.0, 2.0, 0.0, 2.0, 0.0, 2.0]);
        assert_eq!(
            find_best(&f, Polarity::LowerIsBetter).unwrap().location,
            Location::new(0, 0)
        );
        assert_eq!(
            find_best(&f, Polarity::HigherIsBetter).unwrap().location,
            Location::new(1, 0)
        );
    }

    #[test]
    fn column_ties_within_a_row_prefer_the_left() {
        let f = field(2, &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(
            find_best(&f, Polarity::HigherIsBetter).unwrap().location,
            Location::new(0, 0)
        );
    }

    #[test]
    fn degenerate_cells_never_win() {
        let f = field(4, &[f64::INFINITY, f64::NAN, 0.5, f64::NEG_INFINITY]);
        let hi = find_best(&f, Polarity::HigherIsBetter).unwrap();
        let lo = find_best(&f, Polarity::LowerIsBetter).unwrap();
        assert_eq!(hi.location, Location::new(2, 0));
        assert_eq!(lo.location, Location::new(2, 0));
    }

    #[test]
    fn fully_degenerate_field_has_no_best() {
        let f = field(2, &[f64::NAN, f64::INFINITY, f64::NEG_INFINITY, f64::NAN]);
        assert!(find_best(&f, Polarity::LowerIsBetter).is_none());
        assert!(find_extremes(&f).is_none());
    }
}
