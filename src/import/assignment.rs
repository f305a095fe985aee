//! Supply-constrained color assignment.
//!
//! Every opaque raster cell ranks the palette colors by perceptual distance.
//! Colors are then handed out in rounds: each unassigned cell asks for its
//! best color that still has supply, and when a color is oversubscribed only
//! the closest cells get it. The losers retry with their next preference in
//! the following round. This spreads scarce colors toward the pixels that
//! match them best, independent of scan order.
//!
//! Cells that run out of preferences, or are still unassigned when the round
//! cap is hit, take their best preference anyway and are counted as
//! oversubscribed.

use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::{ImportError, Raster};
use crate::color::{perceptual_distance_sq, Rgb};
use crate::grid::Grid;
use crate::models::{CellValue, HexColor, Quantity};

/// Default cap on rationing rounds.
pub const DEFAULT_MAX_ROUNDS: usize = 64;

/// Statistics from one assignment run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    /// Rationing rounds executed.
    pub rounds: usize,
    /// Cells that received a color beyond its supply.
    pub oversubscribed: usize,
    /// Cells left `Clear` because their source was transparent.
    pub cleared: usize,
    /// Cells assigned per color.
    pub assigned_per_color: BTreeMap<HexColor, usize>,
}

/// The assigned grid and its report.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub grid: Grid,
    pub report: AssignmentReport,
}

struct Candidate {
    color: HexColor,
    rgb: Rgb,
    /// `None` is unlimited.
    remaining: Option<u64>,
}

/// A cell waiting for a color, with its ranked preferences.
struct Target {
    row: usize,
    col: usize,
    /// (candidate index, squared distance), best first.
    preferences: Vec<(usize, f64)>,
    /// Next preference to try.
    cursor: usize,
    assigned: Option<usize>,
}

fn rank(rgb: Rgb, candidates: &[Candidate]) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> =
        candidates.iter().enumerate().map(|(i, c)| (i, perceptual_distance_sq(rgb, c.rgb))).collect();
    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    ranked
}

/// Assign a palette color to every cell of `raster`.
///
/// `supply` lists the candidate colors with their quantities; special
/// entries must already be excluded. Transparent cells become `Clear`. With
/// no candidates at all, every cell is `Clear`.
///
/// The result is deterministic for identical input.
pub fn assign_colors(
    raster: &Raster,
    supply: &[(HexColor, Quantity)],
    max_rounds: usize,
) -> Result<Assignment, ImportError> {
    let mut grid = Grid::from_cells(raster.iter().map(|row| vec![CellValue::Clear; row.len()]).collect())?;
    let mut report = AssignmentReport::default();

    let mut candidates: Vec<Candidate> = supply
        .iter()
        .map(|(color, quantity)| Candidate {
            color: color.clone(),
            rgb: color.rgb(),
            remaining: quantity.limit().map(u64::from),
        })
        .collect();

    let opaque: Vec<(usize, usize, Rgb)> = raster
        .iter()
        .enumerate()
        .flat_map(|(r, row)| row.iter().enumerate().filter_map(move |(c, cell)| cell.map(|rgb| (r, c, rgb))))
        .collect();
    report.cleared = grid.rows() * grid.cols() - opaque.len();

    if candidates.is_empty() {
        log::warn!("palette has no colors, {} opaque cells left clear", opaque.len());
        report.cleared += opaque.len();
        return Ok(Assignment { grid, report });
    }

    // Ranking is the expensive part; collect keeps raster order.
    let mut targets: Vec<Target> = opaque
        .par_iter()
        .map(|&(row, col, rgb)| Target { row, col, preferences: rank(rgb, &candidates), cursor: 0, assigned: None })
        .collect();

    for round in 1..=max_rounds.max(1) {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (index, target) in targets.iter_mut().enumerate() {
            if target.assigned.is_some() {
                continue;
            }
            while let Some(&(choice, _)) = target.preferences.get(target.cursor) {
                if candidates[choice].remaining != Some(0) {
                    break;
                }
                target.cursor += 1;
            }
            match target.preferences.get(target.cursor) {
                Some(&(choice, _)) => groups.entry(choice).or_default().push(index),
                None => {
                    target.assigned = Some(target.preferences[0].0);
                    report.oversubscribed += 1;
                }
            }
        }
        if groups.is_empty() {
            break;
        }
        report.rounds = round;

        for (choice, mut members) in groups {
            let candidate = &mut candidates[choice];
            let granted = match candidate.remaining {
                None => members.len(),
                Some(left) if members.len() as u64 <= left => {
                    candidate.remaining = Some(left - members.len() as u64);
                    members.len()
                }
                Some(left) => {
                    members.sort_by(|&a, &b| {
                        let da = targets[a].preferences[targets[a].cursor].1;
                        let db = targets[b].preferences[targets[b].cursor].1;
                        da.partial_cmp(&db).unwrap_or(Ordering::Equal).then(a.cmp(&b))
                    });
                    candidate.remaining = Some(0);
                    left as usize
                }
            };
            for &index in &members[..granted] {
                targets[index].assigned = Some(choice);
            }
        }
    }

    for target in &mut targets {
        if target.assigned.is_none() {
            target.assigned = Some(target.preferences[0].0);
            report.oversubscribed += 1;
        }
    }

    for target in &targets {
        if let Some(choice) = target.assigned {
            let color = &candidates[choice].color;
            grid.set(target.row, target.col, CellValue::Color(color.clone()));
            *report.assigned_per_color.entry(color.clone()).or_insert(0) += 1;
        }
    }

    log::info!(
        "assigned {} cells in {} round(s), {} clear",
        targets.len(),
        report.rounds,
        report.cleared
    );
    if report.oversubscribed > 0 {
        log::warn!("{} cell(s) exceed available supply", report.oversubscribed);
    }
    Ok(Assignment { grid, report })
}
