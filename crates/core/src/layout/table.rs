//! Table detection over assembled paragraphs.
//!
//! Builds the four-way neighbor graph of paragraphs (closest paragraph in
//! each cardinal direction overlapping on the perpendicular axis), looks for
//! 2x2 atoms of mutually aligned cells, grows each atom down and right while
//! the neighbor chains stay intact, and replaces every surviving grid's
//! cells with one synthetic table-bearing paragraph.

use ordered_float::OrderedFloat;

use crate::params::ExtractParams;
use crate::utils::{rect_union, HasBBox, Plane, Rect, TOL};

use super::para::{Para, Table};

/// Four-way neighbor links, as indices into the paragraph list.
struct Neighbors {
    left: Vec<Option<usize>>,
    right: Vec<Option<usize>>,
    above: Vec<Option<usize>>,
    below: Vec<Option<usize>>,
}

fn compute_neighbors(paras: &[Para]) -> Neighbors {
    let n = paras.len();
    let mut neighbors = Neighbors {
        left: vec![None; n],
        right: vec![None; n],
        above: vec![None; n],
        below: vec![None; n],
    };
    if n == 0 {
        return neighbors;
    }

    let mut plane: Plane<Rect> = Plane::new();
    for para in paras {
        plane.add(para.bbox());
    }
    let page = paras
        .iter()
        .map(HasBBox::bbox)
        .reduce(rect_union)
        .expect("non-empty paragraph list");

    for (i, para) in paras.iter().enumerate() {
        let (x0, y0, x1, y1) = para.bbox();

        // Closest paragraph to the right, overlapping in Y.
        neighbors.right[i] = plane
            .find((x1 - TOL, y0, page.2 + 1.0, y1))
            .into_iter()
            .filter(|&(j, b)| j != i && b.0 >= x1 - TOL)
            .min_by_key(|&(_, b)| OrderedFloat(b.0))
            .map(|(j, _)| j);

        // Closest paragraph to the left, overlapping in Y.
        neighbors.left[i] = plane
            .find((page.0 - 1.0, y0, x0 + TOL, y1))
            .into_iter()
            .filter(|&(j, b)| j != i && b.2 <= x0 + TOL)
            .max_by_key(|&(_, b)| OrderedFloat(b.2))
            .map(|(j, _)| j);

        // Closest paragraph above (greater Y), overlapping in X.
        neighbors.above[i] = plane
            .find((x0, y1 - TOL, x1, page.3 + 1.0))
            .into_iter()
            .filter(|&(j, b)| j != i && b.1 >= y1 - TOL)
            .min_by_key(|&(_, b)| OrderedFloat(b.1))
            .map(|(j, _)| j);

        // Closest paragraph below (smaller Y), overlapping in X.
        neighbors.below[i] = plane
            .find((x0, page.1 - 1.0, x1, y0 + TOL))
            .into_iter()
            .filter(|&(j, b)| j != i && b.3 <= y0 + TOL)
            .max_by_key(|&(_, b)| OrderedFloat(b.3))
            .map(|(j, _)| j);
    }

    neighbors
}

/// A growing grid of cell indices, rows top to bottom.
struct Grid {
    rows: Vec<Vec<usize>>,
}

impl Grid {
    fn members(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().flatten().copied()
    }

    fn contains(&self, idx: usize) -> bool {
        self.members().any(|m| m == idx)
    }
}

/// Tries to form the 2x2 atom rooted at `a`:
///
/// ```text
///   a b
///   c d
/// ```
///
/// Valid only when every mutual neighbor link agrees on the square.
fn make_atom(a: usize, nb: &Neighbors, usable: &impl Fn(usize) -> bool) -> Option<Grid> {
    let b = nb.right[a]?;
    let c = nb.below[a]?;
    let d = nb.below[b]?;
    let all_usable = usable(b) && usable(c) && usable(d);
    let linked = nb.right[c] == Some(d)
        && nb.left[b] == Some(a)
        && nb.above[c] == Some(a)
        && nb.left[d] == Some(c)
        && nb.above[d] == Some(b);
    if all_usable && linked && a != d && b != c {
        Some(Grid {
            rows: vec![vec![a, b], vec![c, d]],
        })
    } else {
        None
    }
}

/// The row below the grid's last row, when every cell has a usable `below`
/// neighbor and the new row's right chain is intact.
fn down_row(grid: &Grid, nb: &Neighbors, usable: &impl Fn(usize) -> bool) -> Option<Vec<usize>> {
    let last = grid.rows.last()?;
    let row: Vec<usize> = last
        .iter()
        .map(|&cell| nb.below[cell])
        .collect::<Option<_>>()?;
    let chain_ok = row
        .windows(2)
        .all(|pair| nb.right[pair[0]] == Some(pair[1]));
    if chain_ok && row.iter().all(|&cell| usable(cell) && !grid.contains(cell)) {
        Some(row)
    } else {
        None
    }
}

/// The column right of the grid's last column, when every row has a usable
/// `right` neighbor and the new column's below chain is intact.
fn right_col(grid: &Grid, nb: &Neighbors, usable: &impl Fn(usize) -> bool) -> Option<Vec<usize>> {
    let col: Vec<usize> = grid
        .rows
        .iter()
        .map(|row| row.last().and_then(|&cell| nb.right[cell]))
        .collect::<Option<_>>()?;
    let chain_ok = col
        .windows(2)
        .all(|pair| nb.below[pair[0]] == Some(pair[1]));
    if chain_ok && col.iter().all(|&cell| usable(cell) && !grid.contains(cell)) {
        Some(col)
    } else {
        None
    }
}

fn grow_grid(mut grid: Grid, nb: &Neighbors, usable: &impl Fn(usize) -> bool) -> Grid {
    loop {
        // Prefer growing down and right together so square tables fill out
        // without committing to one axis. The right chain of the probe
        // includes the new bottom row, so the corner cell is checked too.
        if let Some(row) = down_row(&grid, nb, usable) {
            let mut probe = Grid {
                rows: {
                    let mut rows = grid.rows.clone();
                    rows.push(row);
                    rows
                },
            };
            if let Some(col) = right_col(&probe, nb, usable) {
                for (r, cell) in col.into_iter().enumerate() {
                    probe.rows[r].push(cell);
                }
            }
            grid = probe;
            continue;
        }
        if let Some(col) = right_col(&grid, nb, usable) {
            for (r, cell) in col.into_iter().enumerate() {
                grid.rows[r].push(cell);
            }
            continue;
        }
        break;
    }
    grid
}

/// Replaces grids of cell-like paragraphs with synthetic table paragraphs.
///
/// Paragraph order is preserved; a table takes the list position of its
/// first cell.
pub fn find_tables(paras: Vec<Para>, params: &ExtractParams) -> Vec<Para> {
    if !params.detect_tables || paras.len() < params.min_table_paras.max(4) {
        return paras;
    }

    let neighbors = compute_neighbors(&paras);
    let mut in_grid = vec![false; paras.len()];
    let mut grids: Vec<Grid> = Vec::new();

    for a in 0..paras.len() {
        if in_grid[a] || paras[a].is_cell() || paras[a].table().is_some() {
            continue;
        }
        let usable = |idx: usize| {
            !in_grid[idx] && !paras[idx].is_cell() && paras[idx].table().is_none()
        };
        let Some(atom) = make_atom(a, &neighbors, &usable) else {
            continue;
        };
        let grid = grow_grid(atom, &neighbors, &usable);
        if grid.members().count() < params.min_table_paras {
            continue;
        }
        for cell in grid.members() {
            in_grid[cell] = true;
        }
        grids.push(grid);
    }

    if grids.is_empty() {
        return paras;
    }

    // Move the cell paragraphs out of the list and wrap each grid.
    let mut slots: Vec<Option<Para>> = paras.into_iter().map(Some).collect();
    let mut tables_at: Vec<(usize, Para)> = Vec::new();
    for grid in &grids {
        let first = grid.rows[0][0];
        let w = grid.rows[0].len();
        let h = grid.rows.len();
        let mut cells = Vec::with_capacity(w * h);
        let mut bbox: Option<Rect> = None;
        for &idx in grid.rows.iter().flatten() {
            let mut cell = slots[idx].take().expect("grid cells are distinct");
            cell.is_cell = true;
            bbox = Some(match bbox {
                Some(b) => rect_union(b, cell.bbox()),
                None => cell.bbox(),
            });
            cells.push(cell);
        }
        let table = Table {
            bbox: bbox.expect("grid has cells"),
            w,
            h,
            cells,
        };
        tables_at.push((first, Para::from_table(table)));
    }

    let mut out = Vec::with_capacity(slots.len());
    for (idx, slot) in slots.into_iter().enumerate() {
        if let Some(pos) = tables_at.iter().position(|(first, _)| *first == idx) {
            out.push(tables_at.remove(pos).1);
        }
        if let Some(para) = slot {
            out.push(para);
        }
    }
    out
}
