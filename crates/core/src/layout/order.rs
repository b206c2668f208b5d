//! Reading-order sort over paragraphs.
//!
//! Implements the two precedence rules from Breuel's 2002 layout-analysis
//! work: a paragraph precedes everything below it that it x-overlaps, and
//! precedes paragraphs entirely to its right unless a third paragraph
//! bridges them vertically. Paragraph x-extents are first widened into
//! empty space so ragged column edges still register as columns.

use crate::utils::{diff_depth_then_reading, rect_x_overlap, rect_y_overlap, HasBBox, Rect, TOL};

use super::para::Para;

/// Widens each paragraph's horizontal extent into the empty space beside
/// it, then down to paragraphs fully below that fit inside that space.
/// The result lands in `Para::extended` and feeds only the order relation.
fn compute_extended_bboxes(paras: &mut [Para], media_box: Rect) {
    let bboxes: Vec<Rect> = paras.iter().map(HasBBox::bbox).collect();

    for (i, para) in paras.iter_mut().enumerate() {
        let own = bboxes[i];

        // Largest obstruction-free interval around the paragraph.
        let mut free_left = media_box.0;
        let mut free_right = media_box.2;
        for (j, other) in bboxes.iter().enumerate() {
            if j == i || !rect_y_overlap(own, *other) {
                continue;
            }
            if other.2 <= own.0 {
                free_left = free_left.max(other.2);
            }
            if other.0 >= own.2 {
                free_right = free_right.min(other.0);
            }
        }

        // Widen to paragraphs entirely below that fit within the free span.
        let mut x0 = own.0;
        let mut x1 = own.2;
        for (j, other) in bboxes.iter().enumerate() {
            if j == i || other.3 > own.1 {
                continue;
            }
            if other.0 >= free_left && other.2 <= free_right {
                x0 = x0.min(other.0);
                x1 = x1.max(other.2);
            }
        }

        para.extended = (x0, own.1, x1, own.3);
    }
}

/// Rule 1: `a` precedes `b` when their x-ranges overlap and `a` sits above.
fn precedes_by_overlap(a: Rect, b: Rect) -> bool {
    rect_x_overlap(a, b) && a.1 > b.1 + TOL
}

/// Rule 2: `a` precedes `b` when `a` is entirely to the left of `b` and no
/// third paragraph bridges them on the y-axis while x-overlapping both.
fn precedes_by_beside(i: usize, j: usize, extended: &[Rect], bboxes: &[Rect]) -> bool {
    let (a, b) = (extended[i], extended[j]);
    if a.2 >= b.0 {
        return false;
    }
    !bboxes.iter().enumerate().any(|(k, c)| {
        k != i
            && k != j
            && rect_y_overlap(*c, a)
            && rect_y_overlap(*c, b)
            && rect_x_overlap(*c, a)
            && rect_x_overlap(*c, b)
    })
}

/// Sorts paragraphs into reading order.
///
/// The pre-sort on depth-then-reading seeds the DFS, so unordered pairs
/// keep their top-to-bottom, left-to-right relation.
pub fn sort_reading_order(mut paras: Vec<Para>, media_box: Rect) -> Vec<Para> {
    if paras.len() < 2 {
        return paras;
    }

    paras.sort_by(|a, b| diff_depth_then_reading(a, b));
    compute_extended_bboxes(&mut paras, media_box);

    let n = paras.len();
    let bboxes: Vec<Rect> = paras.iter().map(HasBBox::bbox).collect();
    let extended: Vec<Rect> = paras.iter().map(|p| p.extended).collect();

    let mut succ: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let ordered = if precedes_by_overlap(bboxes[i], bboxes[j]) {
                true
            } else if precedes_by_overlap(bboxes[j], bboxes[i]) {
                false
            } else {
                precedes_by_beside(i, j, &extended, &bboxes)
            };
            if ordered {
                succ[i].push(j);
            }
        }
    }

    // Depth-first post-order, reversed: a topological order of the DAG.
    let mut visited = vec![false; n];
    let mut post: Vec<usize> = Vec::with_capacity(n);
    for start in 0..n {
        if visited[start] {
            continue;
        }
        // Iterative DFS; the second stack entry marks the post-visit.
        let mut stack: Vec<(usize, bool)> = vec![(start, false)];
        while let Some((node, processed)) = stack.pop() {
            if processed {
                post.push(node);
                continue;
            }
            if visited[node] {
                continue;
            }
            visited[node] = true;
            stack.push((node, true));
            for &next in succ[node].iter().rev() {
                if !visited[next] {
                    stack.push((next, false));
                }
            }
        }
    }
    post.reverse();

    let mut slots: Vec<Option<Para>> = paras.into_iter().map(Some).collect();
    post.into_iter()
        .map(|i| slots[i].take().expect("post-order visits each node once"))
        .collect()
}
