//! Greedy non-maximum suppression over axis-aligned boxes.
//!
//! Boxes are ordered by bottom edge and picked from the lowest one upwards.
//! Each pick discards every remaining box whose intersection with the pick,
//! divided by that remaining box's own area, exceeds the threshold. The
//! overlap is normalized by the candidate's area rather than by the union, so
//! thresholds are not interchangeable with IoU thresholds. Edges are treated
//! inclusively (`x + width` is part of the box), which adds one pixel to each
//! side length in both the intersection and the area.

/// Axis-aligned candidate with its top-left corner, size and score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateBox {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub score: f32,
}

impl CandidateBox {
    fn x2(&self) -> i64 {
        (self.x + self.width) as i64
    }

    fn y2(&self) -> i64 {
        (self.y + self.height) as i64
    }

    fn area(&self) -> i64 {
        (self.x2() - self.x as i64 + 1) * (self.y2() - self.y as i64 + 1)
    }

    /// Intersection with `kept`, as a fraction of this box's own area.
    pub fn overlap_fraction(&self, kept: &CandidateBox) -> f32 {
        let xx1 = (self.x as i64).max(kept.x as i64);
        let yy1 = (self.y as i64).max(kept.y as i64);
        let xx2 = self.x2().min(kept.x2());
        let yy2 = self.y2().min(kept.y2());
        let w = (xx2 - xx1 + 1).max(0);
        let h = (yy2 - yy1 + 1).max(0);
        (w * h) as f32 / self.area() as f32
    }
}

/// Suppresses overlapping boxes and returns survivors in pick order.
///
/// Pick order runs from the largest bottom edge to the smallest; among equal
/// bottom edges the box that came later in `boxes` is picked first. The
/// output is not sorted by score.
pub fn suppress_overlaps(boxes: &[CandidateBox], overlap_threshold: f32) -> Vec<CandidateBox> {
    if boxes.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by_key(|&idx| boxes[idx].y2());

    let mut picked = Vec::new();
    while let Some(last) = order.pop() {
        let kept = boxes[last];
        picked.push(kept);
        order.retain(|&idx| boxes[idx].overlap_fraction(&kept) <= overlap_threshold);
    }
    picked
}
