use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tallymatch::lowlevel::{suppress_overlaps, CandidateBox};

fn square(x: usize, y: usize, size: usize, score: f32) -> CandidateBox {
    CandidateBox {
        x,
        y,
        width: size,
        height: size,
        score,
    }
}

fn sorted(mut boxes: Vec<CandidateBox>) -> Vec<(usize, usize, usize, usize)> {
    let mut keys: Vec<_> = boxes
        .drain(..)
        .map(|b| (b.x, b.y, b.width, b.height))
        .collect();
    keys.sort_unstable();
    keys
}

#[test]
fn heavy_overlap_keeps_one_box() {
    // 19 of 20 columns shared: roughly 90% overlap either way.
    let a = square(0, 0, 19, 0.95);
    let b = square(1, 0, 19, 0.97);
    assert!(a.overlap_fraction(&b) > 0.85);
    let kept = suppress_overlaps(&[a, b], 0.3);
    assert_eq!(kept.len(), 1);
}

#[test]
fn disjoint_boxes_are_all_kept() {
    let a = square(0, 0, 10, 0.95);
    let b = square(30, 30, 10, 0.97);
    let kept = suppress_overlaps(&[a, b], 0.3);
    assert_eq!(sorted(kept), sorted(vec![a, b]));
}

#[test]
fn pick_order_runs_from_lowest_bottom_edge() {
    let top = square(0, 0, 5, 0.99);
    let middle = square(20, 10, 5, 0.5);
    let bottom = square(40, 30, 5, 0.7);
    let kept = suppress_overlaps(&[top, middle, bottom], 0.3);
    assert_eq!(kept, vec![bottom, middle, top]);
}

#[test]
fn equal_bottom_edges_pick_later_entry_first() {
    let first = square(0, 10, 8, 0.9);
    let second = square(2, 10, 8, 0.9);
    let kept = suppress_overlaps(&[first, second], 0.3);
    assert_eq!(kept, vec![second]);
}

#[test]
fn threshold_one_suppresses_only_exact_covers() {
    let a = square(0, 0, 10, 0.9);
    let b = square(2, 2, 10, 0.9);
    assert_eq!(suppress_overlaps(&[a, b], 1.0).len(), 2);
    assert_eq!(suppress_overlaps(&[a, a], 1.0).len(), 2);
    assert_eq!(suppress_overlaps(&[a, a], 0.99).len(), 1);
}

#[test]
fn suppression_is_idempotent_for_equal_sized_boxes() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..20 {
        let boxes: Vec<CandidateBox> = (0..40)
            .map(|_| {
                square(
                    rng.random_range(0..60),
                    rng.random_range(0..60),
                    12,
                    rng.random_range(0.0..1.0),
                )
            })
            .collect();
        let once = suppress_overlaps(&boxes, 0.3);
        let twice = suppress_overlaps(&once, 0.3);
        assert_eq!(sorted(once), sorted(twice));
    }
}
