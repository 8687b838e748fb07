use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tallymatch::lowlevel::resize_area;
use tallymatch::{
    detect_multi_scale, detect_multiple, detect_single, Image, InstanceOrder, MultiParams,
    OwnedImage, PixelLayout, TallyMatchError,
};

fn noise(width: usize, height: usize, lo: u8, hi: u8, seed: u64) -> Image {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height)
        .map(|_| rng.random_range(lo..=hi))
        .collect();
    Image::new(data, width, height, PixelLayout::Gray).unwrap()
}

fn paste(frame: &mut Image, patch: &Image, x0: usize, y0: usize) {
    for y in 0..patch.height() {
        for x in 0..patch.width() {
            let px = patch.pixel(x, y).unwrap().to_vec();
            frame.put_pixel(x0 + x, y0 + y, &px);
        }
    }
}

fn shifted(img: &Image, k: u8) -> Image {
    let data = img.as_bytes().iter().map(|&v| v + k).collect();
    Image::new(data, img.width(), img.height(), img.layout()).unwrap()
}

fn gray_to_image(img: OwnedImage) -> Image {
    Image::from(img)
}

#[test]
fn exact_copy_is_found_at_its_position() {
    let frame = noise(64, 48, 0, 255, 7);
    for &(x, y, w, h) in &[(17, 9, 12, 10), (0, 0, 5, 5), (50, 30, 14, 18), (3, 40, 20, 8)] {
        let tpl = frame.crop(x, y, w, h).unwrap();
        let det = detect_single(&frame, Some(&tpl)).unwrap().unwrap();
        assert_eq!((det.top_left.x, det.top_left.y), (x, y));
        assert_eq!((det.width(), det.height()), (w, h));
        assert!(det.score >= 0.999, "score {}", det.score);
    }
}

#[test]
fn score_is_invariant_to_shared_brightness_shift() {
    let frame = noise(40, 32, 10, 200, 11);
    // A perturbed copy keeps the score away from the clamp at 1.0.
    let mut tpl = frame.crop(8, 6, 10, 9).unwrap();
    let bumps = noise(10, 9, 0, 30, 12);
    for y in 0..9 {
        for x in 0..10 {
            let v = tpl.pixel(x, y).unwrap()[0];
            let b = bumps.pixel(x, y).unwrap()[0];
            tpl.put_pixel(x, y, &[(v + b).min(200)]);
        }
    }

    let base = detect_single(&frame, Some(&tpl)).unwrap().unwrap();
    let k = 40;
    let moved = detect_single(&shifted(&frame, k), Some(&shifted(&tpl, k)))
        .unwrap()
        .unwrap();
    assert!(base.score < 0.999);
    assert_eq!(base.top_left, moved.top_left);
    assert!((base.score - moved.score).abs() < 1e-3);
}

#[test]
fn multi_scale_recovers_embedded_scale() {
    let tpl = noise(20, 20, 0, 255, 21);
    let mut frame = noise(90, 90, 0, 255, 22);
    let tpl_view = tallymatch::ImageView::from_slice(tpl.as_bytes(), 20, 20).unwrap();
    let enlarged = gray_to_image(resize_area(tpl_view, 26, 26).unwrap());
    paste(&mut frame, &enlarged, 30, 41);

    let steps = 20;
    let found = detect_multi_scale(&frame, Some(&tpl), 0.98, (0.5, 1.5), steps)
        .unwrap()
        .unwrap();
    let step_width = 1.0 / (steps - 1) as f64;
    assert!((found.scale - 1.3).abs() <= step_width, "scale {}", found.scale);
    assert!(found.detection.score >= 0.98);
    assert_eq!(
        (found.detection.top_left.x, found.detection.top_left.y),
        (30, 41)
    );
    assert_eq!(found.detection.width(), 26);
}

#[test]
fn multi_scale_below_threshold_reports_nothing() {
    let tpl = noise(12, 12, 0, 255, 31);
    let frame = noise(50, 50, 0, 255, 32);
    let found = detect_multi_scale(&frame, Some(&tpl), 0.9, (0.5, 1.5), 10).unwrap();
    assert!(found.is_none());
}

#[test]
fn multi_scale_tie_keeps_first_scale() {
    let tpl = Image::filled(10, 10, PixelLayout::Gray, &[120]).unwrap();
    let frame = Image::filled(40, 40, PixelLayout::Gray, &[120]).unwrap();
    let found = detect_multi_scale(&frame, Some(&tpl), 0.5, (0.5, 1.5), 5)
        .unwrap()
        .unwrap();
    assert_eq!(found.scale, 0.5);
    assert_eq!(found.detection.score, 1.0);
    assert_eq!(found.detection.width(), 5);
}

fn multi_params(threshold: f32, max: usize) -> MultiParams {
    MultiParams {
        threshold,
        max_detections: max,
        nms: true,
        overlap_threshold: 0.3,
        order: InstanceOrder::ScanOrder,
    }
}

#[test]
fn multi_instance_respects_max_detections() {
    let tpl = noise(8, 8, 0, 255, 41);
    let mut frame = noise(80, 60, 0, 255, 42);
    for &(x, y) in &[(2, 3), (30, 5), (60, 10), (10, 40), (45, 45)] {
        paste(&mut frame, &tpl, x, y);
    }

    let all = detect_multiple(&frame, Some(&tpl), multi_params(0.99, 10))
        .unwrap()
        .unwrap();
    assert_eq!(all.len(), 5);

    let capped = detect_multiple(&frame, Some(&tpl), multi_params(0.99, 2))
        .unwrap()
        .unwrap();
    assert_eq!(capped.len(), 2);
}

#[test]
fn multi_instance_without_qualifying_cells_is_empty() {
    let tpl = noise(8, 8, 0, 255, 51);
    let frame = noise(40, 40, 0, 255, 52);
    let found = detect_multiple(&frame, Some(&tpl), multi_params(0.95, 5))
        .unwrap()
        .unwrap();
    assert!(found.is_empty());
}

#[test]
fn solid_square_end_to_end() {
    let mut frame = Image::filled(100, 100, PixelLayout::Gray, &[0]).unwrap();
    let square = Image::filled(10, 10, PixelLayout::Gray, &[200]).unwrap();
    paste(&mut frame, &square, 40, 40);

    let det = detect_single(&frame, Some(&square)).unwrap().unwrap();
    assert_eq!((det.top_left.x, det.top_left.y), (40, 40));
    assert_eq!((det.bottom_right.x, det.bottom_right.y), (50, 50));
    assert!((det.score - 1.0).abs() < 1e-4);
}

#[test]
fn oversized_template_is_shrunk_not_rejected() {
    let frame = noise(20, 20, 0, 255, 61);
    let tpl = noise(50, 50, 0, 255, 62);
    let det = detect_single(&frame, Some(&tpl)).unwrap().unwrap();
    assert_eq!((det.top_left.x, det.top_left.y), (0, 0));
    assert_eq!((det.bottom_right.x, det.bottom_right.y), (20, 20));

    let many = detect_multiple(&frame, Some(&tpl), multi_params(-1.0, 5))
        .unwrap()
        .unwrap();
    assert_eq!(many.len(), 1);
}

#[test]
fn nan_threshold_is_an_error() {
    let frame = noise(20, 20, 0, 255, 71);
    let tpl = frame.crop(2, 2, 5, 5).unwrap();
    let err = detect_multiple(&frame, Some(&tpl), multi_params(f32::NAN, 5)).unwrap_err();
    assert!(matches!(err, TallyMatchError::InvalidInput(_)));
}

#[test]
fn instance_order_decides_which_match_survives_truncation() {
    let tpl = noise(10, 10, 0, 255, 81);
    let mut frame = noise(70, 50, 0, 255, 82);
    let bumps = noise(10, 10, 0, 30, 83);
    let mut dimmer = tpl.clone();
    for y in 0..10 {
        for x in 0..10 {
            let v = tpl.pixel(x, y).unwrap()[0];
            let b = bumps.pixel(x, y).unwrap()[0];
            dimmer.put_pixel(x, y, &[v.saturating_add(b)]);
        }
    }
    paste(&mut frame, &dimmer, 4, 5);
    paste(&mut frame, &tpl, 40, 30);

    let params = |order| MultiParams {
        threshold: 0.9,
        max_detections: 1,
        nms: false,
        overlap_threshold: 0.3,
        order,
    };
    let both = detect_multiple(
        &frame,
        Some(&tpl),
        MultiParams {
            max_detections: 10,
            ..params(InstanceOrder::ScanOrder)
        },
    )
    .unwrap()
    .unwrap();
    assert_eq!(both.len(), 2);
    assert!(both[0].score < both[1].score);

    let scan = detect_multiple(&frame, Some(&tpl), params(InstanceOrder::ScanOrder))
        .unwrap()
        .unwrap();
    assert_eq!((scan[0].top_left.x, scan[0].top_left.y), (4, 5));

    let best = detect_multiple(&frame, Some(&tpl), params(InstanceOrder::ScoreDesc))
        .unwrap()
        .unwrap();
    assert_eq!((best[0].top_left.x, best[0].top_left.y), (40, 30));
    assert!(best[0].score > 0.999);
}
