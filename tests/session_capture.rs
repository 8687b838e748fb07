use tallymatch::{
    CaptureOutcome, CaptureState, CountStore, Image, MemoryCountStore, MemoryTemplateStore,
    PixelLayout, PointerEvent, QueueSource, Roi, RoiSelector, Session, TallyMatchError,
    TemplateStore,
};

fn textured_frame(width: usize, height: usize) -> Image {
    let data = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            ((x * 13) ^ (y * 7) ^ (x * y)) as u8
        })
        .collect();
    Image::new(data, width, height, PixelLayout::Gray).unwrap()
}

#[test]
fn selector_drag_release_yields_clamped_roi() {
    let mut sel = RoiSelector::new(64, 48);
    sel.handle(PointerEvent::Down { x: 70, y: -5 });
    sel.handle(PointerEvent::Move { x: 40, y: 10 });
    let outcome = sel.handle(PointerEvent::Up { x: 20, y: 30 });
    let expected = Roi {
        x1: 20,
        y1: 0,
        x2: 64,
        y2: 30,
    };
    assert_eq!(outcome, CaptureOutcome::Captured(expected));
    assert_eq!(sel.state(), CaptureState::Captured(expected));
}

#[test]
fn selector_rejects_click_without_drag() {
    let mut sel = RoiSelector::new(64, 48);
    sel.handle(PointerEvent::Down { x: 10, y: 10 });
    let outcome = sel.handle(PointerEvent::Up { x: 10, y: 25 });
    assert!(matches!(
        outcome,
        CaptureOutcome::Rejected(TallyMatchError::InvalidRoi { .. })
    ));
    assert_eq!(sel.state(), CaptureState::Idle);
}

#[test]
fn selector_ignores_release_while_idle_and_honours_cancel() {
    let mut sel = RoiSelector::new(64, 48);
    assert_eq!(
        sel.handle(PointerEvent::Up { x: 5, y: 5 }),
        CaptureOutcome::Pending
    );
    assert_eq!(sel.state(), CaptureState::Idle);

    sel.handle(PointerEvent::Down { x: 1, y: 1 });
    sel.handle(PointerEvent::Cancel);
    assert_eq!(sel.state(), CaptureState::Idle);
    assert!(sel.preview().is_none());
}

#[test]
fn captured_region_is_found_in_the_next_frame() {
    let frame = textured_frame(80, 60);
    let mut sel = RoiSelector::new(frame.width(), frame.height());
    sel.handle(PointerEvent::Down { x: 33, y: 21 });
    let CaptureOutcome::Captured(roi) = sel.handle(PointerEvent::Up { x: 51, y: 35 }) else {
        panic!("expected a capture");
    };

    let mut session = Session::open(MemoryTemplateStore::new(), MemoryCountStore::new(0));
    session.capture_template(&frame, roi).unwrap();

    let mut source = QueueSource::new();
    source.push(frame.clone());
    let report = session.process_frame(&mut source).unwrap().unwrap();
    let det = report.detection.unwrap();
    assert_eq!((det.top_left.x, det.top_left.y), (33, 21));
    assert_eq!((det.bottom_right.x, det.bottom_right.y), (51, 35));
    assert!(report.present);
    assert!(session.process_frame(&mut source).unwrap().is_none());
}

#[test]
fn failed_capture_keeps_previous_template() {
    let frame = textured_frame(40, 30);
    let mut session = Session::open(MemoryTemplateStore::new(), MemoryCountStore::new(0));
    let first = Roi::from_coords([2, 2, 12, 12]).unwrap();
    session.capture_template(&frame, first).unwrap();

    let outside = Roi {
        x1: 35,
        y1: 25,
        x2: 50,
        y2: 40,
    };
    assert!(session.capture_template(&frame, outside).is_err());
    assert_eq!(session.template().unwrap().roi(), first);
}

#[test]
fn session_restores_state_from_stores() {
    let frame = textured_frame(40, 30);
    let mut templates = MemoryTemplateStore::new();
    let mut counts = MemoryCountStore::new(7);
    {
        let mut session = Session::open(&mut templates, &mut counts);
        assert_eq!(session.count(), 7);
        let roi = Roi::from_coords([5, 5, 15, 20]).unwrap();
        session.capture_template(&frame, roi).unwrap();
        session.increment().unwrap();
        session.increment().unwrap();
        session.shutdown().unwrap();
    }
    assert_eq!(counts.load(), 9);
    let restored = templates.load().unwrap();
    assert_eq!(restored.image().width(), 10);
    assert_eq!(restored.image().height(), 15);
}

#[cfg(feature = "image-io")]
mod files {
    use super::textured_frame;
    use std::fs;
    use std::path::PathBuf;
    use tallymatch::{
        CountStore, FileCountStore, FileTemplateStore, Roi, Session, TemplateStore,
    };

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tallymatch-it-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn template_and_count_survive_a_restart() {
        let dir = scratch_dir("restart");
        let frame = textured_frame(48, 36);
        let roi = Roi::from_coords([4, 6, 20, 18]).unwrap();
        {
            let mut session = Session::open(
                FileTemplateStore::new(dir.join("templates")),
                FileCountStore::new(dir.join("object_count.json")),
            );
            session.capture_template(&frame, roi).unwrap();
            session.increment().unwrap();
            session.shutdown().unwrap();
        }

        let info = fs::read_to_string(dir.join("templates/template_info.json")).unwrap();
        let info: serde_json::Value = serde_json::from_str(&info).unwrap();
        assert_eq!(info["roi_coords"], serde_json::json!([4, 6, 20, 18]));

        let session = Session::open(
            FileTemplateStore::new(dir.join("templates")),
            FileCountStore::new(dir.join("object_count.json")),
        );
        assert_eq!(session.count(), 1);
        assert_eq!(session.template().unwrap().roi(), roi);
        let det = session.detect(&frame).unwrap().unwrap();
        assert_eq!((det.top_left.x, det.top_left.y), (4, 6));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_files_fall_back_to_defaults() {
        let dir = scratch_dir("corrupt");
        fs::create_dir_all(dir.join("templates")).unwrap();
        fs::write(dir.join("object_count.json"), "{not json").unwrap();
        fs::write(dir.join("templates/template.png"), b"garbage").unwrap();
        fs::write(dir.join("templates/template_info.json"), "{}").unwrap();

        assert_eq!(FileCountStore::new(dir.join("object_count.json")).load(), 0);
        assert!(FileTemplateStore::new(dir.join("templates")).load().is_none());
        let _ = fs::remove_dir_all(&dir);
    }
}
