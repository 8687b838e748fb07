use tallymatch::lowlevel::{resize_area, TemplatePlan};
use tallymatch::{fit_within, Image, ImageView, OwnedImage, PixelLayout, TallyMatchError};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        TallyMatchError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = ImageView::from_slice(&data, 1, 0).err().unwrap();
    assert_eq!(
        err,
        TallyMatchError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        TallyMatchError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, TallyMatchError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn image_view_roi_matches_expected_values() {
    let data: Vec<u8> = (0u8..16).collect();
    let view = ImageView::from_slice(&data, 4, 4).unwrap();

    let roi = view.roi(1, 1, 2, 2).unwrap();
    assert_eq!((roi.width(), roi.height(), roi.stride()), (2, 2, 4));
    assert_eq!(roi.row(0).unwrap(), &[5u8, 6u8]);
    assert_eq!(roi.row(1).unwrap(), &[9u8, 10u8]);
    assert!(roi.get(2, 0).is_none());

    let err = view.roi(3, 3, 2, 2).err().unwrap();
    assert_eq!(
        err,
        TallyMatchError::RoiOutOfBounds {
            x: 3,
            y: 3,
            width: 2,
            height: 2,
            img_width: 4,
            img_height: 4,
        }
    );
}

#[test]
fn color_frames_reduce_to_luma() {
    let bgr = Image::from_raw_channels(vec![0, 0, 255, 255, 0, 0], 2, 1, 3).unwrap();
    assert_eq!(bgr.layout(), PixelLayout::Bgr);
    let gray = bgr.to_gray();
    // Pure red then pure blue with 0.299 / 0.114 weights.
    assert_eq!(gray.data(), &[76, 29]);

    let err = Image::from_raw_channels(vec![0; 8], 2, 1, 4).unwrap_err();
    assert_eq!(err, TallyMatchError::InvalidChannels { channels: 4 });
}

#[test]
fn crop_copies_the_requested_block() {
    let img = Image::new((0u8..12).collect(), 4, 3, PixelLayout::Gray).unwrap();
    let patch = img.crop(1, 1, 2, 2).unwrap();
    assert_eq!(patch.as_bytes(), &[5, 6, 9, 10]);
    assert!(img.crop(3, 2, 2, 2).is_err());
}

#[test]
fn template_plan_matches_known_stats() {
    let tpl = OwnedImage::new(vec![0u8, 1, 2, 3], 2, 2).unwrap();
    let plan = TemplatePlan::from_view(tpl.view()).unwrap();

    assert_eq!((plan.width(), plan.height(), plan.len()), (2, 2, 4));
    assert!((plan.mean() - 1.5).abs() < 1e-6);
    assert!(!plan.is_flat());
    assert!((plan.energy() - 5.0).abs() < 1e-9);

    let expected_zero_mean = [-1.5f32, -0.5, 0.5, 1.5];
    for (value, expected) in plan.zero_mean().iter().zip(expected_zero_mean.iter()) {
        assert!((value - expected).abs() < 1e-6);
    }
}

#[test]
fn flat_template_plan_is_accepted() {
    let tpl = OwnedImage::filled(3, 2, 5).unwrap();
    let plan = TemplatePlan::from_view(tpl.view()).unwrap();
    assert!(plan.is_flat());
    assert_eq!(plan.energy(), 0.0);
}

#[test]
fn area_resize_preserves_constant_images() {
    let src = OwnedImage::filled(9, 7, 123).unwrap();
    for &(w, h) in &[(3, 2), (9, 7), (20, 15)] {
        let out = resize_area(src.view(), w, h).unwrap();
        assert_eq!((out.width(), out.height()), (w, h));
        assert!(out.data().iter().all(|&v| v == 123));
    }
}

#[test]
fn display_fit_keeps_aspect_ratio() {
    let frame = Image::filled(1600, 900, PixelLayout::Rgb, &[1, 2, 3]).unwrap();
    let shown = fit_within(&frame, 800, 600).unwrap();
    assert_eq!((shown.width(), shown.height()), (800, 450));
    assert_eq!(shown.pixel(0, 0).unwrap(), &[1, 2, 3]);

    let small = Image::filled(320, 240, PixelLayout::Gray, &[9]).unwrap();
    assert_eq!(fit_within(&small, 800, 600).unwrap(), small);
}
