//! Application state: the current template, the tally and the detector.
//!
//! A [`Session`] replaces the process-wide template/count globals of a GUI
//! application with one owned value. Stores are injected so tests can run
//! entirely in memory.

use crate::image::Image;
use crate::search::{check_threshold, Detection, Detector, ScaledDetection};
use crate::source::FrameSource;
use crate::store::{CountStore, TemplateStore};
use crate::template::{Roi, Template};
use crate::trace::{trace_event, trace_span};
use crate::util::TallyMatchResult;

/// Result of processing one frame from a [`FrameSource`].
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// The frame that was scored.
    pub frame: Image,
    /// Best single-scale match, `None` when no template is set.
    pub detection: Option<Detection>,
    /// Whether the best score exceeds the session threshold.
    pub present: bool,
}

/// Owned template + tally state backed by two stores.
#[derive(Debug)]
pub struct Session<T, C> {
    templates: T,
    counts: C,
    template: Option<Template>,
    count: u64,
    detector: Detector,
}

impl<T: TemplateStore, C: CountStore> Session<T, C> {
    /// Loads the persisted template and count.
    pub fn open(templates: T, counts: C) -> Self {
        let template = templates.load();
        let count = counts.load();
        trace_event!(
            "session_open",
            has_template = template.is_some(),
            count = count
        );
        Self {
            templates,
            counts,
            template,
            count,
            detector: Detector::new(),
        }
    }

    /// Replaces the detector configuration.
    pub fn with_detector(mut self, detector: Detector) -> Self {
        self.detector = detector;
        self
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn threshold(&self) -> f32 {
        self.detector.config().threshold
    }

    /// Sets the match threshold; NaN is rejected and leaves the old value.
    pub fn set_threshold(&mut self, threshold: f32) -> TallyMatchResult<()> {
        check_threshold(threshold)?;
        self.detector.config_mut().threshold = threshold;
        Ok(())
    }

    /// Cuts `roi` from `frame`, persists it and makes it current.
    ///
    /// On error the previous template stays in place.
    pub fn capture_template(&mut self, frame: &Image, roi: Roi) -> TallyMatchResult<&Template> {
        let template = Template::capture(frame, roi)?;
        self.templates.save(&template)?;
        trace_event!(
            "template_captured",
            x1 = roi.x1,
            y1 = roi.y1,
            x2 = roi.x2,
            y2 = roi.y2
        );
        Ok(self.template.insert(template))
    }

    /// Adds one to the tally and persists it.
    pub fn increment(&mut self) -> TallyMatchResult<u64> {
        self.count = self.count.saturating_add(1);
        self.counts.save(self.count)?;
        Ok(self.count)
    }

    /// Adds `n` to the tally (saturating) and persists it once.
    pub fn add(&mut self, n: u64) -> TallyMatchResult<u64> {
        self.count = self.count.saturating_add(n);
        self.counts.save(self.count)?;
        Ok(self.count)
    }

    /// Sets the tally back to zero and persists it.
    pub fn reset(&mut self) -> TallyMatchResult<()> {
        self.count = 0;
        self.counts.save(0)
    }

    /// Persists the tally one last time and hands the stores back.
    pub fn shutdown(mut self) -> TallyMatchResult<(T, C)> {
        self.counts.save(self.count)?;
        Ok((self.templates, self.counts))
    }

    fn template_image(&self) -> Option<&Image> {
        self.template.as_ref().map(Template::image)
    }

    /// Best single-scale match of the current template.
    pub fn detect(&self, frame: &Image) -> TallyMatchResult<Option<Detection>> {
        self.detector.detect(frame, self.template_image())
    }

    /// Best match over the configured scale grid.
    pub fn detect_multi_scale(&self, frame: &Image) -> TallyMatchResult<Option<ScaledDetection>> {
        self.detector.detect_multi_scale(frame, self.template_image())
    }

    /// Every separated match above the threshold.
    pub fn detect_multiple(&self, frame: &Image) -> TallyMatchResult<Option<Vec<Detection>>> {
        self.detector.detect_multiple(frame, self.template_image())
    }

    /// `true` when `detection` clears the session threshold.
    pub fn is_present(&self, detection: Option<&Detection>) -> bool {
        detection.is_some_and(|d| d.score > self.threshold())
    }

    /// Pulls one frame and scores it at native template size.
    ///
    /// Returns `Ok(None)` when the source has nothing for this tick.
    pub fn process_frame<S>(&self, source: &mut S) -> TallyMatchResult<Option<FrameReport>>
    where
        S: FrameSource + ?Sized,
    {
        let _span = trace_span!("process_frame").entered();
        let Some(frame) = source.read() else {
            return Ok(None);
        };
        let detection = self.detect(&frame)?;
        let present = self.is_present(detection.as_ref());
        Ok(Some(FrameReport {
            frame,
            detection,
            present,
        }))
    }
}
