//! Frame sources.
//!
//! A source hands out fully materialized frames one at a time. `None` means
//! no frame is available right now (camera stopped, stream ended); callers
//! skip that tick rather than treating it as an error.

use crate::image::Image;
use std::collections::VecDeque;

/// Producer of camera frames.
pub trait FrameSource {
    /// Returns the next frame, or `None` when nothing is available.
    fn read(&mut self) -> Option<Image>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Option<Image>,
{
    fn read(&mut self) -> Option<Image> {
        self()
    }
}

/// Replays frames pushed into an in-memory queue.
#[derive(Clone, Debug, Default)]
pub struct QueueSource {
    frames: VecDeque<Image>,
}

impl QueueSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Image) {
        self.frames.push_back(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FromIterator<Image> for QueueSource {
    fn from_iter<I: IntoIterator<Item = Image>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl FrameSource for QueueSource {
    fn read(&mut self) -> Option<Image> {
        self.frames.pop_front()
    }
}

#[cfg(feature = "image-io")]
pub use directory::DirectorySource;

#[cfg(feature = "image-io")]
mod directory {
    use super::FrameSource;
    use crate::image::io::load_image;
    use crate::image::Image;
    use crate::trace::trace_warn;
    use crate::util::{TallyMatchError, TallyMatchResult};
    use std::fs;
    use std::path::{Path, PathBuf};

    const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

    /// Replays the image files of a directory in lexical file-name order.
    ///
    /// Files that fail to decode are skipped with a warning.
    #[derive(Clone, Debug)]
    pub struct DirectorySource {
        paths: Vec<PathBuf>,
        next: usize,
    }

    impl DirectorySource {
        pub fn open(dir: impl AsRef<Path>) -> TallyMatchResult<Self> {
            let dir = dir.as_ref();
            let entries = fs::read_dir(dir).map_err(|e| TallyMatchError::Storage {
                reason: format!("list {}: {e}", dir.display()),
            })?;
            let mut paths: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    path.extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| {
                            FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
                        })
                })
                .collect();
            paths.sort();
            Ok(Self { paths, next: 0 })
        }

        /// Path of the frame most recently returned by `read`.
        pub fn current_path(&self) -> Option<&Path> {
            self.next
                .checked_sub(1)
                .and_then(|idx| self.paths.get(idx))
                .map(PathBuf::as_path)
        }

        pub fn remaining(&self) -> usize {
            self.paths.len() - self.next
        }
    }

    impl FrameSource for DirectorySource {
        fn read(&mut self) -> Option<Image> {
            while let Some(path) = self.paths.get(self.next) {
                self.next += 1;
                match load_image(path) {
                    Ok(frame) => return Some(frame),
                    Err(err) => {
                        trace_warn!("skipping frame {}: {}", path.display(), err);
                    }
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameSource, QueueSource};
    use crate::image::{Image, PixelLayout};

    #[test]
    fn queue_drains_in_order_then_reports_absence() {
        let a = Image::filled(2, 2, PixelLayout::Gray, &[1]).unwrap();
        let b = Image::filled(2, 2, PixelLayout::Gray, &[2]).unwrap();
        let mut src: QueueSource = vec![a.clone(), b.clone()].into_iter().collect();
        assert_eq!(src.read(), Some(a));
        assert_eq!(src.read(), Some(b));
        assert_eq!(src.read(), None);
    }

    #[test]
    fn closures_act_as_sources() {
        let mut ticks = 0;
        let mut src = || {
            ticks += 1;
            (ticks == 2).then(|| Image::filled(1, 1, PixelLayout::Gray, &[0]).unwrap())
        };
        assert!(FrameSource::read(&mut src).is_none());
        assert!(FrameSource::read(&mut src).is_some());
    }
}
