//! File-backed stores.
//!
//! The template lives in a directory as `template.png` plus a
//! `template_info.json` sidecar holding `{"roi_coords": [x1, y1, x2, y2]}`.
//! The tally is a JSON object `{"count": n}`.

use crate::image::io::{load_image, save_image};
use crate::store::{CountStore, TemplateStore};
use crate::template::{Roi, Template};
use crate::trace::trace_warn;
use crate::util::{TallyMatchError, TallyMatchResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const TEMPLATE_FILENAME: &str = "template.png";
const TEMPLATE_INFO_FILENAME: &str = "template_info.json";

#[derive(Debug, Serialize, Deserialize)]
struct TemplateInfo {
    roi_coords: [i64; 4],
}

#[derive(Debug, Serialize, Deserialize)]
struct CountRecord {
    #[serde(default)]
    count: u64,
}

fn storage_err(context: &str, path: &Path, err: impl std::fmt::Display) -> TallyMatchError {
    TallyMatchError::Storage {
        reason: format!("{context} {}: {err}", path.display()),
    }
}

/// Template store rooted at a directory.
#[derive(Clone, Debug)]
pub struct FileTemplateStore {
    dir: PathBuf,
}

impl FileTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn image_path(&self) -> PathBuf {
        self.dir.join(TEMPLATE_FILENAME)
    }

    pub fn info_path(&self) -> PathBuf {
        self.dir.join(TEMPLATE_INFO_FILENAME)
    }

    /// True when both the image and its sidecar exist.
    pub fn exists(&self) -> bool {
        self.image_path().is_file() && self.info_path().is_file()
    }

    fn try_load(&self) -> TallyMatchResult<Template> {
        let info_path = self.info_path();
        let text =
            fs::read_to_string(&info_path).map_err(|e| storage_err("read", &info_path, e))?;
        let info: TemplateInfo =
            serde_json::from_str(&text).map_err(|e| storage_err("parse", &info_path, e))?;
        let roi = Roi::from_coords(info.roi_coords)?;
        let image = load_image(self.image_path())?;
        Ok(Template::new(image, roi))
    }
}

impl TemplateStore for FileTemplateStore {
    fn load(&self) -> Option<Template> {
        if !self.exists() {
            return None;
        }
        match self.try_load() {
            Ok(template) => Some(template),
            Err(err) => {
                trace_warn!("ignoring unreadable template in {}: {}", self.dir.display(), err);
                None
            }
        }
    }

    fn save(&mut self, template: &Template) -> TallyMatchResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| storage_err("create", &self.dir, e))?;
        save_image(template.image(), self.image_path())?;

        let [x1, y1, x2, y2] = template.roi().coords();
        let info = TemplateInfo {
            roi_coords: [x1 as i64, y1 as i64, x2 as i64, y2 as i64],
        };
        let info_path = self.info_path();
        let json = serde_json::to_string(&info).map_err(|e| storage_err("encode", &info_path, e))?;
        fs::write(&info_path, json).map_err(|e| storage_err("write", &info_path, e))
    }
}

/// Count store backed by a single JSON file.
#[derive(Clone, Debug)]
pub struct FileCountStore {
    path: PathBuf,
}

impl FileCountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CountStore for FileCountStore {
    fn load(&self) -> u64 {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => return 0,
        };
        match serde_json::from_str::<CountRecord>(&text) {
            Ok(record) => record.count,
            Err(err) => {
                trace_warn!("resetting unreadable count in {}: {}", self.path.display(), err);
                0
            }
        }
    }

    fn save(&mut self, count: u64) -> TallyMatchResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage_err("create", parent, e))?;
        }
        let json = serde_json::to_string(&CountRecord { count })
            .map_err(|e| storage_err("encode", &self.path, e))?;
        fs::write(&self.path, json).map_err(|e| storage_err("write", &self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::{FileCountStore, FileTemplateStore};
    use crate::image::{Image, PixelLayout};
    use crate::store::{CountStore, TemplateStore};
    use crate::template::{Roi, Template};
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tallymatch-store-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn template_round_trips_through_directory() {
        let dir = scratch_dir("template");
        let mut store = FileTemplateStore::new(&dir);
        assert!(store.load().is_none());

        let mut img = Image::filled(4, 3, PixelLayout::Rgb, &[10, 20, 30]).unwrap();
        img.put_pixel(1, 1, &[200, 100, 50]);
        let template = Template::new(img, Roi::from_coords([5, 6, 9, 9]).unwrap());
        store.save(&template).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.roi(), template.roi());
        assert_eq!(loaded.image().pixel(1, 1), Some(&[200u8, 100, 50][..]));

        let info = fs::read_to_string(store.info_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&info).unwrap();
        assert_eq!(value["roi_coords"], serde_json::json!([5, 6, 9, 9]));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_sidecar_reads_as_missing() {
        let dir = scratch_dir("corrupt");
        let mut store = FileTemplateStore::new(&dir);
        let img = Image::filled(2, 2, PixelLayout::Gray, &[9]).unwrap();
        store
            .save(&Template::new(img, Roi::from_coords([0, 0, 2, 2]).unwrap()))
            .unwrap();
        fs::write(store.info_path(), "{not json").unwrap();
        assert!(store.load().is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn count_defaults_to_zero_and_persists() {
        let dir = scratch_dir("count");
        let mut store = FileCountStore::new(dir.join("object_count.json"));
        assert_eq!(store.load(), 0);
        store.save(7).unwrap();
        assert_eq!(store.load(), 7);
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            r#"{"count":7}"#
        );

        fs::write(store.path(), "garbage").unwrap();
        assert_eq!(store.load(), 0);
        let _ = fs::remove_dir_all(&dir);
    }
}
