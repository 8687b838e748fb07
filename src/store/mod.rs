//! Persistence seams for the captured template and the tally.
//!
//! Loading never fails: a missing or unreadable template is "no template"
//! and a missing or corrupt count is zero, so the application stays usable
//! after on-disk corruption. Saving reports errors to the caller.

#[cfg(feature = "image-io")]
mod file;

#[cfg(feature = "image-io")]
pub use file::{FileCountStore, FileTemplateStore};

use crate::template::Template;
use crate::util::TallyMatchResult;

/// Load/save contract for the single persisted template.
pub trait TemplateStore {
    /// Returns the stored template, or `None` if absent or unreadable.
    fn load(&self) -> Option<Template>;

    /// Replaces the stored template.
    fn save(&mut self, template: &Template) -> TallyMatchResult<()>;
}

/// Load/save contract for the persisted tally.
pub trait CountStore {
    /// Returns the stored count, or `0` if absent or unreadable.
    fn load(&self) -> u64;

    /// Replaces the stored count.
    fn save(&mut self, count: u64) -> TallyMatchResult<()>;
}

/// In-process template store.
#[derive(Clone, Debug, Default)]
pub struct MemoryTemplateStore {
    slot: Option<Template>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `template` already stored.
    pub fn with_template(template: Template) -> Self {
        Self {
            slot: Some(template),
        }
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn load(&self) -> Option<Template> {
        self.slot.clone()
    }

    fn save(&mut self, template: &Template) -> TallyMatchResult<()> {
        self.slot = Some(template.clone());
        Ok(())
    }
}

/// In-process count store.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryCountStore {
    value: u64,
}

impl MemoryCountStore {
    pub fn new(value: u64) -> Self {
        Self { value }
    }
}

impl CountStore for MemoryCountStore {
    fn load(&self) -> u64 {
        self.value
    }

    fn save(&mut self, count: u64) -> TallyMatchResult<()> {
        self.value = count;
        Ok(())
    }
}

impl<S: TemplateStore + ?Sized> TemplateStore for &mut S {
    fn load(&self) -> Option<Template> {
        (**self).load()
    }

    fn save(&mut self, template: &Template) -> TallyMatchResult<()> {
        (**self).save(template)
    }
}

impl<S: CountStore + ?Sized> CountStore for &mut S {
    fn load(&self) -> u64 {
        (**self).load()
    }

    fn save(&mut self, count: u64) -> TallyMatchResult<()> {
        (**self).save(count)
    }
}
