//! Candidate boxes and overlap pruning for multi-instance detection.

pub(crate) mod nms;
