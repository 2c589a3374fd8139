#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod storage;

pub use error::FeOxDbError;
pub use storage::{FeOxDbStorage, FeOxDbStorageBuilder};
