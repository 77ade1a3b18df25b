//! Storage Module
//!
//! Datafiles on disk and the policy deciding where writes go.
//!
//! ## Responsibilities
//! - Name datafiles by a strictly increasing numeric id
//! - List datafiles oldest → newest (numeric order, never string order)
//! - Pick the active datafile, rotating once it exceeds the size threshold
//! - Clear the data directory (bootstrap/teardown)
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   ├── 000000.data        (oldest)
//!   ├── 000001.data
//!   ├── 000002.data        (active: highest id)
//!   └── 000001.data.merge  (merge output not yet installed)
//! ```

mod datafile;
mod manager;

pub use datafile::{Datafile, DatafileId, DATAFILE_EXTENSION, STAGING_EXTENSION};
pub use manager::DatafileManager;
