//! Migration scripts
//!
//! File naming, the on-disk catalog and the next-script state machine.

pub mod catalog;
pub mod filename;
pub mod naming;
pub mod next;
pub mod options;

pub use catalog::ScriptCatalog;
pub use filename::{Direction, ScriptFile};
pub use naming::{ScriptNaming, VersionType};
pub use next::{
    decide, next_script_info, next_script_info_at, MigrateState, NextScriptInfo, ScriptAction,
    StdinConfirm, WriteConfirm,
};
pub use options::ScriptOptions;
