//! Provisioning of the id store. Never used on the extraction path.

mod init;

pub use init::{open_for_provisioning, run_sql_script, ScriptReport};
