/// Report layer: turns the tool's text output into typed records.
pub mod block;
pub mod detail;
pub mod inventory;
pub mod kinds;
pub mod lines;
pub mod record;
pub mod select;

pub use kinds::{DiskInfo, GroupInfo, NetworkInfo, NetworkKind, SystemProperties, VmEntry, VmInfo};
pub use record::FieldValue;
pub use select::{Miss, Selector, select, select_disks};
