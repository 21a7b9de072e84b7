pub mod comparator;
pub mod engine;
pub mod lister;
pub mod operation;
pub mod scanner;

#[cfg(test)]
pub(crate) mod testing;

pub use comparator::{FileComparator, FileRelation, RemoteState};
pub use engine::{Credentials, SyncConfig, SyncEngine, SyncReport};
pub use lister::{EntryMap, RemoteEntry, RemoteTree, RemoteTreeLister};
pub use operation::{join_remote, normalize_path, OperationKind, SyncOperation};
pub use scanner::{EntryFilter, FsTree, LocalEntries, LocalEntry, LocalTree, ScanConfig};
