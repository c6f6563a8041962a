//! Resolution of import specifiers against a project tree.
//!
//! Specifiers come in three shapes: alias-prefixed ("@/components/Nav"),
//! relative ("../lib/dates"), and package references ("lodash"). The first
//! two are probed against the filesystem with the configured extension
//! list; package references are classified without touching the disk.

mod alias;
mod exists_cache;
mod extensions;
mod resolver;

pub use alias::AliasTable;
pub use exists_cache::ExistenceCache;
pub use extensions::{ExtensionFilter, DEFAULT_EXTENSIONS};
pub use resolver::{ResolvedSpecifier, SpecifierResolver};
