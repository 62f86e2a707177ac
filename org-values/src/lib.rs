//! OrgLang value core: arena allocation, tagged value words, heap objects,
//! promotion-aware arithmetic, and the hybrid hash/array table.
//!
//! Everything a running OrgLang program touches is a [`Value`]: a 64-bit
//! word that is either an inline small integer, one of four reserved
//! singletons, or the address of a heap object owned by an [`Arena`].
//! Arenas are bump allocators; memory is reclaimed only by rewinding to a
//! checkpoint or dropping the arena.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod arena;
pub mod fmt;
pub mod heap;
pub mod num;
pub mod table;
mod word;

pub use arena::{Addr, Arena, Checkpoint};
pub use heap::HeapKind;
pub use table::Table;
pub use word::{Value, SMALL_INT_MAX, SMALL_INT_MIN};
