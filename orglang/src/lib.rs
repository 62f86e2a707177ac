//! OrgLang umbrella crate.
//!
//! Re-exports the front end ([`org_syntax`]) and the value core
//! ([`org_values`]) and adds the source-file plumbing shared by the CLI
//! subcommands. The evaluator and code generator are downstream consumers
//! of these pieces, not part of this crate.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod literal;
pub mod source;

#[doc(no_inline)]
pub use org_syntax;
#[doc(no_inline)]
pub use org_values;

pub mod prelude {
    //! Common surface for embedding the front end and value core.
    #[doc(no_inline)]
    pub use org_syntax::{
        Binding, BindingTable, Expr, Lexer, ParseError, Parser, Program, Token, TokenKind,
    };
    #[doc(no_inline)]
    pub use org_values::{Addr, Arena, Checkpoint, HeapKind, Table, Value};

    pub use crate::source::{Source, SourceError};
}
