pub mod ast;
pub mod executor;

pub use ast::{Command, CommandTree, Node};
pub use executor::{ExecError, Executor, EX_OSERR, FAILURE, SUCCESS};
