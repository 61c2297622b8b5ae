//! Command pipeline
//!
//! Turns the operator's argument list into default-device assignments:
//! raw args -> Token -> Compiler -> CompiledCommands -> Dispatcher -> Vec<Applied>

pub mod compiler;
pub mod dispatcher;
pub mod token;

pub use compiler::{
    compile, compile_with, parse_invocation, Command, CompileOptions, CompiledCommands, Compiler,
    Invocation,
};
pub use dispatcher::{Applied, DispatchResult, Dispatcher, FailurePolicy};
pub use token::{Arg, Token};
