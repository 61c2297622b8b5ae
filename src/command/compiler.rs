//! Command compiler - folds a token stream into per-direction command lists
//!
//! The grammar is flag-driven: direction and role flags accumulate into an
//! in-progress command, and each device-name pattern closes it. A closed
//! command is appended to the list for its direction and the accumulator
//! starts over empty.

use crate::command::token::{Arg, Token};
use crate::core::error::CompileError;
use crate::core::types::{Direction, Field, Role};

/// One unit of operator intent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub direction: Option<Direction>,
    pub role: Option<Role>,
    pub pattern: Option<String>,
}

impl Command {
    /// A complete command
    pub fn new(direction: Direction, role: Option<Role>, pattern: impl Into<String>) -> Self {
        Self {
            direction: Some(direction),
            role,
            pattern: Some(pattern.into()),
        }
    }

    /// Usable for dispatch: both direction and pattern are present
    pub fn is_complete(&self) -> bool {
        self.direction.is_some() && self.pattern.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.direction.is_none() && self.role.is_none() && self.pattern.is_none()
    }

    /// Case-sensitive substring match against a device name
    pub fn matches(&self, device_name: &str) -> bool {
        match (&self.direction, &self.pattern) {
            (Some(_), Some(pattern)) => device_name.contains(pattern.as_str()),
            _ => false,
        }
    }
}

/// Completed commands, one ordered list per direction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledCommands {
    pub input: Vec<Command>,
    pub output: Vec<Command>,
}

impl CompiledCommands {
    pub fn for_direction(&self, direction: Direction) -> &[Command] {
        match direction {
            Direction::Input => &self.input,
            Direction::Output => &self.output,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty() && self.output.is_empty()
    }

    /// Total entries across both lists (a fanned-out command counts twice)
    pub fn len(&self) -> usize {
        self.input.len() + self.output.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Flags left at the end of the stream with no pattern are an error
    /// instead of being discarded.
    pub reject_trailing_flags: bool,

    /// A pattern with no direction applies to both directions instead of
    /// failing with `IncompleteCommand`.
    pub allow_directionless: bool,
}

/// Accumulator threaded through the fold over tokens
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
    current: Command,
    compiled: CompiledCommands,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            current: Command::default(),
            compiled: CompiledCommands::default(),
        }
    }

    /// The in-progress command
    pub fn pending(&self) -> &Command {
        &self.current
    }

    pub fn compiled(&self) -> &CompiledCommands {
        &self.compiled
    }

    /// Apply one token
    pub fn push(mut self, token: Token) -> Result<Self, CompileError> {
        match token {
            Token::Direction(direction) => {
                if self.current.direction.is_some() {
                    return Err(CompileError::DuplicateField(Field::Direction));
                }
                self.current.direction = Some(direction);
            }
            Token::Role(role) => {
                if self.current.role.is_some() {
                    return Err(CompileError::DuplicateField(Field::Role));
                }
                self.current.role = Some(role);
            }
            Token::Pattern(pattern) => {
                self.current.pattern = Some(pattern);
                self.finalize()?;
            }
        }
        Ok(self)
    }

    fn finalize(&mut self) -> Result<(), CompileError> {
        let command = std::mem::take(&mut self.current);

        match command.direction {
            Some(Direction::Input) => self.compiled.input.push(command),
            Some(Direction::Output) => self.compiled.output.push(command),
            None if self.options.allow_directionless => {
                for direction in Direction::ALL {
                    let copy = Command {
                        direction: Some(direction),
                        ..command.clone()
                    };
                    match direction {
                        Direction::Input => self.compiled.input.push(copy),
                        Direction::Output => self.compiled.output.push(copy),
                    }
                }
            }
            None => {
                return Err(CompileError::IncompleteCommand {
                    pattern: command.pattern.unwrap_or_default(),
                });
            }
        }

        Ok(())
    }

    /// End of input
    pub fn finish(self) -> Result<CompiledCommands, CompileError> {
        if !self.current.is_empty() {
            if self.options.reject_trailing_flags {
                return Err(CompileError::DanglingFlags);
            }
            tracing::warn!(
                pending = ?self.current,
                "Ignoring trailing flags with no device name"
            );
        }
        Ok(self.compiled)
    }
}

/// Compile raw argument strings with the default options
pub fn compile<I, S>(tokens: I) -> Result<CompiledCommands, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    compile_with(tokens, CompileOptions::default())
}

pub fn compile_with<I, S>(
    tokens: I,
    options: CompileOptions,
) -> Result<CompiledCommands, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|raw| Token::classify(raw.as_ref()))
        .try_fold(Compiler::new(options), Compiler::push)?
        .finish()
}

/// What the command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Print device names and stop
    List { direction: Option<Direction> },
    Apply(CompiledCommands),
}

/// Parse a full command line, honoring the `-list` bypass
///
/// `-list` stops parsing where it stands. It lists the direction pending at
/// that point (or every device when none is pending), and anything compiled
/// before it is dropped.
pub fn parse_invocation<I, S>(
    tokens: I,
    options: CompileOptions,
) -> Result<Invocation, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut compiler = Compiler::new(options);

    for raw in tokens {
        match Arg::classify(raw.as_ref()) {
            Arg::List => {
                return Ok(Invocation::List {
                    direction: compiler.pending().direction,
                });
            }
            Arg::Token(token) => compiler = compiler.push(token)?,
        }
    }

    Ok(Invocation::Apply(compiler.finish()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tokens: &[&str]) -> Result<Invocation, CompileError> {
        parse_invocation(tokens, CompileOptions::default())
    }

    #[test]
    fn test_single_input_command() {
        let compiled = compile(["-in", "Mic"]).unwrap();

        let mic = Command::new(Direction::Input, None, "Mic");
        assert_eq!(compiled.input, vec![mic]);
        assert!(compiled.output.is_empty());
    }

    #[test]
    fn test_pattern_without_direction_is_incomplete() {
        let err = compile(["Headset"]).unwrap_err();
        assert_eq!(
            err,
            CompileError::IncompleteCommand {
                pattern: "Headset".into()
            }
        );
    }

    #[test]
    fn test_role_without_direction_is_incomplete() {
        let err = compile(["-comm", "Headset"]).unwrap_err();
        assert!(matches!(err, CompileError::IncompleteCommand { .. }));
    }

    #[test]
    fn test_duplicate_direction() {
        assert_eq!(
            compile(["-in", "-in", "Mic"]).unwrap_err(),
            CompileError::DuplicateField(Field::Direction)
        );
        assert_eq!(
            compile(["-in", "-out", "Mic"]).unwrap_err(),
            CompileError::DuplicateField(Field::Direction)
        );
    }

    #[test]
    fn test_duplicate_role() {
        assert_eq!(
            compile(["-out", "-cons", "-comm", "Speakers"]).unwrap_err(),
            CompileError::DuplicateField(Field::Role)
        );
    }

    #[test]
    fn test_error_after_valid_commands_discards_everything() {
        let tokens = ["-in", "Mic", "-out", "-out", "Speakers"];
        let err = compile(tokens).unwrap_err();
        assert_eq!(err, CompileError::DuplicateField(Field::Direction));
    }

    #[test]
    fn test_pattern_resets_accumulator() {
        // The role belongs to the first command only
        let tokens = ["-out", "-comm", "Headset", "-out", "Speakers"];
        let compiled = compile(tokens).unwrap();

        assert_eq!(
            compiled.output,
            vec![
                Command::new(Direction::Output, Some(Role::Communications), "Headset"),
                Command::new(Direction::Output, None, "Speakers"),
            ]
        );
    }

    #[test]
    fn test_flag_order_within_command_is_free() {
        let a = compile(["-cons", "-out", "Speakers"]).unwrap();
        let b = compile(["-out", "-cons", "Speakers"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_help_text_example() {
        let compiled = compile([
            "-in",
            "Microphone",
            "-out",
            "-comm",
            "Headset",
            "-out",
            "-cons",
            "Speakers",
        ])
        .unwrap();

        assert_eq!(compiled.input.len(), 1);
        assert_eq!(compiled.output.len(), 2);
        assert_eq!(compiled.output[0].role, Some(Role::Communications));
        assert_eq!(compiled.output[1].role, Some(Role::Console));
    }

    #[test]
    fn test_trailing_flags_are_discarded_by_default() {
        let compiled = compile(["-in", "Mic", "-out", "-comm"]).unwrap();
        assert_eq!(compiled.len(), 1);
    }

    #[test]
    fn test_trailing_flags_rejected_when_strict() {
        let options = CompileOptions {
            reject_trailing_flags: true,
            ..Default::default()
        };
        assert_eq!(
            compile_with(["-in", "Mic", "-out"], options).unwrap_err(),
            CompileError::DanglingFlags
        );
        assert!(compile_with(["-in", "Mic"], options).is_ok());
    }

    #[test]
    fn test_directionless_fans_out_when_allowed() {
        let options = CompileOptions {
            allow_directionless: true,
            ..Default::default()
        };
        let compiled = compile_with(["Mic"], options).unwrap();

        let input = Command::new(Direction::Input, None, "Mic");
        let output = Command::new(Direction::Output, None, "Mic");
        assert_eq!(compiled.input, vec![input]);
        assert_eq!(compiled.output, vec![output]);
    }

    #[test]
    fn test_directionless_keeps_role() {
        let options = CompileOptions {
            allow_directionless: true,
            ..Default::default()
        };
        let compiled = compile_with(["-comm", "Headset"], options).unwrap();

        assert_eq!(compiled.input[0].role, Some(Role::Communications));
        assert_eq!(compiled.output[0].role, Some(Role::Communications));
    }

    #[test]
    fn test_empty_stream() {
        let compiled = compile(Vec::<String>::new()).unwrap();
        assert!(compiled.is_empty());
    }

    #[test]
    fn test_fold_steps() {
        let compiler = Compiler::new(CompileOptions::default())
            .push(Token::Direction(Direction::Output))
            .unwrap()
            .push(Token::Role(Role::Console))
            .unwrap();
        assert_eq!(compiler.pending().direction, Some(Direction::Output));
        assert!(compiler.compiled().is_empty());

        let compiler = compiler.push(Token::Pattern("Speakers".into())).unwrap();
        assert!(compiler.pending().is_empty());
        assert_eq!(compiler.compiled().output.len(), 1);
    }

    #[test]
    fn test_command_matching() {
        let command = Command::new(Direction::Output, None, "Speakers");
        assert!(command.matches("Speakers (Realtek Audio)"));
        assert!(command.matches("USB Speakers"));
        assert!(!command.matches("speakers"));
        assert!(!command.matches("Headphones"));

        let incomplete = Command {
            pattern: Some("Speakers".into()),
            ..Default::default()
        };
        assert!(!incomplete.matches("Speakers"));
    }

    #[test]
    fn test_list_uses_pending_direction() {
        let invocation = parse(&["-in", "-list"]).unwrap();
        assert_eq!(
            invocation,
            Invocation::List {
                direction: Some(Direction::Input)
            }
        );

        let invocation = parse(&["-list"]).unwrap();
        assert_eq!(invocation, Invocation::List { direction: None });
    }

    #[test]
    fn test_list_ignores_rest_of_line() {
        let invocation = parse(&["-out", "Speakers", "-list", "-in", "-in"]).unwrap();
        assert_eq!(invocation, Invocation::List { direction: None });
    }

    #[test]
    fn test_syntax_error_before_list_still_fails() {
        let err = parse(&["-in", "-in", "-list"]).unwrap_err();
        assert_eq!(err, CompileError::DuplicateField(Field::Direction));
    }

    #[test]
    fn test_apply_invocation() {
        let invocation = parse(&["-out", "Speakers"]).unwrap();
        match invocation {
            Invocation::Apply(compiled) => assert_eq!(compiled.output.len(), 1),
            other => panic!("expected Apply, got {:?}", other),
        }
    }
}
