//! Bench console grammar.
//!
//! Lines are lower-cased before parsing, so keywords are case-insensitive and
//! numbers may be written in decimal or with a `0x` prefix.

use core::fmt;
use core::time::Duration;

use pms_core::io::SwitchId;
use winnow::ascii::{dec_uint, hex_uint, space0, space1};
use winnow::combinator::{alt, dispatch, empty, eof, fail, opt, preceded, repeat, terminated};
use winnow::prelude::*;
use winnow::token::take_while;

/// Upper bound for `run`, so a typo cannot wedge the console.
pub const MAX_RUN_ITERATIONS: u32 = 100_000;

/// Upper bound for `tick`, in milliseconds. The simulated board fires one
/// tick per elapsed millisecond.
pub const MAX_TICK_MS: u32 = 60_000;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Deliver a frame to the capture layer as the receive interrupt would.
    Rx { id: u32, payload: Vec<u8> },
    Switch { switch: SwitchId, level: bool },
    /// Let time pass without polling; the tick source keeps firing.
    Tick(Duration),
    /// Run the polling loop this many iterations.
    Run(u32),
    Status,
    Help(Option<String>),
    Exit,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommandError {
    /// Input did not match the grammar; `offset` is the byte where parsing
    /// stopped.
    Syntax { offset: usize },
    RunTooLong(u32),
    TickTooLong(u32),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Syntax { offset } => write!(f, "unexpected input at column {offset}"),
            CommandError::RunTooLong(count) => {
                write!(f, "run {count} exceeds limit of {MAX_RUN_ITERATIONS}")
            }
            CommandError::TickTooLong(ms) => {
                write!(f, "tick {ms} exceeds limit of {MAX_TICK_MS}ms")
            }
        }
    }
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let normalized = line.trim().to_ascii_lowercase();
    let command = terminated(command, (space0, eof))
        .parse(normalized.as_str())
        .map_err(|err| CommandError::Syntax {
            offset: err.offset(),
        })?;

    match command {
        Command::Run(count) if count > MAX_RUN_ITERATIONS => Err(CommandError::RunTooLong(count)),
        Command::Tick(duration) if duration > Duration::from_millis(MAX_TICK_MS.into()) => {
            Err(CommandError::TickTooLong(
                u32::try_from(duration.as_millis()).unwrap_or(u32::MAX),
            ))
        }
        other => Ok(other),
    }
}

fn command(input: &mut &str) -> ModalResult<Command> {
    dispatch! {word;
        "rx" => rx_args,
        "switch" | "sw" => switch_args,
        "tick" => preceded(space1, number).map(|ms| Command::Tick(Duration::from_millis(u64::from(ms)))),
        "run" => opt(preceded(space1, number)).map(|count| Command::Run(count.unwrap_or(1))),
        "status" => empty.value(Command::Status),
        "help" => opt(preceded(space1, word)).map(|topic| Command::Help(topic.map(str::to_owned))),
        "exit" | "quit" => empty.value(Command::Exit),
        _ => fail,
    }
    .parse_next(input)
}

fn rx_args(input: &mut &str) -> ModalResult<Command> {
    let id = preceded(space1, number).parse_next(input)?;
    let payload: Vec<u8> = repeat(0.., preceded(space1, byte)).parse_next(input)?;
    Ok(Command::Rx { id, payload })
}

fn switch_args(input: &mut &str) -> ModalResult<Command> {
    let switch = preceded(
        space1,
        dispatch! {word;
            "array" => empty.value(SwitchId::ArrayEnable),
            "motor" => empty.value(SwitchId::MotorEnable),
            "brake" => empty.value(SwitchId::Brake),
            _ => fail,
        },
    )
    .parse_next(input)?;
    let level = preceded(
        space1,
        dispatch! {word;
            "on" | "1" => empty.value(true),
            "off" | "0" => empty.value(false),
            _ => fail,
        },
    )
    .parse_next(input)?;
    Ok(Command::Switch { switch, level })
}

fn word<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-').parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<u32> {
    alt((preceded("0x", hex_uint), dec_uint)).parse_next(input)
}

fn byte(input: &mut &str) -> ModalResult<u8> {
    number
        .verify_map(|value| u8::try_from(value).ok())
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rx_with_hex_and_decimal_bytes() {
        let command = parse_command("rx 0x608 10 20 0x1e").expect("rx should parse");
        assert_eq!(
            command,
            Command::Rx {
                id: 0x608,
                payload: vec![10, 20, 0x1e],
            }
        );
    }

    #[test]
    fn rx_without_payload_is_zero_length() {
        let command = parse_command("RX 0x777").expect("rx should parse");
        assert_eq!(
            command,
            Command::Rx {
                id: 0x777,
                payload: Vec::new(),
            }
        );
    }

    #[test]
    fn rejects_byte_out_of_range() {
        let err = parse_command("rx 0x608 256").expect_err("256 is not a byte");
        assert!(matches!(err, CommandError::Syntax { .. }));
    }

    #[test]
    fn parses_switch_levels() {
        assert_eq!(
            parse_command("switch motor on").expect("switch should parse"),
            Command::Switch {
                switch: SwitchId::MotorEnable,
                level: true,
            }
        );
        assert_eq!(
            parse_command("sw brake 0").expect("short form should parse"),
            Command::Switch {
                switch: SwitchId::Brake,
                level: false,
            }
        );
    }

    #[test]
    fn rejects_unknown_switch() {
        assert!(parse_command("switch lights on").is_err());
    }

    #[test]
    fn run_defaults_to_one_iteration() {
        assert_eq!(parse_command("run").expect("run"), Command::Run(1));
        assert_eq!(parse_command("run 25").expect("run 25"), Command::Run(25));
        assert_eq!(
            parse_command("run 1000000"),
            Err(CommandError::RunTooLong(1_000_000))
        );
    }

    #[test]
    fn tick_takes_milliseconds() {
        assert_eq!(
            parse_command("tick 200").expect("tick"),
            Command::Tick(Duration::from_millis(200))
        );
        assert!(parse_command("tick").is_err());
    }

    #[test]
    fn tick_is_bounded() {
        assert_eq!(
            parse_command("tick 60000").expect("tick at limit"),
            Command::Tick(Duration::from_millis(60_000))
        );
        assert_eq!(
            parse_command("tick 4294967295"),
            Err(CommandError::TickTooLong(u32::MAX))
        );
        assert_eq!(
            parse_command("tick 0xffff"),
            Err(CommandError::TickTooLong(0xffff))
        );
    }

    #[test]
    fn help_accepts_optional_topic() {
        assert_eq!(parse_command("help").expect("help"), Command::Help(None));
        assert_eq!(
            parse_command("help rx").expect("help rx"),
            Command::Help(Some("rx".to_owned()))
        );
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(parse_command("status now").is_err());
        assert!(parse_command("exit please").is_err());
    }
}
