//! Command-line parsing for `ftc-sim`.

use std::fmt;
use std::path::PathBuf;

use ftc_types::Alliance;

pub const USAGE: &str = "\
usage: ftc-sim <teleop|obelisk|init> [options]

options:
  --ticks N          loop ticks to run (default 250)
  --alliance COLOR   red | blue (overrides the config file)
  --config PATH      robot config file (default robot.toml)
  --json             print every telemetry frame as a JSON line
  --fast             simulated clock, no sleeping between ticks
  -h, --help         show this message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpModeKind {
    TeleOp,
    Obelisk,
    Init,
}

impl fmt::Display for OpModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpModeKind::TeleOp => write!(f, "teleop"),
            OpModeKind::Obelisk => write!(f, "obelisk"),
            OpModeKind::Init => write!(f, "init"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub op_mode: OpModeKind,
    pub ticks: u64,
    pub alliance: Option<Alliance>,
    pub config: PathBuf,
    pub json: bool,
    pub fast: bool,
}

/// Why the command line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    Help,
    Invalid(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::Help => write!(f, "{USAGE}"),
            ArgsError::Invalid(msg) => write!(f, "{msg}\n\n{USAGE}"),
        }
    }
}

fn invalid(msg: impl Into<String>) -> ArgsError {
    ArgsError::Invalid(msg.into())
}

/// Parse arguments, excluding the program name.
pub fn parse<I, S>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut op_mode = None;
    let mut parsed = Args {
        op_mode: OpModeKind::TeleOp,
        ticks: 250,
        alliance: None,
        config: PathBuf::from(ftc_opmode::config::DEFAULT_CONFIG_FILE),
        json: false,
        fast: false,
    };

    let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(ArgsError::Help),
            "--json" => parsed.json = true,
            "--fast" => parsed.fast = true,
            "--ticks" => {
                let v = iter.next().ok_or_else(|| invalid("--ticks needs a value"))?;
                parsed.ticks = v
                    .parse()
                    .map_err(|_| invalid(format!("--ticks: '{v}' is not a number")))?;
            }
            "--alliance" => {
                let v = iter
                    .next()
                    .ok_or_else(|| invalid("--alliance needs a value"))?;
                parsed.alliance = Some(match v.to_ascii_lowercase().as_str() {
                    "red" => Alliance::Red,
                    "blue" => Alliance::Blue,
                    _ => return Err(invalid(format!("--alliance: expected red or blue, got '{v}'"))),
                });
            }
            "--config" => {
                let v = iter.next().ok_or_else(|| invalid("--config needs a value"))?;
                parsed.config = PathBuf::from(v);
            }
            flag if flag.starts_with('-') => {
                return Err(invalid(format!("unknown option '{flag}'")));
            }
            name => {
                if op_mode.is_some() {
                    return Err(invalid(format!("unexpected argument '{name}'")));
                }
                op_mode = Some(match name {
                    "teleop" => OpModeKind::TeleOp,
                    "obelisk" => OpModeKind::Obelisk,
                    "init" => OpModeKind::Init,
                    _ => return Err(invalid(format!("unknown op mode '{name}'"))),
                });
            }
        }
    }

    parsed.op_mode = op_mode.ok_or_else(|| invalid("missing op mode"))?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = parse(["teleop"]).unwrap();
        assert_eq!(args.op_mode, OpModeKind::TeleOp);
        assert_eq!(args.ticks, 250);
        assert_eq!(args.alliance, None);
        assert_eq!(args.config, PathBuf::from("robot.toml"));
        assert!(!args.json && !args.fast);
    }

    #[test]
    fn all_options() {
        let args = parse([
            "--alliance", "RED", "obelisk", "--ticks", "40", "--config", "cfg/r.toml", "--json",
            "--fast",
        ])
        .unwrap();
        assert_eq!(args.op_mode, OpModeKind::Obelisk);
        assert_eq!(args.ticks, 40);
        assert_eq!(args.alliance, Some(Alliance::Red));
        assert_eq!(args.config, PathBuf::from("cfg/r.toml"));
        assert!(args.json && args.fast);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse(["--help"]), Err(ArgsError::Help));
        assert!(matches!(parse::<[&str; 0], &str>([]), Err(ArgsError::Invalid(_))));
        assert!(matches!(parse(["auto"]), Err(ArgsError::Invalid(_))));
        assert!(matches!(parse(["init", "teleop"]), Err(ArgsError::Invalid(_))));
        assert!(matches!(parse(["init", "--ticks"]), Err(ArgsError::Invalid(_))));
        assert!(matches!(parse(["init", "--ticks", "x"]), Err(ArgsError::Invalid(_))));
        assert!(matches!(parse(["init", "--alliance", "green"]), Err(ArgsError::Invalid(_))));
        assert!(matches!(parse(["init", "--verbose"]), Err(ArgsError::Invalid(_))));
    }
}
