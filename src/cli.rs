use crate::config::parse_density;
use crate::{Error, Result};

/// Options for the `run` command; values are `None` when not provided on CLI.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunOptions {
    pub density: Option<f32>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

/// Parsed command-line intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(RunOptions),
    ShowHelp,
    ShowVersion,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut iter = args.iter();
        match iter.next().map(|s| s.as_str()) {
            None => Ok(Command::Run(RunOptions::default())),
            Some("run") => Ok(Command::Run(parse_run_options(&mut iter)?)),
            Some("--help") | Some("-h") => Ok(Command::ShowHelp),
            Some("--version") | Some("-V") => Ok(Command::ShowVersion),
            Some(flag) if flag.starts_with('-') => {
                // `run` is optional: re-parse the whole argument list as run flags.
                let mut iter = args.iter();
                Ok(Command::Run(parse_run_options(&mut iter)?))
            }
            Some(cmd) => Err(Error::InvalidArgs(format!(
                "unknown command '{cmd}', try --help"
            ))),
        }
    }

    pub fn help() -> &'static str {
        concat!(
            "fpsinfo - display refresh rate overlay\n",
            "\n",
            "USAGE:\n",
            "  fpsinfo run [--density <scale>] [--log-level <level>] [--log-file <path>]\n",
            "  fpsinfo --help\n",
            "  fpsinfo --version\n",
            "\n",
            "OPTIONS:\n",
            "  --density <scale>    Screen density in (0, 16] used to size padding and text (default: 1.0)\n",
            "  --log-level <level>  error|warn|info|debug|trace (default: info)\n",
            "  --log-file <path>    Append logs to this file as well as stderr\n",
            "  -h, --help           Show this help\n",
            "  -V, --version        Show version\n",
            "\n",
            "Power events are read from stdin, one per line: on | off | quit\n",
        )
    }

    pub fn print_help() {
        println!("{}", Self::help());
    }
}

fn parse_run_options(iter: &mut std::slice::Iter<String>) -> Result<RunOptions> {
    let mut opts = RunOptions::default();

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--density" => {
                let raw = take_value(flag, iter)?;
                opts.density = Some(parse_density(&raw).ok_or_else(|| {
                    Error::InvalidArgs("density must be a number in (0, 16]".to_string())
                })?);
            }
            "--log-level" => {
                opts.log_level = Some(take_value(flag, iter)?);
            }
            "--log-file" => {
                opts.log_file = Some(take_value(flag, iter)?);
            }
            other => {
                return Err(Error::InvalidArgs(format!(
                    "unknown flag '{other}', try --help"
                )));
            }
        }
    }

    Ok(opts)
}

fn take_value(flag: &str, iter: &mut std::slice::Iter<String>) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| Error::InvalidArgs(format!("expected a value after {flag}")))
}
