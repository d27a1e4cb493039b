use std::io::BufRead;
use std::thread::{self, JoinHandle};

use crossbeam::channel::Sender;

use crate::{Error, Result};

/// Screen power transitions raised by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    ScreenOn,
    ScreenOff,
}

/// Events the render context reacts to besides readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Power(PowerEvent),
    Shutdown,
}

/// Reports whether the system is in an ambient/dream display mode.
pub trait IdleOracle {
    fn is_idle(&self) -> Result<bool>;
}

/// Oracle for hosts without an idle display mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverIdle;

impl IdleOracle for NeverIdle {
    fn is_idle(&self) -> Result<bool> {
        Ok(false)
    }
}

/// Query the oracle, treating a failed query as "not idle" so the overlay keeps running.
pub fn idle_or_fail_open(oracle: &dyn IdleOracle) -> bool {
    match oracle.is_idle() {
        Ok(idle) => idle,
        Err(err) => {
            log::warn!("{err}; assuming not idle");
            false
        }
    }
}

/// Map one line of operator input to a control event.
pub fn parse_command(line: &str) -> Option<ControlEvent> {
    match line.trim().to_ascii_lowercase().as_str() {
        "on" | "screen-on" => Some(ControlEvent::Power(PowerEvent::ScreenOn)),
        "off" | "screen-off" => Some(ControlEvent::Power(PowerEvent::ScreenOff)),
        "quit" | "exit" => Some(ControlEvent::Shutdown),
        _ => None,
    }
}

/// Forward `on`/`off`/`quit` lines from `input` as control events until EOF or the receiver goes away.
pub fn spawn_line_notifier<R>(input: R, events: Sender<ControlEvent>) -> Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("fpsinfo-power".into())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        log::warn!("power input read failed: {err}");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let Some(event) = parse_command(&line) else {
                    log::info!("ignoring unknown power command '{}'", line.trim());
                    continue;
                };
                if events.send(event).is_err() || event == ControlEvent::Shutdown {
                    break;
                }
            }
        })
        .map_err(|e| Error::Spawn(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;
    use std::io::Cursor;

    struct FailingOracle;

    impl IdleOracle for FailingOracle {
        fn is_idle(&self) -> Result<bool> {
            Err(Error::Idle("dream service unavailable".into()))
        }
    }

    struct DreamingOracle;

    impl IdleOracle for DreamingOracle {
        fn is_idle(&self) -> Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn failure_is_not_idle() {
        assert!(!idle_or_fail_open(&FailingOracle));
        assert!(!idle_or_fail_open(&NeverIdle));
        assert!(idle_or_fail_open(&DreamingOracle));
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_command(" ON "),
            Some(ControlEvent::Power(PowerEvent::ScreenOn))
        );
        assert_eq!(
            parse_command("screen-off"),
            Some(ControlEvent::Power(PowerEvent::ScreenOff))
        );
        assert_eq!(parse_command("quit"), Some(ControlEvent::Shutdown));
        assert_eq!(parse_command("dim"), None);
    }

    #[test]
    fn line_notifier_forwards_until_quit() {
        let (tx, rx) = channel::unbounded();
        let input = Cursor::new("off\nbogus\n\non\nquit\noff\n");
        spawn_line_notifier(input, tx).unwrap().join().unwrap();
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                ControlEvent::Power(PowerEvent::ScreenOff),
                ControlEvent::Power(PowerEvent::ScreenOn),
                ControlEvent::Shutdown,
            ]
        );
    }
}
