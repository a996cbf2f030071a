// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::Event;

const START: &str = "start";
const STOP: &str = "stop";
const UP: &str = "up";
const DOWN: &str = "down";
const BPM: &str = "bpm";
const SOUND: &str = "sound";
const SOUNDS: &str = "sounds";
const STATUS: &str = "status";
const QUIT: &str = "quit";

/// What a line of keyboard input asks for.
#[derive(Debug, PartialEq)]
enum Command {
    Event(Event),
    Quit,
    Unrecognized,
}

/// A controller that drives the metronome from lines typed on stdin.
pub struct Driver {}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Parses a single line. An empty line toggles, the way the play button does.
    fn parse(line: &str) -> Command {
        let line = line.trim();
        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (line, ""),
        };

        match (command.to_lowercase().as_str(), argument) {
            ("", _) => Command::Event(Event::Toggle),
            (START, "") => Command::Event(Event::Start),
            (STOP, "") => Command::Event(Event::Stop),
            (UP | "+", "") => Command::Event(Event::Increment),
            (DOWN | "-", "") => Command::Event(Event::Decrement),
            (BPM, bpm) if !bpm.is_empty() => Command::Event(Event::SetBpm(bpm.to_string())),
            (SOUND, name) if !name.is_empty() => Command::Event(Event::Select(name.to_string())),
            (SOUNDS, "") => Command::Event(Event::ListSounds),
            (STATUS, "") => Command::Event(Event::Status),
            (QUIT | "exit", "") => Command::Quit,
            _ => Command::Unrecognized,
        }
    }

    /// Reads one line and sends its event. Returns false once input is exhausted or the
    /// user quits.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command (enter to toggle, {}, {}, {}, {}, {} N, {} NAME, {}, {}, {}): ",
            START, STOP, UP, DOWN, BPM, SOUND, SOUNDS, STATUS, QUIT,
        )?;
        writer.flush()?;

        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        match Self::parse(&input) {
            Command::Event(event) => events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
            Command::Quit => return Ok(false),
            Command::Unrecognized => warn!(input = input.trim(), "Unrecognized input"),
        }
        Ok(true)
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");
            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}
            info!("Keyboard driver stopped.");
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader};

    use tokio::sync::mpsc;

    use super::*;

    fn get_event(input: &str) -> Result<(bool, Option<Event>), io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        let reader = BufReader::new(input.as_bytes());
        let mut writer: Vec<u8> = Vec::new();
        let more = Driver::monitor_io(&sender, reader, &mut writer)?;
        assert!(String::from_utf8_lossy(&writer).starts_with("Command"));

        // Force the sender to close.
        drop(sender);
        Ok((more, receiver.blocking_recv()))
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        let cases = [
            ("\n", Event::Toggle),
            ("start\n", Event::Start),
            ("STOP\n", Event::Stop),
            ("up\n", Event::Increment),
            ("+\n", Event::Increment),
            ("down\n", Event::Decrement),
            ("bpm 132\n", Event::SetBpm("132".to_string())),
            ("bpm fast\n", Event::SetBpm("fast".to_string())),
            ("sound  High Tone \n", Event::Select("High Tone".to_string())),
            ("sounds\n", Event::ListSounds),
            ("status\n", Event::Status),
        ];
        for (input, expected) in cases {
            assert_eq!((true, Some(expected)), get_event(input)?, "{:?}", input);
        }
        Ok(())
    }

    #[test]
    fn test_unrecognized_input() -> Result<(), io::Error> {
        assert_eq!((true, None), get_event("dance\n")?);
        assert_eq!((true, None), get_event("bpm\n")?);
        assert_eq!((true, None), get_event("start now\n")?);
        Ok(())
    }

    #[test]
    fn test_quit_and_eof() -> Result<(), io::Error> {
        assert_eq!((false, None), get_event("quit\n")?);
        assert_eq!((false, None), get_event("")?);
        Ok(())
    }
}
