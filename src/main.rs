use std::{
    io::{self, BufRead, Write},
    path::Path,
    sync::mpsc::{Receiver, Sender},
};

use anyhow::Context;
use log::{error, info};

mod cmds;
mod document;
mod extract;
mod playback;
mod segment;
mod session;
mod speech;
mod store;
mod util;
mod voices;

use extract::ImporterCommandExtractor;
use session::ReaderSession;
use speech::{piper::PiperEngine, EngineEvent};

fn main() {
    if let Err(err) = util::logging::init() {
        eprintln!("Failed to initialise logger: {err}");
    }
    info!("starting reader shell");

    if let Err(err) = run() {
        error!("fatal: {err:?}");
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let (events_tx, events_rx): (Sender<EngineEvent>, Receiver<EngineEvent>) =
        std::sync::mpsc::channel();
    let engine =
        PiperEngine::new(events_tx).context("failed to initialise the speech engine")?;
    let session = ReaderSession::new(
        Box::new(engine),
        Box::new(ImporterCommandExtractor::pdf()),
    );

    println!("reader (type 'help' for commands)");
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        drain_events(&session, &events_rx);
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        drain_events(&session, &events_rx);

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let (command, argument) = match input.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (input, ""),
        };
        if matches!(command, "quit" | "exit") {
            break;
        }
        dispatch(&session, command, argument);
    }
    Ok(())
}

/// Engine signals are applied between commands; the session routes each to
/// the component that owns its state.
fn drain_events(session: &ReaderSession, events: &Receiver<EngineEvent>) {
    for event in events.try_iter() {
        if let EngineEvent::Finished(_) = event {
            println!("(finished reading)");
        }
        session.handle_event(event);
    }
}

fn dispatch(session: &ReaderSession, command: &str, argument: &str) {
    match command {
        "open" => {
            if argument.is_empty() {
                println!("usage: open <path>");
                return;
            }
            match cmds::document::open_document(session, Path::new(argument)) {
                Ok(response) => {
                    println!("Loaded '{}' ({} pages)", response.title, response.pages)
                }
                Err(err) => println!("{err}"),
            }
        }
        "next" => match cmds::document::next_page(session) {
            Ok(view) if view.moved => println!("Page {} of {}", view.page, view.pages),
            Ok(_) => println!("Already at the last page"),
            Err(err) => println!("{err}"),
        },
        "prev" => match cmds::document::prev_page(session) {
            Ok(view) if view.moved => println!("Page {} of {}", view.page, view.pages),
            Ok(_) => println!("Already at the first page"),
            Err(err) => println!("{err}"),
        },
        "text" => match cmds::document::page_text(session) {
            Ok(text) => println!("{text}"),
            Err(err) => println!("{err}"),
        },
        "voices" => {
            let voices = cmds::voices::list_voices(session);
            if voices.is_empty() {
                println!("No voices available yet");
            }
            for voice in voices {
                if voice.locale.is_empty() {
                    println!("{}", voice.name);
                } else {
                    println!("{} ({})", voice.name, voice.locale);
                }
            }
        }
        "voice" => {
            if argument.is_empty() {
                println!("usage: voice <name>");
                return;
            }
            match cmds::voices::select_voice(session, argument) {
                Ok(voice) => println!("Selected voice '{}'", voice.name),
                Err(err) => println!("{err}"),
            }
        }
        "rescan" => {
            session.refresh_voices();
            println!("Requested a voice rescan");
        }
        "play" => report_state(cmds::playback::play(session)),
        "pause" => report_state(cmds::playback::pause(session)),
        "resume" => report_state(cmds::playback::resume(session)),
        "stop" => report_state(cmds::playback::stop(session)),
        "status" => {
            if session.phase() == session::SessionPhase::Loading {
                println!("A document is still loading");
            }
            match session.position() {
                Some((page, pages)) => println!("Page {page} of {pages}"),
                None => println!("No document loaded"),
            }
            println!("Playback: {}", session.playback_state());
        }
        "help" => {
            println!("open <path>   load a .txt or .pdf document");
            println!("next / prev   move between pages");
            println!("text          show the current page");
            println!("voices        list available voices");
            println!("voice <name>  choose the reading voice");
            println!("rescan        ask the engine for a fresh voice list");
            println!("play          read the current page aloud");
            println!("pause / resume / stop");
            println!("status        current page and playback state");
            println!("quit");
        }
        other => println!("Unknown command '{other}', type 'help'"),
    }
}

fn report_state(result: Result<playback::PlaybackState, cmds::CommandError>) {
    match result {
        Ok(state) => println!("Playback: {state}"),
        Err(err) => println!("{err}"),
    }
}
