use std::io::Write;

use anyhow::Result;
use ecochat_core::{ChatSession, SessionError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::render;

/// One line of REPL input.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Text(&'a str),
    Image(&'a str),
    NewThread,
    Threads,
    Quit,
    Unknown(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return Self::Text(line);
        };

        let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
        match name {
            "image" => Self::Image(rest.trim()),
            "new" => Self::NewThread,
            "threads" => Self::Threads,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(name),
        }
    }
}

pub async fn run(session: &ChatSession) -> Result<()> {
    println!("ecochat: ask about recycling, /image <prompt>, /new, /threads, /quit");
    if let Some(thread) = session.snapshot().await.active_thread() {
        println!("Continuing \"{}\"", thread.title);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let outcome = match Input::parse(&line) {
            Input::Text(query) => session.submit_text(query).await,
            Input::Image(prompt) => session.submit_image(prompt).await,
            Input::NewThread => {
                let id = session.new_thread().await;
                println!("Started thread {id}");
                continue;
            }
            Input::Threads => {
                print!("{}", render::thread_list(&session.snapshot().await));
                continue;
            }
            Input::Quit => break,
            Input::Unknown(name) => {
                println!("Unknown command /{name}");
                continue;
            }
        };

        match outcome {
            Ok(message) => print!("{}", render::message(&message)),
            Err(SessionError::EmptyInput) => debug!("Ignoring empty input"),
            Err(e) => println!("{e}"),
        }
    }

    Ok(())
}
