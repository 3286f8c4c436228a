//! Prompt loop: type a city, toggle units, quit.

use std::future::Future;

use inquire::{InquireError, Text};
use weather_core::{LocationResolver, WeatherSession};

use crate::render::{self, LOADING_LINE};

enum Input {
    City(String),
    ToggleUnits,
    Quit,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        ":q" | ":quit" => Input::Quit,
        ":u" | ":units" => Input::ToggleUnits,
        other => Input::City(other.to_string()),
    }
}

pub async fn run(session: &WeatherSession, resolver: &LocationResolver) -> anyhow::Result<()> {
    println!("🌍 WeatherSphere");

    if with_progress(session, session.start(resolver)).await.is_some() {
        print_snapshot(session);
    }

    loop {
        let unit = session.snapshot().unit;
        let prompt = Text::new("City:")
            .with_help_message(&format!(
                "units: {unit}  |  :u toggle {} → {}  |  :q quit",
                unit.temperature_symbol(),
                unit.toggled().temperature_symbol()
            ))
            .prompt();

        let line = match prompt {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        let settled = match parse_input(&line) {
            Input::Quit => break,
            Input::ToggleUnits => with_progress(session, session.toggle_unit()).await,
            Input::City(city) => with_progress(session, session.submit_city(&city)).await,
        };

        // Blank submissions and toggles with nothing to re-query change nothing worth printing.
        if settled.is_some() {
            print_snapshot(session);
        }
    }

    Ok(())
}

fn print_snapshot(session: &WeatherSession) {
    println!("\n{}\n", render::render_state(&session.snapshot().state, &chrono::Local));
}

/// Drive `op` to completion, printing the loading line whenever the session
/// publishes a loading state.
async fn with_progress<F: Future>(session: &WeatherSession, op: F) -> F::Output {
    let mut rx = session.subscribe();
    tokio::pin!(op);

    loop {
        tokio::select! {
            out = &mut op => return out,
            changed = rx.changed() => {
                if changed.is_err() {
                    return op.await;
                }
                if rx.borrow_and_update().is_loading() {
                    println!("{LOADING_LINE}");
                }
            }
        }
    }
}
