use tokio::io::{AsyncBufReadExt, BufReader};
use weather_now_core::{Controller, Event};

use crate::render;

pub const HELP: &str = "\
Type a city name to search. Commands:
  :N     pick suggestion N
  :u     toggle °C / °F
  :loc   use my location
  :q     quit";

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Query(String),
    /// Zero-based suggestion index.
    Select(usize),
    ToggleUnit,
    Locate,
    Help,
    Quit,
}

impl Input {
    pub fn parse(line: &str) -> Input {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix(':') else {
            return Input::Query(line.trim_end_matches(['\r', '\n']).to_string());
        };

        match command {
            "q" | "quit" => Input::Quit,
            "u" | "unit" => Input::ToggleUnit,
            "loc" | "here" => Input::Locate,
            "h" | "help" | "?" => Input::Help,
            n => match n.parse::<usize>() {
                Ok(index) if index > 0 => Input::Select(index - 1),
                _ => Input::Help,
            },
        }
    }
}

enum Wake {
    Line(Option<String>),
    Event(Option<Event>),
}

/// Line-driven widget loop: every line updates the controller, every
/// background event is applied as it arrives, and the widget is redrawn
/// whenever something changed.
pub async fn run(mut controller: Controller) -> anyhow::Result<()> {
    println!("{HELP}\n");
    print!("{}", render::widget(controller.state()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let wake = tokio::select! {
            line = lines.next_line() => Wake::Line(line?),
            event = controller.next_event() => Wake::Event(event),
        };

        let changed = match wake {
            Wake::Line(None) => break,
            Wake::Line(Some(line)) => match Input::parse(&line) {
                Input::Quit => break,
                Input::Help => {
                    println!("{HELP}");
                    false
                }
                Input::Query(text) => {
                    controller.set_query(text);
                    true
                }
                Input::Select(index) => {
                    if !controller.select_suggestion(index) {
                        println!("No suggestion #{}.", index + 1);
                    }
                    true
                }
                Input::ToggleUnit => {
                    controller.toggle_unit();
                    true
                }
                Input::Locate => {
                    controller.use_my_location();
                    true
                }
            },
            Wake::Event(Some(event)) => controller.apply(event),
            Wake::Event(None) => break,
        };

        if changed {
            println!();
            print!("{}", render::widget(controller.state()));
        }
    }

    controller.shutdown();
    Ok(())
}
