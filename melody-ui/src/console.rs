//! Terminal front end
//!
//! Stands in for the form controls: numbered choices set the local
//! selection, `next` confirms the current stage, `restart` starts over.
//! Transitions run as background tasks so the prompt stays responsive;
//! input that arrives while one is in flight is rejected by the
//! [`SharedWorkflow`] guard. Screen updates are driven by workflow events.

use std::fmt::Write as _;
use std::str::FromStr;

use melody_common::events::WorkflowEvent;
use melody_common::Stage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::debug;

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{TokenOption, WorkflowState};
use crate::workflow::SharedWorkflow;

const HELP: &str = "\
Commands:
  <number>        choose an option on the current screen
  token <value>   set the custom access token
  method <name>   token method: default, custom or browser
  next            confirm the current screen
  restart         start a new round
  show            redraw the current screen
  chart           print the chart specification (display screen)
  help            show this help
  quit            exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 1-based option number
    Choose(usize),
    Token(String),
    Method(TokenOption),
    Next,
    Restart,
    Show,
    Chart,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if let Some(token) = line.strip_prefix("token ") {
            return Ok(Command::Token(token.trim().to_string()));
        }
        if let Some(method) = line.strip_prefix("method ") {
            return method.parse().map(Command::Method);
        }

        match line.to_ascii_lowercase().as_str() {
            "next" | "n" => Ok(Command::Next),
            "restart" | "r" => Ok(Command::Restart),
            "show" | "" => Ok(Command::Show),
            "chart" => Ok(Command::Chart),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => match other.parse::<usize>() {
                Ok(n) if n > 0 => Ok(Command::Choose(n)),
                _ => Err(format!("Unknown command '{}', type `help`", line)),
            },
        }
    }
}

/// Text for the current screen
pub fn render_screen(state: &WorkflowState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Melody [{}] ==", state.stage);

    match state.stage {
        Stage::Uninitialized => {
            let _ = writeln!(out, "Not connected to the backend yet. Type `next` to retry.");
        }
        Stage::SelectDataPlugin => {
            let _ = writeln!(out, "Choose data source:");
            write_choices(&mut out, &state.data_plugin_names, state.selected_data_plugin);
        }
        Stage::EnterAccessToken => {
            let options = [
                (TokenOption::Default, "Use default token".to_string()),
                (
                    TokenOption::Custom,
                    format!(
                        "Enter token by user ({} characters set)",
                        state.custom_token.chars().count()
                    ),
                ),
                (TokenOption::Browser, "Retrieve token by browser".to_string()),
            ];
            for (i, (option, label)) in options.iter().enumerate() {
                let marker = if *option == state.token_option { "*" } else { " " };
                let _ = writeln!(out, " {} {}) {}", marker, i + 1, label);
            }
            let _ = writeln!(out, "Use `token <value>` to set a custom token.");
        }
        Stage::SelectDisplayPlugin => {
            if state.display_plugin_names.is_empty() {
                let _ = writeln!(out, "No display plugins available.");
            } else {
                let _ = writeln!(out, "Choose visualization type:");
                write_choices(
                    &mut out,
                    &state.display_plugin_names,
                    state.selected_display_plugin,
                );
            }
        }
        Stage::Display => match &state.resolved_display {
            Some(display) => {
                let _ = writeln!(out, "{} ({} tracks)", display.plugin, state.track_data.len());
                for line in &display.summary {
                    let _ = writeln!(out, "  {}", line);
                }
            }
            None => {
                let _ = writeln!(out, "Nothing to display.");
            }
        },
    }

    if let Some(message) = &state.status_message {
        let _ = writeln!(out, "! {}", message);
    }
    out
}

fn write_choices(out: &mut String, names: &[String], selected: usize) {
    for (i, name) in names.iter().enumerate() {
        let marker = if i == selected { "*" } else { " " };
        let _ = writeln!(out, " {} {}) {}", marker, i + 1, name);
    }
}

/// Confirm whatever the current stage asks for
pub async fn advance(workflow: &SharedWorkflow) -> WorkflowResult<Stage> {
    let stage = workflow
        .try_snapshot()
        .ok_or(WorkflowError::TransitionInFlight)?
        .stage;

    match stage {
        Stage::Uninitialized => workflow.initialize().await,
        Stage::SelectDataPlugin => workflow.confirm_data_plugin().await,
        Stage::EnterAccessToken => workflow.confirm_access_token().await,
        Stage::SelectDisplayPlugin => workflow.confirm_display_plugin().await,
        Stage::Display => Err(WorkflowError::WrongStage {
            action: "continue",
            current: stage,
        }),
    }
}

/// Apply a numbered choice to the current screen's selection
pub fn choose(workflow: &SharedWorkflow, number: usize) -> WorkflowResult<()> {
    let state = workflow
        .try_snapshot()
        .ok_or(WorkflowError::TransitionInFlight)?;
    let index = number.checked_sub(1).ok_or(WorkflowError::InvalidSelection {
        what: "option",
        index: 0,
        len: 0,
    })?;

    match state.stage {
        Stage::SelectDataPlugin => workflow.select_data_plugin(index),
        Stage::SelectDisplayPlugin => workflow.select_display_plugin(index),
        Stage::EnterAccessToken => {
            let option = match number {
                1 => TokenOption::Default,
                2 => TokenOption::Custom,
                3 => TokenOption::Browser,
                _ => {
                    return Err(WorkflowError::InvalidSelection {
                        what: "token option",
                        index,
                        len: 3,
                    })
                }
            };
            workflow.set_token_option(option)
        }
        stage => Err(WorkflowError::WrongStage {
            action: "choose an option",
            current: stage,
        }),
    }
}

/// Pick the token method by name, only on the access token screen
pub fn set_method(workflow: &SharedWorkflow, option: TokenOption) -> WorkflowResult<()> {
    let state = workflow
        .try_snapshot()
        .ok_or(WorkflowError::TransitionInFlight)?;
    if state.stage != Stage::EnterAccessToken {
        return Err(WorkflowError::WrongStage {
            action: "choose a token method",
            current: state.stage,
        });
    }
    workflow.set_token_option(option)
}

pub struct Console {
    workflow: SharedWorkflow,
}

impl Console {
    pub fn new(workflow: SharedWorkflow) -> Self {
        Self { workflow }
    }

    /// Read commands until `quit` or end of input
    pub async fn run<R>(self, input: R, mut events: Receiver<WorkflowEvent>) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let printer_workflow = self.workflow.clone();
        let printer = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(WorkflowEvent::StatusChanged {
                        message: Some(message),
                        ..
                    }) => println!("! {}", message),
                    Ok(WorkflowEvent::StageChanged { .. }) => {
                        println!("{}", render_screen(&printer_workflow.snapshot().await));
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Console fell behind workflow events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        println!("{}", render_screen(&self.workflow.snapshot().await));
        println!("Type `help` for commands.");

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(message) => {
                    println!("{}", message);
                    continue;
                }
            };

            match command {
                Command::Quit => break,
                Command::Help => println!("{}", HELP),
                Command::Show => match self.workflow.try_snapshot() {
                    Some(state) => println!("{}", render_screen(&state)),
                    None => println!("{}", WorkflowError::TransitionInFlight),
                },
                Command::Chart => match self.workflow.try_snapshot() {
                    Some(WorkflowState {
                        resolved_display: Some(display),
                        ..
                    }) => println!("{}", display.chart_json_pretty()),
                    Some(_) => println!("Nothing to display yet."),
                    None => println!("{}", WorkflowError::TransitionInFlight),
                },
                Command::Choose(number) => match choose(&self.workflow, number) {
                    Ok(()) => {
                        if let Some(state) = self.workflow.try_snapshot() {
                            println!("{}", render_screen(&state));
                        }
                    }
                    Err(err) => println!("{}", err),
                },
                Command::Token(token) => match self.workflow.set_custom_token(token) {
                    Ok(()) => println!("Custom token set."),
                    Err(err) => println!("{}", err),
                },
                Command::Method(option) => match set_method(&self.workflow, option) {
                    Ok(()) => println!("Token method: {}", option),
                    Err(err) => println!("{}", err),
                },
                Command::Next => self.spawn_transition(false),
                Command::Restart => self.spawn_transition(true),
            }
        }

        printer.abort();
        Ok(())
    }

    fn spawn_transition(&self, restart: bool) {
        let workflow = self.workflow.clone();
        tokio::spawn(async move {
            let result = if restart {
                workflow.restart().await
            } else {
                advance(&workflow).await
            };
            match result {
                Ok(stage) => debug!(stage = %stage, "Transition finished"),
                // Rejected before reaching the controller, so no status event
                Err(
                    err @ (WorkflowError::TransitionInFlight | WorkflowError::WrongStage { .. }),
                ) => println!("{}", err),
                Err(err) => debug!(error = %err, "Transition failed"),
            }
        });
    }
}
