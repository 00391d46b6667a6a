//! A console transport for local play and development.
//!
//! Menus render as a numbered button list; the player answers with either a
//! number or the literal button text. Runs as a detached tokio task wired to
//! the server's channels.

use log::{debug, error};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::error::TryRecvError;

use crate::transport::{ChatRef, IncomingMessage, TransportHandles};

/// The single local player's identifier.
const CONSOLE_PLAYER: &str = "console";

/// Spawn the console transport task. It owns stdin/stdout for the process
/// lifetime and exits when the server side of the channels goes away.
pub fn spawn(handles: TransportHandles) {
    tokio::spawn(run(handles));
}

async fn run(mut handles: TransportHandles) {
    let profile_names: Vec<String> = std::env::var("USER").ok().into_iter().collect();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current_menu: Vec<String> = Vec::new();

    // Kick the session off so something appears without a keypress. First
    // contact shows the intro whatever the text; an existing game keeps its
    // state and just gets the help line.
    if send_text(&handles, &profile_names, "/help").is_err() {
        return;
    }

    loop {
        // Drain every pending reply before prompting again; a single turn
        // can produce several messages (win announcement, leaderboard).
        loop {
            match handles.outgoing.try_recv() {
                Ok(turn) => {
                    println!("\n{}", turn.text);
                    if !turn.menu.is_empty() {
                        current_menu = turn.menu;
                        for (index, button) in current_menu.iter().enumerate() {
                            println!("  {}) {}", index + 1, button);
                        }
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("server channel closed; console transport exiting");
                    return;
                }
            }
        }

        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => return, // stdin closed
                    Err(err) => {
                        error!("console read error: {}", err);
                        return;
                    }
                };
                let text = resolve_choice(&current_menu, line.trim());
                if text.is_empty() {
                    continue;
                }
                if send_text(&handles, &profile_names, &text).is_err() {
                    return;
                }
            }
            turn = handles.outgoing.recv() => {
                match turn {
                    Some(turn) => {
                        println!("\n{}", turn.text);
                        if !turn.menu.is_empty() {
                            current_menu = turn.menu;
                            for (index, button) in current_menu.iter().enumerate() {
                                println!("  {}) {}", index + 1, button);
                            }
                        }
                    }
                    None => {
                        debug!("server channel closed; console transport exiting");
                        return;
                    }
                }
            }
        }
    }
}

/// A bare number picks the matching button; anything else is sent verbatim.
fn resolve_choice(menu: &[String], input: &str) -> String {
    if let Ok(index) = input.parse::<usize>() {
        if index >= 1 {
            if let Some(button) = menu.get(index - 1) {
                return button.clone();
            }
        }
    }
    input.to_string()
}

fn send_text(
    handles: &TransportHandles,
    profile_names: &[String],
    text: &str,
) -> Result<(), ()> {
    handles
        .incoming
        .send(IncomingMessage {
            chat: ChatRef(CONSOLE_PLAYER.to_string()),
            player_id: CONSOLE_PLAYER.to_string(),
            profile_names: profile_names.to_vec(),
            text: text.to_string(),
        })
        .map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::resolve_choice;

    #[test]
    fn numbers_map_to_buttons() {
        let menu = vec!["Look in the bag".to_string(), "Go home".to_string()];
        assert_eq!(resolve_choice(&menu, "2"), "Go home");
        assert_eq!(resolve_choice(&menu, "1"), "Look in the bag");
    }

    #[test]
    fn out_of_range_and_text_pass_through() {
        let menu = vec!["Go home".to_string()];
        assert_eq!(resolve_choice(&menu, "7"), "7");
        assert_eq!(resolve_choice(&menu, "0"), "0");
        assert_eq!(resolve_choice(&menu, "/help"), "/help");
    }
}
