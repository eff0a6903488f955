use std::process::Stdio;

use connect_menu::states;
use tokio::process::Command;

use crate::connect::Peer;
use crate::error::DialogueError;
use crate::observability::DialogueEvent;
use crate::session::Session;
use crate::template::fill;

use super::Dispatcher;

/// Split a command line into arguments.
///
/// Whitespace separates arguments; single quotes are literal; double quotes allow
/// `\"` and `\\` escapes. Quoted empty strings are kept as empty arguments. A
/// `{{ ... }}` substitution is kept inside one argument even when it contains spaces.
///
/// # Errors
/// An unterminated quote or substitution, or a trailing backslash.
pub fn split_command(command: &str) -> Result<Vec<String>, DialogueError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = command.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            '\'' => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(unterminated("single quote")),
                    }
                }
            }
            '"' => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(unterminated("double quote")),
                        },
                        Some(c) => current.push(c),
                        None => return Err(unterminated("double quote")),
                    }
                }
            }
            '\\' => {
                in_arg = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => {
                        return Err(DialogueError::Command(
                            "trailing backslash in command".to_string(),
                        ));
                    }
                }
            }
            '{' if chars.peek() == Some(&'{') => {
                in_arg = true;
                current.push('{');
                let mut previous = '{';
                loop {
                    match chars.next() {
                        Some(c) => {
                            current.push(c);
                            if previous == '}' && c == '}' {
                                break;
                            }
                            previous = c;
                        }
                        None => return Err(unterminated("substitution")),
                    }
                }
            }
            c => {
                in_arg = true;
                current.push(c);
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}

fn unterminated(kind: &str) -> DialogueError {
    DialogueError::Command(format!("unterminated {kind} in command"))
}

/// Run `args[0]` with the rest as arguments; stdout then stderr on success.
async fn run_command(args: &[String]) -> Result<String, DialogueError> {
    let Some((program, rest)) = args.split_first() else {
        return Err(DialogueError::Command("empty command".to_string()));
    };
    let output = Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|error| DialogueError::Command(format!("{program}: {error}")))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        let detail = stderr.trim();
        return Err(DialogueError::Command(if detail.is_empty() {
            output.status.to_string()
        } else {
            format!("{}: {detail}", output.status)
        }));
    }
    Ok(format!("{stdout}{stderr}").trim_end().to_string())
}

/// Split first, then fill each argument on its own.
async fn run_templated(session: &Session, command: &str) -> Result<String, DialogueError> {
    let args = split_command(command)?
        .iter()
        .map(|arg| fill(arg, session))
        .collect::<Result<Vec<_>, _>>()?;
    run_command(&args).await
}

impl Dispatcher {
    /// Run a server command, echo its output, then open `goto`.
    ///
    /// A failed command is returned as [`DialogueError::Command`]; recovery echoes it
    /// and renders the final menu.
    pub(super) async fn run_exec(
        &self,
        peer: &Peer,
        session: &mut Session,
        command: &str,
        goto: &str,
        depth: usize,
    ) -> Result<String, DialogueError> {
        let output = match run_templated(session, command).await {
            Ok(output) => output,
            Err(error) => {
                tracing::warn!(
                    event = DialogueEvent::CommandExecuted.as_str(),
                    user_id = %peer.user_id,
                    error = %error,
                    "server command failed"
                );
                return Err(error);
            }
        };
        tracing::info!(
            event = DialogueEvent::CommandExecuted.as_str(),
            user_id = %peer.user_id,
            output_bytes = output.len(),
            "server command executed"
        );
        if !output.is_empty() {
            self.send_text(peer, &output, None).await;
        }
        let target = if goto.is_empty() { states::FINAL } else { goto };
        self.open_menu(peer, session, target, depth).await
    }
}
