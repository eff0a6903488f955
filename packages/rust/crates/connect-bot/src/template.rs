//! Substitution of session fields into configured texts.
//!
//! Templates use minijinja syntax over three roots: `User` (subscriber profile),
//! `Var` (session vars) and `Ticket` (wizard draft), e.g. `Hello, {{ User.name }}!`.

use minijinja::{Environment, context};

use crate::error::DialogueError;
use crate::session::Session;

/// Render `text` against `session`.
///
/// Text without `{{`/`{%` markers is returned unchanged without parsing.
///
/// # Errors
/// Malformed template syntax.
pub fn fill(text: &str, session: &Session) -> Result<String, DialogueError> {
    if !has_markers(text) {
        return Ok(text.to_string());
    }
    let env = Environment::new();
    let rendered = env.render_str(
        text,
        context! {
            User => &session.user,
            Var => &session.vars,
            Ticket => &session.ticket,
        },
    )?;
    Ok(rendered)
}

fn has_markers(text: &str) -> bool {
    text.contains("{{") || text.contains("{%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::Subscriber;

    #[test]
    fn plain_text_skips_the_engine() {
        let session = Session::new(Subscriber::default());
        // Unbalanced braces would be a syntax error if parsed.
        let text = "price: 10} or {10";
        assert_eq!(fill(text, &session).ok().as_deref(), Some(text));
    }
}
