// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell-command splitting.
//!
//! Commands are stored as single strings and split into an argv before
//! spawning. Splitting honors single and double quotes but performs no
//! expansion; only the first token is subject to whitelisting.

/// Split a command string into an argv.
///
/// Whitespace separates tokens; quoted segments (single or double) keep
/// their whitespace and drop the quotes. An unterminated quote keeps the
/// remainder as the final token. Empty or blank input yields an empty
/// argv.
pub fn split_command(command: &str) -> Vec<String> {
    let mut argv = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in command.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                } else {
                    current.push(ch);
                }
            }
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        argv.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }
    if in_token {
        argv.push(current);
    }
    argv
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
