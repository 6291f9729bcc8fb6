// src/commands/mod.rs

//! Command implementations for the ripple CLI.

pub mod propagate;
pub mod revert;
pub mod sessions;

use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Read one line of operator input after a prompt.
fn prompt_line(question: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", question)?;
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Plain yes/no confirmation. Empty input means no.
fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N]", question))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Prompt for a single 1-based index into a list of `len` entries.
fn prompt_index(question: &str, len: usize) -> Result<usize> {
    let answer = prompt_line(question)?;
    let number: usize = answer
        .parse()
        .map_err(|_| ripple::Error::InvalidSelection(format!("'{}' is not a number", answer)))?;
    if number == 0 || number > len {
        return Err(ripple::Error::InvalidSelection(format!("index {} out of range", number)).into());
    }
    Ok(number - 1)
}

/// Prompt for a comma-separated list of 1-based indices, or "all".
fn prompt_indices(question: &str, len: usize) -> Result<Vec<usize>> {
    let answer = prompt_line(question)?;
    if answer.eq_ignore_ascii_case("all") {
        return Ok((0..len).collect());
    }

    let mut indices = Vec::new();
    for token in answer.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let number: usize = token.parse().map_err(|_| {
            ripple::Error::InvalidSelection(format!("'{}' is not a number", token))
        })?;
        if number == 0 || number > len {
            return Err(
                ripple::Error::InvalidSelection(format!("index {} out of range", number)).into(),
            );
        }
        // Repeated indices collapse to one pick.
        if !indices.contains(&(number - 1)) {
            indices.push(number - 1);
        }
    }
    if indices.is_empty() {
        return Err(ripple::Error::InvalidSelection("empty selection".to_string()).into());
    }
    Ok(indices)
}
