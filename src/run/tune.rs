use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use std::time::Instant;

use crate::allocation::{AllocationCommand, AllocationSession, AllocationStore, Handle};
use crate::models::Slot;

use super::cli::{allocation_bar, parse_pct, BAR_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum TuneAction {
    Apply(AllocationCommand),
    Show,
    Save,
    Discard,
    Help,
    Quit,
}

/// Parse one editor line. Blank lines yield `None`.
pub(super) fn parse_line(line: &str, min_segment: f64) -> Result<Option<TuneAction>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((head, rest)) = words.split_first() else {
        return Ok(None);
    };

    let action = match (head.to_lowercase().as_str(), rest) {
        ("q" | "quit" | "exit", []) => TuneAction::Quit,
        ("show" | "p", []) => TuneAction::Show,
        ("save" | "w", []) => TuneAction::Save,
        ("undo" | "u", []) => TuneAction::Discard,
        ("help" | "?", []) => TuneAction::Help,
        ("reset", []) => TuneAction::Apply(AllocationCommand::Reset),
        ("set", [needs, wants, savings]) => TuneAction::Apply(AllocationCommand::Set {
            needs: parse_pct(needs)?,
            wants: parse_pct(wants)?,
            savings: parse_pct(savings)?,
        }),
        ("bounds", [low, high]) => TuneAction::Apply(AllocationCommand::Boundaries {
            low: parse_pct(low)?,
            high: parse_pct(high)?,
            min_segment,
        }),
        (word @ ("low" | "high"), [amount]) => {
            let handle = Handle::parse(word)
                .ok_or_else(|| anyhow::anyhow!("Unknown handle '{word}'"))?;
            if amount.starts_with('+') || amount.starts_with('-') {
                let delta: i32 = amount
                    .parse()
                    .with_context(|| format!("Not a whole number: '{amount}'"))?;
                TuneAction::Apply(AllocationCommand::Nudge {
                    handle,
                    delta,
                    min_segment,
                })
            } else {
                TuneAction::Apply(AllocationCommand::Move {
                    handle,
                    position: parse_pct(amount)?,
                    min_segment,
                })
            }
        }
        (word, [value]) => match Slot::parse(word) {
            Some(slot) => TuneAction::Apply(AllocationCommand::Edit {
                slot,
                value: parse_pct(value)?,
            }),
            None => bail!("Unknown command '{line}' (try 'help')"),
        },
        _ => bail!("Unknown command '{line}' (try 'help')"),
    };
    Ok(Some(action))
}

/// Drive a session from line input until `quit` or end of input. Edits
/// are saved once they have been idle for the debounce window, checked
/// whenever a new line arrives; whatever is pending at exit is flushed.
pub(super) fn run_tune<S, R, W>(
    store: &mut S,
    session: &mut AllocationSession,
    min_segment: f64,
    input: R,
    out: &mut W,
    mut clock: impl FnMut() -> Instant,
) -> Result<()>
where
    S: AllocationStore + ?Sized,
    R: BufRead,
    W: Write,
{
    writeln!(out, "Tuning {} for '{}'. Type 'help' for commands.", session.month(), session.owner())?;
    print_state(out, session, clock())?;

    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        let now = clock();
        save_if_due(store, session, now, out)?;

        match parse_line(&line, min_segment) {
            Ok(None) => {}
            Ok(Some(TuneAction::Quit)) => break,
            Ok(Some(TuneAction::Apply(command))) => {
                session.apply(command, now);
                print_state(out, session, now)?;
            }
            Ok(Some(TuneAction::Show)) => print_state(out, session, now)?,
            Ok(Some(TuneAction::Save)) => save_now(store, session, out)?,
            Ok(Some(TuneAction::Discard)) => {
                if session.discard() {
                    print_state(out, session, now)?;
                } else {
                    writeln!(out, "  nothing to undo")?;
                }
            }
            Ok(Some(TuneAction::Help)) => print_help(out)?,
            Err(e) => writeln!(out, "  {e:#}")?,
        }
    }

    save_now(store, session, out)
}

/// Persist once the debounce window has elapsed. A failure is reported
/// only for the write attempted here.
fn save_if_due<S, W>(store: &mut S, session: &mut AllocationSession, now: Instant, out: &mut W) -> Result<()>
where
    S: AllocationStore + ?Sized,
    W: Write,
{
    let due = session.time_until_save(now).is_some_and(|wait| wait.is_zero());
    if session.poll(store, now) {
        writeln!(out, "  saved")?;
    } else if due {
        report_error(out, session)?;
    }
    Ok(())
}

fn save_now<S, W>(store: &mut S, session: &mut AllocationSession, out: &mut W) -> Result<()>
where
    S: AllocationStore + ?Sized,
    W: Write,
{
    let pending = session.is_dirty();
    if session.flush(store) {
        writeln!(out, "  saved")?;
    } else if pending {
        report_error(out, session)?;
    }
    Ok(())
}

fn print_state<W: Write>(out: &mut W, session: &AllocationSession, now: Instant) -> Result<()> {
    let value = session.value();
    let status = if session.is_dirty() {
        let wait = session.time_until_save(now).unwrap_or_default();
        format!("  (saving in {}ms)", wait.as_millis())
    } else if !session.is_stored() {
        "  (default)".to_string()
    } else {
        String::new()
    };
    writeln!(out, "{}", allocation_bar(value, BAR_WIDTH))?;
    writeln!(out, "{value}{status}")?;
    Ok(())
}

fn report_error<W: Write>(out: &mut W, session: &AllocationSession) -> Result<()> {
    if let Some(err) = session.last_error() {
        writeln!(out, "  ! {err}")?;
    }
    Ok(())
}

fn print_help<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "  needs|wants|savings <N>   set one slot, rebalance the others")?;
    writeln!(out, "  set <N> <W> <S>           set all three")?;
    writeln!(out, "  low|high <N>              move a divider to N")?;
    writeln!(out, "  low|high +N / -N          nudge a divider")?;
    writeln!(out, "  bounds <LOW> <HIGH>       place both dividers")?;
    writeln!(out, "  reset                     back to 50/30/20")?;
    writeln!(out, "  undo                      drop the unsaved edit")?;
    writeln!(out, "  show | save | quit")?;
    Ok(())
}

#[cfg(test)]
#[path = "tune_tests.rs"]
mod tests;
