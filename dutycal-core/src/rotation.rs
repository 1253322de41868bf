//! Round-robin selection of the next triage pair and the component split.

use chrono::{Datelike, Duration, NaiveDate};
use rand::Rng;

use crate::error::{DutyError, DutyResult, Inconsistency};
use crate::models::{cycle_end, Assignment, Components, DutyCycle, History, Roster, Shift};
use crate::sampler::sample;

/// The next cycle plus anything odd noticed while computing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    pub cycle: DutyCycle,
    pub inconsistencies: Vec<Inconsistency>,
}

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    let offset = day.weekday().number_from_monday() - 1;
    day - Duration::days(i64::from(offset))
}

/// Computes the cycle that follows the latest one in `history`.
///
/// With an empty history the first cycle starts on the Monday of `today`'s
/// week and goes to the first two roster entries. Otherwise the pair starts
/// one past whoever served second last time.
pub fn next_cycle<R>(
    history: &History,
    roster: &Roster,
    components: &Components,
    today: NaiveDate,
    rng: &mut R,
) -> DutyResult<Rotation>
where
    R: Rng + ?Sized,
{
    if roster.len() < 2 {
        return Err(DutyError::fatal(format!(
            "at least two triagers are required, found {}",
            roster.len()
        )));
    }
    if components.is_empty() {
        return Err(DutyError::fatal("no components configured"));
    }

    let mut inconsistencies = Vec::new();

    let (start_date, index) = match history.latest() {
        None => (week_start(today), 0),
        Some(last) => {
            let second = &last.assignment.second.triager;
            let index = match roster.position(second) {
                Some(position) => (position + 1) % roster.len(),
                None => {
                    let inconsistency = Inconsistency::TriagerLeftRoster {
                        name: second.clone(),
                    };
                    tracing::warn!(last_cycle = %last.start_date, "{}", inconsistency);
                    inconsistencies.push(inconsistency);
                    0
                }
            };
            (cycle_end(last.start_date), index)
        }
    };

    let (first, second) = match (roster.get(index), roster.get((index + 1) % roster.len())) {
        (Some(first), Some(second)) => (first, second),
        _ => return Err(DutyError::fatal("rotation index out of roster bounds")),
    };

    let names = components.names();
    let drawn = sample(&names, names.len() / 2, rng)?;
    let (first_set, second_set): (Vec<String>, Vec<String>) =
        names.into_iter().partition(|name| drawn.contains(name));

    tracing::debug!(
        start_date = %start_date,
        first = %first.name,
        second = %second.name,
        "Computed next duty cycle"
    );

    Ok(Rotation {
        cycle: DutyCycle::new(
            start_date,
            Assignment::new(
                Shift::new(first.name.clone(), first_set),
                Shift::new(second.name.clone(), second_set),
            ),
        ),
        inconsistencies,
    })
}
