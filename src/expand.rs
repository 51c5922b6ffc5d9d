//! Expanding a truncated description before it is read.
//!
//! The "...more" control may not exist yet when the page has just loaded, or
//! at all when the description is short. The waiter probes for it on a fixed
//! interval, clicks it once if it shows up, and gives up after a fixed number
//! of probes. Neither outcome is an error.

use std::fmt;
use tracing::{debug, info};

use crate::constants::Timing;
use crate::page::{PageError, PageSession};

pub const EXPAND_SELECTOR: &str = "#expand";

/// How the expansion phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
  Clicked,
  ButtonNotFound,
}

impl ExpandOutcome {
  pub fn label(self) -> &'static str {
    match self {
      ExpandOutcome::Clicked => "clicked",
      ExpandOutcome::ButtonNotFound => "button-not-found",
    }
  }
}

impl fmt::Display for ExpandOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaiterState {
  #[default]
  Idle,
  Polling {
    attempts: u32,
  },
  Expanded,
  TimedOut,
}

/// What the driver should do after a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
  /// Control found: click it, polling is over.
  Click,
  /// Not found yet: wait one interval and probe again.
  Retry,
  /// Bound reached without seeing the control.
  GiveUp,
}

/// Bounded retry state machine, independent of any clock.
#[derive(Debug, Clone)]
pub struct ExpansionWaiter {
  state: WaiterState,
  max_attempts: u32,
}

impl ExpansionWaiter {
  pub fn new(max_attempts: u32) -> Self {
    Self { state: WaiterState::Idle, max_attempts: max_attempts.max(1) }
  }

  pub fn state(&self) -> WaiterState {
    self.state
  }

  pub fn start(&mut self) {
    if self.state == WaiterState::Idle {
      self.state = WaiterState::Polling { attempts: 0 };
    }
  }

  /// Record the result of one probe. Terminal states absorb further calls.
  pub fn observe(&mut self, found: bool) -> Probe {
    match self.state {
      WaiterState::Idle => {
        self.start();
        self.observe(found)
      }
      WaiterState::Polling { attempts } => {
        let attempts = attempts + 1;
        if found {
          self.state = WaiterState::Expanded;
          Probe::Click
        } else if attempts >= self.max_attempts {
          self.state = WaiterState::TimedOut;
          Probe::GiveUp
        } else {
          self.state = WaiterState::Polling { attempts };
          Probe::Retry
        }
      }
      WaiterState::Expanded => Probe::Click,
      WaiterState::TimedOut => Probe::GiveUp,
    }
  }

  pub fn outcome(&self) -> Option<ExpandOutcome> {
    match self.state {
      WaiterState::Expanded => Some(ExpandOutcome::Clicked),
      WaiterState::TimedOut => Some(ExpandOutcome::ButtonNotFound),
      _ => None,
    }
  }
}

/// Drive the waiter against a live page until it reaches a terminal state.
///
/// Each probe is preceded by one poll interval. A page error during a probe
/// or the click aborts the run.
pub async fn wait_for_expansion<P: PageSession + ?Sized>(
  page: &mut P,
  timing: &Timing,
) -> Result<ExpandOutcome, PageError> {
  let mut waiter = ExpansionWaiter::new(timing.max_attempts);
  waiter.start();

  loop {
    tokio::time::sleep(timing.poll_interval).await;
    let found = page.has_expand_control().await?;
    match waiter.observe(found) {
      Probe::Click => page.click_expand_control().await?,
      Probe::Retry => {
        debug!(state = ?waiter.state(), "expand: control not found yet");
        continue;
      }
      Probe::GiveUp => {}
    }
    if let Some(outcome) = waiter.outcome() {
      info!(outcome = %outcome, max_attempts = timing.max_attempts, "expand: finished");
      return Ok(outcome);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::page::fake::ScriptedPage;
  use std::time::Duration;

  fn timing(max_attempts: u32) -> Timing {
    Timing { poll_interval: Duration::from_millis(500), max_attempts, settle_delay: Duration::from_millis(1500) }
  }

  #[test]
  fn waiter_clicks_on_first_sighting() {
    let mut waiter = ExpansionWaiter::new(5);
    assert_eq!(waiter.state(), WaiterState::Idle);
    waiter.start();
    assert_eq!(waiter.observe(false), Probe::Retry);
    assert_eq!(waiter.state(), WaiterState::Polling { attempts: 1 });
    assert_eq!(waiter.observe(true), Probe::Click);
    assert_eq!(waiter.state(), WaiterState::Expanded);
    assert_eq!(waiter.outcome(), Some(ExpandOutcome::Clicked));
  }

  #[test]
  fn waiter_gives_up_at_bound() {
    let mut waiter = ExpansionWaiter::new(3);
    waiter.start();
    assert_eq!(waiter.observe(false), Probe::Retry);
    assert_eq!(waiter.observe(false), Probe::Retry);
    assert_eq!(waiter.outcome(), None);
    assert_eq!(waiter.observe(false), Probe::GiveUp);
    assert_eq!(waiter.state(), WaiterState::TimedOut);
    assert_eq!(waiter.outcome(), Some(ExpandOutcome::ButtonNotFound));
    // Terminal state is sticky even if the control shows up later.
    assert_eq!(waiter.observe(true), Probe::GiveUp);
  }

  #[test]
  fn waiter_bound_is_at_least_one_probe() {
    let mut waiter = ExpansionWaiter::new(0);
    assert_eq!(waiter.observe(false), Probe::GiveUp);
  }

  #[test]
  fn outcome_labels() {
    assert_eq!(ExpandOutcome::Clicked.to_string(), "clicked");
    assert_eq!(ExpandOutcome::ButtonNotFound.to_string(), "button-not-found");
  }

  #[tokio::test(start_paused = true)]
  async fn driver_clicks_once_and_stops_polling() {
    let mut page = ScriptedPage { control_on_probe: Some(4), ..ScriptedPage::default() };
    let start = tokio::time::Instant::now();

    let outcome = wait_for_expansion(&mut page, &timing(22)).await.unwrap();

    assert_eq!(outcome, ExpandOutcome::Clicked);
    assert_eq!(page.probes, 4);
    assert_eq!(page.clicks, 1);
    assert_eq!(start.elapsed(), Duration::from_millis(4 * 500));
  }

  #[tokio::test(start_paused = true)]
  async fn driver_times_out_after_fixed_bound() {
    let mut page = ScriptedPage::default();
    let start = tokio::time::Instant::now();

    let outcome = wait_for_expansion(&mut page, &timing(22)).await.unwrap();

    assert_eq!(outcome, ExpandOutcome::ButtonNotFound);
    assert_eq!(page.probes, 22);
    assert_eq!(page.clicks, 0);
    assert_eq!(start.elapsed(), Duration::from_millis(22 * 500));
  }
}
