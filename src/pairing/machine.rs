//! Team-pairing state machine.
//!
//! ```text
//! Idle ──choose_team_a──► TeamAChosen ──choose_team_b──► TeamBChosen
//!                              ▲                              │ request_prediction
//!                              │                              ▼   (loading runs)
//!                              └────── choose_team_a ─── ResultShown
//! ```
//!
//! `choose_team_a` is accepted from every state and always drops team B,
//! the shown result and any loading run still in flight.

use chrono::{DateTime, Local};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::loading::{LoadingCompletion, LoadingSequence};
use crate::teams::{filter_by_term, OpponentResolver, Team, TeamRoster};

use super::prediction::{FixedOdds, PredictionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingState {
    Idle,
    TeamAChosen,
    TeamBChosen,
    ResultShown,
}

/// Current picks. `team_a_confirmed` gates whether team B can be chosen.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Selection {
    pub team_a: Option<Team>,
    pub team_b: Option<Team>,
    pub team_a_confirmed: bool,
}

/// Serializable view of the machine for the API.
#[derive(Debug, Clone, Serialize)]
pub struct PairingSnapshot {
    pub state: PairingState,
    pub selection: Selection,
    pub opponents: Vec<Team>,
    pub team_b_enabled: bool,
    pub prediction_pending: bool,
    pub result: Option<PredictionResult>,
}

/// Seconds range the loading duration is sampled from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadingBounds {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for LoadingBounds {
    fn default() -> Self {
        LoadingBounds {
            min_secs: 3.0,
            max_secs: 4.0,
        }
    }
}

pub struct PairingMachine {
    roster: Arc<TeamRoster>,
    resolver: Arc<dyn OpponentResolver>,
    odds: FixedOdds,
    bounds: LoadingBounds,
    state: PairingState,
    selection: Selection,
    opponents: Vec<Team>,
    result: Option<PredictionResult>,
    /// Ticket of the loading run whose completion is still accepted.
    pending: Option<u64>,
    next_ticket: u64,
}

impl PairingMachine {
    pub fn new(
        roster: Arc<TeamRoster>,
        resolver: Arc<dyn OpponentResolver>,
        odds: FixedOdds,
        bounds: LoadingBounds,
    ) -> Self {
        PairingMachine {
            roster,
            resolver,
            odds,
            bounds,
            state: PairingState::Idle,
            selection: Selection::default(),
            opponents: Vec::new(),
            result: None,
            pending: None,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> PairingState {
        self.state
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn opponents(&self) -> &[Team] {
        &self.opponents
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    pub fn team_b_enabled(&self) -> bool {
        self.selection.team_a_confirmed && !self.opponents.is_empty()
    }

    /// Team B candidates narrowed by a search term.
    pub fn opponent_suggestions(&self, term: &str) -> Vec<Team> {
        filter_by_term(&self.opponents, term)
    }

    /// Select team A. Names outside the roster are ignored and `false` is
    /// returned with the machine untouched.
    pub fn choose_team_a(&mut self, name: &str) -> bool {
        let Some(team) = self.roster.find(name).cloned() else {
            debug!("Ignoring team A '{}': not in roster", name);
            return false;
        };

        self.opponents = self.resolver.opponents(&team);
        debug!(
            "Team A = {} ({} opponent(s) via {} resolver)",
            team,
            self.opponents.len(),
            self.resolver.name()
        );
        self.selection = Selection {
            team_a: Some(team),
            team_b: None,
            team_a_confirmed: true,
        };
        self.result = None;
        self.pending = None;
        self.state = PairingState::TeamAChosen;
        true
    }

    /// Select team B from the current opponent set.
    pub fn choose_team_b(&mut self, name: &str) -> bool {
        if self.state == PairingState::Idle || !self.selection.team_a_confirmed {
            debug!("Ignoring team B '{}': team A not chosen", name);
            return false;
        }
        let Some(team) = self.opponents.iter().find(|t| t.matches(name)).cloned() else {
            debug!("Ignoring team B '{}': not a valid opponent", name);
            return false;
        };

        self.selection.team_b = Some(team);
        self.result = None;
        self.pending = None;
        self.state = PairingState::TeamBChosen;
        true
    }

    /// Start a loading run for the current pair. Only valid in `TeamBChosen`;
    /// a second request supersedes the first run's ticket.
    pub fn request_prediction<R: Rng>(&mut self, rng: &mut R) -> Option<LoadingSequence> {
        if self.state != PairingState::TeamBChosen {
            debug!("Ignoring prediction request in state {:?}", self.state);
            return None;
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending = Some(ticket);
        Some(LoadingSequence::sample(
            rng,
            ticket,
            self.bounds.min_secs,
            self.bounds.max_secs,
        ))
    }

    /// Consume a loading continuation. Completions from superseded runs, or
    /// arriving after the pair changed, are discarded.
    pub fn complete_prediction(
        &mut self,
        completion: LoadingCompletion,
        now: DateTime<Local>,
    ) -> Option<&PredictionResult> {
        if self.pending != Some(completion.ticket) || self.state != PairingState::TeamBChosen {
            debug!("Discarding stale loading completion {}", completion.ticket);
            return None;
        }
        let (Some(team_a), Some(team_b)) = (
            self.selection.team_a.clone(),
            self.selection.team_b.clone(),
        ) else {
            return None;
        };

        self.pending = None;
        self.result = Some(PredictionResult::compute(team_a, team_b, self.odds, now));
        self.state = PairingState::ResultShown;
        self.result.as_ref()
    }

    pub fn snapshot(&self) -> PairingSnapshot {
        PairingSnapshot {
            state: self.state(),
            selection: self.selection().clone(),
            opponents: self.opponents().to_vec(),
            team_b_enabled: self.team_b_enabled(),
            prediction_pending: self.pending.is_some(),
            result: self.result().cloned(),
        }
    }
}
