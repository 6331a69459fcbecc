use super::session::Session;
use super::voting::VotingPhase;
use crate::belief::{PlayerInfo, Recommendation, SpaceMetrics};
use crate::model::graph::GraphData;
use crate::model::player::Player;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionGraphs {
    pub conspiracy: GraphData,
    pub relationships: GraphData,
}

/// Read-only view of a session for renderers and exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub player_info: Vec<PlayerInfo>,
    pub graphs: SessionGraphs,
    /// Ascending.
    pub eliminated_players: Vec<Player>,
    pub advisor: Vec<Recommendation>,
    pub candidate_space: SpaceMetrics,
    pub voting_phase: VotingPhase,
    pub messages: Vec<String>,
}

impl SessionReport {
    pub fn capture(session: &Session) -> Self {
        SessionReport {
            player_info: session
                .roster()
                .iter()
                .map(|player| session.player_info(player))
                .collect(),
            graphs: SessionGraphs {
                conspiracy: session.conspiracy().export(),
                relationships: session.relationships().export(),
            },
            eliminated_players: session.eliminated().iter().copied().collect(),
            advisor: session.recommend_checks(),
            candidate_space: session.space_metrics(),
            voting_phase: session.voting_phase(),
            messages: session.messages().to_vec(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
