pub mod action;
pub mod graph;
pub mod ledger;
pub mod player;
