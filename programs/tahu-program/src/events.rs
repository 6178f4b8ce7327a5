use anchor_lang::prelude::*;

use crate::VoteType;

#[event]
pub struct StateInitialized {
    pub state: Pubkey,
    pub authority: Pubkey,
    pub slot: u64,
    pub unix_timestamp: i64,
}

#[event]
pub struct DaoCreated {
    pub state: Pubkey,
    pub dao: Pubkey,
    pub id: u64,
    pub admin: Pubkey,
    pub member_count: u32,
    pub slot: u64,
    pub unix_timestamp: i64,
}

#[event]
pub struct ProposalCreated {
    pub dao: Pubkey,
    pub proposal: Pubkey,
    pub id: u64,
    pub proposer: Pubkey,
    pub end_time: i64,
    pub slot: u64,
    pub unix_timestamp: i64,
}

#[event]
pub struct VoteCast {
    pub proposal: Pubkey,
    pub voter: Pubkey,
    pub vote_type: VoteType,
    pub slot: u64,
    pub unix_timestamp: i64,
}

#[event]
pub struct ProposalExecuted {
    pub dao: Pubkey,
    pub proposal: Pubkey,
    pub changes_applied: u32,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub abstain_votes: u64,
    pub slot: u64,
    pub unix_timestamp: i64,
}
