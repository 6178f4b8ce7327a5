//! Instruction builders. Account addresses are derived the same way the program derives them.

use anchor_lang::{InstructionData, ToAccountMetas};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;
use tahu_program::{
    accounts, instruction, CreateDaoArgs, CreateProposalArgs, Dao, DaoUpdate, Proposal, State,
    VoteRecord, VoteType, VotingThresholds,
};

fn build(accounts: impl ToAccountMetas, data: impl InstructionData) -> Instruction {
    Instruction {
        program_id: tahu_program::ID,
        accounts: accounts.to_account_metas(None),
        data: data.data(),
    }
}

pub fn initialize(authority: &Pubkey) -> Instruction {
    build(
        accounts::Initialize {
            authority: *authority,
            state: State::address(authority).0,
            system_program: system_program::ID,
        },
        instruction::Initialize {},
    )
}

/// Creates the DAO at index `dao_index` under `authority`'s state.
pub fn create_dao(authority: &Pubkey, dao_index: u64, args: CreateDaoArgs) -> Instruction {
    let state = State::address(authority).0;
    build(
        accounts::CreateDao {
            authority: *authority,
            state,
            dao: Dao::address(&state, dao_index).0,
            system_program: system_program::ID,
        },
        instruction::CreateDao { args },
    )
}

fn manage_dao(admin: &Pubkey, dao: &Pubkey) -> accounts::ManageDao {
    accounts::ManageDao {
        admin: *admin,
        dao: *dao,
    }
}

pub fn update_dao(admin: &Pubkey, dao: &Pubkey, update: DaoUpdate) -> Instruction {
    build(manage_dao(admin, dao), instruction::UpdateDao { update })
}

pub fn add_member(admin: &Pubkey, dao: &Pubkey, member: &Pubkey) -> Instruction {
    build(
        manage_dao(admin, dao),
        instruction::AddMember { member: *member },
    )
}

pub fn remove_member(admin: &Pubkey, dao: &Pubkey, member: &Pubkey) -> Instruction {
    build(
        manage_dao(admin, dao),
        instruction::RemoveMember { member: *member },
    )
}

pub fn change_voting_thresholds(
    admin: &Pubkey,
    dao: &Pubkey,
    thresholds: VotingThresholds,
) -> Instruction {
    build(
        manage_dao(admin, dao),
        instruction::ChangeVotingThresholds { thresholds },
    )
}

/// Creates the proposal at index `proposal_index` under `dao`.
pub fn create_proposal(
    proposer: &Pubkey,
    dao: &Pubkey,
    proposal_index: u64,
    args: CreateProposalArgs,
) -> Instruction {
    build(
        accounts::CreateProposal {
            proposer: *proposer,
            dao: *dao,
            proposal: Proposal::address(dao, proposal_index).0,
            system_program: system_program::ID,
        },
        instruction::CreateProposal { args },
    )
}

pub fn vote_on_proposal(
    voter: &Pubkey,
    dao: &Pubkey,
    proposal: &Pubkey,
    vote_type: VoteType,
) -> Instruction {
    build(
        accounts::VoteOnProposal {
            voter: *voter,
            dao: *dao,
            proposal: *proposal,
            vote_record: VoteRecord::address(proposal, voter).0,
            system_program: system_program::ID,
        },
        instruction::VoteOnProposal { vote_type },
    )
}

pub fn execute_proposal(dao: &Pubkey, proposal: &Pubkey) -> Instruction {
    build(
        accounts::ExecuteProposal {
            dao: *dao,
            proposal: *proposal,
        },
        instruction::ExecuteProposal {},
    )
}
