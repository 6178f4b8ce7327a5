use anchor_lang::{InstructionData, ToAccountMetas};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_program};
use tahu_program::accounts::*;
use tahu_program::{
    instruction, CreateDaoArgs, CreateProposalArgs, DaoUpdate, VoteType, VotingThresholds,
};

pub fn initialize(authority: &Pubkey, state: &Pubkey) -> (Initialize, Instruction) {
    let accounts = Initialize {
        authority: *authority,
        state: *state,
        system_program: system_program::ID,
    };

    let data = instruction::Initialize {}.data();

    let instruction = Instruction {
        program_id: tahu_program::ID,
        data,
        accounts: accounts.to_account_metas(None),
    };

    (accounts, instruction)
}

pub fn create_dao(
    authority: &Pubkey,
    state: &Pubkey,
    dao: &Pubkey,
    args: CreateDaoArgs,
) -> (CreateDao, Instruction) {
    let accounts = CreateDao {
        authority: *authority,
        state: *state,
        dao: *dao,
        system_program: system_program::ID,
    };

    let data = instruction::CreateDao { args }.data();

    let instruction = Instruction {
        program_id: tahu_program::ID,
        data,
        accounts: accounts.to_account_metas(None),
    };

    (accounts, instruction)
}

fn manage_dao(admin: &Pubkey, dao: &Pubkey, data: Vec<u8>) -> (ManageDao, Instruction) {
    let accounts = ManageDao {
        admin: *admin,
        dao: *dao,
    };

    let instruction = Instruction {
        program_id: tahu_program::ID,
        data,
        accounts: accounts.to_account_metas(None),
    };

    (accounts, instruction)
}

pub fn update_dao(admin: &Pubkey, dao: &Pubkey, update: DaoUpdate) -> (ManageDao, Instruction) {
    manage_dao(admin, dao, instruction::UpdateDao { update }.data())
}

pub fn add_member(admin: &Pubkey, dao: &Pubkey, member: &Pubkey) -> (ManageDao, Instruction) {
    manage_dao(
        admin,
        dao,
        instruction::AddMember { member: *member }.data(),
    )
}

pub fn remove_member(admin: &Pubkey, dao: &Pubkey, member: &Pubkey) -> (ManageDao, Instruction) {
    manage_dao(
        admin,
        dao,
        instruction::RemoveMember { member: *member }.data(),
    )
}

pub fn change_voting_thresholds(
    admin: &Pubkey,
    dao: &Pubkey,
    thresholds: VotingThresholds,
) -> (ManageDao, Instruction) {
    manage_dao(
        admin,
        dao,
        instruction::ChangeVotingThresholds { thresholds }.data(),
    )
}

pub fn create_proposal(
    proposer: &Pubkey,
    dao: &Pubkey,
    proposal: &Pubkey,
    args: CreateProposalArgs,
) -> (CreateProposal, Instruction) {
    let accounts = CreateProposal {
        proposer: *proposer,
        dao: *dao,
        proposal: *proposal,
        system_program: system_program::ID,
    };

    let data = instruction::CreateProposal { args }.data();

    let instruction = Instruction {
        program_id: tahu_program::ID,
        data,
        accounts: accounts.to_account_metas(None),
    };

    (accounts, instruction)
}

pub fn vote_on_proposal(
    voter: &Pubkey,
    dao: &Pubkey,
    proposal: &Pubkey,
    vote_record: &Pubkey,
    vote_type: VoteType,
) -> (VoteOnProposal, Instruction) {
    let accounts = VoteOnProposal {
        voter: *voter,
        dao: *dao,
        proposal: *proposal,
        vote_record: *vote_record,
        system_program: system_program::ID,
    };

    let data = instruction::VoteOnProposal { vote_type }.data();

    let instruction = Instruction {
        program_id: tahu_program::ID,
        data,
        accounts: accounts.to_account_metas(None),
    };

    (accounts, instruction)
}

pub fn execute_proposal(dao: &Pubkey, proposal: &Pubkey) -> (ExecuteProposal, Instruction) {
    let accounts = ExecuteProposal {
        dao: *dao,
        proposal: *proposal,
    };

    let data = instruction::ExecuteProposal {}.data();

    let instruction = Instruction {
        program_id: tahu_program::ID,
        data,
        accounts: accounts.to_account_metas(None),
    };

    (accounts, instruction)
}
