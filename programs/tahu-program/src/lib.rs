#![allow(clippy::result_large_err)]

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

pub mod events;
pub mod state;

use events::*;
pub use state::*;

declare_id!("7WgKkpNXu2ZQqN5KpfFRXaCkhTcSBYcnnvbS7tA6ZLbd");

pub const STATE_SEED_PREFIX: &[u8] = b"state";
pub const DAO_SEED_PREFIX: &[u8] = b"dao";
pub const PROPOSAL_SEED_PREFIX: &[u8] = b"proposal";
pub const VOTE_SEED_PREFIX: &[u8] = b"vote";

/// Longest voting window a proposal may request, in seconds.
pub const MAX_VOTING_PERIOD: i64 = 30 * 24 * 60 * 60;

fn pda_bump(bumps: &BTreeMap<String, u8>, name: &str) -> Result<u8> {
    bumps
        .get(name)
        .copied()
        .ok_or_else(|| error!(TahuError::BumpNotFound))
}

#[program]
pub mod tahu_program {
    use super::*;

    //////////////////////////////////////////////////////////////////////////////////////
    // SETUP INSTRUCTIONS.
    //////////////////////////////////////////////////////////////////////////////////////

    // Create the caller's state account. The address is derived from the caller, so this
    // succeeds at most once per signer.
    pub fn initialize(ctx: Context<Initialize>) -> Result<()> {
        let state = &mut ctx.accounts.state;
        state.authority = ctx.accounts.authority.key();
        state.dao_count = 0;
        state.bump = pda_bump(&ctx.bumps, "state")?;

        msg!("State {} initialized for {}", state.key(), state.authority);

        let clock = Clock::get()?;
        emit!(StateInitialized {
            state: state.key(),
            authority: state.authority,
            slot: clock.slot,
            unix_timestamp: clock.unix_timestamp,
        });
        Ok(())
    }

    // Register a new DAO under the caller's state.
    pub fn create_dao(ctx: Context<CreateDao>, args: CreateDaoArgs) -> Result<()> {
        let state = &mut ctx.accounts.state;
        let dao = &mut ctx.accounts.dao;

        dao.state = state.key();
        dao.admin = ctx.accounts.authority.key();
        dao.id = state.dao_count;
        dao.set_name(args.name)?;
        dao.set_description(args.description)?;
        dao.set_members(args.members)?;
        dao.set_voting_thresholds(args.voting_thresholds)?;
        dao.proposal_count = 0;
        dao.bump = pda_bump(&ctx.bumps, "dao")?;

        state.dao_count = state
            .dao_count
            .checked_add(1)
            .ok_or(TahuError::ArithmeticOverflow)?;

        let clock = Clock::get()?;
        emit!(DaoCreated {
            state: state.key(),
            dao: dao.key(),
            id: dao.id,
            admin: dao.admin,
            member_count: dao.members.len() as u32,
            slot: clock.slot,
            unix_timestamp: clock.unix_timestamp,
        });
        Ok(())
    }

    //////////////////////////////////////////////////////////////////////////////////////
    // ADMIN INSTRUCTIONS.
    //////////////////////////////////////////////////////////////////////////////////////

    pub fn update_dao(ctx: Context<ManageDao>, update: DaoUpdate) -> Result<()> {
        ctx.accounts.dao.apply_update(update)
    }

    pub fn add_member(ctx: Context<ManageDao>, member: Pubkey) -> Result<()> {
        ctx.accounts.dao.add_member(member)?;
        msg!("Added member {} to DAO {}", member, ctx.accounts.dao.key());
        Ok(())
    }

    pub fn remove_member(ctx: Context<ManageDao>, member: Pubkey) -> Result<()> {
        ctx.accounts.dao.remove_member(&member)?;
        msg!("Removed member {} from DAO {}", member, ctx.accounts.dao.key());
        Ok(())
    }

    pub fn change_voting_thresholds(
        ctx: Context<ManageDao>,
        thresholds: VotingThresholds,
    ) -> Result<()> {
        ctx.accounts.dao.set_voting_thresholds(thresholds)
    }

    //////////////////////////////////////////////////////////////////////////////////////
    // MEMBER INSTRUCTIONS.
    //////////////////////////////////////////////////////////////////////////////////////

    // Open a proposal. The voting window starts now and lasts `duration_secs`.
    pub fn create_proposal(ctx: Context<CreateProposal>, args: CreateProposalArgs) -> Result<()> {
        let dao = &mut ctx.accounts.dao;

        require!(
            dao.members.len() as u64 >= dao.voting_thresholds.proposal_creation_threshold,
            TahuError::NotEnoughMembers
        );
        require!(
            args.duration_secs > 0 && args.duration_secs <= MAX_VOTING_PERIOD,
            TahuError::InvalidVotingPeriod
        );
        ProposedChange::validate_all(&args.proposed_changes, &dao.key())?;

        let clock = Clock::get()?;
        let proposal = &mut ctx.accounts.proposal;
        proposal.dao = dao.key();
        proposal.id = dao.proposal_count;
        proposal.proposer = ctx.accounts.proposer.key();
        proposal.set_title(args.title)?;
        proposal.set_description(args.description)?;
        proposal.proposed_changes = args.proposed_changes;
        proposal.electorate = dao.members.clone();
        proposal.start_time = clock.unix_timestamp;
        proposal.end_time = clock
            .unix_timestamp
            .checked_add(args.duration_secs)
            .ok_or(TahuError::ArithmeticOverflow)?;
        proposal.yes_votes = 0;
        proposal.no_votes = 0;
        proposal.abstain_votes = 0;
        proposal.executed = false;
        proposal.bump = pda_bump(&ctx.bumps, "proposal")?;

        dao.proposal_count = dao
            .proposal_count
            .checked_add(1)
            .ok_or(TahuError::ArithmeticOverflow)?;

        emit!(ProposalCreated {
            dao: dao.key(),
            proposal: proposal.key(),
            id: proposal.id,
            proposer: proposal.proposer,
            end_time: proposal.end_time,
            slot: clock.slot,
            unix_timestamp: clock.unix_timestamp,
        });
        Ok(())
    }

    // Cast a vote. The vote record is created with `init`, so a second vote by the same
    // member on the same proposal fails before reaching this handler.
    pub fn vote_on_proposal(ctx: Context<VoteOnProposal>, vote_type: VoteType) -> Result<()> {
        let clock = Clock::get()?;
        let proposal = &mut ctx.accounts.proposal;

        require!(!proposal.executed, TahuError::ProposalAlreadyExecuted);
        if !proposal.voting_open(clock.unix_timestamp) {
            msg!(
                "Voting closed at {}. Current timestamp: {}",
                proposal.end_time,
                clock.unix_timestamp
            );
            return Err(TahuError::VotingClosed.into());
        }
        proposal.record_vote(vote_type)?;

        let record = &mut ctx.accounts.vote_record;
        record.proposal = proposal.key();
        record.voter = ctx.accounts.voter.key();
        record.vote_type = vote_type;
        record.bump = pda_bump(&ctx.bumps, "vote_record")?;

        emit!(VoteCast {
            proposal: proposal.key(),
            voter: record.voter,
            vote_type,
            slot: clock.slot,
            unix_timestamp: clock.unix_timestamp,
        });
        Ok(())
    }

    //////////////////////////////////////////////////////////////////////////////////////
    // PERMISSIONLESS INSTRUCTIONS.
    //////////////////////////////////////////////////////////////////////////////////////

    // Apply an approved proposal's changes to its DAO. Allowed once the voting window has
    // closed, or earlier if the whole electorate has already voted.
    pub fn execute_proposal(ctx: Context<ExecuteProposal>) -> Result<()> {
        let clock = Clock::get()?;
        let dao = &mut ctx.accounts.dao;
        let proposal = &mut ctx.accounts.proposal;

        require!(!proposal.executed, TahuError::ProposalAlreadyExecuted);

        if proposal.voting_open(clock.unix_timestamp) && !proposal.everyone_voted()? {
            msg!(
                "Voting closes at {}. Current timestamp: {}",
                proposal.end_time,
                clock.unix_timestamp
            );
            return Err(TahuError::VotingStillOpen.into());
        }

        if !proposal.is_approved(&dao.voting_thresholds) {
            msg!(
                "Tally yes={} no={} abstain={} with {} eligible voters",
                proposal.yes_votes,
                proposal.no_votes,
                proposal.abstain_votes,
                proposal.electorate.len()
            );
            return Err(TahuError::ProposalNotApproved.into());
        }

        for change in proposal.proposed_changes.iter() {
            dao.apply_change(change)?;
        }
        proposal.executed = true;

        emit!(ProposalExecuted {
            dao: dao.key(),
            proposal: proposal.key(),
            changes_applied: proposal.proposed_changes.len() as u32,
            yes_votes: proposal.yes_votes,
            no_votes: proposal.no_votes,
            abstain_votes: proposal.abstain_votes,
            slot: clock.slot,
            unix_timestamp: clock.unix_timestamp,
        });
        Ok(())
    }
}

//////////////////////////////////////////
// CONTEXT FOR SETUP INSTRUCTIONS:
/////////////////////////////////////////

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,
    #[account(
        init,
        seeds = [STATE_SEED_PREFIX, authority.key().as_ref()],
        bump,
        payer = authority,
        space = State::SPACE,
    )]
    pub state: Account<'info, State>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct CreateDao<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,
    #[account(
        mut,
        has_one = authority,
        seeds = [STATE_SEED_PREFIX, authority.key().as_ref()],
        bump = state.bump,
    )]
    pub state: Account<'info, State>,
    #[account(
        init,
        seeds = [DAO_SEED_PREFIX, state.key().as_ref(), &state.dao_count.to_le_bytes()],
        bump,
        payer = authority,
        space = Dao::SPACE,
    )]
    pub dao: Account<'info, Dao>,
    pub system_program: Program<'info, System>,
}

//////////////////////////////////////////
// CONTEXT FOR ADMIN INSTRUCTIONS:
/////////////////////////////////////////

#[derive(Accounts)]
pub struct ManageDao<'info> {
    pub admin: Signer<'info>,
    #[account(mut, has_one = admin)]
    pub dao: Account<'info, Dao>,
}

//////////////////////////////////////////
// CONTEXT FOR MEMBER INSTRUCTIONS:
/////////////////////////////////////////

#[derive(Accounts)]
pub struct CreateProposal<'info> {
    #[account(mut)]
    pub proposer: Signer<'info>,
    #[account(
        mut,
        constraint = dao.is_member(&proposer.key()) @ TahuError::NotAMember
    )]
    pub dao: Account<'info, Dao>,
    #[account(
        init,
        seeds = [PROPOSAL_SEED_PREFIX, dao.key().as_ref(), &dao.proposal_count.to_le_bytes()],
        bump,
        payer = proposer,
        space = Proposal::SPACE,
    )]
    pub proposal: Account<'info, Proposal>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct VoteOnProposal<'info> {
    #[account(mut)]
    pub voter: Signer<'info>,
    #[account(constraint = dao.is_member(&voter.key()) @ TahuError::NotAMember)]
    pub dao: Account<'info, Dao>,
    #[account(
        mut,
        has_one = dao,
        constraint = proposal.is_eligible(&voter.key()) @ TahuError::NotInElectorate
    )]
    pub proposal: Account<'info, Proposal>,
    #[account(
        init,
        seeds = [VOTE_SEED_PREFIX, proposal.key().as_ref(), voter.key().as_ref()],
        bump,
        payer = voter,
        space = VoteRecord::SPACE,
    )]
    pub vote_record: Account<'info, VoteRecord>,
    pub system_program: Program<'info, System>,
}

///////////////////////////////////////////
// CONTEXT FOR PERMISSIONLESS INSTRUCTIONS:
/////////////////////////////////////////

#[derive(Accounts)]
pub struct ExecuteProposal<'info> {
    #[account(mut)]
    pub dao: Account<'info, Dao>,
    #[account(mut, has_one = dao)]
    pub proposal: Account<'info, Proposal>,
}

#[error_code]
pub enum TahuError {
    #[msg("name exceeds the maximum length")]
    NameTooLong,
    #[msg("description exceeds the maximum length")]
    DescriptionTooLong,
    #[msg("title exceeds the maximum length")]
    TitleTooLong,
    #[msg("member list is full")]
    TooManyMembers,
    #[msg("member list contains a duplicate")]
    DuplicateMember,
    #[msg("account is already a member")]
    MemberAlreadyExists,
    #[msg("account is not a member")]
    MemberNotFound,
    #[msg("signer is not a member of the dao")]
    NotAMember,
    #[msg("voting thresholds are out of range")]
    InvalidThresholds,
    #[msg("dao has fewer members than the proposal creation threshold")]
    NotEnoughMembers,
    #[msg("voting period must be positive and at most thirty days")]
    InvalidVotingPeriod,
    #[msg("too many proposed changes")]
    TooManyChanges,
    #[msg("proposed change data exceeds the maximum length")]
    ChangeDataTooLong,
    #[msg("proposed change data could not be decoded")]
    InvalidChangeData,
    #[msg("proposed change has an invalid target")]
    InvalidChangeTarget,
    #[msg("voting on this proposal has closed")]
    VotingClosed,
    #[msg("voting on this proposal is still open")]
    VotingStillOpen,
    #[msg("proposal was already executed")]
    ProposalAlreadyExecuted,
    #[msg("proposal did not reach the voting thresholds")]
    ProposalNotApproved,
    #[msg("arithmetic overflow")]
    ArithmeticOverflow,
    #[msg("missing pda bump")]
    BumpNotFound,
    #[msg("signer was not a member when the proposal was opened")]
    NotInElectorate,
}
