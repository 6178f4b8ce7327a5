use anchor_lang::prelude::*;

use crate::{TahuError, DAO_SEED_PREFIX, PROPOSAL_SEED_PREFIX, STATE_SEED_PREFIX, VOTE_SEED_PREFIX};

pub const MAX_NAME_LEN: usize = 32;
pub const MAX_DESCRIPTION_LEN: usize = 200;
pub const MAX_MEMBERS: usize = 16;
pub const MAX_TITLE_LEN: usize = 64;
pub const MAX_PROPOSAL_DESCRIPTION_LEN: usize = 256;
pub const MAX_PROPOSED_CHANGES: usize = 4;
pub const MAX_CHANGE_DATA_LEN: usize = 128;

/// Per-authority record created by `initialize`. DAOs are created under it.
#[account]
#[derive(Debug)]
pub struct State {
    /// The signer that initialized this state and may create DAOs under it.
    pub authority: Pubkey,
    /// Number of DAOs created so far. Also the index of the next DAO.
    pub dao_count: u64,
    /// Bump of this account's PDA.
    pub bump: u8,
}

impl State {
    pub const SPACE: usize = 8 +   // anchor account discriminator
        32 +   // authority
        8 +    // dao_count
        1; // bump

    pub fn address(authority: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[STATE_SEED_PREFIX, authority.as_ref()], &crate::ID)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct VotingThresholds {
    /// Minimum number of members a DAO needs before proposals can be created.
    pub proposal_creation_threshold: u64,
    /// Percentage of `yes` among `yes + no` votes required for a proposal to pass.
    pub vote_approval_threshold: u64,
    /// Percentage of current members that must have voted for a result to count.
    pub vote_participation_threshold: u64,
}

impl VotingThresholds {
    pub const SPACE: usize = 8 + 8 + 8;

    pub fn validate(&self) -> Result<()> {
        require!(
            (1..=100).contains(&self.vote_approval_threshold),
            TahuError::InvalidThresholds
        );
        require!(
            self.vote_participation_threshold <= 100,
            TahuError::InvalidThresholds
        );
        require!(
            self.proposal_creation_threshold <= MAX_MEMBERS as u64,
            TahuError::InvalidThresholds
        );
        Ok(())
    }
}

/// A DAO registered under a `State`. This is a PDA unique to a (state, index) pair.
#[account]
#[derive(Debug)]
pub struct Dao {
    /// The state this DAO was created under.
    pub state: Pubkey,
    /// The account allowed to manage members and settings directly.
    pub admin: Pubkey,
    /// Index of this DAO under its state.
    pub id: u64,
    pub name: String,
    pub description: String,
    pub members: Vec<Pubkey>,
    pub voting_thresholds: VotingThresholds,
    /// Number of proposals created so far. Also the index of the next proposal.
    pub proposal_count: u64,
    pub bump: u8,
}

impl Dao {
    pub const SPACE: usize = 8 +   // anchor account discriminator
        32 +   // state
        32 +   // admin
        8 +    // id
        4 + MAX_NAME_LEN +
        4 + MAX_DESCRIPTION_LEN +
        4 + 32 * MAX_MEMBERS +
        VotingThresholds::SPACE +
        8 +    // proposal_count
        1; // bump

    pub fn address(state: &Pubkey, id: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[DAO_SEED_PREFIX, state.as_ref(), &id.to_le_bytes()],
            &crate::ID,
        )
    }

    pub fn is_member(&self, key: &Pubkey) -> bool {
        self.members.contains(key)
    }

    pub fn set_name(&mut self, name: String) -> Result<()> {
        require!(name.len() <= MAX_NAME_LEN, TahuError::NameTooLong);
        self.name = name;
        Ok(())
    }

    pub fn set_description(&mut self, description: String) -> Result<()> {
        require!(
            description.len() <= MAX_DESCRIPTION_LEN,
            TahuError::DescriptionTooLong
        );
        self.description = description;
        Ok(())
    }

    pub fn set_members(&mut self, members: Vec<Pubkey>) -> Result<()> {
        require!(members.len() <= MAX_MEMBERS, TahuError::TooManyMembers);
        for (i, member) in members.iter().enumerate() {
            require!(
                !members[i + 1..].contains(member),
                TahuError::DuplicateMember
            );
        }
        self.members = members;
        Ok(())
    }

    pub fn set_voting_thresholds(&mut self, thresholds: VotingThresholds) -> Result<()> {
        thresholds.validate()?;
        self.voting_thresholds = thresholds;
        Ok(())
    }

    pub fn add_member(&mut self, member: Pubkey) -> Result<()> {
        require!(!self.is_member(&member), TahuError::MemberAlreadyExists);
        require!(self.members.len() < MAX_MEMBERS, TahuError::TooManyMembers);
        self.members.push(member);
        Ok(())
    }

    pub fn remove_member(&mut self, member: &Pubkey) -> Result<()> {
        let index = self
            .members
            .iter()
            .position(|m| m == member)
            .ok_or(TahuError::MemberNotFound)?;
        self.members.remove(index);
        Ok(())
    }

    /// Applies every `Some` field of the update. Nothing is written unless all fields are valid.
    pub fn apply_update(&mut self, update: DaoUpdate) -> Result<()> {
        if let Some(name) = &update.new_name {
            require!(name.len() <= MAX_NAME_LEN, TahuError::NameTooLong);
        }
        if let Some(description) = &update.new_description {
            require!(
                description.len() <= MAX_DESCRIPTION_LEN,
                TahuError::DescriptionTooLong
            );
        }
        if let Some(thresholds) = &update.new_voting_thresholds {
            thresholds.validate()?;
        }

        if let Some(members) = update.new_members {
            self.set_members(members)?;
        }
        if let Some(name) = update.new_name {
            self.name = name;
        }
        if let Some(description) = update.new_description {
            self.description = description;
        }
        if let Some(thresholds) = update.new_voting_thresholds {
            self.voting_thresholds = thresholds;
        }
        Ok(())
    }

    pub fn apply_change(&mut self, change: &ProposedChange) -> Result<()> {
        match change.change_type {
            ChangeType::AddMember => self.add_member(change.target),
            ChangeType::RemoveMember => self.remove_member(&change.target),
            ChangeType::UpdateDao => self.apply_update(change.decode_update()?),
            ChangeType::Other => {
                msg!("Change targeting {} has no on-chain effect", change.target);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct CreateDaoArgs {
    pub name: String,
    pub description: String,
    pub members: Vec<Pubkey>,
    pub voting_thresholds: VotingThresholds,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct DaoUpdate {
    pub new_name: Option<String>,
    pub new_description: Option<String>,
    pub new_members: Option<Vec<Pubkey>>,
    pub new_voting_thresholds: Option<VotingThresholds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum ChangeType {
    AddMember,
    RemoveMember,
    /// `data` holds a borsh-encoded `DaoUpdate`.
    UpdateDao,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct ProposedChange {
    pub change_type: ChangeType,
    pub target: Pubkey,
    pub data: Vec<u8>,
}

impl ProposedChange {
    pub const SPACE: usize = 1 + 32 + 4 + MAX_CHANGE_DATA_LEN;

    pub fn add_member(member: Pubkey) -> Self {
        Self {
            change_type: ChangeType::AddMember,
            target: member,
            data: vec![],
        }
    }

    pub fn remove_member(member: Pubkey) -> Self {
        Self {
            change_type: ChangeType::RemoveMember,
            target: member,
            data: vec![],
        }
    }

    pub fn update_dao(dao: Pubkey, update: &DaoUpdate) -> Result<Self> {
        Ok(Self {
            change_type: ChangeType::UpdateDao,
            target: dao,
            data: update
                .try_to_vec()
                .map_err(|_| error!(TahuError::InvalidChangeData))?,
        })
    }

    fn decode_update(&self) -> Result<DaoUpdate> {
        DaoUpdate::try_from_slice(&self.data).map_err(|_| error!(TahuError::InvalidChangeData))
    }

    /// Checks a batch of changes before it is stored in a proposal for `dao`.
    pub fn validate_all(changes: &[ProposedChange], dao: &Pubkey) -> Result<()> {
        require!(
            changes.len() <= MAX_PROPOSED_CHANGES,
            TahuError::TooManyChanges
        );
        for change in changes {
            require!(
                change.data.len() <= MAX_CHANGE_DATA_LEN,
                TahuError::ChangeDataTooLong
            );
            match change.change_type {
                ChangeType::AddMember | ChangeType::RemoveMember => {
                    require!(
                        change.target != Pubkey::default(),
                        TahuError::InvalidChangeTarget
                    );
                }
                ChangeType::UpdateDao => {
                    require_keys_eq!(change.target, *dao, TahuError::InvalidChangeTarget);
                    change.decode_update()?;
                }
                ChangeType::Other => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct CreateProposalArgs {
    pub title: String,
    pub description: String,
    pub proposed_changes: Vec<ProposedChange>,
    /// Length of the voting window in seconds.
    pub duration_secs: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub enum VoteType {
    Yes,
    No,
    Abstain,
}

/// A proposal to change a DAO. This is a PDA unique to a (dao, index) pair.
#[account]
#[derive(Debug)]
pub struct Proposal {
    pub dao: Pubkey,
    /// Index of this proposal under its DAO.
    pub id: u64,
    pub proposer: Pubkey,
    pub title: String,
    pub description: String,
    pub proposed_changes: Vec<ProposedChange>,
    /// Members of the DAO when the proposal was opened. Only they may vote, and turnout is
    /// measured against this list.
    pub electorate: Vec<Pubkey>,
    /// Unix timestamp the voting window opened at.
    pub start_time: i64,
    /// Unix timestamp the voting window closes at (exclusive).
    pub end_time: i64,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub abstain_votes: u64,
    pub executed: bool,
    pub bump: u8,
}

impl Proposal {
    pub const SPACE: usize = 8 +   // anchor account discriminator
        32 +   // dao
        8 +    // id
        32 +   // proposer
        4 + MAX_TITLE_LEN +
        4 + MAX_PROPOSAL_DESCRIPTION_LEN +
        4 + MAX_PROPOSED_CHANGES * ProposedChange::SPACE +
        4 + MAX_MEMBERS * 32 + // electorate
        8 +    // start_time
        8 +    // end_time
        8 * 3 + // tallies
        1 +    // executed
        1; // bump

    pub fn address(dao: &Pubkey, id: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[PROPOSAL_SEED_PREFIX, dao.as_ref(), &id.to_le_bytes()],
            &crate::ID,
        )
    }

    pub fn set_title(&mut self, title: String) -> Result<()> {
        require!(title.len() <= MAX_TITLE_LEN, TahuError::TitleTooLong);
        self.title = title;
        Ok(())
    }

    pub fn set_description(&mut self, description: String) -> Result<()> {
        require!(
            description.len() <= MAX_PROPOSAL_DESCRIPTION_LEN,
            TahuError::DescriptionTooLong
        );
        self.description = description;
        Ok(())
    }

    pub fn voting_open(&self, now: i64) -> bool {
        now < self.end_time
    }

    pub fn votes_cast(&self) -> Result<u64> {
        self.yes_votes
            .checked_add(self.no_votes)
            .and_then(|votes| votes.checked_add(self.abstain_votes))
            .ok_or_else(|| error!(TahuError::ArithmeticOverflow))
    }

    pub fn is_eligible(&self, voter: &Pubkey) -> bool {
        self.electorate.contains(voter)
    }

    /// Every voter eligible for this proposal has cast a vote.
    pub fn everyone_voted(&self) -> Result<bool> {
        Ok(self.votes_cast()? >= self.electorate.len() as u64)
    }

    pub fn record_vote(&mut self, vote_type: VoteType) -> Result<()> {
        let tally = match vote_type {
            VoteType::Yes => &mut self.yes_votes,
            VoteType::No => &mut self.no_votes,
            VoteType::Abstain => &mut self.abstain_votes,
        };
        *tally = tally.checked_add(1).ok_or(TahuError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Whether the current tally passes `thresholds`, with turnout taken against the electorate.
    pub fn is_approved(&self, thresholds: &VotingThresholds) -> bool {
        let member_count = self.electorate.len();
        let yes = self.yes_votes as u128;
        let decisive = yes + self.no_votes as u128;
        let cast = decisive + self.abstain_votes as u128;

        let participation_met =
            cast * 100 >= thresholds.vote_participation_threshold as u128 * member_count as u128;
        let approval_met =
            decisive > 0 && yes * 100 >= thresholds.vote_approval_threshold as u128 * decisive;

        participation_met && approval_met
    }
}

/// Marks that `voter` has voted on `proposal`. This is a PDA unique to a (proposal, voter) pair.
#[account]
#[derive(Debug)]
pub struct VoteRecord {
    pub proposal: Pubkey,
    pub voter: Pubkey,
    pub vote_type: VoteType,
    pub bump: u8,
}

impl VoteRecord {
    pub const SPACE: usize = 8 + 32 + 32 + 1 + 1;

    pub fn address(proposal: &Pubkey, voter: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[VOTE_SEED_PREFIX, proposal.as_ref(), voter.as_ref()],
            &crate::ID,
        )
    }
}
