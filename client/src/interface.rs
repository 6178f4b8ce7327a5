//! The program's instruction interface, written out explicitly.
//!
//! [`verify_all`] checks the program's generated instruction and account types against this
//! table. A client built against a program whose instruction names, argument presence,
//! account order or signer/writable flags differ from it refuses to start instead of sending
//! malformed transactions.

use solana_sdk::hash::hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;
use tahu_program::{
    CreateDaoArgs, CreateProposalArgs, Dao, DaoUpdate, Proposal, State, VoteRecord, VoteType,
    VotingThresholds,
};

use crate::error::{Error, Result};
use crate::instructions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSpec {
    pub name: &'static str,
    pub signer: bool,
    pub writable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionSpec {
    pub name: &'static str,
    pub accounts: &'static [AccountSpec],
    pub args: &'static [&'static str],
}

const fn account(name: &'static str, signer: bool, writable: bool) -> AccountSpec {
    AccountSpec {
        name,
        signer,
        writable,
    }
}

const SYSTEM_PROGRAM: AccountSpec = account("system_program", false, false);

const MANAGE_DAO_ACCOUNTS: &[AccountSpec] = &[account("admin", true, false), account("dao", false, true)];

pub const INITIALIZE: InstructionSpec = InstructionSpec {
    name: "initialize",
    accounts: &[
        account("authority", true, true),
        account("state", false, true),
        SYSTEM_PROGRAM,
    ],
    args: &[],
};

pub const CREATE_DAO: InstructionSpec = InstructionSpec {
    name: "create_dao",
    accounts: &[
        account("authority", true, true),
        account("state", false, true),
        account("dao", false, true),
        SYSTEM_PROGRAM,
    ],
    args: &["args"],
};

pub const UPDATE_DAO: InstructionSpec = InstructionSpec {
    name: "update_dao",
    accounts: MANAGE_DAO_ACCOUNTS,
    args: &["update"],
};

pub const ADD_MEMBER: InstructionSpec = InstructionSpec {
    name: "add_member",
    accounts: MANAGE_DAO_ACCOUNTS,
    args: &["member"],
};

pub const REMOVE_MEMBER: InstructionSpec = InstructionSpec {
    name: "remove_member",
    accounts: MANAGE_DAO_ACCOUNTS,
    args: &["member"],
};

pub const CHANGE_VOTING_THRESHOLDS: InstructionSpec = InstructionSpec {
    name: "change_voting_thresholds",
    accounts: MANAGE_DAO_ACCOUNTS,
    args: &["thresholds"],
};

pub const CREATE_PROPOSAL: InstructionSpec = InstructionSpec {
    name: "create_proposal",
    accounts: &[
        account("proposer", true, true),
        account("dao", false, true),
        account("proposal", false, true),
        SYSTEM_PROGRAM,
    ],
    args: &["args"],
};

pub const VOTE_ON_PROPOSAL: InstructionSpec = InstructionSpec {
    name: "vote_on_proposal",
    accounts: &[
        account("voter", true, true),
        account("dao", false, false),
        account("proposal", false, true),
        account("vote_record", false, true),
        SYSTEM_PROGRAM,
    ],
    args: &["vote_type"],
};

pub const EXECUTE_PROPOSAL: InstructionSpec = InstructionSpec {
    name: "execute_proposal",
    accounts: &[account("dao", false, true), account("proposal", false, true)],
    args: &[],
};

pub const PROGRAM_INTERFACE: &[InstructionSpec] = &[
    INITIALIZE,
    CREATE_DAO,
    UPDATE_DAO,
    ADD_MEMBER,
    REMOVE_MEMBER,
    CHANGE_VOTING_THRESHOLDS,
    CREATE_PROPOSAL,
    VOTE_ON_PROPOSAL,
    EXECUTE_PROPOSAL,
];

/// Anchor's instruction discriminator: the first 8 bytes of `sha256("global:<name>")`.
pub fn discriminator(name: &str) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash(format!("global:{name}").as_bytes()).to_bytes()[..8]);
    out
}

impl InstructionSpec {
    pub fn discriminator(&self) -> [u8; 8] {
        discriminator(self.name)
    }

    /// Checks that `ix` matches this entry's discriminator, account flags and argument presence.
    pub fn check(&self, ix: &Instruction) -> Result<()> {
        if ix.program_id != tahu_program::ID {
            return Err(Error::Interface(format!(
                "{}: targets program {}",
                self.name, ix.program_id
            )));
        }
        if ix.data.len() < 8 || ix.data[..8] != self.discriminator() {
            return Err(Error::Interface(format!(
                "{}: discriminator mismatch",
                self.name
            )));
        }
        if self.args.is_empty() != (ix.data.len() == 8) {
            return Err(Error::Interface(format!(
                "{}: expected arguments {:?}, got {} bytes of argument data",
                self.name,
                self.args,
                ix.data.len() - 8
            )));
        }
        if ix.accounts.len() != self.accounts.len() {
            return Err(Error::Interface(format!(
                "{}: expected {} accounts, got {}",
                self.name,
                self.accounts.len(),
                ix.accounts.len()
            )));
        }
        for (spec, meta) in self.accounts.iter().zip(&ix.accounts) {
            if spec.signer != meta.is_signer || spec.writable != meta.is_writable {
                return Err(Error::Interface(format!(
                    "{}: account `{}` expected signer={} writable={}, got signer={} writable={}",
                    self.name,
                    spec.name,
                    spec.signer,
                    spec.writable,
                    meta.is_signer,
                    meta.is_writable
                )));
            }
        }
        Ok(())
    }

    /// Checks that every declared account of `ix` holds the address its name resolves to in
    /// `addresses`, which catches reordered or renamed accounts.
    pub fn check_order(&self, ix: &Instruction, addresses: &[(&str, Pubkey)]) -> Result<()> {
        for (spec, meta) in self.accounts.iter().zip(&ix.accounts) {
            let expected = addresses
                .iter()
                .find(|(name, _)| *name == spec.name)
                .map(|(_, address)| *address);
            if expected != Some(meta.pubkey) {
                return Err(Error::Interface(format!(
                    "{}: account `{}` is not at its declared position",
                    self.name, spec.name
                )));
            }
        }
        Ok(())
    }
}

fn sample_thresholds() -> VotingThresholds {
    VotingThresholds {
        proposal_creation_threshold: 1,
        vote_approval_threshold: 51,
        vote_participation_threshold: 50,
    }
}

/// One instruction per interface entry, built through the program's generated bindings, with
/// the address each declared account name should resolve to.
fn samples() -> Vec<(InstructionSpec, Instruction, Vec<(&'static str, Pubkey)>)> {
    let signer = Pubkey::new_unique();
    let dao = Pubkey::new_unique();
    let proposal = Pubkey::new_unique();
    let state = State::address(&signer).0;
    let system = system_program::ID;

    let manage = || vec![("admin", signer), ("dao", dao)];

    vec![
        (
            INITIALIZE,
            instructions::initialize(&signer),
            vec![("authority", signer), ("state", state), ("system_program", system)],
        ),
        (
            CREATE_DAO,
            instructions::create_dao(
                &signer,
                0,
                CreateDaoArgs {
                    name: String::new(),
                    description: String::new(),
                    members: vec![],
                    voting_thresholds: sample_thresholds(),
                },
            ),
            vec![
                ("authority", signer),
                ("state", state),
                ("dao", Dao::address(&state, 0).0),
                ("system_program", system),
            ],
        ),
        (
            UPDATE_DAO,
            instructions::update_dao(&signer, &dao, DaoUpdate::default()),
            manage(),
        ),
        (
            ADD_MEMBER,
            instructions::add_member(&signer, &dao, &proposal),
            manage(),
        ),
        (
            REMOVE_MEMBER,
            instructions::remove_member(&signer, &dao, &proposal),
            manage(),
        ),
        (
            CHANGE_VOTING_THRESHOLDS,
            instructions::change_voting_thresholds(&signer, &dao, sample_thresholds()),
            manage(),
        ),
        (
            CREATE_PROPOSAL,
            instructions::create_proposal(
                &signer,
                &dao,
                0,
                CreateProposalArgs {
                    title: String::new(),
                    description: String::new(),
                    proposed_changes: vec![],
                    duration_secs: 1,
                },
            ),
            vec![
                ("proposer", signer),
                ("dao", dao),
                ("proposal", Proposal::address(&dao, 0).0),
                ("system_program", system),
            ],
        ),
        (
            VOTE_ON_PROPOSAL,
            instructions::vote_on_proposal(&signer, &dao, &proposal, VoteType::Yes),
            vec![
                ("voter", signer),
                ("dao", dao),
                ("proposal", proposal),
                ("vote_record", VoteRecord::address(&proposal, &signer).0),
                ("system_program", system),
            ],
        ),
        (
            EXECUTE_PROPOSAL,
            instructions::execute_proposal(&dao, &proposal),
            vec![("dao", dao), ("proposal", proposal)],
        ),
    ]
}

/// Verifies every instruction in [`PROGRAM_INTERFACE`] against the program bindings: the
/// discriminator, argument presence, and that each declared account sits at its position
/// with the declared flags.
pub fn verify_all() -> Result<()> {
    let samples = samples();
    if samples.len() != PROGRAM_INTERFACE.len() {
        return Err(Error::Interface(format!(
            "{} instructions declared, {} checked",
            PROGRAM_INTERFACE.len(),
            samples.len()
        )));
    }
    for (spec, ix, addresses) in &samples {
        spec.check(ix)?;
        spec.check_order(ix, addresses)?;
    }
    Ok(())
}
