use super::instructions::*;
use super::Result;
use solana_program_test::ProgramTestContext;
use solana_sdk::account::Account;
use solana_sdk::clock::Clock;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::cell::RefCell;
use tahu_program::{
    CreateDaoArgs, CreateProposalArgs, Dao, DaoUpdate, Proposal, State, VoteRecord, VoteType,
    VotingThresholds,
};

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub struct TestContext {
    pub ctx: RefCell<ProgramTestContext>,
    pub authority: Keypair,
    pub state: Pubkey,
}

pub fn clone_keypair(keypair: &Keypair) -> Keypair {
    Keypair::from_bytes(&keypair.to_bytes()).unwrap()
}

impl TestContext {
    pub async fn initialize(ctx: ProgramTestContext, authority: &Keypair) -> Result<Self> {
        let state = State::address(&authority.pubkey()).0;

        let ctx = TestContext {
            ctx: RefCell::new(ctx),
            authority: clone_keypair(authority),
            state,
        };

        ctx.fund(&authority.pubkey(), 10 * LAMPORTS_PER_SOL).await?;

        let (_, instruction) = initialize(&authority.pubkey(), &state);
        ctx.send_and_confirm_tx(vec![instruction], Some(vec![authority]))
            .await?;

        Ok(ctx)
    }

    pub async fn fund(&self, to: &Pubkey, lamports: u64) -> Result<()> {
        let payer = self.ctx.borrow().payer.pubkey();
        let transfer = super::utils::transfer_lamports(&payer, to, lamports);
        self.send_and_confirm_tx(vec![transfer], None).await
    }

    /// A fresh keypair holding enough lamports to pay for proposals and votes.
    pub async fn funded_keypair(&self) -> Result<Keypair> {
        let keypair = Keypair::new();
        self.fund(&keypair.pubkey(), LAMPORTS_PER_SOL).await?;
        Ok(keypair)
    }

    pub async fn create_dao(&self, args: CreateDaoArgs) -> Result<Pubkey> {
        let state = self.get_deserialized_account::<State>(&self.state).await?;
        let dao = Dao::address(&self.state, state.dao_count).0;

        let (_, instruction) = create_dao(&self.authority.pubkey(), &self.state, &dao, args);
        self.send_and_confirm_tx(vec![instruction], Some(vec![&self.authority]))
            .await?;

        Ok(dao)
    }

    pub async fn add_member(&self, admin: &Keypair, dao: &Pubkey, member: &Pubkey) -> Result<()> {
        let (_, instruction) = add_member(&admin.pubkey(), dao, member);
        self.send_and_confirm_tx(vec![instruction], Some(vec![admin]))
            .await
    }

    pub async fn remove_member(
        &self,
        admin: &Keypair,
        dao: &Pubkey,
        member: &Pubkey,
    ) -> Result<()> {
        let (_, instruction) = remove_member(&admin.pubkey(), dao, member);
        self.send_and_confirm_tx(vec![instruction], Some(vec![admin]))
            .await
    }

    pub async fn update_dao(&self, admin: &Keypair, dao: &Pubkey, update: DaoUpdate) -> Result<()> {
        let (_, instruction) = update_dao(&admin.pubkey(), dao, update);
        self.send_and_confirm_tx(vec![instruction], Some(vec![admin]))
            .await
    }

    pub async fn change_voting_thresholds(
        &self,
        admin: &Keypair,
        dao: &Pubkey,
        thresholds: VotingThresholds,
    ) -> Result<()> {
        let (_, instruction) = change_voting_thresholds(&admin.pubkey(), dao, thresholds);
        self.send_and_confirm_tx(vec![instruction], Some(vec![admin]))
            .await
    }

    pub async fn create_proposal(
        &self,
        proposer: &Keypair,
        dao: &Pubkey,
        args: CreateProposalArgs,
    ) -> Result<Pubkey> {
        let dao_account = self.get_deserialized_account::<Dao>(dao).await?;
        let proposal = Proposal::address(dao, dao_account.proposal_count).0;

        let (_, instruction) = create_proposal(&proposer.pubkey(), dao, &proposal, args);
        self.send_and_confirm_tx(vec![instruction], Some(vec![proposer]))
            .await?;

        Ok(proposal)
    }

    pub async fn vote(
        &self,
        voter: &Keypair,
        dao: &Pubkey,
        proposal: &Pubkey,
        vote_type: VoteType,
    ) -> Result<()> {
        let vote_record = VoteRecord::address(proposal, &voter.pubkey()).0;

        let (_, instruction) =
            vote_on_proposal(&voter.pubkey(), dao, proposal, &vote_record, vote_type);
        self.send_and_confirm_tx(vec![instruction], Some(vec![voter]))
            .await
    }

    pub async fn execute_proposal(&self, dao: &Pubkey, proposal: &Pubkey) -> Result<()> {
        let (_, instruction) = execute_proposal(dao, proposal);
        self.send_and_confirm_tx(vec![instruction], None).await
    }

    /// Moves the cluster clock to `unix_timestamp`.
    pub async fn warp_clock_to(&self, unix_timestamp: i64) -> Result<()> {
        let mut clock = self
            .ctx
            .borrow_mut()
            .banks_client
            .get_sysvar::<Clock>()
            .await?;
        clock.unix_timestamp = unix_timestamp;
        self.ctx.borrow().set_sysvar(&clock);
        Ok(())
    }

    /// Waits for a new blockhash so an identical transaction is not deduplicated.
    pub async fn refresh_blockhash(&self) -> Result<()> {
        self.ctx.borrow_mut().get_new_latest_blockhash().await?;
        Ok(())
    }

    pub async fn get_account(&self, address: &Pubkey) -> Result<Account> {
        let account = self
            .ctx
            .borrow_mut()
            .banks_client
            .get_account(*address)
            .await?
            .ok_or(super::Error::AccountNotFound)?;

        Ok(account)
    }

    pub async fn get_deserialized_account<T: anchor_lang::AccountDeserialize>(
        &self,
        address: &Pubkey,
    ) -> Result<T> {
        let account = &self.get_account(address).await?;
        Ok(T::try_deserialize(&mut account.data.as_ref())?)
    }

    pub async fn send_and_confirm_tx(
        &self,
        ix: Vec<Instruction>,
        signers: Option<Vec<&Keypair>>,
    ) -> Result<()> {
        super::utils::send_and_confirm_tx(&mut self.ctx.borrow_mut(), ix, signers).await?;
        Ok(())
    }
}
