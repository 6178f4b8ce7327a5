use anyhow::Result;
use clap::{Parser, ValueEnum};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use tracing::info;

use tahu_client::{ProviderConfig, RpcLedger, TahuClient};
use tahu_program::{
    CreateDaoArgs, CreateProposalArgs, DaoUpdate, ProposedChange, VoteType, VotingThresholds,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Command line client for the tahu governance program")]
pub struct Cli {
    /// Cluster name (devnet, testnet, mainnet, localnet) or RPC URL.
    #[arg(long, short = 'u')]
    pub url: Option<String>,

    #[arg(long, short, env = "TAHU_KEYPAIR")]
    pub keypair: Option<String>,

    /// TOML provider configuration. Flags override values read from it.
    #[arg(long, short)]
    pub config: Option<String>,

    #[arg(long)]
    pub commitment: Option<String>,

    #[arg(long)]
    pub skip_preflight: bool,

    #[arg(long)]
    pub confirm_timeout_secs: Option<u64>,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Parser)]
pub enum Command {
    /// Create the state account for the configured keypair.
    Initialize,
    CreateDao {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "member")]
        members: Vec<Pubkey>,
        #[command(flatten)]
        thresholds: Thresholds,
    },
    AddMember {
        #[arg(long)]
        dao: Pubkey,
        #[arg(long)]
        member: Pubkey,
    },
    RemoveMember {
        #[arg(long)]
        dao: Pubkey,
        #[arg(long)]
        member: Pubkey,
    },
    UpdateDao {
        #[arg(long)]
        dao: Pubkey,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    SetThresholds {
        #[arg(long)]
        dao: Pubkey,
        #[command(flatten)]
        thresholds: Thresholds,
    },
    /// Open a proposal to add or remove members.
    Propose {
        #[arg(long)]
        dao: Pubkey,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        add_member: Vec<Pubkey>,
        #[arg(long)]
        remove_member: Vec<Pubkey>,
        /// Voting window in seconds.
        #[arg(long, default_value_t = 3 * 24 * 60 * 60)]
        duration_secs: i64,
    },
    Vote {
        #[arg(long)]
        proposal: Pubkey,
        #[arg(value_enum)]
        choice: Choice,
    },
    Execute {
        #[arg(long)]
        proposal: Pubkey,
    },
    ShowDao {
        #[arg(long)]
        dao: Pubkey,
    },
    /// List DAOs under the configured keypair's state, or proposals of one DAO.
    List {
        #[arg(long)]
        dao: Option<Pubkey>,
    },
}

#[derive(Debug, clap::Args)]
pub struct Thresholds {
    /// Minimum number of members before proposals can be opened.
    #[arg(long, default_value_t = 1)]
    pub creation_threshold: u64,
    /// Percentage of yes votes among yes and no votes needed to pass.
    #[arg(long, default_value_t = 51)]
    pub approval_threshold: u64,
    /// Percentage of members that must vote.
    #[arg(long, default_value_t = 50)]
    pub participation_threshold: u64,
}

impl From<Thresholds> for VotingThresholds {
    fn from(t: Thresholds) -> Self {
        VotingThresholds {
            proposal_creation_threshold: t.creation_threshold,
            vote_approval_threshold: t.approval_threshold,
            vote_participation_threshold: t.participation_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Choice {
    Yes,
    No,
    Abstain,
}

impl From<Choice> for VoteType {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::Yes => VoteType::Yes,
            Choice::No => VoteType::No,
            Choice::Abstain => VoteType::Abstain,
        }
    }
}

impl Cli {
    fn provider_config(&self) -> Result<ProviderConfig> {
        let mut config = match &self.config {
            Some(path) => ProviderConfig::from_file(path)?,
            None => ProviderConfig::default(),
        };
        if let Some(url) = &self.url {
            config.cluster = url.clone();
        }
        if let Some(keypair) = &self.keypair {
            config.keypair_path = keypair.clone();
        }
        if let Some(commitment) = &self.commitment {
            config.commitment = commitment.clone();
        }
        if let Some(secs) = self.confirm_timeout_secs {
            config.confirm_timeout_secs = secs;
        }
        config.skip_preflight |= self.skip_preflight;
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.provider_config()?;
    let payer = config.load_keypair()?;
    info!(cluster = config.rpc_url(), payer = %payer.pubkey(), "connecting");

    let client = TahuClient::new(RpcLedger::new(&config)?, payer, config.send_options())?;

    match cli.command {
        Command::Initialize => {
            let signature = client.initialize().await?;
            println!("state: {}", client.state_address());
            println!("signature: {signature}");
        }
        Command::CreateDao {
            name,
            description,
            members,
            thresholds,
        } => {
            let (dao, signature) = client
                .create_dao(CreateDaoArgs {
                    name,
                    description,
                    members,
                    voting_thresholds: thresholds.into(),
                })
                .await?;
            println!("dao: {dao}");
            println!("signature: {signature}");
        }
        Command::AddMember { dao, member } => {
            println!("signature: {}", client.add_member(&dao, &member).await?);
        }
        Command::RemoveMember { dao, member } => {
            println!("signature: {}", client.remove_member(&dao, &member).await?);
        }
        Command::UpdateDao {
            dao,
            name,
            description,
        } => {
            let update = DaoUpdate {
                new_name: name,
                new_description: description,
                ..DaoUpdate::default()
            };
            println!("signature: {}", client.update_dao(&dao, update).await?);
        }
        Command::SetThresholds { dao, thresholds } => {
            let signature = client
                .change_voting_thresholds(&dao, thresholds.into())
                .await?;
            println!("signature: {signature}");
        }
        Command::Propose {
            dao,
            title,
            description,
            add_member,
            remove_member,
            duration_secs,
        } => {
            let proposed_changes = add_member
                .into_iter()
                .map(ProposedChange::add_member)
                .chain(remove_member.into_iter().map(ProposedChange::remove_member))
                .collect();
            let (proposal, signature) = client
                .create_proposal(
                    &dao,
                    CreateProposalArgs {
                        title,
                        description,
                        proposed_changes,
                        duration_secs,
                    },
                )
                .await?;
            println!("proposal: {proposal}");
            println!("signature: {signature}");
        }
        Command::Vote { proposal, choice } => {
            println!("signature: {}", client.vote(&proposal, choice.into()).await?);
        }
        Command::Execute { proposal } => {
            println!("signature: {}", client.execute_proposal(&proposal).await?);
        }
        Command::ShowDao { dao } => {
            println!("{:#?}", client.dao(&dao).await?);
        }
        Command::List { dao: Some(dao) } => {
            for (address, proposal) in client.proposals(&dao).await? {
                println!(
                    "{address} #{} {:?} yes={} no={} abstain={} executed={}",
                    proposal.id,
                    proposal.title,
                    proposal.yes_votes,
                    proposal.no_votes,
                    proposal.abstain_votes,
                    proposal.executed
                );
            }
        }
        Command::List { dao: None } => {
            for (address, dao) in client.daos().await? {
                println!(
                    "{address} #{} {:?} members={}",
                    dao.id,
                    dao.name,
                    dao.members.len()
                );
            }
        }
    }

    Ok(())
}
