//! Governance engine sandbox CLI
//!
//! Drives a local decision engine against a JSON state file: the engine
//! snapshot plus the in-memory reference tokens. Every mutating command
//! loads the world, applies one engine call, prints the emitted events and
//! writes the world back.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};

use gov_core::{
    Amount, CheckpointToken, CheckpointTokenState, Clock, LedgerToken, LedgerTokenState,
    ProposalId, RecordingExecutor, StakeToken, SystemClock,
};
use gov_engine::{
    DecisionEngine, EngineConfig, EngineSnapshot, Event, Proposal, ProposalState,
};

const ENGINE_ACCOUNT: &str = "engine";

#[derive(Parser)]
#[command(name = "gov-cli")]
#[command(about = "Governance decision engine sandbox", version)]
struct Cli {
    /// Path to the world state file
    #[arg(short, long, default_value = "govstate.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a fresh world state
    Init {
        /// Required support in PPM
        #[arg(long, default_value_t = gov_engine::config::defaults::REQUIRED_SUPPORT)]
        required_support: u64,

        /// Queue period in seconds
        #[arg(long, default_value_t = gov_engine::config::defaults::QUEUE_PERIOD)]
        queue_period: u64,

        /// Pended period in seconds
        #[arg(long, default_value_t = gov_engine::config::defaults::PENDED_PERIOD)]
        pended_period: u64,

        /// Boost period in seconds
        #[arg(long, default_value_t = gov_engine::config::defaults::BOOST_PERIOD)]
        boost_period: u64,

        /// Quiet-ending period in seconds
        #[arg(long, default_value_t = gov_engine::config::defaults::ENDING_PERIOD)]
        ending_period: u64,

        /// Confidence threshold base
        #[arg(long, default_value_t = gov_engine::config::defaults::CONFIDENCE_THRESHOLD_BASE)]
        confidence_base: u64,

        /// Compensation fee percent
        #[arg(long, default_value_t = gov_engine::config::defaults::COMPENSATION_FEE_PCT)]
        fee_pct: u64,
    },

    /// Mint vote tokens to a holder
    MintVote { holder: String, amount: Amount },

    /// Mint stake tokens to a holder (pre-approved for the engine)
    MintStake { holder: String, amount: Amount },

    /// Create a proposal
    Create {
        creator: String,
        metadata: String,
        /// Action payload forwarded on approval
        #[arg(long, default_value = "")]
        script: String,
    },

    /// Create a proposal via the forwarding entry point
    Forward { sender: String, script: String },

    /// Cast a vote
    Vote {
        voter: String,
        id: ProposalId,
        /// Vote against instead of for
        #[arg(long)]
        nay: bool,
    },

    /// Stake on a proposal
    Stake {
        staker: String,
        id: ProposalId,
        amount: Amount,
        /// Stake against escalation instead of for it
        #[arg(long)]
        down: bool,
    },

    /// Withdraw stake from a proposal
    Unstake {
        staker: String,
        id: ProposalId,
        amount: Amount,
        #[arg(long)]
        down: bool,
    },

    /// Boost a pended proposal
    Boost { caller: String, id: ProposalId },

    /// Resolve a proposal
    Resolve { caller: String, id: ProposalId },

    /// Commit the time-out of a queued proposal
    Expire { caller: String, id: ProposalId },

    /// Claim a winning staker's reward
    Claim { staker: String, id: ProposalId },

    /// Fund the compensation fee pool
    Fund { from: String, amount: Amount },

    /// Show one proposal
    Status { id: ProposalId },

    /// List all proposals
    List,
}

/// Everything the sandbox persists between invocations.
#[derive(Serialize, Deserialize)]
struct WorldState {
    engine: EngineSnapshot,
    vote_token: CheckpointTokenState,
    stake_token: LedgerTokenState,
}

struct World {
    clock: Arc<SystemClock>,
    vote_token: Arc<CheckpointToken>,
    stake_token: Arc<LedgerToken>,
    engine: DecisionEngine,
}

impl World {
    fn init(config: EngineConfig) -> Result<Self, Box<dyn Error>> {
        let clock = Arc::new(SystemClock);
        let vote_token = Arc::new(CheckpointToken::new());
        let stake_token = Arc::new(LedgerToken::new());
        let engine = DecisionEngine::new(
            config,
            ENGINE_ACCOUNT.to_string(),
            clock.clone(),
            vote_token.clone(),
            stake_token.clone(),
            Arc::new(RecordingExecutor::new()),
        )?;
        Ok(Self {
            clock,
            vote_token,
            stake_token,
            engine,
        })
    }

    fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {} (run init first): {}", path.display(), e))?;
        let state: WorldState = serde_json::from_str(&data)?;
        let clock = Arc::new(SystemClock);
        let vote_token = Arc::new(CheckpointToken::from_state(state.vote_token));
        let stake_token = Arc::new(LedgerToken::from_state(state.stake_token));
        let engine = DecisionEngine::from_snapshot(
            state.engine,
            clock.clone(),
            vote_token.clone(),
            stake_token.clone(),
            Arc::new(RecordingExecutor::new()),
        )?;
        Ok(Self {
            clock,
            vote_token,
            stake_token,
            engine,
        })
    }

    fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let state = WorldState {
            engine: self.engine.snapshot(),
            vote_token: self.vote_token.snapshot(),
            stake_token: self.stake_token.snapshot(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&state)?)?;
        Ok(())
    }
}

fn state_label(state: ProposalState) -> String {
    match state {
        ProposalState::Queued => "queued".yellow().to_string(),
        ProposalState::Pended => "pended".cyan().to_string(),
        ProposalState::Boosted => "boosted".magenta().to_string(),
        ProposalState::Resolved => "resolved".green().to_string(),
        ProposalState::Closed => "closed".red().to_string(),
    }
}

fn print_proposal(engine: &DecisionEngine, p: &Proposal) {
    let state = engine.state(p.id).unwrap_or(p.state);
    println!("Proposal #{} [{}]", p.id, state_label(state));
    if !p.metadata.is_empty() {
        println!("  metadata:   {}", p.metadata);
    }
    println!("  creator:    {}", p.creator);
    println!("  snapshot:   {} voting power", p.voting_power_snapshot);
    println!("  yea/nay:    {} / {}", p.total_yea, p.total_nay);
    println!(
        "  stakes:     {} up / {} down",
        p.stakes.total_upstake(),
        p.stakes.total_downstake()
    );
    println!("  close date: {}", p.close_date);
    if p.state == ProposalState::Resolved {
        println!("  executed:   {}", p.executed);
    }
}

fn print_events(events: &[Event]) {
    for event in events {
        println!("  {} {:?}", "→".dimmed(), event);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Commands::Init {
        required_support,
        queue_period,
        pended_period,
        boost_period,
        ending_period,
        confidence_base,
        fee_pct,
    } = &cli.command
    {
        let config = EngineConfig {
            required_support: *required_support,
            queue_period: *queue_period,
            pended_period: *pended_period,
            boost_period: *boost_period,
            ending_period: *ending_period,
            confidence_threshold_base: *confidence_base,
            compensation_fee_pct: *fee_pct,
        };
        let world = World::init(config)?;
        world.save(&cli.state)?;
        println!("✅ Initialized {}", cli.state.display());
        return Ok(());
    }

    let mut world = World::load(&cli.state)?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),

        Commands::MintVote { holder, amount } => {
            world
                .vote_token
                .mint(&holder, amount, world.clock.block_number());
            println!("Minted {} vote tokens to {}", amount, holder);
        }

        Commands::MintStake { holder, amount } => {
            world.stake_token.mint(&holder, amount);
            world
                .stake_token
                .approve(&holder, &ENGINE_ACCOUNT.to_string(), Amount::MAX);
            println!("Minted {} stake tokens to {}", amount, holder);
        }

        Commands::Create {
            creator,
            metadata,
            script,
        } => {
            let id = world.engine.create(&creator, script.into_bytes(), metadata)?;
            println!("Created proposal #{}", id);
            print_events(&world.engine.drain_events());
        }

        Commands::Forward { sender, script } => {
            let id = world.engine.forward(&sender, script.into_bytes())?;
            println!("Forwarded as proposal #{}", id);
            print_events(&world.engine.drain_events());
        }

        Commands::Vote { voter, id, nay } => {
            world.engine.vote(&voter, id, !nay)?;
            println!("Vote recorded on proposal #{}", id);
            print_events(&world.engine.drain_events());
        }

        Commands::Stake {
            staker,
            id,
            amount,
            down,
        } => {
            if down {
                world.engine.downstake(&staker, id, amount)?;
            } else {
                world.engine.upstake(&staker, id, amount)?;
            }
            println!("Staked {} on proposal #{}", amount, id);
            print_events(&world.engine.drain_events());
        }

        Commands::Unstake {
            staker,
            id,
            amount,
            down,
        } => {
            if down {
                world.engine.withdraw_downstake(&staker, id, amount)?;
            } else {
                world.engine.withdraw_upstake(&staker, id, amount)?;
            }
            println!("Withdrew {} from proposal #{}", amount, id);
            print_events(&world.engine.drain_events());
        }

        Commands::Boost { caller, id } => {
            world.engine.boost(&caller, id)?;
            println!("Boosted proposal #{}", id);
            print_events(&world.engine.drain_events());
        }

        Commands::Resolve { caller, id } => {
            world.engine.resolve(&caller, id)?;
            let executed = world.engine.proposal(id)?.executed;
            println!(
                "Resolved proposal #{} ({})",
                id,
                if executed { "approved" } else { "rejected" }
            );
            print_events(&world.engine.drain_events());
        }

        Commands::Expire { caller, id } => {
            world.engine.expire(&caller, id)?;
            println!("Expired proposal #{}", id);
            print_events(&world.engine.drain_events());
        }

        Commands::Claim { staker, id } => {
            let payout = world.engine.claim_reward(&staker, id)?;
            println!("Paid {} to {}", payout, staker);
        }

        Commands::Fund { from, amount } => {
            world.engine.fund_fee_pool(&from, amount)?;
            println!("Fee pool now holds {}", world.engine.fee_pool());
        }

        Commands::Status { id } => {
            let p = world.engine.proposal(id)?.clone();
            print_proposal(&world.engine, &p);
            println!("  confidence: {}", world.engine.confidence(id)?);
            return Ok(());
        }

        Commands::List => {
            println!("\n📋 Proposals ({})", world.engine.num_proposals());
            println!("═══════════════════════════════════");
            for p in world.engine.proposals().to_vec() {
                print_proposal(&world.engine, &p);
            }
            println!("boosted slots in use: {}", world.engine.num_boosted());
            println!("fee pool: {}", world.engine.fee_pool());
            return Ok(());
        }
    }

    world.save(&cli.state)?;
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("{} {}", "error:".red(), e);
        std::process::exit(1);
    }
}
