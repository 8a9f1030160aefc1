use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use keyphrase::codec::EncodingKind;
use keyphrase::config::KdfOverrides;

#[derive(Parser)]
#[command(
    name = "keyphrase",
    version,
    about = "Check how encrypted private key encodings handle passphrase callbacks"
)]
pub struct Cli {
    /// Increase diagnostic output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the round-trip scenarios against a reference key
    Run(RunArgs),
    /// List the scenario catalog
    List,
    /// Generate a reference key protected by the reference passphrase
    Keygen(KeygenArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Reference key file (traditional encoding, reference passphrase)
    #[arg(long, value_name = "PATH")]
    pub key: PathBuf,

    /// Only run scenarios of this encoding
    #[arg(long, value_enum)]
    pub encoding: Option<EncodingKind>,

    /// Only run scenarios whose name contains this string
    #[arg(long, value_name = "SUBSTRING")]
    pub filter: Option<String>,

    /// Run scenarios on separate threads
    #[arg(long)]
    pub parallel: bool,

    /// Print results as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub kdf: KdfArgs,
}

#[derive(Parser)]
pub struct KeygenArgs {
    /// Where to write the new reference key
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,

    /// Overwrite an existing file without asking
    #[arg(long, short = 'y')]
    pub yes: bool,

    #[command(flatten)]
    pub kdf: KdfArgs,
}

#[derive(Args)]
pub struct KdfArgs {
    /// JSON config file with KDF parameters
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Argon2id memory cost in KiB
    #[arg(long, value_name = "KIB")]
    pub kdf_m_cost: Option<u32>,

    /// Argon2id iterations
    #[arg(long, value_name = "N")]
    pub kdf_t_cost: Option<u32>,

    /// Argon2id parallelism
    #[arg(long, value_name = "N")]
    pub kdf_p_cost: Option<u32>,
}

impl KdfArgs {
    pub fn overrides(&self) -> KdfOverrides {
        KdfOverrides {
            m_cost: self.kdf_m_cost,
            t_cost: self.kdf_t_cost,
            p_cost: self.kdf_p_cost,
        }
    }
}
