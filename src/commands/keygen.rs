use std::io::IsTerminal;
use std::path::Path;

use anyhow::Context;

use crate::cli::KeygenArgs;
use keyphrase::config::Config;
use keyphrase::keys::{fingerprint, store, PrivateKey};

pub fn run_keygen(args: KeygenArgs) -> anyhow::Result<()> {
    let config = Config::load(args.kdf.config.as_deref())?.apply(args.kdf.overrides());
    config.validate()?;

    if args.out.exists() && !args.yes && !prompt_overwrite(&args.out)? {
        println!("Aborted.");
        return Ok(());
    }

    let key = PrivateKey::generate();
    store::write_reference_key(&key, &args.out, &config.kdf)
        .with_context(|| format!("Failed to write reference key to {}", args.out.display()))?;
    tracing::info!(
        m_cost = config.kdf.m_cost,
        t_cost = config.kdf.t_cost,
        p_cost = config.kdf.p_cost,
        "reference key written"
    );

    println!("Reference key generated.");
    println!();
    println!("Fingerprint: {}", fingerprint::short_fingerprint(&key));
    println!("Key file:    {} (traditional, 0600)", args.out.display());
    println!();
    println!(
        "Next: run 'keyphrase run --key {}' to exercise the scenarios.",
        args.out.display()
    );

    Ok(())
}

fn prompt_overwrite(existing: &Path) -> anyhow::Result<bool> {
    if !std::io::stdin().is_terminal() {
        eprintln!("Use --yes to confirm overwrite in non-interactive mode");
        return Ok(false);
    }

    dialoguer::Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", existing.display()))
        .default(false)
        .interact()
        .map_err(|e| anyhow::anyhow!("prompt failed: {}", e))
}
