//! ssb-pubd - Scuttlebutt pub daemon.
//!
//! Operator entry point: initialise a pub, issue invites, redeem them.

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use ssb_proto::{FeedRef, IdentityRef, PrivateIdentity};
use ssb_pubd::config::{self, CONFIG_FILE, Config, IdentityStorage, LogConfig};
use ssb_pubd::db::{Database, RedbTransactionProvider};
use ssb_pubd::handlers::{Application, CreateInvite, RedeemInvite};
use ssb_pubd::{SecretKeySeed, telemetry};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use zeroize::Zeroizing;

const USAGE: &str = "usage:
  ssb-pubd init <config_dir>
  ssb-pubd create-invite <config_dir> [--uses N] [--valid-until RFC3339]
  ssb-pubd redeem-invite <config_dir> <invite_code> <feed_ref>";

enum Command {
    Init {
        dir: PathBuf,
    },
    CreateInvite {
        dir: PathBuf,
        uses: Option<u32>,
        valid_until: Option<DateTime<Utc>>,
    },
    RedeemInvite {
        dir: PathBuf,
        code: Zeroizing<String>,
        feed: FeedRef,
    },
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let (name, rest) = args.split_first().context("missing command")?;
    match name.as_str() {
        "init" => match rest {
            [dir] => Ok(Command::Init {
                dir: PathBuf::from(dir),
            }),
            _ => bail!("init takes exactly one argument"),
        },
        "create-invite" => {
            let (dir, flags) = rest.split_first().context("missing config directory")?;
            let mut uses = None;
            let mut valid_until = None;
            let mut flags = flags.iter();
            while let Some(flag) = flags.next() {
                let value = flags
                    .next()
                    .with_context(|| format!("{} needs a value", flag))?;
                match flag.as_str() {
                    "--uses" => {
                        uses = Some(
                            value
                                .parse::<u32>()
                                .with_context(|| format!("invalid --uses {}", value))?,
                        )
                    }
                    "--valid-until" => {
                        valid_until = Some(
                            DateTime::parse_from_rfc3339(value)
                                .with_context(|| format!("invalid --valid-until {}", value))?
                                .with_timezone(&Utc),
                        )
                    }
                    other => bail!("unknown flag {}", other),
                }
            }
            Ok(Command::CreateInvite {
                dir: PathBuf::from(dir),
                uses,
                valid_until,
            })
        }
        "redeem-invite" => match rest {
            [dir, code, feed] => Ok(Command::RedeemInvite {
                dir: PathBuf::from(dir),
                code: Zeroizing::new(code.clone()),
                feed: feed
                    .parse()
                    .with_context(|| format!("invalid feed ref {}", feed))?,
            }),
            _ => bail!("redeem-invite takes a config directory, an invite code and a feed ref"),
        },
        other => bail!("unknown command {}", other),
    }
}

fn init(dir: &Path) -> anyhow::Result<()> {
    if !dir.is_dir() {
        bail!("config directory {} does not exist", dir.display());
    }

    let storage = IdentityStorage::new(dir);
    if storage.exists() {
        bail!("identity already exists at {}", storage.path().display());
    }
    let identity = PrivateIdentity::generate()?;
    storage.save(&identity)?;

    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        Config::default().save(&config_path)?;
    }

    let iref = IdentityRef::from_public(identity.public());
    info!(identity = %iref, dir = %dir.display(), "Pub initialized");
    println!("{}", iref);
    Ok(())
}

fn load_config(dir: &Path) -> anyhow::Result<Config> {
    let path = dir.join(CONFIG_FILE);
    Config::load(&path).with_context(|| format!("failed to load {}", path.display()))
}

fn open(dir: &Path, config: &Config) -> anyhow::Result<Application<RedbTransactionProvider>> {
    if let Err(errors) = config::validate(config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        bail!("invalid configuration ({} errors)", errors.len());
    }

    let identity = IdentityStorage::new(dir)
        .load()
        .context("failed to load pub identity")?;
    let db = Database::create(config.database_path(dir))?;
    let provider = db.transaction_provider(
        IdentityRef::from_public(identity.public()),
        config.hops(),
        config.message_hmac()?,
    );

    info!(identity = %IdentityRef::from_public(identity.public()), "Pub opened");
    Ok(Application::new(provider, identity))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args).map_err(|e| anyhow::anyhow!("{}\n\n{}", e, USAGE))?;

    match command {
        Command::Init { dir } => {
            telemetry::init_tracing(&LogConfig::default());
            init(&dir)
        }
        Command::CreateInvite {
            dir,
            uses,
            valid_until,
        } => {
            let config = load_config(&dir)?;
            telemetry::init_tracing(&config.log);
            let app = open(&dir, &config)?;

            let handler = app.create_invite;
            let cmd = CreateInvite::new(uses, valid_until);
            let seed = tokio::task::spawn_blocking(move || handler.handle(&cmd)).await??;

            // Shown once; there is no way to recover it later.
            println!("{}", Zeroizing::new(seed.to_base64()).as_str());
            Ok(())
        }
        Command::RedeemInvite { dir, code, feed } => {
            let config = load_config(&dir)?;
            telemetry::init_tracing(&config.log);
            let app = open(&dir, &config)?;

            let seed = SecretKeySeed::from_base64(&code)?;
            let cmd = RedeemInvite::new(seed.identity()?.public(), feed)?;

            let handler = app.redeem_invite;
            let id = tokio::task::spawn_blocking(move || handler.handle(&cmd)).await??;
            println!("{}", id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_create_invite_flags() {
        let cmd = parse_args(&args(&[
            "create-invite",
            "/etc/pubd",
            "--uses",
            "5",
            "--valid-until",
            "2030-01-01T00:00:00Z",
        ]))
        .unwrap();

        match cmd {
            Command::CreateInvite {
                dir,
                uses,
                valid_until,
            } => {
                assert_eq!(dir, PathBuf::from("/etc/pubd"));
                assert_eq!(uses, Some(5));
                assert_eq!(
                    valid_until.unwrap().to_rfc3339(),
                    "2030-01-01T00:00:00+00:00"
                );
            }
            _ => panic!("expected create-invite"),
        }
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["serve"])).is_err());
        assert!(parse_args(&args(&["init"])).is_err());
        assert!(parse_args(&args(&["create-invite", "/d", "--uses"])).is_err());
        assert!(parse_args(&args(&["create-invite", "/d", "--uses", "-1"])).is_err());
        assert!(parse_args(&args(&["create-invite", "/d", "--colour", "red"])).is_err());
        assert!(parse_args(&args(&["redeem-invite", "/d", "code", "not-a-ref"])).is_err());
    }
}
