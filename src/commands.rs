//! Command handlers for the CLI surface.
//!
//! Handlers return `Result` and never terminate the process themselves;
//! `main` converts the first error into a message and a non-zero exit.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Config;
use crate::feed::fetcher;
use crate::ingest::scheduler;
use crate::storage::{Database, User};
use crate::util::{parse_duration, validate_url};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the ingestion scheduler at a fixed interval (e.g. "1m", "30s")
    Agg { interval: String },
    /// Create a new user and log in as them
    Register { name: String },
    /// Switch to an existing user
    Login { name: String },
    /// List all users
    Users,
    /// Delete all users, feeds and posts
    Reset,
    /// Register a feed and follow it
    Addfeed { name: String, url: String },
    /// List all feeds with the user who registered each
    Feeds,
    /// Follow an already-registered feed by URL
    Follow { url: String },
    /// List the feeds the current user follows
    Following,
    /// Stop following a feed by URL
    Unfollow { url: String },
}

/// Everything a handler needs: the store, the loaded config, and where to
/// write the config back.
pub struct CommandContext {
    pub db: Database,
    pub config: Config,
    pub config_path: PathBuf,
}

pub async fn dispatch(ctx: &mut CommandContext, command: Command) -> Result<()> {
    match command {
        Command::Agg { interval } => agg(ctx, &interval).await,
        Command::Register { name } => register(ctx, &name).await,
        Command::Login { name } => login(ctx, &name).await,
        Command::Users => users(ctx).await,
        Command::Reset => reset(ctx).await,
        Command::Addfeed { name, url } => add_feed(ctx, &name, &url).await,
        Command::Feeds => feeds(ctx).await,
        Command::Follow { url } => follow(ctx, &url).await,
        Command::Following => following(ctx).await,
        Command::Unfollow { url } => unfollow(ctx, &url).await,
    }
}

/// Resolve the current user from config, or fail with a hint.
async fn require_user(ctx: &CommandContext) -> Result<User> {
    let name = ctx
        .config
        .current_user
        .as_deref()
        .context("No user is logged in. Run `gather register <name>` or `gather login <name>` first")?;
    ctx.db
        .get_user_by_name(name)
        .await?
        .with_context(|| format!("Current user \"{}\" no longer exists; register or login again", name))
}

async fn agg(ctx: &CommandContext, interval_str: &str) -> Result<()> {
    let interval = parse_duration(interval_str)
        .with_context(|| format!("Invalid interval {:?}", interval_str))?;
    let client = fetcher::build_client().context("Failed to build HTTP client")?;

    println!("Collecting feeds every {}", interval_str);
    scheduler::run(ctx.db.clone(), client, interval).await?;
    Ok(())
}

async fn register(ctx: &mut CommandContext, name: &str) -> Result<()> {
    if ctx.db.get_user_by_name(name).await?.is_some() {
        anyhow::bail!("User \"{}\" already exists. Use `gather login {}`", name, name);
    }

    let user = ctx.db.create_user(name).await?;
    ctx.config.current_user = Some(user.name.clone());
    ctx.config
        .save(&ctx.config_path)
        .context("Failed to persist current user")?;

    println!("User {} created", user.name);
    Ok(())
}

async fn login(ctx: &mut CommandContext, name: &str) -> Result<()> {
    let user = ctx
        .db
        .get_user_by_name(name)
        .await?
        .with_context(|| format!("User \"{}\" doesn't exist. Use `gather register {}`", name, name))?;

    ctx.config.current_user = Some(user.name.clone());
    ctx.config
        .save(&ctx.config_path)
        .context("Failed to persist current user")?;

    println!("Logged in as {}", user.name);
    Ok(())
}

async fn users(ctx: &CommandContext) -> Result<()> {
    let users = ctx.db.list_users().await?;
    let current = ctx.config.current_user.as_deref();

    for user in users {
        if Some(user.name.as_str()) == current {
            println!(" * {} (current)", user.name);
        } else {
            println!(" * {}", user.name);
        }
    }
    Ok(())
}

async fn reset(ctx: &CommandContext) -> Result<()> {
    ctx.db.delete_all_users().await?;
    println!("Database reset");
    Ok(())
}

async fn add_feed(ctx: &CommandContext, name: &str, url: &str) -> Result<()> {
    let user = require_user(ctx).await?;
    validate_url(url).with_context(|| format!("Refusing to register {:?}", url))?;

    let feed = ctx.db.create_feed(name, url, user.id).await?;
    ctx.db.create_feed_follow(user.id, feed.id).await?;

    println!("Feed created:");
    println!("  name: {}", feed.name);
    println!("  url:  {}", feed.url);
    Ok(())
}

async fn feeds(ctx: &CommandContext) -> Result<()> {
    let feeds = ctx.db.list_feeds_with_owners().await?;

    for feed in feeds {
        println!("{}:", feed.name);
        println!("  URL: {}", feed.url);
        println!("  Added by: {}", feed.owner);
    }
    Ok(())
}

async fn follow(ctx: &CommandContext, url: &str) -> Result<()> {
    let user = require_user(ctx).await?;
    let feed = ctx
        .db
        .get_feed_by_url(url)
        .await?
        .with_context(|| format!("No feed registered with URL {:?}", url))?;

    ctx.db.create_feed_follow(user.id, feed.id).await?;
    println!("{} is now following {}", user.name, feed.name);
    Ok(())
}

async fn following(ctx: &CommandContext) -> Result<()> {
    let user = require_user(ctx).await?;
    let follows = ctx.db.list_follows_for_user(user.id).await?;

    println!("{} is following:", user.name);
    for name in follows {
        println!(" * {}", name);
    }
    Ok(())
}

async fn unfollow(ctx: &CommandContext, url: &str) -> Result<()> {
    let user = require_user(ctx).await?;
    let removed = ctx.db.delete_feed_follow(user.id, url).await?;
    if !removed {
        anyhow::bail!("{} is not following {:?}", user.name, url);
    }

    println!("Follow removed");
    Ok(())
}
