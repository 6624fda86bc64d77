//! Operator commands for the board database: migrations and group curation.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultClock;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use postboard::domain::{AccountService, NewGroup, PostId, PostService, PostServicePorts};
use postboard::outbound::media::FsMediaStore;
use postboard::outbound::persistence::{
    DbPool, DieselCommentRepository, DieselFollowRepository, DieselGroupRepository,
    DieselPostRepository, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use postboard::outbound::security::Argon2PasswordHasher;

/// `postboard-admin` arguments.
#[derive(Debug, Parser)]
#[command(name = "postboard-admin", about = "Manage the postboard database", version)]
struct Cli {
    /// Database connection URL. Falls back to `POSTBOARD_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    /// Media root holding uploaded images.
    #[arg(long = "media-root", value_name = "path", default_value = "media", global = true)]
    media_root: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations.
    Migrate,
    /// Create a topic group.
    CreateGroup {
        /// Display title.
        #[arg(long)]
        title: String,
        /// URL slug.
        #[arg(long)]
        slug: String,
        /// What the group is about.
        #[arg(long)]
        description: String,
    },
    /// Delete a group; its posts remain without a group.
    DeleteGroup {
        /// URL slug of the group.
        #[arg(long)]
        slug: String,
    },
    /// Delete a post together with its comments and image.
    DeletePost {
        /// Numeric post id.
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt().with_env_filter(EnvFilter::from_default_env()).try_init() {
        warn!(error = %e, "tracing init failed");
    }
    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    let database_url = resolve_database_url(cli.database_url)?;
    match cli.command {
        Command::Migrate => {
            let applied = run_pending_migrations(&database_url)
                .await
                .wrap_err("apply migrations")?;
            info!(count = applied.len(), "migrations applied");
        }
        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            let group = NewGroup::new(&title, &slug, &description)
                .map_err(|err| eyre!("invalid group: {err}"))?;
            let created = post_service(&database_url, &cli.media_root)
                .await?
                .create_group(&group)
                .await
                .map_err(|err| eyre!("create group: {err}"))?;
            info!(id = %created.id(), slug = %created.slug(), "group ready");
        }
        Command::DeleteGroup { slug } => {
            post_service(&database_url, &cli.media_root)
                .await?
                .delete_group(&slug)
                .await
                .map_err(|err| eyre!("delete group: {err}"))?;
        }
        Command::DeletePost { id } => {
            post_service(&database_url, &cli.media_root)
                .await?
                .delete_post(PostId::new(id))
                .await
                .map_err(|err| eyre!("delete post: {err}"))?;
        }
    }
    Ok(())
}

fn resolve_database_url(explicit: Option<String>) -> Result<String> {
    explicit
        .or_else(|| std::env::var("POSTBOARD_DATABASE_URL").ok())
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| eyre!("pass --database-url or set POSTBOARD_DATABASE_URL"))
}

async fn post_service(database_url: &str, media_root: &Path) -> Result<PostService> {
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("create database pool")?;
    let media = FsMediaStore::open(media_root)
        .wrap_err_with(|| format!("open media root {}", media_root.display()))?;
    let accounts = AccountService::new(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(Argon2PasswordHasher::new()),
    );
    Ok(PostService::new(
        PostServicePorts {
            posts: Arc::new(DieselPostRepository::new(pool.clone())),
            groups: Arc::new(DieselGroupRepository::new(pool.clone())),
            comments: Arc::new(DieselCommentRepository::new(pool.clone())),
            follows: Arc::new(DieselFollowRepository::new(pool)),
            media: Arc::new(media),
            clock: Arc::new(DefaultClock),
        },
        accounts,
        0,
    ))
}
