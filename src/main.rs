// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use pahinga_client::config::ClientConfig;
use pahinga_client::editor::{EditorEvent, EntryField, EntryStatus, EntryTarget};
use pahinga_client::error::ClientError;
use pahinga_client::journal::{writing_streak, DateOrder, JournalQuery, Mood};
use pahinga_client::models::EntryId;
use pahinga_client::session::Decision;
use pahinga_client::state::AppState;
use pahinga_client::telemetry::init_tracing;

/// Command-line client for the Pahinga journal.
#[derive(Debug, Parser)]
#[command(name = "pahinga", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Log in and store the session
    Login { username: String, password: String },
    /// Create an account and log in
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show whether a session is active
    Status,
    /// Show the logged-in profile
    #[command(name = "whoami")]
    WhoAmI,
    /// List journal entries
    Journals {
        /// Only entries with this dominant mood (repeatable)
        #[arg(long = "mood", value_name = "MOOD")]
        moods: Vec<Mood>,
        /// Oldest entries first
        #[arg(long)]
        oldest: bool,
        /// Free-text search over title, content, date and mood
        search: Vec<String>,
    },
    /// Show the current writing streak
    Streak,
    /// Write a new entry
    Write { title: String, content: String },
    /// Run the emotion analysis for an entry
    Analyze {
        #[arg(value_name = "ENTRY_ID")]
        id: i64,
    },
    /// Delete the logged-in account
    DeleteAccount,
}

#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error("not logged in (run `pahinga login`)")]
    NotLoggedIn,

    #[error(transparent)]
    Client(#[from] ClientError),
}

fn journal_query(moods: Vec<Mood>, oldest: bool, search: Vec<String>) -> JournalQuery {
    let mut query = moods
        .into_iter()
        .fold(JournalQuery::default(), |query, mood| query.mood(mood));
    if oldest {
        query = query.order(DateOrder::OldestFirst);
    }
    query.search(search.join(" "))
}

async fn require_session(state: &AppState) -> Result<(), CommandError> {
    match state.guard.evaluate().await {
        Decision::Render => Ok(()),
        Decision::Wait | Decision::Redirect => Err(CommandError::NotLoggedIn),
    }
}

async fn run(state: &AppState, command: Command) -> Result<(), CommandError> {
    match command {
        Command::Login { username, password } => {
            state.api.login(&username, &password).await?;
            println!("Logged in as {username}");
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let profile = state.api.register(&username, &email, &password).await?;
            println!("Registered {} (id {})", profile.username, profile.id);
        }
        Command::Logout => {
            state.api.logout();
            println!("Logged out");
        }
        Command::Status => match state.guard.evaluate().await {
            Decision::Render => println!("Logged in"),
            Decision::Wait | Decision::Redirect => println!("Logged out"),
        },
        Command::WhoAmI => {
            require_session(state).await?;
            let profile = state.cache.profile().await?;
            println!("{} <{}> (id {})", profile.username, profile.email, profile.id);
        }
        Command::Journals {
            moods,
            oldest,
            search,
        } => {
            require_session(state).await?;
            let query = journal_query(moods, oldest, search);
            let entries = query.apply(&state.cache.journals().await?);
            if entries.is_empty() {
                println!("No entries found.");
            }
            for entry in entries {
                let mood = Mood::of(&entry).map(Mood::as_str).unwrap_or("-");
                println!("{:>5}  {}  {:<8}  {}", entry.id.0, entry.date, mood, entry.title);
            }
        }
        Command::Streak => {
            require_session(state).await?;
            let entries = state.cache.journals().await?;
            let days = writing_streak(&entries, Utc::now().date_naive());
            println!("{days} day streak");
        }
        Command::Write { title, content } => {
            require_session(state).await?;
            let (editor, mut events) = state.open_editor(EntryTarget::New);
            editor.on_field_change(EntryField::Title, title);
            editor.on_field_change(EntryField::Content, content);
            editor.on_leave().await;

            while let Ok(event) = events.try_recv() {
                if let EditorEvent::Failed { error, .. } = event {
                    return Err(error.into());
                }
            }
            match editor.draft().id {
                Some(id) => {
                    // Mood stats are computed server-side; list them fresh next time
                    state.cache.invalidate_journals();
                    println!("Saved entry {id}");
                }
                None => println!("Nothing to save (title needs 3 characters or content 5)"),
            }
        }
        Command::Analyze { id } => {
            let id = EntryId(id);
            require_session(state).await?;
            let (editor, _events) = state.open_editor(EntryTarget::Existing(id));
            let mut draft = editor.subscribe();
            let _ = draft
                .wait_for(|d| d.status != EntryStatus::Loading)
                .await;
            if editor.draft().id != Some(id) {
                return Err(ClientError::NotSaved.into());
            }

            let analysis = editor.analyze().await?;
            editor.on_leave().await;
            let stats = &analysis.mood_stats;
            println!("Dominant mood: {}", stats.dominant_mood);
            println!(
                "happiness {}%  sadness {}%  anger {}%  fear {}%  disgust {}%  surprise {}%",
                stats.percent_happiness,
                stats.percent_sadness,
                stats.percent_anger,
                stats.percent_fear,
                stats.percent_disgust,
                stats.percent_surprise
            );
            if let Some(insight) = analysis.insights {
                println!("\n{}", insight.insight_content);
            }
        }
        Command::DeleteAccount => {
            require_session(state).await?;
            let profile = state.cache.profile().await?;
            state.api.delete_account(profile.id).await?;
            println!("Account {} deleted", profile.username);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("startup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    let watcher = state.spawn_cache_watcher(shutdown.clone());
    let result = run(&state, cli.command).await;
    shutdown.cancel();
    let _ = watcher.await;
    info!("Done");

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
