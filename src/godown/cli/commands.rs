//! # CLI Dispatch
//!
//! - `run()`: parses arguments, sets up logging and the [`AppContext`], dispatches
//! - `handle_*()`: one per command; call the API, prompt when needed, print
//!
//! Every handler that works on records fetches the tree first, so ids and parents are
//! checked against what the server has right now.

use super::render::{
    print_messages, render_config, render_dashboard, render_delete_plan, render_detail,
    render_item_detail, render_item_table, render_user,
};
use super::setup::{
    location_draft, BundledItemArgs, Cli, Commands, FilterArgs, ItemArgs, ItemCommands,
    LocationCommands,
};
use super::shell;
use clap::Parser;
use console::Term;
use godown::api::GodownApi;
use godown::auth::FileTokenStore;
use godown::commands::{CmdMessage, CmdResult};
use godown::config::{GodownConfig, GodownPaths};
use godown::error::{GodownError, Result};
use godown::store::rest::RestBackend;
use std::io::{self, IsTerminal, Write};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "GODOWN_LOG";

pub struct AppContext {
    pub api: GodownApi<RestBackend>,
    pub paths: GodownPaths,
    pub config: GodownConfig,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::Login { email, password }) => handle_login(&mut ctx, &email, password),
        Some(Commands::Register {
            username,
            email,
            password,
        }) => handle_register(&mut ctx, &username, &email, password),
        Some(Commands::Logout) => handle_logout(&mut ctx),
        Some(Commands::Whoami) => handle_whoami(&ctx),
        Some(Commands::Tree {
            expand_all,
            open,
            filter,
        }) => handle_tree(&mut ctx, expand_all, &open, &filter),
        Some(Commands::Items { filter }) => handle_items(&mut ctx, &filter),
        Some(Commands::Location(cmd)) => match cmd {
            LocationCommands::Add {
                name,
                godown,
                parent,
                item,
                yes,
            } => handle_location_add(&mut ctx, &name, godown, parent.as_deref(), &item, yes),
            LocationCommands::Rm { id, cascade, yes } => {
                handle_location_rm(&mut ctx, &id, cascade, yes)
            }
            LocationCommands::Show { id } => handle_location_show(&mut ctx, &id),
        },
        Some(Commands::Item(cmd)) => match cmd {
            ItemCommands::Add {
                location_id,
                fields,
                yes,
            } => handle_item_add(&mut ctx, &location_id, &fields, yes),
            ItemCommands::Rm { id } => handle_item_rm(&mut ctx, &id),
            ItemCommands::Show { id } => handle_item_show(&mut ctx, &id),
        },
        Some(Commands::Shell) => shell::run(&mut ctx),
        Some(Commands::Config) => handle_config(&ctx),
        None => handle_tree(&mut ctx, false, &[], &FilterArgs::default()),
    }
}

/// Logs go to stderr. `GODOWN_LOG` takes an `EnvFilter` directive; `-v` wins over it.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,godown=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init();
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let paths = GodownPaths::resolve()?;
    let mut config = GodownConfig::load(&paths.config_dir)?;
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    tracing::debug!(api_url = %config.api_url, "configuration loaded");

    let tokens = FileTokenStore::new(paths.token_file());
    let backend = RestBackend::new(&config, Box::new(tokens))?;
    Ok(AppContext {
        api: GodownApi::new(backend, config.clone()),
        paths,
        config,
    })
}

/// Prints messages and turns an error-level message into exit code 1.
fn finish(result: &CmdResult) {
    print_messages(&result.messages);
    if result.has_errors() {
        std::process::exit(1);
    }
}

/// Asks a yes/no question on the terminal. `yes` answers it up front; without a
/// terminal and without `yes` the answer is no.
pub(super) fn confirm(question: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(GodownError::ConfirmationRequired(format!(
            "{} (re-run with --yes)",
            question
        )));
    }
    print!("{} [y/N]: ", question);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn read_password(password: Option<String>) -> Result<String> {
    match password {
        Some(p) => Ok(p),
        None => {
            let term = Term::stderr();
            term.write_str("Password: ")?;
            Ok(term.read_secure_line()?)
        }
    }
}

fn handle_login(ctx: &mut AppContext, email: &str, password: Option<String>) -> Result<()> {
    let password = read_password(password)?;
    let result = ctx.api.login(email, &password)?;
    finish(&result);
    Ok(())
}

fn handle_register(
    ctx: &mut AppContext,
    username: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = read_password(password)?;
    let result = ctx.api.register(username, email, &password)?;
    finish(&result);
    Ok(())
}

fn handle_logout(ctx: &mut AppContext) -> Result<()> {
    let result = ctx.api.logout()?;
    finish(&result);
    Ok(())
}

fn handle_whoami(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.whoami()?;
    if let Some(user) = &result.user {
        print!("{}", render_user(user));
    }
    finish(&result);
    Ok(())
}

fn handle_tree(
    ctx: &mut AppContext,
    expand_all: bool,
    open: &[String],
    filter: &FilterArgs,
) -> Result<()> {
    ctx.api.set_filters(filter.to_filter());
    ctx.api.refresh()?;
    if expand_all {
        ctx.api.expand_all();
    }
    for id in open {
        ctx.api.expand(id)?;
    }
    print!("{}", render_dashboard(&ctx.api.dashboard()));
    Ok(())
}

fn handle_items(ctx: &mut AppContext, filter: &FilterArgs) -> Result<()> {
    ctx.api.set_filters(filter.to_filter());
    ctx.api.refresh()?;
    let store = ctx.api.store();
    print!("{}", render_item_table(store.items(), store));
    Ok(())
}

fn handle_location_add(
    ctx: &mut AppContext,
    name: &str,
    godown: bool,
    parent: Option<&str>,
    item: &BundledItemArgs,
    yes: bool,
) -> Result<()> {
    let draft = location_draft(name, godown, parent);
    ctx.api.refresh()?;

    let result = match item.to_draft() {
        Some(item_draft) => {
            let pending = item_draft.validate("")?;
            let confirmed = pending.needs_confirmation()
                && confirm(&pending.confirmation_prompt(), yes)?;
            if pending.needs_confirmation() && !confirmed {
                println!("Cancelled.");
                return Ok(());
            }
            ctx.api
                .create_location_with_item(&draft, &item_draft, confirmed)?
        }
        None => ctx.api.create_location(&draft)?,
    };
    if let Some(created) = result.affected_locations.first() {
        println!("{}", created.id);
    }
    finish(&result);
    Ok(())
}

fn handle_location_rm(ctx: &mut AppContext, id: &str, cascade: bool, yes: bool) -> Result<()> {
    ctx.api.refresh()?;
    let plan = ctx.api.delete_location_preview(id)?;

    if plan.has_contents() {
        if !cascade {
            return Err(GodownError::validation(format!(
                "'{}' still holds {}. Use --cascade to delete it with everything inside.",
                plan.location.name,
                plan.summary()
            )));
        }
        print!("{}", render_delete_plan(&plan));
        if !confirm("Delete all of this?", yes)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let result = ctx.api.delete_location(id, cascade)?;
    finish(&result);
    Ok(())
}

fn handle_location_show(ctx: &mut AppContext, id: &str) -> Result<()> {
    ctx.api.refresh()?;
    ctx.api.select_location(id)?;
    print!("{}", render_detail(&ctx.api.dashboard().detail));
    Ok(())
}

fn handle_item_add(
    ctx: &mut AppContext,
    location_id: &str,
    fields: &ItemArgs,
    yes: bool,
) -> Result<()> {
    let draft = fields.to_draft();
    // Shape errors (bad JSON, negative quantity) are reported before any request.
    draft.validate(location_id)?;

    ctx.api.refresh()?;
    let pending = ctx.api.prepare_item(location_id, &draft)?;
    let confirmed = pending.needs_confirmation() && confirm(&pending.confirmation_prompt(), yes)?;
    if pending.needs_confirmation() && !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    let result = ctx.api.create_item(location_id, &draft, confirmed)?;
    if let Some(created) = result.affected_items.first() {
        println!("{}", created.id);
    }
    finish(&result);
    Ok(())
}

fn handle_item_rm(ctx: &mut AppContext, id: &str) -> Result<()> {
    ctx.api.refresh()?;
    let result = ctx.api.delete_item(id)?;
    finish(&result);
    Ok(())
}

fn handle_item_show(ctx: &mut AppContext, id: &str) -> Result<()> {
    ctx.api.refresh()?;
    let result = ctx.api.get_item(id)?;
    for item in &result.listed_items {
        let location = ctx.api.store().location(&item.sub_godown_id);
        print!("{}", render_item_detail(item, location));
    }
    finish(&result);
    Ok(())
}

fn handle_config(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.config();
    let config = result.config.as_ref().unwrap_or(&ctx.config);
    print!("{}", render_config(config, &ctx.paths));
    if std::env::var_os(LOG_ENV).is_some() {
        print_messages(&[CmdMessage::info(format!(
            "{} is set; logging follows it",
            LOG_ENV
        ))]);
    }
    Ok(())
}
