//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::{Payload, Response};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::render::TreeView;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{ExpansionState, NodeId, OrgArena};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `orgtree --help`".to_string(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => {
            let project_dir = project_dir(cli)?;
            execute_config(command, &project_dir)
        }
        _ => {
            let project_dir = project_dir(cli)?;
            let settings = Settings::load(Some(&project_dir))?;
            let container = ServiceContainer::new(settings);
            let roots = container.load_seed(cli.seed.as_deref())?;
            debug!("seeded {} roots", roots.len());
            execute_org(command, &container)
        }
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| CliError::from(InfraError::io("resolve current directory", e))),
    }
}

fn execute_org(command: &Commands, container: &ServiceContainer) -> CliResult<()> {
    match command {
        Commands::Tree { query, all } => cmd_tree(container, query.as_deref(), *all),
        Commands::Search { query } => cmd_search(container, query),
        Commands::Flatten => cmd_flatten(container),
        Commands::Parents => cmd_parents(container),
        Commands::Stats => cmd_stats(container),
        Commands::Apply { script } => cmd_apply(container, script),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not operate on the hierarchy".to_string(),
        )),
    }
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, query: Option<&str>, all: bool) -> CliResult<()> {
    let arena = container.org.snapshot();
    let outcome = container
        .org
        .search_engine()
        .search(&arena, query.unwrap_or_default());
    let mut expansion = ExpansionState::new(container.expansion_policy());
    expansion.apply_search(&outcome);

    if arena.is_empty() {
        output::warning("no departments loaded (use --seed or seed_file)");
        return Ok(());
    }
    if outcome.is_active() && outcome.direct_matches.is_empty() {
        output::warning(&format!("no department matches {:?}", outcome.query));
        return Ok(());
    }

    for tree in TreeView::new(&arena, &outcome, expansion.expanded())
        .expand_all(all)
        .render()
    {
        output::info(&tree);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_search(container: &ServiceContainer, query: &str) -> CliResult<()> {
    let outcome = container.org.search(query);
    if !outcome.is_active() {
        return Err(CliError::InvalidArgs("empty search query".to_string()));
    }

    let arena = container.org.snapshot();
    output::header(&format!(
        "{} match(es) for {:?}",
        outcome.direct_matches.len(),
        outcome.query
    ));
    // Preorder keeps the listing in tree order
    for node in arena.iter().filter(|n| outcome.is_match(&n.id)) {
        let path = path_label(&arena, &arena.ancestors(&node.id));
        let fields = outcome.spans(&node.id).iter().map(|m| m.field).join(", ");
        output::detail(&format!("{} [{}] {}{} ({})", node.id, node.code, path, node.name, fields));
    }
    output::action(
        "expand",
        &outcome.expansion_set.iter().map(NodeId::as_str).join(", "),
    );
    Ok(())
}

#[instrument(skip(container))]
fn cmd_flatten(container: &ServiceContainer) -> CliResult<()> {
    let arena = container.org.snapshot();
    for entry in container.org.flatten() {
        let dept = &entry.department;
        output::info(&format!(
            "{}\tL{}\t{}{}\t{}",
            dept.id,
            dept.level,
            path_label(&arena, &entry.ancestors),
            dept.name,
            dept.status
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_parents(container: &ServiceContainer) -> CliResult<()> {
    for option in container.org.parent_options() {
        output::info(&format!("{}\t{}", option.id, option.label));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_stats(container: &ServiceContainer) -> CliResult<()> {
    let stats = container.org.stats();
    output::header("Organization");
    output::detail(&format!("departments: {}", stats.total));
    output::detail(&format!("root departments: {}", stats.roots));
    output::detail(&format!("active: {}, disabled: {}", stats.active, stats.disabled));
    output::detail(&format!("members: {}", stats.total_members));
    output::detail(&format!("average members: {:.1}", stats.average_members));
    for (level, count) in &stats.per_level {
        output::detail(&format!("level {level}: {count}"));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_apply(container: &ServiceContainer, script: &Path) -> CliResult<()> {
    let script = container.import.load_script(script)?;
    let responses = container.org.execute_all(script.requests);
    let mut failed = 0;
    for (n, response) in responses.iter().enumerate() {
        match response {
            Response::Ok(payload) => output::success(&format!("#{} {}", n + 1, describe(payload))),
            Response::Error(err) => {
                failed += 1;
                output::failure(&format!("#{} {}", n + 1, err.message));
            }
        }
    }
    if failed > 0 {
        output::warning(&format!("{failed} of {} requests failed", responses.len()));
    }
    Ok(())
}

fn describe(payload: &Payload) -> String {
    match payload {
        Payload::Inserted { id } => format!("inserted {id}"),
        Payload::Updated { id } => format!("updated {id}"),
        Payload::Deleted { id, removed } => format!("deleted {id} ({removed} departments)"),
        Payload::Found { department: Some(d) } => format!("found {} {}", d.id, d),
        Payload::Found { department: None } => "not found".to_string(),
        Payload::Search { outcome } => format!(
            "{:?}: matches [{}], expand [{}]",
            outcome.query,
            outcome.direct_matches.iter().join(", "),
            outcome.expansion_set.iter().join(", ")
        ),
        Payload::Flatten { nodes } => format!("{} departments", nodes.len()),
        Payload::Parents { options } => format!("{} possible parents", options.len()),
        Payload::Stats { stats } => format!(
            "{} departments, {} members",
            stats.total, stats.total_members
        ),
    }
}

/// `技术部 / 前端开发组 / ` for an ancestor chain.
fn path_label(arena: &OrgArena, ancestors: &[NodeId]) -> String {
    ancestors
        .iter()
        .filter_map(|id| arena.find_by_id(id))
        .map(|d| format!("{} / ", d.name))
        .collect()
}

fn execute_config(command: &ConfigCommands, project_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(project_dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no global config directory on this platform"),
            }
            output::action("local", &local_config_path(project_dir).display());
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("no global config directory on this platform".to_string())
                })?
            } else {
                local_config_path(project_dir)
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            write_template(&RealFileSystem, &path)?;
            output::success(&format!("created {}", path.display()));
        }
    }
    Ok(())
}

fn write_template(fs: &dyn FileSystem, path: &Path) -> CliResult<()> {
    fs.ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create directory for {}", path.display()), e))?;
    fs.write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}
