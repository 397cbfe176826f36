//! `templar inventory|status|publish|push`: run one reconciliation action.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;

use templar_core::{Config, Environment, FileRecordStore, Notifier, RecordStore};
use templar_remote::{ControllerClient, GithubClient, WebhookNotifier};
use templar_sync::{
    pipeline, Action, BatchReport, Reconciler, Selection, SyncSettings, NOTHING_SELECTED,
};

use super::{list, Invocation};

/// Template names to act on.
#[derive(Args, Debug)]
pub struct NamesArgs {
    /// Template names; omit to act on every known template.
    pub names: Vec<String>,
}

/// Arguments for `templar push`.
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Controller to push to.
    #[arg(long, value_enum)]
    pub env: EnvArg,

    /// Template names; omit to push every known template.
    pub names: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum EnvArg {
    Lab,
    Prod,
}

impl From<EnvArg> for Environment {
    fn from(e: EnvArg) -> Self {
        match e {
            EnvArg::Lab => Environment::Lab,
            EnvArg::Prod => Environment::Prod,
        }
    }
}

pub fn run(ctx: &Invocation, action: Action, names: Vec<String>) -> Result<ExitCode> {
    let home = ctx.home()?;
    let config = ctx.load_config(&home)?;
    let mut store = FileRecordStore::at_path(config.store_path(&home));
    let selection = Selection::from_names(names);

    // Resolve names before authenticating so typos fail fast.
    if action != Action::Inventory {
        let identities = pipeline::resolve_identities(&store, &selection)
            .with_context(|| format!("cannot {action}"))?;
        if let (Action::Push(env), true) = (action, identities.is_empty()) {
            let report = BatchReport::new(Action::Push(env), Vec::new(), NOTHING_SELECTED);
            print_report(&report);
            return Ok(ExitCode::SUCCESS);
        }
    }

    let report = execute(&config, &mut store, action, &selection)?;

    print_report(&report);
    let records = store.list_all().context("failed to read record store")?;
    list::print_table(&records);

    if ctx.notify {
        notify(ctx, &home, &config, &report);
    }

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn execute(
    config: &Config,
    store: &mut FileRecordStore,
    action: Action,
    selection: &Selection,
) -> Result<BatchReport> {
    let timeout = Duration::from_secs(config.http.timeout_secs);
    let mut repository =
        GithubClient::new(&config.repository.base_url, &config.repository.token, timeout);
    let mut lab = connect(config, Environment::Lab, timeout)?;
    let mut prod = connect(config, Environment::Prod, timeout)?;

    let settings = SyncSettings {
        base_branch: config.repository.base_branch.clone(),
        dev_branch: config.repository.dev_branch.clone(),
    };
    let mut reconciler = Reconciler::new(store, &mut repository, &mut lab, &mut prod, settings);
    pipeline::run(&mut reconciler, action, selection).with_context(|| format!("{action} failed"))
}

fn connect(config: &Config, env: Environment, timeout: Duration) -> Result<ControllerClient> {
    let c = match env {
        Environment::Lab => &config.lab,
        Environment::Prod => &config.prod,
    };
    ControllerClient::connect(env, &c.base_url, &c.username, &c.password, timeout)
        .with_context(|| format!("could not authenticate against the {env} controller"))
}

fn print_report(report: &BatchReport) {
    if report.has_failures() {
        println!("{}", report.message.yellow().bold());
    } else {
        println!("{}", report.message.green().bold());
    }
    if let Some(pr) = &report.pull_request {
        println!("  pull request #{}: {}", pr.number, pr.url);
    }
    for (name, failure) in report.failures() {
        println!("  {} {name}: {failure}", "✗".red().bold());
    }
    if let Some(batch) = &report.batch_failure {
        println!("  {} {batch}", "✗".red().bold());
    }
}

/// Forward the outcome. Delivery problems are logged, never fatal.
fn notify(ctx: &Invocation, home: &Path, config: &Config, report: &BatchReport) {
    let Some(settings) = &config.notify else {
        return;
    };
    let rendered = ctx
        .renderer(home)
        .and_then(|r| r.render_notification(report).map_err(Into::into));
    let message = match rendered {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::warn!("notification template failed, sending plain summary: {e}");
            report.summary()
        }
    };
    let mut notifier = WebhookNotifier::new(
        settings.webhook_url.clone(),
        settings.token.clone(),
        Duration::from_secs(config.http.timeout_secs),
    );
    if let Err(e) = notifier.send(&message) {
        tracing::warn!("notification not delivered: {e}");
    }
}
