//! varscope - inspect and manage scoped dashboard variables

mod cli;
mod commands;
mod config;

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use url::Url;
use varscope_application::ports::{DatasourceRepository, VariableRepository};
use varscope_application::use_cases::ViewServices;
use varscope_domain::TimeRange;
use varscope_infrastructure::{
    FileResourceStore, HttpResourceStore, StaticPluginLoader, SystemClock, UrlQueryParamStore,
};

use crate::cli::{Cli, Command};
use crate::commands::{Services, Session};
use crate::config::AppConfig;

/// Link used when none is given; only its query string matters.
const DEFAULT_LINK: &str = "http://localhost/explore";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let time_range = match &cli.time_range {
        Some(range) => TimeRange::relative(range)?,
        None => config.time_range()?,
    };
    let link = Arc::new(UrlQueryParamStore::parse(
        cli.link.as_deref().unwrap_or(DEFAULT_LINK),
    )?);
    let services = build_services(&config, Arc::clone(&link))?;
    let session = Session::new(services, link, time_range, config.project.clone(), cli.format);

    let mut out = std::io::stdout();
    match &cli.command {
        Command::Explore { project, values } => {
            session.explore(project.as_deref(), *values, &mut out).await?;
        }
        Command::Show { name, project } => {
            session.show(name, project.as_deref(), &mut out).await?;
        }
        Command::Set {
            name,
            query,
            project,
        } => {
            session.set(name, query, project.as_deref(), &mut out).await?;
        }
        Command::Delete { name, project, yes } => {
            session.delete(name, project.as_deref(), *yes, &mut out).await?;
        }
    }
    Ok(())
}

/// Wires the configured resource store and the local adapters.
fn build_services(
    config: &AppConfig,
    link: Arc<UrlQueryParamStore>,
) -> Result<Services, Box<dyn Error>> {
    let (variables, datasources) = if let Some(api_url) = &config.api_url {
        tracing::info!(url = %api_url, "Using resource API");
        erase(HttpResourceStore::new(Url::parse(api_url)?)?)
    } else {
        tracing::info!(path = %config.data_dir.display(), "Using file store");
        erase(FileResourceStore::new(&config.data_dir))
    };

    Ok(ViewServices {
        variables,
        datasources,
        plugins: Arc::new(StaticPluginLoader::new()),
        params: link,
        clock: Arc::new(SystemClock::new()),
    })
}

/// Shares one store behind both repository ports.
fn erase<S>(store: S) -> (Arc<dyn VariableRepository>, Arc<dyn DatasourceRepository>)
where
    S: VariableRepository + DatasourceRepository + 'static,
{
    let store = Arc::new(store);
    let variables: Arc<dyn VariableRepository> = Arc::clone(&store) as _;
    let datasources: Arc<dyn DatasourceRepository> = store;
    (variables, datasources)
}
