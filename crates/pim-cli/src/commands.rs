use std::time::Duration;

use anyhow::{bail, Context, Result};
use pim_client::{authenticate, Client, SessionTokenCache};
use pim_jsonrpc::JsonRpcTransport;
use pim_pipeline::TracingMiddleware;
use pim_schema::{Filters, Pagination, SchemaResponse};

use crate::cli_args::{Cli, Command};

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    let mut client = build_client(&cli);
    authenticate_client(&mut client, &cli)?;

    match cli.command {
        Command::BaseAttributeSet => {
            let id = client
                .base_attribute_set_id()
                .context("failed to resolve base attribute set")?;
            println!("{id}");
        }
        Command::ListAttributeSets {
            start,
            limit,
            filters,
        } => {
            let pagination = Pagination::new().with_start(start)?.with_limit(limit)?;
            let filters = filters
                .into_iter()
                .fold(Filters::new(), |filters, (property, value)| {
                    filters.equals(property, value)
                });
            let response = client
                .list_attribute_sets(Some(&filters), Some(&pagination))
                .context("failed to list attribute sets")?;
            print!("{}", SchemaResponse::new(response));
        }
        Command::Call {
            method,
            arg,
            notify,
        } => {
            if notify {
                client
                    .notify(&method, arg)
                    .with_context(|| format!("notification '{method}' failed"))?;
            } else {
                let result = client
                    .call(&method, arg)
                    .with_context(|| format!("call '{method}' failed"))?;
                let rendered = serde_json::to_string_pretty(&result)
                    .context("failed to render call result")?;
                println!("{rendered}");
            }
        }
    }
    Ok(())
}

fn build_client(cli: &Cli) -> Client {
    let mut transport = JsonRpcTransport::new(cli.endpoint.as_str());
    transport
        .set_timeout(Duration::from_millis(cli.timeout_ms))
        .set_verify_tls(!cli.insecure);
    for (name, value) in &cli.headers {
        transport.set_header(name.as_str(), value.as_str());
    }

    let mut client = Client::from_transport(transport);
    client.push_middleware(TracingMiddleware::new());
    client
}

fn authenticate_client(client: &mut Client, cli: &Cli) -> Result<()> {
    if let Some(token) = cli.token.as_deref().filter(|token| !token.trim().is_empty()) {
        client.set_auth(token.trim());
        return Ok(());
    }

    let cache = SessionTokenCache::new(&cli.token_cache);
    match (cli.login.as_deref(), cli.password.as_deref()) {
        (Some(login), Some(password)) => {
            authenticate(client, &cache, login, password)?;
        }
        _ => match cache.load()? {
            Some(token) => client.set_auth(&token),
            None => bail!(
                "no fresh session in {} and no credentials: set PIM_LOGIN and PIM_PASSWORD, or PIM_TOKEN",
                cache.path().display()
            ),
        },
    }
    Ok(())
}
