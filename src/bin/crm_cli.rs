//!
//! crm CLI binary
//! ---------------
//! Small command-line client over the session & gateway layer: log in (demo
//! credentials work offline), inspect the resolved identity, and list the
//! resource families a role is allowed to see.

use std::env;

use anyhow::{anyhow, Result};

use crm_client::session::{allowed_prefixes, demo::DEMO_ACCOUNTS};
use crm_client::{ClientConfig, Gateway};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--api <url>] [--storage <dir>] <command> [args]\n\nCommands:\n  login <email> <password>   authenticate (demo accounts match locally, others hit the backend)\n  whoami                     show the resolved current user and role\n  logout                     clear the stored session\n  list <resource>            list users|customers|leads|tasks|sales\n  dashboard                  fetch dashboard stats\n  demo-accounts              print the built-in demo credential table\n\nFlags:\n  --api <url>        API base URL (default: {api}, env CRM_API_URL)\n  --storage <dir>    session storage directory (env CRM_STORAGE_DIR)\n  -h, --help         show this help\n\nExamples:\n  {program} login admin@crm.com admin123\n  {program} whoami\n  {program} list customers",
        api = crm_client::config::DEFAULT_API_URL,
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut config = ClientConfig::from_env();
    let mut rest: Vec<String> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--api" => {
                i += 1;
                config.api_url = args
                    .get(i)
                    .cloned()
                    .ok_or_else(|| anyhow!("--api requires a value"))?;
            }
            "--storage" => {
                i += 1;
                config.storage_dir = args
                    .get(i)
                    .cloned()
                    .ok_or_else(|| anyhow!("--storage requires a value"))?
                    .into();
            }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            other => rest.push(other.to_string()),
        }
        i += 1;
    }

    if rest.is_empty() {
        print_usage(&program);
        return Ok(());
    }

    let gw = Gateway::from_config(&config)?;

    match rest[0].as_str() {
        "login" => {
            let (email, password) = match (rest.get(1), rest.get(2)) {
                (Some(e), Some(p)) => (e.clone(), p.clone()),
                _ => return Err(anyhow!("login requires <email> <password>")),
            };
            match gw.login(&email, &password).await {
                Ok(user) => {
                    println!("logged in as {} (role {})", user.display_name(), user.role)
                }
                Err(e) => {
                    if e.is_unreachable() {
                        eprintln!("backend unreachable; demo accounts still work (try `{program} demo-accounts`)");
                    }
                    return Err(e.into());
                }
            }
        }
        "whoami" => match gw.session().current_user() {
            Some(user) => {
                println!("name:  {}", user.display_name());
                println!("email: {}", user.email.as_deref().unwrap_or("-"));
                println!("role:  {}", user.role);
                println!("paths: {}", allowed_prefixes(&user.role).join(", "));
            }
            None => println!("not logged in"),
        },
        "logout" => {
            gw.session().logout();
            println!("session cleared");
        }
        "list" => {
            let resource = rest
                .get(1)
                .ok_or_else(|| anyhow!("list requires a resource name"))?;
            let rows = match resource.as_str() {
                "users" => serde_json::to_value(gw.users().list().await?)?,
                "customers" => serde_json::to_value(gw.customers().list().await?)?,
                "leads" => serde_json::to_value(gw.leads().list().await?)?,
                "tasks" => serde_json::to_value(gw.tasks().list().await?)?,
                "sales" => serde_json::to_value(gw.sales().list().await?)?,
                other => return Err(anyhow!("unknown resource '{other}'")),
            };
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        "dashboard" => {
            let stats = gw.dashboard_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        "demo-accounts" => {
            for account in DEMO_ACCOUNTS.iter() {
                println!("{:<20} {:<12} {:<8} {}", account.email, account.password, account.role, account.name);
            }
        }
        other => {
            eprintln!("unknown command '{other}'");
            print_usage(&program);
        }
    }

    Ok(())
}
