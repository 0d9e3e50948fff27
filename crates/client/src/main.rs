use anyhow::{Context, bail};
use serde::Serialize;

use formadmin_client::{ClientConfig, FormadminClient};
use formadmin_core::{AttendanceFilter, FormationFilter, FormationId, UserFilter, resolve_role};

const USAGE: &str = "usage: formadmin <command>

commands:
  login <email> <password>
  logout
  whoami
  navigate <path>
  explain <path>
  menu
  users [role]
  teams
  formations
  participants <formation-id>
  attendance <formation-id> [yyyy-mm-dd]
  stats
  demo <role>            (requires FORMADMIN_DEMO_MODE)
  status";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    formadmin_observability::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        return Ok(());
    };
    let arg = |i: usize| args.get(i).map(String::as_str);

    let client = FormadminClient::new(ClientConfig::from_env())?;

    match command.as_str() {
        "login" => {
            let (Some(email), Some(password)) = (arg(1), arg(2)) else {
                bail!("login needs <email> <password>");
            };
            let outcome = client.auth.login(email, password).await?;
            print_json(&serde_json::json!({
                "name": outcome.principal.display_name(),
                "user": outcome.principal,
                "redirect": outcome.target.home_path(),
            }))
        }
        "logout" => {
            client.auth.logout().await?;
            print_json(&serde_json::json!({ "logged_out": true }))
        }
        "whoami" => print_json(&client.auth.me().await?),
        "navigate" => {
            let path = arg(1).context("navigate needs <path>")?;
            let decision = client.navigate(path);
            print_json(&serde_json::json!({
                "decision": decision,
                "redirect": decision.redirect_path(),
            }))
        }
        "explain" => print_json(&client.explain(arg(1).context("explain needs <path>")?)),
        "menu" => print_json(&client.menu()),
        "users" => {
            let filter = arg(1).map(UserFilter::by_role).unwrap_or_default();
            print_json(&client.users.list(&filter).await?)
        }
        "teams" => print_json(&client.teams.list(&()).await?),
        "formations" => print_json(&client.formations.list(&FormationFilter::default()).await?),
        "participants" => {
            let id: FormationId = arg(1).context("participants needs <formation-id>")?.parse()?;
            print_json(&client.participants.list(id).await?)
        }
        "attendance" => {
            let formation_id: FormationId = arg(1).context("attendance needs <formation-id>")?.parse()?;
            let date = arg(2)
                .map(|d| d.parse::<chrono::NaiveDate>())
                .transpose()
                .context("date must be yyyy-mm-dd")?;
            print_json(&client.attendance.list(&AttendanceFilter { formation_id, date }).await?)
        }
        "stats" => print_json(&client.statistics.dashboard().await?),
        "demo" => {
            let raw = arg(1).context("demo needs <role>")?;
            let role = resolve_role(Some(raw)).with_context(|| format!("unknown role '{raw}'"))?;
            let outcome = client.auth.demo_switch(role)?;
            print_json(&serde_json::json!({
                "name": outcome.principal.display_name(),
                "user": outcome.principal,
                "redirect": outcome.target.home_path(),
            }))
        }
        "status" => print_json(&serde_json::json!({
            "api": client.config.api_base_url,
            "authenticated": client.session.is_authenticated(),
            "offline_resources": client.offline.offline_resources(),
        })),
        other => {
            eprintln!("{USAGE}");
            bail!("unknown command '{other}'")
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
