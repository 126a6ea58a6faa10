//! Recipient reachability probe via the gateway's test endpoint.

use clap::Args;
use serde_json::Value;

#[derive(Args)]
pub struct ProbeArgs {
    /// Gateway base URL, e.g. http://localhost:8787
    #[arg(long)]
    pub gateway: String,

    /// Shared bearer secret
    #[arg(long, env = "GATEWAY_SHARED_SECRET")]
    pub secret: String,

    /// Discord handle to probe
    #[arg(long)]
    pub handle: String,
}

pub async fn run(args: ProbeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!(
        "{}/api/discord/test",
        args.gateway.trim_end_matches('/')
    );

    let response = reqwest::Client::new()
        .post(&url)
        .bearer_auth(&args.secret)
        .json(&serde_json::json!({ "handle": args.handle }))
        .send()
        .await?;

    let status = response.status();
    let body: Value = response.json().await?;

    if !status.is_success() {
        return Err(format!("gateway returned {status}: {body}").into());
    }

    if body["found"].as_bool() == Some(true) {
        let delivered = body["delivered"].as_bool() == Some(true);
        println!(
            "{} resolved (user id {}); test DM {}",
            args.handle,
            body["userId"].as_str().unwrap_or("?"),
            if delivered { "delivered" } else { "NOT delivered" }
        );
    } else {
        println!("{} did not resolve to a guild member", args.handle);
    }

    Ok(())
}
