use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "harp-cli")]
#[command(about = "Client for the harp management API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:7070")]
    url: String,

    #[arg(short, long, env = "HARP_API_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Resource {
    Configurations,
    Frontends,
    Backends,
    Servers,
    Targets,
    Acls,
}

impl Resource {
    fn path(self) -> &'static str {
        match self {
            Resource::Configurations => "configurations",
            Resource::Frontends => "frontends",
            Resource::Backends => "backends",
            Resource::Servers => "servers",
            Resource::Targets => "targets",
            Resource::Acls => "acls",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List every entity of a kind
    List { resource: Resource },
    /// Show one entity by composite id
    Get { resource: Resource, id: String },
    /// Print the rendered configuration text
    Render { configuration: String },
    /// Render, write and reload a configuration
    Commit { configuration: String },
    /// Delete one entity by composite id
    Delete { resource: Resource, id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = format!("{}/api/v1", cli.url.trim_end_matches('/'));

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;

    let request = match &cli.command {
        Commands::List { resource } => client.get(format!("{}/{}", base, resource.path())),
        Commands::Get { resource, id } => {
            client.get(format!("{}/{}/{}", base, resource.path(), id))
        }
        Commands::Render { configuration } => {
            client.get(format!("{}/configurations/{}/render", base, configuration))
        }
        Commands::Commit { configuration } => client
            .put(format!("{}/configurations/{}", base, configuration))
            .json(&json!({ "commit": true })),
        Commands::Delete { resource, id } => {
            client.delete(format!("{}/{}/{}", base, resource.path(), id))
        }
    };

    let res = request.send().await?;
    if matches!(cli.command, Commands::Render { .. }) && res.status().is_success() {
        print!("{}", res.text().await?);
        return Ok(());
    }
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
