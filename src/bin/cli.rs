use clap::{Parser, Subcommand, ValueEnum};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;

const TOKEN_FILE: &str = ".wrench_token";

#[derive(Parser)]
#[command(name = "wrench-cli")]
#[command(about = "CLI for the WRENCH training platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Active community slug (defaults to the first joined community)
    #[arg(short, long, global = true)]
    community: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    Bootstrap,
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long, value_enum, default_value = "beginner")]
        level: Level,
        /// Admin invite code; signs up as an administrator when given
        #[arg(short, long)]
        invite: Option<String>,
    },
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    Dashboard,
    Courses,
    Tests,
    Communities,
    Submit {
        #[arg(short, long)]
        test_id: String,
        /// Selected option index per question, in order
        #[arg(short, long, value_delimiter = ',')]
        answers: Vec<usize>,
    },
    Overview,
    CreateInvite {
        #[arg(short, long, default_value_t = 1)]
        uses: i64,
    },
    CreateCommunity {
        #[arg(short, long)]
        slug: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    AddMember {
        #[arg(short, long)]
        slug: String,
        #[arg(short, long)]
        username: String,
        #[arg(long)]
        admin: bool,
    },
    Announce {
        #[arg(short, long)]
        slug: String,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        message: String,
    },
    Logout,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

fn authorized(builder: RequestBuilder) -> RequestBuilder {
    let token = fs::read_to_string(TOKEN_FILE).unwrap_or_default();
    builder.header("Authorization", format!("Bearer {}", token.trim()))
}

fn community_query(community: &Option<String>) -> Vec<(&'static str, String)> {
    community.iter().map(|slug| ("community", slug.clone())).collect()
}

async fn print_response(builder: RequestBuilder) -> Result<(), Box<dyn std::error::Error>> {
    let res = builder.send().await?;
    let status = res.status();
    let text = res.text().await?;
    let body = serde_json::from_str::<Value>(&text)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or(text);
    println!("{status}\n{body}");
    Ok(())
}

async fn save_token(builder: RequestBuilder) -> Result<(), Box<dyn std::error::Error>> {
    let res = builder.send().await?;
    if res.status().is_success() {
        let body: LoginResponse = res.json().await?;
        fs::write(TOKEN_FILE, body.token)?;
        println!("Token saved to {TOKEN_FILE}");
    } else {
        println!("Request failed ({}): {}", res.status(), res.text().await?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();
    let url = cli.url.trim_end_matches('/');
    let query = community_query(&cli.community);

    match cli.command {
        Commands::Bootstrap => {
            print_response(client.get(format!("{url}/api/bootstrap"))).await?;
        }
        Commands::Signup { username, password, email, name, level, invite } => {
            let role = if invite.is_some() { "admin" } else { "learner" };
            let req = client.post(format!("{url}/api/auth/signup")).json(&json!({
                "username": username,
                "password": password,
                "email": email,
                "name": name,
                "level": level.as_str(),
                "role": role,
                "admin_invite_code": invite,
                "community_slug": cli.community,
            }));
            save_token(req).await?;
        }
        Commands::Login { username, password } => {
            let req = client
                .post(format!("{url}/api/auth/login"))
                .json(&json!({ "username": username, "password": password }));
            save_token(req).await?;
        }
        Commands::Dashboard => {
            print_response(authorized(client.get(format!("{url}/api/dashboard")).query(&query))).await?;
        }
        Commands::Courses => {
            print_response(authorized(client.get(format!("{url}/api/courses")).query(&query))).await?;
        }
        Commands::Tests => {
            print_response(authorized(client.get(format!("{url}/api/tests")).query(&query))).await?;
        }
        Commands::Communities => {
            print_response(authorized(client.get(format!("{url}/api/communities")))).await?;
        }
        Commands::Submit { test_id, answers } => {
            let req = client
                .post(format!("{url}/api/tests/submit"))
                .query(&query)
                .json(&json!({ "test_id": test_id, "selected_option_indexes": answers }));
            print_response(authorized(req)).await?;
        }
        Commands::Overview => {
            print_response(authorized(client.get(format!("{url}/api/admin/overview")))).await?;
        }
        Commands::CreateInvite { uses } => {
            let req = client
                .post(format!("{url}/api/admin/invite-codes"))
                .json(&json!({ "uses": uses }));
            print_response(authorized(req)).await?;
        }
        Commands::CreateCommunity { slug, name, description } => {
            let req = client
                .post(format!("{url}/api/admin/communities"))
                .json(&json!({ "slug": slug, "name": name, "description": description }));
            print_response(authorized(req)).await?;
        }
        Commands::AddMember { slug, username, admin } => {
            let role = if admin { "admin" } else { "learner" };
            let req = client
                .post(format!("{url}/api/admin/community-members"))
                .json(&json!({ "community_slug": slug, "username": username, "role": role }));
            print_response(authorized(req)).await?;
        }
        Commands::Announce { slug, title, message } => {
            let req = client
                .post(format!("{url}/api/admin/announcements"))
                .json(&json!({ "community_slug": slug, "title": title, "message": message }));
            print_response(authorized(req)).await?;
        }
        Commands::Logout => {
            let _ = fs::remove_file(TOKEN_FILE);
            println!("Logged out (token removed).");
        }
    }

    Ok(())
}
