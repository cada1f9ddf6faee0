// Mint a JWT for local development and testing.

use anyhow::{Context, Result};
use clap::Parser;
use server_core::domains::auth::JwtService;
use uuid::Uuid;

#[derive(Parser)]
#[command(about = "Create a JWT for a user id")]
struct Args {
    /// User id to embed in the token (random when omitted)
    #[arg(long)]
    user_id: Option<Uuid>,

    /// Signing secret (falls back to JWT_SECRET)
    #[arg(long)]
    secret: Option<String>,

    /// Token issuer (falls back to JWT_ISSUER, then "document-qa")
    #[arg(long)]
    issuer: Option<String>,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let secret = match args.secret {
        Some(secret) => secret,
        None => std::env::var("JWT_SECRET").context("pass --secret or set JWT_SECRET")?,
    };
    let issuer = args
        .issuer
        .or_else(|| std::env::var("JWT_ISSUER").ok())
        .unwrap_or_else(|| "document-qa".to_string());

    let user_id = args.user_id.unwrap_or_else(Uuid::new_v4);

    let service = JwtService::new(&secret, issuer);
    let token = service.create_token(user_id)?;

    println!("user_id: {user_id}");
    println!("{token}");

    Ok(())
}
