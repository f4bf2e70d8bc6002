use chrono::Utc;
use clap::{Parser, ValueEnum};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

/// Mint an HS256 bearer token for local testing against the content gate.
///
/// Claims: sub, role (MEMBER | ADMIN), iat, exp. Signed with the same
/// shared secret the server reads from JWT_SECRET.
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// Subject (customer / user id)
    #[arg(long)]
    sub: String,

    #[arg(long, value_enum, default_value_t = RoleArg::Member)]
    role: RoleArg,

    /// Lifetime in seconds. Negative values mint an already expired token.
    #[arg(long, default_value_t = 3600, allow_negative_numbers = true)]
    ttl_seconds: i64,

    /// Signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    secret: String,

    /// Print only the token (no extra lines)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Member,
    Admin,
}

impl RoleArg {
    fn claim(self) -> &'static str {
        match self {
            RoleArg::Member => "MEMBER",
            RoleArg::Admin => "ADMIN",
        }
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    sub: &'a str,
    role: &'static str,
    iat: i64,
    exp: i64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.secret.trim().is_empty() {
        return Err("secret must not be empty".into());
    }

    let iat = Utc::now().timestamp();
    let exp = iat + args.ttl_seconds;

    let claims = Claims {
        sub: &args.sub,
        role: args.role.claim(),
        iat,
        exp,
    };

    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(args.secret.as_bytes()),
    )?;

    if args.quiet {
        println!("{}", token);
        return Ok(());
    }

    println!("token: {}", token);
    println!("sub: {}", claims.sub);
    println!("role: {}", claims.role);
    println!("iat: {}", iat);
    println!("exp: {}", exp);

    Ok(())
}
