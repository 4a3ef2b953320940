use anyhow::{Context, Result, bail};
use chrono::{Duration as ChronoDuration, Utc};
use clap::Subcommand;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

use quill_auth::JwtAuthenticationOptions;
use quill_infra::{Config, PostgresStore, config::load_raw};

#[derive(Subcommand, Debug)]
pub enum DevCommand {
    /// Create the database schema (development only; tables are created if missing)
    InitDb,

    /// Mint a token accepted by the internal API, signed with its private key
    Jwt {
        /// Subject user ID; random when omitted
        #[arg(long)]
        sub: Option<Uuid>,

        /// Role to grant under the roles resource; repeatable
        #[arg(long = "role")]
        roles: Vec<String>,

        /// Agent name carried as `azp`
        #[arg(long, default_value = "quill-frontend")]
        agent: String,

        /// Token lifetime in minutes
        #[arg(long, default_value_t = 30)]
        minutes: i64,
    },

    /// Print the effective configuration
    PrintConfig {
        /// Print the merged settings before they are validated
        #[arg(long)]
        raw: bool,
    },
}

pub async fn run(command: DevCommand) -> Result<()> {
    match command {
        DevCommand::InitDb => init_db().await,
        DevCommand::Jwt {
            sub,
            roles,
            agent,
            minutes,
        } => {
            let config = Config::load()?;
            let token = mint_token(
                &config.internal_api.jwt_authentication,
                sub.unwrap_or_else(Uuid::new_v4),
                &roles,
                &agent,
                ChronoDuration::minutes(minutes),
            )?;
            println!("{token}");
            Ok(())
        }
        DevCommand::PrintConfig { raw } => {
            if raw {
                print!("{}", toml::to_string_pretty(&load_raw()?)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
            }
            Ok(())
        }
    }
}

async fn init_db() -> Result<()> {
    let config = super::load_config()?;
    if config.db.is_in_memory() {
        bail!("db.url is memory://; there is no schema to create");
    }
    let store = PostgresStore::connect(&config.db)
        .await
        .context("failed to connect to the database")?;
    store.migrate().await?;
    Ok(())
}

fn mint_token(
    options: &JwtAuthenticationOptions,
    sub: Uuid,
    roles: &[String],
    agent: &str,
    lifetime: ChronoDuration,
) -> Result<String> {
    let now = Utc::now();
    let claims = json!({
        "jti": Uuid::new_v4().to_string(),
        "iss": options.issuer,
        "sub": sub.to_string(),
        "iat": now.timestamp(),
        "nbf": now.timestamp(),
        "exp": (now + lifetime).timestamp(),
        "aud": [options.audience],
        "azp": agent,
        "username": "j.doe",
        "email": "j.doe@example.org",
        "given_name": "John",
        "family_name": "Doe",
        "resource_access": { (options.roles_resource()): { "roles": roles } },
    });

    let token = jsonwebtoken::encode(&Header::new(options.algorithm), &claims, &encoding_key(options)?)?;
    Ok(token)
}

fn encoding_key(options: &JwtAuthenticationOptions) -> Result<EncodingKey> {
    use Algorithm::*;

    let private_pem = || {
        options
            .private_key
            .as_deref()
            .map(str::as_bytes)
            .context("internal_api.jwt_authentication.private_key is not set")
    };
    let key = match options.algorithm {
        HS256 | HS384 | HS512 => {
            let secret = options.private_key.as_deref().unwrap_or(&options.public_key);
            EncodingKey::from_secret(secret.as_bytes())
        }
        RS256 | RS384 | RS512 | PS256 | PS384 | PS512 => EncodingKey::from_rsa_pem(private_pem()?)?,
        ES256 | ES384 => EncodingKey::from_ec_pem(private_pem()?)?,
        EdDSA => EncodingKey::from_ed_pem(private_pem()?)?,
    };
    Ok(key)
}

#[cfg(test)]
mod tests {
    use quill_auth::HttpAuthenticator;

    use super::*;

    fn options() -> JwtAuthenticationOptions {
        JwtAuthenticationOptions {
            public_key: "dev-secret".into(),
            audience: "quill-internal".into(),
            issuer: "https://idp.example.org/realms/newsroom".into(),
            algorithm: Algorithm::HS256,
            ..Default::default()
        }
    }

    #[test]
    fn minted_tokens_authenticate() {
        let options = options();
        let sub = Uuid::new_v4();
        let token = mint_token(
            &options,
            sub,
            &["chief".to_string()],
            "quill-admin",
            ChronoDuration::minutes(5),
        )
        .unwrap();

        let authentication = HttpAuthenticator::new(&options)
            .unwrap()
            .authenticate(&token, None)
            .unwrap();
        assert_eq!(quill_auth::user_id(&authentication.principal).unwrap().to_string(), sub.to_string());
        assert!(quill_auth::has_role(&authentication.principal, &quill_auth::Role::CHIEF));
    }

    #[test]
    fn asymmetric_algorithms_need_a_private_key() {
        let options = JwtAuthenticationOptions {
            algorithm: Algorithm::RS256,
            ..options()
        };
        assert!(encoding_key(&options).is_err());
    }
}
