use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use reqwest::Client;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bizdir_backend::{
    config::Config,
    db::{postgres_user_repository::PostgresUserRepository, user_repository::UserRepository},
    models::user::OauthProvider,
    responses::JsonResponse,
    routes,
    services::{
        email_templates::MailContext,
        oauth::{client::HttpOAuthClient, OAuthProviders},
        pluggable_mailer::PluggableMailer,
        retrying_mailer::RetryingMailer,
        smtp_mailer::Mailer,
    },
    state::AppState,
    utils::jwt::JwtKeys,
};

#[cfg(feature = "tls")]
use axum_server::tls_rustls::RustlsConfig;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Establish a connection to the database and bring the schema up to date.
async fn establish_connection(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPool::connect(database_url)
        .await
        .context("failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    info!("connected to the database");
    Ok(pool)
}

fn oauth_providers(config: &Config, http: &Client) -> OAuthProviders {
    [OauthProvider::Google, OauthProvider::Facebook]
        .into_iter()
        .filter_map(|provider| {
            config
                .oauth
                .provider(provider)
                .map(|settings| HttpOAuthClient::new(provider, settings.clone(), http.clone()))
        })
        .fold(OAuthProviders::default(), |providers, client| {
            providers.with(Arc::new(client))
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("invalid configuration")?;
    let jwt_keys = JwtKeys::from_env().context("invalid JWT secret")?;

    // Stricter limiter for /api/auth/*
    let auth_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit.auth_per_second)
            .burst_size(config.rate_limit.auth_burst)
            .use_headers()
            .error_handler(|_err| {
                JsonResponse::too_many_requests(
                    "Too many requests. Please wait a moment and try again.",
                )
            })
            .finish()
            .context("invalid rate limiter settings")?,
    );

    // Background task to cleanup old IPs
    let governor_limiter = auth_governor_conf.limiter().clone();
    std::thread::spawn(move || {
        let interval = std::time::Duration::from_secs(60);
        loop {
            std::thread::sleep(interval);
            governor_limiter.retain_recent();
        }
    });

    let pg_pool = establish_connection(&config.database_url).await?;
    let user_repo = Arc::new(PostgresUserRepository { pool: pg_pool }) as Arc<dyn UserRepository>;

    let http_client = Client::new();
    let mail_context = MailContext::new(&config.app_url, config.password_reset_ttl);
    let transport = PluggableMailer::from_env(&http_client, mail_context)
        .context("failed to initialize mailer")?;
    info!(provider = transport.provider_name(), "mailer ready");
    let mailer = Arc::new(RetryingMailer::new(Arc::new(transport), config.email_retry))
        as Arc<dyn Mailer>;

    let oauth = oauth_providers(&config, &http_client);
    if oauth.is_empty() {
        info!("no social sign-in providers configured");
    }

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_origin
                .parse::<HeaderValue>()
                .context("FRONTEND_ORIGIN is not a valid origin")?,
        )
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    let addr = config.bind_addr;
    let state = AppState {
        db: user_repo,
        mailer,
        oauth: Arc::new(oauth),
        config: Arc::new(config),
        jwt_keys: Arc::new(jwt_keys),
    };

    let auth_routes = routes::auth_routes().layer(GovernorLayer {
        config: auth_governor_conf,
    });
    let app = routes::build(auth_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();

    #[cfg(feature = "tls")]
    {
        let tls_config = RustlsConfig::from_pem_file(
            std::env::var("DEV_CERT_LOCATION").context("DEV_CERT_LOCATION must be set")?,
            std::env::var("DEV_KEY_LOCATION").context("DEV_KEY_LOCATION must be set")?,
        )
        .await
        .context("failed to load TLS certs")?;

        info!(%addr, "listening with TLS");
        axum_server::bind_rustls(addr, tls_config)
            .serve(make_service)
            .await?;
        return Ok(());
    }

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, make_service).await?;
    Ok(())
}
