//! Builders for the HTTP state: adapter selection, service wiring and
//! startup data.

use std::io;
use std::sync::Arc;

use mockable::{Clock, Env};
use tracing::{info, warn};
use url::Url;
use zeroize::Zeroizing;

use voiceit::domain::ports::{AssetHost, IssueRepository, UserRepository};
use voiceit::domain::{
    AccountService, EmailAddress, IssueService, RegistrationPolicy, ensure_admin,
    seed_sample_issues,
};
use voiceit::inbound::http::state::{AdapterNames, HttpState, HttpStatePorts};
use voiceit::outbound::assets::{
    CloudinaryAssetHost, CloudinaryCredentials, DEFAULT_CLOUDINARY_API, DEFAULT_CLOUDINARY_FOLDER,
    FilesystemAssetHost,
};
use voiceit::outbound::memory::{MemoryIssueRepository, MemoryUserRepository};
use voiceit::outbound::persistence::{
    DbPool, DieselIssueRepository, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use voiceit::outbound::security::{BcryptPasswordHasher, JwtTokenCodec};
use voiceit::settings::{AppSettings, AssetHostKind};

/// Environment variable holding the Cloudinary API secret.
const CLOUDINARY_SECRET_ENV: &str = "VOICEIT_CLOUDINARY_API_SECRET";

fn startup_error(context: &str, error: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("{context}: {error}"))
}

/// The configured photo host plus, for the filesystem host, the handle used
/// to serve stored files.
struct AssetWiring {
    host: Arc<dyn AssetHost>,
    uploads: Option<FilesystemAssetHost>,
}

fn build_asset_host(
    settings: &AppSettings,
    env: &impl Env,
    clock: Arc<dyn Clock>,
) -> io::Result<AssetWiring> {
    let kind = settings
        .asset_host()
        .map_err(|err| startup_error("invalid asset host", err))?;
    info!(asset_host = kind.as_str(), "configuring asset host");
    match kind {
        AssetHostKind::Filesystem => {
            let base = settings
                .public_base_url()
                .map_err(|err| startup_error("invalid upload settings", err))?;
            let host = FilesystemAssetHost::open(&settings.upload_dir(), base)
                .map_err(|err| startup_error("failed to open upload directory", err))?;
            Ok(AssetWiring {
                host: Arc::new(host.clone()),
                uploads: Some(host),
            })
        }
        AssetHostKind::Cloudinary => {
            let api_secret = env
                .string(CLOUDINARY_SECRET_ENV)
                .filter(|secret| !secret.is_empty())
                .map(Zeroizing::new)
                .ok_or_else(|| {
                    startup_error("missing required environment variable", CLOUDINARY_SECRET_ENV)
                })?;
            let credentials = CloudinaryCredentials {
                cloud_name: settings
                    .cloudinary_cloud_name()
                    .map_err(|err| startup_error("invalid cloudinary settings", err))?
                    .to_owned(),
                api_key: settings
                    .cloudinary_api_key()
                    .map_err(|err| startup_error("invalid cloudinary settings", err))?
                    .to_owned(),
                api_secret,
                folder: settings
                    .cloudinary_folder
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CLOUDINARY_FOLDER.to_owned()),
            };
            let api_base = settings
                .cloudinary_api_base
                .as_deref()
                .unwrap_or(DEFAULT_CLOUDINARY_API);
            let api_base = Url::parse(api_base)
                .map_err(|err| startup_error("invalid cloudinary api base", err))?;
            let host =
                CloudinaryAssetHost::new(&api_base, credentials, settings.upload_timeout(), clock)
                    .map_err(|err| startup_error("failed to build cloudinary client", err))?;
            Ok(AssetWiring {
                host: Arc::new(host),
                uploads: None,
            })
        }
    }
}

fn registration_policy(settings: &AppSettings) -> io::Result<RegistrationPolicy> {
    let Some(email) = settings.admin_email.as_deref() else {
        return Ok(RegistrationPolicy::default());
    };
    let email =
        EmailAddress::new(email).map_err(|err| startup_error("invalid admin email", err))?;
    if settings.admin_email_grants_role {
        warn!(%email, "registrations using the administrator email receive the admin role");
    }
    Ok(RegistrationPolicy::reserved_admin(
        email,
        settings.admin_email_grants_role,
    ))
}

/// Wire the account and issue services over one pair of stores, then run the
/// startup data steps against them.
async fn build_ports<I, U>(
    settings: &AppSettings,
    secret: &[u8],
    clock: Arc<dyn Clock>,
    issues: Arc<I>,
    users: Arc<U>,
    assets: Arc<dyn AssetHost>,
) -> io::Result<HttpStatePorts>
where
    I: IssueRepository + 'static,
    U: UserRepository + 'static,
{
    let token_ttl = settings
        .token_ttl()
        .map_err(|err| startup_error("invalid token settings", err))?;
    let accounts = AccountService::new(
        Arc::clone(&users),
        Arc::new(BcryptPasswordHasher::new(settings.bcrypt_cost())),
        Arc::new(JwtTokenCodec::new(secret)),
        Arc::clone(&clock),
    )
    .with_token_ttl(token_ttl)
    .with_registration_policy(registration_policy(settings)?);

    let admin = settings
        .admin_registration()
        .map_err(|err| startup_error("invalid admin settings", err))?;
    if let Some(admin) = admin {
        ensure_admin(&accounts, &admin)
            .await
            .map_err(|err| startup_error("admin bootstrap failed", err))?;
    }

    if settings.seed_sample_issues {
        let inserted = seed_sample_issues(issues.as_ref(), users.as_ref(), clock.as_ref())
            .await
            .map_err(|err| startup_error("sample issue seeding failed", err))?;
        info!(inserted, "sample issue seeding finished");
    }

    let status_policy = settings
        .status_policy()
        .map_err(|err| startup_error("invalid status policy", err))?;
    let issue_service = Arc::new(
        IssueService::new(issues, users, assets, clock)
            .with_status_policy(status_policy)
            .with_upload_timeout(settings.upload_timeout()),
    );

    Ok(HttpStatePorts {
        auth: Arc::new(accounts),
        issues: issue_service.clone(),
        issues_query: issue_service,
    })
}

/// Build the shared HTTP state from settings.
///
/// PostgreSQL is used when a database URL is configured (migrations run
/// first); otherwise issues and accounts live in memory for the lifetime of
/// the process.
pub(crate) async fn build_http_state(
    settings: &AppSettings,
    secret: &[u8],
    env: &impl Env,
    clock: Arc<dyn Clock>,
) -> io::Result<HttpState> {
    let assets = build_asset_host(settings, env, Arc::clone(&clock))?;
    let asset_host = assets.host.name();

    let (ports, store) = match settings.database_url.as_deref() {
        Some(database_url) => {
            run_pending_migrations(database_url)
                .await
                .map_err(|err| startup_error("database migration failed", err))?;
            let pool = DbPool::new(
                PoolConfig::new(database_url).with_max_size(settings.db_pool_max_size()),
            )
            .await
            .map_err(|err| startup_error("database pool setup failed", err))?;
            let ports = build_ports(
                settings,
                secret,
                Arc::clone(&clock),
                Arc::new(DieselIssueRepository::new(pool.clone())),
                Arc::new(DieselUserRepository::new(pool)),
                assets.host,
            )
            .await?;
            (ports, "postgres")
        }
        None => {
            warn!("no database configured; issues and accounts are kept in memory");
            let ports = build_ports(
                settings,
                secret,
                Arc::clone(&clock),
                Arc::new(MemoryIssueRepository::new()),
                Arc::new(MemoryUserRepository::new()),
                assets.host,
            )
            .await?;
            (ports, "memory")
        }
    };

    let state =
        HttpState::new(ports, clock).with_adapters(AdapterNames { store, asset_host });
    Ok(match assets.uploads {
        Some(uploads) => state.with_uploads(uploads),
        None => state,
    })
}
