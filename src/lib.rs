#[macro_use]
extern crate rocket;

pub mod auth;
pub mod client;
pub mod db;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod store;

use std::sync::{Arc, Once};

use crate::auth::{AuthConfig, AuthState};
use crate::db::AccountsDb;
use crate::request_logger::RequestLogger;
use crate::store::{CredentialStore, MemoryCredentialStore, PgCredentialStore, StoreBackend};
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket, Route};
use rocket_cors::{AllowedOrigins, Cors, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};

/// Mount point of the auth API.
pub const AUTH_BASE: &str = "/api/auth";

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

/// Register, login and profile routes plus the generated `openapi.json`.
pub fn auth_routes() -> Vec<Route> {
    openapi_get_routes![
        auth::routes::register,
        auth::routes::login,
        auth::routes::profile,
    ]
}

fn cors() -> Cors {
    CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .to_cors()
        .expect("Error creating CORS")
}

/// Mount every route and catcher on `rocket`. Shared by the server and tests.
pub fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/", routes![routes::health::index])
        .mount("/api", routes![routes::health::health_check])
        .mount(AUTH_BASE, auth_routes())
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../auth/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .register("/", error::catchers())
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    let backend = StoreBackend::from_env();
    log::info!("starting account API with {:?} store", backend);

    let mut rocket = rocket::build().attach(RequestLogger).attach(cors());
    if backend == StoreBackend::Postgres {
        rocket = rocket.attach(AccountsDb::init());
    }

    let rocket = rocket.attach(AdHoc::try_on_ignite("Auth State", move |rocket| async move {
        let config = match AuthConfig::from_env() {
            Ok(config) => config,
            Err(err) => {
                log::error!("failed to load auth configuration: {}", err);
                return Err(rocket);
            }
        };

        let store: Arc<dyn CredentialStore> = match backend {
            StoreBackend::Memory => {
                log::warn!("using in-memory account store; accounts are lost on restart");
                Arc::new(MemoryCredentialStore::new())
            }
            StoreBackend::Postgres => {
                let Some(db) = AccountsDb::fetch(&rocket) else {
                    log::error!("database pool not available for account store");
                    return Err(rocket);
                };
                let pool = (**db).clone();
                if let Err(err) = db::run_migrations(&pool).await {
                    log::error!("database migrations failed: {}", err);
                    return Err(rocket);
                }
                Arc::new(PgCredentialStore::new(pool))
            }
        };

        match AuthState::from_config(config, store) {
            Ok(state) => Ok(rocket.manage(state)),
            Err(err) => {
                log::error!("failed to initialize auth state: {}", err);
                Err(rocket)
            }
        }
    }));

    mount(rocket)
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::sync::Arc;

    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::{Build, Rocket};

    use crate::auth::config::DEFAULT_TOKEN_TTL_SECS;
    use crate::auth::{AuthConfig, AuthState};
    use crate::store::{CredentialStore, MemoryCredentialStore};

    pub use database::{TestDatabase, TestDatabaseError};

    pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

    pub fn test_auth_config() -> AuthConfig {
        AuthConfig {
            issuer: "account-api-test".into(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            jwt_secret: TEST_JWT_SECRET.into(),
        }
    }

    /// Auth state over the given store, using [`test_auth_config`].
    pub fn test_auth_state(store: Arc<dyn CredentialStore>) -> AuthState {
        AuthState::from_config(test_auth_config(), store).expect("auth state")
    }

    pub mod database {
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers::{GenericImage, ImageExt, core::WaitFor};
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;
        use uuid::Uuid;

        use crate::db::MIGRATOR;

        /// Set to any value to launch a disposable Postgres container when
        /// `TEST_DATABASE_URL` is absent.
        const CONTAINER_ENV: &str = "TEST_DATABASE_CONTAINER";

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("TEST_DATABASE_URL not set")]
            MissingUrl,
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// A throwaway, fully migrated database.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<GenericImage>>,
        }

        impl TestDatabase {
            /// Create a database on the server named by `TEST_DATABASE_URL`, or in a
            /// fresh container when `TEST_DATABASE_CONTAINER` is set.
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
                    let base_options: PgConnectOptions = url.parse()?;
                    return Self::provision(base_options, None).await;
                }
                if std::env::var_os(CONTAINER_ENV).is_some() {
                    return Self::in_container().await;
                }
                Err(TestDatabaseError::MissingUrl)
            }

            pub async fn in_container() -> Result<Self, TestDatabaseError> {
                let container = GenericImage::new("postgres", "16-alpine")
                    .with_wait_for(WaitFor::message_on_stderr(
                        "database system is ready to accept connections",
                    ))
                    .with_env_var("POSTGRES_DB", "postgres")
                    .with_env_var("POSTGRES_USER", "postgres")
                    .with_env_var("POSTGRES_PASSWORD", "postgres")
                    .start()
                    .await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let base_options: PgConnectOptions =
                    format!("postgres://postgres:postgres@{host}:{port}/postgres").parse()?;

                Self::provision(base_options, Some(container)).await
            }

            async fn provision(
                base_options: PgConnectOptions,
                container: Option<ContainerAsync<GenericImage>>,
            ) -> Result<Self, TestDatabaseError> {
                let base_options = base_options.log_statements(LevelFilter::Off);

                let admin_options = base_options.clone().database("postgres");
                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await?;

                let database_name = format!("accounts_test_{}", Uuid::new_v4().simple());
                sqlx::query(&format!("CREATE DATABASE \"{}\" TEMPLATE template0", database_name))
                    .execute(&admin_pool)
                    .await?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.database(&database_name))
                    .await?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name,
                    container,
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close the pool, drop the database, then stop the container if one was started.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(self.admin_options.clone())
                    .await?;
                sqlx::query(&format!(
                    "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
                    self.database_name
                ))
                .execute(&admin_pool)
                .await?;
                admin_pool.close().await;

                drop(self.container.take());
                Ok(())
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    pub struct TestRocketBuilder {
        figment: Figment,
        store: Arc<dyn CredentialStore>,
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestRocketBuilder {
        /// Random port, logging off, fresh in-memory store.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                store: Arc::new(MemoryCredentialStore::new()),
            }
        }

        pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
            self.store = store;
            self
        }

        /// Every route and catcher the server mounts, over the configured store.
        pub fn build(self) -> Rocket<Build> {
            let state = test_auth_state(self.store);
            crate::mount(rocket::custom(self.figment)).manage(state)
        }

        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
