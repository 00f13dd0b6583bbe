use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use shortlink_core::settings::{DEFAULT_FILLER, DEFAULT_SHORT_LEN};
use shortlink_core::LinkSettings;
use sqlx::postgres::PgConnectOptions;
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, SocketAddr};

pub const STORAGE_ENV: &str = "STORAGE";
pub const SERVER_HOST_ENV: &str = "SERVER_HOST";
pub const SERVER_PORT_ENV: &str = "SERVER_PORT";
pub const URL_DOMAIN_ENV: &str = "URL_DOMAIN";
pub const SHORT_LEN_ENV: &str = "SHORT_LEN";
pub const FILLING_CHAR_ENV: &str = "FILLING_CHAR";
pub const CHECK_URLS_ENV: &str = "CHECK_URLS";
pub const POSTGRES_USER_ENV: &str = "POSTGRES_USER";
pub const POSTGRES_PASSWORD_ENV: &str = "POSTGRES_PASSWORD";
pub const POSTGRES_DB_ENV: &str = "POSTGRES_DB";
pub const DB_HOST_ENV: &str = "DB_HOST";
pub const DB_PORT_ENV: &str = "DB_PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 50051;
pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "shortener")]
pub struct CLI {
    #[arg(
        env = STORAGE_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = SERVER_HOST_ENV, default_value = DEFAULT_SERVER_HOST)]
    pub host: IpAddr,

    #[arg(long, env = SERVER_PORT_ENV, default_value_t = DEFAULT_SERVER_PORT)]
    pub server_port: u16,

    #[arg(long, env = URL_DOMAIN_ENV)]
    pub url_domain: String,

    #[arg(long, env = SHORT_LEN_ENV, default_value_t = DEFAULT_SHORT_LEN)]
    pub short_len: usize,

    #[arg(long, env = FILLING_CHAR_ENV, default_value_t = DEFAULT_FILLER)]
    pub filling_char: char,

    #[arg(
        long,
        env = CHECK_URLS_ENV,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value_t = false
    )]
    pub check_urls: bool,

    #[arg(long, env = POSTGRES_USER_ENV, required_if_eq("storage", "postgres"))]
    pub postgres_user: Option<String>,

    #[arg(
        long,
        env = POSTGRES_PASSWORD_ENV,
        hide_env_values = true,
        required_if_eq("storage", "postgres")
    )]
    pub postgres_password: Option<String>,

    #[arg(long, env = POSTGRES_DB_ENV, required_if_eq("storage", "postgres"))]
    pub postgres_db: Option<String>,

    #[arg(long, env = DB_HOST_ENV, default_value = DEFAULT_DB_HOST)]
    pub db_host: String,

    #[arg(long, env = DB_PORT_ENV, default_value_t = DEFAULT_DB_PORT)]
    pub db_port: u16,
}

impl CLI {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.server_port)
    }

    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings::builder()
            .domain(self.url_domain.as_str())
            .short_len(self.short_len)
            .filler(self.filling_char)
            .check_urls(self.check_urls)
            .build()
    }

    /// Connection options for the postgres backend, if all credentials are set.
    pub fn postgres_options(&self) -> Option<PgConnectOptions> {
        let user = self.postgres_user.as_deref()?;
        let password = self.postgres_password.as_deref()?;
        let database = self.postgres_db.as_deref()?;

        Some(
            PgConnectOptions::new()
                .host(&self.db_host)
                .port(self.db_port)
                .username(user)
                .password(password)
                .database(database),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    /// Parses `args` with every env fallback detached, so variables set in
    /// the test process (or loaded from `.env`) cannot change the result.
    fn parse(args: &[&str]) -> Result<CLI, clap::Error> {
        let matches = CLI::command()
            .mut_args(|arg| arg.env(None::<&'static str>))
            .try_get_matches_from(std::iter::once("shortener").chain(args.iter().copied()))?;
        CLI::from_arg_matches(&matches)
    }

    #[test]
    fn defaults_to_in_memory() {
        let cli = parse(&["--url-domain", "oz.on/"]).unwrap();

        assert_eq!(cli.storage, StorageBackendArg::InMemory);
        assert_eq!(cli.listen_addr().port(), DEFAULT_SERVER_PORT);

        let settings = cli.link_settings();
        assert_eq!(settings.domain, "oz.on/");
        assert_eq!(settings.short_len, DEFAULT_SHORT_LEN);
        assert_eq!(settings.filler, DEFAULT_FILLER);
        assert!(!settings.check_urls);
    }

    #[test]
    fn ignores_process_environment() {
        std::env::set_var(STORAGE_ENV, "postgres");
        std::env::set_var(SHORT_LEN_ENV, "3");

        let cli = parse(&["--url-domain", "oz.on/"]).unwrap();

        assert_eq!(cli.storage, StorageBackendArg::InMemory);
        assert_eq!(cli.short_len, DEFAULT_SHORT_LEN);
    }

    #[test]
    fn check_urls_accepts_numeric_flag() {
        let cli = parse(&["--url-domain", "oz.on/", "--check-urls", "1"]).unwrap();
        assert!(cli.link_settings().check_urls);

        let cli = parse(&["--url-domain", "oz.on/", "--check-urls", "0"]).unwrap();
        assert!(!cli.link_settings().check_urls);
    }

    #[test]
    fn postgres_requires_credentials() {
        assert!(parse(&["postgres", "--url-domain", "oz.on/"]).is_err());

        let cli = parse(&[
            "postgres",
            "--url-domain",
            "oz.on/",
            "--postgres-user",
            "shortlink",
            "--postgres-password",
            "secret",
            "--postgres-db",
            "links",
            "--db-port",
            "6543",
        ])
        .unwrap();

        assert_eq!(cli.storage, StorageBackendArg::Postgres);
        let options = cli.postgres_options().unwrap();
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_host(), DEFAULT_DB_HOST);
        assert_eq!(options.get_database(), Some("links"));
    }

    #[test]
    fn filler_and_width() {
        let cli = parse(&[
            "--url-domain",
            "sho.rt/",
            "--short-len",
            "5",
            "--filling-char",
            "-",
        ])
        .unwrap();

        let settings = cli.link_settings();
        assert_eq!(settings.short_len, 5);
        assert_eq!(settings.filler, '-');
    }
}
