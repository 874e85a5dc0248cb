//! Driver-name to generator dispatch.

use crate::generator::{
    MySqlGenerator, PostgresGenerator, SqlGenerator, SqlServerGenerator, SqliteGenerator,
};
use strata_core::{Error, Result};

/// Select the SQL generator for a driver identifier.
///
/// Matching is case-insensitive and accepts the common aliases each engine
/// goes by in connection strings. An unrecognized driver is a configuration
/// error; nothing downstream can run without a dialect.
pub fn generator_for_driver(driver: &str) -> Result<Box<dyn SqlGenerator>> {
    match driver.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" | "psql" | "pgsql" => Ok(Box::new(PostgresGenerator)),
        "mysql" | "mariadb" => Ok(Box::new(MySqlGenerator)),
        "sqlite" | "sqlite3" => Ok(Box::new(SqliteGenerator)),
        "sqlserver" | "mssql" | "odbc" => Ok(Box::new(SqlServerGenerator)),
        _ => Err(Error::UnknownDriver(driver.to_string())),
    }
}
