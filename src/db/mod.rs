pub mod db;
pub mod matchdb;
pub mod providerdb;
pub mod schema;
