pub mod jwt;
pub mod password;
pub mod data_uri;
