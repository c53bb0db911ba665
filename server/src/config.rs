use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STATIC_DIR: &str = "./client/dist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig
{
    pub port: u16,
    /// Built widget (index.html + wasm bundle), served for every path but `/chat`.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig
{
    fn default() -> Self
    {
        Self
        {
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl ServerConfig
{
    /// Reads `PORT` and `STATIC_DIR`. `dotenvy::var` falls back to `.env`.
    pub fn from_env() -> Self
    {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self
    {
        let mut config = Self::default();

        if let Some(port_str) = lookup("PORT")
        {
            match port_str.parse::<u16>()
            {
                Ok(port) => config.port = port,
                Err(e) =>
                {
                    tracing::warn!(
                        "Failed to parse PORT value '{}': {}. Defaulting to {}.",
                        port_str,
                        e,
                        DEFAULT_PORT
                    );
                }
            }
        }

        if let Some(dir) = lookup("STATIC_DIR").filter(|dir| !dir.is_empty())
        {
            config.static_dir = PathBuf::from(dir);
        }

        config
    }
}
