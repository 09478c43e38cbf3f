use clap::Parser;

/// Server configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "laser-chess-server", about = "Authoritative server for laser chess matches")]
pub struct Config {
    /// Port to listen on.
    #[arg(long, env = "LASER_PORT", default_value_t = 4321)]
    pub port: u16,
}

impl Config {
    pub fn bind_addr(&self) -> (&'static str, u16) {
        ("0.0.0.0", self.port)
    }
}
