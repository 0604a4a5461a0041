pub mod config;
pub mod env;
pub mod level;
pub mod value;
pub mod mapper;
pub mod principal;
pub mod envelope;
pub mod factory;
pub mod client;
pub mod logger;
pub mod layer;
pub mod init;

pub use client::{Client, EchoClient, TransportError};
#[cfg(feature = "http")]
pub use client::HttpClient;
pub use config::{ConfigError, Configuration, Scheme};
pub use envelope::Envelope;
pub use factory::MessageFactory;
pub use level::Level;
pub use logger::{LogMessage, Logger};
pub use mapper::Mapper;
pub use principal::PrincipalProvider;
pub use value::{Context, ContextValue, ExceptionRecord};
