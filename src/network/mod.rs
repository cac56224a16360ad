//! Network Layer
//!
//! HTTP front, authentication and the battle rendezvous.
//! This layer is **non-deterministic** - all battle logic runs through `game/`.

pub mod auth;
pub mod matchmaking;
pub mod protocol;
pub mod server;

pub use auth::{bearer_token, validate_token, AuthConfig, AuthError, JwtSessionLookup, SessionLookup, TokenClaims};
pub use matchmaking::{BattleError, DrawFactory, MatchTicket, MatchmakingConfig, MatchmakingRendezvous, SeedStrategy};
pub use protocol::{ErrorCode, ServerError};
pub use server::{BattleEndpoint, GameServer, GameServerError, ServerConfig};
