//! Battle Server
//!
//! Minimal HTTP/1.1 front for the battle endpoint. One task per
//! connection; each connection carries one request and is closed after
//! the response. Only the request head is read: `POST /battles` has no body.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use crate::game::combat::BattleConfig;
use crate::game::events::EventLog;
use crate::network::auth::{bearer_token, AuthError, SessionLookup};
use crate::network::matchmaking::{
    BattleError, MatchmakingConfig, MatchmakingRendezvous, SeedStrategy,
};
use crate::network::protocol::{battle_payload, reason_phrase, ErrorCode, ServerError};
use crate::store::UserRepository;

/// Largest request head accepted.
const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Route served by this endpoint.
pub const BATTLES_PATH: &str = "/battles";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
    /// Battle tuning.
    pub battle: BattleConfig,
    /// Matchmaking tuning.
    pub matchmaking: MatchmakingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 10001)),
            max_connections: 1000,
            version: env!("CARGO_PKG_VERSION").to_string(),
            battle: BattleConfig::default(),
            matchmaking: MatchmakingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// Reads `BIND_ADDR`, `MAX_CONNECTIONS`, `BATTLE_MAX_ROUNDS`,
    /// `MATCH_WAIT_TIMEOUT_SECS` and `BATTLE_SEED`.
    pub fn from_env() -> Result<Self, GameServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GameServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = parse_var("BIND_ADDR", &addr)?;
        }
        if let Some(max) = lookup("MAX_CONNECTIONS") {
            config.max_connections = parse_var("MAX_CONNECTIONS", &max)?;
        }
        if let Some(rounds) = lookup("BATTLE_MAX_ROUNDS") {
            config.battle.max_rounds = parse_var("BATTLE_MAX_ROUNDS", &rounds)?;
        }
        if let Some(secs) = lookup("MATCH_WAIT_TIMEOUT_SECS") {
            let secs: u64 = parse_var("MATCH_WAIT_TIMEOUT_SECS", &secs)?;
            config.matchmaking.wait_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(seed) = lookup("BATTLE_SEED") {
            config.matchmaking.seed = SeedStrategy::Fixed(parse_var("BATTLE_SEED", &seed)?);
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, GameServerError> {
    value
        .trim()
        .parse()
        .map_err(|_| GameServerError::Config(format!("invalid {}: {:?}", key, value)))
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// =============================================================================
// HTTP
// =============================================================================

/// Request head parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// Request line is not `METHOD PATH VERSION`.
    #[error("malformed request line")]
    MalformedRequestLine,
    /// A header line has no colon.
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    /// Connection closed before the head ended.
    #[error("incomplete request")]
    Incomplete,
    /// Head exceeded the size limit.
    #[error("request head too large")]
    TooLarge,
}

/// Parsed HTTP request line and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// Request method, e.g. `POST`.
    pub method: String,
    /// Path without query string.
    pub path: String,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    /// Parse a request head (everything before the blank line).
    pub fn parse(raw: &str) -> Result<Self, RequestError> {
        let mut lines = raw.lines();

        let request_line = lines.next().ok_or(RequestError::MalformedRequestLine)?;
        let mut parts = request_line.split_whitespace();
        let (method, target, version) = match (parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(t), Some(v)) => (m, t, v),
            _ => return Err(RequestError::MalformedRequestLine),
        };
        if !version.starts_with("HTTP/") || parts.next().is_some() {
            return Err(RequestError::MalformedRequestLine);
        }

        let path = target.split('?').next().unwrap_or(target).to_string();

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| RequestError::MalformedHeader(line.to_string()))?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        Ok(Self {
            method: method.to_string(),
            path,
            headers,
        })
    }

    /// First header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Read a request head from `reader`.
pub async fn read_request_head<R>(reader: &mut R) -> Result<RequestHead, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = String::new();
    loop {
        let mut line = String::new();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(|_| RequestError::Incomplete)?;
        if n == 0 {
            return Err(RequestError::Incomplete);
        }
        if raw.len() + line.len() > MAX_HEAD_BYTES {
            return Err(RequestError::TooLarge);
        }
        if line == "\r\n" || line == "\n" {
            break;
        }
        raw.push_str(&line);
    }
    RequestHead::parse(&raw)
}

/// A response ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// JSON body.
    pub body: String,
}

impl HttpResponse {
    /// 200 with a JSON body.
    pub fn ok(body: String) -> Self {
        Self { status: 200, body }
    }

    /// Error response carrying a [`ServerError`] body.
    pub fn error(error: ServerError) -> Self {
        let status = error.code.http_status();
        let body = error
            .to_json()
            .unwrap_or_else(|_| format!("{{\"message\":{:?}}}", error.message));
        Self { status, body }
    }

    /// Serialize status line, headers and body.
    pub fn render(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            reason_phrase(self.status),
            self.body.len(),
            self.body
        )
    }
}

// =============================================================================
// ENDPOINT
// =============================================================================

/// Maps battle requests onto authentication and matchmaking.
pub struct BattleEndpoint {
    sessions: Arc<dyn SessionLookup>,
    matchmaking: Arc<MatchmakingRendezvous>,
}

impl BattleEndpoint {
    /// Create an endpoint.
    pub fn new(sessions: Arc<dyn SessionLookup>, matchmaking: Arc<MatchmakingRendezvous>) -> Self {
        Self { sessions, matchmaking }
    }

    /// The rendezvous behind this endpoint.
    pub fn matchmaking(&self) -> &Arc<MatchmakingRendezvous> {
        &self.matchmaking
    }

    /// Handle one request.
    pub async fn handle(&self, head: &RequestHead) -> HttpResponse {
        if head.path != BATTLES_PATH {
            return HttpResponse::error(ServerError::new(
                ErrorCode::NotFound,
                format!("no route for {}", head.path),
            ));
        }
        if head.method != "POST" {
            return HttpResponse::error(ServerError::new(
                ErrorCode::MethodNotAllowed,
                format!("{} not allowed on {}", head.method, BATTLES_PATH),
            ));
        }

        let token = match head.header("authorization").and_then(bearer_token) {
            Some(token) => token,
            None => return HttpResponse::error(ServerError::from(&AuthError::MissingToken)),
        };

        let combatant = match self.sessions.authenticate(token) {
            Ok(combatant) => combatant,
            Err(e) => {
                debug!("Rejected battle request: {}", e);
                return HttpResponse::error(ServerError::from(&e));
            }
        };

        let username = combatant.username.clone();
        info!("{} requested a battle", username);

        match self.matchmaking.join_or_start(combatant).await {
            Ok(result) => match battle_payload(&result) {
                Ok(body) => HttpResponse::ok(body),
                Err(e) => {
                    error!("Failed to serialize battle log: {}", e);
                    HttpResponse::error(ServerError::new(ErrorCode::InternalError, e.to_string()))
                }
            },
            Err(e) => {
                if matches!(e, BattleError::Internal(_)) {
                    error!("Battle for {} failed: {}", username, e);
                } else {
                    debug!("Battle request from {} ended: {}", username, e);
                }
                HttpResponse::error(ServerError::from(&e))
            }
        }
    }
}

// =============================================================================
// SERVER
// =============================================================================

/// The battle server.
pub struct GameServer {
    config: ServerConfig,
    endpoint: Arc<BattleEndpoint>,
    active_connections: Arc<AtomicUsize>,
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a server over the given collaborators.
    pub fn new(
        config: ServerConfig,
        sessions: Arc<dyn SessionLookup>,
        users: Arc<dyn UserRepository>,
        log: Arc<dyn EventLog>,
    ) -> Self {
        let matchmaking = Arc::new(MatchmakingRendezvous::with_store(
            config.battle.clone(),
            config.matchmaking.clone(),
            users,
            log,
        ));
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            endpoint: Arc::new(BattleEndpoint::new(sessions, matchmaking)),
            active_connections: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
        }
    }

    /// Bind the configured address and serve until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!(
            "Battle server v{} listening on {}",
            self.config.version,
            listener.local_addr()?
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => self.accept(stream, addr),
                        Err(e) => error!("Accept error: {}", e),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    fn accept(&self, stream: TcpStream, addr: SocketAddr) {
        let active = self.active_connections.fetch_add(1, Ordering::SeqCst);
        let guard = ConnectionGuard(self.active_connections.clone());

        if active >= self.config.max_connections {
            warn!("Connection limit reached, rejecting {}", addr);
            tokio::spawn(async move {
                let _guard = guard;
                let response = HttpResponse {
                    status: 503,
                    body: "{\"message\":\"server busy\"}".to_string(),
                };
                let mut stream = stream;
                let _ = stream.write_all(response.render().as_bytes()).await;
            });
            return;
        }

        debug!("New connection from {}", addr);
        let endpoint = self.endpoint.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let _guard = guard;
            tokio::select! {
                _ = handle_connection(stream, addr, endpoint) => {}
                _ = shutdown_rx.recv() => debug!("Dropping connection {} on shutdown", addr),
            }
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub fn connection_count(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// The battle endpoint.
    pub fn endpoint(&self) -> &Arc<BattleEndpoint> {
        &self.endpoint
    }
}

/// Decrements the connection count when a connection task ends.
struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, endpoint: Arc<BattleEndpoint>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let response = match read_request_head(&mut reader).await {
        Ok(head) => {
            // A client that hangs up while parked abandons its ticket
            tokio::select! {
                response = endpoint.handle(&head) => response,
                _ = wait_for_disconnect(&mut reader) => {
                    info!("Client {} disconnected while waiting", addr);
                    return;
                }
            }
        }
        Err(RequestError::Incomplete) => {
            debug!("Client {} closed before sending a request", addr);
            return;
        }
        Err(e) => HttpResponse::error(ServerError::new(ErrorCode::BadRequest, e.to_string())),
    };

    if let Err(e) = write_half.write_all(response.render().as_bytes()).await {
        debug!("Failed to write response to {}: {}", addr, e);
    }
    let _ = write_half.shutdown().await;
}

/// Resolves once the peer closes its side of the connection.
async fn wait_for_disconnect<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 256];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::{Card, Deck};
    use crate::game::events::MemoryEventLog;
    use crate::network::auth::{AuthConfig, JwtSessionLookup, TokenClaims};
    use crate::store::InMemoryUserStore;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use tokio::io::AsyncReadExt;

    const SECRET: &str = "server-test-secret-0123456789!!";

    fn token_for(sub: &str) -> String {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = TokenClaims {
            sub: sub.into(),
            exp: now + 3600,
            iat: now,
            iss: None,
            aud: None,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn test_server() -> (GameServer, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::new());
        for (name, cards) in [
            ("alice", vec![("Goblin", 10.0)]),
            ("bob", vec![("Dragon", 15.0)]),
            ("carol", vec![]),
        ] {
            store.insert_user(name);
            let deck = Deck::new(
                cards
                    .into_iter()
                    .map(|(n, d)| Card::from_name(format!("{}-{}", name, n), n, d))
                    .collect(),
            )
            .unwrap();
            store.set_deck(name, deck).unwrap();
        }

        let auth = AuthConfig {
            secret: Some(SECRET.into()),
            ..Default::default()
        };
        let sessions = Arc::new(JwtSessionLookup::new(auth, store.clone()));
        let config = ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Default::default()
        };
        let server = GameServer::new(config, sessions, store.clone(), Arc::new(MemoryEventLog::new()));
        (server, store)
    }

    fn head(method: &str, path: &str, token: Option<&str>) -> RequestHead {
        let mut headers = vec![("Host".to_string(), "localhost".to_string())];
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        RequestHead {
            method: method.into(),
            path: path.into(),
            headers,
        }
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.battle.max_rounds, 100);
        assert!(config.matchmaking.wait_timeout.is_none());
    }

    #[test]
    fn test_server_config_from_lookup() {
        let config = ServerConfig::from_lookup(|key| match key {
            "BIND_ADDR" => Some("127.0.0.1:9000".into()),
            "BATTLE_MAX_ROUNDS" => Some("50".into()),
            "MATCH_WAIT_TIMEOUT_SECS" => Some("30".into()),
            "BATTLE_SEED" => Some("1234".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.battle.max_rounds, 50);
        assert_eq!(config.matchmaking.wait_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.matchmaking.seed, SeedStrategy::Fixed(1234));

        let bad = ServerConfig::from_lookup(|key| (key == "MAX_CONNECTIONS").then(|| "lots".into()));
        assert!(matches!(bad, Err(GameServerError::Config(_))));
    }

    #[test]
    fn test_parse_request_head() {
        let raw = "POST /battles?x=1 HTTP/1.1\r\nHost: localhost\r\nAuthorization: Bearer abc\r\n";
        let head = RequestHead::parse(raw).unwrap();

        assert_eq!(head.method, "POST");
        assert_eq!(head.path, "/battles");
        assert_eq!(head.header("authorization"), Some("Bearer abc"));
        assert_eq!(head.header("missing"), None);
    }

    #[test]
    fn test_parse_malformed_request() {
        assert_eq!(
            RequestHead::parse("POST /battles\r\n"),
            Err(RequestError::MalformedRequestLine)
        );
        assert!(matches!(
            RequestHead::parse("POST /battles HTTP/1.1\r\nNoColonHere\r\n"),
            Err(RequestError::MalformedHeader(_))
        ));
    }

    #[tokio::test]
    async fn test_read_request_head_stops_at_blank_line() {
        let raw: &[u8] = b"POST /battles HTTP/1.1\r\nHost: x\r\n\r\nignored body";
        let mut reader = BufReader::new(raw);
        let head = read_request_head(&mut reader).await.unwrap();
        assert_eq!(head.headers.len(), 1);

        let truncated: &[u8] = b"POST /battles HTTP/1.1\r\nHost: x\r\n";
        let mut reader = BufReader::new(truncated);
        assert_eq!(read_request_head(&mut reader).await, Err(RequestError::Incomplete));
    }

    #[test]
    fn test_response_render() {
        let response = HttpResponse::ok("[\"a\"]".into());
        let rendered = response.render();
        assert!(rendered.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(rendered.contains("Content-Length: 5\r\n"));
        assert!(rendered.ends_with("\r\n\r\n[\"a\"]"));
    }

    #[tokio::test]
    async fn test_routing_errors() {
        let (server, _) = test_server();
        let endpoint = server.endpoint();

        let missing = endpoint.handle(&head("POST", "/cards", None)).await;
        assert_eq!(missing.status, 404);

        let wrong_method = endpoint.handle(&head("GET", "/battles", None)).await;
        assert_eq!(wrong_method.status, 405);

        let no_token = endpoint.handle(&head("POST", "/battles", None)).await;
        assert_eq!(no_token.status, 401);

        let bad_token = endpoint.handle(&head("POST", "/battles", Some("not.a.jwt"))).await;
        assert_eq!(bad_token.status, 401);

        let unknown = endpoint.handle(&head("POST", "/battles", Some(&token_for("zed")))).await;
        assert_eq!(unknown.status, 401);
    }

    #[tokio::test]
    async fn test_empty_deck_is_conflict() {
        let (server, _) = test_server();
        let response = server
            .endpoint()
            .handle(&head("POST", "/battles", Some(&token_for("carol"))))
            .await;

        assert_eq!(response.status, 409);
        let body = ServerError::from_json(&response.body).unwrap();
        assert_eq!(body.code, ErrorCode::EmptyDeck);
    }

    async fn send_battle_request(addr: SocketAddr, token: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "POST /battles HTTP/1.1\r\nHost: localhost\r\nAuthorization: Bearer {}\r\n\r\n",
            token
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_battle_over_tcp() {
        let (server, store) = test_server();
        let server = Arc::new(server);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let running = server.clone();
        let serve = tokio::spawn(async move { running.serve(listener).await });

        let token_alice = token_for("alice");
        let token_bob = token_for("bob");
        let (a, b) = tokio::join!(
            send_battle_request(addr, &token_alice),
            send_battle_request(addr, &token_bob),
        );

        assert!(a.starts_with("HTTP/1.1 200 OK"));
        assert!(b.starts_with("HTTP/1.1 200 OK"));

        let body_a = a.split("\r\n\r\n").nth(1).unwrap();
        let body_b = b.split("\r\n\r\n").nth(1).unwrap();
        assert_eq!(body_a, body_b);

        let log: Vec<String> = serde_json::from_str(body_a).unwrap();
        assert!(log.iter().any(|line| line.contains("Goblin")));
        assert_eq!(store.stats("bob").unwrap().wins, 1);
        assert_eq!(store.stats("alice").unwrap().losses, 1);
        assert_eq!(server.endpoint().matchmaking().battles_fought(), 1);

        server.shutdown();
        serve.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_disconnected_waiter_is_not_paired() {
        let (server, _) = test_server();
        let server = Arc::new(server);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let running = server.clone();
        let serve = tokio::spawn(async move { running.serve(listener).await });

        // Alice parks and then hangs up
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "POST /battles HTTP/1.1\r\nAuthorization: Bearer {}\r\n\r\n",
            token_for("alice")
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let matchmaking = server.endpoint().matchmaking().clone();
        for _ in 0..200 {
            if matchmaking.is_waiting("alice").await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(matchmaking.is_waiting("alice").await);
        drop(stream);
        for _ in 0..200 {
            if server.connection_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(server.connection_count(), 0);

        // Bob arrives after alice left and must wait instead of fighting her
        let bob = tokio::spawn(async move { send_battle_request(addr, &token_for("bob")).await });
        for _ in 0..200 {
            if matchmaking.is_waiting("bob").await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(matchmaking.is_waiting("bob").await);
        assert_eq!(matchmaking.battles_fought(), 0);

        bob.abort();
        server.shutdown();
        serve.await.unwrap().unwrap();
    }
}
