use std::{
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};

use alloy::{network::EthereumWallet, primitives::Address, signers::local::PrivateKeySigner};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{KeyError, StakingError},
    key,
};

pub const WALLETCONNECT_UNAVAILABLE: &str =
    "WalletConnect not implemented. Please use 'Connect with Private Key' instead.";
pub const EXTERNAL_WALLET_UNAVAILABLE: &str =
    "MetaMask not available. Please install MetaMask from the app store.";

/// Deep link opening the wallet app.
pub const WALLET_APP_LINK: &str = "metamask://dapp/";
/// Store page of the wallet app, the fallback when the app is missing.
pub const WALLET_STORE_LINK: &str = "market://details?id=io.metamask";

/// Account identity able to authorize transactions.
#[derive(Clone, derive_more::Debug)]
pub struct SignerIdentity {
    address: Address,
    #[debug(skip)]
    signer: PrivateKeySigner,
}

impl SignerIdentity {
    /// Derives the identity from a validated private key.
    ///
    /// Fails with [`KeyError::InvalidScalar`] if the key is well-formed hex
    /// but not a valid secp256k1 secret.
    pub fn from_private_key(key: &str) -> Result<Self, KeyError> {
        let signer =
            PrivateKeySigner::from_str(key).map_err(|err| KeyError::InvalidScalar(err.to_string()))?;
        Ok(Self { address: signer.address(), signer })
    }

    pub fn address(&self) -> Address { self.address }

    pub fn signer(&self) -> &PrivateKeySigner { &self.signer }

    /// Wallet to attach to a provider for transaction signing.
    pub fn wallet(&self) -> EthereumWallet { EthereumWallet::from(self.signer.clone()) }
}

#[derive(Clone, Debug, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(Arc<SignerIdentity>),
    Error(String),
}

impl ConnectionState {
    pub fn identity(&self) -> Option<&Arc<SignerIdentity>> {
        match self {
            ConnectionState::Connected(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool { matches!(self, ConnectionState::Connected(_)) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchOutcome {
    Launched,
    Unavailable,
}

/// Which external target was opened by
/// [`ConnectionManager::connect_with_external_app`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalLaunch {
    WalletApp,
    Store,
}

/// Platform capability of opening an external app by link.
pub trait ExternalWalletLauncher: Send + Sync {
    fn launch(&self, link: &str) -> LaunchOutcome;
}

/// Launcher of a platform without external apps.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoExternalApps;

impl ExternalWalletLauncher for NoExternalApps {
    fn launch(&self, _link: &str) -> LaunchOutcome { LaunchOutcome::Unavailable }
}

/// Owner of the wallet connection state machine.
///
/// ```text
/// Disconnected ──▶ Connecting ──▶ Connected | Error
///       ▲                              │
///       └──────── disconnect() ────────┘
/// ```
///
/// Only one attempt may be in flight, another attempt started while
/// `Connecting` is rejected with [`StakingError::AlreadyConnecting`].
///
/// Every successful connection opens a session with its own cancellation
/// token, cancelled on [`Self::disconnect`].
pub struct ConnectionManager {
    state: watch::Sender<ConnectionState>,
    session: Mutex<Option<CancellationToken>>,
    launcher: Box<dyn ExternalWalletLauncher>,
}

impl Default for ConnectionManager {
    fn default() -> Self { Self::new() }
}

impl ConnectionManager {
    pub fn new() -> Self { Self::with_launcher(NoExternalApps) }

    pub fn with_launcher(launcher: impl ExternalWalletLauncher + 'static) -> Self {
        Self {
            state: watch::Sender::new(ConnectionState::Disconnected),
            session: Mutex::new(None),
            launcher: Box::new(launcher),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState { self.state.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> { self.state.subscribe() }

    pub fn identity(&self) -> Option<Arc<SignerIdentity>> { self.state.borrow().identity().cloned() }

    /// Token of the current session, cancelled on disconnect.
    pub fn session_token(&self) -> Option<CancellationToken> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner).as_ref().map(|t| t.child_token())
    }

    /// Connects with a raw private key. No network I/O is involved.
    pub fn connect_with_private_key(&self, raw: &str) -> Result<Arc<SignerIdentity>, StakingError> {
        self.begin()?;

        let identity = match key::validate(raw).and_then(|key| SignerIdentity::from_private_key(&key))
        {
            Ok(identity) => Arc::new(identity),
            Err(err) => {
                tracing::info!(key = %key::mask(raw.trim()), "private key rejected: {err}");
                self.fail(err.to_string());
                return Err(err.into());
            },
        };

        *self.session.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(CancellationToken::new());
        self.state.send_replace(ConnectionState::Connected(identity.clone()));
        tracing::info!(address = %identity.address(), "wallet connected");
        Ok(identity)
    }

    /// WalletConnect sessions are not supported.
    pub fn connect_wallet(&self) -> Result<Arc<SignerIdentity>, StakingError> {
        self.begin()?;
        self.fail(WALLETCONNECT_UNAVAILABLE.to_string());
        Err(StakingError::Unsupported(WALLETCONNECT_UNAVAILABLE.to_string()))
    }

    /// Opens the external wallet app, or its store page if the app is missing.
    ///
    /// A successful launch hands the session over to the external app and
    /// returns the state to `Disconnected`.
    pub fn connect_with_external_app(&self) -> Result<ExternalLaunch, StakingError> {
        self.begin()?;

        let launched = if self.launcher.launch(WALLET_APP_LINK) == LaunchOutcome::Launched {
            Some(ExternalLaunch::WalletApp)
        } else if self.launcher.launch(WALLET_STORE_LINK) == LaunchOutcome::Launched {
            Some(ExternalLaunch::Store)
        } else {
            None
        };

        match launched {
            Some(launch) => {
                tracing::info!(?launch, "external wallet launched");
                self.state.send_replace(ConnectionState::Disconnected);
                Ok(launch)
            },
            None => {
                self.fail(EXTERNAL_WALLET_UNAVAILABLE.to_string());
                Err(StakingError::Unsupported(EXTERNAL_WALLET_UNAVAILABLE.to_string()))
            },
        }
    }

    /// Drops the identity and cancels session work. Idempotent.
    pub fn disconnect(&self) {
        self.end_session();
        let previous = self.state.send_replace(ConnectionState::Disconnected);
        if previous.is_connected() {
            tracing::info!("wallet disconnected");
        }
    }

    /// Moves to `Connecting` unless an attempt is already in flight.
    fn begin(&self) -> Result<(), StakingError> {
        let mut busy = false;
        self.state.send_if_modified(|state| {
            if matches!(state, ConnectionState::Connecting) {
                busy = true;
                return false;
            }
            *state = ConnectionState::Connecting;
            true
        });
        if busy {
            return Err(StakingError::AlreadyConnecting);
        }
        self.end_session();
        Ok(())
    }

    fn fail(&self, message: String) { self.state.send_replace(ConnectionState::Error(message)); }

    fn end_session(&self) {
        if let Some(token) = self.session.lock().unwrap_or_else(PoisonError::into_inner).take() {
            token.cancel();
        }
    }
}
