//! Single-flight credential refresh
//!
//! Any number of callers that hit an expired credential while a refresh is
//! outstanding share that one refresh. Under rotating refresh tokens a second
//! concurrent refresh would present a token the first one already consumed
//! and end a session that was still recoverable.
//!
//! ```text
//!            refresh()                       refresh()
//!   Idle ─────────────────► Refreshing ◄──────────────── (joins queue)
//!    ▲                        │      │
//!    │ success: write pair    │      │ rejected / transport error / timeout
//!    └────────────────────────┘      ▼
//!    ▲                             Failed ── refresh() ──► Refreshing
//!    │ reset() / teardown()
//!    └── (any state; pending waiters released with Cancelled)
//! ```

use super::guard::SessionGuard;
use super::store::CredentialStore;
use crate::error::AuthError;
use crate::timer;
use crate::types::{TokenPair, TokenResponse};
use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::{self, Either, LocalBoxFuture, Shared, select};
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a waiter receives: the new access token, or why there is none
pub type RefreshOutcome = Result<String, AuthError>;

type Exchange = Shared<LocalBoxFuture<'static, Result<TokenPair, AuthError>>>;

/// Performs the network exchange of a refresh token for a new pair
///
/// Implementations report a refused token as `AuthError::RefreshRejected`
/// and anything else as `AuthError::RefreshTransportFailure`.
#[async_trait(?Send)]
pub trait RefreshTransport {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;
}

/// Observable refresh state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
    Failed,
}

enum Phase {
    Idle,
    /// The exchange belongs to the wave, not to any one caller. Every waiter
    /// polls the same shared future, so it keeps running while any waiter
    /// is left, and a later caller picks it up if none is.
    Refreshing {
        generation: u64,
        exchange: Exchange,
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
    Failed,
}

struct Inner {
    phase: Phase,
    generation: u64,
    /// Last generation whose outcome was applied
    settled: u64,
}

impl Inner {
    /// Queue `waiter` on the outstanding refresh, opening one with `start`
    /// if there is none. Returns the wave's generation and exchange.
    fn enlist(
        &mut self,
        waiter: oneshot::Sender<RefreshOutcome>,
        start: impl FnOnce() -> Exchange,
    ) -> (u64, Exchange) {
        if let Phase::Refreshing {
            generation,
            exchange,
            waiters,
        } = &mut self.phase
        {
            waiters.push(waiter);
            debug!(waiters = waiters.len(), "Joining in-flight credential refresh");
            return (*generation, exchange.clone());
        }

        self.generation += 1;
        let exchange = start();
        self.phase = Phase::Refreshing {
            generation: self.generation,
            exchange: exchange.clone(),
            waiters: vec![waiter],
        };
        (self.generation, exchange)
    }

    /// Take the waiters of `generation` and move to `next`. Returns `None`
    /// if that refresh was already settled or superseded.
    fn conclude(
        &mut self,
        generation: u64,
        next: Phase,
    ) -> Option<Vec<oneshot::Sender<RefreshOutcome>>> {
        match &self.phase {
            Phase::Refreshing { generation: current, .. } if *current == generation => {}
            _ => return None,
        }

        self.settled = generation;
        match mem::replace(&mut self.phase, next) {
            Phase::Refreshing { waiters, .. } => Some(waiters),
            Phase::Idle | Phase::Failed => None,
        }
    }

    /// Drop whatever is pending and start over from `Idle`
    fn abandon_all(&mut self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        self.generation += 1;
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Refreshing { waiters, .. } => waiters,
            Phase::Idle | Phase::Failed => Vec::new(),
        }
    }
}

fn release(waiters: Vec<oneshot::Sender<RefreshOutcome>>, outcome: &RefreshOutcome) {
    for waiter in waiters {
        // A waiter whose request was dropped has nobody left to tell.
        let _ = waiter.send(outcome.clone());
    }
}

/// Collapses concurrent refresh triggers into one network call
pub struct RefreshCoordinator {
    store: Rc<dyn CredentialStore>,
    transport: Rc<dyn RefreshTransport>,
    guard: Rc<SessionGuard>,
    timeout: Duration,
    inner: RefCell<Inner>,
    refresh_calls: Cell<u64>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Rc<dyn CredentialStore>,
        transport: Rc<dyn RefreshTransport>,
        guard: Rc<SessionGuard>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            transport,
            guard,
            timeout,
            inner: RefCell::new(Inner {
                phase: Phase::Idle,
                generation: 0,
                settled: 0,
            }),
            refresh_calls: Cell::new(0),
        }
    }

    pub fn state(&self) -> RefreshState {
        match self.inner.borrow().phase {
            Phase::Idle => RefreshState::Idle,
            Phase::Refreshing { .. } => RefreshState::Refreshing,
            Phase::Failed => RefreshState::Failed,
        }
    }

    /// Number of network refresh calls started by this coordinator
    pub fn refresh_calls(&self) -> u64 {
        self.refresh_calls.get()
    }

    /// Wait for a refreshed access token
    ///
    /// Everyone arriving while a refresh is outstanding receives its outcome.
    /// Dropping a caller does not affect the others.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (tx, mut rx) = oneshot::channel();
        let (generation, exchange) = self
            .inner
            .borrow_mut()
            .enlist(tx, || self.start_exchange());

        match select(exchange, &mut rx).await {
            Either::Left((result, _)) => {
                self.settle(generation, result);
                rx.await.unwrap_or(Err(AuthError::Cancelled))
            }
            // Settled by another waiter, or released by reset or teardown
            Either::Right((released, _)) => released.unwrap_or(Err(AuthError::Cancelled)),
        }
    }

    /// Release pending waiters with `Cancelled` and return to `Idle`
    ///
    /// Called when a new credential pair is established. The outcome of an
    /// abandoned network call is never applied.
    pub fn reset(&self) {
        let waiters = self.inner.borrow_mut().abandon_all();
        if !waiters.is_empty() {
            debug!(waiters = waiters.len(), "Refresh superseded by new credentials");
        }
        release(waiters, &Err(AuthError::Cancelled));
    }

    /// Tear the session down, releasing every pending waiter with `Cancelled`
    pub fn teardown(&self) {
        let waiters = self.inner.borrow_mut().abandon_all();
        info!(waiters = waiters.len(), "Session torn down");
        release(waiters, &Err(AuthError::Cancelled));
    }

    /// Build the network exchange for a new wave from the refresh token
    /// stored right now
    fn start_exchange(&self) -> Exchange {
        let current = match self.store.read() {
            Some(pair) if !pair.refresh_token.is_empty() => pair,
            _ => {
                return future::ready(Err(AuthError::RefreshRejected(
                    "no refresh token stored".to_string(),
                )))
                .boxed_local()
                .shared();
            }
        };

        self.refresh_calls.set(self.refresh_calls.get() + 1);
        debug!(timeout = ?self.timeout, "Refreshing credentials");

        let transport = self.transport.clone();
        let timeout = self.timeout;
        async move {
            match timer::with_timeout(timeout, transport.refresh(&current.refresh_token)).await {
                Ok(Ok(response)) => Ok(response.into_pair(&current.refresh_token)),
                Ok(Err(err)) => Err(err),
                Err(timer::Elapsed) => Err(AuthError::RefreshTransportFailure(format!(
                    "refresh timed out after {}s",
                    timeout.as_secs_f64()
                ))),
            }
        }
        .boxed_local()
        .shared()
    }

    fn settle(&self, generation: u64, result: Result<TokenPair, AuthError>) {
        let next = if result.is_ok() {
            Phase::Idle
        } else {
            Phase::Failed
        };

        let concluded = self.inner.borrow_mut().conclude(generation, next);
        let Some(waiters) = concluded else {
            if self.inner.borrow().settled != generation {
                warn!(generation, "Discarding outcome of superseded refresh");
            }
            return;
        };

        match result {
            Ok(pair) => {
                info!(waiters = waiters.len(), "Credential refresh succeeded");
                let access_token = pair.access_token.clone();
                self.store.write(pair);
                release(waiters, &Ok(access_token));
            }
            Err(err) => {
                warn!(waiters = waiters.len(), error = %err, "Credential refresh failed");
                self.guard.on_unrecoverable();
                release(waiters, &Err(err));
            }
        }
    }
}
