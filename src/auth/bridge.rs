use tokio::sync::{mpsc, watch};
use tracing::info;

use super::AuthUser;
use crate::store::{Action, User};

/// Forwards every identity provider state into the store as
/// [`Action::AuthStateChanged`], starting with the state current at
/// subscription time. Returns when either side goes away.
pub async fn mirror_auth_state<M>(
    mut state: watch::Receiver<Option<AuthUser>>,
    tx: mpsc::UnboundedSender<M>,
) where
    M: From<Action>,
{
    loop {
        let user = state.borrow_and_update().clone().map(User::from);
        match &user {
            Some(user) => info!(user_id = %user.id, "signed in"),
            None => info!("signed out"),
        }
        if tx.send(Action::AuthStateChanged(user).into()).is_err() {
            return;
        }
        if state.changed().await.is_err() {
            return;
        }
    }
}
