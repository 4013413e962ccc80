//! One network attempt: acquire a token, run the call on a blocking worker,
//! return the token, classify.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use super::error::DispatchError;
use super::tokens::TokenPool;
use crate::model::ItemId;
use crate::retry::{classify, Outcome};
use crate::transport::{RequestTemplate, Transport};

/// Classified result of one network call; discarded after the retry decision.
#[derive(Debug)]
pub struct Attempt {
    pub item_id: ItemId,
    /// 0-based.
    pub number: u32,
    pub outcome: Outcome<Vec<u8>>,
}

/// Runs attempt `number` for `item_id`. The token is held only while the
/// transport call runs and is released before the outcome is posted back.
pub(super) async fn run_attempt<T: Transport>(
    tokens: &TokenPool,
    transport: &Arc<T>,
    template: &RequestTemplate,
    handle: &Handle,
    item_id: &str,
    number: u32,
    body: Arc<[u8]>,
) -> Result<Attempt, DispatchError> {
    let token = tokens.acquire().await?;
    let request = template.build(item_id, number, body);
    let transport = Arc::clone(transport);
    let (tx, rx) = oneshot::channel();

    tracing::debug!(item_id, attempt = number, "attempt started");
    handle.spawn_blocking(move || {
        let raw = transport.send(&request);
        drop(token);
        let _ = tx.send(raw);
    });

    let raw = rx.await.map_err(|_| {
        DispatchError::FatalInfrastructure(format!(
            "attempt worker for item {item_id} terminated without a result"
        ))
    })?;
    Ok(Attempt {
        item_id: item_id.to_string(),
        number,
        outcome: classify(raw),
    })
}
