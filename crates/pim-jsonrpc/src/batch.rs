use std::collections::VecDeque;

use reqwest::Method;
use serde_json::Value;

use crate::envelope::json_kind;
use crate::{BatchStateError, ProtocolError, RequestEnvelope, ResponseEnvelope, RpcError, TransportError};

/// Outcome of one queued call: its result value or the error captured at that position.
pub type BatchSlot = Result<Option<Value>, RpcError>;

#[derive(Debug, Clone, PartialEq)]
/// A call queued while batching, with the verb override it was queued with.
pub struct PendingCall {
    pub envelope: RequestEnvelope,
    pub http_method: Option<Method>,
}

#[derive(Debug, Clone, Default)]
/// Ordered pending envelopes plus the "batching active" flag.
pub struct BatchState {
    active: bool,
    pending: Vec<PendingCall>,
}

impl BatchState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[PendingCall] {
        &self.pending
    }

    pub fn start(&mut self) -> Result<(), BatchStateError> {
        if self.active {
            return Err(BatchStateError::AlreadyActive);
        }
        self.pending.clear();
        self.active = true;
        Ok(())
    }

    pub(crate) fn enqueue(&mut self, call: PendingCall) {
        self.pending.push(call);
    }

    pub fn discard(&mut self) -> Result<Vec<RequestEnvelope>, BatchStateError> {
        if !self.active {
            return Err(BatchStateError::NotActive);
        }
        self.active = false;
        Ok(std::mem::take(&mut self.pending)
            .into_iter()
            .map(|call| call.envelope)
            .collect())
    }

    /// Leaves batch mode and hands back the queued calls for one physical exchange.
    ///
    /// An empty batch is rejected and stays active.
    pub(crate) fn take_for_execution(&mut self) -> Result<Vec<PendingCall>, BatchStateError> {
        if !self.active {
            return Err(BatchStateError::NotActive);
        }
        if self.pending.is_empty() {
            return Err(BatchStateError::Empty);
        }
        self.active = false;
        Ok(std::mem::take(&mut self.pending))
    }
}

/// Resolves a batch reply into one slot per queued call, in call order.
///
/// Entries are matched to calls by numeric `id`. Entries without a matching id
/// (parse errors carry `id: null`) fill the remaining call slots in order, and
/// any call left without an entry resolves to `MissingResponse`. Notification
/// slots always resolve to `Ok(None)`. Only a body that cannot be read as a
/// batch reply at all fails the whole batch.
pub fn decode_batch_response(
    body: &[u8],
    expected_ids: &[Option<u64>],
) -> Result<Vec<BatchSlot>, TransportError> {
    if body.is_empty() {
        return Ok(expected_ids
            .iter()
            .map(|id| match id {
                Some(id) => Err(ProtocolError::MissingResponse { id: *id }.into()),
                None => Ok(None),
            })
            .collect());
    }

    let decoded = serde_json::from_slice::<Value>(body).map_err(TransportError::Decode)?;
    let entries = match decoded {
        Value::Array(entries) => entries,
        Value::Object(_) => return broadcast_batch_error(decoded, expected_ids),
        other => {
            return Err(TransportError::InvalidEnvelope(format!(
                "expected a json array for a batch response, found {}",
                json_kind(&other)
            )))
        }
    };

    let mut slots: Vec<Option<BatchSlot>> = expected_ids
        .iter()
        .map(|id| if id.is_none() { Some(Ok(None)) } else { None })
        .collect();
    let mut unmatched: VecDeque<BatchSlot> = VecDeque::new();

    for entry in entries {
        let envelope = match ResponseEnvelope::from_value(entry) {
            Ok(envelope) => envelope,
            Err(error) => {
                unmatched.push_back(Err(error.into()));
                continue;
            }
        };
        let Some(id) = envelope.numeric_id() else {
            unmatched.push_back(envelope.into_result().map_err(RpcError::from));
            continue;
        };
        let position = expected_ids
            .iter()
            .zip(slots.iter())
            .position(|(expected, slot)| *expected == Some(id) && slot.is_none());
        match position {
            Some(position) => {
                slots[position] = Some(envelope.into_result().map_err(RpcError::from));
            }
            None => tracing::warn!(id, "dropping batch reply with duplicate or unknown id"),
        }
    }

    Ok(slots
        .into_iter()
        .zip(expected_ids.iter())
        .map(|(slot, id)| match slot {
            Some(slot) => slot,
            None => unmatched.pop_front().unwrap_or_else(|| {
                Err(ProtocolError::MissingResponse {
                    id: id.unwrap_or_default(),
                }
                .into())
            }),
        })
        .collect())
}

fn broadcast_batch_error(
    decoded: Value,
    expected_ids: &[Option<u64>],
) -> Result<Vec<BatchSlot>, TransportError> {
    let envelope = ResponseEnvelope::from_value(decoded)?;
    let error = match envelope.into_result() {
        Err(error) => error,
        Ok(_) => {
            return Err(TransportError::InvalidEnvelope(
                "expected a json array for a batch response, found a single result".to_string(),
            ))
        }
    };
    Ok(expected_ids
        .iter()
        .map(|id| match id {
            Some(_) => Err(error.clone().into()),
            None => Ok(None),
        })
        .collect())
}
