//! "Messages sent" bookkeeping.
//!
//! Two counters live on every appointment. `counter` is the automated
//! pipeline's remaining budget: it starts at 5 and goes down. The pipeline's
//! booking confirmation is sent before the budget is touched, so a fresh
//! appointment has already had one message. `test_message_counter` counts
//! sends from this dashboard and only ever goes up.

use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result, model::Appointment, store::AppointmentStore};

/// Initial automated budget plus the booking confirmation.
pub const MESSAGE_COUNT_BASELINE: i64 = 6;

/// `6 - counter + test_message_counter`.
///
/// A negative total means one of the writers broke the invariant and is
/// reported, never clamped.
pub fn messages_sent(appointment: &Appointment) -> Result<u32> {
  let total =
    MESSAGE_COUNT_BASELINE - appointment.counter + appointment.test_message_counter;
  u32::try_from(total).map_err(|_| Error::NegativeMessageCount {
    uuid:                 appointment.uuid,
    counter:              appointment.counter,
    test_message_counter: appointment.test_message_counter,
  })
}

/// Count one confirmed dashboard send against the appointment.
///
/// Callers must only invoke this after the provider accepted the message.
pub async fn record_test_send<S>(store: &S, appointment_uuid: Uuid) -> Result<()>
where
  S: AppointmentStore,
{
  let updated = store
    .update_counter(appointment_uuid, 1)
    .await
    .map_err(Error::store)?;
  if !updated {
    return Err(Error::AppointmentNotFound(appointment_uuid));
  }
  debug!(%appointment_uuid, "test_message_counter incremented");
  Ok(())
}
