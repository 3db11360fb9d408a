//! Callbacks Module
//!
//! Correlates fire-and-forget outbound calls with the results the platform
//! later delivers to the webhook, keyed by sync id.

mod correlator;
pub(crate) mod pending;

use std::fmt;

use uuid::Uuid;

pub use correlator::Correlator;

// == Callback Result ==
/// A result that can travel through a [`Correlator`].
pub trait CallbackResult: fmt::Debug + Send + 'static {
    /// The sync id this result answers.
    fn sync_id(&self) -> Uuid;

    /// Reason of an application-level failure, None on success.
    fn failure_reason(&self) -> Option<String>;
}
