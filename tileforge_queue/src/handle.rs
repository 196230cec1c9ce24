//! The opaque message handle bundling a provider-side receipt with the
//! payload bytes and any metadata needed to ack it later.

use std::time::SystemTime;

/// A handle to one received message. Required to `done()` it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
	/// Provider-side receipt token (SQS receipt handle, file offset, etc).
	pub receipt: String,
	pub payload: Vec<u8>,
	pub sent_at: Option<SystemTime>,
}

impl MessageHandle {
	pub fn new(receipt: impl Into<String>, payload: Vec<u8>) -> MessageHandle {
		MessageHandle {
			receipt: receipt.into(),
			payload,
			sent_at: Some(SystemTime::now()),
		}
	}
}
