//! Caller identity as supplied by the transport.

use std::collections::HashSet;

use xxhash_rust::xxh3::xxh3_64;

use crate::error::DispatchError;

/// Authenticated identity of the process on the other end of a call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeerIdentity {
	/// Uid of the calling process.
	pub uid: i32,
	/// Package names sharing that uid.
	pub packages: Vec<String>,
	/// Signing certificates of the calling package.
	pub signatures: Vec<Vec<u8>>,
}

impl PeerIdentity {
	/// A peer running under `uid` with no package information.
	pub fn from_uid(uid: i32) -> Self {
		Self {
			uid,
			..Self::default()
		}
	}
}

/// Digest of a signing certificate, as listed in `trusted_signatures`.
pub fn signature_digest(certificate: &[u8]) -> u64 {
	xxh3_64(certificate)
}

/// Decides which callers may bind.
///
/// A caller sharing our uid is trusted. Any other caller must present at least
/// one certificate, and every certificate must be trusted.
#[derive(Debug, Clone, Default)]
pub struct TrustPolicy {
	own_uid: Option<i32>,
	trusted: HashSet<u64>,
}

impl TrustPolicy {
	/// Creates a policy trusting `own_uid` and the given digests.
	pub fn new(own_uid: Option<i32>, trusted: impl IntoIterator<Item = u64>) -> Self {
		Self {
			own_uid,
			trusted: trusted.into_iter().collect(),
		}
	}

	/// Checks `peer` against the policy.
	pub fn verify(&self, peer: &PeerIdentity) -> Result<(), DispatchError> {
		if self.own_uid == Some(peer.uid) {
			return Ok(());
		}
		if peer.signatures.is_empty() {
			return Err(DispatchError::Unauthorized(format!("uid {} presented no signature", peer.uid)));
		}
		if peer.signatures.iter().any(|cert| !self.trusted.contains(&signature_digest(cert))) {
			return Err(DispatchError::Unauthorized(format!("caller signature mismatch for uid {}", peer.uid)));
		}
		Ok(())
	}
}
