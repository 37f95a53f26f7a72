use std::path::Path;

use thiserror::Error;

use crate::DocumentId;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("backend unavailable: network request failed")]
	Unavailable,
	#[error("document not found <collection='{collection}', id='{id}'>")]
	NotFound { collection: String, id: DocumentId },
	#[error("missing or insufficient permissions")]
	PermissionDenied,
	#[error("failed to (de)serialize backend data: {0}")]
	Serialization(#[from] serde_json::Error),
	#[error("backend file I/O error: {source}; path: '{}'", .path.display())]
	Io {
		path: Box<Path>,
		#[source]
		source: std::io::Error,
	},
}

impl StoreError {
	pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.as_ref().into(),
			source,
		}
	}
}

/// Identity provider failures. The messages are shown to the user as they are.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
	#[error("The email address is badly formatted. (auth/invalid-email)")]
	InvalidEmail,
	#[error("Password should be at least 6 characters. (auth/weak-password)")]
	WeakPassword,
	#[error("The email address is already in use by another account. (auth/email-already-in-use)")]
	EmailAlreadyInUse,
	#[error("Invalid email or password. (auth/invalid-credential)")]
	InvalidCredential,
	#[error("A network error has occurred. (auth/network-request-failed)")]
	Unavailable,
}
