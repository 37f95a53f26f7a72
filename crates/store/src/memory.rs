use crate::{
	AuthError, Credentials, Document, DocumentId, DocumentSnapshot, DocumentStore, Filter,
	IdentityProvider, QueryDocument, QuerySnapshot, StoreError, Subscription, UserId,
};

use std::{
	collections::HashMap,
	path::Path,
	sync::{Arc, Weak},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::mpsc};
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

type ListenerId = u64;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
	/// Insertion order, so query snapshots come out stable.
	seq: u64,
	data: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
	uid: UserId,
	password_hash: String,
}

/// Everything that survives a [`MemoryBackend::save`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct State {
	#[serde(default)]
	collections: HashMap<String, HashMap<DocumentId, StoredDocument>>,
	/// Accounts keyed by normalized email.
	#[serde(default)]
	accounts: HashMap<String, Account>,
	#[serde(default)]
	current_user: Option<UserId>,
	#[serde(default)]
	next_seq: u64,
}

struct QueryListener {
	collection: String,
	filter: Filter,
	tx: mpsc::UnboundedSender<QuerySnapshot>,
}

struct DocListener {
	collection: String,
	id: DocumentId,
	tx: mpsc::UnboundedSender<DocumentSnapshot>,
}

#[derive(Default)]
struct Listeners {
	next_id: ListenerId,
	queries: HashMap<ListenerId, QueryListener>,
	docs: HashMap<ListenerId, DocListener>,
	sessions: HashMap<ListenerId, mpsc::UnboundedSender<Option<UserId>>>,
}

impl Listeners {
	fn allocate(&mut self) -> ListenerId {
		self.next_id += 1;
		self.next_id
	}
}

#[derive(Default)]
struct Inner {
	state: State,
	listeners: Listeners,
	offline: bool,
}

/// In-process document store and identity provider.
///
/// All listeners are notified while the backend lock is held, so every subscription observes
/// writes in the order they were applied.
#[derive(Clone, Default)]
pub struct MemoryBackend {
	inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Restores a backend saved with [`MemoryBackend::save`]. A missing file yields an empty
	/// backend.
	pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
		let path = path.as_ref();

		let state = match fs::read(path).await {
			Ok(bytes) => serde_json::from_slice(&bytes)?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!(path = %path.display(), "No backend snapshot found, starting empty");
				State::default()
			}
			Err(e) => return Err(StoreError::io(path, e)),
		};

		Ok(Self {
			inner: Arc::new(Mutex::new(Inner {
				state,
				..Default::default()
			})),
		})
	}

	pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
		let path = path.as_ref();
		let bytes = serde_json::to_vec_pretty(&self.inner.lock().state)?;

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StoreError::io(parent, e))?;
		}

		fs::write(path, bytes)
			.await
			.map_err(|e| StoreError::io(path, e))
	}

	/// While offline every call fails as if the network was down.
	pub fn set_offline(&self, offline: bool) {
		self.inner.lock().offline = offline;
	}

	/// Document and query listeners currently registered, session listeners excluded.
	#[must_use]
	pub fn live_subscriptions(&self) -> usize {
		let inner = self.inner.lock();
		inner.listeners.queries.len() + inner.listeners.docs.len()
	}

	fn query_listener_subscription(
		&self,
		collection: &str,
		filter: Filter,
	) -> Result<Subscription<QuerySnapshot>, StoreError> {
		let (tx, rx) = mpsc::unbounded_channel();

		let listener_id = {
			let mut inner = self.inner.lock();
			check_online(&inner)?;

			let listener_id = inner.listeners.allocate();
			tx.send(query_snapshot(&inner.state, collection, &filter)).ok();
			inner.listeners.queries.insert(
				listener_id,
				QueryListener {
					collection: collection.to_owned(),
					filter,
					tx,
				},
			);

			listener_id
		};

		debug!(%listener_id, collection, "Opened query listener");

		let weak = Arc::downgrade(&self.inner);
		Ok(Subscription::new(rx, move || {
			release(&weak, |listeners| {
				listeners.queries.remove(&listener_id).is_some()
			});
			debug!(%listener_id, "Closed query listener");
		}))
	}

	fn doc_listener_subscription(
		&self,
		collection: &str,
		id: &DocumentId,
	) -> Result<Subscription<DocumentSnapshot>, StoreError> {
		let (tx, rx) = mpsc::unbounded_channel();

		let listener_id = {
			let mut inner = self.inner.lock();
			check_online(&inner)?;

			let listener_id = inner.listeners.allocate();
			tx.send(DocumentSnapshot {
				id: id.clone(),
				data: lookup(&inner.state, collection, id).cloned(),
			})
			.ok();
			inner.listeners.docs.insert(
				listener_id,
				DocListener {
					collection: collection.to_owned(),
					id: id.clone(),
					tx,
				},
			);

			listener_id
		};

		debug!(%listener_id, collection, %id, "Opened document listener");

		let weak = Arc::downgrade(&self.inner);
		Ok(Subscription::new(rx, move || {
			release(&weak, |listeners| {
				listeners.docs.remove(&listener_id).is_some()
			});
			debug!(%listener_id, "Closed document listener");
		}))
	}
}

fn release(inner: &Weak<Mutex<Inner>>, remove: impl FnOnce(&mut Listeners) -> bool) {
	if let Some(inner) = inner.upgrade() {
		if !remove(&mut inner.lock().listeners) {
			trace!("Listener was already gone");
		}
	}
}

fn check_online(inner: &Inner) -> Result<(), StoreError> {
	if inner.offline {
		Err(StoreError::Unavailable)
	} else {
		Ok(())
	}
}

fn lookup<'a>(state: &'a State, collection: &str, id: &DocumentId) -> Option<&'a Document> {
	state
		.collections
		.get(collection)
		.and_then(|docs| docs.get(id))
		.map(|stored| &stored.data)
}

fn query_snapshot(state: &State, collection: &str, filter: &Filter) -> QuerySnapshot {
	let mut matching = state
		.collections
		.get(collection)
		.into_iter()
		.flatten()
		.filter(|(_, stored)| filter.matches(&stored.data))
		.collect::<Vec<_>>();

	matching.sort_by_key(|(_, stored)| stored.seq);

	QuerySnapshot {
		docs: matching
			.into_iter()
			.map(|(id, stored)| QueryDocument {
				id: id.clone(),
				data: stored.data.clone(),
			})
			.collect(),
	}
}

/// Pushes fresh snapshots to every listener the change to `collection/id` is visible to.
/// `before` is the document as it was prior to the write.
fn notify_change(inner: &mut Inner, collection: &str, id: &DocumentId, before: Option<&Document>) {
	let Inner {
		state, listeners, ..
	} = inner;
	let state: &State = state;
	let after = lookup(state, collection, id);

	listeners.queries.retain(|listener_id, listener| {
		if listener.collection != collection {
			return true;
		}

		let affected = before.is_some_and(|doc| listener.filter.matches(doc))
			|| after.is_some_and(|doc| listener.filter.matches(doc));
		if !affected {
			return true;
		}

		let delivered = listener
			.tx
			.send(query_snapshot(state, collection, &listener.filter))
			.is_ok();
		if !delivered {
			trace!(%listener_id, "Pruning closed query listener");
		}
		delivered
	});

	listeners.docs.retain(|_, listener| {
		if listener.collection != collection || &listener.id != id {
			return true;
		}

		listener
			.tx
			.send(DocumentSnapshot {
				id: id.clone(),
				data: after.cloned(),
			})
			.is_ok()
	});
}

fn notify_session(inner: &mut Inner) {
	let current = inner.state.current_user.clone();
	inner
		.listeners
		.sessions
		.retain(|_, tx| tx.send(current.clone()).is_ok());
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
	let email = email.trim().to_lowercase();

	match email.split_once('@') {
		Some((local, domain))
			if !local.is_empty()
				&& !domain.is_empty()
				&& !domain.contains('@')
				&& !email.contains(char::is_whitespace) =>
		{
			Ok(email)
		}
		_ => Err(AuthError::InvalidEmail),
	}
}

fn hash_password(email: &str, password: &str) -> String {
	let mut hasher = blake3::Hasher::new();
	hasher.update(email.as_bytes());
	hasher.update(b"\0");
	hasher.update(password.as_bytes());
	hasher.finalize().to_hex().to_string()
}

#[async_trait]
impl DocumentStore for MemoryBackend {
	#[instrument(skip(self, doc), err)]
	async fn create(&self, collection: &str, doc: Document) -> Result<DocumentId, StoreError> {
		let mut inner = self.inner.lock();
		check_online(&inner)?;

		inner.state.next_seq += 1;
		let seq = inner.state.next_seq;

		let docs = inner
			.state
			.collections
			.entry(collection.to_owned())
			.or_default();

		let id = loop {
			let id = DocumentId::generate();
			if !docs.contains_key(&id) {
				break id;
			}
		};

		docs.insert(id.clone(), StoredDocument { seq, data: doc });
		notify_change(&mut inner, collection, &id, None);

		info!(%id, "Created document");

		Ok(id)
	}

	async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
		let inner = self.inner.lock();
		check_online(&inner)?;

		Ok(lookup(&inner.state, collection, id).cloned())
	}

	#[instrument(skip(self, patch), err)]
	async fn update(
		&self,
		collection: &str,
		id: &DocumentId,
		patch: Document,
	) -> Result<(), StoreError> {
		let mut inner = self.inner.lock();
		check_online(&inner)?;

		let Some(stored) = inner
			.state
			.collections
			.get_mut(collection)
			.and_then(|docs| docs.get_mut(id))
		else {
			return Err(StoreError::NotFound {
				collection: collection.to_owned(),
				id: id.clone(),
			});
		};

		let before = stored.data.clone();
		stored.data.extend(patch);

		notify_change(&mut inner, collection, id, Some(&before));

		info!("Updated document");

		Ok(())
	}

	#[instrument(skip(self), err)]
	async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
		let mut inner = self.inner.lock();
		check_online(&inner)?;

		let removed = inner
			.state
			.collections
			.get_mut(collection)
			.and_then(|docs| docs.remove(id));

		if let Some(removed) = removed {
			notify_change(&mut inner, collection, id, Some(&removed.data));
			info!("Deleted document");
		} else {
			debug!("Delete of missing document ignored");
		}

		Ok(())
	}

	async fn subscribe_query(
		&self,
		collection: &str,
		filter: Filter,
	) -> Result<Subscription<QuerySnapshot>, StoreError> {
		self.query_listener_subscription(collection, filter)
	}

	async fn subscribe_doc(
		&self,
		collection: &str,
		id: &DocumentId,
	) -> Result<Subscription<DocumentSnapshot>, StoreError> {
		self.doc_listener_subscription(collection, id)
	}
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
	#[instrument(skip_all, fields(email = %credentials.email), err)]
	async fn sign_in(&self, credentials: &Credentials) -> Result<UserId, AuthError> {
		let email = normalize_email(&credentials.email)?;

		let mut inner = self.inner.lock();
		if inner.offline {
			return Err(AuthError::Unavailable);
		}

		let uid = match inner.state.accounts.get(&email) {
			Some(account)
				if account.password_hash == hash_password(&email, &credentials.password) =>
			{
				account.uid.clone()
			}
			_ => return Err(AuthError::InvalidCredential),
		};

		inner.state.current_user = Some(uid.clone());
		notify_session(&mut inner);

		info!(%uid, "Signed in");

		Ok(uid)
	}

	#[instrument(skip_all, fields(email = %credentials.email), err)]
	async fn sign_up(&self, credentials: &Credentials) -> Result<UserId, AuthError> {
		let email = normalize_email(&credentials.email)?;
		if credentials.password.chars().count() < MIN_PASSWORD_LEN {
			return Err(AuthError::WeakPassword);
		}

		let mut inner = self.inner.lock();
		if inner.offline {
			return Err(AuthError::Unavailable);
		}

		if inner.state.accounts.contains_key(&email) {
			return Err(AuthError::EmailAlreadyInUse);
		}

		let uid = UserId::new(Uuid::new_v4().simple().to_string());
		let password_hash = hash_password(&email, &credentials.password);
		inner.state.accounts.insert(
			email,
			Account {
				uid: uid.clone(),
				password_hash,
			},
		);

		inner.state.current_user = Some(uid.clone());
		notify_session(&mut inner);

		info!(%uid, "Signed up");

		Ok(uid)
	}

	async fn sign_out(&self) -> Result<(), AuthError> {
		let mut inner = self.inner.lock();
		if let Some(uid) = inner.state.current_user.take() {
			notify_session(&mut inner);
			info!(%uid, "Signed out");
		}

		Ok(())
	}

	fn on_session_change(&self) -> Subscription<Option<UserId>> {
		let (tx, rx) = mpsc::unbounded_channel();

		let listener_id = {
			let mut inner = self.inner.lock();
			let listener_id = inner.listeners.allocate();
			tx.send(inner.state.current_user.clone()).ok();
			inner.listeners.sessions.insert(listener_id, tx);
			listener_id
		};

		let weak = Arc::downgrade(&self.inner);
		Subscription::new(rx, move || {
			release(&weak, |listeners| {
				listeners.sessions.remove(&listener_id).is_some()
			});
		})
	}

	fn current_user(&self) -> Option<UserId> {
		self.inner.lock().state.current_user.clone()
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use serde_json::json;
	use tempfile::tempdir;
	use tokio::time::timeout;
	use tracing_test::traced_test;

	use super::*;

	const SPOTS: &str = "goals";

	fn doc(owner: &str, name: &str) -> Document {
		let mut doc = Document::new();
		doc.insert("userId".into(), json!(owner));
		doc.insert("spotName".into(), json!(name));
		doc
	}

	fn names(snapshot: &QuerySnapshot) -> Vec<&str> {
		snapshot
			.docs
			.iter()
			.filter_map(|doc| doc.data.get("spotName").and_then(|v| v.as_str()))
			.collect()
	}

	#[tokio::test]
	#[traced_test]
	async fn query_subscription_sees_full_snapshots() {
		let backend = MemoryBackend::new();
		let mut sub = backend
			.subscribe_query(SPOTS, Filter::field_eq("userId", "alice"))
			.await
			.unwrap();

		assert!(sub.next_snapshot().await.unwrap().is_empty());

		backend.create(SPOTS, doc("alice", "Kawasan Falls")).await.unwrap();
		backend.create(SPOTS, doc("bob", "Osmeña Peak")).await.unwrap();
		backend.create(SPOTS, doc("alice", "Temple of Leah")).await.unwrap();

		assert_eq!(names(&sub.next_snapshot().await.unwrap()), ["Kawasan Falls"]);
		assert_eq!(
			names(&sub.next_snapshot().await.unwrap()),
			["Kawasan Falls", "Temple of Leah"]
		);

		// Bob's write was never visible to this query.
		assert!(timeout(Duration::from_millis(20), sub.next_snapshot())
			.await
			.is_err());
	}

	#[tokio::test]
	async fn doc_subscription_tracks_existence() {
		let backend = MemoryBackend::new();
		let id = backend.create(SPOTS, doc("alice", "Sirao")).await.unwrap();

		let mut sub = backend.subscribe_doc(SPOTS, &id).await.unwrap();
		assert!(sub.next_snapshot().await.unwrap().exists());

		backend.delete(SPOTS, &id).await.unwrap();
		assert!(!sub.next_snapshot().await.unwrap().exists());
	}

	#[tokio::test]
	async fn cancelled_subscription_is_unregistered() {
		let backend = MemoryBackend::new();
		let sub = backend.subscribe_query(SPOTS, Filter::All).await.unwrap();
		assert_eq!(backend.live_subscriptions(), 1);

		sub.cancel();
		assert_eq!(backend.live_subscriptions(), 0);

		backend.create(SPOTS, doc("alice", "Bantayan")).await.unwrap();
	}

	#[tokio::test]
	async fn update_merges_and_requires_existing_document() {
		let backend = MemoryBackend::new();
		let id = backend.create(SPOTS, doc("alice", "Moalboal")).await.unwrap();

		let mut patch = Document::new();
		patch.insert("category".into(), json!("Beach"));
		backend.update(SPOTS, &id, patch.clone()).await.unwrap();

		let stored = backend.get(SPOTS, &id).await.unwrap().unwrap();
		assert_eq!(stored["spotName"], json!("Moalboal"));
		assert_eq!(stored["category"], json!("Beach"));

		let missing = DocumentId::from("missing");
		assert!(matches!(
			backend.update(SPOTS, &missing, patch).await,
			Err(StoreError::NotFound { .. })
		));
	}

	#[tokio::test]
	async fn delete_is_idempotent() {
		let backend = MemoryBackend::new();
		let id = backend.create(SPOTS, doc("alice", "Malapascua")).await.unwrap();

		backend.delete(SPOTS, &id).await.unwrap();
		backend.delete(SPOTS, &id).await.unwrap();
		assert!(backend.get(SPOTS, &id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn offline_backend_rejects_calls() {
		let backend = MemoryBackend::new();
		backend.set_offline(true);

		assert!(matches!(
			backend.create(SPOTS, doc("alice", "Oslob")).await,
			Err(StoreError::Unavailable)
		));
		assert!(backend.subscribe_query(SPOTS, Filter::All).await.is_err());
		assert_eq!(
			backend
				.sign_up(&Credentials::new("a@b.c", "secret1"))
				.await,
			Err(AuthError::Unavailable)
		);
	}

	#[tokio::test]
	async fn identity_errors_are_classified() {
		let backend = MemoryBackend::new();

		assert_eq!(
			backend.sign_up(&Credentials::new("not-an-email", "secret1")).await,
			Err(AuthError::InvalidEmail)
		);
		assert_eq!(
			backend.sign_up(&Credentials::new("juan@cebu.ph", "123")).await,
			Err(AuthError::WeakPassword)
		);

		let uid = backend
			.sign_up(&Credentials::new("juan@cebu.ph", "lechon"))
			.await
			.unwrap();

		assert_eq!(
			backend.sign_up(&Credentials::new("Juan@Cebu.ph", "lechon")).await,
			Err(AuthError::EmailAlreadyInUse)
		);
		assert_eq!(
			backend.sign_in(&Credentials::new("juan@cebu.ph", "wrong!")).await,
			Err(AuthError::InvalidCredential)
		);
		assert_eq!(
			backend
				.sign_in(&Credentials::new(" juan@cebu.ph ", "lechon"))
				.await
				.unwrap(),
			uid
		);
	}

	#[tokio::test]
	async fn session_listener_gets_current_state_first() {
		let backend = MemoryBackend::new();
		let mut sessions = backend.on_session_change();
		assert_eq!(sessions.next_snapshot().await, Some(None));

		let uid = backend
			.sign_up(&Credentials::new("maria@cebu.ph", "danggit"))
			.await
			.unwrap();
		assert_eq!(sessions.next_snapshot().await, Some(Some(uid)));

		backend.sign_out().await.unwrap();
		assert_eq!(sessions.next_snapshot().await, Some(None));
		assert_eq!(backend.current_user(), None);
	}

	#[tokio::test]
	async fn save_and_load_round_trip() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("backend.json");

		let backend = MemoryBackend::new();
		let uid = backend
			.sign_up(&Credentials::new("pedro@cebu.ph", "sutukil"))
			.await
			.unwrap();
		let id = backend.create(SPOTS, doc(uid.as_str(), "Basilica")).await.unwrap();
		backend.save(&path).await.unwrap();

		let restored = MemoryBackend::load(&path).await.unwrap();
		assert_eq!(restored.current_user(), Some(uid));
		assert_eq!(
			restored.get(SPOTS, &id).await.unwrap().unwrap()["spotName"],
			json!("Basilica")
		);

		let empty = MemoryBackend::load(dir.path().join("nothing.json")).await.unwrap();
		assert_eq!(empty.current_user(), None);
	}
}
